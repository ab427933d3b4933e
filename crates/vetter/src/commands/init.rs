use std::path::PathBuf;

use clap::Args;

use vetter_policy::AccessPolicy;
use vetter_store::repo::{write_config, RepoConfig};
use vetter_store::ChangeStore;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current)
    path: Option<PathBuf>,
    /// Human-readable repository name
    #[arg(long)]
    name: Option<String>,
}

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));
    let store = ChangeStore::init(&path)?;
    let layout = store
        .layout()
        .ok_or_else(|| anyhow::anyhow!("store has no on-disk layout"))?;
    if args.name.is_some() {
        write_config(
            layout,
            &RepoConfig {
                version: 1,
                name: args.name,
            },
        )?;
    }
    if !layout.access_file().exists() {
        AccessPolicy::bootstrap().save(&layout.access_file())?;
    }
    println!("Initialized vetter repository in {}", layout.vetter_dir().display());
    Ok(())
}
