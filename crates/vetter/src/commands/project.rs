use clap::{Args, Subcommand};

use vetter_core::ProjectKey;

use crate::config::Workspace;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Register a project
    Create {
        /// Project name
        name: String,
    },
    /// List registered projects
    List,
}

pub fn run(args: ProjectArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    match args.command {
        ProjectCommand::Create { name } => {
            let project = ProjectKey::new(name)?;
            ws.store.create_project(&project)?;
            println!("Created project: {project}");
        }
        ProjectCommand::List => {
            for project in ws.store.list_projects()? {
                println!("{project}");
            }
        }
    }
    Ok(())
}
