pub mod access;
pub mod change;
pub mod init;
pub mod project;

use clap::Subcommand;

use vetter_core::types::Principal;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new vetter repository
    Init(init::InitArgs),
    /// Manage projects
    Project(project::ProjectArgs),
    /// Create, inspect, abandon and restore changes
    Change(change::ChangeArgs),
    /// Manage access grants
    Access(access::AccessArgs),
}

impl Commands {
    pub fn run(self, principal: &Principal) -> anyhow::Result<()> {
        match self {
            Commands::Init(args) => init::run(args),
            Commands::Project(args) => project::run(args),
            Commands::Change(args) => change::run(args, principal),
            Commands::Access(args) => access::run(args),
        }
    }
}
