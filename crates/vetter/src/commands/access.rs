use clap::{Args, Subcommand, ValueEnum};

use vetter_policy::{Capability, Grant, OwnerRule, ALL_PROJECTS};

use crate::config::Workspace;

#[derive(Args)]
pub struct AccessArgs {
    #[command(subcommand)]
    command: AccessCommand,
}

#[derive(Clone, Copy, ValueEnum)]
enum CapabilityArg {
    Abandon,
    Owner,
}

impl From<CapabilityArg> for Capability {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::Abandon => Capability::Abandon,
            CapabilityArg::Owner => Capability::Owner,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OwnerRuleArg {
    Implicit,
    Explicit,
}

#[derive(Subcommand)]
enum AccessCommand {
    /// Grant a capability on matching refs to a group
    Grant {
        /// Capability to grant
        #[arg(value_enum)]
        capability: CapabilityArg,
        /// Group receiving the grant
        group: String,
        /// Ref glob, e.g. refs/heads/*
        #[arg(long = "ref", default_value = "refs/heads/*")]
        ref_pattern: String,
        /// Project the grant applies to (all projects when omitted)
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Whether change owners may abandon/restore without a grant
    OwnerRule {
        #[arg(value_enum)]
        rule: OwnerRuleArg,
    },
    /// Show the access policy
    Show,
}

pub fn run(args: AccessArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    match args.command {
        AccessCommand::Grant {
            capability,
            group,
            ref_pattern,
            project,
        } => {
            let project = project.unwrap_or_else(|| ALL_PROJECTS.to_string());
            ws.gate
                .grant(Grant::new(project.clone(), ref_pattern.clone(), capability.into(), group.clone()))?;
            ws.save_policy()?;
            println!("Granted to {group} on {project} {ref_pattern}");
        }
        AccessCommand::OwnerRule { rule } => {
            ws.gate.set_owner_rule(match rule {
                OwnerRuleArg::Implicit => OwnerRule::Implicit,
                OwnerRuleArg::Explicit => OwnerRule::Explicit,
            });
            ws.save_policy()?;
        }
        AccessCommand::Show => {
            print!("{}", ws.gate.policy().to_toml()?);
        }
    }
    Ok(())
}
