use std::collections::HashSet;

use clap::{Args, Subcommand};

use vetter_core::types::{Change, ChangeInfo, Principal};
use vetter_core::{now_ms, BranchRef, ChangeId, ProjectKey};

use crate::config::Workspace;

#[derive(Args)]
pub struct ChangeArgs {
    #[command(subcommand)]
    command: ChangeCommand,
}

#[derive(Subcommand)]
enum ChangeCommand {
    /// Upload a new change
    New {
        /// Project the change belongs to
        #[arg(short, long)]
        project: String,
        /// Target branch
        #[arg(short, long, default_value = "master")]
        branch: String,
        /// One-line subject
        subject: String,
        /// Create as a draft
        #[arg(long)]
        draft: bool,
    },
    /// Show a change and its messages
    Show {
        /// Change ID or project~branch~id
        id: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List changes
    List {
        /// Filter by project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Abandon a change
    Abandon {
        id: String,
        /// Reason recorded on the change
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Restore an abandoned change
    Restore {
        id: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Abandon several changes of one project atomically
    BatchAbandon {
        /// Project every change must belong to
        #[arg(short, long)]
        project: String,
        /// Change IDs
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show which lifecycle actions are available
    Actions { id: String },
}

pub fn run(args: ChangeArgs, principal: &Principal) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    match args.command {
        ChangeCommand::New {
            project,
            branch,
            subject,
            draft,
        } => {
            let owner = principal
                .account()
                .ok_or_else(|| anyhow::anyhow!("anonymous users cannot upload changes"))?;
            let project = ProjectKey::new(project)?;
            let branch = BranchRef::new(branch)?;
            let change = if draft {
                Change::new_draft(project, branch, owner, subject, now_ms())
            } else {
                Change::new(project, branch, owner, subject, now_ms())
            };
            let info = ws.store.insert_change(change)?;
            println!("Created change: {}", info.change.id);
            println!("  Status: {}", info.status());
        }
        ChangeCommand::Show { id, json } => {
            let info = ws.service().get(&id, principal)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_change(&info);
            }
        }
        ChangeCommand::List { project } => {
            let filter = project.map(ProjectKey::new).transpose()?;
            for change in ws.service().list(principal, filter.as_ref())? {
                println!(
                    "{} {:<9} {} {} {}",
                    change.id,
                    change.status(),
                    change.project,
                    change.branch.short_name(),
                    change.subject
                );
            }
        }
        ChangeCommand::Abandon { id, message } => {
            let info = ws.service().abandon(&id, principal, message.as_deref())?;
            println!("Abandoned change {}", info.change.id);
        }
        ChangeCommand::Restore { id, message } => {
            let info = ws.service().restore(&id, principal, message.as_deref())?;
            println!("Restored change {}", info.change.id);
        }
        ChangeCommand::BatchAbandon {
            project,
            ids,
            message,
        } => {
            let project = ProjectKey::new(project)?;
            let ids = distinct_ids(&ids)?;
            ws.service()
                .batch_abandon(&project, principal, &ids, message.as_deref())?;
            println!("Abandoned {} change(s) in {project}", ids.len());
        }
        ChangeCommand::Actions { id } => {
            let actions = ws.service().actions(&id, principal)?;
            println!("abandon: {}", actions.abandon);
            println!("restore: {}", actions.restore);
        }
    }
    Ok(())
}

/// Parses change ids, keeping the first occurrence of each.
fn distinct_ids(ids: &[String]) -> anyhow::Result<Vec<ChangeId>> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::with_capacity(ids.len());
    for id in ids {
        let id = ChangeId::from_string(id)?;
        if seen.insert(id) {
            distinct.push(id);
        }
    }
    Ok(distinct)
}

fn print_change(info: &ChangeInfo) {
    let change = &info.change;
    println!("Change: {}", change.id);
    println!("  Project: {}", change.project);
    println!("  Branch: {}", change.branch);
    println!("  Owner: {}", change.owner);
    println!("  Subject: {}", change.subject);
    println!("  Status: {}", change.status());
    if let Some(meta) = &change.meta_id {
        println!("  Meta: {meta}");
    }
    for message in &info.messages {
        let first_line = message.text.lines().next().unwrap_or_default();
        println!(
            "  [{}] ps{} {}: {}",
            message.timestamp_ms, message.patch_set, message.author, first_line
        );
    }
}
