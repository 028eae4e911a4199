//! Ganttline CLI entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ganttline::core::ConflictStatus;
use ganttline::{Editor, EditorConfig, ItemView, LinkView, PlanState};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ganttline", version, about = "Inspect Gantt plans and their schedule conflicts")]
struct Cli {
    /// Editor config (YAML); auto-detected when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the conflict status of every item
    Check {
        plan: PathBuf,
        /// Exit with status 2 if any item is blocked
        #[arg(long)]
        fail_on_blocked: bool,
    },
    /// Print item rectangles, link descriptors and statuses as JSON
    Export { plan: PathBuf },
}

#[derive(Serialize)]
struct ExportedItem {
    #[serde(flatten)]
    view: ItemView,
    status: Option<ConflictStatus>,
}

#[derive(Serialize)]
struct Export {
    items: Vec<ExportedItem>,
    links: Vec<LinkView>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::auto_load()?,
    };

    match cli.command {
        Command::Check {
            plan,
            fail_on_blocked,
        } => {
            let editor = open_plan(&plan, &config)?;
            let blocked = check(&editor);
            if fail_on_blocked && blocked > 0 {
                std::process::exit(2);
            }
        }
        Command::Export { plan } => {
            let editor = open_plan(&plan, &config)?;
            println!("{}", serde_json::to_string_pretty(&export(&editor))?);
        }
    }

    Ok(())
}

fn open_plan(path: &Path, config: &EditorConfig) -> Result<Editor> {
    log::info!("Loading plan from: {}", path.display());
    let plan = PlanState::load(path).with_context(|| format!("reading plan {}", path.display()))?;
    let editor = plan.restore(config)?;
    log::info!(
        "Loaded {} items, {} links",
        editor.item_count(),
        editor.graph().link_count()
    );
    Ok(editor)
}

/// Print one line per item; returns the number of blocked items
fn check(editor: &Editor) -> usize {
    let report = editor.conflicts();
    let mut blocked = 0;

    for item in editor.items() {
        let status = match report.status(item.id) {
            Some(status) => {
                if status == ConflictStatus::Blocked {
                    blocked += 1;
                }
                status.to_string()
            }
            None => "no information".to_string(),
        };
        println!(
            "{}\tlane {}\t{} .. {}\t{}",
            item.id,
            item.lane,
            item.start,
            item.last_day(),
            status
        );
    }

    for link in report.dangling_links() {
        log::warn!("{} skipped: endpoint without schedule", link);
    }

    blocked
}

fn export(editor: &Editor) -> Export {
    let report = editor.conflicts();
    Export {
        items: editor
            .item_views()
            .into_iter()
            .map(|view| {
                let status = report.status(view.id);
                ExportedItem { view, status }
            })
            .collect(),
        links: editor.link_views(),
    }
}
