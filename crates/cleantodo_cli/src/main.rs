//! `cleantodo` command-line consumer.
//!
//! # Responsibility
//! - Build the core once from flags/env and run one command against it.
//! - Own user-facing input policy (title trimming, unknown ids) and output.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cleantodo_core::config::DEFAULT_DB_FILE_NAME;
use cleantodo_core::{
    core_version, default_log_level, normalize_title, CoreConfig, DatabaseLocation, Task, TaskId,
    TaskRepository, TodoApp,
};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::runtime::Handle;

#[derive(Debug, Parser)]
#[command(name = "cleantodo", version, about = "Local task list backed by SQLite")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "CLEANTODO_DB", default_value = DEFAULT_DB_FILE_NAME, global = true)]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CLEANTODO_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CLEANTODO_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a task.
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
    },
    /// Print the current list.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Flip a task between open and done.
    Toggle { id: TaskId },
    /// Change title and/or description; omitted values are kept.
    Edit {
        id: TaskId,
        #[arg(long, short)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Remove a task.
    Delete { id: TaskId },
    /// Print the list on every change until Ctrl-C.
    Watch,
    /// Print the core version.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Command::Version = cli.command {
        println!("cleantodo_core version={}", core_version());
        return Ok(());
    }

    let config = CoreConfig {
        database: DatabaseLocation::File(cli.db.clone()),
        log_level: cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string()),
        log_dir: cli.log_dir.clone(),
        ..CoreConfig::default()
    };
    let app = TodoApp::open(&config, Handle::current())
        .with_context(|| format!("failed to open task store `{}`", cli.db.display()))?;

    run(&app, cli.command).await
}

async fn run(app: &TodoApp, command: Command) -> Result<()> {
    match command {
        Command::Add { title, description } => {
            let Some(title) = normalize_title(&title) else {
                bail!("title cannot be blank");
            };
            let id = app.controller().add(title, description).await??;
            println!("added {id}");
        }
        Command::List { json } => {
            let tasks = snapshot(app).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print_tasks(&tasks);
            }
        }
        Command::Toggle { id } => {
            let task = find(app, id).await?;
            app.operations().toggle_done(&task).await?;
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            let title = match title {
                Some(raw) => match normalize_title(&raw) {
                    Some(title) => Some(title),
                    None => bail!("title cannot be blank"),
                },
                None => None,
            };
            let task = find(app, id).await?;
            app.operations().edit_task(&task, title, description).await?;
        }
        Command::Delete { id } => {
            let task = find(app, id).await?;
            app.operations().delete_task(&task).await?;
        }
        Command::Watch => watch(app).await?,
        Command::Version => println!("cleantodo_core version={}", core_version()),
    }
    Ok(())
}

async fn watch(app: &TodoApp) -> Result<()> {
    let mut rx = app.controller().observe();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let tasks = rx.borrow_and_update().to_vec();
                println!("--");
                print_tasks(&tasks);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                return Ok(());
            }
        }
    }
}

async fn snapshot(app: &TodoApp) -> Result<Vec<Task>> {
    app.repository()
        .get_tasks()
        .next()
        .await
        .context("task stream closed before the first snapshot")
}

async fn find(app: &TodoApp, id: TaskId) -> Result<Task> {
    snapshot(app)
        .await?
        .into_iter()
        .find(|task| task.id == id)
        .with_context(|| format!("no task with id {id}"))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }
    for task in tasks {
        let marker = if task.is_done { "[x]" } else { "[ ]" };
        println!("{marker} {:>4}  {}", task.id, task.title);
        if !task.description.is_empty() {
            println!("          {}", task.description);
        }
    }
}
