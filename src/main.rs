mod cli;

use std::io::Read as _;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::{Cli, Command};
use maestro::config::Config;
use maestro::model::Task;
use maestro::render::TreeRenderer;
use maestro::{db, logging, ops, output, tree, tui};

fn open_db(config: &Config) -> Result<Connection> {
    config.ensure_db_dir()?;
    let conn = db::open(&config.db_path)?;
    db::init(&conn)?;
    Ok(conn)
}

/// Read a file's contents, or stdin when `source` is "-".
fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))
}

fn parse_snapshot(raw: &str) -> Result<Vec<Task>> {
    if raw.trim().is_empty() {
        bail!("no tasks provided");
    }
    serde_json::from_str(raw).context("expected a JSON array of tasks")
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Command::Watch { .. });
    logging::init_logging(cli.log_level, interactive)?;
    let config = Config::resolve(cli.db, cli.ascii)?;
    tracing::debug!(db = %config.db_path.display(), "resolved configuration");

    match cli.command {
        Command::Add {
            id,
            title,
            parent,
            priority,
            status,
        } => {
            let conn = open_db(&config)?;
            ops::add_task(&conn, &id, parent.as_deref(), &title, status, priority)?;
            eprintln!("Added task '{id}'");
        }

        Command::Status { id, status } => {
            let conn = open_db(&config)?;
            ops::set_status(&conn, &id, status)?;
            eprintln!("Marked '{id}' as {status}");
        }

        Command::Priority { id, priority } => {
            let conn = open_db(&config)?;
            ops::set_priority(&conn, &id, priority)?;
            eprintln!("Set priority of '{id}' to {priority}");
        }

        Command::Title { id, title } => {
            let conn = open_db(&config)?;
            ops::set_title(&conn, &id, &title)?;
            eprintln!("Updated title for '{id}'");
        }

        Command::Reparent { id, parent } => {
            let conn = open_db(&config)?;
            ops::reparent_task(&conn, &id, parent.as_deref())?;
            match parent.as_deref() {
                Some(p) => eprintln!("Moved '{id}' under '{p}'"),
                None => eprintln!("Moved '{id}' to root level"),
            }
        }

        Command::Move { id, index } => {
            let conn = open_db(&config)?;
            let at = ops::move_task(&conn, &id, index)?;
            eprintln!("Moved '{id}' to position {at}");
        }

        Command::Rm { id, recursive } => {
            let conn = open_db(&config)?;
            ops::remove_task(&conn, &id, recursive)?;
            eprintln!("Removed task '{id}'");
        }

        Command::Show { id, json } => {
            let conn = open_db(&config)?;
            let task = ops::get_task(&conn, &id)?;
            let children = ops::count_children(&conn, &id)?;
            let queue_position = ops::queue_position(&conn, &id)?;
            if json {
                let detail = output::TaskDetail {
                    task: &task,
                    children,
                    queue_position,
                };
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!(
                    "{}",
                    output::format_task_detail(&task, children, queue_position)
                );
            }
        }

        Command::List {
            tree,
            status,
            root,
            json,
        } => {
            let conn = open_db(&config)?;
            let tasks = ops::list_tasks(&conn, status, root.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tree {
                let renderer = TreeRenderer::new(config.glyphs);
                print!("{}", output::format_task_tree(&tasks, &renderer));
            } else {
                print!("{}", output::format_task_list(&tasks));
            }
        }

        Command::Tree { from, root, json } => {
            let mut tasks = match from {
                Some(source) => parse_snapshot(&read_source(&source)?)?,
                None => {
                    let conn = open_db(&config)?;
                    ops::list_tasks(&conn, None, None)?
                }
            };
            if let Some(root_id) = root.as_deref() {
                tasks = tree::subtree(&tasks, root_id);
                if tasks.is_empty() {
                    bail!("task '{root_id}' not found");
                }
            }
            let renderer = TreeRenderer::new(config.glyphs);
            if json {
                let rows = renderer.render(&tree::build_tree(&tasks));
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", output::format_task_tree(&tasks, &renderer));
            }
        }

        Command::Board => {
            let conn = open_db(&config)?;
            let tasks = ops::list_tasks(&conn, None, None)?;
            print!("{}", output::format_board(&tasks));
        }

        Command::Import { file } => {
            let tasks = parse_snapshot(&read_source(&file)?)?;
            let conn = open_db(&config)?;
            let n = ops::import_tasks(&conn, &tasks)?;
            eprintln!("Imported {n} task(s)");
        }

        Command::Export => {
            let conn = open_db(&config)?;
            let tasks = ops::list_tasks(&conn, None, None)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }

        Command::Watch {
            root,
            poll_interval,
        } => {
            let config = config.with_poll_interval(poll_interval);
            let conn = open_db(&config)?;
            if let Some(root_id) = root.as_deref() {
                ops::get_task(&conn, root_id)?;
            }
            tui::run(&config, &conn, root.as_deref())?;
        }
    }

    Ok(())
}
