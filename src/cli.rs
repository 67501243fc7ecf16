use clap::{Parser, Subcommand};

use maestro::logging::LogLevel;
use maestro::model::{Priority, TaskStatus};

#[derive(Parser)]
#[command(name = "maestro", about = "Hierarchical task tracker with a live tree view")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.maestro/maestro.db]
    #[arg(long, env = "MAESTRO_DB", global = true)]
    pub db: Option<String>,

    /// Draw tree connectors with ASCII characters
    #[arg(long, env = "MAESTRO_ASCII", global = true)]
    pub ascii: bool,

    /// Log verbosity (overrides MAESTRO_LOG)
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Task id (alphanumeric, hyphens, underscores)
        id: String,
        /// Short title
        #[arg(default_value = "")]
        title: String,
        /// Parent task id
        #[arg(short, long)]
        parent: Option<String>,
        /// Priority (low, medium, high)
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Status (todo, in_progress, completed, cancelled, blocked)
        #[arg(short, long, default_value = "todo")]
        status: TaskStatus,
    },

    /// Set a task's status
    Status { id: String, status: TaskStatus },

    /// Set a task's priority
    Priority { id: String, priority: Priority },

    /// Replace a task's title
    Title { id: String, title: String },

    /// Move a task under a new parent (omit parent to make it a root)
    Reparent {
        id: String,
        parent: Option<String>,
    },

    /// Move a task to a new index among its siblings
    Move { id: String, index: usize },

    /// Remove a task
    Rm {
        id: String,
        /// Also remove all descendants
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show task details
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    List {
        /// Display as a tree
        #[arg(long)]
        tree: bool,
        /// Filter by status
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// Only show this task and its descendants
        #[arg(long)]
        root: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Print the task tree
    Tree {
        /// Build from a JSON task array instead of the database ("-" for stdin)
        #[arg(long)]
        from: Option<String>,
        /// Only show this task and its descendants
        #[arg(long)]
        root: Option<String>,
        /// Emit the rendered rows (depth, prefix, task fields) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print tasks grouped into status columns
    Board,

    /// Upsert tasks from a JSON array ("-" for stdin)
    Import { file: String },

    /// Dump all tasks as a JSON array
    Export,

    /// Interactive tree view that refreshes when the database changes
    Watch {
        /// Only show this task and its descendants
        #[arg(long)]
        root: Option<String>,
        /// Milliseconds between input polls
        #[arg(long, default_value_t = 1000)]
        poll_interval: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_options() {
        let cli = Cli::try_parse_from([
            "maestro", "add", "t1", "First", "-p", "root", "--priority", "high", "-s", "blocked",
        ])
        .unwrap();
        match cli.command {
            Command::Add {
                id,
                title,
                parent,
                priority,
                status,
            } => {
                assert_eq!(id, "t1");
                assert_eq!(title, "First");
                assert_eq!(parent.as_deref(), Some("root"));
                assert_eq!(priority, Priority::High);
                assert_eq!(status, TaskStatus::Blocked);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["maestro", "status", "t1", "later"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["maestro", "board", "--ascii", "--log-level", "debug"])
            .unwrap();
        assert!(cli.ascii);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }
}
