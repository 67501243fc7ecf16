use serde::Serialize;

use crate::model::Task;
use crate::order;
use crate::render::{TreeRenderer, TreeRow};
use crate::tree::build_tree;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub children: usize,
    pub queue_position: Option<usize>,
}

pub fn format_task_detail(task: &Task, children: usize, queue_position: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", task.id));
    if !task.title.is_empty() {
        out.push_str(&format!("Title:       {}\n", task.title));
    }
    out.push_str(&format!("Status:      {}\n", task.status));
    out.push_str(&format!("Priority:    {}\n", task.priority));
    if let Some(ref p) = task.parent_id {
        out.push_str(&format!("Parent:      {}\n", p));
    }
    if children > 0 {
        out.push_str(&format!("Children:    {}\n", children));
    }
    if let Some(q) = queue_position {
        out.push_str(&format!("Queue:       #{}\n", q));
    }
    out.push_str(&format!("Created:     {}\n", task.created_at));
    out.push_str(&format!("Updated:     {}\n", task.updated_at));
    out
}

pub fn format_task_list(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        let parent_info = task
            .parent_id
            .as_ref()
            .map(|p| format!(" (parent: {p})"))
            .unwrap_or_default();
        let title = if task.title.is_empty() {
            String::new()
        } else {
            format!("  {}", task.title)
        };
        out.push_str(&format!(
            "{} {}{}{} {}\n",
            task.symbol(),
            task.id,
            parent_info,
            title,
            task.priority.badge()
        ));
    }
    out
}

/// Plain-text line for one rendered row.
pub fn format_row(row: &TreeRow) -> String {
    let title = if row.title.is_empty() {
        String::new()
    } else {
        format!("  {}", row.title)
    };
    format!(
        "{}{} {}{} {}",
        row.prefix,
        row.status.symbol(),
        row.task_id,
        title,
        row.priority.badge()
    )
}

pub fn format_rows(rows: &[TreeRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}

pub fn format_task_tree(tasks: &[Task], renderer: &TreeRenderer<'_>) -> String {
    let forest = build_tree(tasks);
    format_rows(&renderer.render(&forest))
}

pub fn format_board(tasks: &[Task]) -> String {
    let mut out = String::new();
    for (status, column) in order::board_columns(tasks) {
        out.push_str(&format!("{} ({})\n", status, column.len()));
        for task in column {
            let title = if task.title.is_empty() {
                String::new()
            } else {
                format!("  {}", task.title)
            };
            out.push_str(&format!("  {} {}{}\n", task.priority.badge(), task.id, title));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus};
    use crate::render::GlyphStyle;

    fn make_task(id: &str, parent: Option<&str>, status: TaskStatus, title: &str) -> Task {
        let mut t = Task::new(id, parent);
        t.status = status;
        t.title = title.to_string();
        t
    }

    #[test]
    fn tree_single_root() {
        let tasks = vec![make_task("root", None, TaskStatus::InProgress, "Root task")];
        let out = format_task_tree(&tasks, &TreeRenderer::new(GlyphStyle::Unicode));
        assert_eq!(out, "* root  Root task [medium]\n");
    }

    #[test]
    fn tree_dangling_parent_example() {
        let tasks = vec![
            make_task("A", None, TaskStatus::Todo, ""),
            make_task("B", Some("A"), TaskStatus::Todo, ""),
            make_task("C", Some("A"), TaskStatus::Completed, ""),
            make_task("D", Some("Z"), TaskStatus::Blocked, ""),
        ];
        let out = format_task_tree(&tasks, &TreeRenderer::new(GlyphStyle::Unicode));
        assert_eq!(
            out,
            ". A [medium]\n├── . B [medium]\n└── x C [medium]\n! D [medium]\n"
        );
    }

    #[test]
    fn tree_ascii_style() {
        let tasks = vec![
            make_task("r", None, TaskStatus::Todo, ""),
            make_task("c", Some("r"), TaskStatus::Cancelled, "gone"),
        ];
        let out = format_task_tree(&tasks, &TreeRenderer::new(GlyphStyle::Ascii));
        assert_eq!(out, ". r [medium]\n`-- - c  gone [medium]\n");
    }

    #[test]
    fn flat_list() {
        let mut b = make_task("b", Some("a"), TaskStatus::Todo, "");
        b.priority = Priority::High;
        let tasks = vec![make_task("a", None, TaskStatus::InProgress, "desc A"), b];
        let out = format_task_list(&tasks);
        assert!(out.contains("* a  desc A [medium]"), "{out}");
        assert!(out.contains(". b (parent: a) [high]"), "{out}");
    }

    #[test]
    fn detail_shows_queue_and_children() {
        let task = make_task("t", Some("p"), TaskStatus::Todo, "Title");
        let out = format_task_detail(&task, 2, Some(3));
        assert!(out.contains("Parent:      p"));
        assert!(out.contains("Children:    2"));
        assert!(out.contains("Queue:       #3"));
    }

    #[test]
    fn detail_json_is_flat() {
        let task = make_task("t", None, TaskStatus::Todo, "");
        let detail = TaskDetail {
            task: &task,
            children: 0,
            queue_position: Some(1),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "t");
        assert_eq!(json["queuePosition"], 1);
    }

    #[test]
    fn board_lists_every_column() {
        let tasks = vec![make_task("a", None, TaskStatus::Todo, "")];
        let out = format_board(&tasks);
        assert!(out.starts_with("todo (1)\n  [medium] a\n"), "{out}");
        assert!(out.contains("in_progress (0)"));
        assert!(out.contains("cancelled (0)"));
    }
}
