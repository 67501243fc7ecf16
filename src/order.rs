use std::collections::HashMap;

use crate::model::{Task, TaskStatus};

/// Move the entry at `from` so it ends up at index `to`.
///
/// `to` is clamped to the end of the list. An out-of-range `from` leaves the
/// order untouched.
pub fn reorder(ids: &[String], from: usize, to: usize) -> Vec<String> {
    let mut out = ids.to_vec();
    if from >= out.len() {
        return out;
    }
    let moved = out.remove(from);
    let to = to.min(out.len());
    out.insert(to, moved);
    out
}

/// Shift `id` by `delta` slots within `ids`. Returns `None` if `id` is absent
/// or the move would not change anything.
pub fn move_by(ids: &[String], id: &str, delta: isize) -> Option<Vec<String>> {
    let from = ids.iter().position(|x| x == id)?;
    let last = ids.len().saturating_sub(1) as isize;
    let to = (from as isize + delta).clamp(0, last) as usize;
    if to == from {
        return None;
    }
    Some(reorder(ids, from, to))
}

/// 1-based place of every unfinished task in the work queue, in input order.
pub fn queue_positions(tasks: &[Task]) -> HashMap<String, usize> {
    tasks
        .iter()
        .filter(|t| !t.status.is_finished())
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i + 1))
        .collect()
}

/// Kanban columns in board order, each sorted by priority then input order.
pub fn board_columns(tasks: &[Task]) -> Vec<(TaskStatus, Vec<&Task>)> {
    TaskStatus::ALL
        .iter()
        .map(|&status| {
            let mut column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
            column.sort_by_key(|t| t.priority.rank());
            (status, column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn task(id: &str, status: TaskStatus, priority: Priority) -> Task {
        let mut t = Task::new(id, None);
        t.status = status;
        t.priority = priority;
        t
    }

    #[test]
    fn reorder_moves_down_and_up() {
        let list = ids(&["a", "b", "c", "d"]);
        assert_eq!(reorder(&list, 0, 2), ids(&["b", "c", "a", "d"]));
        assert_eq!(reorder(&list, 3, 1), ids(&["a", "d", "b", "c"]));
    }

    #[test]
    fn reorder_clamps_target_and_ignores_bad_source() {
        let list = ids(&["a", "b", "c"]);
        assert_eq!(reorder(&list, 0, 99), ids(&["b", "c", "a"]));
        assert_eq!(reorder(&list, 7, 0), list);
    }

    #[test]
    fn move_by_stops_at_edges() {
        let list = ids(&["a", "b", "c"]);
        assert_eq!(move_by(&list, "b", -1), Some(ids(&["b", "a", "c"])));
        assert_eq!(move_by(&list, "c", 5), None);
        assert_eq!(move_by(&list, "a", -1), None);
        assert_eq!(move_by(&list, "zz", 1), None);
    }

    #[test]
    fn queue_skips_finished_tasks() {
        let tasks = vec![
            task("a", TaskStatus::Completed, Priority::Low),
            task("b", TaskStatus::Todo, Priority::Low),
            task("c", TaskStatus::Cancelled, Priority::Low),
            task("d", TaskStatus::Blocked, Priority::Low),
        ];
        let q = queue_positions(&tasks);
        assert_eq!(q.get("b"), Some(&1));
        assert_eq!(q.get("d"), Some(&2));
        assert!(!q.contains_key("a"));
        assert!(!q.contains_key("c"));
    }

    #[test]
    fn board_sorts_by_priority_stably() {
        let tasks = vec![
            task("low", TaskStatus::Todo, Priority::Low),
            task("hi1", TaskStatus::Todo, Priority::High),
            task("wip", TaskStatus::InProgress, Priority::Medium),
            task("hi2", TaskStatus::Todo, Priority::High),
        ];
        let board = board_columns(&tasks);
        assert_eq!(board.len(), TaskStatus::ALL.len());
        let (status, todo) = &board[0];
        assert_eq!(*status, TaskStatus::Todo);
        let todo_ids: Vec<&str> = todo.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(todo_ids, vec!["hi1", "hi2", "low"]);
        assert_eq!(board[1].1.len(), 1);
    }
}
