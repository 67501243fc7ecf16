use std::collections::HashSet;

use anyhow::{bail, Result};
use rusqlite::{Connection, OptionalExtension};

/// Validate a task id: must be non-empty and match [a-zA-Z0-9_-]+
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("task id must not be empty");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("task id '{id}' contains invalid characters: only a-z, A-Z, 0-9, _, - allowed");
    }
    Ok(())
}

/// Detect if setting `task_id`'s parent to `new_parent` would create a cycle.
/// A cycle exists if `new_parent` is a descendant of `task_id` (or is `task_id` itself).
///
/// Imported data may already contain cycles, so the walk stops on the first
/// revisited ancestor.
pub fn detect_parent_cycle(conn: &Connection, task_id: &str, new_parent: &str) -> Result<bool> {
    if task_id == new_parent {
        return Ok(true);
    }
    let mut visited = HashSet::new();
    let mut current = new_parent.to_string();
    while visited.insert(current.clone()) {
        let parent: Option<Option<String>> = conn
            .query_row(
                "SELECT parent_id FROM tasks WHERE id = ?1",
                [current.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match parent.flatten() {
            Some(p) if p == task_id => return Ok(true),
            Some(p) => current = p,
            None => return Ok(false),
        }
    }
    Ok(false)
}
