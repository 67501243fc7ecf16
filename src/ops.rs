use std::collections::HashMap;

use anyhow::{bail, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};

use crate::model::{Priority, Task, TaskStatus};
use crate::order;
use crate::tree;
use crate::validate::{detect_parent_cycle, validate_id};

fn task_exists(conn: &Connection, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks WHERE id = ?1", [id], |row| {
        row.get(0)
    })?;
    Ok(count > 0)
}

fn require_task(conn: &Connection, id: &str) -> Result<()> {
    if !task_exists(conn, id)? {
        bail!("task '{id}' not found");
    }
    Ok(())
}

fn conversion_error(col: usize, e: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, e.into())
}

fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        status: TaskStatus::parse(&status).map_err(|e| conversion_error(3, e))?,
        priority: Priority::parse(&priority).map_err(|e| conversion_error(4, e))?,
        position: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const TASK_COLUMNS: &str =
    "id, parent_id, title, status, priority, position, created_at, updated_at";

const INSERT_TASK: &str = "
INSERT INTO tasks (id, parent_id, title, status, priority, position)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

const UPSERT_TASK: &str = "
INSERT INTO tasks (id, parent_id, title, status, priority, position)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    parent_id = excluded.parent_id,
    title = excluded.title,
    status = excluded.status,
    priority = excluded.priority,
    position = excluded.position,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
";

const SET_STATUS: &str = "
UPDATE tasks
SET status = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ?2
";

const SET_PRIORITY: &str = "
UPDATE tasks
SET priority = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ?2
";

const SET_TITLE: &str = "
UPDATE tasks
SET title = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ?2
";

const SET_PARENT: &str = "
UPDATE tasks
SET parent_id = ?1, position = ?2,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ?3
";

const SET_POSITION: &str = "UPDATE tasks SET position = ?1 WHERE id = ?2";

/// Run `f` inside a savepoint so it works both standalone and nested inside
/// an outer transaction.
fn with_savepoint<T>(conn: &Connection, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f() {
        Ok(v) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(v)
        }
        Err(e) => {
            let _ = conn.execute_batch(&format!("ROLLBACK TO {name}"));
            let _ = conn.execute_batch(&format!("RELEASE {name}"));
            Err(e)
        }
    }
}

fn next_position(conn: &Connection, parent: Option<&str>) -> Result<i64> {
    let pos: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE parent_id IS ?1",
        [parent],
        |row| row.get(0),
    )?;
    Ok(pos)
}

/// Ids sharing `parent`, in display order.
pub fn sibling_ids(conn: &Connection, parent: Option<&str>) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare_cached("SELECT id FROM tasks WHERE parent_id IS ?1 ORDER BY position, seq")?;
    let ids = stmt
        .query_map([parent], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

pub fn add_task(
    conn: &Connection,
    id: &str,
    parent: Option<&str>,
    title: &str,
    status: TaskStatus,
    priority: Priority,
) -> Result<()> {
    validate_id(id)?;
    if task_exists(conn, id)? {
        bail!("task '{id}' already exists");
    }
    if let Some(p) = parent {
        require_task(conn, p)?;
    }
    let position = next_position(conn, parent)?;
    conn.execute(
        INSERT_TASK,
        rusqlite::params![id, parent, title, status.as_str(), priority.as_str(), position],
    )?;
    tracing::debug!(id, ?parent, position, "added task");
    Ok(())
}

pub fn get_task(conn: &Connection, id: &str) -> Result<Task> {
    require_task(conn, id)?;
    let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    let task = conn.query_row(&query, [id], read_task_row)?;
    Ok(task)
}

/// Snapshot of the store in tree preorder: every task follows its parent and
/// siblings keep their stored positions.
///
/// With `root`, only that task and its descendants are returned. The status
/// filter is applied last, so children of filtered-out tasks are promoted
/// when the snapshot is turned into a tree.
pub fn list_tasks(
    conn: &Connection,
    status: Option<TaskStatus>,
    root: Option<&str>,
) -> Result<Vec<Task>> {
    if let Some(r) = root {
        require_task(conn, r)?;
    }

    let query = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY position, seq");
    let mut stmt = conn.prepare(&query)?;
    let stored = stmt
        .query_map([], read_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    // Positions only order a sibling group; the global sort just keeps each
    // group in order for the builder.
    let mut tasks = tree::preorder(&stored);

    if let Some(root_id) = root {
        tasks = tree::subtree(&tasks, root_id);
    }
    if let Some(s) = status {
        tasks.retain(|t| t.status == s);
    }
    Ok(tasks)
}

pub fn count_children(conn: &Connection, id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE parent_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub fn set_status(conn: &Connection, id: &str, status: TaskStatus) -> Result<()> {
    require_task(conn, id)?;
    conn.execute(SET_STATUS, rusqlite::params![status.as_str(), id])?;
    tracing::debug!(id, %status, "status changed");
    Ok(())
}

pub fn set_priority(conn: &Connection, id: &str, priority: Priority) -> Result<()> {
    require_task(conn, id)?;
    conn.execute(SET_PRIORITY, rusqlite::params![priority.as_str(), id])?;
    tracing::debug!(id, %priority, "priority changed");
    Ok(())
}

pub fn set_title(conn: &Connection, id: &str, title: &str) -> Result<()> {
    require_task(conn, id)?;
    conn.execute(SET_TITLE, rusqlite::params![title, id])?;
    Ok(())
}

/// Move `id` under `parent` (or to root level), appended after its new siblings.
pub fn reparent_task(conn: &Connection, id: &str, parent: Option<&str>) -> Result<()> {
    require_task(conn, id)?;
    if let Some(new_parent) = parent {
        require_task(conn, new_parent)?;
        if detect_parent_cycle(conn, id, new_parent)? {
            bail!("setting parent to '{new_parent}' would create a cycle");
        }
    }
    let position = next_position(conn, parent)?;
    conn.execute(SET_PARENT, rusqlite::params![parent, position, id])?;
    tracing::debug!(id, ?parent, "reparented task");
    Ok(())
}

pub fn remove_task(conn: &Connection, id: &str, recursive: bool) -> Result<()> {
    require_task(conn, id)?;

    if recursive {
        with_savepoint(conn, "remove_task", || {
            let descendants = collect_descendants(conn, id)?;
            for desc_id in descendants.iter().rev() {
                conn.execute("DELETE FROM tasks WHERE id = ?1", [desc_id])?;
            }
            conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(())
        })?;
    } else {
        if count_children(conn, id)? > 0 {
            bail!("task '{id}' has children; use --recursive to remove");
        }
        conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    }
    tracing::debug!(id, recursive, "removed task");
    Ok(())
}

fn collect_descendants(conn: &Connection, id: &str) -> Result<Vec<String>> {
    let mut result = Vec::new();
    let mut seen = std::collections::HashSet::new();
    seen.insert(id.to_string());
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(id.to_string());
    while let Some(current) = queue.pop_front() {
        let mut stmt = conn.prepare_cached("SELECT id FROM tasks WHERE parent_id = ?1")?;
        let children: Vec<String> = stmt
            .query_map([&current], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        for child in children {
            if seen.insert(child.clone()) {
                result.push(child.clone());
                queue.push_back(child);
            }
        }
    }
    Ok(result)
}

fn parent_of(conn: &Connection, id: &str) -> Result<Option<String>> {
    let parent = conn
        .query_row("SELECT parent_id FROM tasks WHERE id = ?1", [id], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?;
    match parent {
        Some(p) => Ok(p),
        None => bail!("task '{id}' not found"),
    }
}

fn write_positions(conn: &Connection, ids: &[String]) -> Result<()> {
    with_savepoint(conn, "reorder", || {
        for (pos, sibling) in ids.iter().enumerate() {
            conn.execute(SET_POSITION, rusqlite::params![pos as i64, sibling])?;
        }
        Ok(())
    })
}

/// Drop `id` at index `to` among its siblings.
/// Returns the index the task actually landed at.
pub fn move_task(conn: &Connection, id: &str, to: usize) -> Result<usize> {
    let parent = parent_of(conn, id)?;
    let siblings = sibling_ids(conn, parent.as_deref())?;
    let Some(from) = siblings.iter().position(|s| s == id) else {
        bail!("task '{id}' not found among its siblings");
    };
    let reordered = order::reorder(&siblings, from, to);
    write_positions(conn, &reordered)?;
    let landed = reordered.iter().position(|s| s == id).unwrap_or(from);
    tracing::debug!(id, from, to = landed, "moved task");
    Ok(landed)
}

/// Shift `id` by `delta` slots among its siblings.
/// Returns false if the task was already at the edge.
pub fn shift_task(conn: &Connection, id: &str, delta: isize) -> Result<bool> {
    let parent = parent_of(conn, id)?;
    let siblings = sibling_ids(conn, parent.as_deref())?;
    match order::move_by(&siblings, id, delta) {
        Some(reordered) => {
            write_positions(conn, &reordered)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Upsert a snapshot, keeping its order within each sibling group.
///
/// Parent references are stored as given: a snapshot may point at tasks it
/// doesn't contain.
pub fn import_tasks(conn: &Connection, tasks: &[Task]) -> Result<usize> {
    with_savepoint(conn, "import", || {
        for task in tasks {
            if task.id.is_empty() {
                bail!("snapshot contains a task with an empty id");
            }
            let position = next_position(conn, task.parent_id.as_deref())?;
            conn.execute(
                UPSERT_TASK,
                rusqlite::params![
                    task.id,
                    task.parent_id,
                    task.title,
                    task.status.as_str(),
                    task.priority.as_str(),
                    position
                ],
            )?;
        }
        Ok(())
    })?;
    tracing::debug!(count = tasks.len(), "imported snapshot");
    Ok(tasks.len())
}

/// 1-based queue position of `id`, or `None` if it is finished.
pub fn queue_position(conn: &Connection, id: &str) -> Result<Option<usize>> {
    require_task(conn, id)?;
    let tasks = list_tasks(conn, None, None)?;
    let positions: HashMap<String, usize> = order::queue_positions(&tasks);
    Ok(positions.get(id).copied())
}
