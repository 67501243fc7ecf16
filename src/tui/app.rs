use anyhow::Result;
use rusqlite::Connection;

use crate::model::{Priority, Task, TaskStatus};
use crate::ops;
use crate::render::GlyphStyle;
use crate::ui::TreeView;
use crate::validate::validate_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddField {
    Id,
    Title,
}

pub struct AddForm {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub parent: Option<String>,
    pub focused: AddField,
    pub error: Option<String>,
}

impl AddForm {
    pub fn new(parent: Option<String>) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            priority: Priority::default(),
            parent,
            focused: AddField::Id,
            error: None,
        }
    }

    pub fn focused_buf_mut(&mut self) -> &mut String {
        match self.focused {
            AddField::Id => &mut self.id,
            AddField::Title => &mut self.title,
        }
    }

    pub fn validate(&mut self) -> bool {
        if let Err(e) = validate_id(&self.id) {
            self.error = Some(e.to_string());
            return false;
        }
        self.error = None;
        true
    }

    pub fn next_field(&mut self) {
        self.focused = match self.focused {
            AddField::Id => AddField::Title,
            AddField::Title => AddField::Id,
        };
    }
}

/// The task a row's jump control pointed at.
pub struct Detail {
    pub task: Task,
    pub children: usize,
    pub queue_position: Option<usize>,
}

/// A store mutation requested from the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Status(String, TaskStatus),
    Priority(String, Priority),
    Shift(String, isize),
    Remove(String),
}

pub struct App {
    pub tree: TreeView,
    pub detail: Option<Detail>,
    pub add_form: Option<AddForm>,
    root: Option<String>,
    snapshot: Vec<Task>,
}

impl App {
    pub fn new(conn: &Connection, root: Option<&str>, glyphs: GlyphStyle) -> Result<Self> {
        let mut app = App {
            tree: TreeView::new(glyphs),
            detail: None,
            add_form: None,
            root: root.map(str::to_string),
            snapshot: Vec::new(),
        };
        app.refresh(conn)?;
        Ok(app)
    }

    /// Pull a fresh snapshot from the store and rebuild the tree from it.
    pub fn refresh(&mut self, conn: &Connection) -> Result<()> {
        self.snapshot = ops::list_tasks(conn, None, self.root.as_deref())?;
        self.tree.set_tasks(&self.snapshot);
        tracing::debug!(tasks = self.snapshot.len(), rows = self.tree.rows.len(), "tree rebuilt");
        if let Some(id) = self.detail.as_ref().map(|d| d.task.id.clone()) {
            // The task may have been removed by another writer.
            if self.snapshot.iter().any(|t| t.id == id) {
                self.jump_to(conn, &id)?;
            } else {
                self.detail = None;
            }
        }
        Ok(())
    }

    /// Re-render rows from the current snapshot (collapse state changed).
    pub fn rerender(&mut self) {
        self.tree.set_tasks(&self.snapshot);
    }

    pub fn jump_to(&mut self, conn: &Connection, id: &str) -> Result<()> {
        let task = ops::get_task(conn, id)?;
        let children = ops::count_children(conn, id)?;
        let queue_position = ops::queue_position(conn, id)?;
        self.detail = Some(Detail {
            task,
            children,
            queue_position,
        });
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Apply a mutation, then re-derive the tree from the store.
    /// A rejected mutation is reported in the status line.
    pub fn apply(&mut self, conn: &Connection, mutation: Mutation) -> Result<()> {
        let result = match &mutation {
            Mutation::Status(id, status) => ops::set_status(conn, id, *status),
            Mutation::Priority(id, priority) => ops::set_priority(conn, id, *priority),
            Mutation::Shift(id, delta) => ops::shift_task(conn, id, *delta).map(|_| ()),
            Mutation::Remove(id) => ops::remove_task(conn, id, true),
        };
        if let Err(e) = result {
            tracing::warn!(?mutation, error = %e, "mutation rejected");
            self.tree.error = Some(e.to_string());
            return Ok(());
        }
        self.refresh(conn)
    }

    pub fn enter_add_mode(&mut self, with_parent: bool) {
        let parent = if with_parent {
            self.tree.selected_id().map(|s| s.to_string())
        } else {
            None
        };
        self.add_form = Some(AddForm::new(parent));
    }

    pub fn cancel_add_mode(&mut self) {
        self.add_form = None;
    }

    pub fn submit_add(&mut self, conn: &Connection) -> Result<()> {
        let Some(form) = self.add_form.as_mut() else {
            return Ok(());
        };
        if !form.validate() {
            return Ok(());
        }
        match ops::add_task(
            conn,
            &form.id,
            form.parent.as_deref(),
            &form.title,
            TaskStatus::Todo,
            form.priority,
        ) {
            Ok(()) => {
                self.add_form = None;
                self.refresh(conn)?;
            }
            Err(e) => {
                form.error = Some(e.to_string());
            }
        }
        Ok(())
    }
}
