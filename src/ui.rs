//! Shared UI primitives for the interactive tree view.

use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Clear, ListItem, ListState, Paragraph};

use crate::model::{Priority, Task, TaskStatus};
use crate::render::{GlyphStyle, TreeRenderer, TreeRow};
use crate::tree::build_tree;

// ── Rendering helpers ──────────────────────────────────────────────────

/// Style for a task status.
pub fn status_style(status: TaskStatus) -> Style {
    match status {
        TaskStatus::Completed => Style::default().dim(),
        TaskStatus::Cancelled => Style::default().dim().crossed_out(),
        TaskStatus::InProgress => Style::default().fg(Color::Green),
        TaskStatus::Blocked => Style::default().fg(Color::Red),
        TaskStatus::Todo => Style::default().fg(Color::Yellow),
    }
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red).bold(),
        Priority::Medium => Style::default().fg(Color::Cyan),
        Priority::Low => Style::default().fg(Color::DarkGray),
    }
}

/// Icon for a task status.
pub fn icon_for_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "\u{2705} ",         // ✅
        TaskStatus::InProgress => "\u{1f7e2} ",       // 🟢
        TaskStatus::Cancelled => "\u{274c} ",         // ❌
        TaskStatus::Blocked => "\u{1f6a7} ",          // 🚧
        TaskStatus::Todo => "\u{26aa} ",              // ⚪
    }
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Build ListItems for all tree rows.
pub fn build_tree_items(rows: &[TreeRow]) -> Vec<ListItem<'static>> {
    rows.iter()
        .map(|row| {
            let collapse_indicator = if row.has_children {
                if row.collapsed {
                    "> "
                } else {
                    "v "
                }
            } else {
                "  "
            };

            let title = if row.title.is_empty() {
                String::new()
            } else {
                format!("  {}", row.title)
            };

            let spans = vec![
                Span::raw(row.prefix.clone()),
                Span::raw(collapse_indicator),
                Span::styled(icon_for_status(row.status), status_style(row.status)),
                Span::styled(row.task_id.clone(), Style::default().bold()),
                Span::raw(title),
                Span::raw(" "),
                Span::styled(row.priority.badge(), priority_style(row.priority)),
            ];

            ListItem::new(Line::from(spans))
        })
        .collect()
}

/// Render a confirmation dialog overlay.
pub fn render_confirm(frame: &mut Frame, action: &str, task_id: &str, message: &str) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 5.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let title = format!(" {action} ");
    let block = ratatui::widgets::Block::default()
        .borders(ratatui::widgets::Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::from(vec![
            Span::raw("Task "),
            Span::styled(task_id, Style::default().bold()),
            Span::raw(format!(" {message}")),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Proceed? "),
            Span::styled("y", Style::default().fg(Color::Green).bold()),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).bold()),
        ]),
    ];

    frame.render_widget(Paragraph::new(text), inner);
}

// ── Tree view state ────────────────────────────────────────────────────

/// Modal state for the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMode {
    Normal,
    Help,
    ConfirmRemove(String),
}

/// Action returned by `TreeView::handle_key()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeKeyAction {
    Quit,
    /// Collapse state changed; rows must be re-rendered from the last snapshot.
    Refresh,
    /// The selected row's jump control was activated.
    Jump(String),
    SetStatus(String, TaskStatus),
    SetPriority(String, Priority),
    /// Move the task by this many slots among its siblings.
    Shift(String, isize),
    Remove(String),
    /// Key was not handled; caller should check app-specific bindings.
    Unhandled,
    /// Handled, no further action needed.
    Continue,
}

/// Per-context tree state: cursor, expand/collapse flags and the rows
/// rendered from the latest snapshot.
pub struct TreeView {
    pub rows: Vec<TreeRow>,
    pub cursor: usize,
    pub list_state: ListState,
    pub collapsed: HashSet<String>,
    pub error: Option<String>,
    pub mode: TreeMode,
    pub glyphs: GlyphStyle,
}

impl TreeView {
    pub fn new(glyphs: GlyphStyle) -> Self {
        Self {
            rows: Vec::new(),
            cursor: 0,
            list_state: ListState::default(),
            collapsed: HashSet::new(),
            error: None,
            mode: TreeMode::Normal,
            glyphs,
        }
    }

    /// Rebuild rows from scratch for a new snapshot, keeping the cursor on
    /// the same task when it still exists.
    pub fn set_tasks(&mut self, tasks: &[Task]) {
        let selected = self.selected_id().map(str::to_string);
        let forest = build_tree(tasks);
        self.rows = TreeRenderer::new(self.glyphs)
            .with_collapsed(&self.collapsed)
            .with_jump()
            .render(&forest);
        if let Some(id) = selected {
            if let Some(i) = self.rows.iter().position(|r| r.task_id == id) {
                self.cursor = i;
            }
        }
        self.clamp_cursor();
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_down(&mut self) {
        if !self.rows.is_empty() && self.cursor < self.rows.len() - 1 {
            self.cursor += 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn toggle_collapse(&mut self) {
        if let Some(row) = self.rows.get(self.cursor) {
            if row.has_children {
                let id = row.task_id.clone();
                if !self.collapsed.remove(&id) {
                    self.collapsed.insert(id);
                }
            }
        }
    }

    pub fn selected(&self) -> Option<&TreeRow> {
        self.rows.get(self.cursor)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected().map(|r| r.task_id.as_str())
    }

    /// Clamp cursor after rows change (e.g. after refresh from DB).
    pub fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= self.rows.len() {
                self.cursor = self.rows.len() - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }

    /// Handle a key press. Returns an action for the caller.
    ///
    /// Handles navigation, collapse, status/priority changes, reordering,
    /// removal, help and quit. Returns `Unhandled` for keys the caller
    /// should process.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeKeyAction {
        match &self.mode {
            TreeMode::Help => {
                if matches!(
                    key.code,
                    KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
                ) {
                    self.mode = TreeMode::Normal;
                }
                TreeKeyAction::Continue
            }
            TreeMode::ConfirmRemove(id) => {
                let id = id.clone();
                self.mode = TreeMode::Normal;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                    TreeKeyAction::Remove(id)
                } else {
                    TreeKeyAction::Continue
                }
            }
            TreeMode::Normal => {
                self.error = None;
                match key.code {
                    KeyCode::Char('q') => TreeKeyAction::Quit,
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.move_down();
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.move_up();
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char(' ') => {
                        self.toggle_collapse();
                        TreeKeyAction::Refresh
                    }
                    KeyCode::Enter => self.handle_jump(),
                    KeyCode::Char('s') => self.with_selected(|row| {
                        TreeKeyAction::SetStatus(row.task_id.clone(), row.status.next())
                    }),
                    KeyCode::Char('p') => self.with_selected(|row| {
                        TreeKeyAction::SetPriority(row.task_id.clone(), row.priority.next())
                    }),
                    KeyCode::Char('d') => self.handle_finish(TaskStatus::Completed),
                    KeyCode::Char('c') => self.handle_finish(TaskStatus::Cancelled),
                    KeyCode::Char('b') => self.with_selected(|row| {
                        TreeKeyAction::SetStatus(row.task_id.clone(), TaskStatus::Blocked)
                    }),
                    KeyCode::Char('J') => {
                        self.with_selected(|row| TreeKeyAction::Shift(row.task_id.clone(), 1))
                    }
                    KeyCode::Char('K') => {
                        self.with_selected(|row| TreeKeyAction::Shift(row.task_id.clone(), -1))
                    }
                    KeyCode::Char('x') => {
                        if let Some(id) = self.selected_id() {
                            self.mode = TreeMode::ConfirmRemove(id.to_string());
                        }
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char('?') => {
                        self.mode = TreeMode::Help;
                        TreeKeyAction::Continue
                    }
                    _ => TreeKeyAction::Unhandled,
                }
            }
        }
    }

    fn with_selected<F>(&self, f: F) -> TreeKeyAction
    where
        F: FnOnce(&TreeRow) -> TreeKeyAction,
    {
        self.selected().map(f).unwrap_or(TreeKeyAction::Continue)
    }

    fn handle_jump(&self) -> TreeKeyAction {
        let mut action = TreeKeyAction::Continue;
        if let Some(row) = self.selected() {
            row.activate_jump(|id| action = TreeKeyAction::Jump(id.to_string()));
        }
        action
    }

    fn handle_finish(&mut self, target: TaskStatus) -> TreeKeyAction {
        let Some(row) = self.selected() else {
            return TreeKeyAction::Continue;
        };
        if row.status == target {
            self.error = Some(format!("task is already {target}"));
            return TreeKeyAction::Continue;
        }
        TreeKeyAction::SetStatus(row.task_id.clone(), target)
    }
}
