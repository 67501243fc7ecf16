use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, Paragraph, Wrap};

use super::app::{AddField, App, Detail};
use crate::ui;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if let Some(detail) = &app.detail {
        render_detail(frame, detail, area);
        return;
    }

    render_tree(frame, app, area);

    match &app.tree.mode {
        ui::TreeMode::ConfirmRemove(id) => {
            ui::render_confirm(frame, "Remove", id, "and all its subtasks will be removed.")
        }
        ui::TreeMode::Help => render_help(frame),
        ui::TreeMode::Normal => {}
    }
    if app.add_form.is_some() {
        render_add_dialog(frame, app);
    }
}

fn render_tree(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    if app.tree.rows.is_empty() {
        let msg = Paragraph::new("No tasks. Add one with: a (child) or A (root)")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Tasks "));
        frame.render_widget(msg, chunks[0]);
    } else {
        let items = ui::build_tree_items(&app.tree.rows);
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Tasks "))
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_stateful_widget(list, chunks[0], &mut app.tree.list_state);
    }

    let footer = match &app.tree.error {
        Some(err) => Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("Enter: open  s: status  p: priority  J/K: move  a/A: add  ?: help")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, chunks[1]);
}

fn render_detail(frame: &mut Frame, detail: &Detail, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let task = &detail.task;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(ui::icon_for_status(task.status), ui::status_style(task.status)),
            Span::styled(task.id.clone(), Style::default().bold()),
            Span::raw(" "),
            Span::styled(task.priority.badge(), ui::priority_style(task.priority)),
        ]),
        Line::raw(""),
    ];
    if !task.title.is_empty() {
        lines.push(Line::raw(task.title.clone()));
        lines.push(Line::raw(""));
    }
    lines.push(Line::raw(format!("Status:   {}", task.status)));
    if let Some(p) = &task.parent_id {
        lines.push(Line::raw(format!("Parent:   {p}")));
    }
    lines.push(Line::raw(format!("Children: {}", detail.children)));
    if let Some(q) = detail.queue_position {
        lines.push(Line::raw(format!("Queue:    #{q}")));
    }
    lines.push(Line::raw(format!("Updated:  {}", task.updated_at)));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Task: {} ", task.id)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, chunks[0]);

    frame.render_widget(
        Paragraph::new("Esc/q/Enter: back").style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
}

fn render_field(
    frame: &mut Frame,
    label: &str,
    value: &str,
    focused: bool,
    chunks: &[Rect],
    idx: &mut usize,
) {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(label).style(label_style), chunks[*idx]);
    *idx += 1;

    let cursor = if focused { "_" } else { "" };
    frame.render_widget(
        Paragraph::new(format!("  {value}{cursor}")).style(Style::default().fg(Color::White)),
        chunks[*idx],
    );
    *idx += 1;
}

fn render_add_dialog(frame: &mut Frame, app: &App) {
    let Some(form) = &app.add_form else {
        return;
    };

    let term = frame.area();
    let width = 60.min(term.width.saturating_sub(4));
    let content_rows: u16 = 7 + u16::from(form.error.is_some()); // parent + priority + 2*(label+input) + hint
    let height = (content_rows + 2).min(term.height.saturating_sub(2)); // +2 for borders
    let area = ui::centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Add Task ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1); 6];
    if form.error.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1)); // hint
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut idx = 0;

    let parent_text = match &form.parent {
        Some(p) => format!("Parent: {p}"),
        None => "Parent: (none)".into(),
    };
    frame.render_widget(
        Paragraph::new(parent_text).style(Style::default().fg(Color::DarkGray)),
        chunks[idx],
    );
    idx += 1;

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw("Priority: "),
            Span::styled(form.priority.badge(), ui::priority_style(form.priority)),
        ])),
        chunks[idx],
    );
    idx += 1;

    render_field(
        frame,
        "Id:",
        &form.id,
        form.focused == AddField::Id,
        &chunks,
        &mut idx,
    );
    render_field(
        frame,
        "Title:",
        &form.title,
        form.focused == AddField::Title,
        &chunks,
        &mut idx,
    );

    if let Some(err) = &form.error {
        frame.render_widget(
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
            chunks[idx],
        );
        idx += 1;
    }

    frame.render_widget(
        Paragraph::new("Enter: submit  Tab: fields  C-p: priority  C-u: clear  Esc: cancel")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[idx],
    );
}

fn render_help(frame: &mut Frame) {
    const KEYS: [(&str, &str); 14] = [
        ("j/Down  ", "Move down"),
        ("k/Up    ", "Move up"),
        ("Space   ", "Toggle collapse"),
        ("Enter   ", "Open task"),
        ("s       ", "Cycle status"),
        ("d       ", "Mark completed"),
        ("c       ", "Cancel task"),
        ("b       ", "Mark blocked"),
        ("p       ", "Cycle priority"),
        ("J/K     ", "Move down/up among siblings"),
        ("a/A     ", "Add child/root task"),
        ("x       ", "Remove task"),
        ("?       ", "Toggle help"),
        ("q       ", "Quit"),
    ];

    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = (KEYS.len() as u16 + 2).min(term.height.saturating_sub(2));
    let area = ui::centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let help_text: Vec<Line> = KEYS
        .iter()
        .map(|(k, desc)| {
            Line::from(vec![
                Span::styled(*k, Style::default().fg(Color::Cyan)),
                Span::raw(*desc),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(help_text), inner);
}
