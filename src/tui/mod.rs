mod app;
mod event;
mod view;

use std::io;

use anyhow::Result;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use rusqlite::Connection;

use crate::config::Config;
use crate::watch;
use app::App;
use event::KeyAction;

pub fn run(config: &Config, conn: &Connection, root: Option<&str>) -> Result<()> {
    let mut app = App::new(conn, root, config.glyphs)?;

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, config, conn);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    config: &Config,
    conn: &Connection,
) -> Result<()> {
    let (_watcher, rx) = watch::watch_db(&config.db_path)?;

    loop {
        terminal.draw(|frame| view::render(frame, app))?;

        if ct_event::poll(config.poll_interval)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    match event::handle_key(app, key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Submit => app.submit_add(conn)?,
                        KeyAction::Rerender => app.rerender(),
                        KeyAction::Jump(id) => {
                            if let Err(e) = app.jump_to(conn, &id) {
                                app.tree.error = Some(e.to_string());
                            }
                        }
                        KeyAction::Mutate(mutation) => app.apply(conn, mutation)?,
                        KeyAction::Continue => {}
                    }
                }
            }
        }

        // Another writer may have changed the store; rebuild from scratch.
        if watch::wait_for_change(&rx, std::time::Duration::ZERO) {
            watch::drain_events(&rx);
            app.refresh(conn)?;
        }
    }
}
