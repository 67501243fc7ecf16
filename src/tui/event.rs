use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mutation};
use crate::ui::TreeKeyAction;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    /// Re-render from the current snapshot.
    Rerender,
    Jump(String),
    Mutate(Mutation),
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if app.add_form.is_some() {
        return handle_add(app, key);
    }

    if app.detail.is_some() {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
        ) {
            app.close_detail();
        }
        return KeyAction::Continue;
    }

    match app.tree.handle_key(key) {
        TreeKeyAction::Quit => KeyAction::Quit,
        TreeKeyAction::Refresh => KeyAction::Rerender,
        TreeKeyAction::Jump(id) => KeyAction::Jump(id),
        TreeKeyAction::SetStatus(id, s) => KeyAction::Mutate(Mutation::Status(id, s)),
        TreeKeyAction::SetPriority(id, p) => KeyAction::Mutate(Mutation::Priority(id, p)),
        TreeKeyAction::Shift(id, d) => KeyAction::Mutate(Mutation::Shift(id, d)),
        TreeKeyAction::Remove(id) => KeyAction::Mutate(Mutation::Remove(id)),
        TreeKeyAction::Continue => KeyAction::Continue,
        TreeKeyAction::Unhandled => match key.code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('a') => {
                app.enter_add_mode(true);
                KeyAction::Continue
            }
            KeyCode::Char('A') => {
                app.enter_add_mode(false);
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        },
    }
}

fn handle_add(app: &mut App, key: KeyEvent) -> KeyAction {
    let Some(form) = app.add_form.as_mut() else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Esc => {
            app.cancel_add_mode();
            KeyAction::Continue
        }
        KeyCode::Tab | KeyCode::BackTab => {
            form.next_field();
            KeyAction::Continue
        }
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Backspace => {
            form.focused_buf_mut().pop();
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match c {
                    'u' => form.focused_buf_mut().clear(),
                    'p' => form.priority = form.priority.next(),
                    _ => {}
                }
            } else {
                form.focused_buf_mut().push(c);
            }
            form.error = None;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::{Priority, TaskStatus};
    use crate::ops;
    use crate::render::GlyphStyle;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let conn = db::open_memory().unwrap();
        ops::add_task(&conn, "t", None, "", TaskStatus::Todo, Priority::Medium).unwrap();
        App::new(&conn, None, GlyphStyle::Unicode).unwrap()
    }

    #[test]
    fn tree_actions_map_to_mutations() {
        let mut app = app();
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Char('d'))),
            KeyAction::Mutate(Mutation::Status("t".into(), TaskStatus::Completed))
        );
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Enter)),
            KeyAction::Jump("t".into())
        );
    }

    #[test]
    fn esc_quits_from_tree() {
        let mut app = app();
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc)), KeyAction::Quit);
    }

    #[test]
    fn typing_fills_add_form() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('A')));
        for c in "new".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Backspace));
        handle_key(&mut app, key(KeyCode::Tab));
        handle_key(&mut app, key(KeyCode::Char('T')));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL),
        );
        let form = app.add_form.as_ref().unwrap();
        assert_eq!(form.id, "ne");
        assert_eq!(form.title, "T");
        assert_eq!(form.priority, Priority::High);
        assert!(form.parent.is_none());
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), KeyAction::Submit);
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.add_form.is_none());
    }
}
