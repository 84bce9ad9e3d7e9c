use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.on_tick(Instant::now()),
        AppEvent::Emission(generation) => app.on_emission(generation),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_template_picker {
        handle_template_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_template_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_template_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.template_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.template_picker_nav_up();
        }
        KeyCode::Enter => {
            app.confirm_template_picker();
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing (the input may already hold the suggestion)
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Load another conversation
        KeyCode::Char('l') => app.open_template_picker(),

        KeyCode::Char('t') => app.toggle_theme(),

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_up(app.chat_height / 2);
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.scroll_chat_to_top(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.send_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::KeyEventState;
    use crossterm::event::KeyEventKind;
    use scriptchat_core::{ConversationScript, SiteConfig, TemplateStore, ThemeName, Timing, Turn};
    use tokio::sync::mpsc;

    use super::*;
    use crate::app::AppOptions;

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let mut store = TemplateStore::new();
        store.insert(
            "template_one",
            ConversationScript::from_turns(vec![Turn::assistant("hi"), Turn::user("héllo")]),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let options = AppOptions {
            theme: ThemeName::Premium,
            initial_template: "template_one".to_string(),
            timing: Timing {
                lead_in: Duration::ZERO,
                ..Timing::default()
            },
        };
        (App::new(store, SiteConfig::builtin(), options, tx), rx)
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_editing_multibyte_input() {
        let (mut app, _rx) = app();
        handle_event(&mut app, press(KeyCode::Char('i'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.input, "héllo");

        handle_event(&mut app, press(KeyCode::Home)).unwrap();
        handle_event(&mut app, press(KeyCode::Right)).unwrap();
        handle_event(&mut app, press(KeyCode::Right)).unwrap();
        handle_event(&mut app, press(KeyCode::Backspace)).unwrap();
        assert_eq!(app.input, "hllo");

        handle_event(&mut app, press(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.input, "hello");
    }

    #[tokio::test]
    async fn test_enter_sends_message() {
        let (mut app, _rx) = app();
        handle_event(&mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.history().last().unwrap().content, "héllo");
        assert_eq!(app.input, "");
    }

    #[tokio::test]
    async fn test_picker_captures_keys() {
        let (mut app, _rx) = app();
        handle_event(&mut app, press(KeyCode::Char('l'))).unwrap();
        assert!(app.show_template_picker);

        // 'q' doesn't quit while the picker is open
        handle_event(&mut app, press(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);

        handle_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(!app.show_template_picker);
        handle_event(&mut app, press(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_theme_toggle_key() {
        let (mut app, _rx) = app();
        handle_event(&mut app, press(KeyCode::Char('t'))).unwrap();
        assert_eq!(app.theme, ThemeName::Retro);
        handle_event(&mut app, press(KeyCode::Char('t'))).unwrap();
        handle_event(&mut app, press(KeyCode::Char('t'))).unwrap();
        assert_eq!(app.theme, ThemeName::Premium);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let (mut app, _rx) = app();
        app.input_mode = InputMode::Editing;
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).unwrap();
        assert!(app.should_quit);
    }
}
