use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use typhoon_core::{Config, DismissReason};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(Instant::now()),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    if app.show_attach_prompt {
        handle_attach_prompt(app, key);
        return Ok(());
    }

    if app.show_view_picker {
        handle_view_picker(app, key)?;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_attach_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_attach_prompt(),
        KeyCode::Enter => {
            app.attach_from_prompt(Instant::now());
        }
        KeyCode::Backspace => app.attach_backspace(),
        KeyCode::Left => {
            app.attach_cursor = app.attach_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.attach_input.chars().count();
            app.attach_cursor = (app.attach_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.attach_cursor = 0,
        KeyCode::End => app.attach_cursor = app.attach_input.chars().count(),
        KeyCode::Char(c) => app.attach_insert_str(&c.to_string()),
        _ => {}
    }
}

fn handle_view_picker(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc => app.show_view_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.view_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.view_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(view) = app.select_view() {
                if let Err(e) = Config::save_view(view.as_str()) {
                    tracing::warn!(error = %e, "could not persist view choice");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.cursor_end();
        }

        // Attachment
        KeyCode::Char('a') => app.open_attach_prompt(),
        KeyCode::Char('x') => app.clear_file(),

        // Half-page scroll (must be before plain 'd'/'u' style bindings)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.half_page());
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.half_page());
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        KeyCode::Char('V') => app.open_view_picker(),

        KeyCode::Esc => {
            app.dismiss_notification(DismissReason::CloseAction);
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => {
            // Same guard as the disabled send button
            if !app.session.is_loading() {
                app.send();
            }
        }
        KeyCode::Char('o') if ctrl => app.open_attach_prompt(),
        KeyCode::Char('x') if ctrl => app.clear_file(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.show_attach_prompt {
        // Paths dropped onto the terminal arrive as a paste
        app.attach_insert_str(text.trim_end_matches(|c| c == '\n' || c == '\r'));
    } else if !app.show_view_picker {
        app.input_mode = InputMode::Editing;
        app.insert_str(text);
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(3),
        MouseEventKind::Down(MouseButton::Left) => {
            if !app.session.notification().is_open() {
                return;
            }
            let on_notification = app
                .notification_area
                .map(|r| point_in_rect(x, y, r))
                .unwrap_or(false);
            let reason = if on_notification {
                DismissReason::CloseAction
            } else {
                DismissReason::Clickaway
            };
            app.dismiss_notification(reason);
        }
        _ => {}
    }
}
