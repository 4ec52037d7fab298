//! Keyboard input dispatch: global keys → overlays → panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Panel, RunKind};

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false
        }
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(panel) = c.to_digit(10).and_then(|d| Panel::from_index(d as usize - 1)) {
                app.active_panel = panel;
            }
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
        }
        KeyCode::BackTab => app.active_panel = app.active_panel.prev(),
        KeyCode::Char('?') => app.active_panel = Panel::Help,
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
        }

        // Ticker selector
        KeyCode::Char('j') | KeyCode::Down => app.next_ticker(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_ticker(),

        // Horizon slider
        KeyCode::Char('l') | KeyCode::Right => app.adjust_years(1),
        KeyCode::Char('h') | KeyCode::Left => app.adjust_years(-1),

        KeyCode::Char('r') => app.request_run(RunKind::Refresh),

        _ => {
            if app.active_panel == Panel::Raw {
                handle_raw_key(app, key);
            }
        }
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

/// Range-slider keys for the raw price chart.
fn handle_raw_key(app: &mut AppState, key: KeyEvent) {
    let len = app
        .output
        .as_ref()
        .map(|o| o.observations().len())
        .unwrap_or(0);
    match key.code {
        KeyCode::Char('+') | KeyCode::Char('=') => app.raw_window.zoom_in(len),
        KeyCode::Char('-') => app.raw_window.zoom_out(len),
        KeyCode::Char(',') | KeyCode::Char('<') => app.raw_window.pan_back(len),
        KeyCode::Char('.') | KeyCode::Char('>') => app.raw_window.pan_forward(),
        KeyCode::Char('0') => app.raw_window.reset(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LoadState;
    use crate::test_helpers::{app_with, Reply};
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn number_keys_switch_panels() {
        let (mut app, _dir) = app_with(Reply::Down);
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::Components);
        handle_key(&mut app, press(KeyCode::Char('?')));
        assert_eq!(app.active_panel, Panel::Help);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Raw);
    }

    #[test]
    fn release_events_are_ignored() {
        let (mut app, _dir) = app_with(Reply::Down);
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert!(app.running);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn welcome_overlay_swallows_first_key() {
        let (mut app, _dir) = app_with(Reply::Down);
        app.overlay = Overlay::Welcome;
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn selection_keys_queue_runs() {
        let (mut app, _dir) = app_with(Reply::Down);
        handle_key(&mut app, press(KeyCode::Down));
        assert_eq!(app.ticker().unwrap().as_str(), "GOOG");
        assert_eq!(app.load_state, LoadState::Loading);
        app.pending = None;

        handle_key(&mut app, press(KeyCode::Right));
        assert_eq!(app.years, 2);
        assert_eq!(app.pending, Some(RunKind::Run));

        handle_key(&mut app, press(KeyCode::Char('r')));
        assert_eq!(app.pending, Some(RunKind::Refresh));
    }

    #[test]
    fn error_overlay_scrolls_and_closes() {
        let (mut app, _dir) = app_with(Reply::Down);
        for i in 0..3 {
            app.push_error(crate::app::ErrorCategory::Other, format!("e{i}"), String::new());
        }
        handle_key(&mut app, press(KeyCode::Char('e')));
        assert_eq!(app.overlay, Overlay::ErrorHistory);
        for _ in 0..5 {
            handle_key(&mut app, press(KeyCode::Char('j')));
        }
        assert_eq!(app.error_scroll, 2);
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn raw_panel_zoom_keys() {
        let (mut app, _dir) = app_with(Reply::Prices);
        app.request_run(RunKind::Run);
        app.execute_pending();
        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.raw_window.visible, Some(60));
        handle_key(&mut app, press(KeyCode::Char(',')));
        assert_eq!(app.raw_window.offset_from_end, 15);
        handle_key(&mut app, press(KeyCode::Char('0')));
        assert_eq!(app.raw_window.visible, None);
    }
}
