/// Terminal input collector.
///
/// Gathers one frame's worth of crossterm events:
///   - Key presses (edge-triggered; Release and Repeat are dropped)
///   - Left mouse clicks as terminal cell positions
///   - Resize notifications
///
/// Mouse reporting must be enabled by the caller (`EnableMouseCapture`).

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// A left click at terminal cell (col, row).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Click {
    pub col: u16,
    pub row: u16,
}

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    presses: Vec<KeyEvent>,

    /// Left clicks, in arrival order.
    pub clicks: Vec<Click>,

    /// Terminal was resized; a full repaint is needed.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
            resized: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.clicks.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.push(ev),
                Err(_) => break,
            }
        }
    }

    fn push(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.presses.push(key),
            Event::Mouse(m) => {
                if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                    self.clicks.push(Click { col: m.column, row: m.row });
                }
            }
            Event::Resize(..) => self.resized = true,
            _ => {}
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Was a letter pressed, either case?
    pub fn letter_pressed(&self, ch: char) -> bool {
        self.any_pressed(&[
            KeyCode::Char(ch.to_ascii_lowercase()),
            KeyCode::Char(ch.to_ascii_uppercase()),
        ])
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, col: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column: col, row, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn only_presses_count() {
        let mut input = InputState::new();
        input.push(key(KeyCode::Enter, KeyEventKind::Release));
        input.push(key(KeyCode::Tab, KeyEventKind::Repeat));
        assert!(!input.was_pressed(KeyCode::Enter));
        assert!(!input.was_pressed(KeyCode::Tab));
        input.push(key(KeyCode::Char('Q'), KeyEventKind::Press));
        assert!(input.letter_pressed('q'));
    }

    #[test]
    fn left_clicks_only() {
        let mut input = InputState::new();
        input.push(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
        input.push(mouse(MouseEventKind::Moved, 2, 2));
        input.push(mouse(MouseEventKind::Down(MouseButton::Left), 10, 4));
        assert_eq!(input.clicks, vec![Click { col: 10, row: 4 }]);
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        input.push(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(input.ctrl_c_pressed());
    }
}
