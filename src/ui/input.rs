/// Input translation.
///
/// Drains every pending terminal event once per frame and turns the ones
/// the game cares about into `Command`s:
///   - Arrow keys walk (edge-triggered; the engine toggles on repeats)
///   - Left click walks to the clicked pixel
///   - Enter opens the command line
///   - F5 / F9 save and restore, `q` / Esc / Ctrl-C quit
///
/// Key repeat is filtered out so holding an arrow does not stop and start
/// the hero every frame.
use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use tracing::warn;

use crate::domain::object::WalkDir;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Walk(WalkDir),
    /// Terminal cell that was clicked (column, row).
    Click(u16, u16),
    Type,
    Save,
    Load,
    Quit,
    /// Any other key; used to dismiss the game-over screen.
    AnyKey,
}

pub struct InputState {
    /// Commands decoded during the most recent `drain_events()` call.
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8) }
    }

    /// Read all available events without blocking.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) -> &[Command] {
        self.commands.clear();
        loop {
            match poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!(error = %e, "input poll failed");
                    break;
                }
            }
            match event::read() {
                Ok(ev) => {
                    if let Some(cmd) = translate(&ev) {
                        self.commands.push(cmd);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    break;
                }
            }
        }
        &self.commands
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map one terminal event onto a game command.
pub fn translate(ev: &Event) -> Option<Command> {
    match ev {
        Event::Key(key) => translate_key(key),
        Event::Mouse(MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column, row, .. }) => {
            Some(Command::Click(*column, *row))
        }
        _ => None,
    }
}

fn translate_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(Command::Quit);
    }
    let cmd = match key.code {
        KeyCode::Right => Command::Walk(WalkDir::Right),
        KeyCode::Left => Command::Walk(WalkDir::Left),
        KeyCode::Down => Command::Walk(WalkDir::Down),
        KeyCode::Up => Command::Walk(WalkDir::Up),
        KeyCode::Enter => Command::Type,
        KeyCode::F(5) => Command::Save,
        KeyCode::F(9) => Command::Load,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        _ => Command::AnyKey,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind))
    }

    #[test]
    fn arrows_walk_on_press_only() {
        assert_eq!(
            translate(&key(KeyCode::Left, KeyEventKind::Press)),
            Some(Command::Walk(WalkDir::Left))
        );
        assert_eq!(translate(&key(KeyCode::Left, KeyEventKind::Repeat)), None);
        assert_eq!(translate(&key(KeyCode::Left, KeyEventKind::Release)), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(translate(&ev), Some(Command::Quit));
        assert_eq!(translate(&key(KeyCode::Char('c'), KeyEventKind::Press)), Some(Command::AnyKey));
    }

    #[test]
    fn left_click_reports_cell() {
        let ev = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(translate(&ev), Some(Command::Click(12, 7)));
        let right = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(translate(&right), None);
    }

    #[test]
    fn function_keys_save_and_load() {
        assert_eq!(translate(&key(KeyCode::F(5), KeyEventKind::Press)), Some(Command::Save));
        assert_eq!(translate(&key(KeyCode::F(9), KeyEventKind::Press)), Some(Command::Load));
    }
}
