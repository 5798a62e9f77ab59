/// Text line: game messages, prompts and the typed command line.
///
/// Messages are queued and shown one at a time on the renderer's message
/// row. Prompts block: they draw straight onto the message row, read keys
/// until Enter, and mark the screen dirty so the renderer repaints it.
use std::collections::VecDeque;
use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tracing::{info, warn};

use crate::domain::object::HERO;
use crate::sim::navigation::WalkTarget;
use crate::sim::services::TextUi;
use crate::sim::world::WorldState;

/// Longest line the player can type.
const MAX_LINE: usize = 60;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineEdit {
    Continue,
    Done,
    Cancel,
}

/// Apply one key press to a line being typed.
pub fn edit_line(buf: &mut String, key: &KeyEvent) -> LineEdit {
    if key.kind != KeyEventKind::Press {
        return LineEdit::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => LineEdit::Cancel,
            _ => LineEdit::Continue,
        };
    }
    match key.code {
        KeyCode::Enter => LineEdit::Done,
        KeyCode::Esc => LineEdit::Cancel,
        KeyCode::Backspace => {
            buf.pop();
            LineEdit::Continue
        }
        KeyCode::Char(c) if buf.chars().count() < MAX_LINE => {
            buf.push(c);
            LineEdit::Continue
        }
        _ => LineEdit::Continue,
    }
}

/// Turn a typed command into a walk target. Understands `look [at] X`,
/// `examine X`, `get X`, `take X` and `use X`, where X names an object on
/// the current screen.
pub fn parse_command(line: &str, world: &WorldState) -> Option<WalkTarget> {
    let lower = line.to_lowercase();
    let mut words = lower.split_whitespace();
    let verb = words.next()?;
    let rest: Vec<&str> = words.filter(|w| !matches!(*w, "at" | "the" | "a" | "an")).collect();
    if rest.is_empty() {
        return None;
    }
    let noun = rest.join(" ");
    let index = world.objects.iter().enumerate().position(|(i, o)| {
        i != HERO && o.screen == world.screen && o.name.to_lowercase() == noun
    })?;
    match verb {
        "look" | "examine" | "x" => Some(WalkTarget::Look(index)),
        "get" | "take" | "use" => Some(WalkTarget::Get(index)),
        _ => None,
    }
}

pub struct TerminalText {
    messages: VecDeque<String>,
    /// Words of the last command typed.
    words: Vec<String>,
    /// Terminal row used for prompts.
    row: u16,
    dirty: bool,
}

impl TerminalText {
    pub fn new() -> Self {
        TerminalText { messages: VecDeque::new(), words: Vec::new(), row: 0, dirty: false }
    }

    pub fn set_row(&mut self, row: u16) {
        self.row = row;
    }

    /// Next queued message, if any.
    pub fn take_message(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    /// True once after a prompt drew over the screen.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Read a command line and remember its words for `noun_mentioned`.
    pub fn read_command(&mut self) -> String {
        let line = self.read_line("> ");
        self.words = line.to_lowercase().split_whitespace().map(str::to_string).collect();
        line
    }

    fn read_line(&mut self, label: &str) -> String {
        self.dirty = true;
        let mut buf = String::new();
        loop {
            if let Err(e) = self.draw_line(label, &buf) {
                warn!(error = %e, "prompt draw failed");
                return buf;
            }
            match event::read() {
                Ok(Event::Key(key)) => match edit_line(&mut buf, &key) {
                    LineEdit::Continue => {}
                    LineEdit::Done => return buf,
                    LineEdit::Cancel => return String::new(),
                },
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "prompt read failed");
                    return buf;
                }
            }
        }
    }

    fn draw_line(&self, label: &str, buf: &str) -> io::Result<()> {
        let mut out = io::stdout();
        queue!(
            out,
            MoveTo(0, self.row),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::White),
            Clear(ClearType::CurrentLine),
            Print(label),
            Print(buf),
            Print('_')
        )?;
        out.flush()
    }
}

impl Default for TerminalText {
    fn default() -> Self {
        Self::new()
    }
}

impl TextUi for TerminalText {
    fn notify(&mut self, text: &str) {
        info!(text, "message");
        self.messages.push_back(text.to_string());
    }

    fn prompt(&mut self, text: &str) -> String {
        let label = format!("{text} ");
        self.read_line(&label)
    }

    fn yes_no(&mut self, text: &str) -> bool {
        let label = format!("{text} (y/n) ");
        self.read_line(&label).trim().to_lowercase().starts_with('y')
    }

    fn noun_mentioned(&self, noun: &str) -> bool {
        let noun = noun.to_lowercase();
        self.words.iter().any(|w| *w == noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::sim::data::GameData;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace() {
        let mut buf = String::new();
        for c in "lokk".chars() {
            assert_eq!(edit_line(&mut buf, &press(KeyCode::Char(c))), LineEdit::Continue);
        }
        edit_line(&mut buf, &press(KeyCode::Backspace));
        edit_line(&mut buf, &press(KeyCode::Backspace));
        edit_line(&mut buf, &press(KeyCode::Char('o')));
        edit_line(&mut buf, &press(KeyCode::Char('k')));
        assert_eq!(buf, "look");
        assert_eq!(edit_line(&mut buf, &press(KeyCode::Enter)), LineEdit::Done);
        assert_eq!(edit_line(&mut buf, &press(KeyCode::Esc)), LineEdit::Cancel);
    }

    #[test]
    fn line_length_is_capped() {
        let mut buf = "x".repeat(MAX_LINE);
        edit_line(&mut buf, &press(KeyCode::Char('y')));
        assert_eq!(buf.len(), MAX_LINE);
    }

    #[test]
    fn noun_matching_uses_last_command() {
        let mut t = TerminalText::new();
        assert!(!t.noun_mentioned("lamp"));
        t.words = vec!["get".into(), "lamp".into()];
        assert!(t.noun_mentioned("Lamp"));
        assert!(!t.noun_mentioned("door"));
    }

    #[test]
    fn messages_queue_in_order() {
        let mut t = TerminalText::new();
        t.notify("one");
        t.notify("two");
        assert_eq!(t.take_message().as_deref(), Some("one"));
        assert_eq!(t.take_message().as_deref(), Some("two"));
        assert_eq!(t.take_message(), None);
    }

    #[test]
    fn commands_name_objects_on_screen() {
        let data = GameData::from_toml_str(
            r##"
title = "t"
start_screen = 0

[[screens]]
name = "hall"
boundary = ["."]

[[screens]]
name = "yard"
boundary = ["."]

[[objects]]
name = "hero"
screen = 0

[[objects]]
name = "brass lamp"
screen = 0

[[objects]]
name = "rake"
screen = 1
"##,
        )
        .unwrap();
        let world = WorldState::new(data, EngineConfig::default());
        assert_eq!(parse_command("look at the brass lamp", &world), Some(WalkTarget::Look(1)));
        assert_eq!(parse_command("Take Brass Lamp", &world), Some(WalkTarget::Get(1)));
        assert_eq!(parse_command("get rake", &world), None);
        assert_eq!(parse_command("dance lamp", &world), None);
        assert_eq!(parse_command("look", &world), None);
    }
}
