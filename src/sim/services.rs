//! Collaborators the engine calls out to.
//!
//! The simulation never draws, plays or reads anything itself. It issues
//! fire-and-forget requests through these traits; the binary plugs in the
//! terminal implementations from `ui`, tests plug in the recording fakes
//! below.

use std::collections::VecDeque;

use crate::domain::boundary::BoundaryMap;
use crate::domain::object::{ImageHandle, Object};

pub trait Renderer {
    /// A new screen became current.
    fn load_screen(&mut self, screen: usize, name: &str, boundary: &BoundaryMap);
    /// Draw one object. Called in painter's order once per tick.
    fn draw_frame(&mut self, index: usize, object: &Object, pos: (i32, i32), image: ImageHandle);
    fn set_background(&mut self, color: u32);
    fn remap_palette(&mut self, old: u8, new: u8);
    /// All objects for this tick have been drawn.
    fn end_frame(&mut self);
}

pub trait Audio {
    fn play_sound(&mut self, index: usize, priority: u8);
    fn play_music(&mut self, index: usize);
}

/// Text output, prompts and the parser's view of the world.
pub trait TextUi {
    fn notify(&mut self, text: &str);
    /// Ask a free-form question and return the player's answer.
    fn prompt(&mut self, text: &str) -> String;
    fn yes_no(&mut self, text: &str) -> bool;
    /// Did the player's last command mention `noun`?
    fn noun_mentioned(&self, noun: &str) -> bool;

    /// The hero looked at an object. Returns the action list to run.
    fn look_object(&mut self, _index: usize, object: &Object) -> Option<usize> {
        object.look_list
    }

    /// The hero took or used an object. Returns the action list to run.
    fn use_object(&mut self, _index: usize, object: &Object) -> Option<usize> {
        object.use_list
    }
}

/// Borrowed bundle handed to every simulation entry point.
pub struct Services<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub audio: &'a mut dyn Audio,
    pub text: &'a mut dyn TextUi,
}

// ══════════════════════════════════════════════════════════════
// Recording fakes
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub index: usize,
    pub pos: (i32, i32),
    pub image: ImageHandle,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub screens: Vec<usize>,
    pub frames: Vec<Vec<DrawCall>>,
    pub backgrounds: Vec<u32>,
    pub remaps: Vec<(u8, u8)>,
    current: Vec<DrawCall>,
}

impl Renderer for RecordingRenderer {
    fn load_screen(&mut self, screen: usize, _name: &str, _boundary: &BoundaryMap) {
        self.screens.push(screen);
    }

    fn draw_frame(&mut self, index: usize, _object: &Object, pos: (i32, i32), image: ImageHandle) {
        self.current.push(DrawCall { index, pos, image });
    }

    fn set_background(&mut self, color: u32) {
        self.backgrounds.push(color);
    }

    fn remap_palette(&mut self, old: u8, new: u8) {
        self.remaps.push((old, new));
    }

    fn end_frame(&mut self) {
        self.frames.push(std::mem::take(&mut self.current));
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub sounds: Vec<(usize, u8)>,
    pub music: Vec<usize>,
}

impl Audio for RecordingAudio {
    fn play_sound(&mut self, index: usize, priority: u8) {
        self.sounds.push((index, priority));
    }

    fn play_music(&mut self, index: usize) {
        self.music.push(index);
    }
}

/// Canned answers in, everything said out.
#[derive(Debug, Default)]
pub struct ScriptedText {
    pub said: Vec<String>,
    pub answers: VecDeque<String>,
    pub yes_no_answers: VecDeque<bool>,
    pub nouns: Vec<String>,
    pub looked: Vec<usize>,
    pub used: Vec<usize>,
}

impl TextUi for ScriptedText {
    fn notify(&mut self, text: &str) {
        self.said.push(text.to_string());
    }

    fn prompt(&mut self, text: &str) -> String {
        self.said.push(text.to_string());
        self.answers.pop_front().unwrap_or_default()
    }

    fn yes_no(&mut self, text: &str) -> bool {
        self.said.push(text.to_string());
        self.yes_no_answers.pop_front().unwrap_or(false)
    }

    fn noun_mentioned(&self, noun: &str) -> bool {
        self.nouns.iter().any(|n| n == noun)
    }

    fn look_object(&mut self, index: usize, object: &Object) -> Option<usize> {
        self.looked.push(index);
        object.look_list
    }

    fn use_object(&mut self, index: usize, object: &Object) -> Option<usize> {
        self.used.push(index);
        object.use_list
    }
}

/// All three fakes together.
#[derive(Debug, Default)]
pub struct Headless {
    pub renderer: RecordingRenderer,
    pub audio: RecordingAudio,
    pub text: ScriptedText,
}

impl Headless {
    pub fn services(&mut self) -> Services<'_> {
        Services {
            renderer: &mut self.renderer,
            audio: &mut self.audio,
            text: &mut self.text,
        }
    }
}
