//! Objects: hero, NPCs and props.
//!
//! Every object lives in one registry (`Vec<Object>`) loaded with the game
//! data; objects are never created or destroyed during play, only their
//! fields change. Other systems refer to objects by index. Object 0 is
//! always the hero.
//!
//! Animation frames are arena-indexed: an object owns its sequences and a
//! `(seq, frame)` cursor, and "next frame" is `(frame + 1) % len`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Registry index of the hero.
pub const HERO: usize = 0;

/// Animation mode. Ordered: anything above `AlmostInvisible` is drawn.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default,
         Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Cycling {
    Invisible,
    /// Drawn for one more tick, then becomes `Invisible`.
    AlmostInvisible,
    #[default]
    NotCycling,
    Forward,
    Backward,
}

impl Cycling {
    #[inline]
    pub fn is_visible(self) -> bool {
        self > Cycling::AlmostInvisible
    }
}

/// How an object's velocity is driven.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default,
         Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PathType {
    /// Keyboard / mouse control (hero only).
    #[default]
    User,
    /// Velocity set by script (autopilot, init_obj_vxy).
    Auto,
    /// Not moving under any policy.
    Quiet,
    /// Home in on the hero; stops cycling when it catches up.
    Chase,
    /// Like `Chase` but keeps cycling when stopped.
    Chase2,
    /// Random velocity changes.
    Wander,
    /// Like `Wander` but keeps cycling when stopped.
    Wander2,
}

/// Draw layer. Only `Floating` objects take part in collisions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default,
         Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Background,
    #[default]
    Floating,
    Foreground,
    OverOverlay,
}

/// Walking direction. The discriminant is the sequence index used for
/// multi-direction sprites.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WalkDir {
    Right = 0,
    Left = 1,
    Down = 2,
    Up = 3,
}

impl WalkDir {
    pub fn seq_index(self) -> usize {
        self as usize
    }

    pub fn velocity(self, step_dx: i32, step_dy: i32) -> (i32, i32) {
        match self {
            WalkDir::Right => (step_dx, 0),
            WalkDir::Left => (-step_dx, 0),
            WalkDir::Down => (0, step_dy),
            WalkDir::Up => (0, -step_dy),
        }
    }
}

/// One image: bounding offsets relative to the object's position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Frame {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Frame { x1, y1, x2, y2 }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    pub frames: Vec<Frame>,
}

/// Handle passed to the renderer: which frame of which sequence to show.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ImageHandle {
    pub seq: usize,
    pub frame: usize,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    pub name: String,
    pub glyph: char,
    pub screen: usize,
    pub x: i32,
    pub y: i32,
    #[serde(skip)]
    pub old_x: i32,
    #[serde(skip)]
    pub old_y: i32,
    pub vx: i32,
    pub vy: i32,
    #[serde(skip)]
    pub old_vx: i32,
    #[serde(skip)]
    pub old_vy: i32,
    /// Maximum speed per axis for chase / wander / autopilot.
    pub vx_path: i32,
    pub vy_path: i32,
    pub path_type: PathType,
    pub cycling: Cycling,
    /// Remaining animation cycles; 0 means cycle forever.
    pub cycle_count: u8,
    pub frame_interval: u8,
    #[serde(skip)]
    pub frame_timer: u8,
    pub priority: Priority,
    /// Collision radius in pixels; negative means "infinite" (engine default).
    pub radius: i8,
    pub carried: bool,
    pub state: u8,
    /// Score value awarded by add_score / sub_score.
    pub value: i32,
    /// Scheduled when this object collides with the hero.
    pub action_list: Option<usize>,
    pub look_list: Option<usize>,
    pub use_list: Option<usize>,
    /// Where the hero stands to look at / use this object. Negative x = no
    /// walk point, act from wherever the hero is.
    pub view_x: i32,
    pub view_y: i32,
    pub direction: Option<WalkDir>,
    pub sequences: Vec<Sequence>,
    pub seq: usize,
    pub frame: usize,
}

impl Default for Object {
    fn default() -> Self {
        Object {
            name: String::new(),
            glyph: '@',
            screen: 0,
            x: 0,
            y: 0,
            old_x: 0,
            old_y: 0,
            vx: 0,
            vy: 0,
            old_vx: 0,
            old_vy: 0,
            vx_path: 0,
            vy_path: 0,
            path_type: PathType::User,
            cycling: Cycling::NotCycling,
            cycle_count: 0,
            frame_interval: 0,
            frame_timer: 0,
            priority: Priority::Floating,
            radius: -1,
            carried: false,
            state: 0,
            value: 0,
            action_list: None,
            look_list: None,
            use_list: None,
            view_x: -1,
            view_y: -1,
            direction: None,
            sequences: vec![],
            seq: 0,
            frame: 0,
        }
    }
}

// ── Geometry ──

impl Object {
    /// Current image. Objects without images behave as a single point.
    #[inline]
    pub fn current_frame(&self) -> Frame {
        self.frame_at(self.seq, self.frame)
    }

    fn frame_at(&self, seq: usize, frame: usize) -> Frame {
        self.sequences
            .get(seq)
            .and_then(|s| s.frames.get(frame))
            .copied()
            .unwrap_or_default()
    }

    pub fn left(&self) -> i32 {
        self.x + self.current_frame().x1
    }

    pub fn right(&self) -> i32 {
        self.x + self.current_frame().x2
    }

    pub fn top(&self) -> i32 {
        self.y + self.current_frame().y1
    }

    pub fn baseline(&self) -> i32 {
        self.y + self.current_frame().y2
    }

    /// `(left, baseline)`: the point used for hotspots, routes and chasing.
    pub fn feet(&self) -> (i32, i32) {
        (self.left(), self.baseline())
    }

    /// `(x1, x2, y)` run painted into the occupancy overlay.
    pub fn footprint(&self) -> (i32, i32, i32) {
        let f = self.current_frame();
        (self.x + f.x1, self.x + f.x2, self.y + f.y2)
    }

    /// Footprint at the position held at the start of the tick.
    pub fn old_footprint(&self) -> (i32, i32, i32) {
        let f = self.current_frame();
        (self.old_x + f.x1, self.old_x + f.x2, self.old_y + f.y2)
    }

    /// Does this object write its footprint into the occupancy overlay?
    #[inline]
    pub fn paints_boundary(&self) -> bool {
        self.cycling.is_visible() && self.priority == Priority::Floating
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.vx != 0 || self.vy != 0
    }
}

// ── Sequence cursor ──

impl Object {
    fn frame_count(&self, seq: usize) -> usize {
        self.sequences.get(seq).map_or(0, |s| s.frames.len())
    }

    fn next_frame(&self) -> usize {
        let n = self.frame_count(self.seq);
        if n == 0 { 0 } else { (self.frame + 1) % n }
    }

    fn prev_frame(&self) -> usize {
        let n = self.frame_count(self.seq);
        if n == 0 { 0 } else { (self.frame + n - 1) % n }
    }

    /// Select the first frame of a sequence. Unknown sequences are ignored.
    pub fn set_sequence(&mut self, seq: usize) {
        if seq < self.sequences.len() {
            self.seq = seq;
            self.frame = 0;
        }
    }

    /// Select a specific frame. Out-of-range frames wrap into the sequence.
    pub fn set_frame(&mut self, seq: usize, frame: usize) {
        let n = self.frame_count(seq);
        if n > 0 {
            self.seq = seq;
            self.frame = frame % n;
        }
    }

    /// Face a walking direction, if the object has a sequence for it.
    pub fn face(&mut self, dir: WalkDir) {
        self.set_sequence(dir.seq_index());
    }

    pub fn image(&self) -> ImageHandle {
        ImageHandle { seq: self.seq, frame: self.frame }
    }
}

// ── Animation ──

impl Object {
    /// Count down the inter-frame timer. Called once per drawn tick.
    pub fn tick_frame_timer(&mut self) {
        if self.frame_timer > 0 {
            self.frame_timer -= 1;
        }
    }

    /// The image to draw this tick: cycling objects show the frame they
    /// are about to step to.
    pub fn display_image(&self) -> ImageHandle {
        let frame = match self.cycling {
            Cycling::Forward if self.frame_timer == 0 => self.next_frame(),
            Cycling::Backward if self.frame_timer == 0 => self.prev_frame(),
            _ => self.frame,
        };
        ImageHandle { seq: self.seq, frame }
    }

    /// Rotate to the next picture in the sequence.
    ///
    /// A non-zero `cycle_count` is decremented each time the sequence
    /// wraps; reaching zero stops cycling.
    pub fn advance_animation(&mut self) {
        if self.cycling == Cycling::Invisible {
            return;
        }
        if self.cycling == Cycling::AlmostInvisible {
            self.cycling = Cycling::Invisible;
        }

        match self.cycling {
            Cycling::Forward if self.frame_timer == 0 => {
                self.frame = self.next_frame();
                if self.frame_interval > 0 || self.cycle_count > 0 {
                    self.frame_timer = self.frame_interval;
                    let last = self.frame_count(self.seq).saturating_sub(1);
                    if self.frame == last {
                        self.count_cycle();
                    }
                }
            }
            Cycling::Backward if self.frame_timer == 0 => {
                self.frame = self.prev_frame();
                if self.frame_interval > 0 || self.cycle_count > 0 {
                    self.frame_timer = self.frame_interval;
                    if self.frame == 0 {
                        self.count_cycle();
                    }
                }
            }
            _ => {}
        }
    }

    fn count_cycle(&mut self) {
        if self.cycle_count > 0 {
            self.cycle_count -= 1;
            if self.cycle_count == 0 {
                self.cycling = Cycling::NotCycling;
            }
        }
    }
}

// ── Registry-level helpers ──

/// Painter's order for the objects drawn on `screen`: background first,
/// foreground last, everything else by ascending baseline. Ties keep
/// registry order.
pub fn draw_order(objects: &[Object], screen: usize) -> Vec<usize> {
    let mut order: Vec<usize> = objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.screen == screen && o.cycling >= Cycling::AlmostInvisible)
        .map(|(i, _)| i)
        .collect();

    order.sort_by_key(|&i| {
        let o = &objects[i];
        match o.priority {
            Priority::Background => (0, 0),
            Priority::Foreground => (2, 0),
            _ => (1, o.baseline()),
        }
    });
    order
}

/// Exchange the image sequences of two objects.
///
/// `a` keeps its cursor position in the sequences it receives, `b` starts
/// at the first frame. `a` is shifted vertically so its baseline stays put.
pub fn swap_images(objects: &mut [Object], a: usize, b: usize) {
    if a == b || a >= objects.len() || b >= objects.len() {
        return;
    }
    let (seq, frame) = (objects[a].seq, objects[a].frame);
    let old_y2 = objects[a].current_frame().y2;

    let tmp = std::mem::take(&mut objects[a].sequences);
    objects[a].sequences = std::mem::replace(&mut objects[b].sequences, tmp);

    objects[a].seq = 0;
    objects[a].frame = 0;
    objects[a].set_frame(seq, frame);
    objects[b].seq = 0;
    objects[b].frame = 0;

    let new_y2 = objects[a].current_frame().y2;
    objects[a].y += old_y2 - new_y2;
}

/// Autopilot: head `a` toward `b` at up to `(dx, dy)` per tick, keeping the
/// dominant axis at full speed and scaling the other.
pub fn home_in(objects: &mut [Object], a: usize, b: usize, dx: i32, dy: i32) {
    if a >= objects.len() || b >= objects.len() {
        return;
    }
    let (fa, fb) = (objects[a].current_frame(), objects[b].current_frame());
    let mut ddx = objects[a].x + fa.x1 - objects[b].x - fb.x1;
    let mut ddy = objects[a].y + fa.y1 - objects[b].y - fb.y1;
    if ddx == 0 {
        ddx = 1;
    }
    if ddy == 0 {
        ddy = 1;
    }

    let obj = &mut objects[a];
    obj.path_type = PathType::Auto;
    if ddx.abs() > ddy.abs() {
        obj.vx = dx * -ddx.signum();
        obj.vy = ((dy * ddy) / ddx).abs() * -ddy.signum();
    } else {
        obj.vy = dy * -ddy.signum();
        obj.vx = ((dx * ddx) / ddy).abs() * -ddx.signum();
    }
}
