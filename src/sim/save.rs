//! Save and load a running game.
//!
//! ## What is saved
//!
//! Everything actions can change: the object registry's mutable fields,
//! the raw event table (slots, links, free list), route and maze state,
//! score, bonus bits, screen states and flags. Static game data is not
//! saved; a save only loads into a world built from the same game file.
//!
//! ## File format
//!
//! Key-value lines, comma separated fields. Missing links are `-`. Enums
//! use their snake_case names.
//!
//! ```text
//! save_tick=120
//! queue=50,3,7,8
//! slot=3,1,12,0,1,125,-,4
//! object=0,1,100,80,0,0,...
//! ```
//!
//! Event times are absolute ticks, so on load they are shifted by
//! `now - save_tick`: whatever was due in 5 ticks is still due in 5 ticks.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::domain::action::ActionRef;
use crate::domain::object::{Cycling, Frame, PathType, Priority, Sequence, WalkDir};
use crate::domain::route::{Point, Route, RouteGoal, RouteGoalKind};
use crate::error::{EngineError, Result};
use crate::sim::event::{Event, EventQueue, RawQueue, Slot};
use crate::sim::maze::MazeState;
use crate::sim::services::Services;
use crate::sim::world::{Flags, WorldState};

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct SaveData {
    pub tick: u32,
    pub screen: usize,
    pub score: i32,
    pub flags: Flags,
    pub maze: MazeState,
    pub route: Route,
    pub last_walk: Option<WalkDir>,
    pub queue: RawQueue,
    pub objects: Vec<SavedObject>,
    pub scored: Vec<bool>,
    pub screen_states: Vec<u8>,
}

/// The parts of an object that change during play.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedObject {
    pub screen: usize,
    pub x: i32,
    pub y: i32,
    pub vx: i32,
    pub vy: i32,
    pub vx_path: i32,
    pub vy_path: i32,
    pub path_type: PathType,
    pub cycling: Cycling,
    pub cycle_count: u8,
    pub frame_interval: u8,
    pub frame_timer: u8,
    pub priority: Priority,
    pub radius: i8,
    pub carried: bool,
    pub state: u8,
    pub value: i32,
    pub view_x: i32,
    pub view_y: i32,
    pub direction: Option<WalkDir>,
    pub seq: usize,
    pub frame: usize,
    /// Image sequences travel with the object after a swap.
    pub sequences: Vec<Sequence>,
}

// ══════════════════════════════════════════════════════════════
// Capture / restore (WorldState ↔ SaveData)
// ══════════════════════════════════════════════════════════════

pub fn capture(w: &WorldState) -> SaveData {
    SaveData {
        tick: w.tick,
        screen: w.screen,
        score: w.score,
        flags: Flags { quit: false, ..w.flags },
        maze: w.maze,
        route: w.route.clone(),
        last_walk: w.last_walk,
        queue: w.queue.raw(),
        objects: w
            .objects
            .iter()
            .map(|o| SavedObject {
                screen: o.screen,
                x: o.x,
                y: o.y,
                vx: o.vx,
                vy: o.vy,
                vx_path: o.vx_path,
                vy_path: o.vy_path,
                path_type: o.path_type,
                cycling: o.cycling,
                cycle_count: o.cycle_count,
                frame_interval: o.frame_interval,
                frame_timer: o.frame_timer,
                priority: o.priority,
                radius: o.radius,
                carried: o.carried,
                state: o.state,
                value: o.value,
                view_x: o.view_x,
                view_y: o.view_y,
                direction: o.direction,
                seq: o.seq,
                frame: o.frame,
                sequences: o.sequences.clone(),
            })
            .collect(),
        scored: w.scored.clone(),
        screen_states: w.screen_states.clone(),
    }
}

/// Overwrite the world's runtime state with a save. The world keeps its
/// own tick counter; queued event times are rebased onto it.
pub fn restore(w: &mut WorldState, save: SaveData) -> Result<()> {
    check_count("objects", save.objects.len(), w.objects.len())?;
    check_count("bonuses", save.scored.len(), w.scored.len())?;
    check_count("screens", save.screen_states.len(), w.screen_states.len())?;
    let screen_def = w
        .data
        .screens
        .get(save.screen)
        .ok_or_else(|| corrupt(format!("unknown screen {}", save.screen)))?;

    for slot in &save.queue.slots {
        if let Some(e) = slot.event {
            let known = w
                .data
                .lists
                .get(e.action.list)
                .map_or(false, |l| e.action.index < l.actions.len());
            if !known {
                return Err(corrupt(format!(
                    "event refers to unknown action {}:{}",
                    e.action.list, e.action.index
                )));
            }
        }
    }
    let mut queue = EventQueue::from_raw(save.queue, w.queue.capacity())?;
    queue.rebase(save.tick, w.tick);

    w.boundary.load_rows(&screen_def.boundary);
    w.queue = queue;
    w.screen = save.screen;
    w.score = save.score;
    w.flags = save.flags;
    w.maze = save.maze;
    w.route = save.route;
    w.last_walk = save.last_walk;
    w.scored = save.scored;
    w.screen_states = save.screen_states;

    for (o, s) in w.objects.iter_mut().zip(save.objects) {
        o.screen = s.screen;
        o.x = s.x;
        o.y = s.y;
        o.old_x = s.x;
        o.old_y = s.y;
        o.vx = s.vx;
        o.vy = s.vy;
        o.old_vx = s.vx;
        o.old_vy = s.vy;
        o.vx_path = s.vx_path;
        o.vy_path = s.vy_path;
        o.path_type = s.path_type;
        o.cycling = s.cycling;
        o.cycle_count = s.cycle_count;
        o.frame_interval = s.frame_interval;
        o.frame_timer = s.frame_timer;
        o.priority = s.priority;
        o.radius = s.radius;
        o.carried = s.carried;
        o.state = s.state;
        o.value = s.value;
        o.view_x = s.view_x;
        o.view_y = s.view_y;
        o.direction = s.direction;
        o.sequences = s.sequences;
        o.seq = s.seq;
        o.frame = s.frame;
    }
    Ok(())
}

fn check_count(what: &str, saved: usize, expected: usize) -> Result<()> {
    if saved != expected {
        return Err(corrupt(format!("{saved} {what} saved, game has {expected}")));
    }
    Ok(())
}

fn corrupt(msg: String) -> EngineError {
    EngineError::CorruptSave(msg)
}

// ══════════════════════════════════════════════════════════════
// Files
// ══════════════════════════════════════════════════════════════

pub fn save_to_file(w: &WorldState, path: &Path) -> Result<()> {
    std::fs::write(path, serialize(&capture(w)))?;
    info!(path = %path.display(), tick = w.tick, "game saved");
    Ok(())
}

/// Load a save into `w` and tell the renderer which screen is now current.
pub fn load_from_file(w: &mut WorldState, services: &mut Services, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let save = parse_save(&content)?;
    restore(w, save)?;
    let name = w.data.screens.get(w.screen).map(|s| s.name.as_str()).unwrap_or("");
    services.renderer.load_screen(w.screen, name, &w.boundary);
    info!(path = %path.display(), screen = w.screen, events = w.queue.len(), "game loaded");
    Ok(())
}

/// Player-initiated restore. Returns `Ok(false)` when the file cannot be
/// read (nothing was changed). A file that reads but does not parse or
/// restore is an error.
pub fn try_load(w: &mut WorldState, services: &mut Services, path: &Path) -> Result<bool> {
    match load_from_file(w, services, path) {
        Ok(()) => Ok(true),
        Err(EngineError::Io(e)) => {
            warn!(path = %path.display(), error = %e, "no save to restore");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn link(i: Option<usize>) -> String {
    i.map_or_else(|| "-".to_string(), |i| i.to_string())
}

fn bit(b: bool) -> u8 {
    u8::from(b)
}

fn dir_str(d: Option<WalkDir>) -> String {
    d.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn sequences_str(seqs: &[Sequence]) -> String {
    seqs.iter()
        .map(|s| {
            s.frames
                .iter()
                .map(|f| format!("{}:{}:{}:{}", f.x1, f.y1, f.x2, f.y2))
                .collect::<Vec<_>>()
                .join(";")
        })
        .collect::<Vec<_>>()
        .join("|")
}

pub fn serialize(s: &SaveData) -> String {
    let mut out = String::with_capacity(4096);
    let _ = writeln!(out, "save_tick={}", s.tick);
    let _ = writeln!(out, "screen={}", s.screen);
    let _ = writeln!(out, "score={}", s.score);
    let _ = writeln!(
        out,
        "flags={},{},{}",
        bit(s.flags.game_over),
        bit(s.flags.story_mode),
        bit(s.flags.jump_exit)
    );

    let m = &s.maze;
    let _ = writeln!(
        out,
        "maze={},{},{},{},{},{},{},{},{},{}",
        bit(m.enabled),
        m.size,
        m.x1,
        m.y1,
        m.x2,
        m.y2,
        m.x3,
        m.x4,
        m.first_screen,
        link(m.target)
    );

    let r = &s.route;
    let _ = writeln!(
        out,
        "route={},{},{},{}",
        r.goal.kind(),
        r.goal.target(),
        link(r.active),
        bit(r.turned)
    );
    for p in &r.nodes {
        let _ = writeln!(out, "route_node={},{}", p.x, p.y);
    }
    let _ = writeln!(out, "last_walk={}", dir_str(s.last_walk));

    let q = &s.queue;
    let _ = writeln!(
        out,
        "queue={},{},{},{}",
        q.slots.len(),
        link(q.head),
        link(q.tail),
        link(q.free)
    );
    for (i, slot) in q.slots.iter().enumerate() {
        let (list, sub, local, time) = match slot.event {
            Some(e) => (e.action.list, e.action.index, e.local, e.time),
            None => (0, 0, false, 0),
        };
        let _ = writeln!(
            out,
            "slot={},{},{},{},{},{},{},{}",
            i,
            bit(slot.event.is_some()),
            list,
            sub,
            bit(local),
            time,
            link(slot.prev),
            link(slot.next)
        );
    }

    for (i, o) in s.objects.iter().enumerate() {
        let _ = writeln!(
            out,
            "object={},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            i,
            o.screen,
            o.x,
            o.y,
            o.vx,
            o.vy,
            o.vx_path,
            o.vy_path,
            o.path_type,
            o.cycling,
            o.cycle_count,
            o.frame_interval,
            o.frame_timer,
            o.priority,
            o.radius,
            bit(o.carried),
            o.state,
            o.value,
            o.view_x,
            o.view_y,
            dir_str(o.direction),
            o.seq,
            o.frame,
            sequences_str(&o.sequences)
        );
    }

    let bits: String = s.scored.iter().map(|&b| if b { '1' } else { '0' }).collect();
    let _ = writeln!(out, "bonus={bits}");
    let states: Vec<String> = s.screen_states.iter().map(|v| v.to_string()).collect();
    let _ = writeln!(out, "screen_states={}", states.join(","));
    out
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

struct Fields<'a> {
    key: &'a str,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(key: &'a str, val: &'a str, expected: usize) -> Result<Self> {
        let parts: Vec<&str> = val.split(',').map(str::trim).collect();
        if parts.len() != expected {
            return Err(corrupt(format!(
                "{key}: {} fields, expected {expected}",
                parts.len()
            )));
        }
        Ok(Fields { key, parts })
    }

    fn get<T: FromStr>(&self, i: usize) -> Result<T> {
        self.parts[i]
            .parse()
            .map_err(|_| corrupt(format!("{}: bad field {} '{}'", self.key, i, self.parts[i])))
    }

    fn flag(&self, i: usize) -> Result<bool> {
        match self.parts[i] {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(corrupt(format!("{}: bad flag '{other}'", self.key))),
        }
    }

    fn link(&self, i: usize) -> Result<Option<usize>> {
        if self.parts[i] == "-" {
            Ok(None)
        } else {
            self.get(i).map(Some)
        }
    }

    fn dir(&self, i: usize) -> Result<Option<WalkDir>> {
        if self.parts[i] == "-" {
            Ok(None)
        } else {
            self.get(i).map(Some)
        }
    }
}

fn parse_sequences(val: &str) -> Result<Vec<Sequence>> {
    if val.is_empty() {
        return Ok(vec![]);
    }
    val.split('|')
        .map(|seq| {
            let frames = seq
                .split(';')
                .filter(|f| !f.is_empty())
                .map(|f| {
                    let c: Vec<i32> = f
                        .split(':')
                        .map(|n| n.parse().map_err(|_| corrupt(format!("bad frame '{f}'"))))
                        .collect::<Result<_>>()?;
                    match c.as_slice() {
                        [x1, y1, x2, y2] => Ok(Frame::new(*x1, *y1, *x2, *y2)),
                        _ => Err(corrupt(format!("bad frame '{f}'"))),
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Sequence { frames })
        })
        .collect()
}

fn parse_object(val: &str) -> Result<(usize, SavedObject)> {
    let f = Fields::new("object", val, 24)?;
    Ok((
        f.get(0)?,
        SavedObject {
            screen: f.get(1)?,
            x: f.get(2)?,
            y: f.get(3)?,
            vx: f.get(4)?,
            vy: f.get(5)?,
            vx_path: f.get(6)?,
            vy_path: f.get(7)?,
            path_type: f.get(8)?,
            cycling: f.get(9)?,
            cycle_count: f.get(10)?,
            frame_interval: f.get(11)?,
            frame_timer: f.get(12)?,
            priority: f.get(13)?,
            radius: f.get(14)?,
            carried: f.flag(15)?,
            state: f.get(16)?,
            value: f.get(17)?,
            view_x: f.get(18)?,
            view_y: f.get(19)?,
            direction: f.dir(20)?,
            seq: f.get(21)?,
            frame: f.get(22)?,
            sequences: parse_sequences(f.parts[23])?,
        },
    ))
}

fn parse_slot(val: &str) -> Result<(usize, Slot)> {
    let f = Fields::new("slot", val, 8)?;
    let event = if f.flag(1)? {
        Some(Event {
            action: ActionRef { list: f.get(2)?, index: f.get(3)? },
            local: f.flag(4)?,
            time: f.get(5)?,
        })
    } else {
        None
    };
    Ok((f.get(0)?, Slot { event, prev: f.link(6)?, next: f.link(7)? }))
}

/// Upper bound on the slot count a save may declare. Checked before the
/// slot table is allocated; the exact match against the live queue happens
/// in `restore`.
const MAX_SAVED_SLOTS: usize = 1 << 16;

pub fn parse_save(content: &str) -> Result<SaveData> {
    let mut tick = None;
    let mut screen = None;
    let mut score = 0;
    let mut flags = Flags::default();
    let mut maze = MazeState::default();
    let mut route = Route::default();
    let mut last_walk = None;
    let mut queue: Option<RawQueue> = None;
    let mut objects: Vec<SavedObject> = vec![];
    let mut scored = vec![];
    let mut screen_states = vec![];

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, val)) = line.split_once('=') else {
            return Err(corrupt(format!("malformed line '{line}'")));
        };

        match key {
            "save_tick" => tick = Some(Fields::new(key, val, 1)?.get(0)?),
            "screen" => screen = Some(Fields::new(key, val, 1)?.get(0)?),
            "score" => score = Fields::new(key, val, 1)?.get(0)?,
            "flags" => {
                let f = Fields::new(key, val, 3)?;
                flags = Flags {
                    game_over: f.flag(0)?,
                    story_mode: f.flag(1)?,
                    jump_exit: f.flag(2)?,
                    quit: false,
                };
            }
            "maze" => {
                let f = Fields::new(key, val, 10)?;
                maze = MazeState {
                    enabled: f.flag(0)?,
                    size: f.get(1)?,
                    x1: f.get(2)?,
                    y1: f.get(3)?,
                    x2: f.get(4)?,
                    y2: f.get(5)?,
                    x3: f.get(6)?,
                    x4: f.get(7)?,
                    first_screen: f.get(8)?,
                    target: f.link(9)?,
                };
            }
            "route" => {
                let f = Fields::new(key, val, 4)?;
                let kind: RouteGoalKind = f.get(0)?;
                route.goal = RouteGoal::from_parts(kind, f.get(1)?);
                route.active = f.link(2)?;
                route.turned = f.flag(3)?;
            }
            "route_node" => {
                let f = Fields::new(key, val, 2)?;
                route.nodes.push(Point::new(f.get(0)?, f.get(1)?));
            }
            "last_walk" => last_walk = Fields::new(key, val, 1)?.dir(0)?,
            "queue" => {
                let f = Fields::new(key, val, 4)?;
                let capacity: usize = f.get(0)?;
                if capacity > MAX_SAVED_SLOTS {
                    return Err(corrupt(format!("queue capacity {capacity} too large")));
                }
                queue = Some(RawQueue {
                    head: f.link(1)?,
                    tail: f.link(2)?,
                    free: f.link(3)?,
                    slots: vec![Slot::default(); capacity],
                });
            }
            "slot" => {
                let q = queue.as_mut().ok_or_else(|| corrupt("slot before queue header".into()))?;
                let (i, slot) = parse_slot(val)?;
                *q.slots
                    .get_mut(i)
                    .ok_or_else(|| corrupt(format!("slot {i} out of range")))? = slot;
            }
            "object" => {
                let (i, obj) = parse_object(val)?;
                if i != objects.len() {
                    return Err(corrupt(format!("object {i} out of sequence")));
                }
                objects.push(obj);
            }
            "bonus" => {
                scored = val
                    .chars()
                    .map(|c| match c {
                        '0' => Ok(false),
                        '1' => Ok(true),
                        _ => Err(corrupt(format!("bad bonus bit '{c}'"))),
                    })
                    .collect::<Result<_>>()?;
            }
            "screen_states" if val.is_empty() => screen_states.clear(),
            "screen_states" => {
                let f = Fields::new(key, val, val.split(',').count())?;
                screen_states = (0..f.parts.len()).map(|i| f.get(i)).collect::<Result<_>>()?;
            }
            other => return Err(corrupt(format!("unknown key '{other}'"))),
        }
    }

    if let Some(active) = route.active {
        if active >= route.nodes.len() {
            return Err(corrupt(format!("route node {active} out of range")));
        }
    }

    Ok(SaveData {
        tick: tick.ok_or_else(|| corrupt("missing save_tick".into()))?,
        screen: screen.ok_or_else(|| corrupt("missing screen".into()))?,
        score,
        flags,
        maze,
        route,
        last_walk,
        queue: queue.ok_or_else(|| corrupt("missing queue".into()))?,
        objects,
        scored,
        screen_states,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::sim::data::GameData;
    use crate::sim::scheduler;
    use crate::sim::services::Headless;

    const DATA: &str = r#"
        texts = ["later", "now"]
        bonuses = [4, 6]
        [[screens]]
        name = "one"
        [[screens]]
        name = "two"
        boundary = ["..#"]
        [[objects]]
        name = "hero"
        x = 30
        y = 40
        sequences = [[{ x1 = 0, y1 = 0, x2 = 9, y2 = 19 }, { x1 = 1, y1 = 0, x2 = 8, y2 = 19 }]]
        [[objects]]
        name = "cat"
        [[lists]]
        actions = [{ op = "text", text = 0, timer = 5 }, { op = "global_schedule", list = 1, timer = 2 }]
        [[lists]]
        actions = [{ op = "text", text = 1 }]
    "#;

    fn world() -> WorldState {
        WorldState::new(GameData::from_toml_str(DATA).unwrap(), EngineConfig::default())
    }

    fn played() -> WorldState {
        let mut w = world();
        let mut h = Headless::default();
        for _ in 0..10 {
            scheduler::run_one_tick(&mut w, &mut h.services()).unwrap();
        }
        scheduler::insert_action_list(&mut w, 0).unwrap();
        w.screen = 1;
        w.score = 17;
        w.scored = vec![true, false];
        w.screen_states = vec![3, 0];
        w.flags.story_mode = true;
        w.last_walk = Some(WalkDir::Up);
        w.route.begin(vec![Point::new(1, 2), Point::new(3, 4)], RouteGoal::Look(1));
        w.route.turned = true;
        w.maze = MazeState {
            enabled: true,
            size: 3,
            x1: 1,
            y1: 2,
            x2: 3,
            y2: 4,
            x3: 5,
            x4: 6,
            first_screen: 0,
            target: Some(1),
        };
        let hero = w.hero_mut();
        hero.x = 77;
        hero.vx = -5;
        hero.cycling = Cycling::Forward;
        hero.set_frame(0, 1);
        hero.direction = Some(WalkDir::Left);
        w.objects[1].carried = true;
        w.objects[1].path_type = PathType::Wander2;
        w
    }

    #[test]
    fn text_round_trip_is_lossless() {
        let w = played();
        let save = capture(&w);
        let text = serialize(&save);
        assert_eq!(parse_save(&text).unwrap(), save);
    }

    #[test]
    fn file_round_trip_restores_world_and_rebases_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.sav");
        let src = played();
        save_to_file(&src, &path).unwrap();

        let mut dst = world();
        let mut h = Headless::default();
        for _ in 0..3 {
            scheduler::run_one_tick(&mut dst, &mut h.services()).unwrap();
        }
        load_from_file(&mut dst, &mut h.services(), &path).unwrap();

        assert_eq!(dst.tick, 3);
        assert_eq!(dst.screen, 1);
        assert!(dst.boundary.is_wall(2, 0));
        assert_eq!(h.renderer.screens, vec![1]);
        assert_eq!(dst.score, 17);
        assert_eq!(dst.scored, vec![true, false]);
        assert_eq!(dst.screen_states, vec![3, 0]);
        assert!(dst.flags.story_mode);
        assert_eq!(dst.route, src.route);
        assert_eq!(dst.maze, src.maze);
        assert_eq!(dst.last_walk, Some(WalkDir::Up));
        assert_eq!(capture(&dst).objects, capture(&src).objects);

        // Queued at tick 10 for +2 and +5; now due at 3+2 and 3+5.
        let times: Vec<u32> = dst.queue.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![5, 8]);
        for _ in 0..6 {
            scheduler::run_one_tick(&mut dst, &mut h.services()).unwrap();
        }
        assert_eq!(h.text.said, vec!["now", "later"]);
    }

    #[test]
    fn object_count_mismatch_is_corrupt() {
        let mut save = capture(&played());
        save.objects.pop();
        assert!(matches!(restore(&mut world(), save), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn broken_event_links_are_corrupt() {
        let mut save = capture(&played());
        save.queue.head = Some(save.queue.slots.len() - 1);
        assert!(matches!(restore(&mut world(), save), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn unknown_action_in_queue_is_corrupt() {
        let mut save = capture(&played());
        let head = save.queue.head.unwrap();
        if let Some(e) = save.queue.slots[head].event.as_mut() {
            e.action.list = 40;
        }
        assert!(matches!(restore(&mut world(), save), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(parse_save("hello"), Err(EngineError::CorruptSave(_))));
        assert!(matches!(parse_save("save_tick=x\n"), Err(EngineError::CorruptSave(_))));
        let text = serialize(&capture(&played())).replace("wander2", "sideways");
        assert!(matches!(parse_save(&text), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn oversized_queue_header_is_corrupt() {
        let text = "save_tick=0\nscreen=0\nqueue=18446744073709551615,-,-,-\n";
        assert!(matches!(parse_save(text), Err(EngineError::CorruptSave(_))));
        let text = format!("save_tick=0\nscreen=0\nqueue={},-,-,-\n", MAX_SAVED_SLOTS + 1);
        assert!(matches!(parse_save(&text), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn queue_capacity_must_match_live_queue() {
        let mut save = capture(&played());
        save.queue.slots.push(Slot::default());
        assert!(matches!(restore(&mut world(), save), Err(EngineError::CorruptSave(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = world();
        let mut h = Headless::default();
        let err = load_from_file(&mut w, &mut h.services(), &dir.path().join("none.sav"));
        assert!(matches!(err, Err(EngineError::Io(_))));
    }

    #[test]
    fn player_load_reports_missing_file_but_fails_on_corrupt_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = world();
        let mut h = Headless::default();
        let missing = dir.path().join("none.sav");
        assert!(!try_load(&mut w, &mut h.services(), &missing).unwrap());
        assert!(h.renderer.screens.is_empty());

        let broken = dir.path().join("broken.sav");
        std::fs::write(&broken, "queue=3,-,-,-\nslot=oops\n").unwrap();
        let err = try_load(&mut w, &mut h.services(), &broken);
        assert!(matches!(err, Err(EngineError::CorruptSave(_))));

        let good = dir.path().join("good.sav");
        save_to_file(&played(), &good).unwrap();
        assert!(try_load(&mut w, &mut h.services(), &good).unwrap());
        assert_eq!(w.score, 17);
    }
}
