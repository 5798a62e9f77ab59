//! The action instruction set.
//!
//! Game data is a table of action lists; each action is one opcode with
//! its own operands plus a delay (`timer`, in ticks) relative to the moment
//! the list is scheduled. Actions are read-only once loaded.
//!
//! In TOML an action is an inline table tagged by `op`:
//!
//! ```toml
//! actions = [
//!   { op = "text", text = 3 },
//!   { op = "init_obj_xy", timer = 9, object = 2, x = 100, y = 40 },
//! ]
//! ```

use serde::Deserialize;
use strum::{Display, EnumString};

use super::object::{Cycling, PathType, Priority, WalkDir};

/// Reference to a single action: `(list, index within list)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActionRef {
    pub list: usize,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub timer: u32,
    #[serde(flatten)]
    pub op: Op,
}

/// An ordered list of actions, scheduled together.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ActionList {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn yes() -> bool {
    true
}

/// One opcode per variant. `list`, `pass` and `fail` are action-list
/// indices; `object` is a registry index; `text` indexes the text table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Schedule another action list.
    Schedule { list: usize },
    /// Start an object cycling for `cycle_count` cycles (0 = forever).
    StartObj { object: usize, cycle_count: u8, cycling: Cycling },
    InitObjXy { object: usize, x: i32, y: i32 },
    /// Ask a question; any matching response runs `pass`.
    Prompt { prompt: usize, responses: Vec<String>, pass: usize, fail: usize },
    BkgdColor { color: u32 },
    InitObjVxy { object: usize, vx: i32, vy: i32 },
    InitCarry { object: usize, #[serde(default = "yes")] carried: bool },
    /// Place an object at the hero's feet.
    InitHfCoord { object: usize },
    NewScreen { screen: usize },
    InitObjState { object: usize, state: u8 },
    InitPath {
        object: usize,
        path_type: PathType,
        #[serde(default)]
        vx_path: i32,
        #[serde(default)]
        vy_path: i32,
    },
    /// Branch on `objects[object].state == state`.
    CondR { object: usize, state: u8, pass: usize, fail: usize },
    Text { text: usize },
    SwapImages { a: usize, b: usize },
    /// Branch on the object being on `screen`.
    CondScr { object: usize, screen: usize, pass: usize, fail: usize },
    /// Send `object` toward `target` at up to `(dx, dy)` per tick.
    Autopilot { object: usize, target: usize, dx: i32, dy: i32 },
    InitObjSeq { object: usize, seq: usize },
    SetStateBits { object: usize, mask: u8 },
    ClearStateBits { object: usize, mask: u8 },
    /// Branch on all bits of `mask` being set.
    TestStateBits { object: usize, mask: u8, pass: usize, fail: usize },
    /// Drop every queued event whose action is of this kind.
    DelEvents { kind: ActionKind },
    GameOver,
    /// Place an object at the hero's position.
    InitHhCoord { object: usize },
    /// Leave the game.
    Exit,
    /// Award a bonus, once.
    Bonus { index: usize },
    /// Branch on the object's feet lying inside the rectangle.
    CondBox { object: usize, x1: i32, y1: i32, x2: i32, y2: i32, pass: usize, fail: usize },
    Sound {
        index: usize,
        #[serde(default)]
        priority: u8,
    },
    AddScore { object: usize },
    SubScore { object: usize },
    CondCarry { object: usize, pass: usize, fail: usize },
    /// Turn the maze overlay on. Screens form a `size` x `size` grid
    /// starting at `first_screen`.
    InitMaze {
        size: usize,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        x4: i32,
        first_screen: usize,
    },
    ExitMaze,
    InitPriority { object: usize, priority: Priority },
    InitScreen { object: usize, screen: usize },
    /// Like `Schedule`, but survives screen changes.
    GlobalSchedule { list: usize },
    RemapPal { old: u8, new: u8 },
    /// Branch on the parser having seen a noun.
    CondNoun { noun: String, pass: usize, fail: usize },
    ScreenState { screen: usize, state: u8 },
    /// Attach a lips object to a talking object.
    InitLips { lips: usize, object: usize, dx: i32, dy: i32 },
    InitStoryMode { on: bool },
    Warn { text: usize },
    CondBonus { index: usize, pass: usize, fail: usize },
    /// Report that an object was taken.
    TextTake { object: usize },
    YesNo { prompt: usize, pass: usize, fail: usize },
    StopRoute,
    /// Branch on at least `remaining` route nodes still ahead.
    CondRoute { remaining: i32, pass: usize, fail: usize },
    InitJumpExit { on: bool },
    InitView { object: usize, view_x: i32, view_y: i32, direction: WalkDir },
    InitObjFrame { object: usize, seq: usize, frame: usize },
    OldSong { song: usize },
    /// Enter the screen recorded by the last maze crossing.
    MazeScreen,
}

/// Opcode discriminant, used by `DelEvents` and the save file.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Schedule,
    StartObj,
    InitObjXy,
    Prompt,
    BkgdColor,
    InitObjVxy,
    InitCarry,
    InitHfCoord,
    NewScreen,
    InitObjState,
    InitPath,
    CondR,
    Text,
    SwapImages,
    CondScr,
    Autopilot,
    InitObjSeq,
    SetStateBits,
    ClearStateBits,
    TestStateBits,
    DelEvents,
    GameOver,
    InitHhCoord,
    Exit,
    Bonus,
    CondBox,
    Sound,
    AddScore,
    SubScore,
    CondCarry,
    InitMaze,
    ExitMaze,
    InitPriority,
    InitScreen,
    GlobalSchedule,
    RemapPal,
    CondNoun,
    ScreenState,
    InitLips,
    InitStoryMode,
    Warn,
    CondBonus,
    TextTake,
    YesNo,
    StopRoute,
    CondRoute,
    InitJumpExit,
    InitView,
    InitObjFrame,
    OldSong,
    MazeScreen,
}

impl Op {
    pub fn kind(&self) -> ActionKind {
        use ActionKind as K;
        match self {
            Op::Schedule { .. } => K::Schedule,
            Op::StartObj { .. } => K::StartObj,
            Op::InitObjXy { .. } => K::InitObjXy,
            Op::Prompt { .. } => K::Prompt,
            Op::BkgdColor { .. } => K::BkgdColor,
            Op::InitObjVxy { .. } => K::InitObjVxy,
            Op::InitCarry { .. } => K::InitCarry,
            Op::InitHfCoord { .. } => K::InitHfCoord,
            Op::NewScreen { .. } => K::NewScreen,
            Op::InitObjState { .. } => K::InitObjState,
            Op::InitPath { .. } => K::InitPath,
            Op::CondR { .. } => K::CondR,
            Op::Text { .. } => K::Text,
            Op::SwapImages { .. } => K::SwapImages,
            Op::CondScr { .. } => K::CondScr,
            Op::Autopilot { .. } => K::Autopilot,
            Op::InitObjSeq { .. } => K::InitObjSeq,
            Op::SetStateBits { .. } => K::SetStateBits,
            Op::ClearStateBits { .. } => K::ClearStateBits,
            Op::TestStateBits { .. } => K::TestStateBits,
            Op::DelEvents { .. } => K::DelEvents,
            Op::GameOver => K::GameOver,
            Op::InitHhCoord { .. } => K::InitHhCoord,
            Op::Exit => K::Exit,
            Op::Bonus { .. } => K::Bonus,
            Op::CondBox { .. } => K::CondBox,
            Op::Sound { .. } => K::Sound,
            Op::AddScore { .. } => K::AddScore,
            Op::SubScore { .. } => K::SubScore,
            Op::CondCarry { .. } => K::CondCarry,
            Op::InitMaze { .. } => K::InitMaze,
            Op::ExitMaze => K::ExitMaze,
            Op::InitPriority { .. } => K::InitPriority,
            Op::InitScreen { .. } => K::InitScreen,
            Op::GlobalSchedule { .. } => K::GlobalSchedule,
            Op::RemapPal { .. } => K::RemapPal,
            Op::CondNoun { .. } => K::CondNoun,
            Op::ScreenState { .. } => K::ScreenState,
            Op::InitLips { .. } => K::InitLips,
            Op::InitStoryMode { .. } => K::InitStoryMode,
            Op::Warn { .. } => K::Warn,
            Op::CondBonus { .. } => K::CondBonus,
            Op::TextTake { .. } => K::TextTake,
            Op::YesNo { .. } => K::YesNo,
            Op::StopRoute => K::StopRoute,
            Op::CondRoute { .. } => K::CondRoute,
            Op::InitJumpExit { .. } => K::InitJumpExit,
            Op::InitView { .. } => K::InitView,
            Op::InitObjFrame { .. } => K::InitObjFrame,
            Op::OldSong { .. } => K::OldSong,
            Op::MazeScreen => K::MazeScreen,
        }
    }

    /// Events carrying this action are discarded on a screen change,
    /// except for global schedules.
    pub fn is_local(&self) -> bool {
        !matches!(self, Op::GlobalSchedule { .. })
    }

    /// Action lists this op can schedule. Used to validate game data.
    pub fn list_refs(&self) -> Vec<usize> {
        match self {
            Op::Schedule { list } | Op::GlobalSchedule { list } => vec![*list],
            Op::Prompt { pass, fail, .. }
            | Op::CondR { pass, fail, .. }
            | Op::CondScr { pass, fail, .. }
            | Op::TestStateBits { pass, fail, .. }
            | Op::CondBox { pass, fail, .. }
            | Op::CondCarry { pass, fail, .. }
            | Op::CondNoun { pass, fail, .. }
            | Op::CondBonus { pass, fail, .. }
            | Op::YesNo { pass, fail, .. }
            | Op::CondRoute { pass, fail, .. } => vec![*pass, *fail],
            _ => vec![],
        }
    }

    /// Objects this op touches. Used to validate game data.
    pub fn object_refs(&self) -> Vec<usize> {
        match self {
            Op::StartObj { object, .. }
            | Op::InitObjXy { object, .. }
            | Op::InitObjVxy { object, .. }
            | Op::InitCarry { object, .. }
            | Op::InitHfCoord { object }
            | Op::InitObjState { object, .. }
            | Op::InitPath { object, .. }
            | Op::CondR { object, .. }
            | Op::CondScr { object, .. }
            | Op::InitObjSeq { object, .. }
            | Op::SetStateBits { object, .. }
            | Op::ClearStateBits { object, .. }
            | Op::TestStateBits { object, .. }
            | Op::InitHhCoord { object }
            | Op::CondBox { object, .. }
            | Op::AddScore { object }
            | Op::SubScore { object }
            | Op::CondCarry { object, .. }
            | Op::InitPriority { object, .. }
            | Op::InitScreen { object, .. }
            | Op::TextTake { object }
            | Op::InitView { object, .. }
            | Op::InitObjFrame { object, .. } => vec![*object],
            Op::SwapImages { a, b } => vec![*a, *b],
            Op::Autopilot { object, target, .. } => vec![*object, *target],
            Op::InitLips { lips, object, .. } => vec![*lips, *object],
            _ => vec![],
        }
    }
}
