//! Game data: the static tables a story is made of.
//!
//! Loaded once from a TOML file. Screens carry their boundary rows and the
//! action lists run on entry; the object table is the initial state of the
//! registry; hotspots are exit / trigger rectangles the hero bumps into.
//!
//! Every cross reference is checked at load time so that a typo in the data
//! file is reported up front instead of mid-game.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::action::{ActionList, Op};
use crate::domain::object::{Object, WalkDir};
use crate::error::{EngineError, Result};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GameData {
    pub title: String,
    pub start_screen: usize,
    pub screens: Vec<ScreenDef>,
    pub objects: Vec<Object>,
    pub lists: Vec<ActionList>,
    pub hotspots: Vec<Hotspot>,
    /// Score awarded by each bonus index.
    pub bonuses: Vec<i32>,
    pub texts: Vec<String>,
    /// Run when the hero crosses a maze cell boundary.
    pub maze_list: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScreenDef {
    pub name: String,
    /// One string per pixel row; `'#'` is impassable.
    pub boundary: Vec<String>,
    pub entry_lists: Vec<usize>,
}

fn no_view() -> i32 {
    -1
}

#[derive(Clone, Debug, Deserialize)]
pub struct Hotspot {
    pub screen: usize,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    #[serde(default)]
    pub action_list: Option<usize>,
    /// Direction to keep walking after arriving at the view point.
    #[serde(default)]
    pub direction: Option<WalkDir>,
    #[serde(default = "no_view")]
    pub view_x: i32,
    #[serde(default = "no_view")]
    pub view_y: i32,
}

impl Hotspot {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

impl GameData {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let data = GameData::from_toml_str(&text)?;
        info!(
            path = %path.display(),
            screens = data.screens.len(),
            objects = data.objects.len(),
            lists = data.lists.len(),
            "game data loaded"
        );
        Ok(data)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let data: GameData =
            toml::from_str(text).map_err(|e| EngineError::GameData(e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    /// First hotspot on `screen` containing `(x, y)`.
    pub fn find_hotspot(&self, screen: usize, x: i32, y: i32) -> Option<(usize, &Hotspot)> {
        self.hotspots
            .iter()
            .enumerate()
            .find(|(_, h)| h.screen == screen && h.contains(x, y))
    }

    pub fn text(&self, index: usize) -> &str {
        self.texts.get(index).map(String::as_str).unwrap_or("")
    }

    // ── Validation ──

    pub fn validate(&self) -> Result<()> {
        if self.objects.is_empty() {
            return Err(bad("no objects: object 0 must be the hero".into()));
        }
        self.check_screen(self.start_screen, "start_screen")?;

        for (s, screen) in self.screens.iter().enumerate() {
            for &l in &screen.entry_lists {
                self.check_list(l, &format!("screen {s} entry list"))?;
            }
        }

        for (i, obj) in self.objects.iter().enumerate() {
            let what = format!("object {i} ({})", obj.name);
            for l in [obj.action_list, obj.look_list, obj.use_list].into_iter().flatten() {
                self.check_list(l, &what)?;
            }
        }

        for (i, h) in self.hotspots.iter().enumerate() {
            let what = format!("hotspot {i}");
            self.check_screen(h.screen, &what)?;
            if let Some(l) = h.action_list {
                self.check_list(l, &what)?;
            }
        }

        if let Some(l) = self.maze_list {
            self.check_list(l, "maze_list")?;
        }

        for (l, list) in self.lists.iter().enumerate() {
            for (a, action) in list.actions.iter().enumerate() {
                self.check_op(&action.op, &format!("list {l} action {a}"))?;
            }
        }
        Ok(())
    }

    fn check_op(&self, op: &Op, what: &str) -> Result<()> {
        for l in op.list_refs() {
            self.check_list(l, what)?;
        }
        for o in op.object_refs() {
            if o >= self.objects.len() {
                return Err(bad(format!("{what}: unknown object {o}")));
            }
        }
        match op {
            Op::NewScreen { screen }
            | Op::InitScreen { screen, .. }
            | Op::CondScr { screen, .. }
            | Op::ScreenState { screen, .. } => self.check_screen(*screen, what),
            Op::Bonus { index } | Op::CondBonus { index, .. } if *index >= self.bonuses.len() => {
                Err(bad(format!("{what}: unknown bonus {index}")))
            }
            Op::Text { text }
            | Op::Warn { text }
            | Op::Prompt { prompt: text, .. }
            | Op::YesNo { prompt: text, .. }
                if *text >= self.texts.len() =>
            {
                Err(bad(format!("{what}: unknown text {text}")))
            }
            _ => Ok(()),
        }
    }

    fn check_list(&self, list: usize, what: &str) -> Result<()> {
        if list >= self.lists.len() {
            return Err(bad(format!("{what}: unknown action list {list}")));
        }
        Ok(())
    }

    fn check_screen(&self, screen: usize, what: &str) -> Result<()> {
        if screen >= self.screens.len() {
            return Err(bad(format!("{what}: unknown screen {screen}")));
        }
        Ok(())
    }
}

fn bad(msg: String) -> EngineError {
    EngineError::GameData(msg)
}
