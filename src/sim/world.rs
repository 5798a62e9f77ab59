//! WorldState: the complete simulation context of a running game.
//!
//! One value owns everything the engine mutates: the object registry, the
//! boundary map of the current screen, the event queue, route and maze
//! state, score and flags. Static game data rides along read-only. Every
//! subsystem takes `&mut WorldState`; there are no globals.
//!
//! ## Time
//!
//! `tick` is the logical clock. All event times are absolute ticks; an
//! action's `timer` is relative to the tick it was scheduled on.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::EngineConfig;
use crate::domain::boundary::BoundaryMap;
use crate::domain::object::{Object, WalkDir, HERO};
use crate::domain::route::Route;
use crate::error::{EngineError, Result};
use crate::sim::data::GameData;
use crate::sim::event::EventQueue;
use crate::sim::maze::MazeState;
use crate::sim::scheduler;
use crate::sim::services::Services;

/// Game-wide switches set by actions and read by the front end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    /// Set by GameOver. The front end stops taking commands.
    pub game_over: bool,
    /// Cut-scene mode: the hero ignores walk commands.
    pub story_mode: bool,
    /// Exit requests skip the walk and run the hotspot list at once.
    pub jump_exit: bool,
    /// Set by Exit. The main loop stops.
    pub quit: bool,
}

pub struct WorldState {
    pub config: EngineConfig,
    pub data: GameData,
    pub objects: Vec<Object>,
    pub boundary: BoundaryMap,
    pub queue: EventQueue,
    pub tick: u32,
    pub screen: usize,
    pub score: i32,
    /// One bit per bonus: already awarded?
    pub scored: Vec<bool>,
    /// Per-screen state byte, owned by the game data.
    pub screen_states: Vec<u8>,
    pub route: Route,
    /// Direction of the last manual walk command.
    pub last_walk: Option<WalkDir>,
    pub maze: MazeState,
    pub flags: Flags,
    pub rng: StdRng,
}

impl WorldState {
    pub fn new(data: GameData, config: EngineConfig) -> Self {
        let rng = if config.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(config.seed)
        };
        WorldState {
            boundary: BoundaryMap::new(config.screen.width, config.screen.height),
            queue: EventQueue::new(config.scheduler.max_events),
            objects: data.objects.clone(),
            scored: vec![false; data.bonuses.len()],
            screen_states: vec![0; data.screens.len()],
            screen: data.start_screen,
            tick: 0,
            score: 0,
            route: Route::default(),
            last_walk: None,
            maze: MazeState::default(),
            flags: Flags::default(),
            rng,
            data,
            config,
        }
    }

    /// Enter the start screen: load its boundary and run its entry lists.
    pub fn start(&mut self, services: &mut Services) -> Result<()> {
        let screen = self.data.start_screen;
        info!(title = %self.data.title, screen, "starting game");
        scheduler::new_screen(self, services, screen)
    }

    pub fn hero(&self) -> &Object {
        &self.objects[HERO]
    }

    pub fn hero_mut(&mut self) -> &mut Object {
        &mut self.objects[HERO]
    }

    pub fn object(&self, index: usize) -> Result<&Object> {
        self.objects.get(index).ok_or(EngineError::UnknownObject(index))
    }

    pub fn object_mut(&mut self, index: usize) -> Result<&mut Object> {
        self.objects.get_mut(index).ok_or(EngineError::UnknownObject(index))
    }

    /// Can the player issue commands right now?
    pub fn accepts_commands(&self) -> bool {
        !self.flags.story_mode && !self.flags.game_over
    }
}
