//! Maze overlay: screens laid out as a grid of identical cells.
//!
//! While enabled, every motion tick checks whether the hero has walked out
//! of the current cell's rectangle. The first crossing found (west, east,
//! north, south) picks the neighbouring screen, puts the hero just inside
//! the matching edge of the new cell, cancels any route and schedules the
//! game data's maze list, whose `MazeScreen` action performs the switch.

use tracing::{debug, warn};

use crate::domain::object::HERO;
use crate::error::{EngineError, Result};
use crate::sim::scheduler;
use crate::sim::world::WorldState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MazeState {
    pub enabled: bool,
    /// Screens per maze row.
    pub size: usize,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Hero x on entering through the south / north edge.
    pub x3: i32,
    pub x4: i32,
    /// The grid covers screens `first_screen .. first_screen + size * size`,
    /// row by row.
    pub first_screen: usize,
    /// Screen chosen by the last crossing, entered by `MazeScreen`.
    pub target: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Exit {
    West,
    East,
    North,
    South,
}

/// Check the hero against the cell rectangle. Called after all objects
/// have moved.
pub fn process_maze(world: &mut WorldState) -> Result<()> {
    let maze = world.maze;
    let (sx, sy) = (world.config.maze.shift_x, world.config.maze.shift_y);
    let hero = world.hero();
    let f = hero.current_frame();
    let (x1, x2) = (hero.x + f.x1, hero.x + f.x2);
    let (y1, y2) = (hero.y + f.y1, hero.y + f.y2);

    let exit = if x1 < maze.x1 {
        Exit::West
    } else if x2 > maze.x2 {
        Exit::East
    } else if y1 < maze.y1 - sy {
        Exit::North
    } else if y2 > maze.y2 - sy / 2 {
        Exit::South
    } else {
        return Ok(());
    };

    let screen = world.screen;
    let size = maze.size;
    let Some(cell) = screen.checked_sub(maze.first_screen).filter(|&c| c < size * size) else {
        warn!(screen, first = maze.first_screen, size, "hero is not on a maze screen");
        return Ok(());
    };
    let (col, row) = (cell % size, cell / size);
    let (target, x, y) = match exit {
        Exit::West => ((col > 0).then(|| screen - 1), maze.x2 - sx - (x2 - x1), hero.y),
        Exit::East => ((col + 1 < size).then(|| screen + 1), maze.x1 + sx, hero.y),
        Exit::North => ((row > 0).then(|| screen - size), maze.x3, maze.y2 - sy - (y2 - y1)),
        Exit::South => ((row + 1 < size).then(|| screen + size), maze.x4, maze.y1),
    };
    let Some(target) = target else {
        warn!(screen, ?exit, "maze crossing leads off the grid");
        return Ok(());
    };

    debug!(from = screen, to = target, ?exit, "maze crossing");
    let hero = &mut world.objects[HERO];
    hero.x = x;
    hero.y = y;
    world.route.reset();
    world.maze.target = Some(target);

    let list = world.data.maze_list.ok_or(EngineError::MissingMazeList)?;
    scheduler::insert_action_list(world, list)
}
