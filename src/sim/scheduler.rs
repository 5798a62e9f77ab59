//! Scheduler: turns action lists into queued events and interprets them.
//!
//! ## Tick loop
//!
//! `run_one_tick` pops the queue head while it is due, re-reading the live
//! head every time. Actions may insert events for the current tick or wipe
//! every local event (screen change); neither can leave the loop holding a
//! stale successor.
//!
//! ## Conditionals
//!
//! Every branching opcode schedules exactly one of its `pass` / `fail`
//! lists. A failed test is data, not an engine error.

use tracing::{debug, info};

use crate::domain::action::{Action, ActionRef, Op};
use crate::domain::object::{self, Cycling, HERO};
use crate::error::{EngineError, Result};
use crate::sim::event::Event;
use crate::sim::maze::MazeState;
use crate::sim::services::Services;
use crate::sim::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Queueing
// ══════════════════════════════════════════════════════════════

/// Queue one action `action.timer` ticks from now.
pub fn insert_action(world: &mut WorldState, action: ActionRef) -> Result<()> {
    let (timer, local) = {
        let a = lookup(world, action)?;
        (a.timer, a.op.is_local())
    };
    world.queue.insert(Event {
        action,
        local,
        time: world.tick.wrapping_add(timer),
    })?;
    Ok(())
}

/// Queue every action of a list with its own delay.
///
/// The queue fires same-tick events newest first, so the list is inserted
/// back to front: siblings sharing a delay then fire in authored order.
pub fn insert_action_list(world: &mut WorldState, list: usize) -> Result<()> {
    let len = world
        .data
        .lists
        .get(list)
        .ok_or(EngineError::UnknownActionList(list))?
        .actions
        .len();
    for index in (0..len).rev() {
        insert_action(world, ActionRef { list, index })?;
    }
    Ok(())
}

fn lookup(world: &WorldState, action: ActionRef) -> Result<&Action> {
    world
        .data
        .lists
        .get(action.list)
        .ok_or(EngineError::UnknownActionList(action.list))?
        .actions
        .get(action.index)
        .ok_or(EngineError::UnknownAction { list: action.list, index: action.index })
}

/// Fire everything due at the current tick, then advance the clock.
pub fn run_one_tick(world: &mut WorldState, services: &mut Services) -> Result<()> {
    while let Some(event) = world.queue.pop_due(world.tick) {
        do_action(world, services, event.action)?;
    }
    world.tick = world.tick.wrapping_add(1);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Screen change
// ══════════════════════════════════════════════════════════════

/// Switch to `screen`: local events are discarded, the hero and everything
/// it carries move along, the boundary is reloaded and the screen's entry
/// lists are scheduled.
pub fn new_screen(world: &mut WorldState, services: &mut Services, screen: usize) -> Result<()> {
    let def = world.data.screens.get(screen).ok_or(EngineError::UnknownScreen(screen))?;

    let dropped = world.queue.discard_local();
    world.screen = screen;
    for (i, obj) in world.objects.iter_mut().enumerate() {
        if i == HERO || obj.carried {
            obj.screen = screen;
        }
    }
    world.route.reset();
    world.boundary.load_rows(&def.boundary);
    services.renderer.load_screen(screen, &def.name, &world.boundary);
    info!(screen, name = %def.name, dropped, "new screen");

    let entry = def.entry_lists.clone();
    for list in entry {
        insert_action_list(world, list)?;
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Interpreter
// ══════════════════════════════════════════════════════════════

fn branch(world: &mut WorldState, test: bool, pass: usize, fail: usize) -> Result<()> {
    insert_action_list(world, if test { pass } else { fail })
}

/// Execute one action.
pub fn do_action(world: &mut WorldState, services: &mut Services, action: ActionRef) -> Result<()> {
    let op = lookup(world, action)?.op.clone();
    debug!(tick = world.tick, list = action.list, index = action.index, kind = %op.kind(), "action");

    match op {
        Op::Schedule { list } | Op::GlobalSchedule { list } => insert_action_list(world, list)?,

        Op::StartObj { object, cycle_count, cycling } => {
            let obj = world.object_mut(object)?;
            obj.cycle_count = cycle_count;
            obj.cycling = cycling;
        }
        Op::InitObjXy { object, x, y } => {
            let obj = world.object_mut(object)?;
            obj.x = x;
            obj.y = y;
        }
        Op::Prompt { prompt, responses, pass, fail } => {
            let answer = services.text.prompt(world.data.text(prompt)).to_lowercase();
            let hit = responses.iter().any(|r| answer.contains(&r.to_lowercase()));
            branch(world, hit, pass, fail)?;
        }
        Op::BkgdColor { color } => services.renderer.set_background(color),
        Op::InitObjVxy { object, vx, vy } => {
            let obj = world.object_mut(object)?;
            obj.vx = vx;
            obj.vy = vy;
        }
        Op::InitCarry { object, carried } => world.object_mut(object)?.carried = carried,
        Op::InitHfCoord { object } => {
            let hero = world.hero();
            let (x, y) = (hero.x - 1, hero.baseline() - 1);
            let screen = world.screen;
            let obj = world.object_mut(object)?;
            obj.x = x;
            obj.y = y;
            obj.screen = screen;
        }
        Op::NewScreen { screen } => new_screen(world, services, screen)?,
        Op::InitObjState { object, state } => world.object_mut(object)?.state = state,
        Op::InitPath { object, path_type, vx_path, vy_path } => {
            let obj = world.object_mut(object)?;
            obj.path_type = path_type;
            obj.vx_path = vx_path;
            obj.vy_path = vy_path;
        }
        Op::CondR { object, state, pass, fail } => {
            let test = world.object(object)?.state == state;
            branch(world, test, pass, fail)?;
        }
        Op::Text { text } => services.text.notify(world.data.text(text)),
        Op::SwapImages { a, b } => {
            world.object(a)?;
            world.object(b)?;
            object::swap_images(&mut world.objects, a, b);
        }
        Op::CondScr { object, screen, pass, fail } => {
            let test = world.object(object)?.screen == screen;
            branch(world, test, pass, fail)?;
        }
        Op::Autopilot { object, target, dx, dy } => {
            world.object(object)?;
            world.object(target)?;
            object::home_in(&mut world.objects, object, target, dx, dy);
        }
        Op::InitObjSeq { object, seq } => world.object_mut(object)?.set_sequence(seq),
        Op::SetStateBits { object, mask } => world.object_mut(object)?.state |= mask,
        Op::ClearStateBits { object, mask } => world.object_mut(object)?.state &= !mask,
        Op::TestStateBits { object, mask, pass, fail } => {
            let test = world.object(object)?.state & mask == mask;
            branch(world, test, pass, fail)?;
        }
        Op::DelEvents { kind } => {
            let lists = &world.data.lists;
            let removed = world.queue.remove_where(|e| {
                lists
                    .get(e.action.list)
                    .and_then(|l| l.actions.get(e.action.index))
                    .map_or(false, |a| a.op.kind() == kind)
            });
            debug!(%kind, removed, "events deleted");
        }
        Op::GameOver => {
            info!(score = world.score, "game over");
            world.flags.game_over = true;
        }
        Op::InitHhCoord { object } => {
            let (x, y) = (world.hero().x, world.hero().y);
            let screen = world.screen;
            let obj = world.object_mut(object)?;
            obj.x = x;
            obj.y = y;
            obj.screen = screen;
        }
        Op::Exit => world.flags.quit = true,
        Op::Bonus { index } => {
            let points = *world
                .data
                .bonuses
                .get(index)
                .ok_or_else(|| EngineError::GameData(format!("unknown bonus {index}")))?;
            if let Some(scored) = world.scored.get_mut(index) {
                if !*scored {
                    *scored = true;
                    world.score += points;
                    debug!(index, points, score = world.score, "bonus");
                }
            }
        }
        Op::CondBox { object, x1, y1, x2, y2, pass, fail } => {
            let (fx, fy) = world.object(object)?.feet();
            let test = fx >= x1 && fx <= x2 && fy >= y1 && fy <= y2;
            branch(world, test, pass, fail)?;
        }
        Op::Sound { index, priority } => services.audio.play_sound(index, priority),
        Op::AddScore { object } => {
            let value = world.object(object)?.value;
            world.score += value;
        }
        Op::SubScore { object } => {
            let value = world.object(object)?.value;
            world.score -= value;
        }
        Op::CondCarry { object, pass, fail } => {
            let test = world.object(object)?.carried;
            branch(world, test, pass, fail)?;
        }
        Op::InitMaze { size, x1, y1, x2, y2, x3, x4, first_screen } => {
            world.maze = MazeState {
                enabled: true,
                size,
                x1,
                y1,
                x2,
                y2,
                x3,
                x4,
                first_screen,
                target: None,
            };
        }
        Op::ExitMaze => world.maze.enabled = false,
        Op::InitPriority { object, priority } => world.object_mut(object)?.priority = priority,
        Op::InitScreen { object, screen } => world.object_mut(object)?.screen = screen,
        Op::RemapPal { old, new } => services.renderer.remap_palette(old, new),
        Op::CondNoun { noun, pass, fail } => {
            let test = services.text.noun_mentioned(&noun);
            branch(world, test, pass, fail)?;
        }
        Op::ScreenState { screen, state } => {
            *world
                .screen_states
                .get_mut(screen)
                .ok_or(EngineError::UnknownScreen(screen))? = state;
        }
        Op::InitLips { lips, object, dx, dy } => {
            let src = world.object(object)?;
            let (x, y, screen) = (src.x + dx, src.y + dy, src.screen);
            let lips = world.object_mut(lips)?;
            lips.x = x;
            lips.y = y;
            lips.screen = screen;
            lips.cycling = Cycling::Forward;
        }
        Op::InitStoryMode { on } => world.flags.story_mode = on,
        Op::Warn { text } => services.text.notify(world.data.text(text)),
        Op::CondBonus { index, pass, fail } => {
            let test = world.scored.get(index).copied().unwrap_or(false);
            branch(world, test, pass, fail)?;
        }
        Op::TextTake { object } => {
            let obj = world.object(object)?;
            if obj.carried {
                let msg = format!("{} taken.", obj.name);
                services.text.notify(&msg);
            }
        }
        Op::YesNo { prompt, pass, fail } => {
            let test = services.text.yes_no(world.data.text(prompt));
            branch(world, test, pass, fail)?;
        }
        Op::StopRoute => world.route.reset(),
        Op::CondRoute { remaining, pass, fail } => {
            let test = world.route.remaining() >= remaining;
            branch(world, test, pass, fail)?;
        }
        Op::InitJumpExit { on } => world.flags.jump_exit = on,
        Op::InitView { object, view_x, view_y, direction } => {
            let obj = world.object_mut(object)?;
            obj.view_x = view_x;
            obj.view_y = view_y;
            obj.direction = Some(direction);
        }
        Op::InitObjFrame { object, seq, frame } => world.object_mut(object)?.set_frame(seq, frame),
        Op::OldSong { song } => services.audio.play_music(song),
        Op::MazeScreen => {
            if let Some(target) = world.maze.target.take() {
                new_screen(world, services, target)?;
            }
        }
    }
    Ok(())
}
