//! The step function: advances the world by one tick.
//!
//! Processing order:
//!   1. Route following (hero velocity from the active route)
//!   2. Object motion (policies → footprints → deltas → collisions)
//!   3. Maze crossing check (inside motion, after everything moved)
//!   4. Scheduler tick (fires due events, advances the clock)
//!   5. Drawing and animation
//!
//! Motion reads the occupancy overlay while it is being rewritten, so the
//! registry order decides who wins a simultaneous collision.

use tracing::debug;

use crate::domain::motion::{self, chase_velocity, clamp_to_screen, delta_x, delta_y, facing};
use crate::domain::object::{self, Cycling, PathType, HERO};
use crate::error::Result;
use super::maze;
use super::navigation;
use super::scheduler;
use super::services::Services;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, services: &mut Services) -> Result<()> {
    navigation::process_route(world, services)?;
    move_objects(world)?;
    scheduler::run_one_tick(world, services)?;
    update_images(world, services);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Motion
// ══════════════════════════════════════════════════════════════

/// Move every object on the current screen by as much of its velocity as
/// the boundary allows.
pub fn move_objects(world: &mut WorldState) -> Result<()> {
    let screen = world.screen;
    let on_screen: Vec<usize> =
        (0..world.objects.len()).filter(|&i| world.objects[i].screen == screen).collect();

    // Pass 1: remember start positions, apply path policies, paint
    // footprints.
    let mut painted = Vec::new();
    for &i in &on_screen {
        {
            let obj = &mut world.objects[i];
            obj.old_x = obj.x;
            obj.old_y = obj.y;
            obj.old_vx = obj.vx;
            obj.old_vy = obj.vy;
        }
        match world.objects[i].path_type {
            PathType::Chase | PathType::Chase2 if i != HERO => chase(world, i)?,
            PathType::Wander | PathType::Wander2 => wander(world, i),
            _ => {}
        }
        let obj = &world.objects[i];
        if obj.paints_boundary() {
            let (x1, x2, y) = obj.footprint();
            world.boundary.paint_footprint(x1, x2, y);
            painted.push((x1, x2, y));
        }
    }

    // Pass 2: move.
    for &i in &on_screen {
        if world.objects[i].is_moving() {
            move_one(world, i)?;
        }
    }

    // Pass 3: clear everything painted this tick.
    for (x1, x2, y) in painted {
        world.boundary.clear_footprint(x1, x2, y);
    }

    if world.maze.enabled {
        maze::process_maze(world)?;
    }
    Ok(())
}

fn chase(world: &mut WorldState, i: usize) -> Result<()> {
    let step_dx = world.config.motion.step_dx;
    let (vx, vy) = chase_velocity(&world.objects[i], &world.objects[HERO], step_dx);

    let obj = &mut world.objects[i];
    if (vx, vy) != (obj.vx, obj.vy) {
        if let Some(dir) = facing(vx, vy, obj.sequences.len()) {
            obj.face(dir);
        }
    }
    obj.vx = vx;
    obj.vy = vy;

    if vx == 0 && vy == 0 {
        obj.cycling = Cycling::NotCycling;
        debug!(object = i, "caught up with hero");
        boundary_collision(world, i)?;
    } else {
        obj.cycling = Cycling::Forward;
    }
    Ok(())
}

fn wander(world: &mut WorldState, i: usize) {
    let tps = world.config.timing.ticks_per_second;
    let (vx_path, vy_path) = (world.objects[i].vx_path, world.objects[i].vy_path);
    let Some((vx, vy)) = motion::wander_velocity(&mut world.rng, vx_path, vy_path, tps) else {
        return;
    };
    let obj = &mut world.objects[i];
    obj.vx = vx;
    obj.vy = vy;
    if vx != 0 || vy != 0 {
        if let Some(dir) = facing(vx, vy, obj.sequences.len()) {
            obj.face(dir);
        }
        obj.cycling = Cycling::Forward;
    }
}

fn move_one(world: &mut WorldState, i: usize) -> Result<()> {
    let paints = world.objects[i].paints_boundary();
    let (x1, x2, y) = world.objects[i].footprint();
    if paints {
        world.boundary.clear_footprint(x1, x2, y);
    }

    let vx = world.objects[i].vx;
    let dx = delta_x(&world.boundary, x1, x2, vx, y);
    if dx != vx {
        boundary_collision(world, i)?;
        world.objects[i].vx = 0;
    }

    let vy = world.objects[i].vy;
    let dy = delta_y(&world.boundary, x1, x2, vy, y);
    if dy != vy {
        boundary_collision(world, i)?;
        world.objects[i].vy = 0;
    }

    if paints {
        world.boundary.paint_footprint(x1, x2, y);
    }

    let obj = &mut world.objects[i];
    obj.x += dx;
    obj.y += dy;
    clamp_to_screen(obj, &world.config.screen);

    if !obj.is_moving() && !matches!(obj.path_type, PathType::Chase2 | PathType::Wander2) {
        obj.cycling = Cycling::NotCycling;
    }
    Ok(())
}

/// Something blocked object `i`, or a chaser caught up.
///
/// The hero triggers the hotspot under its leading edge; anything else
/// triggers its own action list when it is within `radius` of the hero.
pub fn boundary_collision(world: &mut WorldState, i: usize) -> Result<()> {
    if i == HERO {
        let hero = world.hero();
        let x = if hero.vx > 0 { hero.right() } else { hero.left() };
        let y = hero.baseline();
        let list = world
            .data
            .find_hotspot(world.screen, x, y)
            .and_then(|(h, spot)| spot.action_list.map(|l| (h, l)));
        if let Some((h, list)) = list {
            debug!(hotspot = h, x, y, "hero hit hotspot");
            scheduler::insert_action_list(world, list)?;
        }
        return Ok(());
    }

    let obj = &world.objects[i];
    let Some(list) = obj.action_list else { return Ok(()) };
    let hero = world.hero();
    let (of, hf) = (obj.current_frame(), hero.current_frame());
    let dx = hero.x + hf.x1 - obj.x - of.x1;
    let dy = hero.y + hf.y2 - obj.y - of.y2;
    let radius = if obj.radius < 0 {
        2 * world.config.motion.step_dx
    } else {
        obj.radius as i32
    };

    if dx.abs() <= radius && dy.abs() <= radius {
        debug!(object = i, dx, dy, "object collided with hero");
        scheduler::insert_action_list(world, list)?;
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Drawing
// ══════════════════════════════════════════════════════════════

/// Draw the current screen in painter's order, then advance animations.
pub fn update_images(world: &mut WorldState, services: &mut Services) {
    let order = object::draw_order(&world.objects, world.screen);
    for &i in &order {
        world.objects[i].tick_frame_timer();
        let obj = &world.objects[i];
        services.renderer.draw_frame(i, obj, (obj.x, obj.y), obj.display_image());
    }
    services.renderer.end_frame();

    for &i in &order {
        world.objects[i].advance_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::object::{Frame, Object, Priority, Sequence};
    use crate::sim::data::GameData;
    use crate::sim::services::Headless;

    const DATA: &str = r#"
        texts = ["caught", "door"]
        [[screens]]
        name = "room"
        [[screens]]
        name = "hall"
        [[objects]]
        name = "hero"
        x = 100
        y = 100
        sequences = [[{ x1 = 0, y1 = 0, x2 = 9, y2 = 19 }]]
        [[objects]]
        name = "dog"
        sequences = [[{ x1 = 0, y1 = 0, x2 = 9, y2 = 19 }]]
        action_list = 0
        screen = 1
        [[lists]]
        actions = [{ op = "text", text = 0 }]
        [[lists]]
        actions = [{ op = "text", text = 1 }]
        [[hotspots]]
        screen = 0
        x1 = 150
        y1 = 0
        x2 = 160
        y2 = 199
        action_list = 1
    "#;

    fn world() -> WorldState {
        let mut cfg = EngineConfig::default();
        cfg.seed = 7;
        WorldState::new(GameData::from_toml_str(DATA).unwrap(), cfg)
    }

    fn place_dog(w: &mut WorldState, dx: i32, dy: i32, path: PathType) {
        let hero = (w.hero().x, w.hero().y);
        let dog = &mut w.objects[1];
        dog.screen = 0;
        dog.x = hero.0 - dx;
        dog.y = hero.1 - dy;
        dog.path_type = path;
        dog.vx_path = 4;
        dog.vy_path = 4;
        dog.cycling = Cycling::Forward;
    }

    #[test]
    fn chaser_within_radius_stops_and_fires_same_tick() {
        let mut w = world();
        let mut h = Headless::default();
        place_dog(&mut w, 3, 3, PathType::Chase);
        w.objects[1].radius = 5;
        w.objects[1].vx = 2;
        w.objects[1].vy = 2;
        step(&mut w, &mut h.services()).unwrap();
        assert_eq!((w.objects[1].vx, w.objects[1].vy), (0, 0));
        assert_eq!(w.objects[1].cycling, Cycling::NotCycling);
        assert_eq!(h.text.said, vec!["caught"]);
    }

    #[test]
    fn chaser_outside_radius_closes_in() {
        let mut w = world();
        let mut h = Headless::default();
        place_dog(&mut w, 40, 0, PathType::Chase);
        w.objects[1].radius = 5;
        step(&mut w, &mut h.services()).unwrap();
        assert_eq!(w.objects[1].vx, 4);
        assert_eq!(w.objects[1].x, 100 - 40 + 4);
        assert_eq!(w.objects[1].cycling, Cycling::Forward);
        assert!(h.text.said.is_empty());
    }

    #[test]
    fn wall_stops_hero_and_zeroes_blocked_axis() {
        let mut w = world();
        for y in 0..200 {
            w.boundary.set_wall(113, y, true);
        }
        let hero = w.hero_mut();
        hero.vx = 5;
        hero.vy = 0;
        hero.cycling = Cycling::Forward;
        move_objects(&mut w).unwrap();
        assert_eq!(w.hero().x, 103);
        assert_eq!(w.hero().vx, 0);
        assert_eq!(w.hero().cycling, Cycling::NotCycling);
    }

    #[test]
    fn hero_bumping_hotspot_runs_its_list() {
        let mut w = world();
        let mut h = Headless::default();
        for y in 0..200 {
            w.boundary.set_wall(155, y, true);
        }
        w.hero_mut().x = 141;
        w.hero_mut().vx = 5;
        step(&mut w, &mut h.services()).unwrap();
        assert_eq!(w.hero().x, 145);
        assert_eq!(h.text.said, vec!["door"]);
    }

    #[test]
    fn objects_do_not_block_themselves() {
        let mut w = world();
        w.hero_mut().vx = 5;
        w.hero_mut().vy = 4;
        move_objects(&mut w).unwrap();
        assert_eq!((w.hero().x, w.hero().y), (105, 104));
        assert_eq!((w.hero().old_x, w.hero().old_y), (100, 100));
    }

    #[test]
    fn footprints_are_cleared_after_motion() {
        let mut w = world();
        w.hero_mut().vx = 5;
        move_objects(&mut w).unwrap();
        for x in 0..320 {
            for y in 0..200 {
                assert!(!w.boundary.is_occupied(x, y), "left footprint at {x},{y}");
            }
        }
    }

    #[test]
    fn earlier_object_blocks_later_one() {
        let mut w = world();
        place_dog(&mut w, -12, 0, PathType::Auto);
        w.objects[1].vx = -5;
        move_objects(&mut w).unwrap();
        // Hero spans 100..=109; the dog started at 112 and may close to 110.
        assert_eq!(w.objects[1].x, 110);
        assert_eq!(w.objects[1].vx, 0);
    }

    #[test]
    fn off_screen_objects_stay_put() {
        let mut w = world();
        w.objects[1].vx = 5;
        move_objects(&mut w).unwrap();
        assert_eq!(w.objects[1].x, 0);
    }

    #[test]
    fn screen_edge_snaps_back_inside() {
        let mut w = world();
        w.hero_mut().x = 12;
        w.hero_mut().vx = -5;
        move_objects(&mut w).unwrap();
        assert_eq!(w.hero().x, 20);
    }

    #[test]
    fn radius_default_is_twice_step() {
        let mut w = world();
        place_dog(&mut w, 10, 0, PathType::Auto);
        boundary_collision(&mut w, 1).unwrap();
        assert_eq!(w.queue.len(), 1);

        let mut w = world();
        place_dog(&mut w, 11, 0, PathType::Auto);
        boundary_collision(&mut w, 1).unwrap();
        assert!(w.queue.is_empty());
    }

    #[test]
    fn draw_pass_reports_visible_objects_in_order() {
        let mut w = world();
        let mut h = Headless::default();
        w.objects.push(Object {
            priority: Priority::Background,
            sequences: vec![Sequence { frames: vec![Frame::new(0, 0, 1, 1)] }],
            ..Object::default()
        });
        update_images(&mut w, &mut h.services());
        let drawn: Vec<usize> = h.renderer.frames[0].iter().map(|d| d.index).collect();
        assert_eq!(drawn, vec![2, 0]);
        assert_eq!(h.renderer.frames[0][1].pos, (100, 100));
    }

    #[test]
    fn step_advances_clock_once() {
        let mut w = world();
        let mut h = Headless::default();
        step(&mut w, &mut h.services()).unwrap();
        step(&mut w, &mut h.services()).unwrap();
        assert_eq!(w.tick, 2);
        assert_eq!(h.renderer.frames.len(), 2);
    }
}
