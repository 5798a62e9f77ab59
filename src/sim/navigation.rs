//! Hero navigation: manual walking and route following.
//!
//! A route is a list of waypoints produced by the router. Each tick
//! `process_route` either snaps the hero onto the node it has reached or
//! steers it there with axis-aligned walks: first line up in x, then walk
//! in y. On the final node the route's goal decides what happens next.

use tracing::debug;

use crate::domain::object::{Cycling, PathType, WalkDir, HERO};
use crate::domain::route::{find_route, Point, RouteGoal};
use crate::error::{EngineError, Result};
use crate::sim::scheduler;
use crate::sim::services::Services;
use crate::sim::world::WorldState;

/// Where the player asked the hero to go.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WalkTarget {
    Point(Point),
    /// Walk to a hotspot's view point, then out through it.
    Exit(usize),
    /// Walk to an object's view point and look at it.
    Look(usize),
    /// Walk to an object's view point and take / use it.
    Get(usize),
}

fn hero_controllable(world: &WorldState) -> bool {
    world.accepts_commands() && world.hero().path_type == PathType::User
}

// ── Manual walking ──

/// Arrow-key walk. Repeating the current direction halts the hero.
/// Cancels any route. Returns false when the hero is not under player
/// control.
pub fn set_walk(world: &mut WorldState, dir: WalkDir) -> bool {
    if !hero_controllable(world) {
        return false;
    }
    world.route.reset();
    if world.last_walk == Some(dir) {
        halt(world);
    } else {
        head(world, dir);
    }
    true
}

fn head(world: &mut WorldState, dir: WalkDir) {
    let (sx, sy) = (world.config.motion.step_dx, world.config.motion.step_dy);
    let (vx, vy) = dir.velocity(sx, sy);
    let hero = world.hero_mut();
    hero.face(dir);
    hero.vx = vx;
    hero.vy = vy;
    hero.cycling = Cycling::Forward;
    world.last_walk = Some(dir);
}

fn halt(world: &mut WorldState) {
    let hero = world.hero_mut();
    hero.vx = 0;
    hero.vy = 0;
    hero.cycling = Cycling::NotCycling;
    world.last_walk = None;
}

// ── Routes ──

/// Plan a route for the hero to `(cx, cy)` and start following it.
///
/// Point destinations name the hero's centre, so they are shifted left by
/// half the minimum hero width. Returns false if the hero is not under
/// player control or no route exists; an active route is then left as is.
pub fn start_route(world: &mut WorldState, goal: RouteGoal, cx: i32, cy: i32) -> bool {
    if !hero_controllable(world) {
        return false;
    }
    let cx = match goal {
        RouteGoal::Space => cx - world.config.router.hero_min_width / 2,
        _ => cx,
    };
    let dest = Point::new(cx, cy);

    let Some(nodes) = find_route(
        &world.boundary,
        &world.objects,
        world.screen,
        &world.config.router,
        dest,
    ) else {
        debug!(?dest, ?goal, "no route");
        return false;
    };

    debug!(?dest, ?goal, nodes = nodes.len(), "route found");
    world.route.begin(nodes, goal);
    world.route.turned = false;
    halt(world);
    true
}

/// Click handling. Look and Get fall back to acting on the spot when the
/// object has no view point or no route to it exists. Returns whether the
/// hero started walking.
pub fn walk_to(world: &mut WorldState, services: &mut Services, target: WalkTarget) -> Result<bool> {
    if !hero_controllable(world) {
        return Ok(false);
    }
    match target {
        WalkTarget::Point(p) => Ok(start_route(world, RouteGoal::Space, p.x, p.y)),
        WalkTarget::Exit(h) => {
            let spot = world
                .data
                .hotspots
                .get(h)
                .ok_or_else(|| EngineError::GameData(format!("unknown hotspot {h}")))?;
            let (vx, vy, list) = (spot.view_x, spot.view_y, spot.action_list);
            if world.flags.jump_exit {
                jump_through(world, h, Point::new(vx, vy), list)?;
                return Ok(false);
            }
            if vx < 0 {
                return Ok(false);
            }
            Ok(start_route(world, RouteGoal::Exit(h), vx, vy))
        }
        WalkTarget::Look(o) | WalkTarget::Get(o) => {
            let goal = if matches!(target, WalkTarget::Look(_)) {
                RouteGoal::Look(o)
            } else {
                RouteGoal::Get(o)
            };
            let obj = world.object(o)?;
            let (vx, vy) = (obj.view_x, obj.view_y);
            if vx >= 0 && start_route(world, goal, vx, vy) {
                return Ok(true);
            }
            act_on(world, services, goal)?;
            Ok(false)
        }
    }
}

/// Jump-exit mode: skip the walk. The hero lands on the view point (if the
/// hotspot has one) and the hotspot's list runs as if it had been entered.
fn jump_through(world: &mut WorldState, h: usize, view: Point, list: Option<usize>) -> Result<()> {
    world.route.reset();
    if view.x >= 0 {
        arrive(world, view);
    } else {
        halt(world);
    }
    debug!(hotspot = h, ?list, "jumped through exit");
    if let Some(list) = list {
        scheduler::insert_action_list(world, list)?;
    }
    Ok(())
}

fn act_on(world: &mut WorldState, services: &mut Services, goal: RouteGoal) -> Result<()> {
    let list = match goal {
        RouteGoal::Look(o) => services.text.look_object(o, world.object(o)?),
        RouteGoal::Get(o) => services.text.use_object(o, world.object(o)?),
        _ => None,
    };
    if let Some(list) = list {
        scheduler::insert_action_list(world, list)?;
    }
    Ok(())
}

/// Advance the active route by one tick.
pub fn process_route(world: &mut WorldState, services: &mut Services) -> Result<()> {
    let Some(node) = world.route.current() else {
        return Ok(());
    };
    let (sx, sy) = (world.config.motion.step_dx, world.config.motion.step_dy);
    let (hx, hy) = world.hero().feet();

    if (hx - node.x).abs() < sx + 1 && (hy - node.y).abs() < sy {
        arrive(world, node);
        if world.route.remaining() == 0 {
            finish(world, services)?;
        } else {
            world.route.active = world.route.active.map(|i| i + 1);
        }
        return Ok(());
    }

    // Line up in x, then walk in y.
    let hero = world.hero();
    if hero.vx != 0 && (hx - node.x).abs() < sx + 1 {
        let f = hero.current_frame();
        world.hero_mut().x = node.x - f.x1;
        halt(world);
    }
    if !world.hero().is_moving() {
        let (hx, hy) = world.hero().feet();
        let dir = if (hx - node.x).abs() >= sx + 1 {
            if hx < node.x { WalkDir::Right } else { WalkDir::Left }
        } else if hy < node.y {
            WalkDir::Down
        } else {
            WalkDir::Up
        };
        head(world, dir);
    }
    Ok(())
}

fn arrive(world: &mut WorldState, node: Point) {
    let hero = &mut world.objects[HERO];
    let f = hero.current_frame();
    hero.x = node.x - f.x1;
    hero.y = node.y - f.y2;
    hero.old_x = hero.x;
    hero.old_y = hero.y;
    halt(world);
}

fn finish(world: &mut WorldState, services: &mut Services) -> Result<()> {
    let goal = world.route.goal;
    match goal {
        RouteGoal::Space => world.route.reset(),
        RouteGoal::Exit(h) => {
            world.route.reset();
            if let Some(dir) = world.data.hotspots.get(h).and_then(|s| s.direction) {
                head(world, dir);
            }
        }
        RouteGoal::Look(o) | RouteGoal::Get(o) => {
            if !world.route.turned {
                if let Some(dir) = world.object(o)?.direction {
                    world.hero_mut().face(dir);
                }
                world.route.turned = true;
                return Ok(());
            }
            world.route.reset();
            world.route.turned = false;
            act_on(world, services, goal)?;
        }
    }
    debug!(?goal, "route complete");
    Ok(())
}
