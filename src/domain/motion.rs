//! Motion maths: how far an object may move, and where chasers and
//! wanderers want to go.
//!
//! Pure functions over the boundary map and object fields. The per-tick
//! pipeline that applies them (footprint bookkeeping, collision callbacks)
//! lives in `sim::step`.
//!
//! ## Graze rule
//!
//! `delta_x` scans from the object's trailing edge to its leading edge plus
//! `vx`. If the first blocked pixel lies in the half of the object that is
//! *behind* its centre (relative to travel), the move is granted in full.
//! Sprites whose frames change width would otherwise latch onto their own
//! neighbourhood and stop dead.

use rand::Rng;

use crate::config::ScreenConfig;
use super::boundary::BoundaryMap;
use super::object::{Object, WalkDir};

// ══════════════════════════════════════════════════════════════
// Boundary scans
// ══════════════════════════════════════════════════════════════

/// Allowed horizontal displacement for a footprint `[x1, x2]` on row `y`.
///
/// Result lies in `[0, vx]` (or `[vx, 0]` for leftward motion).
pub fn delta_x(map: &BoundaryMap, x1: i32, x2: i32, vx: i32, y: i32) -> i32 {
    if vx == 0 {
        return 0;
    }
    let mid = x1 + (x2 - x1) / 2;

    if vx > 0 {
        for b in x1..=x2 + vx {
            if map.is_blocked(b, y) {
                let dx = if b < mid { vx } else { b - x2 - 1 };
                return dx.clamp(0, vx);
            }
        }
    } else {
        for b in (x1 + vx..=x2).rev() {
            if map.is_blocked(b, y) {
                let dx = if b > mid { vx } else { b - x1 + 1 };
                return dx.clamp(vx, 0);
            }
        }
    }
    vx
}

/// Allowed vertical displacement for a footprint `[x1, x2]` whose baseline
/// is row `y`. Rows are scanned one at a time in the direction of travel;
/// only pixels inside `[x1, x2]` count.
pub fn delta_y(map: &BoundaryMap, x1: i32, x2: i32, vy: i32, y: i32) -> i32 {
    if vy == 0 {
        return 0;
    }
    let inc = vy.signum();
    let mut j = y + inc;
    while j != y + vy + inc {
        if (x1..=x2).any(|x| map.is_blocked(x, j)) {
            return j - y - inc;
        }
        j += inc;
    }
    vy
}

// ══════════════════════════════════════════════════════════════
// Policies
// ══════════════════════════════════════════════════════════════

/// Velocity for a chasing object, homing on the hero's feet.
///
/// An axis within `radius` of the hero is zeroed; otherwise the distance is
/// clamped to the object's max speed. A negative radius means `step_dx`.
pub fn chase_velocity(obj: &Object, hero: &Object, step_dx: i32) -> (i32, i32) {
    let (of, hf) = (obj.current_frame(), hero.current_frame());
    let dx = hero.x + hf.x1 - obj.x - of.x1;
    let dy = hero.y + hf.y2 - obj.y - of.y2 - 1;

    let radius = if obj.radius < 0 { step_dx } else { obj.radius as i32 };
    let axis = |d: i32, max: i32| if d.abs() <= radius { 0 } else { d.clamp(-max, max) };

    (axis(dx, obj.vx_path), axis(dy, obj.vy_path))
}

/// Occasionally pick a new random velocity: on average once every
/// `3 * ticks_per_second` ticks. `None` means keep the current one.
pub fn wander_velocity<R: Rng>(
    rng: &mut R,
    vx_path: i32,
    vy_path: i32,
    ticks_per_second: u32,
) -> Option<(i32, i32)> {
    if rng.gen_range(0..=3 * ticks_per_second) != 0 {
        return None;
    }
    let vx = rng.gen_range(0..=2 * vx_path.max(0)) - vx_path.max(0);
    let vy = rng.gen_range(0..=2 * vy_path.max(0)) - vy_path.max(0);
    Some((vx, vy))
}

/// Direction sequence for a velocity, given how many sequences the sprite
/// has: four-way sprites pick the dominant axis, two-way sprites only
/// distinguish left and right.
pub fn facing(vx: i32, vy: i32, sequence_count: usize) -> Option<WalkDir> {
    match sequence_count {
        n if n >= 4 => {
            if vx == 0 && vy == 0 {
                None
            } else if vx.abs() < vy.abs() {
                Some(if vy > 0 { WalkDir::Down } else { WalkDir::Up })
            } else {
                Some(if vx > 0 { WalkDir::Right } else { WalkDir::Left })
            }
        }
        2 | 3 if vx != 0 => Some(if vx > 0 { WalkDir::Right } else { WalkDir::Left }),
        _ => None,
    }
}

/// Keep an object `edge` pixels inside the screen; strays are snapped back
/// to `edge2` pixels from the border they crossed.
pub fn clamp_to_screen(obj: &mut Object, screen: &ScreenConfig) {
    let f = obj.current_frame();
    let (w, h) = (screen.width as i32, screen.height as i32);

    if obj.x + f.x1 < screen.edge {
        obj.x = screen.edge2 - f.x1;
    }
    if obj.x + f.x2 > w - screen.edge {
        obj.x = w - screen.edge2 - f.x2;
    }
    if obj.y + f.y2 < screen.edge {
        obj.y = screen.edge2 - f.y2;
    }
    if obj.y + f.y2 > h - screen.edge {
        obj.y = h - screen.edge2 - f.y2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::object::{Frame, Sequence};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map_from(rows: &[&str]) -> BoundaryMap {
        let w = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let owned: Vec<String> = rows.iter().map(|s| s.to_string()).collect();
        BoundaryMap::from_rows(w, rows.len(), &owned)
    }

    fn sprite_at(x: i32, y: i32, w: i32, h: i32) -> Object {
        Object {
            x,
            y,
            sequences: vec![Sequence { frames: vec![Frame::new(0, 0, w - 1, h - 1)] }],
            ..Object::default()
        }
    }

    #[test]
    fn open_row_grants_full_move() {
        let map = map_from(&["...................."]);
        assert_eq!(delta_x(&map, 2, 5, 4, 0), 4);
        assert_eq!(delta_x(&map, 10, 13, -4, 0), -4);
        assert_eq!(delta_x(&map, 2, 5, 0, 0), 0);
    }

    #[test]
    fn wall_ahead_stops_short() {
        //              0123456789
        let map = map_from(&["........#."]);
        assert_eq!(delta_x(&map, 2, 5, 4, 0), 2);
        let map = map_from(&["#........."]);
        assert_eq!(delta_x(&map, 3, 6, -4, 0), -2);
    }

    #[test]
    fn wall_behind_centre_is_a_graze() {
        // Pixel 3 is inside the object's trailing half: move granted.
        let map = map_from(&["...#......"]);
        assert_eq!(delta_x(&map, 2, 9, 3, 0), 3);
        // Leftward mirror.
        let map = map_from(&["........#......."]);
        assert_eq!(delta_x(&map, 2, 9, -2, 0), -2);
    }

    #[test]
    fn wall_ahead_of_centre_inside_object_stops_dead() {
        let map = map_from(&["........#."]);
        assert_eq!(delta_x(&map, 2, 9, 3, 0), 0);
    }

    #[test]
    fn delta_x_never_exceeds_request() {
        let map = map_from(&["..#....#...#...#"]);
        for x1 in 0..10 {
            for vx in -6..=6 {
                let dx = delta_x(&map, x1, x1 + 3, vx, 0);
                assert!(dx.abs() <= vx.abs(), "x1={x1} vx={vx} dx={dx}");
                assert!(dx == 0 || dx.signum() == vx.signum());
            }
        }
    }

    #[test]
    fn non_graze_moves_never_enter_walls() {
        let map = map_from(&["....#.....#....#"]);
        for x1 in 0..8 {
            let x2 = x1 + 1;
            if (x1..=x2).any(|x| map.is_blocked(x, 0)) {
                continue;
            }
            for vx in 1..=6 {
                let dx = delta_x(&map, x1, x2, vx, 0);
                if dx == vx && (x1..=x2 + vx).any(|x| map.is_blocked(x, 0)) {
                    continue; // graze
                }
                assert!((x1..=x2 + dx).all(|x| !map.is_blocked(x, 0)), "x1={x1} vx={vx}");
            }
        }
    }

    #[test]
    fn delta_y_stops_above_wall() {
        let map = map_from(&[
            "..........",
            "..........",
            "..........",
            "....#.....",
        ]);
        assert_eq!(delta_y(&map, 2, 5, 3, 0), 2);
        // Wall outside [x1, x2] is ignored.
        assert_eq!(delta_y(&map, 6, 8, 3, 0), 3);
        assert_eq!(delta_y(&map, 2, 5, -2, 3), -2);
        assert_eq!(delta_y(&map, 2, 5, 0, 0), 0);
    }

    #[test]
    fn chase_within_radius_zeroes_both_axes() {
        let hero = sprite_at(50, 50, 8, 10);
        let mut npc = sprite_at(47, 47, 8, 10);
        npc.radius = 5;
        npc.vx_path = 4;
        npc.vy_path = 4;
        assert_eq!(chase_velocity(&npc, &hero, 5), (0, 0));
    }

    #[test]
    fn chase_clamps_to_max_speed() {
        let hero = sprite_at(100, 100, 8, 10);
        let mut npc = sprite_at(10, 150, 8, 10);
        npc.radius = 2;
        npc.vx_path = 3;
        npc.vy_path = 2;
        assert_eq!(chase_velocity(&npc, &hero, 5), (3, -2));
    }

    #[test]
    fn chase_infinite_radius_uses_step() {
        let hero = sprite_at(100, 100, 8, 10);
        let mut npc = sprite_at(95, 80, 8, 10);
        npc.vx_path = 3;
        npc.vy_path = 3;
        let (vx, vy) = chase_velocity(&npc, &hero, 5);
        assert_eq!(vx, 0);
        assert_eq!(vy, 3);
    }

    #[test]
    fn wander_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut changes = 0;
        for _ in 0..5000 {
            if let Some((vx, vy)) = wander_velocity(&mut rng, 3, 2, 9) {
                assert!((-3..=3).contains(&vx));
                assert!((-2..=2).contains(&vy));
                changes += 1;
            }
        }
        assert!(changes > 0 && changes < 1000);
    }

    #[test]
    fn facing_by_sequence_count() {
        assert_eq!(facing(3, 1, 4), Some(WalkDir::Right));
        assert_eq!(facing(-1, 3, 4), Some(WalkDir::Down));
        assert_eq!(facing(0, -3, 4), Some(WalkDir::Up));
        assert_eq!(facing(-2, 0, 2), Some(WalkDir::Left));
        assert_eq!(facing(0, 2, 2), None);
        assert_eq!(facing(2, 0, 1), None);
    }

    #[test]
    fn screen_clamp_snaps_to_inner_margin() {
        let screen = ScreenConfig { width: 320, height: 200, edge: 10, edge2: 20 };
        let mut o = sprite_at(5, 100, 8, 10);
        clamp_to_screen(&mut o, &screen);
        assert_eq!(o.left(), 20);

        let mut o = sprite_at(310, 195, 8, 10);
        clamp_to_screen(&mut o, &screen);
        assert_eq!(o.right(), 300);
        assert_eq!(o.baseline(), 180);

        let mut o = sprite_at(100, 100, 8, 10);
        clamp_to_screen(&mut o, &screen);
        assert_eq!((o.x, o.y), (100, 100));
    }
}
