//! Router: flood-fill segmentation of free space plus waypoint compression.
//!
//! ## Algorithm
//!
//!   1. Build a local cell map: static walls plus the footprints (at the
//!      start-of-tick position) of every other floating object on screen.
//!   2. `segment()` floods outward from the hero's feet one horizontal run
//!      at a time. Runs narrower than the hero are dead ends. When the
//!      destination run is reached the recursion unwinds, recording every
//!      run on the way back: the segment list goes destination → hero.
//!   3. Compression walks that list and drops a node wherever the hero
//!      can no longer walk straight through.
//!
//! Scan order inside `segment()` is biased toward the hero's x position.
//! It decides *which* route is found when several exist; keep it.
//!
//! Failure (no route, segment/node capacity, recursion depth) is `None`,
//! never an error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::RouterConfig;
use super::boundary::BoundaryMap;
use super::object::{Cycling, Object, Priority, HERO};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// A maximal free horizontal run at row `y`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    pub y: i32,
    pub x1: i32,
    pub x2: i32,
}

/// Why the hero is walking. Decides what happens on arrival.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RouteGoalKind {
    #[default]
    Space,
    Exit,
    Look,
    Get,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RouteGoal {
    /// Walk to a point.
    #[default]
    Space,
    /// Walk to a hotspot and step through it.
    Exit(usize),
    /// Walk to an object's view point and look at it.
    Look(usize),
    /// Walk to an object's view point and take / use it.
    Get(usize),
}

impl RouteGoal {
    pub fn kind(self) -> RouteGoalKind {
        match self {
            RouteGoal::Space => RouteGoalKind::Space,
            RouteGoal::Exit(_) => RouteGoalKind::Exit,
            RouteGoal::Look(_) => RouteGoalKind::Look,
            RouteGoal::Get(_) => RouteGoalKind::Get,
        }
    }

    /// Hotspot or object index carried by the goal (0 for `Space`).
    pub fn target(self) -> usize {
        match self {
            RouteGoal::Space => 0,
            RouteGoal::Exit(i) | RouteGoal::Look(i) | RouteGoal::Get(i) => i,
        }
    }

    pub fn from_parts(kind: RouteGoalKind, target: usize) -> Self {
        match kind {
            RouteGoalKind::Space => RouteGoal::Space,
            RouteGoalKind::Exit => RouteGoal::Exit(target),
            RouteGoalKind::Look => RouteGoal::Look(target),
            RouteGoalKind::Get => RouteGoal::Get(target),
        }
    }
}

/// Route-follow state for the hero.
///
/// `nodes` are in walking order; the last node is the destination.
/// `active` is the node currently being walked to (`None` = no route).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    pub nodes: Vec<Point>,
    pub active: Option<usize>,
    pub goal: RouteGoal,
    /// Look/Get arrival takes one extra tick to turn toward the object.
    pub turned: bool,
}

impl Route {
    pub fn begin(&mut self, nodes: Vec<Point>, goal: RouteGoal) {
        self.active = if nodes.is_empty() { None } else { Some(0) };
        self.nodes = nodes;
        self.goal = goal;
    }

    /// Cancel any route in progress.
    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<Point> {
        self.active.and_then(|i| self.nodes.get(i).copied())
    }

    /// Nodes still to reach after the current one; -1 when idle.
    pub fn remaining(&self) -> i32 {
        match self.active {
            Some(i) => self.nodes.len() as i32 - 1 - i as i32,
            None => -1,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Local map + flood
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Cell {
    Free,
    Bound,
    Fill,
}

struct Flood<'a> {
    cells: Vec<Vec<Cell>>,
    width: i32,
    height: i32,
    cfg: &'a RouterConfig,
    hero_x: i32,
    dest: Point,
    segments: Vec<Segment>,
    found: bool,
    full: bool,
}

impl<'a> Flood<'a> {
    fn stop(&self) -> bool {
        self.found || self.full
    }

    fn is_free(&self, x: i32, y: i32) -> bool {
        self.cells[y as usize][x as usize] == Cell::Free
    }

    fn segment(&mut self, x: i32, y: i32, depth: usize) {
        if depth > self.cfg.max_depth {
            self.full = true;
            return;
        }

        // Fill either side of the seed. Column 0 is never part of a run.
        let row = y as usize;
        let mut x1 = x;
        while x1 > 0 {
            if self.cells[row][x1 as usize] == Cell::Free {
                self.cells[row][x1 as usize] = Cell::Fill;
                x1 -= 1;
            } else {
                break;
            }
        }
        let mut x2 = x + 1;
        while x2 < self.width {
            if self.cells[row][x2 as usize] == Cell::Free {
                self.cells[row][x2 as usize] = Cell::Fill;
                x2 += 1;
            } else {
                break;
            }
        }
        x1 += 1;
        x2 -= 1;

        if self.cfg.hero_min_width > x2 - x1 + 1 {
            return;
        }

        if y == self.dest.y && x1 <= self.dest.x && x2 >= self.dest.x {
            self.found = true;
        }

        if y <= 0 || y >= self.height - 1 {
            return;
        }

        let hx = self.hero_x;
        if hx < x1 {
            self.scan_row(x1..=x2, y - 1, depth);
            self.scan_row(x1..=x2, y + 1, depth);
        } else if hx + self.cfg.hero_max_width > x2 {
            self.scan_row((x1..=x2).rev(), y - 1, depth);
            self.scan_row((x1..=x2).rev(), y + 1, depth);
        } else {
            self.scan_row(hx..=x2, y - 1, depth);
            self.scan_row(x1..hx, y - 1, depth);
            self.scan_row(hx..=x2, y + 1, depth);
            self.scan_row(x1..hx, y + 1, depth);
        }

        // Leave a trail back to the hero; one slot is kept for the hero's
        // own base segment.
        if self.found {
            if self.segments.len() >= self.cfg.max_segments.saturating_sub(1) {
                self.full = true;
            } else {
                self.segments.push(Segment { y, x1, x2 });
            }
        }
    }

    fn scan_row<I: Iterator<Item = i32>>(&mut self, xs: I, y: i32, depth: usize) {
        for x in xs {
            if self.stop() {
                break;
            }
            if self.is_free(x, y) {
                self.segment(x, y, depth + 1);
            }
        }
    }
}

fn local_map(map: &BoundaryMap, objects: &[Object], screen: usize) -> Vec<Vec<Cell>> {
    let (w, h) = (map.width(), map.height());
    let mut cells: Vec<Vec<Cell>> = (0..h)
        .map(|y| {
            (0..w)
                .map(|x| if map.is_wall(x as i32, y as i32) { Cell::Bound } else { Cell::Free })
                .collect()
        })
        .collect();

    for (i, obj) in objects.iter().enumerate() {
        if i == HERO
            || obj.screen != screen
            || obj.cycling == Cycling::Invisible
            || obj.priority != Priority::Floating
        {
            continue;
        }
        let (x1, x2, y) = obj.old_footprint();
        if y < 0 || y as usize >= h {
            continue;
        }
        for x in x1.max(0)..=x2.min(w as i32 - 1) {
            cells[y as usize][x as usize] = Cell::Bound;
        }
    }
    cells
}

// ══════════════════════════════════════════════════════════════
// Public entry point
// ══════════════════════════════════════════════════════════════

/// Find a walkable route for the hero (`objects[HERO]`) to `dest`
/// (a feet position). Returns nodes in walking order, ending at `dest`.
pub fn find_route(
    map: &BoundaryMap,
    objects: &[Object],
    screen: usize,
    cfg: &RouterConfig,
    dest: Point,
) -> Option<Vec<Point>> {
    let hero = objects.get(HERO)?;
    let hf = hero.current_frame();
    let hero_x1 = hero.x + hf.x1;
    let hero_x2 = hero.x + hf.x2;
    let hero_y = hero.y + hf.y2;
    let hero_w = hf.x2 - hf.x1;

    let (w, h) = (map.width() as i32, map.height() as i32);
    if hero_x1 < 0 || hero_x1 >= w || hero_y < 0 || hero_y >= h {
        return None;
    }

    let mut flood = Flood {
        cells: local_map(map, objects, screen),
        width: w,
        height: h,
        cfg,
        hero_x: hero.x,
        dest,
        segments: Vec::new(),
        found: false,
        full: false,
    };
    flood.segment(hero_x1, hero_y, 0);
    if !flood.found || flood.full {
        return None;
    }

    let mut segs = flood.segments;
    segs.push(Segment { y: hero_y, x1: hero_x1, x2: hero_x2 });

    // Compress. `nodes[0]` is the destination; each new node starts as a
    // copy of the previous one.
    let mut nodes = vec![dest];
    let mut i = 0usize;
    while i + 1 < segs.len() {
        if nodes.len() >= cfg.max_nodes {
            return None;
        }
        let mut node = *nodes.last()?;
        node.y = segs[i].y;
        nodes.push(node);
        let mut restart = None;

        for j in i + 1..segs.len() {
            let seg = segs[j];
            let cur = nodes.len() - 1;
            if seg.x1 <= nodes[cur].x && seg.x2 >= nodes[cur].x + hero_w {
                nodes[cur].y = seg.y;
                continue;
            }

            if nodes.len() >= cfg.max_nodes {
                return None;
            }
            let mut node = nodes[cur];

            let x1 = segs[j - 1].x1.max(seg.x1);
            let x2 = segs[j - 1].x2.min(seg.x2);
            let mut dx = cfg.hero_max_width / 2;
            if x2 - x1 < hero_w + dx {
                dx = 0;
            }

            node.x = if j == segs.len() - 1 {
                hero_x1
            } else if hero_x1 < x1 {
                x1 + dx
            } else if hero_x1 > x2 - hero_w {
                x2 - hero_w - dx
            } else {
                hero_x1
            };
            nodes.push(node);
            restart = Some(j - 1);
            break;
        }

        let last = nodes.last().copied()?;
        if last.x == hero_x1 && last.y == hero_y {
            break;
        }
        match restart {
            Some(r) => i = r,
            None => break,
        }
    }

    nodes.reverse();
    Some(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::object::{Frame, Sequence};

    fn router(min_width: i32) -> RouterConfig {
        RouterConfig { hero_min_width: min_width, ..EngineConfig::default().router }
    }

    fn hero_at(feet_x: i32, feet_y: i32, width: i32) -> Object {
        Object {
            x: feet_x,
            y: feet_y - 9,
            sequences: vec![Sequence { frames: vec![Frame::new(0, 0, width - 1, 9)] }],
            ..Object::default()
        }
    }

    #[test]
    fn open_field_reaches_destination() {
        let map = BoundaryMap::new(100, 100);
        let objs = vec![hero_at(10, 10, 8)];
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(90, 90)).unwrap();
        assert_eq!(nodes.last(), Some(&Point::new(90, 90)));
        assert_eq!(nodes.first(), Some(&Point::new(10, 10)));
        assert_eq!(nodes, vec![Point::new(10, 10), Point::new(90, 10), Point::new(90, 90)]);
    }

    #[test]
    fn solid_wall_column_fails() {
        let mut map = BoundaryMap::new(100, 100);
        for y in 0..100 {
            map.set_wall(50, y, true);
        }
        let objs = vec![hero_at(10, 10, 8)];
        assert_eq!(find_route(&map, &objs, 0, &router(8), Point::new(90, 90)), None);
    }

    fn walled_room(gap: std::ops::Range<i32>) -> BoundaryMap {
        let mut map = BoundaryMap::new(100, 100);
        for x in 70..=95 {
            if !gap.contains(&x) {
                map.set_wall(x, 60, true);
            }
            map.set_wall(x, 95, true);
        }
        for y in 60..=95 {
            map.set_wall(70, y, true);
            map.set_wall(95, y, true);
        }
        map
    }

    #[test]
    fn gap_narrower_than_hero_is_a_dead_end() {
        let objs = vec![hero_at(10, 10, 8)];
        let map = walled_room(80..85);
        assert_eq!(find_route(&map, &objs, 0, &router(8), Point::new(85, 80)), None);

        let map = walled_room(80..90);
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(85, 80)).unwrap();
        assert_eq!(nodes.last(), Some(&Point::new(85, 80)));
    }

    #[test]
    fn route_goes_around_obstacle() {
        let mut map = BoundaryMap::new(100, 100);
        for y in 0..80 {
            map.set_wall(50, y, true);
        }
        let objs = vec![hero_at(10, 10, 8)];
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(90, 10)).unwrap();
        assert_eq!(nodes.last(), Some(&Point::new(90, 10)));
        assert!(nodes.iter().any(|p| p.y >= 80), "route must pass below the wall: {nodes:?}");
    }

    #[test]
    fn other_objects_block_but_hero_does_not() {
        let mut map = BoundaryMap::new(100, 40);
        // Horizontal walls leave a single corridor at rows 18..=22.
        for x in 0..100 {
            for y in 0..18 {
                map.set_wall(x, y, true);
            }
            for y in 23..40 {
                map.set_wall(x, y, true);
            }
        }
        let mut objs = vec![hero_at(10, 20, 8)];
        assert!(find_route(&map, &objs, 0, &router(8), Point::new(90, 20)).is_some());

        // A wide prop standing in the corridor on every row blocks it.
        for y in 18..=22 {
            let mut prop = hero_at(40, y, 20);
            prop.old_x = prop.x;
            prop.old_y = prop.y;
            objs.push(prop);
        }
        assert_eq!(find_route(&map, &objs, 0, &router(8), Point::new(90, 20)), None);

        // Same props on another screen are ignored.
        for o in objs.iter_mut().skip(1) {
            o.screen = 3;
        }
        assert!(find_route(&map, &objs, 0, &router(8), Point::new(90, 20)).is_some());
    }

    #[test]
    fn segment_capacity_overflow_fails_quietly() {
        let map = BoundaryMap::new(100, 100);
        let objs = vec![hero_at(10, 10, 8)];
        let cfg = RouterConfig { max_segments: 10, ..router(8) };
        assert_eq!(find_route(&map, &objs, 0, &cfg, Point::new(90, 90)), None);
    }

    #[test]
    fn depth_cap_fails_quietly() {
        let map = BoundaryMap::new(100, 100);
        let objs = vec![hero_at(10, 10, 8)];
        let cfg = RouterConfig { max_depth: 20, ..router(8) };
        assert_eq!(find_route(&map, &objs, 0, &cfg, Point::new(90, 90)), None);
    }

    #[test]
    fn node_cap_is_the_largest_route_allowed() {
        let map = BoundaryMap::new(100, 100);
        let objs = vec![hero_at(10, 10, 8)];
        let cfg = RouterConfig { max_nodes: 3, ..router(8) };
        let nodes = find_route(&map, &objs, 0, &cfg, Point::new(90, 90)).unwrap();
        assert_eq!(nodes.len(), 3);
        let cfg = RouterConfig { max_nodes: 2, ..router(8) };
        assert_eq!(find_route(&map, &objs, 0, &cfg, Point::new(90, 90)), None);
    }

    /// Open floors above row 21 and below row 39, joined only by the given
    /// vertical shafts.
    fn two_floors(shafts: &[(i32, i32)]) -> BoundaryMap {
        let mut map = BoundaryMap::new(100, 60);
        for y in 21..=39 {
            for x in 0..100 {
                if !shafts.iter().any(|&(a, b)| x >= a && x <= b) {
                    map.set_wall(x, y, true);
                }
            }
        }
        map
    }

    const SHAFTS: [(i32, i32); 3] = [(20, 29), (50, 59), (80, 89)];

    #[test]
    fn hero_inside_run_scans_from_hero_rightward_first() {
        // Hero at x=40 with room to its right: the shaft at 50 is tried
        // before the one at 20 even though 20 comes first in x.
        let map = two_floors(&SHAFTS);
        let objs = vec![hero_at(40, 47, 8)];
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(10, 10)).unwrap();
        assert_eq!(
            nodes,
            vec![
                Point::new(40, 47),
                Point::new(50, 47),
                Point::new(50, 20),
                Point::new(10, 20),
                Point::new(10, 10),
            ]
        );
    }

    #[test]
    fn hero_near_run_end_scans_right_to_left() {
        // x=92 plus the widest hero passes the run's right end, so rows are
        // scanned from the right and the shaft at 80 wins.
        let map = two_floors(&SHAFTS);
        let objs = vec![hero_at(92, 47, 8)];
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(10, 10)).unwrap();
        assert_eq!(
            nodes,
            vec![
                Point::new(92, 47),
                Point::new(82, 47),
                Point::new(82, 20),
                Point::new(10, 20),
                Point::new(10, 10),
            ]
        );
    }

    #[test]
    fn run_right_of_hero_scans_left_to_right() {
        // The hero's floor leads into a room spanning x 40..=99, wholly right
        // of the hero. From there the nearer shaft at 50 is taken, not the
        // one at 80.
        let mut map = BoundaryMap::new(100, 60);
        for y in 21..=44 {
            for x in 0..100 {
                let room = y >= 30 && x >= 40;
                let shaft = y <= 29 && ((50..=59).contains(&x) || (80..=89).contains(&x));
                if !room && !shaft {
                    map.set_wall(x, y, true);
                }
            }
        }
        let objs = vec![hero_at(5, 47, 8)];
        let nodes = find_route(&map, &objs, 0, &router(8), Point::new(30, 10)).unwrap();
        assert_eq!(
            nodes,
            vec![
                Point::new(5, 47),
                Point::new(50, 47),
                Point::new(50, 20),
                Point::new(30, 20),
                Point::new(30, 10),
            ]
        );
    }

    #[test]
    fn hero_off_map_fails() {
        let map = BoundaryMap::new(50, 50);
        let objs = vec![hero_at(10, 70, 8)];
        assert_eq!(find_route(&map, &objs, 0, &router(8), Point::new(20, 20)), None);
    }

    #[test]
    fn route_state_counts_remaining_nodes() {
        let mut r = Route::default();
        assert_eq!(r.remaining(), -1);
        r.begin(vec![Point::new(0, 0), Point::new(5, 0), Point::new(5, 5)], RouteGoal::Look(3));
        assert_eq!(r.remaining(), 2);
        assert_eq!(r.current(), Some(Point::new(0, 0)));
        r.reset();
        assert!(!r.is_active());
        assert_eq!(RouteGoal::from_parts(RouteGoalKind::Look, 3), RouteGoal::Look(3));
    }
}
