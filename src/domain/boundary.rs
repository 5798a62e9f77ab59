//! Boundary map: which screen pixels are impassable.
//!
//! ## Two layers, composed at query time
//!
//!   - `walls`: the static boundary loaded with the screen. Only changed
//!     by a screen load.
//!   - `overlay`: object occupancy. Floating objects paint the run of
//!     pixels under their feet here and erase it again, every tick.
//!
//! `is_blocked()` = wall OR overlay. Out-of-range coordinates are never
//! blocked and never panic: game data regularly pokes one pixel past the
//! screen edge.

#[derive(Clone, Debug)]
pub struct BoundaryMap {
    width: usize,
    height: usize,
    walls: Vec<Vec<bool>>,
    overlay: Vec<Vec<bool>>,
}

impl BoundaryMap {
    pub fn new(width: usize, height: usize) -> Self {
        BoundaryMap {
            width,
            height,
            walls: vec![vec![false; width]; height],
            overlay: vec![vec![false; width]; height],
        }
    }

    /// Build a map from text rows. `'#'` marks an impassable pixel.
    /// Short rows are padded with free pixels.
    pub fn from_rows(width: usize, height: usize, rows: &[String]) -> Self {
        let mut map = BoundaryMap::new(width, height);
        map.load_rows(rows);
        map
    }

    /// Replace the static layer (screen load). The overlay is wiped too.
    pub fn load_rows(&mut self, rows: &[String]) {
        for row in self.walls.iter_mut() {
            row.fill(false);
        }
        self.clear_overlay();
        for (y, row) in rows.iter().enumerate().take(self.height) {
            for (x, ch) in row.chars().enumerate().take(self.width) {
                self.walls[y][x] = ch == '#';
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            Some((x, y))
        } else {
            None
        }
    }

    /// Static boundary only.
    #[inline]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |(x, y)| self.walls[y][x])
    }

    /// Object occupancy only.
    #[inline]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |(x, y)| self.overlay[y][x])
    }

    /// Static boundary OR object occupancy.
    #[inline]
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |(x, y)| self.walls[y][x] || self.overlay[y][x])
    }

    pub fn set_wall(&mut self, x: i32, y: i32, blocked: bool) {
        if let Some((x, y)) = self.index(x, y) {
            self.walls[y][x] = blocked;
        }
    }

    /// Set `[x1, x2]` (inclusive) on row `y` of the occupancy overlay.
    pub fn paint_footprint(&mut self, x1: i32, x2: i32, y: i32) {
        self.fill_overlay(x1, x2, y, true);
    }

    /// Clear `[x1, x2]` (inclusive) on row `y` of the occupancy overlay.
    pub fn clear_footprint(&mut self, x1: i32, x2: i32, y: i32) {
        self.fill_overlay(x1, x2, y, false);
    }

    pub fn clear_overlay(&mut self) {
        for row in self.overlay.iter_mut() {
            row.fill(false);
        }
    }

    fn fill_overlay(&mut self, x1: i32, x2: i32, y: i32, value: bool) {
        if y < 0 || y as usize >= self.height || self.width == 0 {
            return;
        }
        let lo = x1.max(0);
        let hi = x2.min(self.width as i32 - 1);
        if lo > hi {
            return;
        }
        self.overlay[y as usize][lo as usize..=hi as usize].fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_mark_walls() {
        let map = BoundaryMap::from_rows(4, 2, &rows(&["#..#", ".##"]));
        assert!(map.is_wall(0, 0));
        assert!(!map.is_wall(1, 0));
        assert!(map.is_wall(3, 0));
        assert!(map.is_wall(2, 1));
        assert!(!map.is_wall(3, 1)); // short row padded
    }

    #[test]
    fn out_of_range_is_free() {
        let map = BoundaryMap::from_rows(2, 2, &rows(&["##", "##"]));
        assert!(!map.is_blocked(-1, 0));
        assert!(!map.is_blocked(0, -1));
        assert!(!map.is_blocked(2, 0));
        assert!(!map.is_blocked(0, 2));
    }

    #[test]
    fn footprint_range_is_inclusive() {
        let mut map = BoundaryMap::new(10, 3);
        map.paint_footprint(2, 5, 1);
        assert!(!map.is_blocked(1, 1));
        assert!(map.is_blocked(2, 1));
        assert!(map.is_blocked(5, 1));
        assert!(!map.is_blocked(6, 1));
        assert!(!map.is_blocked(3, 0));
        assert!(map.is_occupied(3, 1));
        assert!(!map.is_wall(3, 1));
    }

    #[test]
    fn paint_then_clear_restores_state() {
        let mut map = BoundaryMap::from_rows(12, 3, &rows(&["", "#...#....##", ""]));
        let before: Vec<bool> = (0..12).map(|x| map.is_blocked(x, 1)).collect();
        for (x1, x2) in [(0, 11), (3, 3), (4, 9), (10, 11)] {
            map.paint_footprint(x1, x2, 1);
            map.clear_footprint(x1, x2, 1);
            let after: Vec<bool> = (0..12).map(|x| map.is_blocked(x, 1)).collect();
            assert_eq!(before, after, "pair ({x1},{x2})");
        }
    }

    #[test]
    fn paint_is_idempotent() {
        let mut map = BoundaryMap::new(8, 1);
        map.paint_footprint(1, 3, 0);
        map.paint_footprint(1, 3, 0);
        map.clear_footprint(1, 3, 0);
        assert!((0..8).all(|x| !map.is_blocked(x, 0)));
    }

    #[test]
    fn footprint_clamps_at_edges() {
        let mut map = BoundaryMap::new(5, 2);
        map.paint_footprint(-3, 2, 0);
        map.paint_footprint(3, 40, 1);
        map.paint_footprint(0, 4, 7);
        map.paint_footprint(4, 1, 0);
        assert!(map.is_blocked(0, 0) && map.is_blocked(2, 0));
        assert!(!map.is_blocked(3, 0));
        assert!(map.is_blocked(4, 1));
    }

    #[test]
    fn load_rows_wipes_overlay() {
        let mut map = BoundaryMap::new(4, 1);
        map.paint_footprint(0, 3, 0);
        map.load_rows(&rows(&["#"]));
        assert!(map.is_blocked(0, 0));
        assert!(!map.is_blocked(1, 0));
    }
}
