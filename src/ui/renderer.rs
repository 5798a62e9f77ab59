/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Screen pixels are mapped onto terminal cells (`PX_PER_COL` x
/// `PX_PER_ROW` pixels per cell). Each tick:
///   1. `draw_frame` collects the objects in painter's order
///   2. `end_frame` composes walls, objects, HUD and message line into the
///      `front` buffer
///   3. Only cells that differ from `back` (previous frame) are emitted,
///      batched with `queue!` and flushed once
///   4. Swap front/back
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::warn;

use crate::domain::boundary::BoundaryMap;
use crate::domain::object::{ImageHandle, Object};
use crate::sim::services;

/// Pixels per terminal column / row.
pub const PX_PER_COL: i32 = 4;
pub const PX_PER_ROW: i32 = 8;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }
}

// ── Palette ──

/// The 16 colours game data refers to by index.
const PALETTE: [Color; 16] = [
    Color::Rgb { r: 22, g: 22, b: 35 },
    Color::DarkBlue,
    Color::DarkGreen,
    Color::DarkCyan,
    Color::DarkRed,
    Color::DarkMagenta,
    Color::DarkYellow,
    Color::Grey,
    Color::DarkGrey,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::White,
];

#[derive(Clone, Copy)]
struct Sprite {
    glyph: char,
    col: i32,
    row: i32,
    cols: i32,
    rows: i32,
    color: u8,
}

// ── Renderer ──

pub struct TerminalRenderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Wall mask of the current screen, one flag per map cell.
    walls: Vec<bool>,
    map_cols: usize,
    map_rows: usize,
    screen_name: String,
    background: u8,
    /// Palette remap table: index → displayed index.
    remap: [u8; 16],
    sprites: Vec<Sprite>,
    status: String,
    message: String,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        TerminalRenderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            walls: Vec::new(),
            map_cols: 0,
            map_rows: 0,
            screen_name: String::new(),
            background: 0,
            remap: std::array::from_fn(|i| i as u8),
            sprites: Vec::new(),
            status: String::new(),
            message: String::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 26));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.invalidate();
    }

    /// Force a full repaint on the next frame (after a prompt scribbled
    /// over the screen, or a resize).
    pub fn invalidate(&mut self) {
        self.back.fill(Cell::INVALID);
    }

    /// HUD text for the top row.
    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Text for the bottom row.
    pub fn set_message(&mut self, message: String) {
        self.message = message;
    }

    /// Terminal rows available to the message / prompt line.
    pub fn prompt_row(&self) -> u16 {
        (MAP_ROW + self.map_rows) as u16
    }

    // ── Compose ──

    fn compose(&mut self) {
        let bg = PALETTE[(self.remap[(self.background & 15) as usize] & 15) as usize];
        self.front.fill(Cell::BLANK);

        let hud = format!(" {}  {}", self.screen_name, self.status);
        self.front.put_str(0, HUD_ROW, &hud, Color::Black, Color::Grey);

        for row in 0..self.map_rows {
            for col in 0..self.map_cols {
                let cell = if self.walls[row * self.map_cols + col] {
                    Cell { ch: '█', fg: Color::DarkGrey, bg }
                } else {
                    Cell { ch: ' ', fg: Color::White, bg }
                };
                self.front.set(col, MAP_ROW + row, cell);
            }
        }

        for s in &self.sprites {
            let fg = PALETTE[(self.remap[(s.color & 15) as usize] & 15) as usize];
            for dy in 0..s.rows.max(1) {
                for dx in 0..s.cols.max(1) {
                    let (c, r) = (s.col + dx, s.row + dy);
                    if c < 0 || r < 0 || c as usize >= self.map_cols || r as usize >= self.map_rows {
                        continue;
                    }
                    self.front.set(c as usize, MAP_ROW + r as usize, Cell { ch: s.glyph, fg, bg });
                }
            }
        }

        let msg_row = MAP_ROW + self.map_rows;
        self.front.put_str(0, msg_row, &self.message, Color::Yellow, Cell::BASE_BG);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }

    fn present(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 26));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.compose();
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map-cell wall mask: a cell is a wall when any of its pixels is.
fn wall_mask(boundary: &BoundaryMap) -> (usize, usize, Vec<bool>) {
    let cols = boundary.width().div_ceil(PX_PER_COL as usize);
    let rows = boundary.height().div_ceil(PX_PER_ROW as usize);
    let mut walls = vec![false; cols * rows];
    for row in 0..rows {
        for col in 0..cols {
            let x0 = col as i32 * PX_PER_COL;
            let y0 = row as i32 * PX_PER_ROW;
            walls[row * cols + col] = (0..PX_PER_ROW)
                .any(|dy| (0..PX_PER_COL).any(|dx| boundary.is_wall(x0 + dx, y0 + dy)));
        }
    }
    (cols, rows, walls)
}

/// Terminal cell → screen pixel (centre of the cell). `None` outside the map.
pub fn cell_to_pixel(col: u16, row: u16, map_width: usize, map_height: usize) -> Option<(i32, i32)> {
    let row = (row as usize).checked_sub(MAP_ROW)?;
    let x = col as i32 * PX_PER_COL + PX_PER_COL / 2;
    let y = row as i32 * PX_PER_ROW + PX_PER_ROW / 2;
    if x as usize >= map_width || y as usize >= map_height {
        return None;
    }
    Some((x, y))
}

impl services::Renderer for TerminalRenderer {
    fn load_screen(&mut self, _screen: usize, name: &str, boundary: &BoundaryMap) {
        let (cols, rows, walls) = wall_mask(boundary);
        self.map_cols = cols;
        self.map_rows = rows;
        self.walls = walls;
        self.screen_name = name.to_string();
        self.invalidate();
    }

    fn draw_frame(&mut self, index: usize, object: &Object, pos: (i32, i32), image: ImageHandle) {
        let f = object
            .sequences
            .get(image.seq)
            .and_then(|s| s.frames.get(image.frame))
            .copied()
            .unwrap_or_default();
        let col = (pos.0 + f.x1).div_euclid(PX_PER_COL);
        let row = (pos.1 + f.y1).div_euclid(PX_PER_ROW);
        let cols = (pos.0 + f.x2).div_euclid(PX_PER_COL) - col + 1;
        let rows = (pos.1 + f.y2).div_euclid(PX_PER_ROW) - row + 1;
        self.sprites.push(Sprite {
            glyph: object.glyph,
            col,
            row,
            cols,
            rows,
            color: (index % 15 + 1) as u8,
        });
    }

    fn set_background(&mut self, color: u32) {
        self.background = (color & 15) as u8;
    }

    fn remap_palette(&mut self, old: u8, new: u8) {
        if let Some(slot) = self.remap.get_mut((old & 15) as usize) {
            *slot = new & 15;
        }
    }

    fn end_frame(&mut self) {
        if let Err(e) = self.present() {
            warn!(error = %e, "terminal write failed");
        }
        self.sprites.clear();
    }
}
