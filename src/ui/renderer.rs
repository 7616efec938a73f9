/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screens follow the session phase: Idle → title cards, Playing → sky,
/// Complete → summary.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::RulesConfig;
use crate::domain::sky::{Category, StarId};
use crate::sim::session::{Phase, SessionView};
use crate::ui::layout::{self, Field, FIELD_TOP, HUD_ROW};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, matching the Clear colour so
    /// row gaps never show the terminal default.
    const BASE_BG: Color = Color::Rgb { r: 8, g: 10, b: 28 };

    const BLANK: Cell = Cell { ch: [b' ', 0, 0, 0], ch_len: 1, fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a real cell: forces a full repaint.
    const INVALID: Cell = Cell { ch: [b'?', 0, 0, 0], ch_len: 1, fg: Color::Magenta, bg: Color::Magenta };

    fn new(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
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

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
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
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Horizontally centred text.
    fn put_center(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 90 };
const SKY_TEXT: Color = Color::Rgb { r: 170, g: 190, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 24, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const CORRECT: Color = Color::Rgb { r: 80, g: 230, b: 120 };
const WRONG: Color = Color::Rgb { r: 240, g: 70, b: 70 };
const CURSOR: Color = Color::Rgb { r: 90, g: 200, b: 255 };
const FAINT: Color = Color::Rgb { r: 70, g: 80, b: 120 };
const DIM: Color = Color::DarkGrey;

/// Presentation-only state owned by the main loop.
pub struct UiState {
    pub cursor: Option<StarId>,
    pub message: String,
    pub catalog_source: String,
    pub category: Category,
    pub pool_size: usize,
    pub rules: RulesConfig,
    pub anim_tick: u64,
    pub gamepad: bool,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
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

    /// Star field rectangle for the current terminal size.
    pub fn field(&self) -> Field {
        Field::for_terminal(self.term_w, self.term_h)
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, view: &SessionView<'_>, ui: &UiState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(view.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(view.phase);
        }

        self.front.clear();
        self.compose_background(ui.anim_tick);
        match view.phase {
            Phase::Idle => self.compose_title(view, ui),
            Phase::Playing => self.compose_sky(view, ui),
            Phase::Complete => self.compose_summary(view, ui),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

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
                queue!(self.writer, Print(cell.as_str()))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    /// Sparse twinkling backdrop behind every screen.
    fn compose_background(&mut self, tick: u64) {
        for y in 0..self.front.height {
            for x in 0..self.front.width {
                if let Some((ch, fg)) = twinkle(x, y, tick) {
                    self.front.set(x, y, Cell::new(ch, fg, Color::Reset));
                }
            }
        }
    }

    fn compose_title(&mut self, view: &SessionView<'_>, ui: &UiState) {
        let banner = "✦  C O N S T E L L A T I O N   C H A L L E N G E  ✦";
        self.front.put_center(2, banner, GOLD, Color::Reset);
        self.front.put_center(4, "Trace the hidden shape before the clock runs out.", SKY_TEXT, Color::Reset);

        let r = &ui.rules;
        let cards: [(&str, [String; 3]); 3] = [
            ("Connect Stars", [
                "Click a star, then".into(),
                "another, to draw".into(),
                "a line between them.".into(),
            ]),
            ("Earn Points", [
                format!("{} pts per correct", r.points_per_edge),
                "line, plus a time".into(),
                format!("bonus of {}/sec.", r.bonus_per_second),
            ]),
            ("Beat the Clock", [
                format!("{} on the clock.", layout::format_time(r.session_secs)),
                format!("Clear as many {}", ui.category.plural()),
                "as you can.".into(),
            ]),
        ];

        const CARD_W: usize = 24;
        let total = CARD_W * 3 + 4;
        let left = self.front.width.saturating_sub(total) / 2;
        for (i, (title, body)) in cards.iter().enumerate() {
            let x = left + i * (CARD_W + 2);
            self.compose_card(x, 7, CARD_W, title, body);
        }

        let info = format!(
            "Catalog: {}  ·  {} ({})",
            ui.catalog_source, ui.category.plural(), ui.pool_size
        );
        self.front.put_center(15, &info, DIM, Color::Reset);

        if view.awaiting_content || ui.pool_size == 0 {
            let notice = format!(
                " No {} available. Add entries to the catalog and press F5. ",
                ui.category.plural()
            );
            self.front.put_center(17, &notice, Color::Black, WRONG);
        } else {
            self.front.put_center(17, "▸ ENTER  Start", CORRECT, Color::Reset);
        }
        self.front.put_center(19, "Q Quit   F5 Reload catalog", DIM, Color::Reset);
        if ui.gamepad {
            self.front.put_center(20, "Gamepad connected: START to play", SKY_TEXT, Color::Reset);
        }
        self.compose_message(ui);
    }

    fn compose_card(&mut self, x: usize, y: usize, w: usize, title: &str, body: &[String]) {
        let edge = "─".repeat(w - 2);
        self.front.put_str(x, y, &format!("╭{}╮", edge), FAINT, Color::Reset);
        for row in 1..=body.len() + 2 {
            self.front.put_str(x, y + row, "│", FAINT, Color::Reset);
            self.front.put_str(x + w - 1, y + row, "│", FAINT, Color::Reset);
        }
        self.front.put_str(x, y + body.len() + 3, &format!("╰{}╯", edge), FAINT, Color::Reset);
        self.front.put_str(x + 2, y + 1, title, GOLD, Color::Reset);
        for (i, line) in body.iter().enumerate() {
            self.front.put_str(x + 2, y + 3 + i, line, Color::White, Color::Reset);
        }
    }

    fn compose_sky(&mut self, view: &SessionView<'_>, ui: &UiState) {
        let field = self.field();

        // ── HUD row ──
        let name = match view.entity {
            Some(e) => match &e.description {
                Some(d) => format!("{} ({})", e.name, d),
                None => e.name.clone(),
            },
            None => String::new(),
        };
        let hud = format!(
            " Score: {:<6}  Level: {:<3}  Lines: {:>2}/{:<2}  Time: {:>5}   {}",
            view.score, view.level, view.matched, view.targets, layout::format_time(view.time_remaining), name
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        if view.time_remaining <= ui.rules.warning_secs {
            let timer = format!("Time: {:>5}", layout::format_time(view.time_remaining));
            let col = hud.find("Time:").map(|b| hud[..b].chars().count()).unwrap_or(0);
            self.front.put_str(col, HUD_ROW, &timer, WRONG, HUD_BG);
        }

        if view.entity.is_none() {
            let mid = field.top + field.height / 2;
            self.front.put_center(mid, &loading_line(ui.category), SKY_TEXT, Color::Reset);
            self.compose_footer(&field, ui);
            return;
        }

        // ── Edges (dashes start at the first star clicked) ──
        for ev in &view.edges {
            let (a, b) = match (star_at(view, ev.edge.from), star_at(view, ev.edge.to)) {
                (Some(a), Some(b)) => (field.cell_at(a.0, a.1), field.cell_at(b.0, b.1)),
                _ => continue,
            };
            let glyph = layout::line_glyph(a, b);
            for (i, (x, y)) in layout::line_cells(a, b).into_iter().enumerate() {
                if ev.correct {
                    self.front.set(x, y, Cell::new(glyph, CORRECT, Color::Reset));
                } else if i % 2 == 0 {
                    self.front.set(x, y, Cell::new(glyph, WRONG, Color::Reset));
                }
            }
        }

        // ── Stars ──
        for star in view.stars {
            let (x, y) = field.star_cell(star);
            let selected = view.selected == Some(star.id);
            let cell = if view.round_cleared {
                Cell::new('✦', GOLD, Color::Reset)
            } else if selected {
                Cell::new('✦', Color::Black, GOLD)
            } else {
                Cell::new('✦', Color::White, Color::Reset)
            };
            self.front.set(x, y, cell);
            if ui.cursor == Some(star.id) && !view.round_cleared {
                if x > 0 {
                    self.front.set(x - 1, y, Cell::new('[', CURSOR, Color::Reset));
                }
                self.front.set(x + 1, y, Cell::new(']', CURSOR, Color::Reset));
            }
        }

        self.compose_footer(&field, ui);
    }

    fn compose_footer(&mut self, field: &Field, ui: &UiState) {
        self.compose_message(ui);
        let help_row = field.top + field.height + 2;
        if help_row < self.front.height {
            let help = " Click/ENTER: select star  ←↑↓→/TAB: move cursor  ESC: deselect/menu  Q: quit";
            self.front.put_str(0, help_row, help, DIM, Color::Reset);
        }
    }

    fn compose_message(&mut self, ui: &UiState) {
        if ui.message.is_empty() {
            return;
        }
        let row = self.front.height.saturating_sub(2);
        if row <= FIELD_TOP {
            return;
        }
        self.front.fill_row(row, MSG_BG);
        self.front.put_str(0, row, &format!(" ✦ {} ", ui.message), Color::Black, MSG_BG);
    }

    fn compose_summary(&mut self, view: &SessionView<'_>, ui: &UiState) {
        let top = self.front.height.saturating_sub(12) / 2;
        self.front.put_center(top, "╔══════════════════════════╗", GOLD, Color::Reset);
        self.front.put_center(top + 1, "║        TIME'S UP!        ║", GOLD, Color::Reset);
        self.front.put_center(top + 2, "╚══════════════════════════╝", GOLD, Color::Reset);

        self.front.put_center(top + 4, &format!("Final Score: {}", view.score), Color::White, Color::Reset);
        self.front.put_center(top + 5, &format!("Level Reached: {}", view.level), Color::White, Color::Reset);
        let done = completed_line(view.rounds_cleared, ui.category);
        self.front.put_center(top + 7, &done, CORRECT, Color::Reset);

        self.front.put_center(top + 9, "▸ ENTER: Play again", CORRECT, Color::Reset);
        self.front.put_center(top + 10, "▸ ESC:   Back to menu", DIM, Color::Reset);
    }
}

/// Percent position of a star in the view.
fn star_at(view: &SessionView<'_>, id: StarId) -> Option<(f32, f32)> {
    view.stars.iter().find(|s| s.id == id).map(|s| (s.x, s.y))
}

/// "You completed N constellation(s)!" with the right noun form.
pub fn completed_line(count: u32, category: Category) -> String {
    let noun = if count == 1 { category.singular() } else { category.plural() };
    format!("You completed {} {}!", count, noun)
}

fn loading_line(category: Category) -> String {
    format!("Loading {}…", category.singular())
}

/// Background star for a cell, if any. About one cell in ninety carries a
/// star; each one brightens on its own slow cycle.
fn twinkle(x: usize, y: usize, tick: u64) -> Option<(char, Color)> {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 29;
    h = h.wrapping_mul(0x1656_67B1_9E37_79F9);
    h ^= h >> 32;
    if h % 89 != 0 {
        return None;
    }
    let phase = (h >> 8) % 40;
    if (tick + phase) % 40 < 4 {
        Some(('+', SKY_TEXT))
    } else {
        Some(('·', FAINT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_pluralises() {
        assert_eq!(completed_line(1, Category::Constellations), "You completed 1 constellation!");
        assert_eq!(completed_line(0, Category::Constellations), "You completed 0 constellations!");
        assert_eq!(completed_line(3, Category::Galaxies), "You completed 3 galaxies!");
    }

    #[test]
    fn loading_names_the_category() {
        assert_eq!(loading_line(Category::Galaxies), "Loading galaxy…");
        assert_eq!(loading_line(Category::Stars), "Loading star…");
    }

    #[test]
    fn twinkle_is_sparse_and_stable() {
        let count = (0..80).flat_map(|x| (0..24).map(move |y| (x, y)))
            .filter(|&(x, y)| twinkle(x, y, 0).is_some())
            .count();
        assert!(count > 0 && count < 80 * 24 / 20);
        for x in 0..80 {
            for y in 0..24 {
                assert_eq!(twinkle(x, y, 7).is_some(), twinkle(x, y, 123).is_some());
            }
        }
    }

    #[test]
    fn cell_roundtrips_multibyte_glyph() {
        let c = Cell::new('✦', Color::White, Color::Reset);
        assert_eq!(c.as_str(), "✦");
        assert_eq!(c.bg, Cell::BASE_BG);
    }
}
