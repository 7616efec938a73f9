/// Screen geometry for the sky view.
///
/// Star coordinates are percentages of the play field. The field is the
/// terminal area between the HUD row and the bottom bars; percentages are
/// scaled independently on each axis.
///
/// Terminal cells are roughly twice as tall as wide, so distances measured
/// in cells weight rows by `ROW_ASPECT`.

use crate::domain::sky::{Star, StarId};

pub const HUD_ROW: usize = 0;
pub const FIELD_TOP: usize = 2;
/// Rows reserved under the field: gap, message bar, help bar.
pub const FOOTER_ROWS: usize = 3;

const ROW_ASPECT: f32 = 2.0;
/// Click tolerance around a star glyph, in aspect-corrected columns.
const HIT_RADIUS: f32 = 2.5;

/// Play-field rectangle in terminal cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Field {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl Field {
    /// Field for a terminal of `cols` x `rows`.
    pub fn for_terminal(cols: usize, rows: usize) -> Field {
        let height = rows.saturating_sub(FIELD_TOP + FOOTER_ROWS).max(1);
        Field { left: 1, top: FIELD_TOP, width: cols.saturating_sub(2).max(1), height }
    }

    /// Cell holding the point at (`x`, `y`) percent.
    pub fn cell_at(&self, x: f32, y: f32) -> (usize, usize) {
        let fx = (x.clamp(0.0, 100.0) / 100.0) * (self.width - 1) as f32;
        let fy = (y.clamp(0.0, 100.0) / 100.0) * (self.height - 1) as f32;
        (self.left + fx.round() as usize, self.top + fy.round() as usize)
    }

    pub fn star_cell(&self, star: &Star) -> (usize, usize) {
        self.cell_at(star.x, star.y)
    }

    /// Star nearest to a click, if one lies within the hit radius.
    ///
    /// Stars drawn on the same cell form a stack. A click picks the lowest
    /// id in the stack, unless `last` (the previous pick) is in it, in which
    /// case the next id up is picked, wrapping around.
    pub fn hit_test(&self, stars: &[Star], col: usize, row: usize, last: Option<StarId>) -> Option<StarId> {
        let mut best: Option<(f32, (usize, usize))> = None;
        for star in stars {
            let cell = self.star_cell(star);
            let d = self.cell_distance(cell, (col, row));
            if d > HIT_RADIUS {
                continue;
            }
            match best {
                Some((bd, _)) if bd <= d => {}
                _ => best = Some((d, cell)),
            }
        }
        let (_, cell) = best?;

        let mut stack: Vec<StarId> = stars
            .iter()
            .filter(|s| self.star_cell(s) == cell)
            .map(|s| s.id)
            .collect();
        stack.sort();
        let next = last
            .and_then(|l| stack.iter().position(|&id| id == l))
            .map_or(0, |i| (i + 1) % stack.len());
        stack.get(next).copied()
    }

    fn cell_distance(&self, a: (usize, usize), b: (usize, usize)) -> f32 {
        let dc = a.0 as f32 - b.0 as f32;
        let dr = (a.1 as f32 - b.1 as f32) * ROW_ASPECT;
        (dc * dc + dr * dr).sqrt()
    }
}

// ── Line rasterising ──

/// Cells strictly between `a` and `b` on a straight line.
pub fn line_cells(a: (usize, usize), b: (usize, usize)) -> Vec<(usize, usize)> {
    let (x0, y0) = (a.0 as i64, a.1 as i64);
    let (x1, y1) = (b.0 as i64, b.1 as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut out = Vec::with_capacity(dx.max(-dy) as usize);
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;
    loop {
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if x == x1 && y == y1 {
            break;
        }
        out.push((x as usize, y as usize));
    }
    out
}

/// Glyph approximating the slope of a segment.
pub fn line_glyph(a: (usize, usize), b: (usize, usize)) -> char {
    let dx = b.0 as f32 - a.0 as f32;
    let dy = (b.1 as f32 - a.1 as f32) * ROW_ASPECT;
    if dy.abs() < dx.abs() * 0.4 {
        '─'
    } else if dx.abs() < dy.abs() * 0.4 {
        '│'
    } else if (dx > 0.0) == (dy > 0.0) {
        '╲'
    } else {
        '╱'
    }
}

// ── Cursor navigation ──

/// One cursor step from keyboard or gamepad.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Nav {
    Up,
    Down,
    Left,
    Right,
    Next,
    Prev,
}

/// Move the star cursor. Directional steps pick the closest star lying in
/// that direction (within 45 degrees first, any forward star otherwise).
/// With no current cursor, the first star is chosen.
pub fn step_cursor(stars: &[Star], current: Option<StarId>, nav: Nav) -> Option<StarId> {
    if stars.is_empty() {
        return None;
    }
    let cur = match current.and_then(|id| stars.iter().position(|s| s.id == id)) {
        Some(i) => i,
        None => return Some(stars[0].id),
    };
    let n = stars.len();
    let (ux, uy) = match nav {
        Nav::Next => return Some(stars[(cur + 1) % n].id),
        Nav::Prev => return Some(stars[(cur + n - 1) % n].id),
        Nav::Up => (0.0, -1.0),
        Nav::Down => (0.0, 1.0),
        Nav::Left => (-1.0, 0.0),
        Nav::Right => (1.0, 0.0),
    };

    let origin = &stars[cur];
    let mut cone: Option<(f32, StarId)> = None;
    let mut forward: Option<(f32, StarId)> = None;
    for s in stars {
        if s.id == origin.id {
            continue;
        }
        let dx = s.x - origin.x;
        let dy = s.y - origin.y;
        let along = dx * ux + dy * uy;
        if along <= 0.0 {
            continue;
        }
        let across = (dx * uy - dy * ux).abs();
        let dist = (dx * dx + dy * dy).sqrt();
        let slot = if across <= along { &mut cone } else { &mut forward };
        if slot.map_or(true, |(d, _)| dist < d) {
            *slot = Some((dist, s.id));
        }
    }
    cone.or(forward).map(|(_, id)| id).or(current)
}

/// Countdown as m:ss.
pub fn format_time(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(i: usize, x: f32, y: f32) -> Star {
        Star { id: StarId(i), x, y }
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(120), "2:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(9), "0:09");
        assert_eq!(format_time(0), "0:00");
    }

    #[test]
    fn field_corners_map_inside() {
        let f = Field::for_terminal(80, 24);
        assert_eq!(f, Field { left: 1, top: 2, width: 78, height: 19 });
        assert_eq!(f.cell_at(0.0, 0.0), (1, 2));
        assert_eq!(f.cell_at(100.0, 100.0), (78, 20));
    }

    #[test]
    fn tiny_terminal_does_not_underflow() {
        let f = Field::for_terminal(1, 2);
        assert_eq!(f.cell_at(100.0, 100.0), (f.left, f.top));
    }

    #[test]
    fn hit_test_picks_nearest_within_radius() {
        let f = Field::for_terminal(102, 105);
        let stars = vec![star(0, 10.0, 10.0), star(1, 12.0, 10.0), star(2, 80.0, 80.0)];
        let (c, r) = f.star_cell(&stars[1]);
        assert_eq!(f.hit_test(&stars, c, r, None), Some(StarId(1)));
        assert_eq!(f.hit_test(&stars, c + 1, r, None), Some(StarId(1)));
        assert_eq!(f.hit_test(&stars, 50, 50, None), None);
        // A single star is picked again on a repeat click
        assert_eq!(f.hit_test(&stars, c, r, Some(StarId(1))), Some(StarId(1)));
    }

    #[test]
    fn repeat_clicks_cycle_through_stacked_stars() {
        let f = Field::for_terminal(80, 24);
        let stars = vec![star(0, 30.0, 30.0), star(1, 60.0, 60.0), star(2, 30.0, 30.0), star(3, 30.0, 30.0)];
        let (c, r) = f.star_cell(&stars[0]);
        assert_eq!(f.hit_test(&stars, c, r, None), Some(StarId(0)));
        assert_eq!(f.hit_test(&stars, c, r, Some(StarId(0))), Some(StarId(2)));
        assert_eq!(f.hit_test(&stars, c, r, Some(StarId(2))), Some(StarId(3)));
        assert_eq!(f.hit_test(&stars, c, r, Some(StarId(3))), Some(StarId(0)));
        // A previous pick outside the stack does not shift the choice
        assert_eq!(f.hit_test(&stars, c, r, Some(StarId(1))), Some(StarId(0)));
    }

    #[test]
    fn line_excludes_endpoints() {
        assert_eq!(line_cells((0, 0), (4, 0)), vec![(1, 0), (2, 0), (3, 0)]);
        assert_eq!(line_cells((2, 2), (2, 5)), vec![(2, 3), (2, 4)]);
        assert_eq!(line_cells((0, 0), (3, 3)), vec![(1, 1), (2, 2)]);
        assert!(line_cells((1, 1), (2, 2)).is_empty());
        assert!(line_cells((3, 3), (3, 3)).is_empty());
    }

    #[test]
    fn glyph_follows_slope() {
        assert_eq!(line_glyph((0, 0), (10, 0)), '─');
        assert_eq!(line_glyph((0, 0), (0, 5)), '│');
        assert_eq!(line_glyph((0, 0), (4, 2)), '╲');
        assert_eq!(line_glyph((0, 2), (4, 0)), '╱');
    }

    #[test]
    fn cursor_moves_toward_direction() {
        let stars = vec![star(0, 50.0, 50.0), star(1, 70.0, 52.0), star(2, 50.0, 20.0), star(3, 20.0, 50.0)];
        assert_eq!(step_cursor(&stars, None, Nav::Right), Some(StarId(0)));
        assert_eq!(step_cursor(&stars, Some(StarId(0)), Nav::Right), Some(StarId(1)));
        assert_eq!(step_cursor(&stars, Some(StarId(0)), Nav::Up), Some(StarId(2)));
        assert_eq!(step_cursor(&stars, Some(StarId(0)), Nav::Left), Some(StarId(3)));
        // Nothing further right: stay put
        assert_eq!(step_cursor(&stars, Some(StarId(1)), Nav::Right), Some(StarId(1)));
        assert_eq!(step_cursor(&stars, Some(StarId(3)), Nav::Next), Some(StarId(0)));
        assert_eq!(step_cursor(&stars, Some(StarId(0)), Nav::Prev), Some(StarId(3)));
        assert_eq!(step_cursor(&[], Some(StarId(0)), Nav::Next), None);
    }
}
