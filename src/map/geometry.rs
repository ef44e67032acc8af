use crate::braille::BrailleCanvas;
use crate::map::Rgb;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (heavy region outlines)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Fill the cells whose centers fall inside a closed ring (even-odd rule).
/// `ring` is in braille pixel space; one scanline per character row.
pub fn fill_polygon(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], color: Rgb) {
    if ring.len() < 3 {
        return;
    }

    let (min_y, max_y) = ring
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));

    let first_row = ((min_y - 2.0) / 4.0).ceil().max(0.0) as usize;
    let last_row = (((max_y - 2.0) / 4.0).floor().max(-1.0) + 1.0) as usize;
    let last_row = last_row.min(canvas.height());

    let mut crossings: Vec<f64> = Vec::new();

    for cy in first_row..last_row {
        let y = cy as f64 * 4.0 + 2.0;
        crossings.clear();

        for i in 0..ring.len() {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % ring.len()];
            if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = ((span[0] - 1.0) / 2.0).ceil().max(0.0) as usize;
            let end = ((span[1] - 1.0) / 2.0).ceil().max(0.0) as usize;
            for cx in start..end.min(canvas.width()) {
                canvas.fill_cell(cx, cy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(6, 4);
        let ring = [(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0), (0.0, 0.0)];
        fill_polygon(&mut canvas, &ring, Rgb::RED);

        for cy in 0..4 {
            for cx in 0..6 {
                let filled = canvas.cell(cx, cy).unwrap().bg == Some(Rgb::RED);
                assert_eq!(filled, cx < 4 && cy < 2, "cell ({cx}, {cy})");
            }
        }
    }

    #[test]
    fn test_fill_clips_offscreen() {
        let mut canvas = BrailleCanvas::new(2, 2);
        let ring = [(-50.0, -50.0), (50.0, -50.0), (50.0, 50.0), (-50.0, 50.0)];
        fill_polygon(&mut canvas, &ring, Rgb::WHITE);
        assert!(canvas.rows().flatten().all(|c| c.bg == Some(Rgb::WHITE)));
    }

    #[test]
    fn test_degenerate_ring_fills_nothing() {
        let mut canvas = BrailleCanvas::new(2, 2);
        fill_polygon(&mut canvas, &[(0.0, 0.0), (4.0, 4.0)], Rgb::WHITE);
        assert!(canvas.rows().flatten().all(|c| c.bg.is_none()));
    }
}
