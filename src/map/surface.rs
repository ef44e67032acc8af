use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, draw_thick_line, fill_polygon};
use crate::map::projection::Viewport;
use crate::map::Rgb;

/// Drawing and coordinate capabilities the choropleth needs from a map widget.
/// Points passed to `draw_polygon` are `(lat, lon)` pairs.
pub trait MapSurface {
    fn set_tile_source(&mut self, url: &str);
    fn set_center(&mut self, lat: f64, lon: f64);
    fn set_zoom(&mut self, level: f64);
    fn draw_polygon(&mut self, points: &[(f64, f64)], fill: Rgb, outline: Rgb, border_width: f64);
    /// Convert a surface pixel to `(lat, lon)` under the current pan/zoom
    fn pixel_to_lat_lon(&self, x: i32, y: i32) -> (f64, f64);
}

/// A polygon retained by the surface, re-projected on every frame
#[derive(Debug, Clone, PartialEq)]
pub struct MapPolygon {
    /// (lat, lon)
    pub points: Vec<(f64, f64)>,
    pub fill: Rgb,
    pub outline: Rgb,
    pub border_width: f64,
}

/// Terminal map widget state: a Web Mercator viewport over braille cells.
/// The tile source is attribution only; no tiles are fetched.
#[derive(Debug, Clone)]
pub struct TerminalMap {
    pub viewport: Viewport,
    tile_source: Option<String>,
    polygons: Vec<MapPolygon>,
}

impl TerminalMap {
    /// `width`/`height` are in braille pixels (2x4 per character cell)
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            viewport: Viewport::world(width, height),
            tile_source: None,
            polygons: Vec::new(),
        }
    }

    pub fn tile_source(&self) -> Option<&str> {
        self.tile_source.as_deref()
    }

    pub fn polygons(&self) -> &[MapPolygon] {
        &self.polygons
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Rasterize all retained polygons for a `cols` x `rows` character area.
    /// Fills go down first so every outline stays visible.
    pub fn rasterize(&self, cols: usize, rows: usize) -> BrailleCanvas {
        let mut canvas = BrailleCanvas::new(cols, rows);
        let mut viewport = self.viewport.clone();
        viewport.width = cols * 2;
        viewport.height = rows * 4;

        let projected: Vec<Vec<(f64, f64)>> = self
            .polygons
            .iter()
            .map(|poly| {
                poly.points
                    .iter()
                    .map(|&(lat, lon)| viewport.project_f(lon, lat))
                    .collect()
            })
            .collect();

        for (poly, ring) in self.polygons.iter().zip(&projected) {
            if ring_might_be_visible(ring, &viewport) {
                fill_polygon(&mut canvas, ring, poly.fill);
            }
        }

        for (poly, ring) in self.polygons.iter().zip(&projected) {
            if !ring_might_be_visible(ring, &viewport) {
                continue;
            }
            canvas.set_pen(poly.outline);
            draw_ring(&mut canvas, ring, &viewport, poly.border_width >= 1.5);
        }

        canvas
    }
}

impl MapSurface for TerminalMap {
    fn set_tile_source(&mut self, url: &str) {
        self.tile_source = Some(url.to_string());
    }

    fn set_center(&mut self, lat: f64, lon: f64) {
        self.viewport.set_center(lat, lon);
    }

    fn set_zoom(&mut self, level: f64) {
        self.viewport.set_zoom(level);
    }

    fn draw_polygon(&mut self, points: &[(f64, f64)], fill: Rgb, outline: Rgb, border_width: f64) {
        self.polygons.push(MapPolygon {
            points: points.to_vec(),
            fill,
            outline,
            border_width,
        });
    }

    fn pixel_to_lat_lon(&self, x: i32, y: i32) -> (f64, f64) {
        let (lon, lat) = self.viewport.unproject(x, y);
        (lat, lon)
    }
}

fn ring_might_be_visible(ring: &[(f64, f64)], viewport: &Viewport) -> bool {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in ring {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    max_x >= 0.0 && min_x < viewport.width as f64 && max_y >= 0.0 && min_y < viewport.height as f64
}

/// Draw a closed ring with per-segment viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], viewport: &Viewport, thick: bool) {
    if ring.len() < 2 {
        return;
    }

    let to_px = |&(x, y): &(f64, f64)| (x.floor() as i32, y.floor() as i32);
    let mut prev = to_px(&ring[ring.len() - 1]);

    for point in ring {
        let (px, py) = to_px(point);
        if viewport.line_might_be_visible(prev, (px, py)) {
            if thick {
                draw_thick_line(canvas, prev.0, prev.1, px, py);
            } else {
                draw_line(canvas, prev.0, prev.1, px, py);
            }
        }
        prev = (px, py);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_map() -> TerminalMap {
        let mut map = TerminalMap::new(40, 40);
        map.set_center(0.0, 0.0);
        map.set_zoom(36.0);
        map
    }

    #[test]
    fn test_surface_state() {
        let mut map = square_map();
        map.set_tile_source("https://a.tile.openstreetmap.org/{z}/{x}/{y}.png");
        assert_eq!(map.tile_source(), Some("https://a.tile.openstreetmap.org/{z}/{x}/{y}.png"));
        assert_eq!(map.viewport.zoom, 36.0);

        let (lat, lon) = map.pixel_to_lat_lon(20, 20);
        assert!(lat.abs() < 1e-9 && lon.abs() < 1e-9);
    }

    #[test]
    fn test_rasterize_fills_and_outlines() {
        let mut map = square_map();
        // (lat, lon) square around the center, about 5 degrees on a side
        let square = [(-2.5, -2.5), (-2.5, 2.5), (2.5, 2.5), (2.5, -2.5), (-2.5, -2.5)];
        map.draw_polygon(&square, Rgb(10, 20, 30), Rgb::BLACK, 0.6);
        assert_eq!(map.polygons().len(), 1);

        let canvas = map.rasterize(20, 10);
        // center cell is filled
        assert_eq!(canvas.cell(10, 5).unwrap().bg, Some(Rgb(10, 20, 30)));
        // far corner is not
        assert_eq!(canvas.cell(0, 0).unwrap().bg, None);
        // some outline dots were drawn in black
        assert!(canvas.rows().flatten().any(|c| c.bits != 0 && c.fg == Some(Rgb::BLACK)));
    }

    #[test]
    fn test_offscreen_polygon_is_culled() {
        let mut map = square_map();
        let far = [(60.0, 100.0), (60.0, 101.0), (61.0, 101.0), (60.0, 100.0)];
        map.draw_polygon(&far, Rgb::WHITE, Rgb::BLACK, 0.6);
        let canvas = map.rasterize(20, 10);
        assert!(canvas.rows().flatten().all(|c| c.bits == 0 && c.bg.is_none()));
    }
}
