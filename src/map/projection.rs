use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 400.0;
const ZOOM_STEP: f64 = 1.5;

/// Web Mercator y in [0, 1] (0 = north edge)
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level: the whole world spans `zoom * width` pixels
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    pub fn set_center(&mut self, lat: f64, lon: f64) {
        self.center_lat = lat.clamp(-85.0, 85.0);
        self.center_lon = lon;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Center on a lon/lat bounding box and zoom so it fits with a small margin
    pub fn fit_bounds(&mut self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) {
        let top = mercator_y(max_lat);
        let bottom = mercator_y(min_lat);
        self.center_lon = (min_lon + max_lon) / 2.0;
        self.center_lat = inverse_mercator_y((top + bottom) / 2.0);

        if self.width == 0 || self.height == 0 {
            return;
        }

        let span_x = ((max_lon - min_lon) / 360.0).max(1e-9);
        let span_y = (bottom - top).max(1e-9);
        let zoom_x = 1.0 / span_x;
        let zoom_y = self.height as f64 / (span_y * self.width as f64);
        self.set_zoom(zoom_x.min(zoom_y) * 0.9);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.zoom * self.width.max(1) as f64;
        let x = (self.center_lon + 180.0) / 360.0 + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;

        self.center_lon = x * 360.0 - 180.0;
        self.center_lat = inverse_mercator_y(y).clamp(-85.0, 85.0);

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor keeping the geographic point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.set_zoom(self.zoom * factor);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px - self.width as f64 / 2.0) / scale + center_x;
        let y = (py - self.height as f64 / 2.0) / scale + center_y;

        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = self.project_f(lon, lat);
        (x.floor() as i32, y.floor() as i32)
    }

    /// Sub-pixel projection used for polygon fills
    pub fn project_f(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let scale = self.zoom * self.width.max(1) as f64;

        (
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(-7.09, 31.79, 18.0, 160, 120);
        let (x, y) = vp.project_f(-5.5, 34.0);
        let (lon, lat) = vp.unproject_f(x, y);
        assert_abs_diff_eq!(lon, -5.5, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, 34.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut vp = Viewport::new(0.0, 0.0, 4.0, 200, 100);
        let before = vp.unproject(40, 30);
        vp.zoom_in_at(40, 30);
        let after = vp.unproject(40, 30);
        assert_abs_diff_eq!(before.0, after.0, epsilon = 0.5);
        assert_abs_diff_eq!(before.1, after.1, epsilon = 0.5);
        assert!(vp.zoom > 4.0);
    }

    #[test]
    fn test_fit_bounds_contains_box() {
        let mut vp = Viewport::world(160, 120);
        vp.fit_bounds(-17.1, 20.8, -1.0, 35.9);
        for (lon, lat) in [(-17.1, 20.8), (-1.0, 35.9), (-17.1, 35.9), (-1.0, 20.8)] {
            let (x, y) = vp.project(lon, lat);
            assert!((0..160).contains(&x) && (0..120).contains(&y), "({lon}, {lat}) -> ({x}, {y})");
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = Viewport::world(100, 100);
        vp.set_zoom(1e6);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.set_zoom(0.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
