use crate::charts::{ChartView, LegendToggle};
use crate::config::AppConfig;
use crate::data::JoinedDataset;
use crate::live_map::{LiveMapWindow, WindowStatus};
use crate::map::{
    Choropleth, ColorRamp, HoverResolver, MapSurface, OutlineOverrides, RegionSummary, TerminalMap,
};
use crate::ui::DashboardLayout;
use anyhow::Result;
use ratatui::layout::{Position, Rect};
use tracing::{debug, info, warn};

/// A clickable entry in the button row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Chart(ChartView),
    LiveMap,
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::Chart(view) => view.button_label(),
            Button::LiveMap => "Live traffic",
        }
    }
}

/// Button row, left to right
pub const BUTTONS: [Button; 4] = [
    Button::Chart(ChartView::AccidentsByPopulation),
    Button::Chart(ChartView::VictimsByRegion),
    Button::Chart(ChartView::AccidentRate),
    Button::LiveMap,
];

/// Application state
pub struct App {
    pub config: AppConfig,
    pub dataset: JoinedDataset,
    /// Regions highlighted with a custom outline (and red chart bars)
    pub overrides: OutlineOverrides,
    pub map: TerminalMap,
    pub layout: DashboardLayout,
    pub chart_view: ChartView,
    pub chart_legend: LegendToggle,
    /// Region under the pointer and the terminal cell it was resolved at
    pub hover: Option<(RegionSummary, (u16, u16))>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    pub live_map: LiveMapWindow,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig, dataset: JoinedDataset, width: u16, height: u16) -> Result<Self> {
        let overrides = config.map.outline_overrides()?;
        let live_map = LiveMapWindow::from_config(&config.live_map);

        let mut app = Self {
            config,
            dataset,
            overrides,
            map: TerminalMap::new(0, 0),
            layout: DashboardLayout::default(),
            chart_view: ChartView::AccidentsByPopulation,
            chart_legend: LegendToggle::default(),
            hover: None,
            mouse_pos: None,
            last_mouse: None,
            live_map,
            status_message: None,
            should_quit: false,
        };
        app.resize(width, height);
        app.setup_map();
        Ok(app)
    }

    /// Swap the live map window (tests use a fake launcher)
    pub fn with_live_map(mut self, live_map: LiveMapWindow) -> Self {
        self.live_map = live_map;
        self
    }

    fn setup_map(&mut self) {
        self.map.set_tile_source(&self.config.map.tile_source);
        self.reset_view();

        let choropleth = Choropleth::new(
            &self.dataset,
            self.config.map.color_ramp,
            &self.overrides,
            self.config.map.border_width,
        );
        let drawn = choropleth.render(&mut self.map);
        info!(drawn, regions = self.dataset.len(), "choropleth ready");
    }

    /// Back to the configured center/zoom, or fit the data when no zoom is set
    pub fn reset_view(&mut self) {
        let map_config = &self.config.map;
        match (map_config.zoom, self.dataset.bounds()) {
            (None, Some(bounds)) => {
                self.map
                    .viewport
                    .fit_bounds(bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y);
            }
            (zoom, _) => {
                self.map.set_center(map_config.center_lat, map_config.center_lon);
                self.map.set_zoom(zoom.unwrap_or(1.0));
            }
        }
        self.hover = None;
    }

    pub fn color_ramp(&self) -> ColorRamp {
        self.config.map.color_ramp
    }

    /// Recompute the layout for a new terminal size
    pub fn resize(&mut self, width: u16, height: u16) {
        self.layout = DashboardLayout::new(Rect::new(0, 0, width, height));
        let inner = self.layout.map_inner;
        // Braille gives 2x4 resolution per character
        self.map.resize(inner.width as usize * 2, inner.height as usize * 4);
        self.chart_legend.attach(self.layout.chart_plot);
        self.chart_legend.hide();
        self.hover = None;
    }

    /// Braille pixel at the center of a terminal cell, if the cell is on the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.layout.map_inner;
        if !inner.contains(Position::new(col, row)) {
            return None;
        }
        let px = (col - inner.x) as i32 * 2 + 1;
        let py = (row - inner.y) as i32 * 4 + 2;
        Some((px, py))
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.viewport.pan(dx, dy);
        self.refresh_hover();
    }

    pub fn zoom_in(&mut self) {
        self.map.viewport.zoom_in();
        self.refresh_hover();
    }

    pub fn zoom_out(&mut self) {
        self.map.viewport.zoom_out();
        self.refresh_hover();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.map.viewport.zoom_in_at(px, py);
            self.refresh_hover();
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.map.viewport.zoom_out_at(px, py);
            self.refresh_hover();
        }
    }

    /// Track the pointer: cursor marker, hover popup and chart legend
    pub fn on_mouse_move(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.chart_legend.on_pointer(col, row);
        self.refresh_hover();
    }

    fn refresh_hover(&mut self) {
        let Some((col, row)) = self.mouse_pos else {
            self.hover = None;
            return;
        };
        self.hover = self.map_pixel(col, row).and_then(|(px, py)| {
            HoverResolver::new(&self.dataset)
                .resolve(&self.map, px, py)
                .map(|summary| (summary, (col, row)))
        });
    }

    /// Left click; returns true if it landed on a button
    pub fn click(&mut self, col: u16, row: u16) -> bool {
        let pos = Position::new(col, row);
        let hit = BUTTONS
            .iter()
            .zip(self.layout.buttons)
            .find(|(_, area)| area.contains(pos))
            .map(|(button, _)| *button);

        match hit {
            Some(button) => {
                self.press(button);
                true
            }
            None => false,
        }
    }

    pub fn press(&mut self, button: Button) {
        match button {
            Button::Chart(view) => self.select_chart(view),
            Button::LiveMap => self.open_live_map(),
        }
    }

    pub fn select_chart(&mut self, view: ChartView) {
        if self.chart_view != view {
            debug!(chart = view.title(), "chart selected");
        }
        self.chart_view = view;
    }

    pub fn open_live_map(&mut self) {
        let message = match self.live_map.open_or_activate() {
            Ok(WindowStatus::Opened) => format!("Opened {}", self.live_map.url()),
            Ok(WindowStatus::AlreadyOpen) => "Live traffic map already open".to_string(),
            Err(err) => {
                warn!(error = %err, "could not open live traffic map");
                format!("Could not open live traffic map: {err}")
            }
        };
        self.status_message = Some(message);
    }

    /// Start a drag if the press landed on the map
    pub fn start_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = self.map_pixel(col, row).map(|_| (col, row));
    }

    /// Pan so the map follows the pointer
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            self.last_mouse = Some((col, row));
            self.pan(dx, dy);
        }
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Per-frame housekeeping after input is handled
    pub fn tick(&mut self) {
        self.live_map.refresh();
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.map.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let viewport = &self.map.viewport;
        format!(
            "{:.2}°{}, {:.2}°{}",
            viewport.center_lat.abs(),
            if viewport.center_lat >= 0.0 { "N" } else { "S" },
            viewport.center_lon.abs(),
            if viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::scenario_dataset;
    use crate::error::LaunchError;
    use crate::live_map::{Launcher, WindowHandle};

    struct OpenWindow;

    impl WindowHandle for OpenWindow {
        fn is_open(&mut self) -> bool {
            true
        }
    }

    struct StubLauncher;

    impl Launcher for StubLauncher {
        fn launch(&self, _url: &str) -> Result<Box<dyn WindowHandle>, LaunchError> {
            Ok(Box::new(OpenWindow))
        }
    }

    fn app() -> App {
        App::new(AppConfig::default(), scenario_dataset(), 120, 40)
            .unwrap()
            .with_live_map(LiveMapWindow::new("https://example.test/map", Box::new(StubLauncher)))
    }

    /// Terminal cell showing a (lon, lat) point
    fn cell_at(app: &App, lon: f64, lat: f64) -> (u16, u16) {
        let (px, py) = app.map.viewport.project(lon, lat);
        let inner = app.layout.map_inner;
        (inner.x + (px / 2) as u16, inner.y + (py / 4) as u16)
    }

    #[test]
    fn test_choropleth_drawn_at_startup() {
        let app = app();
        // B has no accident count, so only A is drawn
        assert_eq!(app.map.polygons().len(), 1);
        assert!(app.map.tile_source().is_some());
    }

    #[test]
    fn test_hover_resolves_regions() {
        let mut app = app();

        let (col, row) = cell_at(&app, 0.5, 0.5);
        app.on_mouse_move(col, row);
        let (summary, at) = app.hover.clone().unwrap();
        assert_eq!(summary.name, "A");
        assert_eq!(summary.accidents, Some(10));
        assert_eq!(at, (col, row));

        let (col, row) = cell_at(&app, 2.5, 0.5);
        app.on_mouse_move(col, row);
        assert_eq!(app.hover.as_ref().unwrap().0.population, None);

        // the gap between the squares
        let (col, row) = cell_at(&app, 1.5, 0.5);
        app.on_mouse_move(col, row);
        assert!(app.hover.is_none());

        // off the map entirely
        app.on_mouse_move(0, 0);
        assert!(app.hover.is_none());
    }

    #[test]
    fn test_button_clicks() {
        let mut app = app();
        let victims = app.layout.buttons[1];
        assert!(app.click(victims.x + 1, victims.y + 1));
        assert_eq!(app.chart_view, ChartView::VictimsByRegion);

        let live = app.layout.buttons[3];
        assert!(app.click(live.x + 1, live.y + 1));
        assert_eq!(app.status_message.as_deref(), Some("Opened https://example.test/map"));
        app.press(Button::LiveMap);
        assert_eq!(app.status_message.as_deref(), Some("Live traffic map already open"));

        let map = app.layout.map_inner;
        assert!(!app.click(map.x + 1, map.y + 1));
    }

    #[test]
    fn test_chart_legend_follows_pointer() {
        let mut app = app();
        let plot = app.layout.chart_plot;
        app.on_mouse_move(plot.x + 2, plot.y + 2);
        assert!(app.chart_legend.is_visible());
        let map = app.layout.map_inner;
        app.on_mouse_move(map.x + 2, map.y + 2);
        assert!(!app.chart_legend.is_visible());
    }

    #[test]
    fn test_resize_hides_chart_legend() {
        let mut app = app();
        let plot = app.layout.chart_plot;
        app.on_mouse_move(plot.x + 2, plot.y + 2);
        assert!(app.chart_legend.is_visible());
        app.resize(100, 30);
        assert!(!app.chart_legend.is_visible());
        assert!(app.hover.is_none());
    }

    #[test]
    fn test_drag_outside_map_does_not_pan() {
        let mut app = app();
        let before = (app.map.viewport.center_lon, app.map.viewport.center_lat);
        app.start_drag(0, 0);
        app.handle_drag(5, 5);
        assert_eq!((app.map.viewport.center_lon, app.map.viewport.center_lat), before);

        let map = app.layout.map_inner;
        app.start_drag(map.x + 10, map.y + 10);
        app.handle_drag(map.x + 5, map.y + 10);
        assert!(app.map.viewport.center_lon > before.0);
        app.end_drag();
        assert!(app.last_mouse.is_none());
    }

    #[test]
    fn test_configured_zoom_overrides_fit() {
        let mut config = AppConfig::default();
        config.map.zoom = Some(4.0);
        let app = App::new(config, scenario_dataset(), 120, 40).unwrap();
        assert_eq!(app.map.viewport.zoom, 4.0);
        assert_eq!(app.zoom_level(), "4.0x");
        assert_eq!(app.center_coords(), "31.79°N, 7.09°W");
    }
}
