use crate::data::JoinedDataset;
use crate::map::{OutlineOverrides, Rgb};
use ratatui::layout::{Position, Rect};

/// Bar color for regions listed in the outline overrides
pub const HIGHLIGHT: Rgb = Rgb::RED;

/// The chart views selectable from the button row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    /// Accidents per region, most populated first
    AccidentsByPopulation,
    VictimsByRegion,
    /// Accidents per 100k inhabitants
    AccidentRate,
}

/// One bar of a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBar {
    pub label: String,
    pub value: u64,
    pub highlighted: bool,
}

impl ChartView {
    pub const ALL: [ChartView; 3] = [
        ChartView::AccidentsByPopulation,
        ChartView::VictimsByRegion,
        ChartView::AccidentRate,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartView::AccidentsByPopulation => "Accidents by Region (sorted by population)",
            ChartView::VictimsByRegion => "Victims by Region",
            ChartView::AccidentRate => "Accidents per 100k Inhabitants",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            ChartView::AccidentsByPopulation => "Accidents",
            ChartView::VictimsByRegion => "Victims",
            ChartView::AccidentRate => "Rate",
        }
    }

    pub fn base_color(self) -> Rgb {
        match self {
            ChartView::AccidentsByPopulation => Rgb(0xFF, 0xCC, 0x00),
            ChartView::VictimsByRegion => Rgb(0xFF, 0x65, 0x00),
            ChartView::AccidentRate => Rgb(0x68, 0x95, 0xD2),
        }
    }

    /// Legend entries describing the bar colors
    pub fn legend(self) -> [(&'static str, Rgb); 2] {
        [("Highlighted region", HIGHLIGHT), ("Other region", self.base_color())]
    }

    /// Bars for this view; regions missing a needed statistic are left out
    pub fn bars(self, dataset: &JoinedDataset, highlighted: &OutlineOverrides) -> Vec<ChartBar> {
        let mut rows: Vec<(u64, ChartBar)> = dataset
            .iter()
            .filter_map(|region| {
                let (sort_key, value) = match self {
                    ChartView::AccidentsByPopulation => (region.population?, region.accidents?),
                    ChartView::VictimsByRegion => {
                        let victims = region.victims?;
                        (victims, victims)
                    }
                    ChartView::AccidentRate => {
                        let population = region.population.filter(|&p| p > 0)?;
                        let rate = (region.accidents? as f64 * 100_000.0 / population as f64)
                            .round() as u64;
                        (rate, rate)
                    }
                };
                Some((
                    sort_key,
                    ChartBar {
                        label: region.name.clone(),
                        value,
                        highlighted: highlighted.contains_key(&region.name),
                    },
                ))
            })
            .collect();

        // stable: ties keep dataset order
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, bar)| bar).collect()
    }
}

/// Shows a chart's legend only while the pointer is over its plot area.
/// Attach once per chart panel and feed it every pointer move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegendToggle {
    area: Option<Rect>,
    visible: bool,
}

impl LegendToggle {
    /// Set the plot area that counts as "hovered"
    pub fn attach(&mut self, area: Rect) {
        self.area = Some(area);
    }

    /// Update visibility for a pointer at terminal (col, row); returns true on change
    pub fn on_pointer(&mut self, col: u16, row: u16) -> bool {
        let inside = self
            .area
            .is_some_and(|area| area.contains(Position::new(col, row)));
        let changed = inside != self.visible;
        self.visible = inside;
        changed
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::boundaries;
    use crate::data::{StatsRow, StatsTable};

    const THREE_REGIONS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"region": "Small"}, "geometry": null},
        {"type": "Feature", "properties": {"region": "Big"}, "geometry": null},
        {"type": "Feature", "properties": {"region": "Unknown"}, "geometry": null}
    ]}"#;

    fn dataset() -> JoinedDataset {
        let stats = StatsTable::new(vec![
            StatsRow::new("Small", 100_000, 50, 5),
            StatsRow::new("Big", 1_000_000, 200, 40),
        ]);
        JoinedDataset::join(boundaries(THREE_REGIONS), &stats)
    }

    #[test]
    fn test_accidents_sorted_by_population() {
        let highlighted: OutlineOverrides = [("Big".to_string(), Rgb::RED)].into_iter().collect();
        let bars = ChartView::AccidentsByPopulation.bars(&dataset(), &highlighted);
        assert_eq!(
            bars,
            vec![
                ChartBar { label: "Big".into(), value: 200, highlighted: true },
                ChartBar { label: "Small".into(), value: 50, highlighted: false },
            ]
        );
    }

    #[test]
    fn test_rate_per_100k() {
        let bars = ChartView::AccidentRate.bars(&dataset(), &OutlineOverrides::new());
        let values: Vec<(&str, u64)> = bars.iter().map(|b| (b.label.as_str(), b.value)).collect();
        assert_eq!(values, vec![("Small", 50), ("Big", 20)]);
    }

    #[test]
    fn test_null_regions_left_out() {
        let bars = ChartView::VictimsByRegion.bars(&dataset(), &OutlineOverrides::new());
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.label != "Unknown"));
    }

    #[test]
    fn test_legend_toggle_follows_pointer() {
        let mut toggle = LegendToggle::default();
        // unattached: never visible
        assert!(!toggle.on_pointer(5, 5));
        assert!(!toggle.is_visible());

        toggle.attach(Rect::new(10, 10, 20, 5));
        assert!(toggle.on_pointer(12, 11));
        assert!(toggle.is_visible());
        assert!(!toggle.on_pointer(13, 12));
        assert!(toggle.on_pointer(30, 11));
        assert!(!toggle.is_visible());
    }
}
