use crate::data::{JoinedDataset, Region};
use crate::map::color::{ColorRamp, ColorScale, Rgb};
use crate::map::surface::MapSurface;
use geo::Polygon;
use std::collections::HashMap;
use tracing::debug;

/// Region name -> forced outline color
pub type OutlineOverrides = HashMap<String, Rgb>;

/// Fixed labels under the legend gradient
pub const LEGEND_LABEL: &str = "Low   Accidents   High";

/// Computed style of one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFill {
    pub name: String,
    pub ratio: f64,
    pub fill: Rgb,
    pub outline: Rgb,
}

/// Colors regions by accident count and draws them onto a map surface
pub struct Choropleth<'a> {
    dataset: &'a JoinedDataset,
    ramp: ColorRamp,
    overrides: &'a OutlineOverrides,
    border_width: f64,
}

impl<'a> Choropleth<'a> {
    pub fn new(
        dataset: &'a JoinedDataset,
        ramp: ColorRamp,
        overrides: &'a OutlineOverrides,
        border_width: f64,
    ) -> Self {
        Self {
            dataset,
            ramp,
            overrides,
            border_width,
        }
    }

    pub fn scale(&self) -> Option<ColorScale> {
        ColorScale::from_dataset(self.dataset)
    }

    /// Styles for every region with a known accident count, in dataset order
    pub fn fills(&self) -> Vec<RegionFill> {
        let Some(scale) = self.scale() else {
            return Vec::new();
        };
        self.dataset
            .iter()
            .filter_map(|region| self.style(region, &scale))
            .collect()
    }

    fn style(&self, region: &Region, scale: &ColorScale) -> Option<RegionFill> {
        let accidents = region.accidents?;
        let ratio = scale.ratio(accidents);
        Some(RegionFill {
            name: region.name.clone(),
            ratio,
            fill: self.ramp.color_at(ratio),
            outline: self
                .overrides
                .get(&region.name)
                .copied()
                .unwrap_or(Rgb::BLACK),
        })
    }

    /// Draw every styled region, one `draw_polygon` call per polygon.
    /// Returns the number of polygons drawn.
    pub fn render<S: MapSurface>(&self, surface: &mut S) -> usize {
        let Some(scale) = self.scale() else {
            debug!("no region has an accident count; nothing to draw");
            return 0;
        };

        let mut drawn = 0;
        for region in self.dataset.iter() {
            let Some(style) = self.style(region, &scale) else {
                continue;
            };
            for polygon in region.boundaries.iter() {
                let Some(points) = exterior_lat_lon(polygon) else {
                    debug!(region = %region.name, "skipping degenerate polygon");
                    continue;
                };
                surface.draw_polygon(&points, style.fill, style.outline, self.border_width);
                drawn += 1;
            }
        }
        drawn
    }
}

/// Exterior ring as (lat, lon); `None` when the ring cannot enclose an area
fn exterior_lat_lon(polygon: &Polygon<f64>) -> Option<Vec<(f64, f64)>> {
    let ring = polygon.exterior();
    if ring.0.len() < 4 {
        return None;
    }
    Some(ring.coords().map(|c| (c.y, c.x)).collect())
}

/// Legend gradient colors, `steps` samples at ratio i / steps
pub fn legend_gradient(ramp: ColorRamp, steps: usize) -> Vec<Rgb> {
    (0..steps)
        .map(|i| ramp.color_at(i as f64 / steps as f64))
        .collect()
}
