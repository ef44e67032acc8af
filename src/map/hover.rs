use crate::data::{JoinedDataset, Region};
use crate::map::surface::MapSurface;
use geo::{Contains, Point};
use std::fmt;

/// Attributes of the region under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSummary {
    pub name: String,
    pub population: Option<u64>,
    pub accidents: Option<u64>,
    pub victims: Option<u64>,
}

impl RegionSummary {
    fn from_region(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            population: region.population,
            accidents: region.accidents,
            victims: region.victims,
        }
    }

    pub fn lines(&self) -> [String; 4] {
        [
            format!("Region: {}", self.name),
            format!("Population: {}", Known(self.population)),
            format!("Accidents: {}", Known(self.accidents)),
            format!("Victims: {}", Known(self.victims)),
        ]
    }
}

impl fmt::Display for RegionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Display text for a statistic that may be unknown
pub fn stat_text(value: Option<u64>) -> String {
    Known(value).to_string()
}

/// Null statistics print as "unknown", never as zero
struct Known(Option<u64>);

impl fmt::Display for Known {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("unknown"),
        }
    }
}

/// Point-in-polygon lookup over the joined dataset.
/// Linear scan in dataset order; the first containing region wins.
pub struct HoverResolver<'a> {
    dataset: &'a JoinedDataset,
}

impl<'a> HoverResolver<'a> {
    pub fn new(dataset: &'a JoinedDataset) -> Self {
        Self { dataset }
    }

    /// Resolve a surface pixel through the surface's current pan/zoom
    pub fn resolve<S: MapSurface>(&self, surface: &S, x: i32, y: i32) -> Option<RegionSummary> {
        let (lat, lon) = surface.pixel_to_lat_lon(x, y);
        self.resolve_lat_lon(lat, lon)
    }

    pub fn resolve_lat_lon(&self, lat: f64, lon: f64) -> Option<RegionSummary> {
        let point = Point::new(lon, lat);
        self.dataset
            .iter()
            .find(|region| !region.boundaries.0.is_empty() && region.boundaries.contains(&point))
            .map(RegionSummary::from_region)
    }
}
