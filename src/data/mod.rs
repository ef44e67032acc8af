mod stats;

pub use stats::{StatsRow, StatsTable};

use crate::error::{LoadError, SchemaError};
use geo::{BoundingRect, Geometry, MultiPolygon, Polygon, Rect};
use geojson::GeoJson;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Named boundary records read from a GeoJSON FeatureCollection.
/// Features sharing a name are merged; order follows first appearance.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCollection {
    regions: Vec<(String, MultiPolygon<f64>)>,
}

impl BoundaryCollection {
    /// Read and parse a boundary file from disk
    pub fn load(path: &Path, region_field: &str) -> Result<Self, LoadError> {
        let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&mut bytes, region_field)
    }

    /// Parse raw GeoJSON bytes (simd-json mutates the buffer in place)
    pub fn from_slice(bytes: &mut [u8], region_field: &str) -> Result<Self, LoadError> {
        let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;
        Self::from_geojson(geojson, region_field)
    }

    pub fn from_geojson(geojson: GeoJson, region_field: &str) -> Result<Self, LoadError> {
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(SchemaError::NotFeatureCollection.into()),
        };

        let mut regions: Vec<(String, MultiPolygon<f64>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (feature_idx, feature) in collection.features.into_iter().enumerate() {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(region_field))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| SchemaError::MissingRegionField {
                    feature: feature_idx,
                    field: region_field.to_string(),
                })?;

            let mut polygons = Vec::new();
            if let Some(geometry) = feature.geometry {
                let geom = Geometry::<f64>::try_from(geometry).map_err(|source| {
                    LoadError::Geometry {
                        region: name.clone(),
                        source,
                    }
                })?;
                collect_polygons(geom, &mut polygons);
            }

            match index.get(&name) {
                Some(&idx) => regions[idx].1 .0.extend(polygons),
                None => {
                    index.insert(name.clone(), regions.len());
                    regions.push((name, MultiPolygon::new(polygons)));
                }
            }
        }

        Ok(Self { regions })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Keep areal members only; points and lines carry no region boundary
fn collect_polygons(geom: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geom {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// A region with its boundaries and (possibly unknown) statistics
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// x = longitude, y = latitude
    pub boundaries: MultiPolygon<f64>,
    pub population: Option<u64>,
    pub accidents: Option<u64>,
    pub victims: Option<u64>,
}

/// What the join did with the statistics table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub matched: usize,
    /// Statistics rows whose name matched no boundary (dropped)
    pub unmatched_rows: Vec<String>,
    /// Repeated statistics rows for an already matched name (ignored)
    pub duplicate_rows: Vec<String>,
}

/// Boundary collection left-joined with the statistics table by exact name
#[derive(Debug, Clone, Default)]
pub struct JoinedDataset {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
    report: JoinReport,
}

impl JoinedDataset {
    /// Load the boundary file and join it with `stats`
    pub fn load(
        boundary_path: &Path,
        stats: &StatsTable,
        region_field: &str,
    ) -> Result<Self, LoadError> {
        info!(path = %boundary_path.display(), "loading region boundaries");
        let boundaries = BoundaryCollection::load(boundary_path, region_field)?;
        Ok(Self::join(boundaries, stats))
    }

    pub fn join(boundaries: BoundaryCollection, stats: &StatsTable) -> Self {
        let mut regions: Vec<Region> = boundaries
            .regions
            .into_iter()
            .map(|(name, boundaries)| Region {
                name,
                boundaries,
                population: None,
                accidents: None,
                victims: None,
            })
            .collect();

        let index: HashMap<String, usize> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();

        let mut report = JoinReport::default();
        let mut seen = vec![false; regions.len()];

        for row in &stats.rows {
            match index.get(&row.region) {
                Some(&idx) if seen[idx] => report.duplicate_rows.push(row.region.clone()),
                Some(&idx) => {
                    seen[idx] = true;
                    let region = &mut regions[idx];
                    region.population = row.population;
                    region.accidents = row.accidents;
                    region.victims = row.victims;
                    report.matched += 1;
                }
                None => report.unmatched_rows.push(row.region.clone()),
            }
        }

        info!(
            regions = regions.len(),
            matched = report.matched,
            unmatched = report.unmatched_rows.len(),
            "joined statistics onto boundaries"
        );
        if !report.unmatched_rows.is_empty() {
            debug!(
                rows = ?report.unmatched_rows,
                "statistics rows without a boundary were dropped"
            );
        }
        if !report.duplicate_rows.is_empty() {
            debug!(rows = ?report.duplicate_rows, "duplicate statistics rows ignored");
        }

        Self {
            regions,
            index,
            report,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.index.get(name).map(|&i| &self.regions[i])
    }

    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bounding box of every region's geometry (x = lon, y = lat)
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.regions
            .iter()
            .filter_map(|r| r.boundaries.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit squares side by side: A at lon 0..1, B at lon 2..3
    pub(crate) const TWO_REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"region": "A"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"region": "B"},
             "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
        ]
    }"#;

    pub(crate) fn boundaries(src: &str) -> BoundaryCollection {
        let geojson: GeoJson = src.parse().unwrap();
        BoundaryCollection::from_geojson(geojson, "region").unwrap()
    }

    pub(crate) fn scenario_dataset() -> JoinedDataset {
        let stats = StatsTable::new(vec![StatsRow::new("A", 100, 10, 2)]);
        JoinedDataset::join(boundaries(TWO_REGIONS), &stats)
    }

    #[test]
    fn test_left_join_keeps_unmatched_boundaries() {
        let ds = scenario_dataset();
        assert_eq!(ds.len(), 2);

        let a = ds.get("A").unwrap();
        assert_eq!((a.population, a.accidents, a.victims), (Some(100), Some(10), Some(2)));

        let b = ds.get("B").unwrap();
        assert_eq!((b.population, b.accidents, b.victims), (None, None, None));
    }

    #[test]
    fn test_orphan_rows_are_dropped() {
        let stats = StatsTable::new(vec![
            StatsRow::new("A", 1, 1, 1),
            StatsRow::new("Atlantis", 5, 5, 5),
            StatsRow::new("b", 7, 7, 7),
        ]);
        let ds = JoinedDataset::join(boundaries(TWO_REGIONS), &stats);

        assert_eq!(ds.len(), 2);
        assert!(ds.get("Atlantis").is_none());
        // case-sensitive: "b" does not match "B"
        assert_eq!(ds.get("B").unwrap().accidents, None);
        assert_eq!(ds.report().matched, 1);
        assert_eq!(ds.report().unmatched_rows, vec!["Atlantis".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_padded_csv_name_does_not_match() {
        let csv = "region,population,accidents,victims\n  B  ,5,7,1\n";
        let stats = StatsTable::from_csv_reader(csv.as_bytes()).unwrap();
        let ds = JoinedDataset::join(boundaries(TWO_REGIONS), &stats);

        assert_eq!(ds.get("B").unwrap().accidents, None);
        assert_eq!(ds.report().matched, 0);
        assert_eq!(ds.report().unmatched_rows, vec!["  B  ".to_string()]);
    }

    #[test]
    fn test_first_duplicate_row_wins() {
        let stats = StatsTable::new(vec![StatsRow::new("A", 1, 1, 1), StatsRow::new("A", 9, 9, 9)]);
        let ds = JoinedDataset::join(boundaries(TWO_REGIONS), &stats);
        assert_eq!(ds.get("A").unwrap().accidents, Some(1));
        assert_eq!(ds.report().duplicate_rows, vec!["A".to_string()]);
    }

    #[test]
    fn test_missing_region_field_is_schema_error() {
        let src = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let geojson: GeoJson = src.parse().unwrap();
        let err = BoundaryCollection::from_geojson(geojson, "region").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaError::MissingRegionField { feature: 0, .. })
        ));
    }

    #[test]
    fn test_bare_geometry_is_schema_error() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [0, 0]}"#.parse().unwrap();
        assert!(matches!(
            BoundaryCollection::from_geojson(geojson, "region"),
            Err(LoadError::Schema(SchemaError::NotFeatureCollection))
        ));
    }

    #[test]
    fn test_multipolygon_and_duplicate_features_merge() {
        let src = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"region": "Islands"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0,0],[1,0],[1,1],[0,0]]],
                [[[5,5],[6,5],[6,6],[5,5]]]
             ]}},
            {"type": "Feature", "properties": {"region": "Empty"}, "geometry": null},
            {"type": "Feature", "properties": {"region": "Islands"},
             "geometry": {"type": "Polygon", "coordinates": [[[9,9],[10,9],[10,10],[9,9]]]}}
        ]}"#;
        let ds = JoinedDataset::join(boundaries(src), &StatsTable::default());

        assert_eq!(ds.len(), 2);
        let names: Vec<&str> = ds.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Islands", "Empty"]);
        assert_eq!(ds.get("Islands").unwrap().boundaries.0.len(), 3);
        assert!(ds.get("Empty").unwrap().boundaries.0.is_empty());
    }

    #[test]
    fn test_simd_json_path_and_bounds() {
        let mut bytes = TWO_REGIONS.as_bytes().to_vec();
        let collection = BoundaryCollection::from_slice(&mut bytes, "region").unwrap();
        assert_eq!(collection.len(), 2);

        let ds = JoinedDataset::join(collection, &StatsTable::default());
        let bounds = ds.bounds().unwrap();
        assert_eq!((bounds.min().x, bounds.min().y), (0.0, 0.0));
        assert_eq!((bounds.max().x, bounds.max().y), (3.0, 1.0));
    }
}
