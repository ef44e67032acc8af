use crate::error::LoadError;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the per-region statistics table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsRow {
    /// Join key, kept byte-exact
    pub region: String,
    #[serde(default, deserialize_with = "padded_count")]
    pub population: Option<u64>,
    #[serde(default, deserialize_with = "padded_count")]
    pub accidents: Option<u64>,
    #[serde(default, deserialize_with = "padded_count")]
    pub victims: Option<u64>,
}

/// Count cell that tolerates surrounding spaces; blank reads as unknown
fn padded_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let cell: Option<String> = Option::deserialize(deserializer)?;
    match cell.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl StatsRow {
    pub fn new(region: &str, population: u64, accidents: u64, victims: u64) -> Self {
        Self {
            region: region.to_string(),
            population: Some(population),
            accidents: Some(accidents),
            victims: Some(victims),
        }
    }
}

/// In-memory statistics table, rows kept in source order
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    pub rows: Vec<StatsRow>,
}

impl StatsTable {
    pub fn new(rows: Vec<StatsRow>) -> Self {
        Self { rows }
    }

    /// Read a CSV table with a `region` column and optional
    /// `population`, `accidents` and `victims` columns.
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: StatsRow = result?;
            if row.region.is_empty() {
                continue;
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// 2017 road accident figures for the twelve Moroccan regions
    pub fn builtin() -> Self {
        Self::new(vec![
            StatsRow::new("Tanger-Tetouan-Hoceima", 3_648_200, 6_237, 1_200),
            StatsRow::new("Oriental", 2_283_800, 4_166, 900),
            StatsRow::new("Fes-Meknes", 4_362_900, 9_276, 1_400),
            StatsRow::new("Rabat-Sale-Kenitra", 4_654_000, 15_226, 2_100),
            StatsRow::new("Beni Mellal-Khenifra", 2_590_000, 5_764, 800),
            StatsRow::new("Casablanca-Settat", 7_284_400, 27_490, 3_200),
            StatsRow::new("Marrakech-Safi", 4_846_100, 11_264, 1_600),
            StatsRow::new("Daraa-Tafilelt", 1_632_600, 2_016, 450),
            StatsRow::new("Souss Massa", 2_722_000, 5_500, 950),
            StatsRow::new("Guelmim-Oued Noun", 486_200, 959, 200),
            StatsRow::new("Laayoune-Saguia Hamra", 367_700, 1_137, 300),
            StatsRow::new("Dakhla-Oued Eddahab", 142_800, 63, 20),
        ])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
