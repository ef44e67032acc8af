use std::path::PathBuf;
use thiserror::Error;

/// The boundary collection does not have the shape the region join needs.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("boundary file must contain a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    #[error("feature #{feature} has no string property '{field}'")]
    MissingRegionField { feature: usize, field: String },
}

/// Failures while building the joined region dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse GeoJSON: {0}")]
    Json(#[from] simd_json::Error),
    #[error("failed to read statistics table: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("region '{region}' has unusable geometry: {source}")]
    Geometry {
        region: String,
        #[source]
        source: geojson::Error,
    },
}

/// The live traffic map could not be opened.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no launcher command configured for this platform")]
    NoLauncher,
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
