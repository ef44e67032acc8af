use crate::map::{ColorRamp, OutlineOverrides, Rgb};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub live_map: LiveMapConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// GeoJSON FeatureCollection of region boundaries
    pub boundaries: PathBuf,
    /// CSV statistics table; the built-in 2017 table when absent
    pub stats: Option<PathBuf>,
    /// Feature property holding the region name
    pub region_field: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("data/morocco_regions.geojson"),
            stats: None,
            region_field: "region".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub tile_source: String,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Viewport scale; fit to the data bounds when absent
    pub zoom: Option<f64>,
    pub color_ramp: ColorRamp,
    pub border_width: f64,
    /// Region name -> outline color (hex or basic name)
    pub outline_overrides: HashMap<String, String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        let highlighted = [
            "Casablanca-Settat",
            "Tanger-Tetouan-Hoceima",
            "Dakhla-Oued Eddahab",
        ];
        let outline_overrides = highlighted
            .into_iter()
            .map(|name| (name.to_string(), "red".to_string()))
            .collect();
        Self {
            tile_source: "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            center_lat: 31.7917,
            center_lon: -7.0926,
            zoom: None,
            color_ramp: ColorRamp::Rainbow,
            border_width: 0.6,
            outline_overrides,
        }
    }
}

impl MapConfig {
    pub fn outline_overrides(&self) -> Result<OutlineOverrides> {
        self.outline_overrides
            .iter()
            .map(|(region, color)| {
                let rgb: Rgb = color
                    .parse()
                    .with_context(|| format!("Bad outline color for region '{}'", region))?;
                Ok((region.clone(), rgb))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveMapConfig {
    pub url: String,
    /// Program (and leading args) used to open the URL; platform opener when absent
    pub launcher: Option<Vec<String>>,
}

impl Default for LiveMapConfig {
    fn default() -> Self {
        Self {
            url: "https://admtrafic.ma/?map=true".to_string(),
            launcher: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    /// Filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("accident-dash.log"),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [data]
            boundaries = "regions.geojson"
            stats = "stats.csv"

            [map]
            color_ramp = "bgyr"
            zoom = 12.5
            "#,
        )
        .unwrap();

        assert_eq!(config.data.boundaries, PathBuf::from("regions.geojson"));
        assert_eq!(config.data.stats, Some(PathBuf::from("stats.csv")));
        assert_eq!(config.data.region_field, "region");
        assert_eq!(config.map.color_ramp, ColorRamp::Bgyr);
        assert_eq!(config.map.zoom, Some(12.5));
        assert_eq!(config.map.center_lat, 31.7917);
        assert_eq!(config.live_map.url, "https://admtrafic.ma/?map=true");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_default_outline_overrides() {
        let overrides = MapConfig::default().outline_overrides().unwrap();
        assert_eq!(overrides.len(), 3);
        assert_eq!(overrides["Casablanca-Settat"], Rgb::RED);
    }

    #[test]
    fn test_custom_overrides_and_bad_color() {
        let config = AppConfig::from_toml(
            r##"
            [map.outline_overrides]
            "Oriental" = "#78B3CE"
            "##,
        )
        .unwrap();
        let overrides = config.map.outline_overrides().unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["Oriental"], Rgb(120, 179, 206));

        let bad = AppConfig::from_toml("[map.outline_overrides]\nOriental = \"nope\"\n").unwrap();
        assert!(bad.map.outline_overrides().is_err());
    }

    #[test]
    fn test_unknown_ramp_rejected() {
        assert!(AppConfig::from_toml("[map]\ncolor_ramp = \"viridis\"\n").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(config.data.boundaries, PathBuf::from("data/morocco_regions.geojson"));
    }
}
