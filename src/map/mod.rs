mod choropleth;
mod color;
mod geometry;
mod hover;
mod projection;
mod surface;

pub use choropleth::{legend_gradient, Choropleth, OutlineOverrides, RegionFill, LEGEND_LABEL};
pub use color::{ColorRamp, ColorScale, ParseColorError, Rgb};
pub use hover::{stat_text, HoverResolver, RegionSummary};
pub use projection::Viewport;
pub use surface::{MapPolygon, MapSurface, TerminalMap};
