pub mod app;
pub mod braille;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod live_map;
pub mod map;
pub mod ui;
