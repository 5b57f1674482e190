#[allow(clippy::module_inception)]
mod config;

pub use self::config::{OutputFormat, OutputSettings, PathSettings, Settings};
