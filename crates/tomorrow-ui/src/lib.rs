//! Presentation layer for Tomorrow Weather.
//!
//! View models hold display state; services run lookups on the runtime and
//! report back over channels owned by [`AppServices`].

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod render;
pub mod services;

pub use app_services::AppServices;
pub use models::{DisplayState, FeaturedModel, FeaturedTile, WeatherModel};
