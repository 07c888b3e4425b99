pub mod featured_model;
pub mod weather_model;

pub use featured_model::{FeaturedModel, FeaturedTile};
pub use weather_model::{DisplayState, WeatherModel};
