pub mod featured_service;
pub mod weather_service;

pub use featured_service::{start_refresh as start_featured_refresh, FeaturedServiceMessage};
pub use weather_service::{
    request_locate as request_weather_locate, request_lookup as request_weather_lookup,
    WeatherServiceError, WeatherServiceMessage,
};
