//! Weather lookups for Tomorrow
//!
//! Fetches current conditions and a daily forecast from WeatherAPI.com,
//! aggregates a featured-cities panel, and keeps it refreshed.

pub mod api;
pub mod cache;
pub mod featured;
pub mod location;
pub mod provider;
pub mod refresh;
pub mod types;

pub use cache::{RevalidatingSource, WeatherCache};
pub use featured::{fetch_featured, FeaturedPanel, PanelUpdate};
pub use location::{Coordinates, FixedPosition, GeolocationError, NoPositionSource, PositionSource};
pub use provider::{
    CredentialSource, EnvCredential, ProviderOptions, StaticCredential, WeatherProvider,
    WeatherSource,
};
pub use refresh::{FeaturedRefresher, RefreshUpdate};
pub use types::*;
