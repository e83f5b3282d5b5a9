//! Weather measurement service.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /weather/get/byCity?city&country` | latest measure for a city |
//! | `GET /weather/get/byLocation?longitude&latitude` | latest measure in a one-degree cell |
//! | `POST /weather/submit/measurement` | store a JSON [`Weather`] record |
//!
//! Lookups without data answer `200` with an empty body.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod resources;
pub mod service;

pub use entity::{Location, Measure, Weather, WeatherCode};
pub use resources::{WeatherSelectResource, WeatherStoreResource};
pub use service::{InMemoryMeasureService, MeasurementService};

use hermes::prelude::*;
use std::sync::Arc;

/// Mount point of the weather routes.
pub const MATCHING_URL: &str = "/resources/*";

/// Assembles the weather application over `service`.
///
/// # Errors
///
/// Fails if `config` is invalid.
pub fn application(
    config: ApplicationConfig,
    service: Arc<dyn MeasurementService>,
) -> Result<Application, ApplicationError> {
    Application::builder()
        .with_config(config)
        .with_service_instance(WeatherSelectResource::new(Arc::clone(&service)))
        .with_service_instance(WeatherStoreResource::new(service))
        .build(Constructors::new())
}

/// Default configuration: port 8080, routes under [`MATCHING_URL`].
#[must_use]
pub fn default_config() -> ApplicationConfig {
    ApplicationConfig {
        matching_url: MATCHING_URL.to_string(),
        ..ApplicationConfig::default()
    }
}
