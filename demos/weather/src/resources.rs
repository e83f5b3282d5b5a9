//! HTTP resources.

use crate::entity::{Location, Weather};
use crate::service::MeasurementService;
use anyhow::Context;
use hermes::prelude::*;
use std::sync::Arc;

/// Current weather lookups under `/weather/get`.
pub struct WeatherSelectResource {
    service: Arc<dyn MeasurementService>,
}

impl WeatherSelectResource {
    /// Creates the resource over `service`.
    pub fn new(service: Arc<dyn MeasurementService>) -> Self {
        Self { service }
    }

    fn by_city(&self, mut args: Args) -> anyhow::Result<ResourceResponse> {
        let city: String = args.required(0)?;
        let country: String = args.required(1)?;

        let Some(measure) = self.service.current_by_city(&city, &country)? else {
            return Ok(ResourceResponse::ok().build());
        };
        let weather = Weather::for_city(city, country, &measure);
        Ok(ResourceResponse::ok().entity(&weather)?.build())
    }

    fn by_location(&self, mut args: Args) -> anyhow::Result<ResourceResponse> {
        let location = Location {
            longitude: args.required(0)?,
            latitude: args.required(1)?,
        };

        let Some(measure) = self
            .service
            .current_by_location(location.longitude, location.latitude)?
        else {
            return Ok(ResourceResponse::ok().build());
        };
        let weather = Weather::for_location(location, &measure);
        Ok(ResourceResponse::ok().entity(&weather)?.build())
    }
}

impl Resource for WeatherSelectResource {
    fn describe(def: &mut ResourceDef<Self>) {
        def.path("/weather/get").produces(APPLICATION_JSON);

        def.method("by_city", Self::by_city)
            .get()
            .path("/byCity")
            .param(Param::of::<String>("city").query("city").not_empty("City cannot be empty!"))
            .param(
                Param::of::<String>("country")
                    .query("country")
                    .not_empty("Country cannot be empty!"),
            );

        def.method("by_location", Self::by_location)
            .get()
            .path("/byLocation")
            .param(
                Param::of::<f64>("longitude")
                    .query("longitude")
                    .not_null("Longitude cannot be empty!"),
            )
            .param(
                Param::of::<f64>("latitude")
                    .query("latitude")
                    .not_null("Latitude cannot be empty!"),
            );
    }
}

/// Measurement submission under `/weather/submit`.
pub struct WeatherStoreResource {
    service: Arc<dyn MeasurementService>,
}

impl WeatherStoreResource {
    /// Creates the resource over `service`.
    pub fn new(service: Arc<dyn MeasurementService>) -> Self {
        Self { service }
    }

    fn submit(&self, mut args: Args) -> anyhow::Result<ResourceResponse> {
        let weather: Weather = args.required(0)?;
        let measure = weather
            .to_measure()
            .with_context(|| format!("invalid measureTime '{}'", weather.measure_time))?;

        if let Some((city, country)) = weather.city_country() {
            self.service.store_by_city(city, country, measure)?;
        } else if let Some(location) = weather.location {
            self.service
                .store_by_location(location.longitude, location.latitude, measure)?;
        } else {
            return Ok(ResourceResponse::status(StatusCode::BAD_REQUEST).build());
        }
        Ok(ResourceResponse::ok().build())
    }
}

impl Resource for WeatherStoreResource {
    fn describe(def: &mut ResourceDef<Self>) {
        def.path("/weather/submit");
        def.method("submit", Self::submit)
            .post()
            .path("/measurement")
            .consumes(APPLICATION_JSON)
            .param(Param::of::<Weather>("measure").not_null("Measurement cannot be null!"));
    }
}
