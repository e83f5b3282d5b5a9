//! Measurement storage.

use crate::entity::Measure;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

/// Stores measurements and answers "what is the weather now".
pub trait MeasurementService: Send + Sync {
    /// Most recent measurement for a city, if any.
    fn current_by_city(&self, city: &str, country: &str) -> anyhow::Result<Option<Measure>>;

    /// Most recent measurement in the one-degree cell containing the point.
    fn current_by_location(&self, longitude: f64, latitude: f64) -> anyhow::Result<Option<Measure>>;

    /// Records a measurement for a city.
    fn store_by_city(&self, city: &str, country: &str, measure: Measure) -> anyhow::Result<()>;

    /// Records a measurement for the one-degree cell containing the point.
    fn store_by_location(&self, longitude: f64, latitude: f64, measure: Measure) -> anyhow::Result<()>;
}

/// Process-local [`MeasurementService`].
///
/// Cities are keyed by `city/country`. Locations are keyed by their floored
/// coordinates, so every point in a one-degree cell shares the same history.
#[derive(Debug, Default)]
pub struct InMemoryMeasureService {
    by_city: History<String>,
    by_location: History<CellKey>,
}

impl InMemoryMeasureService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasurementService for InMemoryMeasureService {
    fn current_by_city(&self, city: &str, country: &str) -> anyhow::Result<Option<Measure>> {
        Ok(self.by_city.latest(&city_key(city, country)))
    }

    fn current_by_location(&self, longitude: f64, latitude: f64) -> anyhow::Result<Option<Measure>> {
        Ok(self.by_location.latest(&CellKey::new(longitude, latitude)))
    }

    fn store_by_city(&self, city: &str, country: &str, measure: Measure) -> anyhow::Result<()> {
        tracing::debug!(city, country, "storing measure");
        self.by_city.push(city_key(city, country), measure);
        Ok(())
    }

    fn store_by_location(&self, longitude: f64, latitude: f64, measure: Measure) -> anyhow::Result<()> {
        tracing::debug!(longitude, latitude, "storing measure");
        self.by_location.push(CellKey::new(longitude, latitude), measure);
        Ok(())
    }
}

fn city_key(city: &str, country: &str) -> String {
    format!("{city}/{country}")
}

/// Floored coordinates, compared bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    longitude: u64,
    latitude: u64,
}

impl CellKey {
    fn new(longitude: f64, latitude: f64) -> Self {
        // `+ 0.0` folds -0.0 into 0.0.
        Self {
            longitude: (longitude.floor() + 0.0).to_bits(),
            latitude: (latitude.floor() + 0.0).to_bits(),
        }
    }
}

#[derive(Debug)]
struct History<K> {
    entries: RwLock<HashMap<K, BinaryHeap<ByTime>>>,
}

impl<K> Default for History<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> History<K> {
    fn latest(&self, key: &K) -> Option<Measure> {
        self.entries
            .read()
            .get(key)
            .and_then(BinaryHeap::peek)
            .map(|entry| entry.0.clone())
    }

    fn push(&self, key: K, measure: Measure) {
        self.entries
            .write()
            .entry(key)
            .or_default()
            .push(ByTime(measure));
    }
}

/// Heap entry ordered by measurement time only.
#[derive(Debug)]
struct ByTime(Measure);

impl PartialEq for ByTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.measured_at == other.0.measured_at
    }
}

impl Eq for ByTime {}

impl PartialOrd for ByTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.measured_at.cmp(&other.0.measured_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::WeatherCode;
    use std::sync::Arc;

    fn measure(at: &str, temperature: f64) -> Measure {
        Measure {
            temperature,
            code: WeatherCode::Cloudy,
            measured_at: at.parse().unwrap(),
        }
    }

    #[test]
    fn test_latest_by_city_wins_regardless_of_order() {
        let service = InMemoryMeasureService::new();
        service.store_by_city("Kiev", "Ukraine", measure("2017-01-02T00:00:00", 2.0)).unwrap();
        service.store_by_city("Kiev", "Ukraine", measure("2017-01-03T00:00:00", 3.0)).unwrap();
        service.store_by_city("Kiev", "Ukraine", measure("2017-01-01T00:00:00", 1.0)).unwrap();

        let current = service.current_by_city("Kiev", "Ukraine").unwrap().unwrap();
        assert_eq!(current.temperature, 3.0);
        assert!(service.current_by_city("Kiev", "Russia").unwrap().is_none());
    }

    #[test]
    fn test_location_cells_are_floored() {
        let service = InMemoryMeasureService::new();
        service.store_by_location(31.9, 51.2, measure("2017-05-12T00:00:00", 15.0)).unwrap();

        assert!(service.current_by_location(31.0, 51.0).unwrap().is_some());
        assert!(service.current_by_location(31.99, 51.99).unwrap().is_some());
        assert!(service.current_by_location(32.0, 51.0).unwrap().is_none());
    }

    #[test]
    fn test_negative_zero_shares_cell() {
        let service = InMemoryMeasureService::new();
        service.store_by_location(-0.0, 0.5, measure("2017-05-12T00:00:00", 4.0)).unwrap();
        assert!(service.current_by_location(0.3, 0.0).unwrap().is_some());
        assert!(service.current_by_location(-0.3, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_writers() {
        let service = Arc::new(InMemoryMeasureService::new());
        std::thread::scope(|scope| {
            for day in 1..=9 {
                let service = Arc::clone(&service);
                scope.spawn(move || {
                    let at = format!("2017-03-0{day}T00:00:00");
                    service
                        .store_by_city("Lviv", "Ukraine", measure(&at, f64::from(day)))
                        .unwrap();
                });
            }
        });

        let current = service.current_by_city("Lviv", "Ukraine").unwrap().unwrap();
        assert_eq!(current.temperature, 9.0);
    }
}
