use crate::domain::location::ResolvedLocation;
use crate::error::ServiceError;
use crate::provider::Geocoder;
use crate::store::RecordStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StoredLocation {
    #[serde(flatten)]
    pub location: ResolvedLocation,
    pub id: i32,
}

/// Orchestrates geocoding and optional persistence through the data service.
pub struct LocationService<G, S> {
    geocoder: G,
    store: S,
}

impl<G: Geocoder, S: RecordStore> LocationService<G, S> {
    pub fn new(geocoder: G, store: S) -> Self {
        Self { geocoder, store }
    }

    pub async fn resolve_only(&self, query: &str) -> Result<ResolvedLocation, ServiceError> {
        let query = normalized(query)?;
        self.geocoder.geocode(&query).await
    }

    pub async fn resolve_and_store(&self, query: &str) -> Result<StoredLocation, ServiceError> {
        let query = normalized(query)?;
        let resolved = self.geocoder.geocode(&query).await?;
        let stored = self.store.save_location(&resolved).await?;
        Ok(StoredLocation {
            location: resolved,
            id: stored.id,
        })
    }
}

fn normalized(query: &str) -> Result<String, ServiceError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput("Empty query".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{LocationRecord, NewWeatherRecord, WeatherRecord};
    use chrono::Utc;

    struct FakeGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<ResolvedLocation, ServiceError> {
            if query == "toronto" {
                Ok(ResolvedLocation {
                    query: query.to_string(),
                    lat: 43.6532,
                    lng: -79.3832,
                    display_name: Some("Toronto, ON, Canada".to_string()),
                    source: "mock".to_string(),
                })
            } else {
                Err(ServiceError::NotFound(format!(
                    "Location '{query}' could not be found"
                )))
            }
        }
    }

    struct FakeStore;

    #[async_trait::async_trait]
    impl RecordStore for FakeStore {
        async fn save_weather(
            &self,
            _record: &NewWeatherRecord,
        ) -> Result<WeatherRecord, ServiceError> {
            Err(ServiceError::upstream("not used in these tests"))
        }

        async fn save_location(
            &self,
            location: &ResolvedLocation,
        ) -> Result<LocationRecord, ServiceError> {
            Ok(LocationRecord {
                id: 42,
                query: location.query.clone(),
                lat: location.lat,
                lng: location.lng,
                display_name: location.display_name.clone(),
                source: Some(location.source.clone()),
                created_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn blank_query_is_invalid_input() {
        let svc = LocationService::new(FakeGeocoder, FakeStore);
        let err = svc.resolve_only("   ").await.unwrap_err();
        assert_eq!(err, ServiceError::InvalidInput("Empty query".to_string()));
    }

    #[tokio::test]
    async fn resolve_only_trims_and_geocodes() {
        let svc = LocationService::new(FakeGeocoder, FakeStore);
        let loc = svc.resolve_only(" toronto ").await.unwrap();
        assert_eq!(loc.lat, 43.6532);
    }

    #[tokio::test]
    async fn resolve_and_store_attaches_record_id() {
        let svc = LocationService::new(FakeGeocoder, FakeStore);
        let out = svc.resolve_and_store("toronto").await.unwrap();
        assert_eq!(out.id, 42);
        assert_eq!(out.location.lng, -79.3832);
    }

    #[tokio::test]
    async fn unknown_place_propagates_not_found() {
        let svc = LocationService::new(FakeGeocoder, FakeStore);
        let err = svc.resolve_and_store("atlantis").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
