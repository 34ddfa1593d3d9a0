//! A seeded, fully in-process toolkit for demos and tests.

use crate::error::Result;
use crate::retrieval::models::{GeoPoint, PlaceRecord, SocialPost, SocialQuery, SpatialQuery};
use crate::retrieval::toolkit::RetrievalToolkit;
use async_trait::async_trait;
use std::collections::HashMap;

/// A toolkit backed by a small static place table instead of live services.
///
/// Useful for exercising the agent loop offline. Geocoding matches landmark
/// names case-insensitively; spatial search ranks seeded places by
/// great-circle distance from the given origin.
pub struct InMemoryToolkit {
    landmarks: HashMap<String, GeoPoint>,
    places: Vec<(GeoPoint, PlaceRecord)>,
}

impl InMemoryToolkit {
    pub fn new() -> Self {
        Self {
            landmarks: HashMap::new(),
            places: Vec::new(),
        }
    }

    /// A toolkit seeded with a handful of Da Nang places.
    pub fn seeded() -> Self {
        let mut toolkit = Self::new();
        toolkit.add_landmark("My Khe Beach", GeoPoint { lat: 16.0614, lng: 108.2459 });
        toolkit.add_landmark("Dragon Bridge", GeoPoint { lat: 16.0614, lng: 108.2272 });
        toolkit.add_landmark("Marble Mountains", GeoPoint { lat: 16.0037, lng: 108.2631 });

        toolkit.add_place(
            GeoPoint { lat: 16.0602, lng: 108.2443 },
            PlaceRecord::new("p-cong-caphe", "Cong Caphe", "cafe").with_rating(4.5),
        );
        toolkit.add_place(
            GeoPoint { lat: 16.0631, lng: 108.2421 },
            PlaceRecord::new("p-43-factory", "43 Factory Coffee Roaster", "cafe").with_rating(4.7),
        );
        toolkit.add_place(
            GeoPoint { lat: 16.0598, lng: 108.2470 },
            PlaceRecord::new("p-son-tra-retreat", "Son Tra Retreat", "restaurant")
                .with_rating(4.4),
        );
        toolkit.add_place(
            GeoPoint { lat: 16.0478, lng: 108.2292 },
            PlaceRecord::new("p-han-market", "Han Market", "market").with_rating(4.1),
        );
        toolkit
    }

    pub fn add_landmark(&mut self, name: impl Into<String>, point: GeoPoint) {
        let name: String = name.into();
        self.landmarks.insert(name.to_lowercase(), point);
    }

    pub fn add_place(&mut self, location: GeoPoint, record: PlaceRecord) {
        self.places.push((location, record));
    }

    /// Great-circle distance in kilometers (haversine).
    fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let d_lat = (b.lat - a.lat).to_radians();
        let d_lng = (b.lng - a.lng).to_radians();
        let h = (d_lat / 2.0).sin().powi(2)
            + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }
}

impl Default for InMemoryToolkit {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl RetrievalToolkit for InMemoryToolkit {
    async fn geocode(&self, name: &str) -> Result<Option<GeoPoint>> {
        Ok(self.landmarks.get(&name.trim().to_lowercase()).copied())
    }

    async fn spatial_nearby(&self, query: &SpatialQuery) -> Result<Vec<PlaceRecord>> {
        let origin = GeoPoint {
            lat: query.lat,
            lng: query.lng,
        };

        let mut hits: Vec<PlaceRecord> = self
            .places
            .iter()
            .filter_map(|(location, record)| {
                let distance = Self::distance_km(origin, *location);
                if distance > query.max_distance_km {
                    return None;
                }
                if let Some(category) = &query.category {
                    if !record.category.eq_ignore_ascii_case(category) {
                        return None;
                    }
                }
                Some(record.clone().with_distance_km((distance * 100.0).round() / 100.0))
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<PlaceRecord>> {
        let needle = query.to_lowercase();
        let hits: Vec<PlaceRecord> = self
            .places
            .iter()
            .filter(|(_, record)| {
                record.name.to_lowercase().contains(&needle)
                    || record.category.to_lowercase().contains(&needle)
                    || needle.contains(&record.category.to_lowercase())
            })
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect();
        Ok(hits)
    }

    async fn visual_search(&self, _image_ref: &str, limit: usize) -> Result<Vec<PlaceRecord>> {
        // No embedding index offline; return the seeded places as weak matches.
        Ok(self
            .places
            .iter()
            .take(limit)
            .map(|(_, record)| record.clone().with_similarity(0.5))
            .collect())
    }

    async fn social_search(&self, _query: &SocialQuery) -> Result<Vec<SocialPost>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::models::Freshness;

    #[tokio::test]
    async fn test_geocode_known_landmark() {
        let toolkit = InMemoryToolkit::seeded();
        let point = toolkit.geocode("my khe beach").await.unwrap();

        assert!(point.is_some());
        assert!((point.unwrap().lat - 16.0614).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_geocode_unknown_landmark() {
        let toolkit = InMemoryToolkit::seeded();
        let point = toolkit.geocode("atlantis").await.unwrap();

        assert!(point.is_none());
    }

    #[tokio::test]
    async fn test_spatial_nearby_filters_by_category_and_radius() {
        let toolkit = InMemoryToolkit::seeded();
        let query = SpatialQuery {
            lat: 16.0614,
            lng: 108.2459,
            max_distance_km: 1.0,
            category: Some("cafe".to_string()),
            limit: 10,
        };

        let hits = toolkit.spatial_nearby(&query).await.unwrap();

        assert!(!hits.is_empty());
        for hit in &hits {
            assert_eq!(hit.category, "cafe");
            assert!(hit.distance_km.unwrap() <= 1.0);
        }
        // Nearest first
        let distances: Vec<f64> = hits.iter().map(|h| h.distance_km.unwrap()).collect();
        let mut sorted = distances.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(distances, sorted);
    }

    #[tokio::test]
    async fn test_spatial_nearby_respects_limit() {
        let toolkit = InMemoryToolkit::seeded();
        let query = SpatialQuery {
            lat: 16.0614,
            lng: 108.2459,
            max_distance_km: 50.0,
            category: None,
            limit: 2,
        };

        let hits = toolkit.spatial_nearby(&query).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_semantic_search_matches_category() {
        let toolkit = InMemoryToolkit::seeded();
        let hits = toolkit.semantic_search("a quiet cafe near the beach", 5).await.unwrap();

        assert!(hits.iter().any(|h| h.category == "cafe"));
    }

    #[tokio::test]
    async fn test_social_search_is_empty_offline() {
        let toolkit = InMemoryToolkit::seeded();
        let query = SocialQuery {
            query: "da nang food".to_string(),
            limit: 5,
            freshness: Freshness::Week,
            platforms: None,
        };

        assert!(toolkit.social_search(&query).await.unwrap().is_empty());
    }
}
