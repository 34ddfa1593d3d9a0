use serde::{Deserialize, Serialize};

/// A geographic coordinate pair returned by the geocode tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A place as every retrieval tool reports it.
///
/// One schema covers all place-producing tools; fields a given tool does not
/// populate are omitted from the serialized form. `place_id` is the identifier
/// the grounding check runs against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub category: String,
    /// Distance from the search origin, spatial search only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Embedding similarity, visual search only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// The matched passage, semantic text search only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl PlaceRecord {
    /// A record carrying only the fields every tool populates.
    pub fn new(
        place_id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            category: category.into(),
            distance_km: None,
            rating: None,
            similarity: None,
            source_text: None,
        }
    }

    pub fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_source_text(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }
}

/// A post returned by the social search tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialPost {
    pub title: String,
    pub url: String,
    /// Human-readable age of the post, e.g. "2 days ago"
    pub age: String,
    pub platform: String,
}

/// Recency window for social search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Day,
    #[default]
    Week,
    Month,
}

/// Parameters for a spatial nearby search around a known coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialQuery {
    pub lat: f64,
    pub lng: f64,
    pub max_distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub limit: usize,
}

/// Parameters for a social media search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialQuery {
    pub query: String,
    pub limit: usize,
    pub freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_record_minimal_serialization() {
        let record = PlaceRecord::new("p1", "My Khe Beach", "beach");
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"place_id\":\"p1\""));
        assert!(json.contains("My Khe Beach"));
        // Unpopulated tool-specific fields are omitted entirely
        assert!(!json.contains("distance_km"));
        assert!(!json.contains("rating"));
        assert!(!json.contains("similarity"));
        assert!(!json.contains("source_text"));
    }

    #[test]
    fn test_place_record_builders() {
        let record = PlaceRecord::new("p2", "Cong Caphe", "cafe")
            .with_distance_km(0.4)
            .with_rating(4.5);

        assert_eq!(record.distance_km, Some(0.4));
        assert_eq!(record.rating, Some(4.5));
        assert!(record.similarity.is_none());
    }

    #[test]
    fn test_place_record_round_trip() {
        let record = PlaceRecord::new("p3", "Han Market", "market")
            .with_source_text("A bustling market in central Da Nang");
        let json = serde_json::to_string(&record).unwrap();
        let back: PlaceRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(record, back);
    }

    #[test]
    fn test_freshness_serialization() {
        assert_eq!(serde_json::to_string(&Freshness::Day).unwrap(), "\"day\"");
        assert_eq!(serde_json::to_string(&Freshness::Week).unwrap(), "\"week\"");
        assert_eq!(serde_json::to_string(&Freshness::Month).unwrap(), "\"month\"");
        assert_eq!(Freshness::default(), Freshness::Week);
    }

    #[test]
    fn test_spatial_query_deserialization() {
        let json = r#"{"lat":16.05,"lng":108.24,"max_distance_km":2.0,"limit":5}"#;
        let query: SpatialQuery = serde_json::from_str(json).unwrap();

        assert_eq!(query.lat, 16.05);
        assert_eq!(query.limit, 5);
        assert!(query.category.is_none());
    }

    #[test]
    fn test_geo_point_round_trip() {
        let point = GeoPoint {
            lat: 16.0614,
            lng: 108.2459,
        };
        let json = serde_json::to_string(&point).unwrap();
        let back: GeoPoint = serde_json::from_str(&json).unwrap();

        assert_eq!(point, back);
    }
}
