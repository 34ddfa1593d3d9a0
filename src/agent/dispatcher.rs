//! Dispatch of parsed tool actions against the retrieval toolkit.
//!
//! Every dispatch resolves to an [`Observation`]. Bad input and domain-level
//! misses come back as `Observation::Error` payloads and the run continues;
//! only a transport fault escaping the toolkit propagates as `Err`, which
//! the controller treats as fatal to the run.

use crate::agent::parser::ToolAction;
use crate::agent::state::Query;
use crate::error::Result;
use crate::retrieval::{
    Freshness, GeoPoint, PlaceRecord, RetrievalToolkit, SocialPost, SocialQuery, SpatialQuery,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 20;
const DEFAULT_RADIUS_KM: f64 = 5.0;

/// The normalized result of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Observation {
    Location(GeoPoint),
    Places(Vec<PlaceRecord>),
    Social(Vec<SocialPost>),
    Error { error: String },
}

impl Observation {
    pub fn error(message: impl Into<String>) -> Self {
        Observation::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Observation::Error { .. })
    }

    /// Place identifiers this observation contributed, for grounding.
    pub fn place_ids(&self) -> Vec<&str> {
        match self {
            Observation::Places(records) => {
                records.iter().map(|r| r.place_id.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeInput {
    #[serde(alias = "place_name", alias = "query")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpatialInput {
    lat: f64,
    lng: f64,
    #[serde(default = "default_radius_km")]
    max_distance_km: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct TextSearchInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct VisualSearchInput {
    #[serde(default, alias = "image")]
    image_ref: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SocialSearchInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    freshness: Freshness,
    #[serde(default)]
    platforms: Option<Vec<String>>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

/// Maps one parsed action to one toolkit call.
pub struct Dispatcher {
    toolkit: Arc<dyn RetrievalToolkit>,
}

impl Dispatcher {
    pub fn new(toolkit: Arc<dyn RetrievalToolkit>) -> Self {
        Self { toolkit }
    }

    /// Execute one tool action against the toolkit.
    ///
    /// The match is exhaustive over the closed action set; unrecognized
    /// action names never reach this point, they are resolved to a finish
    /// by the parser.
    pub async fn execute(
        &self,
        action: ToolAction,
        action_input: &Value,
        query: &Query,
    ) -> Result<Observation> {
        info!(action = action.wire_name(), "Executing tool");

        let observation = match action {
            ToolAction::Geocode => {
                let input: GeocodeInput = match decode_input(action, action_input) {
                    Ok(input) => input,
                    Err(obs) => return Ok(obs),
                };
                match self.toolkit.geocode(&input.name).await? {
                    Some(point) => Observation::Location(point),
                    None => Observation::error(format!("no location found for '{}'", input.name)),
                }
            }
            ToolAction::SpatialNearby => {
                let input: SpatialInput = match decode_input(action, action_input) {
                    Ok(input) => input,
                    Err(obs) => return Ok(obs),
                };
                let spatial = SpatialQuery {
                    lat: input.lat,
                    lng: input.lng,
                    max_distance_km: input.max_distance_km,
                    category: input.category,
                    limit: input.limit.min(MAX_LIMIT),
                };
                Observation::Places(self.toolkit.spatial_nearby(&spatial).await?)
            }
            ToolAction::SemanticSearch => {
                let input: TextSearchInput = match decode_input(action, action_input) {
                    Ok(input) => input,
                    Err(obs) => return Ok(obs),
                };
                Observation::Places(
                    self.toolkit
                        .semantic_search(&input.query, input.limit.min(MAX_LIMIT))
                        .await?,
                )
            }
            ToolAction::VisualSearch => {
                let input: VisualSearchInput = match decode_input(action, action_input) {
                    Ok(input) => input,
                    Err(obs) => return Ok(obs),
                };
                // The image may arrive with the query rather than restated
                // in the action input.
                let image_ref = input.image_ref.or_else(|| query.image_ref.clone());
                match image_ref {
                    Some(image_ref) => Observation::Places(
                        self.toolkit
                            .visual_search(&image_ref, input.limit.min(MAX_LIMIT))
                            .await?,
                    ),
                    None => Observation::error("no reference image available for visual search"),
                }
            }
            ToolAction::SocialSearch => {
                let input: SocialSearchInput = match decode_input(action, action_input) {
                    Ok(input) => input,
                    Err(obs) => return Ok(obs),
                };
                let social = SocialQuery {
                    query: input.query,
                    limit: input.limit.min(MAX_LIMIT),
                    freshness: input.freshness,
                    platforms: input.platforms,
                };
                Observation::Social(self.toolkit.social_search(&social).await?)
            }
        };

        if let Observation::Error { error } = &observation {
            warn!(action = action.wire_name(), error = error.as_str(), "Tool returned an error payload");
        }
        Ok(observation)
    }
}

fn decode_input<T: for<'de> Deserialize<'de>>(
    action: ToolAction,
    action_input: &Value,
) -> std::result::Result<T, Observation> {
    serde_json::from_value(action_input.clone()).map_err(|e| {
        Observation::error(format!(
            "invalid input for {}: {}",
            action.wire_name(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TourmindError;
    use async_trait::async_trait;
    use serde_json::json;

    struct ScriptedToolkit {
        geocode_result: Option<GeoPoint>,
        places: Vec<PlaceRecord>,
        fail_transport: bool,
    }

    impl ScriptedToolkit {
        fn with_places(places: Vec<PlaceRecord>) -> Self {
            Self {
                geocode_result: Some(GeoPoint { lat: 16.0614, lng: 108.2459 }),
                places,
                fail_transport: false,
            }
        }

        fn failing() -> Self {
            Self {
                geocode_result: None,
                places: vec![],
                fail_transport: true,
            }
        }

        fn check(&self) -> Result<()> {
            if self.fail_transport {
                Err(TourmindError::GatewayError("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RetrievalToolkit for ScriptedToolkit {
        async fn geocode(&self, _name: &str) -> Result<Option<GeoPoint>> {
            self.check()?;
            Ok(self.geocode_result)
        }

        async fn spatial_nearby(&self, _query: &SpatialQuery) -> Result<Vec<PlaceRecord>> {
            self.check()?;
            Ok(self.places.clone())
        }

        async fn semantic_search(&self, _query: &str, _limit: usize) -> Result<Vec<PlaceRecord>> {
            self.check()?;
            Ok(self.places.clone())
        }

        async fn visual_search(&self, _image_ref: &str, _limit: usize) -> Result<Vec<PlaceRecord>> {
            self.check()?;
            Ok(self.places.clone())
        }

        async fn social_search(&self, _query: &SocialQuery) -> Result<Vec<SocialPost>> {
            self.check()?;
            Ok(vec![])
        }
    }

    fn query() -> Query {
        Query::new("find a cafe near My Khe beach")
    }

    #[tokio::test]
    async fn test_geocode_success() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(vec![])));
        let obs = dispatcher
            .execute(ToolAction::Geocode, &json!({"name": "My Khe Beach"}), &query())
            .await
            .unwrap();

        match obs {
            Observation::Location(point) => assert!((point.lat - 16.0614).abs() < 1e-6),
            other => panic!("expected Location, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_geocode_not_found_is_error_payload() {
        let mut toolkit = ScriptedToolkit::with_places(vec![]);
        toolkit.geocode_result = None;
        let dispatcher = Dispatcher::new(Arc::new(toolkit));

        let obs = dispatcher
            .execute(ToolAction::Geocode, &json!({"name": "Atlantis"}), &query())
            .await
            .unwrap();

        assert!(obs.is_error());
    }

    #[tokio::test]
    async fn test_geocode_accepts_place_name_alias() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(vec![])));
        let obs = dispatcher
            .execute(ToolAction::Geocode, &json!({"place_name": "My Khe Beach"}), &query())
            .await
            .unwrap();

        assert!(!obs.is_error());
    }

    #[tokio::test]
    async fn test_malformed_input_is_error_payload_not_fault() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(vec![])));
        let obs = dispatcher
            .execute(ToolAction::SpatialNearby, &json!({"lat": "not a number"}), &query())
            .await
            .unwrap();

        match obs {
            Observation::Error { error } => assert!(error.contains("spatial_nearby_search")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spatial_nearby_returns_places() {
        let places = vec![PlaceRecord::new("p1", "Cong Caphe", "cafe").with_distance_km(0.3)];
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(places)));

        let obs = dispatcher
            .execute(
                ToolAction::SpatialNearby,
                &json!({"lat": 16.06, "lng": 108.24, "category": "cafe"}),
                &query(),
            )
            .await
            .unwrap();

        assert_eq!(obs.place_ids(), vec!["p1"]);
    }

    #[tokio::test]
    async fn test_transport_fault_propagates() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::failing()));
        let result = dispatcher
            .execute(ToolAction::SemanticSearch, &json!({"query": "cafe"}), &query())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_visual_search_falls_back_to_query_image() {
        let places = vec![PlaceRecord::new("p9", "Golden Bridge", "landmark")];
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(places)));
        let query = Query::new("what looks like this?").with_image("img-123");

        let obs = dispatcher
            .execute(ToolAction::VisualSearch, &json!({}), &query)
            .await
            .unwrap();

        assert_eq!(obs.place_ids(), vec!["p9"]);
    }

    #[tokio::test]
    async fn test_visual_search_without_any_image_is_error_payload() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedToolkit::with_places(vec![])));
        let obs = dispatcher
            .execute(ToolAction::VisualSearch, &json!({}), &query())
            .await
            .unwrap();

        assert!(obs.is_error());
    }

    #[test]
    fn test_observation_error_serializes_as_error_record() {
        let obs = Observation::error("boom");
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(json, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_observation_place_ids_empty_for_non_place_payloads() {
        assert!(Observation::Location(GeoPoint { lat: 0.0, lng: 0.0 }).place_ids().is_empty());
        assert!(Observation::error("x").place_ids().is_empty());
    }
}
