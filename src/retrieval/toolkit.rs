use crate::error::Result;
use crate::retrieval::models::{GeoPoint, PlaceRecord, SocialPost, SocialQuery, SpatialQuery};
use async_trait::async_trait;

/// The five retrieval capabilities the agent loop can dispatch to.
///
/// Implementations wrap whatever managed services back them (vector store,
/// graph database, image-embedding index, social search API) and must be
/// safe to call from many concurrent runs. Domain-level misses are `Ok`
/// values (`None`, empty vec); an `Err` signals a transport or environment
/// fault, which is fatal to the run that triggered it.
#[async_trait]
pub trait RetrievalToolkit: Send + Sync {
    /// Resolve a place name to coordinates. `None` when the name is unknown.
    async fn geocode(&self, name: &str) -> Result<Option<GeoPoint>>;

    /// Places within a radius of a coordinate, nearest first.
    async fn spatial_nearby(&self, query: &SpatialQuery) -> Result<Vec<PlaceRecord>>;

    /// Places whose descriptions best match a free-text query.
    async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<PlaceRecord>>;

    /// Places visually similar to a reference image.
    async fn visual_search(&self, image_ref: &str, limit: usize) -> Result<Vec<PlaceRecord>>;

    /// Recent social media posts matching a query.
    async fn social_search(&self, query: &SocialQuery) -> Result<Vec<SocialPost>>;
}
