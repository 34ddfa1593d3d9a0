//! Contracts for the external retrieval tools.
//!
//! Concrete backends (vector search, graph spatial search, image-embedding
//! search, social search) live outside this crate. What lives here is the
//! [`RetrievalToolkit`] trait the agent loop dispatches against and the
//! minimal stable record schemas those backends project their native
//! results onto, so the loop is insulated from upstream schema drift.

mod in_memory;
mod models;
mod toolkit;

pub use in_memory::InMemoryToolkit;
pub use models::{Freshness, GeoPoint, PlaceRecord, SocialPost, SocialQuery, SpatialQuery};
pub use toolkit::RetrievalToolkit;
