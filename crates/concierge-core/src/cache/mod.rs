//! Endpoint registry with tag-based cache invalidation.
//!
//! Queries declare the resource [`Tag`]s their result provides; mutations
//! declare the tags they invalidate. A successful mutation evicts every
//! cached query providing a matching tag, so the next call re-fetches.
//! All traffic goes through an [`AuthClient`](crate::AuthClient).

mod api;
mod store;
mod tags;

pub use api::{Api, MutationDef, QueryDef};
pub use store::{DEFAULT_MAX_AGE, QueryCache};
pub use tags::Tag;
