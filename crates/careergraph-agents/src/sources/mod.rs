//! Typed clients for the external data sources. Every client degrades to
//! "no data" on missing credentials, network failure, non-2xx responses, or
//! empty results; callers hold the fallback tables.

pub mod bls;
pub mod scorecard;
pub mod search;

pub use bls::BlsClient;
pub use scorecard::{CollegeCosts, ScorecardClient};
pub use search::{SearchClient, SearchResult};
