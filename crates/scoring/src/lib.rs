//! Pure aggregation and scoring over persisted source overviews.
//!
//! Nothing in this crate does I/O: the refresh orchestrator feeds it the
//! freshest overviews it has (fetched this cycle or read back from the
//! store) and persists whatever comes out.

pub mod community;
pub mod health;

pub use community::{aggregate_community, CommunitySnapshot};
pub use health::{compute_health, Normalization, ScoreConfig, Weights};
