//! Historical snapshot records
//!
//! A snapshot is immutable once accepted; a new year replaces it wholesale.

pub mod fallback;
pub mod model;
pub mod schema;

pub use fallback::{fallback_for, seed_snapshot, FALLBACK_YEAR};
pub use model::{
    Civilization, Government, GraphLink, GraphNode, Interaction, InteractionKind, Person,
    RelationshipGraph, Snapshot, Society,
};
pub use schema::{parse_snapshot, snapshot_from_value, validate_snapshot, SchemaViolation};
