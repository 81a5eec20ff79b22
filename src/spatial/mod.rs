//! Map-plane geometry: projection and interaction arcs

pub mod projection;
pub mod route;

pub use projection::{GeoProjector, ProjectionKind, ProjectorConfig};
pub use route::{great_circle_km, ArcPath, InteractionRouter, RoutedInteraction};
