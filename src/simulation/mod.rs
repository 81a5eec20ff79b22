//! Force-directed layout of the relationship graph

pub mod forces;
pub mod layout;
pub mod runner;

pub use forces::{step, ForceConfig, ForceModel, LayoutState, Spring};
pub use layout::{GraphLayout, LayoutFrame, LayoutSeed, Simulation};
pub use runner::{LayoutRunner, PublishedFrame};
