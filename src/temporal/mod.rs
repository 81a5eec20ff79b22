//! Current-year orchestration: debounce, cache-first lookup, supersession

pub mod controller;
pub mod state;

pub use controller::{TemporalController, TemporalSettings};
pub use state::{Phase, ResolveJob, TemporalState, TemporalView, Ticket, Token};
