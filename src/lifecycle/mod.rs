//! Lifecycle Controller and per-resource state machine

pub mod controller;
pub mod state;

pub use controller::{CreateOutcome, HttpResourceController, UpdateOutcome};
pub use state::{LifecycleState, ManagedResource};
