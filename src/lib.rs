//! CDNvideo HTTP Resource Reconciler
//!
//! Converts an operator's desired configuration of a CDN HTTP resource into
//! the management API's wire format, drives the resource through its
//! lifecycle and renders what the server reports back in the operator's
//! terms so drift can be detected.

pub mod api;
pub mod codec;
pub mod config;
pub mod convert;
pub mod drift;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod schema;
pub mod state_store;

pub use api::{HttpTransport, Method, OAuthClient, TokenProvider, Transport};
pub use config::ProviderConfig;
pub use convert::{Conversion, Converter, DesiredTree, ObservedTree};
pub use drift::Drift;
pub use error::{CdnError, Result};
pub use lifecycle::{HttpResourceController, LifecycleState, ManagedResource};
pub use model::HttpResource;
pub use schema::{AttrPath, ConversionWarning, Phase};
