//! Router - provider adapter seam and task routing
//!
//! This module defines the adapter trait and capability flags, the static
//! task → model table, and the router that dispatches uniform requests to
//! registered adapters.
//!
//! # Module Structure
//!
//! - `types`: Core types (AiTask, ProviderKind)
//! - `table`: Task → model table and model → provider mapping
//! - `config`: Router configuration
//! - `provider`: ProviderAdapter trait and Capabilities
//! - `mock`: Mock adapter for testing
//! - `router_impl`: AiRouter implementation
//! - `builder`: Environment bootstrap

mod builder;
mod config;
mod mock;
mod provider;
mod router_impl;
mod table;
mod types;

#[cfg(test)]
mod tests;

pub use builder::RouterBuilder;
pub use config::{RouterConfig, DEFAULT_FALLBACK_MODEL};
pub use mock::{MockAdapter, DEFAULT_MOCK_CONTENT};
pub use provider::{Capabilities, ProviderAdapter};
pub use router_impl::AiRouter;
pub use table::{provider_for_model, RouteTable};
pub use types::{AiTask, ProviderKind};
