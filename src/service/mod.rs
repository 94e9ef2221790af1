//! # Service bridge
//!
//! Everything that talks to the remote mutation service over HTTP.
//!
//! 1. **Mutate**: `POST /api/v1/mutate` through [`HttpMutatorClient`], which
//!    implements the [`MutatorApi`] seam the query cache is generic over.
//! 2. **Health**: [`HealthMonitor`] polls `GET /api/v1/health` on a fixed
//!    interval and publishes a [`ServerStatus`] for display only.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let api = Arc::new(HttpMutatorClient::builder("http://localhost:8080").build());
//! let monitor = HealthMonitor::new(Arc::clone(&api), Duration::from_secs(5));
//! let status = monitor.subscribe();
//! tokio::spawn(monitor.run());
//! ```

pub mod client;
pub mod health;

pub use client::{HttpClientConfig, HttpMutatorClient, HttpMutatorClientBuilder, MutatorApi};
pub use health::{HealthMonitor, ServerStatus};
