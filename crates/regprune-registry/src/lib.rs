//! Depot registry API client for regprune
//!
//! This crate provides:
//! - The `RegistryApi` trait consumed by the retention engine
//! - `DepotClient`, a reqwest implementation of the Connect JSON endpoints
//! - Normalization of the API's push-time encodings into UTC instants
//!
//! # Example
//!
//! ```no_run
//! use regprune_registry::{DepotClient, RegistryApi};
//! use regprune_core::PageRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DepotClient::new("https://api.depot.dev", std::env::var("DEPOT_TOKEN")?)?;
//!
//!     let page = client
//!         .list_images("abc123", PageRequest { page_size: 100, page_token: None })
//!         .await?;
//!     println!("{} images on first page", page.items.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod wire;

pub use api::RegistryApi;
pub use client::DepotClient;
pub use error::{RegistryError, RegistryRetryPredicate, Result};
pub use wire::PushedAt;

/// Version of the regprune-registry crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
