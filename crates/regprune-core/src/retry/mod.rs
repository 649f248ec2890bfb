//! Retry execution engine with policy-based configuration
//!
//! Registry API calls are wrapped in a `RetryExecutor` so transient
//! failures (throttling, 5xx, dropped connections) are absorbed by the
//! transport layer. Pagination and deletion logic above it never retry
//! on their own.
//!
//! # Example
//!
//! ```rust,no_run
//! use regprune_core::retry::{RetryExecutorBuilder, TracingObserver};
//! use regprune_core::types::RetryPolicy;
//!
//! async fn example() {
//!     let executor = RetryExecutorBuilder::new()
//!         .with_policy(RetryPolicy::default())
//!         .with_observer(TracingObserver::new("list-images"))
//!         .build();
//!
//!     let result = executor
//!         .execute(|| async { Ok::<_, std::io::Error>("page") })
//!         .await;
//!     assert!(result.is_ok());
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, TracingObserver};
pub use strategies::{
    calculate_delay, AlwaysRetry, HttpStatusError, HttpStatusPredicate, RetryPredicate,
};
