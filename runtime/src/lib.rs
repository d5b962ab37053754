//! # Data Citation Runtime
//!
//! The imperative shell around the citation domain: request storage, the
//! asynchronous processor that drives resolutions, and the background sweeper.
//!
//! ## Core Components
//!
//! - **[`RequestStore`]**: owns request records, serializes terminal transitions
//! - **[`CitationProcessor`]**: authorize → validate → persist → resolve in background
//! - **[`Sweeper`]**: times out stale PENDING requests, evicts old terminal ones
//! - **[`retry`]**: exponential backoff for transient resolver failures
//! - **[`metrics`]**: Prometheus counters and the recorder installer
//!
//! ## Example
//!
//! ```ignore
//! use data_citation_runtime::{CitationProcessor, InMemoryRequestStore, ProcessorConfig};
//!
//! let processor = CitationProcessor::new(
//!     gate,
//!     Arc::new(InMemoryRequestStore::new()),
//!     resolver,
//!     Arc::new(SystemClock),
//!     ProcessorConfig::default(),
//! );
//!
//! let submission = processor.submit("10.1038/nature12373", &token).await?;
//! let outcome = processor.poll(submission.request_id, &token).await?;
//! ```

pub mod error;
pub mod health;
pub mod metrics;
pub mod processor;
pub mod retry;
pub mod store;
pub mod sweeper;

pub use error::{ProcessorError, StoreError};
pub use health::{HealthCheck, HealthStatus};
pub use processor::{CitationProcessor, ProcessorConfig, Submission};
pub use retry::RetryPolicy;
pub use store::{InMemoryRequestStore, RequestStore};
pub use sweeper::{SweepConfig, SweepReport, Sweeper};
