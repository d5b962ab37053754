//! # Data Citation Core
//!
//! Domain types and pure logic for the Data Citation request service.
//!
//! ## Core Concepts
//!
//! - **DOI validation**: structural checks, no network ([`doi`])
//! - **Citation request**: lifecycle record with a single `Pending -> terminal`
//!   transition ([`request`])
//! - **Citation artifact**: metadata plus rendered citation text ([`citation`])
//! - **Resolver**: contract for the external registry lookup ([`resolver`])
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: transitions are pure functions here,
//!   stores and processors in the runtime crate only serialize and schedule them
//! - Dependency Injection via traits

pub mod citation;
pub mod doi;
pub mod environment;
pub mod request;
pub mod resolver;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use citation::{CitationArtifact, CitationMetadata, Creator};
pub use doi::{Doi, InvalidDoi, ValidationResult, validate};
pub use environment::{Clock, SystemClock};
pub use request::{
    AlreadyTerminal, CitationRequest, FailureReason, PollOutcome, RequestId, RequestState,
    StateKind, TerminalOutcome, UserId,
};
pub use resolver::{ResolveOutcome, Resolver};
