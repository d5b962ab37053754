//! # Data Citation Resolver
//!
//! HTTP implementation of the [`Resolver`](data_citation_core::Resolver)
//! contract against the DOI registry.
//!
//! Lookups use DOI content negotiation: `GET {base_url}/{doi}` with
//! `Accept: application/vnd.citationstyles.csl+json`. Responses are classified
//! as follows:
//!
//! | Registry answer                          | Outcome        |
//! |------------------------------------------|----------------|
//! | 200 with a CSL-JSON body                 | `Found`        |
//! | 404, 410, other 4xx                      | `NotFound`     |
//! | 408, 429, 5xx, timeouts, network errors  | `Unavailable`  |
//! | 200 with an unparseable body             | `Unavailable`  |
//!
//! # Example
//!
//! ```no_run
//! use data_citation_core::{Doi, ResolveOutcome, Resolver};
//! use data_citation_resolver::{DoiOrgResolver, ResolverConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = DoiOrgResolver::new(&ResolverConfig::default())?;
//! let doi = Doi::parse("10.1038/nature12373")?;
//!
//! if let ResolveOutcome::Found(artifact) = resolver.resolve(&doi).await {
//!     println!("{}", artifact.formatted);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod csl;
pub mod error;

pub use client::DoiOrgResolver;
pub use config::{CSL_JSON, DEFAULT_BASE_URL, ResolverConfig};
pub use error::ResolverError;
