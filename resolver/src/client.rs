//! doi.org registry client.

use crate::config::{CSL_JSON, ResolverConfig};
use crate::csl::CslItem;
use crate::error::ResolverError;
use async_trait::async_trait;
use data_citation_core::{CitationArtifact, Doi, ResolveOutcome, Resolver};
use reqwest::{Client, StatusCode, Url, header};

/// Resolves DOIs through the registry's content negotiation endpoint.
#[derive(Debug, Clone)]
pub struct DoiOrgResolver {
    client: Client,
    base_url: Url,
}

impl DoiOrgResolver {
    /// Create a resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidBaseUrl`] for unparseable or
    /// non-hierarchical base URLs and [`ResolverError::Client`] if the HTTP
    /// client cannot be built.
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolverError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ResolverError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ResolverError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ResolverError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// URL of the registry record for `doi`. Each DOI path segment is
    /// percent-encoded so `?` and `#` in suffixes stay in the path.
    fn record_url(&self, doi: &Doi) -> Result<Url, ResolverError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ResolverError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(doi.as_str().split('/'));
        Ok(url)
    }

    /// Fetch and parse the registry record for `doi`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NotRegistered`] when the registry answers that
    /// the identifier does not exist, and a retryable variant for everything
    /// else that went wrong.
    pub async fn fetch(&self, doi: &Doi) -> Result<CitationArtifact, ResolverError> {
        let url = self.record_url(doi)?;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, CSL_JSON)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolverError::Timeout
                } else {
                    ResolverError::RequestFailed(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                let item = response.json::<CslItem>().await.map_err(|e| {
                    if e.is_timeout() {
                        ResolverError::Timeout
                    } else {
                        ResolverError::ResponseParseFailed(e.to_string())
                    }
                })?;
                Ok(CitationArtifact::new(doi.clone(), item.into_metadata()))
            }
            StatusCode::NOT_ACCEPTABLE => Err(ResolverError::UnsupportedFormat),
            StatusCode::TOO_MANY_REQUESTS => Err(ResolverError::RateLimited),
            StatusCode::REQUEST_TIMEOUT => Err(ResolverError::Upstream {
                status: StatusCode::REQUEST_TIMEOUT.as_u16(),
            }),
            status if status.is_client_error() => Err(ResolverError::NotRegistered {
                status: status.as_u16(),
            }),
            status => Err(ResolverError::Upstream {
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl Resolver for DoiOrgResolver {
    async fn resolve(&self, doi: &Doi) -> ResolveOutcome {
        match self.fetch(doi).await {
            Ok(artifact) => {
                tracing::debug!(doi = %doi, "DOI resolved");
                ResolveOutcome::Found(artifact)
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(doi = %doi, error = %err, "DOI not registered");
                ResolveOutcome::NotFound
            }
            Err(err) => {
                tracing::warn!(doi = %doi, error = %err, "Registry lookup failed");
                ResolveOutcome::Unavailable(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn resolver(base: &str) -> DoiOrgResolver {
        DoiOrgResolver::new(&ResolverConfig::new(base)).unwrap()
    }

    #[test]
    fn test_record_url_keeps_doi_path() {
        let doi = Doi::parse("10.1000/abc/def").unwrap();
        assert_eq!(
            resolver("https://doi.org").record_url(&doi).unwrap().as_str(),
            "https://doi.org/10.1000/abc/def"
        );
        assert_eq!(
            resolver("http://localhost:8080/registry/").record_url(&doi).unwrap().as_str(),
            "http://localhost:8080/registry/10.1000/abc/def"
        );
    }

    #[test]
    fn test_record_url_encodes_reserved_characters() {
        let doi = Doi::parse("10.1000/a?b#c").unwrap();
        let url = resolver("https://doi.org").record_url(&doi).unwrap();
        assert_eq!(url.path(), "/10.1000/a%3Fb%23c");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            DoiOrgResolver::new(&ResolverConfig::new("not a url")),
            Err(ResolverError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            DoiOrgResolver::new(&ResolverConfig::new("mailto:registry@example.org")),
            Err(ResolverError::InvalidBaseUrl(_))
        ));
    }
}
