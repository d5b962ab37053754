//! Scripted resolver.

use async_trait::async_trait;
use data_citation_core::doi::normalize;
use data_citation_core::{
    CitationArtifact, CitationMetadata, Creator, Doi, ResolveOutcome, Resolver,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// One scripted registry answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Found, with [`ScriptedResolver::sample_metadata`].
    Found,
    /// Found, with the given metadata.
    FoundWith(CitationMetadata),
    /// Not registered.
    NotFound,
    /// Transient failure.
    Unavailable,
}

impl Answer {
    fn into_outcome(self, doi: &Doi) -> ResolveOutcome {
        match self {
            Self::Found => ResolveOutcome::Found(CitationArtifact::new(
                doi.clone(),
                ScriptedResolver::sample_metadata(doi),
            )),
            Self::FoundWith(metadata) => {
                ResolveOutcome::Found(CitationArtifact::new(doi.clone(), metadata))
            }
            Self::NotFound => ResolveOutcome::NotFound,
            Self::Unavailable => ResolveOutcome::Unavailable("scripted outage".to_string()),
        }
    }
}

/// In-memory [`Resolver`] answering from per-DOI scripts.
///
/// Each DOI has a queue of answers consumed one per call; the last answer
/// repeats once the queue is down to one entry. Unscripted DOIs get the
/// fallback answer (`NotFound` unless changed).
///
/// # Example
///
/// ```
/// use data_citation_testing::resolver::{Answer, ScriptedResolver};
///
/// let resolver = ScriptedResolver::new()
///     .with_answers("10.1000/flaky", [Answer::Unavailable, Answer::Found]);
/// assert_eq!(resolver.calls("10.1000/flaky"), 0);
/// ```
#[derive(Debug)]
pub struct ScriptedResolver {
    scripts: Mutex<HashMap<String, VecDeque<Answer>>>,
    calls: Mutex<HashMap<String, usize>>,
    fallback: Answer,
    delay: Option<Duration>,
    hold: Option<Arc<Semaphore>>,
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedResolver {
    /// Resolver that answers `NotFound` for everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            fallback: Answer::NotFound,
            delay: None,
            hold: None,
        }
    }

    /// Script the answers for one DOI.
    #[must_use]
    pub fn with_answers(self, doi: &str, answers: impl IntoIterator<Item = Answer>) -> Self {
        self.script(doi, answers);
        self
    }

    /// Answer for DOIs without a script.
    #[must_use]
    pub fn with_fallback(mut self, answer: Answer) -> Self {
        self.fallback = answer;
        self
    }

    /// Sleep before every answer.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block every call until [`release`](Self::release) lets it through.
    #[must_use]
    pub fn held(mut self) -> Self {
        self.hold = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(n);
        }
    }

    /// Replace the script for one DOI.
    pub fn script(&self, doi: &str, answers: impl IntoIterator<Item = Answer>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize(doi).to_string(), answers.into_iter().collect());
    }

    /// Number of `resolve` calls made for `doi`.
    #[must_use]
    pub fn calls(&self, doi: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(normalize(doi))
            .copied()
            .unwrap_or(0)
    }

    /// Number of `resolve` calls across all DOIs.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// Deterministic metadata for [`Answer::Found`].
    #[must_use]
    pub fn sample_metadata(doi: &Doi) -> CitationMetadata {
        CitationMetadata {
            title: Some(format!("Dataset {}", doi.suffix())),
            creators: vec![Creator::person("Doe", "Jane")],
            publisher: Some("Test Data Centre".to_string()),
            publication_year: Some(2024),
            resource_type: Some("dataset".to_string()),
            url: None,
        }
    }

    fn next_answer(&self, doi: &Doi) -> Answer {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        match scripts.get_mut(doi.as_str()) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Answer::NotFound),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| self.fallback.clone()),
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, doi: &Doi) -> ResolveOutcome {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(doi.as_str().to_string())
            .or_default() += 1;

        if let Some(hold) = &self.hold {
            if let Ok(permit) = hold.acquire().await {
                permit.forget();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_answer(doi).into_outcome(doi)
    }
}
