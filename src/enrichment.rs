//! Enrichment of a person by first name.
//!
//! One call to [`Enricher::enrich`] fans out to the three lookup services
//! (age, gender, nationality) as independent tokio tasks and merges whatever
//! they return:
//! 1. Spawn the three lookups at once, each bound to the caller's context
//! 2. Join all three handles, one outcome per task
//! 3. Keep successful values, log and drop failures
//!
//! The call itself never fails. If every service is down the result is empty.
use crate::config::Config;
use crate::errors::{AppError, LookupError};
use crate::models::Gender;
use crate::services::{LookupOutcome, LookupService};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline inherited from the originating request.
///
/// Clones share the same token. A lookup bound to the context stops as soon
/// as the token is cancelled or the deadline passes.
#[derive(Debug, Clone)]
pub struct EnrichContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for EnrichContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrichContext {
    /// A context with no deadline that is only done when cancelled.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Sets (or tightens) the deadline. An earlier existing deadline wins.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline has passed.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }

    /// A context that is cancelled with its parent but can also be cancelled
    /// on its own without affecting the parent.
    fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }
}

/// Attributes inferred for a name. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub nationality: Option<String>,
}

impl EnrichmentResult {
    pub fn is_empty(&self) -> bool {
        self.resolved() == 0
    }

    /// Number of attributes that were filled in.
    pub fn resolved(&self) -> usize {
        usize::from(self.age.is_some())
            + usize::from(self.gender.is_some())
            + usize::from(self.nationality.is_some())
    }
}

/// Which of the three lookups an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Age,
    Gender,
    Nationality,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Age => f.write_str("age"),
            LookupKind::Gender => f.write_str("gender"),
            LookupKind::Nationality => f.write_str("nationality"),
        }
    }
}

/// Fans a name out to the three lookup services.
#[derive(Clone)]
pub struct Enricher {
    lookups: LookupService,
}

impl Enricher {
    pub fn new(lookups: LookupService) -> Self {
        Self { lookups }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(LookupService::new(config)?))
    }

    /// Looks up age, gender and nationality for `name` concurrently.
    ///
    /// Returns once all three lookups have finished, or as soon as `ctx` is
    /// done, in which case the unfinished lookups count as failed. Dropping
    /// the returned future cancels every lookup still in flight.
    pub async fn enrich(&self, name: &str, ctx: &EnrichContext) -> EnrichmentResult {
        let started = Instant::now();
        let scope = ctx.child();
        let _in_flight = scope.cancellation_token().drop_guard();

        let age = self.spawn_lookup(name, &scope, |lookups, name| async move {
            lookups.get_age(&name).await
        });
        let gender = self.spawn_lookup(name, &scope, |lookups, name| async move {
            lookups.get_gender(&name).await
        });
        let nationality = self.spawn_lookup(name, &scope, |lookups, name| async move {
            lookups.get_nationality(&name).await
        });

        let (age, gender, nationality) = tokio::join!(age, gender, nationality);

        let result = EnrichmentResult {
            age: settle(LookupKind::Age, name, age),
            gender: settle(LookupKind::Gender, name, gender),
            nationality: settle(LookupKind::Nationality, name, nationality),
        };

        tracing::info!(
            "Enrichment for '{}' finished in {:?}: {}/3 attributes resolved",
            name,
            started.elapsed(),
            result.resolved()
        );

        result
    }

    /// Runs one lookup on its own task. The task yields exactly one outcome:
    /// the lookup's, or `Cancelled` if the context finishes first.
    fn spawn_lookup<T, F, Fut>(
        &self,
        name: &str,
        ctx: &EnrichContext,
        lookup: F,
    ) -> JoinHandle<LookupOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce(LookupService, String) -> Fut,
        Fut: Future<Output = LookupOutcome<T>> + Send + 'static,
    {
        let request = lookup(self.lookups.clone(), name.to_string());
        let ctx = ctx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = ctx.done() => Err(LookupError::Cancelled),
                outcome = request => outcome,
            }
        })
    }
}

/// Reduces a finished lookup task to the value it produced, if any.
fn settle<T>(
    kind: LookupKind,
    name: &str,
    joined: Result<LookupOutcome<T>, JoinError>,
) -> Option<T> {
    match joined {
        Ok(Ok(Some(value))) => Some(value),
        Ok(Ok(None)) => {
            tracing::debug!("No {} available for '{}'", kind, name);
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("{} lookup for '{}' failed: {}", kind, name, e);
            None
        }
        Err(e) => {
            tracing::error!("{} lookup task for '{}' did not complete: {}", kind, name, e);
            None
        }
    }
}
