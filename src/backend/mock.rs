//! Deterministic backend for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{DocBackend, GenerationContext};
use crate::error::BackendError;

/// Scripted responses keyed by item name.
///
/// Lookups try the qualified name (`Parent.name`) before the bare name.
/// Unscripted items get a generic one-line description.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: HashMap<String, String>,
    failures: HashMap<String, BackendError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, name: &str, text: &str) -> Self {
        self.responses.insert(name.to_string(), text.to_string());
        self
    }

    pub fn with_failure(mut self, name: &str, error: BackendError) -> Self {
        self.failures.insert(name.to_string(), error);
        self
    }

    /// Hold each call for `delay`, to observe concurrency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn lookup<'a, T>(map: &'a HashMap<String, T>, ctx: &GenerationContext) -> Option<&'a T> {
        let qualified = ctx.parent.as_ref().map(|p| format!("{}.{}", p, ctx.name));
        qualified
            .and_then(|q| map.get(&q))
            .or_else(|| map.get(&ctx.name))
    }
}

#[async_trait]
impl DocBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, ctx: &GenerationContext) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = Self::lookup(&self.failures, ctx) {
            return Err(error.clone());
        }
        let text = Self::lookup(&self.responses, ctx)
            .cloned()
            .unwrap_or_else(|| format!("Mock documentation for {} `{}`.", ctx.kind, ctx.name));
        Ok(text)
    }
}
