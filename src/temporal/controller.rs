//! Debounced, cache-first year resolution on the tokio runtime
//!
//! Each request spawns a debounce task. When the window elapses the task
//! checks its token against the state machine; superseded tasks exit
//! quietly. A generator call is never aborted: its result is simply
//! dropped on arrival when a newer request exists.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::SnapshotCache;
use crate::core::calendar::{Year, YearRange};
use crate::core::config::ChronoConfig;
use crate::core::error::Result;
use crate::core::types::Locale;
use crate::llm::generator::{GeneratorError, SnapshotGenerator};
use crate::snapshot::fallback::fallback_for;
use crate::snapshot::model::Snapshot;
use crate::snapshot::schema::snapshot_from_value;
use crate::temporal::state::{ResolveJob, TemporalState, TemporalView, Ticket, Token};

/// Timing knobs for the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalSettings {
    pub range: YearRange,
    pub debounce: Duration,
    pub autoplay_step: i64,
    pub autoplay_interval: Duration,
    pub manual_step: i64,
}

impl TemporalSettings {
    pub fn from_config(config: &ChronoConfig) -> Self {
        Self {
            range: config.year_range(),
            debounce: config.debounce(),
            autoplay_step: config.autoplay_step,
            autoplay_interval: config.autoplay_interval(),
            manual_step: config.manual_step,
        }
    }
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self::from_config(&ChronoConfig::default())
    }
}

/// Where a resolved snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Fallback,
    Generator,
}

struct Inner {
    settings: TemporalSettings,
    cache: Arc<dyn SnapshotCache>,
    generator: Option<Arc<dyn SnapshotGenerator>>,
    state: Mutex<TemporalState>,
    view_tx: watch::Sender<TemporalView>,
    autoplay_task: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the current year and resolves it to a snapshot
#[derive(Clone)]
pub struct TemporalController {
    inner: Arc<Inner>,
}

impl TemporalController {
    pub fn new(
        settings: TemporalSettings,
        cache: Arc<dyn SnapshotCache>,
        generator: Option<Arc<dyn SnapshotGenerator>>,
    ) -> Self {
        Self::with_locale(settings, cache, generator, Locale::default())
    }

    pub fn with_locale(
        settings: TemporalSettings,
        cache: Arc<dyn SnapshotCache>,
        generator: Option<Arc<dyn SnapshotGenerator>>,
        locale: Locale,
    ) -> Self {
        let state = TemporalState::new(settings.range, 0, locale);
        let (view_tx, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                settings,
                cache,
                generator,
                state: Mutex::new(state),
                view_tx,
                autoplay_task: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &TemporalSettings {
        &self.inner.settings
    }

    pub fn has_generator(&self) -> bool {
        self.inner.generator.is_some()
    }

    /// Receive every published view change
    pub fn subscribe(&self) -> watch::Receiver<TemporalView> {
        self.inner.view_tx.subscribe()
    }

    pub fn view(&self) -> TemporalView {
        self.inner.state().view()
    }

    pub fn year(&self) -> Year {
        self.inner.state().year()
    }

    /// User-initiated jump to `year`; stops auto-advance
    pub fn request_year(&self, year: i64) -> Ticket {
        self.stop_autoplay();
        self.inner.schedule(year, false)
    }

    /// Move by `delta` years from the current year; stops auto-advance
    pub fn step_year(&self, delta: i64) -> Ticket {
        let current = self.year() as i64;
        self.request_year(current + delta)
    }

    pub fn next(&self) -> Ticket {
        self.step_year(self.inner.settings.manual_step)
    }

    pub fn previous(&self) -> Ticket {
        self.step_year(-self.inner.settings.manual_step)
    }

    /// Re-resolve the current year, bypassing the cache read
    pub fn refresh(&self) -> Ticket {
        let current = self.year() as i64;
        self.inner.schedule(current, true)
    }

    /// Switch generator language and re-request the current year
    pub fn set_locale(&self, locale: Locale) -> Option<Ticket> {
        let changed = self.inner.state().set_locale(locale);
        if !changed {
            return None;
        }
        let current = self.year() as i64;
        Some(self.inner.schedule(current, false))
    }

    /// Ask the generator for the year a query refers to, then request it
    pub async fn search(&self, query: &str) -> std::result::Result<Ticket, GeneratorError> {
        let generator = self
            .inner
            .generator
            .clone()
            .ok_or_else(|| GeneratorError::Unavailable("no generator configured".into()))?;
        let year = generator.locate_year(query).await?;
        tracing::info!("Search {:?} resolved to year {}", query, year);
        Ok(self.request_year(year as i64))
    }

    pub fn select_civilization(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state();
        state.select(name)?;
        self.inner.publish(&state);
        Ok(())
    }

    pub fn clear_selection(&self) {
        let mut state = self.inner.state();
        state.clear_selection();
        self.inner.publish(&state);
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state().autoplay()
    }

    /// Enable or disable auto-advance
    pub fn set_autoplay(&self, on: bool) {
        if on {
            self.start_autoplay();
        } else {
            self.stop_autoplay();
        }
    }

    pub fn toggle_autoplay(&self) -> bool {
        let on = !self.is_playing();
        self.set_autoplay(on);
        on
    }

    fn start_autoplay(&self) {
        let mut task = self.inner.autoplay();
        if task.is_some() {
            return;
        }

        {
            let mut state = self.inner.state();
            state.set_autoplay(true);
            self.inner.publish(&state);
        }

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move {
            let interval = inner.settings.autoplay_interval;
            loop {
                tokio::time::sleep(interval).await;
                // At the upper bound this keeps requesting the boundary year
                let next = {
                    let state = inner.state();
                    state.range().step(state.year(), inner.settings.autoplay_step)
                };
                tracing::debug!("Auto-advance to {}", next);
                inner.schedule(next as i64, false);
            }
        }));
    }

    fn stop_autoplay(&self) {
        if let Some(handle) = self.inner.autoplay().take() {
            handle.abort();
        }
        let mut state = self.inner.state();
        if state.autoplay() {
            state.set_autoplay(false);
            self.inner.publish(&state);
        }
    }

    /// Tear down: stop timers and make every in-flight result inert
    pub fn shutdown(&self) {
        self.stop_autoplay();
        let mut state = self.inner.state();
        state.invalidate();
        self.inner.publish(&state);
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, TemporalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn autoplay(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.autoplay_task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &TemporalState) {
        self.view_tx.send_replace(state.view());
    }

    /// Record the request and arm its debounce timer
    fn schedule(self: &Arc<Self>, year: i64, force_refresh: bool) -> Ticket {
        let ticket = {
            let mut state = self.state();
            let ticket = state.request(year, force_refresh);
            self.publish(&state);
            ticket
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(inner.settings.debounce).await;
            inner.resolve(ticket.token).await;
        });

        ticket
    }

    async fn resolve(&self, token: Token) {
        let job = {
            let mut state = self.state();
            let Some(job) = state.begin(token) else {
                return;
            };
            self.publish(&state);
            job
        };

        tracing::info!(
            "Resolving year {} (token {}, force_refresh={})",
            job.year,
            job.token,
            job.force_refresh
        );

        let outcome = self.lookup(&job).await;

        // Check, cache write and completion stay under one guard
        let mut state = self.state();
        if !state.is_current(token) {
            tracing::debug!("Discarding stale result for year {} (token {})", job.year, token);
            return;
        }

        let outcome = match outcome {
            Ok((snapshot, source)) => {
                if source != Source::Cache {
                    if let Err(e) = self.cache.put(job.year, &snapshot) {
                        tracing::warn!("Failed to cache year {}: {}", job.year, e);
                    }
                }
                tracing::info!("Year {} resolved from {:?}", job.year, source);
                Ok(snapshot)
            }
            Err(reason) => {
                tracing::warn!("Year {} failed: {}", job.year, reason);
                Err(reason)
            }
        };

        if state.complete(token, outcome) {
            self.publish(&state);
        }
    }

    async fn lookup(
        &self,
        job: &ResolveJob,
    ) -> std::result::Result<(Arc<Snapshot>, Source), GeneratorError> {
        if !job.force_refresh {
            let cache = Arc::clone(&self.cache);
            let year = job.year;
            let cached = tokio::task::spawn_blocking(move || cache.get(year))
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Cache read for year {} aborted: {}", year, e);
                    None
                });
            if let Some(snapshot) = cached {
                return Ok((Arc::new(snapshot), Source::Cache));
            }
            tracing::debug!("Cache miss for year {}", job.year);
        }

        let Some(generator) = self.generator.as_ref() else {
            return match fallback_for(job.year) {
                Some(snapshot) => Ok((Arc::new(snapshot), Source::Fallback)),
                None => Err(GeneratorError::Unavailable(format!(
                    "No local data for year {}; configure an API key",
                    job.year
                ))),
            };
        };

        let raw = generator.generate(job.year, job.locale).await?;
        let snapshot = snapshot_from_value(raw, job.year)
            .map_err(|violation| GeneratorError::Malformed(violation.to_string()))?;

        let unknown = snapshot.unknown_participants();
        if !unknown.is_empty() {
            tracing::debug!("Year {}: unknown participants {:?}", job.year, unknown);
        }
        let dangling = snapshot.relationships.dangling_links().count();
        if dangling > 0 {
            tracing::debug!("Year {}: {} dangling relationship links", job.year, dangling);
        }

        Ok((Arc::new(snapshot), Source::Generator))
    }
}
