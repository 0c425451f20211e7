//! Last-issued-wins fetching for the three listings.
//!
//! Each entity kind has one slot. Issuing a request bumps the slot's
//! generation and aborts whatever was in flight; a result is applied only if
//! its generation is still the live one when it lands. The state lock is
//! never held across an await.

use futures::future::{AbortHandle, Abortable, Aborted};
use serde::Serialize;
use spotmap_core::config::LayeredConfig;
use spotmap_core::error::{Result, SpotmapError};
use spotmap_core::models::{
    EntityKind, GeoPoint, ListingSnapshot, LocationId, Page, QueryParams, RemoteQuery,
    WireLocation,
};
use spotmap_geo::{ensure_valid, PointCodec};
use spotmap_store::images::object_paths;
use spotmap_store::ports::{ImageStorage, LocationStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;

use crate::debounce::Debouncer;
use crate::query::build;
use crate::reconcile::{ReconcileConfig, ReconcileReport, ReconciliationFilter};
use crate::state::ListingState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
const DEFAULT_BUCKET: &str = "location-images";

/// Lifecycle of the latest request for a kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching,
    Applied,
    Superseded,
    Failed,
}

/// How a request ended, short of failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Rows were fetched and are now on display
    Applied { rows: usize, total_count: u64, report: ReconcileReport },
    /// The rows on display already answer this query
    Unchanged,
    /// The same query is already in flight
    Pending,
    /// A later request took over before this one finished
    Superseded,
    /// A later keystroke arrived within the debounce window
    Debounced,
}

/// A request that was issued and still has to be finished
#[derive(Debug, Clone)]
pub struct Ticket {
    pub kind: EntityKind,
    pub generation: u64,
    pub query: RemoteQuery,
    pub params: QueryParams,
}

/// Result of registering a request
#[derive(Debug)]
pub enum Begin {
    Issued(Ticket),
    Unchanged,
    Pending,
}

#[derive(Debug)]
struct LiveRequest {
    generation: u64,
    query: RemoteQuery,
    abort: AbortHandle,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    live: Option<LiveRequest>,
    applied: Option<RemoteQuery>,
    phase: FetchPhase,
}

impl Slot {
    fn supersede(&mut self, kind: EntityKind, phase: FetchPhase) {
        if let Some(live) = self.live.take() {
            tracing::debug!(%kind, generation = live.generation, "Superseding in-flight fetch");
            live.abort.abort();
            self.phase = phase;
        }
    }
}

#[derive(Debug)]
struct Inner {
    slots: [Slot; 3],
    state: ListingState,
}

/// Coordinates fetches and mutations against the store of record
pub struct FetchCoordinator {
    store: Arc<dyn LocationStore>,
    images: Arc<dyn ImageStorage>,
    codec: PointCodec,
    filter: ReconciliationFilter,
    debouncer: Debouncer,
    bucket: String,
    inner: Mutex<Inner>,
    cleanups: Mutex<JoinSet<()>>,
}

impl FetchCoordinator {
    pub fn new(store: Arc<dyn LocationStore>, images: Arc<dyn ImageStorage>) -> Self {
        Self {
            store,
            images,
            codec: PointCodec::default(),
            filter: ReconciliationFilter::default(),
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
            bucket: DEFAULT_BUCKET.to_string(),
            inner: Mutex::new(Inner {
                slots: Default::default(),
                state: ListingState::new(DEFAULT_PAGE_SIZE),
            }),
            cleanups: Mutex::new(JoinSet::new()),
        }
    }

    /// Coordinator configured from the layered configuration
    pub fn from_config(
        store: Arc<dyn LocationStore>,
        images: Arc<dyn ImageStorage>,
        config: &LayeredConfig,
    ) -> Self {
        Self::new(store, images)
            .with_page_size(config.page_size.value)
            .with_debounce(config.debounce())
            .with_codec(PointCodec::new(config.srid.value))
            .with_reconcile(ReconcileConfig::from_config(config))
            .with_bucket(config.image_bucket.value.clone())
    }

    pub fn with_page_size(self, page_size: u32) -> Self {
        self.lock().state = ListingState::new(page_size);
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debouncer = Debouncer::new(window);
        self
    }

    pub fn with_codec(mut self, codec: PointCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_reconcile(mut self, config: ReconcileConfig) -> Self {
        self.filter = ReconciliationFilter::new(config);
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn codec(&self) -> &PointCodec {
        &self.codec
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the listing state without cloning it
    pub fn with_state<R>(&self, read: impl FnOnce(&ListingState) -> R) -> R {
        read(&self.lock().state)
    }

    pub fn state(&self) -> ListingState {
        self.lock().state.clone()
    }

    pub fn snapshot(&self, kind: EntityKind) -> Option<ListingSnapshot> {
        self.with_state(|state| state.snapshot(kind).cloned())
    }

    pub fn phase(&self, kind: EntityKind) -> FetchPhase {
        self.lock().slots[kind.index()].phase
    }

    /// Register a request; the caller fetches only when a ticket is issued
    pub fn begin(&self, params: QueryParams, abort: AbortHandle) -> Result<Begin> {
        self.begin_inner(params, abort, false)
    }

    fn begin_inner(&self, params: QueryParams, abort: AbortHandle, force: bool) -> Result<Begin> {
        let mut inner = self.lock();
        let params = inner.state.reset_carried_page(params);
        params.validate()?;
        let query = build(&params);
        let kind = params.kind;

        if inner.state.select(params.clone()) {
            for other in EntityKind::ALL.into_iter().filter(|k| *k != kind) {
                let slot = &mut inner.slots[other.index()];
                slot.supersede(other, FetchPhase::Superseded);
                slot.applied = None;
            }
        }

        let slot = &mut inner.slots[kind.index()];
        if !force {
            if slot.live.as_ref().is_some_and(|live| live.query == query) {
                tracing::trace!(%kind, "Same query already in flight");
                return Ok(Begin::Pending);
            }
            if slot.applied.as_ref() == Some(&query) {
                slot.supersede(kind, FetchPhase::Applied);
                tracing::trace!(%kind, "Rows on display already answer this query");
                return Ok(Begin::Unchanged);
            }
        }

        slot.supersede(kind, FetchPhase::Superseded);
        slot.generation += 1;
        slot.live = Some(LiveRequest { generation: slot.generation, query: query.clone(), abort });
        slot.phase = FetchPhase::Fetching;
        tracing::debug!(%kind, generation = slot.generation, page = params.page, "Issuing fetch");

        Ok(Begin::Issued(Ticket { kind, generation: slot.generation, query, params }))
    }

    /// Settle an issued request; results of overtaken requests are dropped
    pub fn finish(&self, ticket: Ticket, result: Result<Page>) -> Result<FetchOutcome> {
        let mut inner = self.lock();
        let Inner { slots, state } = &mut *inner;
        let slot = &mut slots[ticket.kind.index()];

        let is_live = slot.live.as_ref().is_some_and(|live| live.generation == ticket.generation);
        if !is_live {
            tracing::debug!(
                kind = %ticket.kind,
                generation = ticket.generation,
                latest = slot.generation,
                "Discarding result of a superseded fetch"
            );
            return Ok(FetchOutcome::Superseded);
        }
        slot.live = None;

        match result {
            Ok(page) => {
                let (rows, report) = self.filter.filter_with_report(page.rows);
                let outcome = FetchOutcome::Applied {
                    rows: rows.len(),
                    total_count: page.total_count,
                    report,
                };
                state.apply(ListingSnapshot {
                    rows,
                    total_count: page.total_count,
                    params: ticket.params,
                });
                slot.applied = Some(ticket.query);
                slot.phase = FetchPhase::Applied;
                tracing::debug!(kind = %ticket.kind, generation = ticket.generation, "Applied fetch");
                Ok(outcome)
            }
            Err(e) => {
                slot.phase = FetchPhase::Failed;
                tracing::warn!(
                    kind = %ticket.kind,
                    generation = ticket.generation,
                    error = %e,
                    "Fetch failed, keeping previous rows"
                );
                Err(e)
            }
        }
    }

    /// Fetch the rows for `params` unless they are already shown or pending.
    ///
    /// Searches still waiting out their debounce window are dropped: this
    /// request is the later intent.
    pub async fn request(&self, params: QueryParams) -> Result<FetchOutcome> {
        for kind in EntityKind::ALL {
            self.debouncer.cancel(kind);
        }
        self.run(params, false).await
    }

    /// Re-fetch the current params of a kind, even if nothing changed
    pub async fn refresh(&self, kind: EntityKind) -> Result<FetchOutcome> {
        let params = self.with_state(|state| state.params(kind).clone());
        self.run(params, true).await
    }

    /// Debounced request, for search text typed a character at a time
    pub async fn search(&self, params: QueryParams) -> Result<FetchOutcome> {
        match self.debouncer.debounce(params.kind, params).await {
            Some(params) => self.run(params, false).await,
            None => Ok(FetchOutcome::Debounced),
        }
    }

    async fn run(&self, params: QueryParams, force: bool) -> Result<FetchOutcome> {
        let (abort, registration) = AbortHandle::new_pair();
        let ticket = match self.begin_inner(params, abort, force)? {
            Begin::Issued(ticket) => ticket,
            Begin::Unchanged => return Ok(FetchOutcome::Unchanged),
            Begin::Pending => return Ok(FetchOutcome::Pending),
        };

        let kind = ticket.kind;
        let fetched = Abortable::new(self.store.fetch_page(&ticket.query), registration).await;
        match fetched {
            Ok(result) => {
                let result = result.map_err(|e| match e {
                    SpotmapError::Fetch { .. } => e,
                    other => SpotmapError::fetch(kind, other),
                });
                self.finish(ticket, result)
            }
            Err(Aborted) => {
                tracing::debug!(%kind, generation = ticket.generation, "Fetch aborted");
                Ok(FetchOutcome::Superseded)
            }
        }
    }

    /// Flip availability on screen first, then in the store.
    ///
    /// When the store rejects the write the listing is re-fetched so the
    /// displayed value matches the store again, and the error is returned.
    pub async fn toggle_availability(
        &self,
        kind: EntityKind,
        id: &LocationId,
        available: bool,
    ) -> Result<()> {
        let previous = self.lock().state.set_row_availability(kind, id, available);
        tracing::debug!(%kind, %id, available, ?previous, "Toggling availability");

        match self.store.set_availability(kind, id, available).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(%kind, %id, error = %e, "Availability update failed, re-fetching");
                if let Err(refetch) = self.refresh(kind).await {
                    tracing::warn!(%kind, error = %refetch, "Re-fetch after failed toggle failed");
                    // Nothing newer was confirmed; put back the value shown before
                    if let Some(previous) = previous {
                        self.lock().state.set_row_availability(kind, id, previous);
                    }
                }
                Err(e)
            }
        }
    }

    /// Delete a row, schedule removal of its images, and re-fetch.
    ///
    /// Image removal runs in the background; its failure is only logged.
    pub async fn delete(&self, kind: EntityKind, id: &LocationId) -> Result<WireLocation> {
        let deleted = self
            .store
            .delete_location(kind, id)
            .await?
            .ok_or_else(|| SpotmapError::NotFound { kind, id: id.to_string() })?;

        let paths = object_paths(&deleted.images, &self.bucket);
        if !paths.is_empty() {
            let images = Arc::clone(&self.images);
            let id = id.clone();
            let mut cleanups = self.cleanups.lock().unwrap_or_else(PoisonError::into_inner);
            while cleanups.try_join_next().is_some() {}
            cleanups.spawn(async move {
                match images.remove(&paths).await {
                    Ok(()) => tracing::debug!(%kind, %id, count = paths.len(), "Removed images"),
                    Err(e) => tracing::warn!(%kind, %id, error = %e, "Image cleanup failed"),
                }
            });
        }

        if let Err(e) = self.refresh(kind).await {
            tracing::warn!(%kind, error = %e, "Re-fetch after delete failed");
        }
        Ok(deleted)
    }

    /// Wait for scheduled image removals, e.g. before the runtime shuts down
    pub async fn settle_cleanups(&self) {
        let mut pending = {
            let mut cleanups = self.cleanups.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *cleanups)
        };
        while pending.join_next().await.is_some() {}
    }

    /// Validate, encode and write a new point, then re-fetch
    pub async fn update_location(
        &self,
        kind: EntityKind,
        id: &LocationId,
        point: GeoPoint,
    ) -> Result<FetchOutcome> {
        ensure_valid(&point)?;
        let literal = self.codec.encode(&point);
        self.store.update_point(kind, id, &literal).await?;
        tracing::debug!(%kind, %id, %literal, "Location updated");
        self.refresh(kind).await
    }
}
