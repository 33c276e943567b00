use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::collaborators::Collaborators;
use super::completion::{Completion, WriteOp};
use super::stats::SyncStats;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::geo::LatLng;
use crate::marker::{Marker, MarkerId, MarkerStore};
use crate::notify::{Notification, NotificationSink};
use crate::overlay::{Canvas, CanvasEvent, OverlayHandle, OverlayReconciler};
use crate::policy::NetworkPolicy;
use crate::remote::{MarkerRepository, RemoteError};
use crate::route::{RouteChain, RouteChainBuilder, RouteSegment, StaleSegmentPolicy};

/// Remote writes held back while a marker waits for its store-assigned id.
#[derive(Debug, Default)]
struct Deferred {
    moved: bool,
    deleted: bool,
}

/// One user's live map: markers, their overlays, the route chain, and the
/// remote mirror.
///
/// All state is owned here and mutated on the caller's task only. Remote
/// writes and notifications run as spawned Tokio tasks that never touch this
/// state; each reports back one completion, applied at the start of every
/// public operation (or explicitly via [`apply_completions`](Self::apply_completions)
/// and [`settle`](Self::settle)). Local mutations are committed before any
/// remote call is issued and are never rolled back.
///
/// Operations that issue remote calls must run inside a Tokio runtime.
pub struct MapSession<C> {
    store: MarkerStore,
    overlays: OverlayReconciler<C>,
    routes: RouteChainBuilder,
    remote: Arc<dyn MarkerRepository>,
    notifier: Arc<dyn NotificationSink>,
    network: NetworkPolicy,
    stale_segments: StaleSegmentPolicy,
    awaiting_id: HashMap<MarkerId, Deferred>,
    resolved_ids: HashMap<MarkerId, MarkerId>,
    held_notices: Vec<Notification>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    in_flight: usize,
    stats: SyncStats,
    alerts: Vec<SyncError>,
}

impl<C: Canvas> MapSession<C> {
    pub fn new(canvas: C, collaborators: Collaborators, config: &SyncConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let routes = RouteChainBuilder::new(collaborators.router)
            .with_mode(config.travel_mode)
            .with_policy(config.network);

        MapSession {
            store: MarkerStore::with_policy(config.identity),
            overlays: OverlayReconciler::new(canvas),
            routes,
            remote: collaborators.remote,
            notifier: collaborators.notifier,
            network: config.network,
            stale_segments: config.stale_segments,
            awaiting_id: HashMap::new(),
            resolved_ids: HashMap::new(),
            held_notices: Vec::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            stats: SyncStats::default(),
            alerts: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn markers(&self) -> &[Marker] {
        self.store.snapshot()
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn routes(&self) -> &RouteChain {
        self.routes.chain()
    }

    pub fn overlays(&self) -> &OverlayReconciler<C> {
        &self.overlays
    }

    pub fn overlay_of(&self, id: &MarkerId) -> Option<OverlayHandle> {
        self.overlays.handle_for(id)
    }

    pub fn canvas(&self) -> &C {
        self.overlays.canvas()
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        self.overlays.canvas_mut()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Background tasks not yet reported back.
    pub fn pending_writes(&self) -> usize {
        self.in_flight
    }

    /// Markers still waiting for a store-assigned id.
    pub fn awaiting_ids(&self) -> usize {
        self.awaiting_id.len()
    }

    /// Drain non-blocking failure messages for display.
    pub fn take_alerts(&mut self) -> Vec<SyncError> {
        std::mem::take(&mut self.alerts)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Populate the session from the remote store. Records whose id is
    /// already present locally are skipped.
    pub async fn load(&mut self) -> Result<usize, SyncError> {
        self.apply_completions();

        let remote = Arc::clone(&self.remote);
        let records = self
            .network
            .run("list", || remote.list())
            .await
            .map_err(|err| {
                warn!(error = %err, "remote load failed");
                SyncError::RemoteReadFailed(err.to_string())
            })?;

        let mut loaded = 0;
        for record in records {
            match self.store.insert(record.into()) {
                Ok(_) => loaded += 1,
                Err(err) => warn!(error = %err, "skipping remote record"),
            }
        }
        self.overlays.reconcile(self.store.snapshot());
        info!(loaded, "markers loaded from remote store");
        Ok(loaded)
    }

    /// Dispatch a canvas interaction.
    pub fn handle(&mut self, event: CanvasEvent) -> Result<Marker, SyncError> {
        // Handles must resolve against ids as of the latest completion.
        self.apply_completions();

        match event {
            CanvasEvent::Click(at) => self.place_marker(at),
            CanvasEvent::OverlayDragEnd(handle, at) => {
                let id = self.resolve_overlay(handle)?;
                self.move_marker(&id, at)
            }
            CanvasEvent::OverlayActivate(handle) => {
                let id = self.resolve_overlay(handle)?;
                self.remove_marker(&id)
            }
        }
    }

    pub fn place_marker(&mut self, at: LatLng) -> Result<Marker, SyncError> {
        self.apply_completions();

        let marker = self.store.create(at)?;
        self.overlays.reconcile(self.store.snapshot());

        if marker.pending {
            self.awaiting_id
                .insert(marker.id.clone(), Deferred::default());
            self.held_notices.push(Notification::actor_created(&marker));
            self.spawn_assign(marker.id.clone(), at);
        } else {
            self.spawn_write(WriteOp::Create, Some(marker.id.clone()), Some(at));
            self.spawn_notify(Notification::actor_created(&marker));
        }
        Ok(marker)
    }

    /// `id` may be a placeholder that has since been resolved.
    pub fn move_marker(&mut self, id: &MarkerId, at: LatLng) -> Result<Marker, SyncError> {
        self.apply_completions();
        let id = &self.current_id(id);

        let marker = self.store.update_position(id, at)?;
        self.overlays.reconcile(self.store.snapshot());

        match self.awaiting_id.get_mut(id) {
            Some(deferred) => deferred.moved = true,
            None if marker.pending => debug!(id = %id, "marker has no remote id, move kept local"),
            None => self.spawn_write(WriteOp::Update, Some(id.clone()), Some(at)),
        }
        Ok(marker)
    }

    /// `id` may be a placeholder that has since been resolved.
    pub fn remove_marker(&mut self, id: &MarkerId) -> Result<Marker, SyncError> {
        self.apply_completions();
        let id = &self.current_id(id);

        if !self.store.contains(id) {
            return Err(SyncError::NotFound(id.clone()));
        }
        self.overlays.release(id);
        let marker = self.store.delete(id)?;
        self.routes
            .chain_mut()
            .forget_marker(id, self.stale_segments);

        match self.awaiting_id.get_mut(id) {
            Some(deferred) => deferred.deleted = true,
            None if marker.pending => debug!(id = %id, "marker has no remote id, delete kept local"),
            None => self.spawn_write(WriteOp::Delete, Some(id.clone()), None),
        }
        Ok(marker)
    }

    /// Delete every marker, detach every overlay and reset the route chain.
    pub fn clear(&mut self) -> Vec<Marker> {
        self.apply_completions();

        self.overlays.release_all();
        let removed = self.store.delete_all();
        self.routes.chain_mut().clear();

        for marker in &removed {
            if let Some(deferred) = self.awaiting_id.get_mut(&marker.id) {
                deferred.deleted = true;
            }
        }
        self.spawn_write(WriteOp::DeleteAll, None, None);
        removed
    }

    /// Compute the next leg of the route chain and announce it.
    pub async fn compute_next_route(&mut self) -> Result<RouteSegment, SyncError> {
        self.apply_completions();

        let segment = self.routes.compute_next(self.store.snapshot()).await?;

        let notice = Notification::link_created(&segment);
        if self.references_placeholder(&notice) {
            self.held_notices.push(notice);
        } else {
            self.spawn_notify(notice);
        }
        Ok(segment)
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    /// Apply every completion that has already arrived, without waiting.
    pub fn apply_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait until every background task, including follow-ups spawned while
    /// applying completions, has reported back.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => {
                    self.in_flight -= 1;
                    self.apply(completion);
                }
                None => break,
            }
        }
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Assigned {
                placeholder,
                result: Ok(assigned),
            } => self.resolve(placeholder, assigned),
            Completion::Assigned {
                placeholder,
                result: Err(err),
            } => {
                self.awaiting_id.remove(&placeholder);
                self.held_notices.retain(|notice| !notice_mentions(notice, &placeholder));
                self.record_failure(WriteOp::Create, Some(&placeholder), &err);
            }
            Completion::Written {
                operation,
                id,
                result,
            } => match result {
                Ok(()) => {
                    self.stats.writes_confirmed += 1;
                    info!(operation = operation.as_str(), id = ?id, "remote write confirmed");
                }
                Err(RemoteError::NotFound(_)) if operation == WriteOp::Delete => {
                    self.stats.writes_confirmed += 1;
                    debug!(id = ?id, "remote record already gone");
                }
                Err(err) => self.record_failure(operation, id.as_ref(), &err),
            },
            Completion::Notified { event, result } => match result {
                Ok(()) => self.stats.notifications_sent += 1,
                Err(err) => {
                    self.stats.notifications_failed += 1;
                    warn!(event, error = %err, "notification failed");
                    self.alerts.push(SyncError::RemoteWriteFailed {
                        operation: "notify",
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    /// Replace `placeholder` with the store-assigned id everywhere, then
    /// replay whatever the user did to the marker in the meantime.
    fn resolve(&mut self, placeholder: MarkerId, assigned: MarkerId) {
        let deferred = self.awaiting_id.remove(&placeholder).unwrap_or_default();
        self.stats.writes_confirmed += 1;

        if self.store.contains(&placeholder) {
            if let Err(err) = self.store.rename(&placeholder, assigned.clone()) {
                warn!(placeholder = %placeholder, assigned = %assigned, error = %err, "cannot adopt store-assigned id");
                self.alerts.push(err);
                self.held_notices.retain(|notice| !notice_mentions(notice, &placeholder));
                return;
            }
            self.overlays.rename(&placeholder, assigned.clone());
        }
        self.routes.chain_mut().rename(&placeholder, &assigned);
        self.resolved_ids.insert(placeholder.clone(), assigned.clone());
        if deferred.deleted {
            // The marker is gone; nobody should hear it was created.
            self.held_notices.retain(|notice| {
                !matches!(notice, Notification::CreateActor(actor) if actor.id == placeholder)
            });
        }
        for notice in &mut self.held_notices {
            notice.rename_marker(&placeholder, &assigned);
        }
        self.stats.ids_resolved += 1;
        info!(placeholder = %placeholder, assigned = %assigned, "marker id resolved");

        if deferred.deleted || !self.store.contains(&assigned) {
            self.spawn_write(WriteOp::Delete, Some(assigned), None);
        } else if deferred.moved {
            if let Some(at) = self.store.get(&assigned).map(Marker::position) {
                self.spawn_write(WriteOp::Update, Some(assigned), Some(at));
            }
        }

        let (ready, held): (Vec<_>, Vec<_>) = std::mem::take(&mut self.held_notices)
            .into_iter()
            .partition(|notice| !self.references_placeholder(notice));
        self.held_notices = held;
        for notice in ready {
            self.spawn_notify(notice);
        }
    }

    fn record_failure(&mut self, operation: WriteOp, id: Option<&MarkerId>, err: &RemoteError) {
        self.stats.writes_failed += 1;
        warn!(operation = operation.as_str(), id = ?id, error = %err, "remote write failed, local state kept");
        self.alerts.push(SyncError::RemoteWriteFailed {
            operation: operation.as_str(),
            reason: err.to_string(),
        });
    }

    fn current_id(&self, id: &MarkerId) -> MarkerId {
        match self.resolved_ids.get(id) {
            Some(assigned) if !self.store.contains(id) => assigned.clone(),
            _ => id.clone(),
        }
    }

    fn resolve_overlay(&self, handle: OverlayHandle) -> Result<MarkerId, SyncError> {
        self.overlays
            .marker_for(handle)
            .cloned()
            .ok_or(SyncError::UnknownOverlay(handle))
    }

    fn references_placeholder(&self, notice: &Notification) -> bool {
        self.awaiting_id
            .keys()
            .any(|placeholder| notice_mentions(notice, placeholder))
    }

    // ------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn spawn_assign(&mut self, placeholder: MarkerId, at: LatLng) {
        let remote = Arc::clone(&self.remote);
        let policy = self.network;
        self.spawn(async move {
            let result = policy.run("create", || remote.create(None, at)).await;
            Completion::Assigned { placeholder, result }
        });
    }

    fn spawn_write(&mut self, operation: WriteOp, id: Option<MarkerId>, at: Option<LatLng>) {
        let remote = Arc::clone(&self.remote);
        let policy = self.network;
        self.spawn(async move {
            let result = match (operation, id.as_ref(), at) {
                (WriteOp::Create, Some(id), Some(at)) => policy
                    .run("create", || remote.create(Some(id), at))
                    .await
                    .map(|_| ()),
                (WriteOp::Update, Some(id), Some(at)) => {
                    policy.run("update", || remote.update(id, at)).await
                }
                (WriteOp::Delete, Some(id), _) => policy.run("delete", || remote.delete(id)).await,
                (WriteOp::DeleteAll, _, _) => policy
                    .run("delete_all", || remote.delete_all())
                    .await
                    .map(|_| ()),
                _ => Err(RemoteError::Decode(format!(
                    "incomplete {} request",
                    operation.as_str()
                ))),
            };
            Completion::Written {
                operation,
                id,
                result,
            }
        });
    }

    fn spawn_notify(&mut self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        let policy = self.network;
        self.spawn(async move {
            let event = notification.event_name();
            let result = policy.run("notify", || notifier.notify(&notification)).await;
            Completion::Notified { event, result }
        });
    }
}

fn notice_mentions(notice: &Notification, id: &MarkerId) -> bool {
    match notice {
        Notification::CreateActor(actor) => &actor.id == id,
        Notification::CreateLink(link) => {
            link.from_id.as_ref() == Some(id) || link.to_id.as_ref() == Some(id)
        }
    }
}
