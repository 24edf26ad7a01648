use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join;
use shared::{
    domain::{CollectionKind, Item, ItemId},
    protocol::{ItemPage, PageQuery},
};
use tokio::{
    runtime::Handle,
    sync::{broadcast, Mutex},
};
use tracing::{debug, error, info, warn};

pub mod collection;
pub mod debounce;
pub mod error;
pub mod reorder;
mod selection_cache;
pub mod transport;
pub mod viewport;

pub use collection::{CollectionView, LoadMode, PanelStats};
pub use error::{parse_item_id, CreateItemError};
pub use selection_cache::{DurableSelectionCache, InMemorySelectionCache, SNAPSHOT_KEY};
pub use viewport::{LoadMoreTrigger, VisibleRange};

use collection::{LoadTicket, PagedCollection};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[async_trait]
pub trait ItemsTransport: Send + Sync {
    async fn fetch_page(&self, collection: CollectionKind, query: PageQuery) -> Result<ItemPage>;
    async fn add_to_selection(&self, id: ItemId) -> Result<()>;
    async fn remove_from_selection(&self, id: ItemId) -> Result<()>;
    async fn set_order(&self, ids: &[ItemId]) -> Result<()>;
    async fn create_item(&self, id: ItemId) -> Result<Item>;
}

/// Best-effort local record of the selected ids. Failures are logged by the
/// reconciler and never reach command callers.
#[async_trait]
pub trait SelectionCache: Send + Sync {
    async fn save(&self, ids: &[ItemId]) -> Result<()>;
    async fn load(&self) -> Result<Option<Vec<ItemId>>>;
}

#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    pub page_size: u64,
    pub load_more_threshold: usize,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            load_more_threshold: viewport::DEFAULT_LOAD_MORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    LoadPage(CollectionKind),
    Select(ItemId),
    Unselect(ItemId),
    Reorder,
    CreateItem(ItemId),
}

#[derive(Debug, Clone)]
pub enum ReconcilerEvent {
    CollectionChanged(CollectionView),
    OperationFailed {
        operation: Operation,
        message: String,
    },
    SnapshotPersisted {
        selected: usize,
    },
    CachedSelectionLoaded(Vec<ItemId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// Not issued: already loading, nothing loaded yet, or nothing left.
    Skipped,
    /// Issued, but a newer reset superseded it before it resolved.
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum MutationOutcome {
    Applied,
    /// The drop did not change the order.
    Unchanged,
    AlreadySelected,
    NotSelected,
    /// The id is not in the materialized window, or the selection has not
    /// been loaded yet.
    NotLoaded,
    /// A reorder that is not a permutation of the loaded selection.
    InvalidOrder,
    /// Another select/unselect for the same id is still in flight.
    Busy,
    /// The server refused; local state was put back.
    RolledBack,
    /// The server refused a reorder; the selection was reloaded instead.
    Reloaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSnapshot {
    pub universe: CollectionView,
    pub selection: CollectionView,
    pub pending: Vec<ItemId>,
}

impl BrowserSnapshot {
    pub fn view(&self, kind: CollectionKind) -> &CollectionView {
        match kind {
            CollectionKind::Universe => &self.universe,
            CollectionKind::Selection => &self.selection,
        }
    }
}

struct ReconcilerState {
    universe: PagedCollection,
    selection: PagedCollection,
    all_selected_total: u64,
    pending: BTreeSet<ItemId>,
}

impl ReconcilerState {
    fn new() -> Self {
        Self {
            universe: PagedCollection::new(CollectionKind::Universe),
            selection: PagedCollection::new(CollectionKind::Selection),
            all_selected_total: 0,
            pending: BTreeSet::new(),
        }
    }

    fn collection(&self, kind: CollectionKind) -> &PagedCollection {
        match kind {
            CollectionKind::Universe => &self.universe,
            CollectionKind::Selection => &self.selection,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> &mut PagedCollection {
        match kind {
            CollectionKind::Universe => &mut self.universe,
            CollectionKind::Selection => &mut self.selection,
        }
    }

    fn view(&self, kind: CollectionKind) -> CollectionView {
        let all_selected_total =
            (kind == CollectionKind::Selection).then_some(self.all_selected_total);
        self.collection(kind).view(all_selected_total)
    }

    fn snapshot(&self) -> BrowserSnapshot {
        BrowserSnapshot {
            universe: self.view(CollectionKind::Universe),
            selection: self.view(CollectionKind::Selection),
            pending: self.pending.iter().copied().collect(),
        }
    }

    /// Undoes an optimistic move. A side is restored exactly only if no
    /// server page has landed on it since; otherwise the server's counts are
    /// authoritative and only the optimistic entry is dropped.
    fn rollback(&mut self, undo: &OptimisticMove) {
        let target = self.collection_mut(undo.to);
        let target_exact = target.revision() == undo.target_revision;
        if target_exact {
            target.remove_prepended(undo.item.id);
            if undo.target_was_unloaded && target.items().is_some_and(<[Item]>::is_empty) {
                target.mark_unloaded();
            }
        } else {
            target.discard_item(undo.item.id);
        }

        let source = self.collection_mut(undo.from);
        let source_exact = source.revision() == undo.source_revision;
        if source_exact && !source.contains(undo.item.id) {
            source.insert_item(undo.removed_at, undo.item.clone());
        }

        let selection_exact = match undo.to {
            CollectionKind::Selection => target_exact,
            CollectionKind::Universe => source_exact,
        };
        if selection_exact {
            self.all_selected_total = match undo.to {
                CollectionKind::Selection => self.all_selected_total.saturating_sub(1),
                CollectionKind::Universe => self.all_selected_total + 1,
            };
        }
    }
}

#[derive(Default)]
struct CachedSelection {
    read: bool,
    ids: Option<Vec<ItemId>>,
}

struct OptimisticMove {
    item: Item,
    from: CollectionKind,
    to: CollectionKind,
    removed_at: usize,
    source_revision: u64,
    target_revision: u64,
    target_was_unloaded: bool,
}

/// Owns the universe and selection panels and keeps them consistent while
/// page loads and optimistic selection changes overlap.
pub struct SelectionReconciler {
    transport: Arc<dyn ItemsTransport>,
    cache: Arc<dyn SelectionCache>,
    options: ReconcilerOptions,
    state: Mutex<ReconcilerState>,
    events: broadcast::Sender<ReconcilerEvent>,
    cached_selection: Mutex<CachedSelection>,
    persist_seq: AtomicU64,
    persisted_seq: Arc<Mutex<u64>>,
}

impl SelectionReconciler {
    pub fn new(transport: Arc<dyn ItemsTransport>) -> Arc<Self> {
        Self::new_with_dependencies(
            transport,
            Arc::new(InMemorySelectionCache::default()),
            ReconcilerOptions::default(),
        )
    }

    pub fn new_with_dependencies(
        transport: Arc<dyn ItemsTransport>,
        cache: Arc<dyn SelectionCache>,
        options: ReconcilerOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        let reconciler = Arc::new(Self {
            transport,
            cache,
            options,
            state: Mutex::new(ReconcilerState::new()),
            events,
            cached_selection: Mutex::new(CachedSelection::default()),
            persist_seq: AtomicU64::new(0),
            persisted_seq: Arc::new(Mutex::new(0)),
        });

        // Without a runtime the first cached_selection() or initialize() call
        // does the read instead.
        if let Ok(runtime) = Handle::try_current() {
            let weak = Arc::downgrade(&reconciler);
            runtime.spawn(async move {
                if let Some(reconciler) = weak.upgrade() {
                    reconciler.cached_selection().await;
                }
            });
        }
        reconciler
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReconcilerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> BrowserSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn view(&self, kind: CollectionKind) -> CollectionView {
        self.state.lock().await.view(kind)
    }

    pub async fn panel_stats(&self, kind: CollectionKind) -> PanelStats {
        self.view(kind).await.stats()
    }

    pub async fn has_more(&self, kind: CollectionKind) -> bool {
        self.state.lock().await.collection(kind).has_more()
    }

    pub async fn is_selected(&self, id: ItemId) -> bool {
        self.state.lock().await.selection.contains(id)
    }

    /// Ids found in the local cache when the reconciler was built. The cache
    /// is read once; this waits for that read if it is still running.
    /// Informational only.
    pub async fn cached_selection(&self) -> Option<Vec<ItemId>> {
        let mut cached = self.cached_selection.lock().await;
        if !cached.read {
            cached.read = true;
            match self.cache.load().await {
                Ok(Some(ids)) => {
                    info!(selected = ids.len(), "selection: cached snapshot loaded");
                    let _ = self
                        .events
                        .send(ReconcilerEvent::CachedSelectionLoaded(ids.clone()));
                    cached.ids = Some(ids);
                }
                Ok(None) => {}
                Err(err) => warn!("selection: failed to read cached snapshot: {err:#}"),
            }
        }
        cached.ids.clone()
    }

    pub async fn initialize(&self) {
        self.cached_selection().await;

        let (universe, selection) = join(
            self.load_page(CollectionKind::Universe, LoadMode::Reset),
            self.load_page(CollectionKind::Selection, LoadMode::Reset),
        )
        .await;
        debug!(?universe, ?selection, "pager: initial load finished");
    }

    pub async fn load_page(&self, kind: CollectionKind, mode: LoadMode) -> LoadOutcome {
        let (ticket, view) = {
            let mut state = self.state.lock().await;
            let Some(ticket) = state
                .collection_mut(kind)
                .begin_load(mode, self.options.page_size)
            else {
                debug!(collection = %kind, "pager: load already in flight; skipping");
                return LoadOutcome::Skipped;
            };
            (ticket, state.view(kind))
        };
        self.emit_view(view);
        self.run_load(kind, ticket).await
    }

    pub async fn set_filter(&self, kind: CollectionKind, filter: impl Into<String>) -> LoadOutcome {
        let filter = filter.into();
        let (ticket, view) = {
            let mut state = self.state.lock().await;
            let collection = state.collection_mut(kind);
            collection.set_filter(filter.clone());
            let Some(ticket) = collection.begin_load(LoadMode::Reset, self.options.page_size)
            else {
                return LoadOutcome::Skipped;
            };
            (ticket, state.view(kind))
        };
        info!(collection = %kind, filter = %filter, generation = ticket.generation, "pager: filter changed");
        self.emit_view(view);
        self.run_load(kind, ticket).await
    }

    pub async fn load_more(&self, kind: CollectionKind) -> LoadOutcome {
        {
            let state = self.state.lock().await;
            let collection = state.collection(kind);
            if collection.is_loading() || !collection.has_more() {
                return LoadOutcome::Skipped;
            }
        }
        self.load_page(kind, LoadMode::Append).await
    }

    /// Called by a virtualized list whenever its rendered rows change.
    pub async fn on_visible_range_changed(
        &self,
        kind: CollectionKind,
        range: VisibleRange,
    ) -> LoadOutcome {
        let should_load = {
            let state = self.state.lock().await;
            let collection = state.collection(kind);
            let row_count = collection.items().map_or(0, <[Item]>::len);
            LoadMoreTrigger::new(self.options.load_more_threshold).should_load_more(
                range,
                row_count,
                collection.has_more(),
                collection.is_loading(),
            )
        };
        if !should_load {
            return LoadOutcome::Skipped;
        }
        self.load_more(kind).await
    }

    async fn run_load(&self, kind: CollectionKind, ticket: LoadTicket) -> LoadOutcome {
        let result = self
            .transport
            .fetch_page(kind, ticket.query.clone())
            .await;

        let mut state = self.state.lock().await;
        if !state.collection(kind).is_current(&ticket) {
            debug!(
                collection = %kind,
                generation = ticket.generation,
                current = state.collection(kind).generation(),
                "pager: discarding superseded response"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let selected_ids = page.selected_ids.clone();
                // Ids mid-move that already sit in the other panel stay there
                // until the server confirms or we roll back.
                let moved_away: BTreeSet<ItemId> = state
                    .pending
                    .iter()
                    .copied()
                    .filter(|id| state.collection(kind.other()).contains(*id))
                    .collect();
                let skipped = state
                    .collection_mut(kind)
                    .apply_page(&ticket, page, |id| moved_away.contains(&id));
                if kind == CollectionKind::Selection {
                    if let Some(ids) = selected_ids {
                        state.all_selected_total = ids.len() as u64;
                    }
                }
                let view = state.view(kind);
                drop(state);
                debug!(
                    collection = %kind,
                    offset = view.offset,
                    total = view.total,
                    loaded = view.loaded_count(),
                    skipped,
                    "pager: page applied"
                );
                self.emit_view(view);
                LoadOutcome::Applied
            }
            Err(err) => {
                state.collection_mut(kind).fail_load();
                let view = state.view(kind);
                drop(state);
                error!(collection = %kind, offset = ticket.query.offset, "pager: page load failed: {err:#}");
                self.emit_view(view);
                self.emit_failure(Operation::LoadPage(kind), &err);
                LoadOutcome::Failed
            }
        }
    }

    pub async fn select(&self, id: ItemId) -> MutationOutcome {
        self.move_between(id, CollectionKind::Universe, CollectionKind::Selection)
            .await
    }

    pub async fn unselect(&self, id: ItemId) -> MutationOutcome {
        self.move_between(id, CollectionKind::Selection, CollectionKind::Universe)
            .await
    }

    async fn move_between(
        &self,
        id: ItemId,
        from: CollectionKind,
        to: CollectionKind,
    ) -> MutationOutcome {
        let operation = match to {
            CollectionKind::Selection => Operation::Select(id),
            CollectionKind::Universe => Operation::Unselect(id),
        };

        let undo = {
            let mut state = self.state.lock().await;
            if state.pending.contains(&id) {
                debug!(item_id = %id, "selection: mutation already in flight");
                return MutationOutcome::Busy;
            }
            if to == CollectionKind::Selection && state.selection.contains(id) {
                debug!(item_id = %id, "selection: already selected");
                return MutationOutcome::AlreadySelected;
            }
            let source_revision = state.collection(from).revision();
            let Some(removed) = state.collection_mut(from).remove_item(id) else {
                return match from {
                    CollectionKind::Universe => {
                        warn!(item_id = %id, "selection: item is not in the loaded universe window");
                        MutationOutcome::NotLoaded
                    }
                    CollectionKind::Selection => {
                        debug!(item_id = %id, "selection: item is not selected");
                        MutationOutcome::NotSelected
                    }
                };
            };

            let target = state.collection_mut(to);
            let target_was_unloaded = !target.is_loaded();
            target.prepend_item(removed.item.clone());
            let target_revision = target.revision();
            state.all_selected_total = match to {
                CollectionKind::Selection => state.all_selected_total + 1,
                CollectionKind::Universe => state.all_selected_total.saturating_sub(1),
            };
            state.pending.insert(id);
            let undo = OptimisticMove {
                item: removed.item,
                from,
                to,
                removed_at: removed.index,
                source_revision,
                target_revision,
                target_was_unloaded,
            };
            let views = [state.view(from), state.view(to)];
            drop(state);
            views.into_iter().for_each(|view| self.emit_view(view));
            undo
        };

        let result = match to {
            CollectionKind::Selection => self.transport.add_to_selection(id).await,
            CollectionKind::Universe => self.transport.remove_from_selection(id).await,
        };

        let mut state = self.state.lock().await;
        state.pending.remove(&id);
        match result {
            Ok(()) => {
                let selected_ids = state.selection.item_ids();
                drop(state);
                info!(item_id = %id, from = %from, to = %to, "selection: move confirmed");
                self.persist_selection(selected_ids);
                MutationOutcome::Applied
            }
            Err(err) => {
                state.rollback(&undo);
                let views = [state.view(from), state.view(to)];
                drop(state);
                error!(item_id = %id, from = %from, to = %to, "selection: move rejected, rolled back: {err:#}");
                views.into_iter().for_each(|view| self.emit_view(view));
                self.emit_failure(operation, &err);
                MutationOutcome::RolledBack
            }
        }
    }

    /// Applies a full new order for the loaded selection window. On failure
    /// the selection is reloaded from the server rather than restored.
    pub async fn reorder(&self, new_order: Vec<Item>) -> MutationOutcome {
        let ids: Vec<ItemId> = new_order.iter().map(|item| item.id).collect();
        {
            let mut state = self.state.lock().await;
            let Some(current) = state.selection.items() else {
                return MutationOutcome::NotLoaded;
            };
            let current_ids: BTreeSet<ItemId> = current.iter().map(|item| item.id).collect();
            let requested_ids: BTreeSet<ItemId> = ids.iter().copied().collect();
            if current.len() != ids.len() || current_ids != requested_ids {
                warn!(
                    requested = ids.len(),
                    loaded = current.len(),
                    "selection: reorder is not a permutation of the loaded selection"
                );
                return MutationOutcome::InvalidOrder;
            }
            state.selection.replace_order(new_order);
            let view = state.view(CollectionKind::Selection);
            drop(state);
            self.emit_view(view);
        }

        match self.transport.set_order(&ids).await {
            Ok(()) => {
                info!(count = ids.len(), "selection: order saved");
                let selected_ids = self.state.lock().await.selection.item_ids();
                self.persist_selection(selected_ids);
                MutationOutcome::Applied
            }
            Err(err) => {
                error!("selection: reorder rejected, reloading: {err:#}");
                self.emit_failure(Operation::Reorder, &err);
                let _ = self
                    .load_page(CollectionKind::Selection, LoadMode::Reset)
                    .await;
                MutationOutcome::Reloaded
            }
        }
    }

    /// Drag-end entry point: `active` was dropped onto `over`.
    pub async fn move_selected(&self, active: ItemId, over: ItemId) -> MutationOutcome {
        let new_order = {
            let state = self.state.lock().await;
            let Some(items) = state.selection.items() else {
                return MutationOutcome::NotLoaded;
            };
            if active == over {
                return MutationOutcome::Unchanged;
            }
            match reorder::drag_result(items, active, over) {
                Some(order) => order,
                None => return MutationOutcome::NotSelected,
            }
        };
        self.reorder(new_order).await
    }

    pub async fn create_item(&self, id: ItemId) -> Result<Item, CreateItemError> {
        let item = self.transport.create_item(id).await.map_err(|source| {
            error!(item_id = %id, "items: create failed: {source:#}");
            self.emit_failure(Operation::CreateItem(id), &source);
            CreateItemError::Transport { id, source }
        })?;
        info!(item_id = %item.id, "items: created");
        let _ = self
            .load_page(CollectionKind::Universe, LoadMode::Reset)
            .await;
        Ok(item)
    }

    pub async fn create_item_from_input(&self, input: &str) -> Result<Item, CreateItemError> {
        let id = parse_item_id(input)?;
        self.create_item(id).await
    }

    fn persist_selection(&self, ids: Vec<ItemId>) {
        let seq = self.persist_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = Arc::clone(&self.cache);
        let persisted_seq = Arc::clone(&self.persisted_seq);
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut last = persisted_seq.lock().await;
            if *last > seq {
                debug!(seq, last = *last, "selection: snapshot superseded; skipping write");
                return;
            }
            match cache.save(&ids).await {
                Ok(()) => {
                    *last = seq;
                    debug!(selected = ids.len(), "selection: snapshot persisted");
                    let _ = events.send(ReconcilerEvent::SnapshotPersisted {
                        selected: ids.len(),
                    });
                }
                Err(err) => warn!("selection: failed to persist snapshot: {err:#}"),
            }
        });
    }

    fn emit_view(&self, view: CollectionView) {
        let _ = self.events.send(ReconcilerEvent::CollectionChanged(view));
    }

    fn emit_failure(&self, operation: Operation, err: &anyhow::Error) {
        let _ = self.events.send(ReconcilerEvent::OperationFailed {
            operation,
            message: format!("{err:#}"),
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
