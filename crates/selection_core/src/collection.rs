//! Paged list state shared by the universe and selection panels.
//!
//! Everything here is synchronous and runs under the reconciler's state lock,
//! so each method is one indivisible update as far as observers are concerned.

use std::{collections::HashSet, fmt};

use shared::{
    domain::{CollectionKind, Item, ItemId},
    protocol::{ItemPage, PageQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Fetch the next page after `offset` and append it.
    Append,
    /// Drop everything, rewind to offset 0 and fetch the first page.
    Reset,
}

/// Issued by [`PagedCollection::begin_load`]; the response is only applied if
/// its generation is still current when it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadTicket {
    pub generation: u64,
    pub mode: LoadMode,
    pub query: PageQuery,
}

#[derive(Debug, Clone)]
pub(crate) struct RemovedItem {
    pub index: usize,
    pub item: Item,
}

#[derive(Debug, Clone)]
pub(crate) struct PagedCollection {
    kind: CollectionKind,
    items: Option<Vec<Item>>,
    total: u64,
    offset: u64,
    filter: String,
    loading: bool,
    /// Bumped by every reset; responses stamped with an older value are stale.
    generation: u64,
    /// Bumped whenever server data replaces or extends `items`.
    revision: u64,
}

impl PagedCollection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: None,
            total: 0,
            offset: 0,
            filter: String::new(),
            loading: false,
            generation: 0,
            revision: 0,
        }
    }

    pub fn items(&self) -> Option<&[Item]> {
        self.items.as_deref()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.items.is_some() && self.offset < self.total
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items
            .as_ref()
            .and_then(|items| items.iter().position(|item| item.id == id))
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .flatten()
            .map(|item| item.id)
            .collect()
    }

    /// Marks the collection busy and returns the request to issue, or `None`
    /// when an append is refused because a load is already in flight. Resets
    /// always proceed and clear the materialized window up front.
    pub fn begin_load(&mut self, mode: LoadMode, page_size: u64) -> Option<LoadTicket> {
        match mode {
            LoadMode::Append if self.loading => return None,
            LoadMode::Append => {}
            LoadMode::Reset => {
                self.generation += 1;
                self.revision += 1;
                self.items = Some(Vec::new());
                self.offset = 0;
            }
        }
        self.loading = true;
        Some(LoadTicket {
            generation: self.generation,
            mode,
            query: PageQuery::new(self.offset, page_size, &self.filter),
        })
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Applies a page for a current ticket. Entries rejected by `exclude` or
    /// already materialized are skipped, but the cursor still advances by the
    /// full page length because it tracks the server's list, not ours.
    pub fn apply_page(
        &mut self,
        ticket: &LoadTicket,
        page: ItemPage,
        exclude: impl Fn(ItemId) -> bool,
    ) -> usize {
        let page_len = page.data.len() as u64;
        let existing = match ticket.mode {
            LoadMode::Reset => Vec::new(),
            LoadMode::Append => self.items.take().unwrap_or_default(),
        };
        let mut merged = existing;
        let mut known: HashSet<ItemId> = merged.iter().map(|item| item.id).collect();
        let mut skipped = 0;
        for item in page.data {
            if exclude(item.id) || !known.insert(item.id) {
                skipped += 1;
                continue;
            }
            merged.push(item);
        }

        self.items = Some(merged);
        self.total = page.pagination.total;
        self.offset = page.pagination.offset + page_len;
        self.loading = false;
        self.revision += 1;
        skipped
    }

    /// Clears the busy flag after a failed request that is still current.
    pub fn fail_load(&mut self) {
        self.loading = false;
    }

    /// Takes an item out of the window. The total and cursor shrink with it so
    /// the next page starts where the server's list now continues.
    pub fn remove_item(&mut self, id: ItemId) -> Option<RemovedItem> {
        let index = self.position(id)?;
        let item = self.items.as_mut()?.remove(index);
        self.total = self.total.saturating_sub(1);
        self.offset = self.offset.saturating_sub(1);
        Some(RemovedItem { index, item })
    }

    /// Puts an item that just arrived from the other panel at the top. Only
    /// the total grows: the server files it somewhere of its own choosing, so
    /// the cursor into the server's list stays put and a later page that
    /// repeats it is deduplicated by `apply_page`.
    pub fn prepend_item(&mut self, item: Item) {
        self.items.get_or_insert_with(Vec::new).insert(0, item);
        self.total += 1;
    }

    /// Undoes [`PagedCollection::prepend_item`].
    pub fn remove_prepended(&mut self, id: ItemId) -> bool {
        if !self.discard_item(id) {
            return false;
        }
        self.total = self.total.saturating_sub(1);
        true
    }

    /// Puts back an item taken by [`PagedCollection::remove_item`].
    pub fn insert_item(&mut self, index: usize, item: Item) {
        let items = self.items.get_or_insert_with(Vec::new);
        let index = index.min(items.len());
        items.insert(index, item);
        self.total += 1;
        self.offset += 1;
    }

    /// Drops an entry without touching counts, for when server data has
    /// already replaced the counts the entry contributed to.
    pub fn discard_item(&mut self, id: ItemId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if let Some(items) = self.items.as_mut() {
            items.remove(index);
        }
        true
    }

    pub fn mark_unloaded(&mut self) {
        self.items = None;
    }

    /// Swaps in a reordered window. Counts and cursor are left alone.
    pub fn replace_order(&mut self, items: Vec<Item>) {
        self.items = Some(items);
    }

    pub fn view(&self, all_selected_total: Option<u64>) -> CollectionView {
        CollectionView {
            kind: self.kind,
            items: self.items.clone(),
            total: self.total,
            offset: self.offset,
            filter: self.filter.clone(),
            loading: self.loading,
            all_selected_total,
        }
    }
}

/// Read-only copy of one panel, handed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionView {
    pub kind: CollectionKind,
    pub items: Option<Vec<Item>>,
    pub total: u64,
    pub offset: u64,
    pub filter: String,
    pub loading: bool,
    /// Selected count ignoring the filter. Only set for the selection panel.
    pub all_selected_total: Option<u64>,
}

impl CollectionView {
    pub fn loaded_count(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn has_more(&self) -> bool {
        self.items.is_some() && self.offset < self.total
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .flatten()
            .map(|item| item.id)
            .collect()
    }

    pub fn stats(&self) -> PanelStats {
        let shown = self.loaded_count() as u64;
        PanelStats {
            shown,
            of: shown.max(self.total),
            all_selected: if self.filter.is_empty() {
                None
            } else {
                self.all_selected_total
            },
        }
    }
}

/// "Shown N of M" header data. `all_selected` is only present while a filter
/// narrows the selection panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelStats {
    pub shown: u64,
    pub of: u64,
    pub all_selected: Option<u64>,
}

impl fmt::Display for PanelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shown {} of {}", self.shown, self.of)?;
        if let Some(all) = self.all_selected {
            write!(f, " (all selected: {all})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
