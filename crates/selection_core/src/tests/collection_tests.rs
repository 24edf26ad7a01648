use super::*;
use chrono::{TimeZone, Utc};
use shared::protocol::PaginationMeta;

fn item(id: i64) -> Item {
    Item {
        id: ItemId(id),
        name: format!("Item {id}"),
        description: String::new(),
        category: "A".to_string(),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().expect("timestamp"),
    }
}

fn page(offset: u64, ids: std::ops::RangeInclusive<i64>, total: u64) -> ItemPage {
    let data: Vec<Item> = ids.map(item).collect();
    ItemPage {
        pagination: PaginationMeta {
            offset,
            limit: 20,
            total,
            has_more: offset + (data.len() as u64) < total,
        },
        data,
        selected_ids: None,
    }
}

#[test]
fn starts_unloaded_and_without_more_pages() {
    let collection = PagedCollection::new(CollectionKind::Universe);
    assert!(collection.items().is_none());
    assert!(!collection.has_more());
    assert!(!collection.is_loading());
}

#[test]
fn cursor_advances_from_echoed_offset_not_page_size() {
    let mut collection = PagedCollection::new(CollectionKind::Universe);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=20, 100), |_| false);
    assert_eq!(collection.offset(), 20);

    let ticket = collection.begin_load(LoadMode::Append, 20).expect("ticket");
    assert_eq!(ticket.query.offset, 20);
    collection.apply_page(&ticket, page(20, 21..=40, 100), |_| false);

    let ticket = collection.begin_load(LoadMode::Append, 20).expect("ticket");
    assert_eq!(ticket.query.offset, 40);
    // Short final page.
    collection.apply_page(&ticket, page(40, 41..=45, 45), |_| false);
    assert_eq!(collection.offset(), 45);
    assert_eq!(collection.items().map(<[Item]>::len), Some(45));
    assert!(!collection.has_more());
}

#[test]
fn append_is_refused_while_loading_but_reset_proceeds() {
    let mut collection = PagedCollection::new(CollectionKind::Selection);
    let first = collection.begin_load(LoadMode::Reset, 20).expect("first");
    assert!(collection.begin_load(LoadMode::Append, 20).is_none());

    let second = collection.begin_load(LoadMode::Reset, 20).expect("reset supersedes");
    assert!(!collection.is_current(&first));
    assert!(collection.is_current(&second));
    assert!(collection.is_loading());
}

#[test]
fn reset_clears_window_to_empty_not_unloaded() {
    let mut collection = PagedCollection::new(CollectionKind::Universe);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=20, 100), |_| false);

    collection.set_filter("5");
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    assert_eq!(collection.items(), Some(&[][..]));
    assert_eq!(collection.offset(), 0);
    assert_eq!(ticket.query.filter.as_deref(), Some("5"));
}

#[test]
fn excluded_and_duplicate_entries_are_skipped_but_counted_by_cursor() {
    let mut collection = PagedCollection::new(CollectionKind::Universe);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=3, 10), |_| false);

    let ticket = collection.begin_load(LoadMode::Append, 20).expect("ticket");
    let skipped = collection.apply_page(&ticket, page(3, 3..=6, 10), |id| id == ItemId(5));
    assert_eq!(skipped, 2);
    assert_eq!(
        collection.item_ids(),
        vec![ItemId(1), ItemId(2), ItemId(3), ItemId(4), ItemId(6)]
    );
    assert_eq!(collection.offset(), 7);
}

#[test]
fn remove_then_insert_restores_window_and_counts() {
    let mut collection = PagedCollection::new(CollectionKind::Universe);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=5, 50), |_| false);
    let before = collection.view(None);

    let removed = collection.remove_item(ItemId(3)).expect("removed");
    assert_eq!(removed.index, 2);
    assert_eq!(collection.view(None).total, 49);
    assert_eq!(collection.offset(), 4);

    collection.insert_item(removed.index, removed.item);
    assert_eq!(collection.view(None), before);
}

#[test]
fn replace_order_keeps_counts() {
    let mut collection = PagedCollection::new(CollectionKind::Selection);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=3, 3), |_| false);

    collection.replace_order(vec![item(3), item(1), item(2)]);
    assert_eq!(collection.item_ids(), vec![ItemId(3), ItemId(1), ItemId(2)]);
    assert_eq!(collection.view(None).total, 3);
    assert_eq!(collection.offset(), 3);
}

#[test]
fn stats_report_all_selected_only_while_filtered() {
    let mut collection = PagedCollection::new(CollectionKind::Selection);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=4, 12), |_| false);

    let unfiltered = collection.view(Some(12)).stats();
    assert_eq!(unfiltered.to_string(), "shown 4 of 12");

    collection.set_filter("1");
    let filtered = collection.view(Some(30)).stats();
    assert_eq!(filtered.all_selected, Some(30));
    assert_eq!(filtered.to_string(), "shown 4 of 12 (all selected: 30)");
}

#[test]
fn stats_never_report_fewer_than_shown() {
    let mut collection = PagedCollection::new(CollectionKind::Selection);
    collection.prepend_item(item(1));
    collection.prepend_item(item(2));
    let mut view = collection.view(None);
    view.total = 1;
    assert_eq!(view.stats().of, 2);
}

#[test]
fn prepend_grows_total_but_leaves_cursor() {
    let mut collection = PagedCollection::new(CollectionKind::Universe);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=20, 99), |_| false);
    let before = collection.view(None);

    collection.prepend_item(item(50));
    assert_eq!(collection.item_ids()[0], ItemId(50));
    assert_eq!(collection.view(None).total, 100);
    assert_eq!(collection.offset(), 20);

    let ticket = collection.begin_load(LoadMode::Append, 20).expect("ticket");
    assert_eq!(ticket.query.offset, 20);
    collection.fail_load();

    assert!(collection.remove_prepended(ItemId(50)));
    assert_eq!(collection.view(None), before);
    assert!(!collection.remove_prepended(ItemId(50)));
}

#[test]
fn repeated_ids_within_one_page_are_kept_once() {
    let mut collection = PagedCollection::new(CollectionKind::Selection);
    let ticket = collection.begin_load(LoadMode::Reset, 20).expect("ticket");
    collection.apply_page(&ticket, page(0, 1..=3, 10), |_| false);

    let ticket = collection.begin_load(LoadMode::Append, 20).expect("ticket");
    let mut next = page(3, 4..=6, 10);
    next.data.push(item(5));
    next.data.push(item(2));
    let skipped = collection.apply_page(&ticket, next, |_| false);

    assert_eq!(skipped, 2);
    assert_eq!(
        collection.item_ids(),
        (1..=6).map(ItemId).collect::<Vec<_>>()
    );
    // The cursor follows the server's page, repeats included.
    assert_eq!(collection.offset(), 8);
}
