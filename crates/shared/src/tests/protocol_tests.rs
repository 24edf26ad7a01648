use crate::{
    domain::{CollectionKind, ItemId},
    protocol::{ItemPage, PageQuery, SelectionSnapshot},
};

#[test]
fn decodes_server_page_with_camel_case_fields() {
    let raw = r#"{
        "data": [
            {"id": 7, "name": "Item 7", "description": "d", "category": "A", "createdAt": "2024-01-01T00:00:00Z"}
        ],
        "pagination": {"offset": 20, "limit": 20, "total": 100, "hasMore": true},
        "selectedIds": [1, 2, 3]
    }"#;
    let page: ItemPage = serde_json::from_str(raw).expect("page");
    assert_eq!(page.data[0].id, ItemId(7));
    assert_eq!(page.pagination.offset, 20);
    assert!(page.pagination.has_more);
    assert_eq!(
        page.selected_ids,
        Some(vec![ItemId(1), ItemId(2), ItemId(3)])
    );
}

#[test]
fn universe_page_without_selected_ids_decodes_to_none() {
    let raw = r#"{"data": [], "pagination": {"offset": 0, "limit": 20, "total": 0}}"#;
    let page: ItemPage = serde_json::from_str(raw).expect("page");
    assert!(page.data.is_empty());
    assert!(page.selected_ids.is_none());
    assert!(!page.pagination.has_more);
}

#[test]
fn page_query_omits_empty_filter() {
    let query = PageQuery::new(40, 20, "");
    assert_eq!(
        serde_json::to_value(&query).expect("json"),
        serde_json::json!({"offset": 40, "limit": 20})
    );

    let query = PageQuery::new(0, 20, "5");
    assert_eq!(query.filter.as_deref(), Some("5"));
}

#[test]
fn snapshot_uses_selected_ids_key() {
    let snapshot = SelectionSnapshot {
        selected_ids: vec![ItemId(3), ItemId(1)],
    };
    assert_eq!(
        serde_json::to_string(&snapshot).expect("json"),
        r#"{"selectedIds":[3,1]}"#
    );
}

#[test]
fn collection_kinds_are_each_others_counterpart() {
    assert_eq!(CollectionKind::Universe.other(), CollectionKind::Selection);
    assert_eq!(CollectionKind::Selection.other(), CollectionKind::Universe);
    assert_eq!(CollectionKind::Selection.to_string(), "selection");
}
