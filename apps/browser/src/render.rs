use selection_core::{BrowserSnapshot, CollectionView};
use shared::domain::CollectionKind;

pub fn panel_title(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Universe => "Available items",
        CollectionKind::Selection => "Selected items",
    }
}

pub fn render_header(view: &CollectionView) -> String {
    let mut header = format!("{} ({})", panel_title(view.kind), view.stats());
    if !view.filter.is_empty() {
        header.push_str(&format!(" filter='{}'", view.filter));
    }
    if view.loading {
        header.push_str(" loading...");
    }
    header
}

pub fn render_view(view: &CollectionView) -> String {
    let mut out = render_header(view);
    match view.items.as_deref() {
        None => out.push_str("\n  (not loaded)"),
        Some([]) if view.loading => {}
        Some([]) => out.push_str("\n  (empty)"),
        Some(items) => {
            for (row, item) in items.iter().enumerate() {
                out.push_str(&format!(
                    "\n  {row:>4}  #{:<8} {}",
                    item.id, item.name
                ));
                if !item.category.is_empty() {
                    out.push_str(&format!(" [{}]", item.category));
                }
            }
        }
    }
    if view.has_more() && !view.loading {
        out.push_str("\n  ... more available");
    }
    out
}

pub fn render_stats(snapshot: &BrowserSnapshot) -> String {
    let mut out = CollectionKind::ALL
        .into_iter()
        .map(|kind| render_header(snapshot.view(kind)))
        .collect::<Vec<_>>()
        .join("\n");
    if !snapshot.pending.is_empty() {
        let pending = snapshot
            .pending
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("\nawaiting server: {pending}"));
    }
    out
}
