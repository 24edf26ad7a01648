//! Turns reconciler events and outcomes into one-line user messages.

use selection_core::{LoadOutcome, MutationOutcome, Operation, ReconcilerEvent};
use shared::domain::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Unreachable,
    Rejected,
    Server,
    Unknown,
}

pub fn categorize(message: &str) -> FailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("error sending request")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        FailureCategory::Unreachable
    } else if lower.contains("api error: 4") {
        FailureCategory::Rejected
    } else if lower.contains("api error: 5") {
        FailureCategory::Server
    } else {
        FailureCategory::Unknown
    }
}

pub fn describe_failure(operation: &Operation, message: &str) -> String {
    let what = match operation {
        Operation::LoadPage(kind) => format!("Loading {kind} failed"),
        Operation::Select(id) => format!("Selecting {id} failed and was undone"),
        Operation::Unselect(id) => format!("Unselecting {id} failed and was undone"),
        Operation::Reorder => "Saving the new order failed; selection reloaded".to_string(),
        Operation::CreateItem(id) => format!("Creating {id} failed"),
    };
    match categorize(message) {
        FailureCategory::Unreachable => format!("{what}: server unreachable, check the API url."),
        FailureCategory::Rejected => format!("{what}: request rejected ({message})."),
        FailureCategory::Server => format!("{what}: server error ({message})."),
        FailureCategory::Unknown => format!("{what}: {message}"),
    }
}

/// Only failures are surfaced asynchronously; collection updates are shown
/// on demand and the cached selection is reported once at startup.
pub fn event_message(event: &ReconcilerEvent) -> Option<String> {
    match event {
        ReconcilerEvent::OperationFailed { operation, message } => {
            Some(describe_failure(operation, message))
        }
        ReconcilerEvent::CollectionChanged(_)
        | ReconcilerEvent::SnapshotPersisted { .. }
        | ReconcilerEvent::CachedSelectionLoaded(_) => None,
    }
}

pub fn mutation_message(outcome: MutationOutcome) -> &'static str {
    match outcome {
        MutationOutcome::Applied => "ok",
        MutationOutcome::Unchanged => "order unchanged",
        MutationOutcome::AlreadySelected => "already selected",
        MutationOutcome::NotSelected => "not in the selection",
        MutationOutcome::NotLoaded => "item is not loaded; scroll or filter to it first",
        MutationOutcome::InvalidOrder => "order does not match the loaded selection",
        MutationOutcome::Busy => "still waiting for the server on that item",
        MutationOutcome::RolledBack => "server refused; change undone",
        MutationOutcome::Reloaded => "server refused; selection reloaded",
    }
}

pub fn cached_selection_message(ids: &[ItemId]) -> String {
    format!("last session had {} selected item(s)", ids.len())
}

pub fn load_message(outcome: LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Applied => "loaded",
        LoadOutcome::Skipped => "nothing to load",
        LoadOutcome::Stale => "superseded by a newer request",
        LoadOutcome::Failed => "load failed",
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::CollectionKind;

    use super::*;

    #[test]
    fn categorizes_transport_and_status_failures() {
        assert_eq!(
            categorize("error sending request for url (http://localhost:3000/api/items)"),
            FailureCategory::Unreachable
        );
        assert_eq!(categorize("API Error: 409 Conflict"), FailureCategory::Rejected);
        assert_eq!(
            categorize("API Error: 500 Internal Server Error"),
            FailureCategory::Server
        );
        assert_eq!(categorize("malformed page"), FailureCategory::Unknown);
    }

    #[test]
    fn failure_text_names_the_operation() {
        assert_eq!(
            describe_failure(&Operation::Select(ItemId(4)), "API Error: 500 Internal Server Error"),
            "Selecting 4 failed and was undone: server error (API Error: 500 Internal Server Error)."
        );
        assert!(describe_failure(
            &Operation::LoadPage(CollectionKind::Selection),
            "connection refused"
        )
        .contains("server unreachable"));
    }

    #[test]
    fn collection_updates_are_not_printed() {
        assert_eq!(
            event_message(&ReconcilerEvent::SnapshotPersisted { selected: 2 }),
            None
        );
    }
}
