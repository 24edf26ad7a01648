use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ItemId);

/// A browsable record. Only `id` carries meaning for reconciliation; the other
/// fields are display data passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// The two independently paged lists shown side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Every item that is not currently selected (left panel).
    Universe,
    /// The chosen, manually ordered items (right panel).
    Selection,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Universe, CollectionKind::Selection];

    pub fn label(self) -> &'static str {
        match self {
            CollectionKind::Universe => "universe",
            CollectionKind::Selection => "selection",
        }
    }

    pub fn other(self) -> CollectionKind {
        match self {
            CollectionKind::Universe => CollectionKind::Selection,
            CollectionKind::Selection => CollectionKind::Universe,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
