use serde::{Deserialize, Serialize};

use crate::domain::{Item, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(default)]
    pub has_more: bool,
}

/// Uniform envelope returned by both list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    /// Every selected id regardless of filter. Only the selection endpoint
    /// is expected to fill this in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_ids: Option<Vec<ItemId>>,
}

pub type ItemPage = PaginatedResponse<Item>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub offset: u64,
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl PageQuery {
    /// Builds a query, dropping the filter when it is empty so the server
    /// sees "no filter" rather than "match the empty string".
    pub fn new(offset: u64, limit: u64, filter: &str) -> Self {
        Self {
            offset,
            limit,
            filter: (!filter.is_empty()).then(|| filter.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionIdsRequest {
    pub ids: Vec<ItemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub id: ItemId,
}

/// Locally persisted record of what was selected after the last successful
/// selection-affecting command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub selected_ids: Vec<ItemId>,
}
