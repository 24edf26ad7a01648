use shared::domain::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateItemError {
    #[error("item id must be a number, got '{0}'")]
    InvalidId(String),
    #[error("failed to create item {id}: {source}")]
    Transport {
        id: ItemId,
        #[source]
        source: anyhow::Error,
    },
}

impl CreateItemError {
    /// Message suitable for a form-level validation hint.
    pub fn user_message(&self) -> String {
        match self {
            CreateItemError::InvalidId(_) => "ID must be a number".to_string(),
            CreateItemError::Transport { id, .. } => {
                format!("Failed to create item {id}. An item with this ID may already exist.")
            }
        }
    }
}

pub fn parse_item_id(input: &str) -> Result<ItemId, CreateItemError> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map(ItemId)
        .map_err(|_| CreateItemError::InvalidId(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_integer_ids() {
        assert_eq!(parse_item_id(" 42 ").expect("id"), ItemId(42));
        assert_eq!(parse_item_id("-3").expect("id"), ItemId(-3));
    }

    #[test]
    fn rejects_non_numeric_input() {
        let err = parse_item_id("4a").expect_err("must fail");
        assert!(matches!(err, CreateItemError::InvalidId(ref raw) if raw == "4a"));
        assert_eq!(err.user_message(), "ID must be a number");
    }
}
