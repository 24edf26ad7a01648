use shared::domain::{Item, ItemId};

/// Moves the element at `from` so it ends up at `to`, shifting the rest.
/// Out-of-range indices leave the slice order untouched.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from >= moved.len() || to >= moved.len() || from == to {
        return moved;
    }
    let element = moved.remove(from);
    moved.insert(to, element);
    moved
}

/// Resolves a drag that ended with `active` dropped over `over` into the new
/// full order. `None` when the drop changes nothing or either id is unknown.
pub fn drag_result(items: &[Item], active: ItemId, over: ItemId) -> Option<Vec<Item>> {
    if active == over {
        return None;
    }
    let from = items.iter().position(|item| item.id == active)?;
    let to = items.iter().position(|item| item.id == over)?;
    Some(move_item(items, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_forward_and_backward() {
        assert_eq!(move_item(&[1, 2, 3, 4], 0, 2), vec![2, 3, 1, 4]);
        assert_eq!(move_item(&[1, 2, 3, 4], 3, 1), vec![1, 4, 2, 3]);
    }

    #[test]
    fn out_of_range_is_identity() {
        assert_eq!(move_item(&[1, 2, 3], 5, 0), vec![1, 2, 3]);
        assert_eq!(move_item(&[1, 2, 3], 0, 3), vec![1, 2, 3]);
    }
}
