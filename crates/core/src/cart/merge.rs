//! Reconciliation of carts and wishlists from two sources.
//!
//! Used when a shopper signs in: the copy stored on their profile (cloud) and
//! the copy on this device (local) may both have moved since the last sync.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::{LineItem, LineKey, Wishlist};

/// Merge two lists of cart lines into one list unique by [`LineKey`].
///
/// Cloud lines come first, in their order, followed by local lines whose key
/// the cloud list does not have. When both sides hold the same key the larger
/// quantity wins; quantities are never summed, because an addition that was
/// already synced shows up on both sides. All other fields come from the
/// first-seen line.
///
/// Pure: reads and writes no storage.
#[must_use]
pub fn merge(cloud: &[LineItem], local: &[LineItem]) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(cloud.len() + local.len());
    let mut positions: HashMap<LineKey, usize> = HashMap::with_capacity(merged.capacity());

    for item in cloud.iter().chain(local) {
        match positions.entry(item.key()) {
            Entry::Occupied(slot) => {
                if let Some(existing) = merged.get_mut(*slot.get()) {
                    existing.quantity = existing.quantity.max(item.quantity);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(item.clone());
            }
        }
    }

    merged
}

/// Union of two wishlists: cloud order first, then unseen local ids.
#[must_use]
pub fn merge_wishlist(cloud: &Wishlist, local: &Wishlist) -> Wishlist {
    Wishlist::from_ids(cloud.ids().iter().chain(local.ids()).cloned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Price, ProductId};

    fn line(id: i64, size: &str, color: &str, quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::from(id),
            name: format!("Item {id}"),
            price: Price::from_units(50),
            image: None,
            selected_size: Some(size.to_owned()),
            selected_color: Some(color.to_owned()),
            quantity,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(&[], &[]).is_empty());
    }

    #[test]
    fn test_max_quantity_not_sum() {
        let local = [line(1, "m", "black", 2)];
        let cloud = [line(1, "m", "black", 5)];
        let merged = merge(&cloud, &local);
        assert_eq!(merged, vec![line(1, "m", "black", 5)]);

        let merged = merge(&local, &cloud);
        assert_eq!(merged[0].quantity, 5);
    }

    #[test]
    fn test_cloud_first_then_new_local() {
        let cloud = [line(2, "s", "blue", 1), line(1, "m", "black", 1)];
        let local = [line(3, "l", "gray", 1), line(1, "m", "black", 4)];
        let ids: Vec<_> = merge(&cloud, &local)
            .into_iter()
            .map(|item| (item.id.to_string(), item.quantity))
            .collect();
        assert_eq!(
            ids,
            [
                ("2".to_owned(), 1),
                ("1".to_owned(), 4),
                ("3".to_owned(), 1)
            ]
        );
    }

    #[test]
    fn test_variants_stay_separate() {
        let cloud = [line(1, "m", "black", 1)];
        let local = [line(1, "l", "black", 1), line(1, "m", "white", 1)];
        assert_eq!(merge(&cloud, &local).len(), 3);
    }

    #[test]
    fn test_first_seen_fields_win() {
        let mut cloud_line = line(1, "m", "black", 1);
        cloud_line.name = "Cloud Name".to_owned();
        let merged = merge(&[cloud_line], &[line(1, "m", "black", 3)]);
        assert_eq!(merged[0].name, "Cloud Name");
        assert_eq!(merged[0].quantity, 3);
    }

    #[test]
    fn test_merge_with_empty_local_preserves_order() {
        let cloud = vec![line(3, "s", "red", 2), line(1, "m", "black", 1)];
        assert_eq!(merge(&cloud, &[]), cloud);
    }

    #[test]
    fn test_merge_wishlist_union() {
        let cloud = Wishlist::from_ids([ProductId::from(1), ProductId::from(2)]);
        let local = Wishlist::from_ids([ProductId::from("2"), ProductId::from(3)]);
        let merged = merge_wishlist(&cloud, &local);
        assert_eq!(
            merged.ids(),
            &[ProductId::from(1), ProductId::from(2), ProductId::from(3)]
        );
    }
}
