//! Hit testing: point → item lookup.
//!
//! Items later in store order are painted on top, so the walk goes in
//! reverse and the first box containing the point wins.

use tb_core::{Bounds, Item, ItemId};

/// Find the topmost item at board position (px, py).
/// Returns `None` if no mounted item is hit (background).
pub fn hit_test<F>(items: &[Item], bounds_of: F, px: f64, py: f64) -> Option<ItemId>
where
    F: Fn(&Item) -> Option<Bounds>,
{
    items
        .iter()
        .rev()
        .find(|item| bounds_of(*item).is_some_and(|b| b.contains(px, py)))
        .map(Item::id)
}
