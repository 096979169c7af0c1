//! Helpers shared by every collection: id assignment and manual ordering.

use crate::domain::category::Category;
use crate::domain::content::ContentRecord;
use crate::domain::profile::SocialLink;
use crate::error::{RepositoryError, RepositoryResult};

/// Records with a positive integer identity.
pub trait Identified {
    fn raw_id(&self) -> i64;
}

/// Records carrying an optional manual `order`.
pub trait Ordered {
    fn order(&self) -> Option<u32>;
    fn set_order(&mut self, order: u32);
}

impl Identified for ContentRecord {
    fn raw_id(&self) -> i64 {
        self.id.get()
    }
}

impl Identified for Category {
    fn raw_id(&self) -> i64 {
        self.id.get()
    }
}

impl Identified for SocialLink {
    fn raw_id(&self) -> i64 {
        self.id.get()
    }
}

impl Ordered for ContentRecord {
    fn order(&self) -> Option<u32> {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = Some(order);
    }
}

impl Ordered for Category {
    fn order(&self) -> Option<u32> {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = Some(order);
    }
}

/// `max(existing ids, 0) + 1`. Fails once the largest id is exhausted.
pub fn next_id<T: Identified>(items: &[T]) -> RepositoryResult<i64> {
    let max = items.iter().map(Identified::raw_id).max().unwrap_or(0).max(0);
    max.checked_add(1)
        .ok_or_else(|| RepositoryError::Validation(format!("no id left after {max}")))
}

/// `max(existing orders, 0) + 1`. Fails once the largest order is exhausted.
pub fn next_order<T: Ordered>(items: &[T]) -> RepositoryResult<u32> {
    let max = items.iter().filter_map(Ordered::order).max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| RepositoryError::Validation(format!("no order left after {max}")))
}

/// Give records without an `order` their 1-based array position, then sort
/// ascending by `order`. Returns whether anything was back-filled.
pub fn backfill_and_sort<T: Ordered>(items: &mut [T]) -> bool {
    let mut backfilled = false;
    for (position, item) in items.iter_mut().enumerate() {
        if item.order().is_none() {
            item.set_order(position as u32 + 1);
            backfilled = true;
        }
    }
    items.sort_by_key(|item| item.order());
    backfilled
}

/// Reassign `order = position + 1` across the whole collection.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.set_order(position as u32 + 1);
    }
}

/// Move the record at `from` to `to` and renumber. Returns `false` when the
/// indices are equal and nothing changed.
pub fn move_item<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> RepositoryResult<bool> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(RepositoryError::IndexOutOfRange { index, len });
        }
    }
    if from == to {
        return Ok(false);
    }
    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    Ok(true)
}

/// Whether the orders form exactly `{1..N}`.
pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    let mut orders: Vec<Option<u32>> = items.iter().map(Ordered::order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(position, order)| *order == Some(position as u32 + 1))
}
