use super::repo::DeleteResult;
use calendar_reminders_domain::{Entity, ID};
use std::sync::Mutex;

/// Useful functions for creating inmemory repositories

pub fn find_by<T: Clone, F: FnMut(&T) -> bool>(collection: &Mutex<Vec<T>>, mut compare: F) -> Vec<T> {
    let collection = lock(collection);
    collection.iter().filter(|item| compare(item)).cloned().collect()
}

pub fn delete<T: Clone + Entity>(val_id: &ID, collection: &Mutex<Vec<T>>) -> Option<T> {
    let mut collection = lock(collection);
    let index = collection.iter().position(|item| item.id() == val_id)?;
    Some(collection.remove(index))
}

pub fn delete_by<T: Clone, F: Fn(&T) -> bool>(
    collection: &Mutex<Vec<T>>,
    compare: F,
) -> DeleteResult {
    DeleteResult {
        deleted_count: find_and_delete_by(collection, compare).len() as i64,
    }
}

pub fn find_and_delete_by<T: Clone, F: Fn(&T) -> bool>(
    collection: &Mutex<Vec<T>>,
    compare: F,
) -> Vec<T> {
    let mut collection = lock(collection);
    let mut deleted_items = Vec::new();
    let mut i = 0;
    while i < collection.len() {
        if compare(&collection[i]) {
            deleted_items.push(collection.remove(i));
        } else {
            i += 1;
        }
    }

    deleted_items
}

/// Applies `update` to every matching item and returns the updated items
pub fn update_many<T: Clone, F: Fn(&T) -> bool, U: Fn(&mut T)>(
    collection: &Mutex<Vec<T>>,
    compare: F,
    update: U,
) -> Vec<T> {
    let mut collection = lock(collection);
    let mut updated = Vec::new();
    for item in collection.iter_mut() {
        if compare(item) {
            update(item);
            updated.push(item.clone());
        }
    }
    updated
}

fn lock<T>(collection: &Mutex<Vec<T>>) -> std::sync::MutexGuard<'_, Vec<T>> {
    collection
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
