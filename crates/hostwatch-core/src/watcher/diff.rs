//! Set-difference between two directory snapshots.

use std::cmp::Ordering;

use crate::watcher::entry::Entry;
use crate::watcher::snapshot::{Snapshot, display_name};

/// A name present in both snapshots whose metadata changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Modified {
    pub name: String,
    pub previous: Entry,
    pub current: Entry,
}

/// Classified difference between a previous and a current snapshot.
///
/// The three groups are disjoint and each is ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Names only in the current snapshot, with their current metadata.
    pub created: Vec<(String, Entry)>,
    /// Names only in the previous snapshot.
    pub deleted: Vec<String>,
    /// Names in both whose entries are not equal.
    pub modified: Vec<Modified>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed names.
    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.modified.len()
    }

    pub fn created_names(&self) -> Vec<&str> {
        self.created.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn deleted_names(&self) -> Vec<&str> {
        self.deleted.iter().map(String::as_str).collect()
    }

    pub fn modified_names(&self) -> Vec<&str> {
        self.modified.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Computes the change-set from `previous` to `current`.
///
/// Names are compared as raw OS strings and rendered with [`display_name`].
/// Both snapshots are walked once in name order. Deterministic: the same two
/// snapshots always yield the same change-set.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let mut prev = previous.iter().peekable();
    let mut curr = current.iter().peekable();

    loop {
        match (prev.peek().copied(), curr.peek().copied()) {
            (Some((prev_name, prev_entry)), Some((curr_name, curr_entry))) => {
                match prev_name.cmp(curr_name) {
                    Ordering::Less => {
                        changes.deleted.push(display_name(prev_name));
                        prev.next();
                    }
                    Ordering::Greater => {
                        changes.created.push((display_name(curr_name), curr_entry.clone()));
                        curr.next();
                    }
                    Ordering::Equal => {
                        if prev_entry != curr_entry {
                            changes.modified.push(Modified {
                                name: display_name(curr_name),
                                previous: prev_entry.clone(),
                                current: curr_entry.clone(),
                            });
                        }
                        prev.next();
                        curr.next();
                    }
                }
            }
            (Some((prev_name, _)), None) => {
                changes.deleted.push(display_name(prev_name));
                prev.next();
            }
            (None, Some((curr_name, curr_entry))) => {
                changes.created.push((display_name(curr_name), curr_entry.clone()));
                curr.next();
            }
            (None, None) => break,
        }
    }

    changes
}
