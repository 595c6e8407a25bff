//! Name index for fast catalog lookups.
//!
//! Builds an in-memory index from catalog records, keyed by normalized name.
//! Used to match discovered titles to their catalog entry.

use std::collections::HashMap;

use proton_shelf_core::normalize::normalize;
use proton_shelf_core::types::CatalogRecord;

/// An index of catalog records, keyed by normalized name.
pub struct NameIndex {
    by_name: HashMap<String, usize>,
    records: Vec<CatalogRecord>,
}

impl NameIndex {
    /// Build an index from a list of catalog records.
    ///
    /// Duplicate normalized names are resolved by keeping the first entry
    /// (later duplicates are silently ignored).
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            if !record.normalized_name.is_empty() {
                by_name.entry(record.normalized_name.clone()).or_insert(i);
            }
        }

        Self { by_name, records }
    }

    /// Look up a record by candidate title.
    ///
    /// The candidate is normalized first. An exact hit wins. Otherwise, for
    /// multi-word candidates only, the scan walks the records in insertion
    /// order and returns the first one whose normalized name contains the
    /// candidate or is contained by it. The symmetric check is what lets a
    /// decorated title ("... Game of the Year") land on its base record.
    /// Single-word candidates never fall back to the substring scan; they
    /// produce too many false hits ("portal" would match half the catalog).
    pub fn lookup(&self, candidate: &str) -> Option<&CatalogRecord> {
        let needle = normalize(candidate);
        if needle.is_empty() {
            return None;
        }
        if let Some(&i) = self.by_name.get(&needle) {
            return Some(&self.records[i]);
        }
        if needle.contains(' ') {
            return self.records.iter().find(|r| {
                !r.normalized_name.is_empty()
                    && (r.normalized_name.contains(&needle) || needle.contains(&r.normalized_name))
            });
        }
        None
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Returns the total number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
