use std::collections::HashMap;

use crate::source::{columns, RecordTable};
use crate::split::split_list;

/// Genus → family name, built once per run from the two family exports.
///
/// The family-definition table is consulted first; the genus→family table
/// only fills genera the first one does not list. Within a table the first
/// record naming a genus wins.
#[derive(Debug, Default)]
pub struct FamilyIndex {
    by_genus: HashMap<String, String>,
}

impl FamilyIndex {
    pub fn build(families: &RecordTable, genus_family: &RecordTable) -> Self {
        let mut by_genus = HashMap::new();

        for rec in families.iter() {
            let family = rec.field(columns::FAMILY).trim();
            if family.is_empty() {
                continue;
            }
            for genus in split_list(rec.field(columns::FAMILY_GENERA)) {
                by_genus.entry(genus).or_insert_with(|| family.to_string());
            }
        }

        for rec in genus_family.iter() {
            let family = rec.field(columns::FAMILY).trim();
            if family.is_empty() {
                continue;
            }
            for genus in split_list(rec.field(columns::GENUS_NAME)) {
                by_genus.entry(genus).or_insert_with(|| family.to_string());
            }
        }

        Self { by_genus }
    }

    /// Family name for `genus`, if either table lists it.
    pub fn family_of(&self, genus: &str) -> Option<&str> {
        self.by_genus.get(genus).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_genus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_genus.is_empty()
    }
}

/// Genus of a binomial: the first whitespace-delimited token.
pub fn genus_of(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("")
}
