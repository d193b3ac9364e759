//! Projection of resolved repositories onto the id → slug map that drives dispatch.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use travis_api::{RepoInfo, ResolutionReport};

/// Repository id → slug.
pub type IdMap = BTreeMap<u64, String>;

/// Build an [`IdMap`] from resolution data.
///
/// Each id maps to the slug it was resolved under, so dispatch results are
/// keyed exactly like the resolution. When several slugs share an id, the
/// first one in slug order is kept.
pub fn id_map(data: &BTreeMap<String, RepoInfo>) -> IdMap {
    let mut ids = IdMap::new();
    for (slug, info) in data {
        ids.entry(info.id).or_insert_with(|| slug.clone());
    }
    ids
}

/// Build the [`IdMap`] for a resolution, giving every repository id to one slug.
///
/// Slugs that resolved to an id already claimed by an earlier slug are moved
/// from `data` to `failures` as `duplicate of <slug>`, so the report stays
/// balanced and each repository is enabled once.
pub fn claim_ids(report: &mut ResolutionReport) -> IdMap {
    let mut ids = IdMap::new();
    let mut duplicates = Vec::new();
    for (slug, info) in &report.data {
        match ids.entry(info.id) {
            Entry::Vacant(entry) => {
                entry.insert(slug.clone());
            }
            Entry::Occupied(entry) => duplicates.push((slug.clone(), entry.get().clone())),
        }
    }

    for (slug, winner) in duplicates {
        report.data.remove(&slug);
        report.meta.success -= 1;
        report.record_failure(slug, format!("duplicate of {}", winner));
    }
    ids
}
