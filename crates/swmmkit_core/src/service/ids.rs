//! Sequential identifier generation for unlabeled features.
//!
//! # Invariants
//! - Features with a non-blank ID are never touched.
//! - A generated `{prefix}{n}` never collides with an existing ID or with an
//!   ID generated earlier in the same pass.
//! - Running twice without new blank features generates nothing.

use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::subcatchment::Subcatchment;
use crate::model::Feature;
use crate::repo::feature_repo::{FeatureRepository, RepoResult};
use log::info;
use std::collections::HashSet;

/// Number of IDs generated per layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratedIds {
    pub nodes: usize,
    pub links: usize,
    pub subcatchments: usize,
}

impl GeneratedIds {
    pub fn total(&self) -> usize {
        self.nodes + self.links + self.subcatchments
    }
}

/// Assigns `{prefix}{n}` to every feature with a blank ID, choosing the
/// lowest free `n >= 1`. Returns the number of IDs assigned.
pub fn fill_ids<F: Feature>(features: &mut [F], prefix: &str) -> usize {
    let mut existing = features
        .iter()
        .map(|feature| feature.id().trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect::<HashSet<_>>();

    let mut counter = 1usize;
    let mut generated = 0;
    for feature in features.iter_mut().filter(|feature| feature.has_blank_id()) {
        while existing.contains(&format!("{prefix}{counter}")) {
            counter += 1;
        }
        let new_id = format!("{prefix}{counter}");
        existing.insert(new_id.clone());
        feature.set_id(new_id);
        counter += 1;
        generated += 1;
    }
    generated
}

/// Fills blank IDs of one layer and commits when anything changed.
pub fn fill_layer_ids<F, R>(repo: &R) -> RepoResult<usize>
where
    F: Feature,
    R: FeatureRepository<F> + ?Sized,
{
    let mut features = repo.list_features()?;
    let generated = fill_ids(&mut features, F::LAYER.id_prefix());
    if generated > 0 {
        repo.commit_features(&features)?;
    }

    info!(
        "event=id_fill module=service status=ok layer={} generated={}",
        F::LAYER.table_name(),
        generated
    );
    Ok(generated)
}

/// Fills blank IDs on all three layers (`N…`, `L…`, `S…`).
pub fn generate_auto_ids<N, L, S>(nodes: &N, links: &L, subcatchments: &S) -> RepoResult<GeneratedIds>
where
    N: FeatureRepository<Node> + ?Sized,
    L: FeatureRepository<Link> + ?Sized,
    S: FeatureRepository<Subcatchment> + ?Sized,
{
    Ok(GeneratedIds {
        nodes: fill_layer_ids::<Node, _>(nodes)?,
        links: fill_layer_ids::<Link, _>(links)?,
        subcatchments: fill_layer_ids::<Subcatchment, _>(subcatchments)?,
    })
}
