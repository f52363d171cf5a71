//! File and module aggregates with derived member statistics.
//!
//! An aggregate stores no metrics of its own. Lookups resolve against the
//! members:
//!
//! - `count` is the number of members;
//! - `<base>_min`, `_max`, `_mean`, `_sum` and `_count` fold `<base>` over the
//!   members, a member lacking `<base>` contributing `0`;
//! - any other legal metric name falls back to the number of members.
//!
//! Folds are cached per base metric and tagged with the membership
//! generation they were computed for. Adding a member bumps the generation,
//! so cached entries from before the change are recomputed on their next read.

use super::{canonical_metric, split_pathname, EntityKind, Measurable, Unit, CANONICAL_METRICS};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Running min / max / count / sum over a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatData {
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub sum: f64,
}

impl StatData {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        values.into_iter().fold(Self::default(), |mut stat, value| {
            stat.add(value);
            stat
        })
    }

    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Statistic selected by a metric name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Min,
    Max,
    Mean,
    Sum,
    Count,
}

impl StatKind {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "mean" => Some(Self::Mean),
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    fn select(&self, stat: &StatData) -> f64 {
        match self {
            Self::Min => stat.min,
            Self::Max => stat.max,
            Self::Mean => stat.mean(),
            Self::Sum => stat.sum,
            Self::Count => stat.count as f64,
        }
    }
}

/// Split `base_suffix` into its base metric and statistic.
pub fn split_stat_suffix(key: &str) -> Option<(&str, StatKind)> {
    let (base, suffix) = key.rsplit_once('_')?;
    if base.is_empty() {
        return None;
    }
    StatKind::from_suffix(suffix).map(|kind| (base, kind))
}

/// A file or module grouping of units.
#[derive(Debug)]
pub struct Aggregate {
    kind: EntityKind,
    name: String,
    members: Vec<Arc<Unit>>,
    generation: u64,
    stats: DashMap<String, (u64, StatData)>,
}

impl Aggregate {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            members: Vec::new(),
            generation: 0,
            stats: DashMap::new(),
        }
    }

    /// Add a member, invalidating cached statistics.
    pub fn add(&mut self, unit: Arc<Unit>) {
        self.members.push(unit);
        self.generation += 1;
    }

    pub fn members(&self) -> &[Arc<Unit>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Membership generation; bumped by every [`Aggregate::add`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Statistics of `base` over the members.
    pub fn stat(&self, base: &str) -> StatData {
        let base = canonical_metric(base);
        if let Some(entry) = self.stats.get(base) {
            let (generation, stat) = *entry;
            if generation == self.generation {
                return stat;
            }
        }

        let stat = StatData::from_values(
            self.members
                .iter()
                .map(|unit| unit.metrics().get(base).copied().unwrap_or(0.0)),
        );
        self.stats
            .insert(base.to_string(), (self.generation, stat));
        stat
    }

    /// Whether `base` is a metric the member units can carry.
    fn is_base_metric(&self, base: &str) -> bool {
        let base = canonical_metric(base);
        CANONICAL_METRICS.contains(&base)
            || self
                .members
                .iter()
                .any(|unit| unit.metrics().contains_key(base))
    }

    fn legal_stat(&self, key: &str) -> Option<(String, StatKind)> {
        split_stat_suffix(key)
            .filter(|(base, _)| self.is_base_metric(base))
            .map(|(base, kind)| (base.to_string(), kind))
    }
}

impl Measurable for Aggregate {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> Vec<String> {
        self.members
            .iter()
            .flat_map(|unit| unit.sources())
            .flat_map(|label| {
                label
                    .split(',')
                    .filter(|source| !source.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn is_metric(&self, key: &str) -> bool {
        key == "count" || self.is_base_metric(key) || self.legal_stat(key).is_some()
    }

    fn metric(&self, key: &str) -> Option<f64> {
        if key == "count" {
            return Some(self.members.len() as f64);
        }
        if let Some((base, kind)) = self.legal_stat(key) {
            return Some(kind.select(&self.stat(&base)));
        }
        if self.is_base_metric(key) {
            return Some(self.members.len() as f64);
        }
        None
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("kind", self.kind.label().to_string()),
            ("name", self.name.clone()),
            ("sources", self.sources_label()),
        ];
        match self.kind {
            EntityKind::File => {
                attributes.push(("file", self.name.clone()));
                if let Some((dir, file_name)) = split_pathname(&self.name) {
                    attributes.push(("fdir", dir.to_string()));
                    attributes.push(("fname", file_name.to_string()));
                }
            }
            EntityKind::Module => attributes.push(("module", self.name.clone())),
            EntityKind::Function => {}
        }
        attributes
    }

    fn metric_values(&self) -> Vec<(String, f64)> {
        vec![("count".to_string(), self.members.len() as f64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CYCLOMATIC_COMPLEXITY, LINES_OF_CODE};
    use pretty_assertions::assert_eq;

    fn module_with(values: &[(f64, f64)]) -> Aggregate {
        let mut module = Aggregate::new(EntityKind::Module, "app");
        for (i, (loc, ccm)) in values.iter().enumerate() {
            module.add(Arc::new(
                Unit::new(format!("/src/app/f{}.c", i))
                    .with_metric("lc", *loc)
                    .with_metric("cc", *ccm),
            ));
        }
        module
    }

    #[test]
    fn stat_data_tracks_min_max_sum() {
        let stat = StatData::from_values([3.0, 1.0, 8.0]);
        assert_eq!(stat.min, 1.0);
        assert_eq!(stat.max, 8.0);
        assert_eq!(stat.count, 3);
        assert_eq!(stat.sum, 12.0);
        assert_eq!(stat.mean(), 4.0);
    }

    #[test]
    fn empty_stat_mean_is_zero() {
        assert_eq!(StatData::default().mean(), 0.0);
    }

    #[test]
    fn suffixed_lookups_resolve_against_members() {
        let module = module_with(&[(10.0, 2.0), (30.0, 4.0)]);
        assert_eq!(module.metric("lines-of-code_sum"), Some(40.0));
        assert_eq!(module.metric("lines-of-code_max"), Some(30.0));
        assert_eq!(module.metric("lines-of-code_min"), Some(10.0));
        assert_eq!(module.metric("lines-of-code_mean"), Some(20.0));
        assert_eq!(module.metric("loc_count"), Some(2.0));
        assert_eq!(module.metric("count"), Some(2.0));
    }

    #[test]
    fn suffix_validity_borrows_from_base() {
        let module = module_with(&[(1.0, 1.0)]);
        assert!(module.is_metric("cyclomatic-complexity_max"));
        assert!(!module.is_metric("unknown_max"));
        assert!(!module.is_metric("unknown"));
        assert_eq!(module.metric("unknown_max"), None);
    }

    #[test]
    fn direct_lookup_falls_back_to_member_count() {
        let module = module_with(&[(10.0, 2.0), (30.0, 4.0), (5.0, 1.0)]);
        assert_eq!(module.metric(LINES_OF_CODE), Some(3.0));
        assert_eq!(module.metric(CYCLOMATIC_COMPLEXITY), Some(3.0));
    }

    #[test]
    fn members_missing_a_metric_contribute_zero() {
        let mut module = Aggregate::new(EntityKind::Module, "app");
        module.add(Arc::new(Unit::new("/a/x.c").with_metric("fan-out", 4.0)));
        module.add(Arc::new(Unit::new("/a/y.c")));
        assert_eq!(module.metric("fan-out_min"), Some(0.0));
        assert_eq!(module.metric("fan-out_sum"), Some(4.0));
    }

    #[test]
    fn adding_a_member_invalidates_cached_stats() {
        let mut module = module_with(&[(10.0, 1.0)]);
        assert_eq!(module.metric("lines-of-code_sum"), Some(10.0));
        let before = module.generation();
        module.add(Arc::new(Unit::new("/src/app/g.c").with_metric("lc", 5.0)));
        assert!(module.generation() > before);
        assert_eq!(module.metric("lines-of-code_sum"), Some(15.0));
        assert_eq!(module.metric("lines-of-code_count"), Some(2.0));
    }

    #[test]
    fn sources_are_sorted_and_unique() {
        let mut module = Aggregate::new(EntityKind::Module, "app");
        for path in ["/b.c", "/a.c", "/b.c"] {
            module.add(Arc::new(Unit::new(path)));
        }
        assert_eq!(module.sources(), vec!["/a.c".to_string(), "/b.c".to_string()]);
        assert_eq!(module.sources(), module.sources());
        assert_eq!(module.sources_label(), "/a.c,/b.c");
    }

    #[test]
    fn split_stat_suffix_needs_a_base() {
        assert_eq!(split_stat_suffix("loc_max"), Some(("loc", StatKind::Max)));
        assert_eq!(split_stat_suffix("fan_out"), None);
        assert_eq!(split_stat_suffix("_max"), None);
        assert_eq!(split_stat_suffix("count"), None);
    }
}
