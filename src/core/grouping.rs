//! Grouping of units into file and module aggregates.

use super::{Aggregate, Entity, EntityKind, Unit};
use std::collections::BTreeMap;
use std::sync::Arc;

/// File and module aggregates built over one unit collection.
#[derive(Debug, Default)]
pub struct Groupings {
    pub files: Vec<Arc<Aggregate>>,
    pub modules: Vec<Arc<Aggregate>>,
}

impl Groupings {
    /// All aggregates as entities, files first.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.files
            .iter()
            .chain(self.modules.iter())
            .map(|aggregate| Entity::Aggregate(Arc::clone(aggregate)))
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.modules.is_empty()
    }
}

/// Group units by raw pathname and by module label.
///
/// Keys are visited in sorted order so the result does not depend on the
/// order units arrived in. Units without a module label only join their file
/// aggregate.
pub fn group_units(units: &[Arc<Unit>]) -> Groupings {
    let files = units
        .iter()
        .fold(BTreeMap::<&str, Aggregate>::new(), |mut acc, unit| {
            acc.entry(unit.pathname())
                .or_insert_with(|| Aggregate::new(EntityKind::File, unit.display_pathname()))
                .add(Arc::clone(unit));
            acc
        });

    let modules = units
        .iter()
        .filter(|unit| !unit.module().is_empty())
        .fold(BTreeMap::<&str, Aggregate>::new(), |mut acc, unit| {
            acc.entry(unit.module())
                .or_insert_with(|| Aggregate::new(EntityKind::Module, unit.module()))
                .add(Arc::clone(unit));
            acc
        });

    let groupings = Groupings {
        files: files.into_values().map(Arc::new).collect(),
        modules: modules.into_values().map(Arc::new).collect(),
    };
    log::debug!(
        "Grouped {} units into {} files and {} modules",
        units.len(),
        groupings.files.len(),
        groupings.modules.len()
    );
    groupings
}
