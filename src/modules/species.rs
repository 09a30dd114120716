//! Species bookkeeping: the closed catalog of behavior kinds, and the
//! registry splitting them into active (with live counts) and dormant.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::modules::agent::Profile;
use crate::modules::behavior::{Behavior, guarded};
use crate::modules::error::WorldError;

/// Index of a behavior kind in its [`SpeciesCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(u32);

impl SpeciesId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species#{}", self.0)
    }
}

type BehaviorFactory = Box<dyn Fn() -> Box<dyn Behavior>>;

struct SpeciesEntry {
    name: Cow<'static, str>,
    factory: BehaviorFactory,
}

/// The behavior kinds a world may draw from, each with a factory for fresh
/// instances.
#[derive(Default)]
pub struct SpeciesCatalog {
    entries: Vec<SpeciesEntry>,
}

impl fmt::Debug for SpeciesCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.name.as_ref()))
            .finish()
    }
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a behavior kind under a unique name.
    pub fn register<F>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> Result<SpeciesId, WorldError>
    where
        F: Fn() -> Box<dyn Behavior> + 'static,
    {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(WorldError::DuplicateSpecies(name.into_owned()));
        }
        let id = SpeciesId(self.entries.len() as u32);
        self.entries.push(SpeciesEntry {
            name,
            factory: Box::new(factory),
        });
        Ok(id)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<Cow<'static, str>>, factory: F) -> Result<Self, WorldError>
    where
        F: Fn() -> Box<dyn Behavior> + 'static,
    {
        self.register(name, factory)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SpeciesId> + use<> {
        (0..self.entries.len() as u32).map(SpeciesId)
    }

    pub fn find(&self, name: &str) -> Option<SpeciesId> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(|idx| SpeciesId(idx as u32))
    }

    pub fn name(&self, id: SpeciesId) -> Option<&str> {
        self.entries.get(id.index()).map(|entry| entry.name.as_ref())
    }

    /// A fresh behavior instance of the given kind together with its
    /// profile. `None` for an unknown kind, or when the factory or any
    /// profile method panics.
    pub fn instantiate(&self, id: SpeciesId) -> Option<(Box<dyn Behavior>, Profile)> {
        let entry = self.entries.get(id.index())?;
        let behavior = guarded(id, "factory", || (entry.factory)())?;
        let profile = guarded(id, "profile", || Profile::of(behavior.as_ref()))?;
        Some((behavior, profile))
    }
}

/// Which kinds are on the board, and how many of each are alive.
///
/// A kind is either active or dormant, never both, and at most
/// `max_active` kinds are active at once.
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    active: BTreeMap<SpeciesId, usize>,
    inactive: Vec<SpeciesId>,
    max_active: usize,
}

impl SpeciesRegistry {
    pub fn new(kinds: impl IntoIterator<Item = SpeciesId>, max_active: usize) -> Self {
        Self {
            active: BTreeMap::new(),
            inactive: kinds.into_iter().collect(),
            max_active,
        }
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, kind: SpeciesId) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn live_count(&self, kind: SpeciesId) -> usize {
        self.active.get(&kind).copied().unwrap_or(0)
    }

    pub fn active(&self) -> impl Iterator<Item = (SpeciesId, usize)> + '_ {
        self.active.iter().map(|(kind, count)| (*kind, *count))
    }

    pub fn inactive(&self) -> &[SpeciesId] {
        &self.inactive
    }

    /// Room left under `max_active`, bounded by how many kinds are dormant.
    pub fn vacancies(&self) -> usize {
        self.max_active
            .saturating_sub(self.active.len())
            .min(self.inactive.len())
    }

    /// Moves up to `n` random dormant kinds (never more than there is room
    /// for) into the active set with a live count of zero.
    pub fn activate_random<R: Rng>(&mut self, n: usize, rng: &mut R) -> Vec<SpeciesId> {
        let count = n.min(self.vacancies());
        let mut chosen = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = self.inactive.remove(rng.gen_range(0..self.inactive.len()));
            self.active.insert(kind, 0);
            chosen.push(kind);
        }
        chosen
    }

    /// Activates one specific dormant kind; false if it is unknown, already
    /// active, or there is no room.
    pub fn activate(&mut self, kind: SpeciesId) -> bool {
        if self.active.len() >= self.max_active {
            return false;
        }
        let Some(idx) = self.inactive.iter().position(|k| *k == kind) else {
            return false;
        };
        self.inactive.remove(idx);
        self.active.insert(kind, 0);
        true
    }

    pub fn record_birth(&mut self, kind: SpeciesId) {
        *self.active.entry(kind).or_insert(0) += 1;
    }

    pub fn record_death(&mut self, kind: SpeciesId) {
        if let Some(count) = self.active.get_mut(&kind) {
            debug_assert!(*count > 0, "{kind} died with no live members");
            *count = count.saturating_sub(1);
        }
    }

    /// Returns every active kind with no live members to the dormant pool.
    pub fn sweep_extinct(&mut self) -> Vec<SpeciesId> {
        let extinct: Vec<SpeciesId> = self
            .active
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in &extinct {
            self.active.remove(kind);
            self.inactive.push(*kind);
        }
        extinct
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::modules::testing::{Broken, Stationary};

    fn kinds(n: u32) -> Vec<SpeciesId> {
        (0..n).map(SpeciesId::new).collect()
    }

    #[test]
    fn catalog_rejects_duplicate_names() {
        let mut catalog = SpeciesCatalog::new();
        let rock = catalog.register("rock", || Box::new(Stationary)).unwrap();
        assert_eq!(catalog.find("rock"), Some(rock));
        assert_eq!(catalog.name(rock), Some("rock"));
        assert!(matches!(
            catalog.register("rock", || Box::new(Stationary)),
            Err(WorldError::DuplicateSpecies(name)) if name == "rock"
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn catalog_spawns_fresh_instances() {
        let catalog = SpeciesCatalog::new()
            .with("rock", || Box::new(Stationary))
            .unwrap();
        let rock = catalog.find("rock").unwrap();
        let (behavior, profile) = catalog.instantiate(rock).unwrap();
        assert_eq!(behavior.glyph(), 'o');
        assert_eq!(profile.glyph, 'o');
        assert!(catalog.instantiate(SpeciesId::new(3)).is_none());
    }

    #[test]
    fn panicking_kinds_cannot_be_instantiated() {
        let catalog = SpeciesCatalog::new()
            .with("broken", || Box::new(Broken))
            .unwrap()
            .with("stillborn", || -> Box<dyn Behavior> { panic!("factory fault") })
            .unwrap();
        assert!(catalog.instantiate(catalog.find("broken").unwrap()).is_none());
        assert!(catalog.instantiate(catalog.find("stillborn").unwrap()).is_none());
    }

    #[test]
    fn activation_respects_max_and_never_duplicates() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut registry = SpeciesRegistry::new(kinds(5), 3);

        let first = registry.activate_random(10, &mut rng);
        assert_eq!(first.len(), 3);
        assert_eq!(registry.active_len(), 3);
        assert_eq!(registry.inactive().len(), 2);
        for kind in &first {
            assert!(registry.is_active(*kind));
            assert!(!registry.inactive().contains(kind));
        }

        assert!(registry.activate_random(10, &mut rng).is_empty());
    }

    #[test]
    fn activation_is_bounded_by_request_and_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut registry = SpeciesRegistry::new(kinds(2), 8);
        assert_eq!(registry.activate_random(1, &mut rng).len(), 1);
        assert_eq!(registry.activate_random(5, &mut rng).len(), 1);
        assert_eq!(registry.vacancies(), 0);
    }

    #[test]
    fn extinct_kinds_return_to_the_pool() {
        let mut registry = SpeciesRegistry::new(kinds(2), 2);
        let a = SpeciesId::new(0);
        let b = SpeciesId::new(1);
        assert!(registry.activate(a));
        assert!(registry.activate(b));
        assert!(!registry.activate(a));

        registry.record_birth(a);
        registry.record_birth(a);
        registry.record_birth(b);
        registry.record_death(b);
        registry.record_death(a);

        assert_eq!(registry.sweep_extinct(), vec![b]);
        assert_eq!(registry.live_count(a), 1);
        assert!(!registry.is_active(b));
        assert_eq!(registry.inactive(), &[b]);
        assert!(registry.sweep_extinct().is_empty());
    }
}
