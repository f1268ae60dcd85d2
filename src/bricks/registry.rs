use super::{BehaviourBrick, ChuNeedlemanNucleation, ChuNeedlemanStressBasedNucleation, ElastoViscoPlasticity};
use super::{Hooke, HyperbolicSine, InelasticFlow, IsotropicDamageHooke, Norton, NucleationModel, Plastic};
use super::{PowerLawNucleation, StressPotential};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Defines a function allocating a new brick (or brick component)
pub type Factory<T> = fn() -> T;

/// Holds factories keyed by name
pub struct Registry<T> {
    /// Name of the family (used in error messages)
    family: &'static str,

    /// Factories sorted by name
    factories: BTreeMap<String, Factory<T>>,
}

impl<T> Registry<T> {
    /// Allocates an empty registry
    pub fn new(family: &'static str) -> Self {
        Registry {
            family,
            factories: BTreeMap::new(),
        }
    }

    /// Returns the name of the family
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Registers a factory
    pub fn register(&mut self, name: &str, factory: Factory<T>) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(Error::DuplicateName {
                family: self.family.to_string(),
                name: name.to_string(),
            });
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Allocates a new instance
    ///
    /// `entry` names the input entry requesting the instance.
    pub fn create(&self, name: &str, entry: &str) -> Result<T> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownName {
                family: self.family.to_string(),
                name: name.to_string(),
                entry: entry.to_string(),
            }),
        }
    }

    /// Indicates whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered names (sorted)
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(|k| k.as_str()).collect()
    }
}

/// Holds the registries of all brick families
pub struct Registries {
    /// Top-level bricks
    pub bricks: Registry<Box<dyn BehaviourBrick>>,

    /// Stress potentials
    pub stress_potentials: Registry<Box<dyn StressPotential>>,

    /// Inelastic flows
    pub inelastic_flows: Registry<Box<dyn InelasticFlow>>,

    /// Porosity nucleation models
    pub nucleation_models: Registry<Box<dyn NucleationModel>>,
}

impl Registries {
    /// Allocates empty registries
    pub fn new() -> Self {
        Registries {
            bricks: Registry::new("brick"),
            stress_potentials: Registry::new("stress potential"),
            inelastic_flows: Registry::new("inelastic flow"),
            nucleation_models: Registry::new("porosity nucleation model"),
        }
    }

    /// Allocates registries holding the built-in bricks
    pub fn builtin() -> Result<Self> {
        let mut reg = Registries::new();
        reg.bricks
            .register("StandardElastoViscoPlasticity", || Box::new(ElastoViscoPlasticity::new()))?;
        reg.bricks
            .register("ElastoViscoPlasticity", || Box::new(ElastoViscoPlasticity::new()))?;
        reg.stress_potentials.register("Hooke", || Box::new(Hooke::new()))?;
        reg.stress_potentials
            .register("IsotropicDamageHooke", || Box::new(IsotropicDamageHooke::new()))?;
        reg.inelastic_flows.register("Plastic", || Box::new(Plastic::new()))?;
        reg.inelastic_flows.register("Norton", || Box::new(Norton::new()))?;
        reg.inelastic_flows
            .register("HyperbolicSine", || Box::new(HyperbolicSine::new()))?;
        reg.nucleation_models
            .register("ChuNeedleman", || Box::new(ChuNeedlemanNucleation::new()))?;
        reg.nucleation_models
            .register("PowerLaw", || Box::new(PowerLawNucleation::new()))?;
        reg.nucleation_models.register("ChuNeedlemanStressBased", || {
            Box::new(ChuNeedlemanStressBasedNucleation::new())
        })?;
        Ok(reg)
    }

    /// Returns the process-wide registries holding the built-in bricks
    ///
    /// The registries are populated on first access and are read-only thereafter.
    /// A failed registration is reported on every access.
    pub fn global() -> Result<&'static Registries> {
        static GLOBAL: OnceLock<Result<Registries>> = OnceLock::new();
        GLOBAL.get_or_init(Registries::builtin).as_ref().map_err(|e| e.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
