//! Force-field definitions as explicit, caller-owned handles.
//!
//! A [`Forcefield`] bundles a validated [`RuleTable`] with the bonded
//! [`ParameterSet`] and is immutable once built. There is no process-wide cache:
//! callers own the handle (wrap it in an `Arc` to share it across threads), so
//! several force fields can be used side by side in one process.

mod error;
mod params;
mod pattern;
mod rules;

pub use error::Error;
pub use params::{
    AngleParams, BondParams, DihedralParams, ImproperCenter, ImproperGeneration, ImproperParams,
    ImproperPolicy, ParameterRecord, ParameterSet, ParameterTable, PeriodicTerm, WILDCARD,
    canonicalize,
};
pub use pattern::{AtomPattern, BondConstraint, ElementConstraint, PatternProgram, Slot};
pub use rules::{RuleTable, TypingRule};

pub(crate) use pattern::{AtomTest, Node as PatternNode, NodeKind};

#[derive(Debug, Clone)]
pub struct Forcefield {
    name: String,
    version: Option<String>,
    rules: RuleTable,
    parameters: ParameterSet,
}

impl Forcefield {
    pub fn new(name: impl Into<String>, rules: RuleTable, parameters: ParameterSet) -> Self {
        Self {
            name: name.into(),
            version: None,
            rules,
            parameters,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn improper_policy(&self) -> &ImproperPolicy {
        &self.parameters.improper_policy
    }
}
