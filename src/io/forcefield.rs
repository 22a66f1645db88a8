//! TOML force-field definitions.
//!
//! A definition file carries the typing rules, their override relation, the
//! bonded parameter tables, and the improper policy:
//!
//! ```toml
//! name = "example"
//! version = "1.0"
//!
//! [improper_policy]
//! generation = "exactly-three"   # disabled | exactly-three | all-combinations
//! center = "third"               # first | third
//! optional = true
//!
//! [[rules]]
//! id = "ca"
//! element = "C"
//! overrides = ["c2"]
//! pattern = { aromatic = true }
//!
//! [[bonds]]
//! types = ["ca", "ca"]
//! k = 478.4
//! r0 = 1.387
//! ```
//!
//! Pattern nodes accept `element` (a symbol or a list of symbols), `degree`,
//! `charge`, `aromatic`, `in_ring`, `ring_size`, `type`, `label`, `exhaustive`,
//! `bond` (order of the bond to the parent node), `neighbors` (child nodes) and
//! `closures` (`{ label, bond }` ring closures).

use super::error::Error;
use crate::forcefield::{
    AngleParams, AtomPattern, BondConstraint, BondParams, DihedralParams, ElementConstraint,
    Forcefield, ImproperParams, ImproperPolicy, ParameterSet, PeriodicTerm, RuleTable, Slot,
    TypingRule,
};
use crate::model::types::{BondOrder, Element};
use log::debug;
use serde::Deserialize;
use std::io::Read;

const GAFF_LITE_TOML: &str = include_str!("../../resources/gaff-lite.toml");

const BUILTIN: &[(&str, &str)] = &[("gaff-lite", GAFF_LITE_TOML)];

/// Names of the force fields bundled with the library.
pub fn available_forcefields() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

/// Parses a bundled force field into a fresh, caller-owned handle.
///
/// # Errors
///
/// Returns [`Error::UnknownForcefield`] if no bundled definition has that name.
pub fn builtin_forcefield(name: &str) -> Result<Forcefield, Error> {
    let (_, source) = BUILTIN
        .iter()
        .find(|(builtin, _)| builtin.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnknownForcefield {
            name: name.to_string(),
            available: available_forcefields().into_iter().map(String::from).collect(),
        })?;
    parse_forcefield(source)
}

pub fn read_forcefield<R: Read>(mut reader: R) -> Result<Forcefield, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_forcefield(&text)
}

pub fn parse_forcefield(text: &str) -> Result<Forcefield, Error> {
    let def: ForcefieldDef = toml::from_str(text).map_err(|e| Error::parse("force field", e))?;

    let rules = def
        .rules
        .into_iter()
        .map(RuleDef::into_rule)
        .collect::<Result<Vec<_>, _>>()?;
    let rules = RuleTable::new(rules)?;

    let mut parameters = ParameterSet {
        improper_policy: def.improper_policy,
        ..ParameterSet::default()
    };
    for bond in def.bonds {
        parameters.bonds.insert(bond.types, BondParams { k: bond.k, r0: bond.r0 })?;
    }
    for angle in def.angles {
        let params = AngleParams {
            k: angle.k,
            theta0: angle.theta0,
        };
        parameters.angles.insert(angle.types, params)?;
    }
    for dihedral in def.dihedrals {
        let (types, params) = dihedral.into_params()?;
        parameters.dihedrals.insert(types, params)?;
    }
    for improper in def.impropers {
        let (types, params) = improper.into_params()?;
        parameters.impropers.insert(types, params)?;
    }

    debug!(
        "Loaded force field '{}': {} rules, {} bond / {} angle / {} dihedral / {} improper entries",
        def.name,
        rules.len(),
        parameters.bonds.len(),
        parameters.angles.len(),
        parameters.dihedrals.len(),
        parameters.impropers.len()
    );

    let forcefield = Forcefield::new(def.name, rules, parameters);
    Ok(match def.version {
        Some(version) => forcefield.with_version(version),
        None => forcefield,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForcefieldDef {
    name: String,
    version: Option<String>,
    #[serde(default)]
    improper_policy: ImproperPolicy,
    #[serde(default)]
    rules: Vec<RuleDef>,
    #[serde(default)]
    bonds: Vec<BondDef>,
    #[serde(default)]
    angles: Vec<AngleDef>,
    #[serde(default)]
    dihedrals: Vec<DihedralDef>,
    #[serde(default)]
    impropers: Vec<ImproperDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    id: String,
    element: Element,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    overrides: Vec<String>,
    description: Option<String>,
    #[serde(default)]
    pattern: PatternDef,
}

impl RuleDef {
    fn into_rule(self) -> Result<TypingRule, Error> {
        if self.pattern.bond.is_some() {
            return Err(Error::invalid_definition(format!(
                "rule '{}': the pattern root has no parent bond",
                self.id
            )));
        }
        let pattern = self.pattern.into_pattern();
        let mut rule = TypingRule::new(self.id, self.element, pattern)?.overriding(self.overrides);
        if let Some(type_name) = self.type_name {
            rule = rule.with_type_name(type_name);
        }
        if let Some(description) = self.description {
            rule = rule.with_description(description);
        }
        Ok(rule)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ElementDef {
    One(Element),
    Many(Vec<Element>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PatternDef {
    element: Option<ElementDef>,
    degree: Option<usize>,
    charge: Option<i8>,
    aromatic: Option<bool>,
    in_ring: Option<bool>,
    ring_size: Option<usize>,
    #[serde(rename = "type")]
    type_ref: Option<String>,
    label: Option<String>,
    exhaustive: bool,
    bond: Option<BondOrder>,
    neighbors: Vec<PatternDef>,
    closures: Vec<ClosureDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClosureDef {
    label: String,
    bond: Option<BondOrder>,
}

fn bond_constraint(order: Option<BondOrder>) -> BondConstraint {
    order.map_or(BondConstraint::Any, BondConstraint::Order)
}

impl PatternDef {
    fn into_pattern(self) -> AtomPattern {
        let element = match self.element {
            None => ElementConstraint::Any,
            Some(ElementDef::One(e)) => ElementConstraint::Is(e),
            Some(ElementDef::Many(list)) => ElementConstraint::OneOf(list),
        };
        let mut slots: Vec<Slot> = self
            .neighbors
            .into_iter()
            .map(|child| Slot::Atom {
                bond: bond_constraint(child.bond),
                pattern: child.into_pattern(),
            })
            .collect();
        slots.extend(self.closures.into_iter().map(|c| Slot::Closure {
            bond: bond_constraint(c.bond),
            label: c.label,
        }));

        AtomPattern {
            element,
            degree: self.degree,
            formal_charge: self.charge,
            aromatic: self.aromatic,
            in_ring: self.in_ring,
            ring_size: self.ring_size,
            type_ref: self.type_ref,
            label: self.label,
            exhaustive: self.exhaustive,
            slots,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BondDef {
    types: [String; 2],
    k: f64,
    r0: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AngleDef {
    types: [String; 3],
    k: f64,
    theta0: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PeriodicDef {
    k: f64,
    periodicity: u32,
    phase: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DihedralDef {
    types: [String; 4],
    #[serde(default)]
    terms: Vec<PeriodicDef>,
    rb: Option<[f64; 6]>,
}

impl DihedralDef {
    fn into_params(self) -> Result<([String; 4], DihedralParams), Error> {
        let params = match (self.rb, self.terms.is_empty()) {
            (Some(_), false) => {
                return Err(Error::invalid_definition(format!(
                    "dihedral {} mixes periodic terms and Ryckaert-Bellemans coefficients",
                    self.types.join("-")
                )));
            }
            (Some(c), true) => DihedralParams::RyckaertBellemans(c),
            (None, _) => DihedralParams::Periodic(
                self.terms
                    .into_iter()
                    .map(|t| PeriodicTerm {
                        k: t.k,
                        periodicity: t.periodicity,
                        phase: t.phase,
                    })
                    .collect(),
            ),
        };
        Ok((self.types, params))
    }
}

/// Improper entry; `types` lists the center first.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImproperDef {
    types: [String; 4],
    k: f64,
    periodicity: Option<u32>,
    phase: Option<f64>,
    psi0: Option<f64>,
}

impl ImproperDef {
    fn into_params(self) -> Result<([String; 4], ImproperParams), Error> {
        let params = match (self.periodicity, self.phase, self.psi0) {
            (Some(periodicity), Some(phase), None) => ImproperParams::Periodic {
                k: self.k,
                periodicity,
                phase,
            },
            (None, None, Some(psi0)) => ImproperParams::Harmonic { k: self.k, psi0 },
            _ => {
                return Err(Error::invalid_definition(format!(
                    "improper {} needs either periodicity and phase, or psi0",
                    self.types.join("-")
                )));
            }
        };
        Ok((self.types, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcefield::{ImproperCenter, ImproperGeneration};

    const MINIMAL: &str = r#"
name = "mini"
version = "0.1"

[improper_policy]
generation = "all-combinations"
center = "third"

[[rules]]
id = "c2"
element = "C"
pattern = { degree = 3 }

[[rules]]
id = "ca"
element = "C"
overrides = ["c2"]
description = "aromatic carbon"
pattern = { aromatic = true }

[[rules]]
id = "ha"
element = "H"

[rules.pattern]
[[rules.pattern.neighbors]]
element = "C"
type = "ca"

[[bonds]]
types = ["ca", "ha"]
k = 344.3
r0 = 1.087

[[angles]]
types = ["ca", "ca", "ha"]
k = 48.46
theta0 = 120.01

[[dihedrals]]
types = ["*", "ca", "ca", "*"]
terms = [{ k = 3.625, periodicity = 2, phase = 180.0 }]

[[dihedrals]]
types = ["ha", "ca", "ca", "ha"]
rb = [1.0, 0.0, -1.0, 0.0, 0.0, 0.0]

[[impropers]]
types = ["ca", "*", "*", "ha"]
k = 1.1
periodicity = 2
phase = 180.0
"#;

    #[test]
    fn parses_rules_parameters_and_policy() {
        let ff = parse_forcefield(MINIMAL).unwrap();
        assert_eq!(ff.name(), "mini");
        assert_eq!(ff.version(), Some("0.1"));
        assert_eq!(ff.rules().len(), 3);
        assert!(ff.rules().is_overridden_by("c2", "ca"));
        assert!(ff.rules().has_type_references());
        assert_eq!(ff.rules().get("ca").unwrap().description(), Some("aromatic carbon"));

        let params = ff.parameters();
        assert_eq!(params.bonds.len(), 1);
        assert_eq!(params.dihedrals.len(), 2);
        assert!(matches!(
            params.dihedrals.get(["ha", "ca", "ca", "ha"]),
            Some(DihedralParams::RyckaertBellemans(_))
        ));
        assert_eq!(ff.improper_policy().generation, ImproperGeneration::AllCombinations);
        assert_eq!(ff.improper_policy().center, ImproperCenter::Third);
        assert!(!ff.improper_policy().optional);
    }

    #[test]
    fn nested_patterns_become_slots() {
        let ff = parse_forcefield(MINIMAL).unwrap();
        let ha = ff.rules().get("ha").unwrap();
        assert_eq!(ha.radius(), 1);
        match &ha.pattern().slots[0] {
            Slot::Atom { pattern, bond } => {
                assert_eq!(*bond, BondConstraint::Any);
                assert_eq!(pattern.type_ref.as_deref(), Some("ca"));
            }
            other => panic!("unexpected slot {:?}", other),
        }
    }

    #[test]
    fn element_lists_and_closures_are_read() {
        let text = r#"
name = "ring"
[[rules]]
id = "cr"
element = "C"
[rules.pattern]
label = "a"
[[rules.pattern.neighbors]]
element = ["C", "N"]
bond = "aromatic"
[[rules.pattern.neighbors.neighbors]]
element = "C"
closures = [{ label = "a" }]
"#;
        let ff = parse_forcefield(text).unwrap();
        let rule = ff.rules().get("cr").unwrap();
        assert_eq!(rule.radius(), 3);
    }

    #[test]
    fn rejects_override_cycles_from_file() {
        let text = r#"
name = "broken"
[[rules]]
id = "a"
element = "C"
overrides = ["b"]
[[rules]]
id = "b"
element = "C"
overrides = ["a"]
"#;
        let err = parse_forcefield(text).unwrap_err();
        assert!(matches!(err, Error::Forcefield(_)));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_records() {
        assert!(matches!(
            parse_forcefield("name = \"x\"\ncolour = 1\n"),
            Err(Error::Parse { .. })
        ));

        let empty_dihedral = "name = \"x\"\n[[dihedrals]]\ntypes = [\"a\", \"b\", \"c\", \"d\"]\n";
        assert!(matches!(parse_forcefield(empty_dihedral), Err(Error::Forcefield(_))));

        let half_improper =
            "name = \"x\"\n[[impropers]]\ntypes = [\"a\", \"b\", \"c\", \"d\"]\nk = 1.0\nphase = 180.0\n";
        assert!(matches!(parse_forcefield(half_improper), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn builtin_registry() {
        assert_eq!(available_forcefields(), vec!["gaff-lite"]);
        let ff = builtin_forcefield("gaff-lite").unwrap();
        assert_eq!(ff.name(), "gaff-lite");
        assert!(ff.rules().validate().is_ok());

        match builtin_forcefield("oplsaa") {
            Err(Error::UnknownForcefield { name, available }) => {
                assert_eq!(name, "oplsaa");
                assert_eq!(available, vec!["gaff-lite".to_string()]);
            }
            other => panic!("unexpected result {:?}", other.map(|ff| ff.name().to_string())),
        }
    }

    #[test]
    fn read_forcefield_accepts_any_reader() {
        let ff = read_forcefield(MINIMAL.as_bytes()).unwrap();
        assert_eq!(ff.name(), "mini");
    }
}
