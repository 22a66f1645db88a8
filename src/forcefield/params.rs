//! Bonded parameter tables with wildcard fallback.
//!
//! Keys are tuples of atom-type names; the type name [`WILDCARD`] matches any
//! type in its position. Keys are stored in canonical order and queries are
//! canonicalized the same way, so a table never depends on the orientation its
//! entries were written in:
//!
//! - bonds: both types sorted
//! - angles: center fixed, end types sorted
//! - dihedrals: whichever of the two end-to-end orderings sorts first
//! - impropers: center first, the three neighbor types sorted
//!
//! Lookup tries the exact tuple first, then progressively more wildcarded keys.
//! Outer positions are wildcarded before inner ones (the angle center, the two
//! central dihedral atoms, the improper center), so the positions that determine
//! the interaction keep their specificity longest.

use super::error::Error;
use crate::model::topology::TermKind;
use serde::Deserialize;
use std::collections::HashMap;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondParams {
    pub k: f64,
    pub r0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParams {
    pub k: f64,
    pub theta0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTerm {
    pub k: f64,
    pub periodicity: u32,
    pub phase: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DihedralParams {
    Periodic(Vec<PeriodicTerm>),
    RyckaertBellemans([f64; 6]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImproperParams {
    Periodic { k: f64, periodicity: u32, phase: f64 },
    Harmonic { k: f64, psi0: f64 },
}

/// Sanity checks applied when a record enters a table.
pub trait ParameterRecord {
    fn check(&self) -> Result<(), String>;
}

fn finite(values: &[f64]) -> Result<(), String> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err("parameter values must be finite".to_string())
    }
}

impl ParameterRecord for BondParams {
    fn check(&self) -> Result<(), String> {
        finite(&[self.k, self.r0])
    }
}

impl ParameterRecord for AngleParams {
    fn check(&self) -> Result<(), String> {
        finite(&[self.k, self.theta0])
    }
}

impl ParameterRecord for DihedralParams {
    fn check(&self) -> Result<(), String> {
        match self {
            DihedralParams::Periodic(terms) if terms.is_empty() => {
                Err("periodic dihedral needs at least one term".to_string())
            }
            DihedralParams::Periodic(terms) => terms
                .iter()
                .try_for_each(|t| finite(&[t.k, t.phase])),
            DihedralParams::RyckaertBellemans(c) => finite(c),
        }
    }
}

impl ParameterRecord for ImproperParams {
    fn check(&self) -> Result<(), String> {
        match *self {
            ImproperParams::Periodic { k, phase, .. } => finite(&[k, phase]),
            ImproperParams::Harmonic { k, psi0 } => finite(&[k, psi0]),
        }
    }
}

/// Puts a type tuple into the canonical order for its interaction kind.
pub fn canonicalize<const N: usize>(kind: TermKind, key: &mut [String; N]) {
    match kind {
        TermKind::Bond => key.sort(),
        TermKind::Angle => {
            if key[0] > key[N - 1] {
                key.swap(0, N - 1);
            }
        }
        TermKind::Dihedral => {
            let mut reversed = key.clone();
            reversed.reverse();
            if reversed < *key {
                *key = reversed;
            }
        }
        TermKind::Improper => key[1..].sort(),
    }
}

fn inner_positions(kind: TermKind) -> &'static [usize] {
    match kind {
        TermKind::Bond => &[],
        TermKind::Angle => &[1],
        TermKind::Dihedral => &[1, 2],
        TermKind::Improper => &[0],
    }
}

/// Wildcard masks in the order lookup tries them: fewest inner wildcards first,
/// then fewest outer wildcards, then lowest position.
fn specificity_masks(kind: TermKind, arity: usize) -> Vec<u32> {
    let inner = inner_positions(kind);
    let inner_mask: u32 = inner.iter().map(|&p| 1u32 << p).sum();
    let mut masks: Vec<u32> = (0..(1u32 << arity)).collect();
    masks.sort_by_key(|&m| {
        (
            (m & inner_mask).count_ones(),
            (m & !inner_mask).count_ones(),
            m,
        )
    });
    masks
}

#[derive(Debug, Clone)]
pub struct ParameterTable<const N: usize, P> {
    kind: TermKind,
    entries: HashMap<[String; N], P>,
    masks: Vec<u32>,
    has_wildcards: bool,
}

impl<const N: usize, P: ParameterRecord> ParameterTable<N, P> {
    pub fn new(kind: TermKind) -> Self {
        debug_assert_eq!(kind.arity(), N);
        Self {
            kind,
            entries: HashMap::new(),
            masks: specificity_masks(kind, N),
            has_wildcards: false,
        }
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an entry under its canonical key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for duplicate keys and for records
    /// that fail their sanity check.
    pub fn insert<S: AsRef<str>>(&mut self, key: [S; N], params: P) -> Result<(), Error> {
        let mut key = key.map(|s| s.as_ref().to_string());
        canonicalize(self.kind, &mut key);
        let label = self.kind_label();
        if let Err(detail) = params.check() {
            return Err(Error::invalid_parameter(label, &key, detail));
        }
        if self.entries.contains_key(&key) {
            return Err(Error::invalid_parameter(label, &key, "duplicate entry"));
        }
        self.has_wildcards |= key.iter().any(|t| t == WILDCARD);
        self.entries.insert(key, params);
        Ok(())
    }

    /// Exact lookup with canonicalization but no wildcard fallback.
    pub fn get<S: AsRef<str>>(&self, key: [S; N]) -> Option<&P> {
        let mut key = key.map(|s| s.as_ref().to_string());
        canonicalize(self.kind, &mut key);
        self.entries.get(&key)
    }

    /// Finds the most specific entry for a type tuple and returns it with the
    /// canonical key that matched.
    pub fn lookup<S: AsRef<str>>(&self, types: &[S; N]) -> Option<([String; N], &P)> {
        let mut query: [String; N] = std::array::from_fn(|i| types[i].as_ref().to_string());
        canonicalize(self.kind, &mut query);

        if let Some((key, params)) = self.entries.get_key_value(&query) {
            return Some((key.clone(), params));
        }
        if !self.has_wildcards {
            return None;
        }

        for &mask in self.masks.iter().skip(1) {
            let mut key = query.clone();
            for (pos, slot) in key.iter_mut().enumerate() {
                if mask & (1 << pos) != 0 {
                    *slot = WILDCARD.to_string();
                }
            }
            canonicalize(self.kind, &mut key);
            if let Some(params) = self.entries.get(&key) {
                return Some((key, params));
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[String; N], &P)> {
        self.entries.iter()
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            TermKind::Bond => "bond",
            TermKind::Angle => "angle",
            TermKind::Dihedral => "dihedral",
            TermKind::Improper => "improper",
        }
    }
}

/// Which atoms get improper terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImproperGeneration {
    #[default]
    Disabled,
    /// One term per atom with exactly three neighbors.
    ExactlyThree,
    /// One term per three-neighbor combination of every atom with three or more neighbors.
    AllCombinations,
}

/// Position of the central atom in emitted improper atom tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImproperCenter {
    #[default]
    First,
    Third,
}

/// Improper generation policy declared by a force field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImproperPolicy {
    pub generation: ImproperGeneration,
    pub center: ImproperCenter,
    /// Drop generated impropers that have no parameter entry instead of failing.
    pub optional: bool,
}

/// All bonded parameter tables of one force field.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub bonds: ParameterTable<2, BondParams>,
    pub angles: ParameterTable<3, AngleParams>,
    pub dihedrals: ParameterTable<4, DihedralParams>,
    pub impropers: ParameterTable<4, ImproperParams>,
    pub improper_policy: ImproperPolicy,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            bonds: ParameterTable::new(TermKind::Bond),
            angles: ParameterTable::new(TermKind::Angle),
            dihedrals: ParameterTable::new(TermKind::Dihedral),
            impropers: ParameterTable::new(TermKind::Improper),
            improper_policy: ImproperPolicy::default(),
        }
    }
}
