use super::config::{ErrorPolicy, ForgeConfig};
use super::error::{Error, TypingError};
use super::matcher::{self, MatchContext};
use crate::forcefield::RuleTable;
use crate::model::graph::MolecularGraph;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Matched rule indices per atom, in rule-table order.
type MatchSets = Vec<Vec<usize>>;

pub fn assign_types(
    mut graph: MolecularGraph,
    rules: &RuleTable,
    config: &ForgeConfig,
) -> Result<MolecularGraph, Error> {
    if graph.has_assigned_types() {
        return Err(Error::AlreadyTyped);
    }

    debug!(
        "Typing {} atoms against {} rules ({} elements covered)",
        graph.atom_count(),
        rules.len(),
        rules.elements().len()
    );

    let (matched, rounds) = if rules.has_type_references() {
        resolve_fixpoint(&graph, rules, config)?
    } else {
        (match_round(&graph, rules, config, None)?, 1)
    };

    let mut types = Vec::with_capacity(graph.atom_count());
    let mut errors = Vec::new();
    for (atom, candidates) in matched.iter().enumerate() {
        match select_type(&graph, rules, atom, candidates) {
            Ok(name) => types.push(name),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        if config.error_policy == ErrorPolicy::FirstError {
            errors.truncate(1);
        }
        return Err(Error::Typing(errors));
    }

    graph.commit_types(types);
    info!("Assigned types to {} atoms in {} matching round(s)", graph.atom_count(), rounds);
    Ok(graph)
}

/// Repeats matching against the previous round's candidate types until no
/// atom's candidate set changes. Type references are positive, so candidate
/// sets only grow and the loop is bounded by the number of rules.
fn resolve_fixpoint(
    graph: &MolecularGraph,
    rules: &RuleTable,
    config: &ForgeConfig,
) -> Result<(MatchSets, usize), Error> {
    let mut matched = match_round(graph, rules, config, None)?;
    let mut rounds = 1;
    loop {
        let candidates = candidate_types(rules, &matched);
        let next = match_round(graph, rules, config, Some(&candidates))?;
        rounds += 1;
        if next == matched {
            debug!("Type references settled after {} rounds", rounds);
            return Ok((next, rounds));
        }
        matched = next;
    }
}

fn candidate_types(rules: &RuleTable, matched: &MatchSets) -> Vec<BTreeSet<String>> {
    matched
        .iter()
        .map(|indices| {
            indices
                .iter()
                .map(|&idx| rules.rule_at(idx).type_name().to_string())
                .collect()
        })
        .collect()
}

fn match_round(
    graph: &MolecularGraph,
    rules: &RuleTable,
    config: &ForgeConfig,
    candidates: Option<&[BTreeSet<String>]>,
) -> Result<MatchSets, Error> {
    let mut ctx = MatchContext::new(graph);
    if let Some(sets) = candidates {
        ctx = ctx.with_candidates(sets);
    }

    let match_atom = |atom: usize| -> Option<Vec<usize>> {
        if config.is_cancelled() {
            return None;
        }
        Some(
            rules
                .element_indices(graph.element(atom))
                .iter()
                .copied()
                .filter(|&idx| matcher::matches(ctx, atom, rules.rule_at(idx)))
                .collect(),
        )
    };

    let matched: Option<MatchSets> = if config.parallel {
        (0..graph.atom_count()).into_par_iter().map(match_atom).collect()
    } else {
        (0..graph.atom_count()).map(match_atom).collect()
    };

    matched.ok_or(Error::Cancelled)
}

/// Drops every candidate overridden by another candidate and returns the type
/// of the single survivor.
fn select_type(
    graph: &MolecularGraph,
    rules: &RuleTable,
    atom: usize,
    candidates: &[usize],
) -> Result<String, TypingError> {
    let element = graph.element(atom);
    if candidates.is_empty() {
        return Err(TypingError::NoMatchingRule { atom, element });
    }

    let survivors: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&b| {
            !candidates
                .iter()
                .any(|&a| a != b && rules.overrides_index(a, b))
        })
        .collect();

    let names: BTreeSet<&str> = survivors
        .iter()
        .map(|&idx| rules.rule_at(idx).type_name())
        .collect();

    match names.into_iter().collect::<Vec<_>>().as_slice() {
        [name] => Ok(name.to_string()),
        _ => {
            let mut ids: Vec<String> = survivors
                .iter()
                .map(|&idx| rules.rule_at(idx).id().to_string())
                .collect();
            ids.sort();
            Err(TypingError::AmbiguousType {
                atom,
                element,
                candidates: ids,
            })
        }
    }
}
