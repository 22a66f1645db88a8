use super::config::{ErrorPolicy, ForgeConfig};
use super::error::{Error, ParametrizationError};
use super::terms::TermSet;
use crate::forcefield::{ImproperCenter, ParameterRecord, ParameterSet, ParameterTable, WILDCARD};
use crate::model::graph::MolecularGraph;
use crate::model::topology::{BondedTerm, ParametrizedTopology, TermKind, UnparametrizedTerm};
use log::{debug, info, warn};
use rayon::prelude::*;

enum Lookup<const N: usize, P> {
    Found(BondedTerm<N, P>),
    Missing(UnparametrizedTerm),
}

pub fn build_parametrized_topology(
    graph: MolecularGraph,
    parameters: &ParameterSet,
    forcefield: &str,
    config: &ForgeConfig,
) -> Result<ParametrizedTopology, Error> {
    let untyped: Vec<ParametrizationError> = (0..graph.atom_count())
        .filter(|&atom| graph.assigned_type(atom).is_none())
        .map(|atom| ParametrizationError::UntypedAtom { atom })
        .collect();
    if !untyped.is_empty() {
        return Err(fail(untyped, config));
    }

    let policy = parameters.improper_policy;
    let terms = TermSet::enumerate(&graph, &policy);
    debug!(
        "Enumerated {} terms ({} bonds, {} angles, {} dihedrals, {} impropers)",
        terms.len(),
        terms.bonds.len(),
        terms.angles.len(),
        terms.dihedrals.len(),
        terms.impropers.len()
    );

    let mut missing = Vec::new();

    let bonds = split(
        lookup_all(&graph, &parameters.bonds, &terms.bonds, config)?,
        &mut missing,
    );
    let angles = split(
        lookup_all(&graph, &parameters.angles, &terms.angles, config)?,
        &mut missing,
    );
    let dihedrals = split(
        lookup_all(&graph, &parameters.dihedrals, &terms.dihedrals, config)?,
        &mut missing,
    );

    let mut impropers = Vec::with_capacity(terms.impropers.len());
    for outcome in lookup_all(&graph, &parameters.impropers, &terms.impropers, config)? {
        match outcome {
            Lookup::Found(mut term) => {
                term.atoms = orient_improper(term.atoms, policy.center);
                impropers.push(term);
            }
            Lookup::Missing(mut term) => {
                term.atoms = orient_improper(to_quad(&term.atoms), policy.center).to_vec();
                term.types = orient_types(term.types, policy.center);
                if policy.optional {
                    warn!("Dropping optional {}", term);
                } else {
                    missing.push(term);
                }
            }
        }
    }

    if !missing.is_empty() && !config.best_effort {
        let errors = missing
            .into_iter()
            .map(ParametrizationError::MissingParameter)
            .collect();
        return Err(fail(errors, config));
    }
    if !missing.is_empty() {
        warn!("{} term(s) left unparametrized in best-effort mode", missing.len());
    }

    let topology = ParametrizedTopology {
        forcefield: forcefield.to_string(),
        graph,
        bonds,
        angles,
        dihedrals,
        impropers,
        unparametrized: missing,
    };
    info!(
        "Parametrized {} bonded terms with '{}'",
        topology.term_count(),
        forcefield
    );
    Ok(topology)
}

fn fail(mut errors: Vec<ParametrizationError>, config: &ForgeConfig) -> Error {
    if config.error_policy == ErrorPolicy::FirstError {
        errors.truncate(1);
    }
    Error::Parametrization(errors)
}

fn split<const N: usize, P>(
    outcomes: Vec<Lookup<N, P>>,
    missing: &mut Vec<UnparametrizedTerm>,
) -> Vec<BondedTerm<N, P>> {
    let mut found = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Lookup::Found(term) => found.push(term),
            Lookup::Missing(term) => missing.push(term),
        }
    }
    found
}

fn lookup_all<const N: usize, P>(
    graph: &MolecularGraph,
    table: &ParameterTable<N, P>,
    tuples: &[[usize; N]],
    config: &ForgeConfig,
) -> Result<Vec<Lookup<N, P>>, Error>
where
    P: ParameterRecord + Clone + Send + Sync,
{
    let lookup_one = |atoms: &[usize; N]| -> Option<Lookup<N, P>> {
        if config.is_cancelled() {
            return None;
        }
        Some(lookup_term(graph, table, *atoms))
    };

    let outcomes: Option<Vec<_>> = if config.parallel {
        tuples.par_iter().map(lookup_one).collect()
    } else {
        tuples.iter().map(lookup_one).collect()
    };
    outcomes.ok_or(Error::Cancelled)
}

fn lookup_term<const N: usize, P>(
    graph: &MolecularGraph,
    table: &ParameterTable<N, P>,
    atoms: [usize; N],
) -> Lookup<N, P>
where
    P: ParameterRecord + Clone,
{
    let types: [String; N] =
        atoms.map(|atom| graph.assigned_type(atom).unwrap_or_default().to_string());

    match table.lookup(&types) {
        Some((key, params)) => {
            if key.iter().any(|t| t == WILDCARD) {
                debug!(
                    "{} {:?} ({}) resolved through wildcard key {}",
                    table.kind(),
                    atoms,
                    types.join("-"),
                    key.join("-")
                );
            }
            Lookup::Found(BondedTerm {
                atoms,
                key,
                params: params.clone(),
            })
        }
        None => Lookup::Missing(UnparametrizedTerm {
            kind: table.kind(),
            atoms: atoms.to_vec(),
            types: types.to_vec(),
        }),
    }
}

/// Reorders a center-first improper tuple to the declared center position.
fn orient_improper(atoms: [usize; 4], center: ImproperCenter) -> [usize; 4] {
    match center {
        ImproperCenter::First => atoms,
        ImproperCenter::Third => [atoms[1], atoms[2], atoms[0], atoms[3]],
    }
}

fn orient_types(types: Vec<String>, center: ImproperCenter) -> Vec<String> {
    match (center, <[String; 4]>::try_from(types)) {
        (ImproperCenter::Third, Ok([c, a, b, d])) => vec![a, b, c, d],
        (_, Ok(quad)) => quad.to_vec(),
        (_, Err(types)) => types,
    }
}

fn to_quad(atoms: &[usize]) -> [usize; 4] {
    debug_assert_eq!(atoms.len(), TermKind::Improper.arity());
    let mut quad = [0; 4];
    quad.copy_from_slice(&atoms[..4]);
    quad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcefield::{
        AngleParams, AtomPattern, BondParams, DihedralParams, ImproperGeneration, ImproperParams,
        ImproperPolicy, PeriodicTerm, RuleTable, TypingRule,
    };
    use crate::forge::typer::assign_types;
    use crate::model::atom::Atom;
    use crate::model::graph::ValenceCheck;
    use crate::model::system::System;
    use crate::model::types::{BondOrder, Element};

    fn serial() -> ForgeConfig {
        ForgeConfig::default().with_parallel(false)
    }

    fn typed_benzene() -> MolecularGraph {
        let mut sys = System::new();
        for _ in 0..6 {
            sys.add_atom(Atom::new(Element::C));
        }
        for _ in 0..6 {
            sys.add_atom(Atom::new(Element::H));
        }
        for i in 0..6 {
            sys.add_bond(i, (i + 1) % 6, BondOrder::Aromatic);
            sys.add_bond(i, i + 6, BondOrder::Single);
        }
        let graph = MolecularGraph::from_system(&sys, ValenceCheck::Advisory).unwrap();
        let rules = RuleTable::new(vec![
            TypingRule::new("ca", Element::C, AtomPattern::any().aromatic(true)).unwrap(),
            TypingRule::new("ha", Element::H, AtomPattern::any()).unwrap(),
        ])
        .unwrap();
        assign_types(graph, &rules, &serial()).unwrap()
    }

    fn torsion() -> DihedralParams {
        DihedralParams::Periodic(vec![PeriodicTerm {
            k: 3.625,
            periodicity: 2,
            phase: 180.0,
        }])
    }

    fn benzene_parameters(policy: ImproperPolicy) -> ParameterSet {
        let mut set = ParameterSet::default();
        set.bonds.insert(["ca", "ca"], BondParams { k: 478.4, r0: 1.387 }).unwrap();
        set.bonds.insert(["ca", "ha"], BondParams { k: 344.3, r0: 1.087 }).unwrap();
        set.angles.insert(["ca", "ca", "ca"], AngleParams { k: 67.18, theta0: 119.97 }).unwrap();
        set.angles.insert(["ca", "ca", "ha"], AngleParams { k: 48.46, theta0: 120.01 }).unwrap();
        set.dihedrals.insert(["*", "ca", "ca", "*"], torsion()).unwrap();
        set.impropers
            .insert(
                ["ca", "*", "*", "ha"],
                ImproperParams::Periodic {
                    k: 1.1,
                    periodicity: 2,
                    phase: 180.0,
                },
            )
            .unwrap();
        set.improper_policy = policy;
        set
    }

    fn three_center_third() -> ImproperPolicy {
        ImproperPolicy {
            generation: ImproperGeneration::ExactlyThree,
            center: ImproperCenter::Third,
            optional: false,
        }
    }

    #[test]
    fn parametrizes_every_benzene_term() {
        let params = benzene_parameters(three_center_third());
        let topo = build_parametrized_topology(typed_benzene(), &params, "test", &serial()).unwrap();
        assert_eq!(topo.bonds.len(), 12);
        assert_eq!(topo.angles.len(), 18);
        assert_eq!(topo.dihedrals.len(), 24);
        assert_eq!(topo.impropers.len(), 6);
        assert_eq!(topo.periodic_torsions().count(), 30);
        assert!(topo.is_complete());
    }

    #[test]
    fn wildcard_key_is_recorded_on_the_term() {
        let params = benzene_parameters(three_center_third());
        let topo = build_parametrized_topology(typed_benzene(), &params, "test", &serial()).unwrap();
        let wild = ["*".to_string(), "ca".to_string(), "ca".to_string(), "*".to_string()];
        assert!(topo.dihedrals.iter().all(|d| d.key == wild));
    }

    #[test]
    fn impropers_follow_declared_center_position() {
        let params = benzene_parameters(three_center_third());
        let topo = build_parametrized_topology(typed_benzene(), &params, "test", &serial()).unwrap();
        for imp in &topo.impropers {
            assert!(imp.atoms[2] < 6, "center should be a carbon: {:?}", imp.atoms);
            assert_eq!(imp.key[0], "ca");
        }
    }

    #[test]
    fn missing_parameters_fail_with_term_context() {
        let mut params = benzene_parameters(ImproperPolicy::default());
        params.bonds = ParameterTable::new(TermKind::Bond);
        params.bonds.insert(["ca", "ca"], BondParams { k: 478.4, r0: 1.387 }).unwrap();
        let err = build_parametrized_topology(typed_benzene(), &params, "test", &serial()).unwrap_err();
        let errors = err.parametrization_errors();
        assert_eq!(errors.len(), 6);
        match &errors[0] {
            ParametrizationError::MissingParameter(term) => {
                assert_eq!(term.kind, TermKind::Bond);
                assert_eq!(term.types, vec!["ca".to_string(), "ha".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn best_effort_reports_instead_of_failing() {
        let mut params = benzene_parameters(ImproperPolicy::default());
        params.angles = ParameterTable::new(TermKind::Angle);
        let config = serial().with_best_effort(true);
        let topo = build_parametrized_topology(typed_benzene(), &params, "test", &config).unwrap();
        assert!(topo.angles.is_empty());
        assert_eq!(topo.unparametrized.len(), 18);
        assert!(!topo.is_complete());
    }

    #[test]
    fn optional_impropers_are_dropped() {
        let mut params = benzene_parameters(ImproperPolicy {
            optional: true,
            ..three_center_third()
        });
        params.impropers = ParameterTable::new(TermKind::Improper);
        let topo = build_parametrized_topology(typed_benzene(), &params, "test", &serial()).unwrap();
        assert!(topo.impropers.is_empty());
        assert!(topo.is_complete());
    }

    #[test]
    fn untyped_graph_is_rejected() {
        let mut sys = System::new();
        sys.add_atom(Atom::new(Element::H));
        sys.add_atom(Atom::new(Element::H));
        sys.add_bond(0, 1, BondOrder::Single);
        let graph = MolecularGraph::from_system(&sys, ValenceCheck::Advisory).unwrap();
        let err = build_parametrized_topology(graph, &ParameterSet::default(), "test", &serial())
            .unwrap_err();
        assert!(matches!(
            err.parametrization_errors(),
            [ParametrizationError::UntypedAtom { atom: 0 }, ParametrizationError::UntypedAtom { atom: 1 }]
        ));
    }

    #[test]
    fn orientation_helpers_move_center_to_third() {
        assert_eq!(orient_improper([0, 1, 2, 3], ImproperCenter::Third), [1, 2, 0, 3]);
        assert_eq!(orient_improper([0, 1, 2, 3], ImproperCenter::First), [0, 1, 2, 3]);
        let types = vec!["c".to_string(), "a".to_string(), "b".to_string(), "d".to_string()];
        assert_eq!(orient_types(types, ImproperCenter::Third), vec!["a", "b", "c", "d"]);
    }
}
