use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

use typeforge::forcefield::{DihedralParams, ImproperParams};
use typeforge::{Element, Forcefield, MolecularGraph, ParametrizedTopology, System};

use crate::util::text::{join_limited, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

const MAX_DISTRIBUTION_ROWS: usize = 15;

pub fn print_structure_info(system: &System) {
    let mut out = io::stderr().lock();

    let mut elements: BTreeMap<u8, (Element, usize)> = BTreeMap::new();
    for atom in &system.atoms {
        elements
            .entry(atom.element.atomic_number())
            .or_insert((atom.element, 0))
            .1 += 1;
    }
    let formula: String = elements
        .values()
        .map(|(e, n)| if *n == 1 { e.to_string() } else { format!("{}{}", e, n) })
        .collect();
    let net_charge: i32 = system.atoms.iter().map(|a| i32::from(a.formal_charge)).sum();

    let rows = vec![
        ("Total Atoms", system.atom_count().to_string()),
        ("Total Bonds", system.bond_count().to_string()),
        ("Composition", formula),
        ("Net Charge", format!("{:+}", net_charge)),
    ];
    print_kv_table(&mut out, "Structure Summary", &rows);
}

pub fn print_type_distribution(graph: &MolecularGraph) {
    let mut out = io::stderr().lock();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for atom in 0..graph.atom_count() {
        if let Some(name) = graph.assigned_type(atom) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    print_distribution_table(&mut out, "Atom Type Distribution", &sorted, graph.atom_count());
}

pub fn print_term_summary(topology: &ParametrizedTopology) {
    let mut out = io::stderr().lock();

    let periodic_impropers = topology
        .impropers
        .iter()
        .filter(|imp| matches!(imp.params, ImproperParams::Periodic { .. }))
        .count();
    let rb_dihedrals = topology
        .dihedrals
        .iter()
        .filter(|d| matches!(d.params, DihedralParams::RyckaertBellemans(_)))
        .count();

    let rows: Vec<(&str, usize, String)> = vec![
        ("Atom Types", topology.atom_types().len(), "unique".to_string()),
        ("Bonds", topology.bonds.len(), "harmonic".to_string()),
        ("Angles", topology.angles.len(), "harmonic".to_string()),
        (
            "Dihedrals",
            topology.dihedrals.len(),
            if rb_dihedrals > 0 { format!("{} RB", rb_dihedrals) } else { "periodic".to_string() },
        ),
        ("Impropers", topology.impropers.len(), format!("{} periodic", periodic_impropers)),
        ("Torsion List", topology.periodic_torsions().count(), "periodic".to_string()),
        ("Unparametrized", topology.unparametrized.len(), "omitted".to_string()),
    ];

    let _ = writeln!(out, "{}┌─ Bonded Terms ({}) ─┐", INDENT, truncate(&topology.forcefield, 24));
    let _ = writeln!(out, "{}┌─────────────────────┬────────┬─────────────┐", INDENT);
    let _ = writeln!(out, "{}│ Category            │  Count │ Form        │", INDENT);
    let _ = writeln!(out, "{}├─────────────────────┼────────┼─────────────┤", INDENT);
    for (category, count, form) in &rows {
        let _ = writeln!(
            out,
            "{}│ {:<19} │ {:>6} │ {:<11} │",
            INDENT,
            category,
            count,
            truncate(form, 11)
        );
    }
    let _ = writeln!(out, "{}└─────────────────────┴────────┴─────────────┘", INDENT);
}

pub fn print_forcefield_summary(forcefield: &Forcefield) {
    let mut out = io::stderr().lock();

    let rules = forcefield.rules();
    let params = forcefield.parameters();
    let policy = forcefield.improper_policy();
    let override_edges: usize = rules.rules().iter().map(|r| r.overrides().len()).sum();
    let elements: Vec<String> = rules.elements().iter().map(ToString::to_string).collect();

    let rows = vec![
        ("Name", forcefield.name().to_string()),
        ("Version", forcefield.version().unwrap_or("-").to_string()),
        ("Typing Rules", rules.len().to_string()),
        ("Elements", join_limited(&elements, 8)),
        ("Override Edges", override_edges.to_string()),
        ("Bond Entries", params.bonds.len().to_string()),
        ("Angle Entries", params.angles.len().to_string()),
        ("Dihedral Entries", params.dihedrals.len().to_string()),
        ("Improper Entries", params.impropers.len().to_string()),
        (
            "Improper Policy",
            format!(
                "{:?}, center {:?}{}",
                policy.generation,
                policy.center,
                if policy.optional { ", optional" } else { "" }
            ),
        ),
    ];
    print_kv_table(&mut out, "Force Field Summary", &rows);
}

/// Writes one line per rule: id, element, assigned type, and the rules it overrides.
pub fn print_rule_table(out: &mut impl Write, forcefield: &Forcefield) -> io::Result<()> {
    writeln!(out, "{:<12} {:<4} {:<8} {}", "RULE", "ELEM", "TYPE", "OVERRIDES")?;
    for rule in forcefield.rules().rules() {
        let overrides: Vec<&str> = rule.overrides().iter().map(String::as_str).collect();
        writeln!(
            out,
            "{:<12} {:<4} {:<8} {}",
            rule.id(),
            rule.element(),
            rule.type_name(),
            if overrides.is_empty() { "-".to_string() } else { overrides.join(",") }
        )?;
    }
    Ok(())
}

/// Writes one `index element type` line per atom.
pub fn write_atom_types(out: &mut impl Write, graph: &MolecularGraph) -> io::Result<()> {
    for atom in 0..graph.atom_count() {
        writeln!(
            out,
            "{:>6} {:<3} {}",
            atom,
            graph.element(atom),
            graph.assigned_type(atom).unwrap_or("?")
        )?;
    }
    Ok(())
}

/// Writes up to `limit` parametrized terms of each kind.
pub fn write_sample_terms(
    out: &mut impl Write,
    topology: &ParametrizedTopology,
    limit: usize,
) -> io::Result<()> {
    writeln!(out, "# bonds ({})", topology.bonds.len())?;
    for b in topology.bonds.iter().take(limit) {
        writeln!(
            out,
            "{:?} {} k={:.2} r0={:.3}",
            b.atoms,
            b.key.join("-"),
            b.params.k,
            b.params.r0
        )?;
    }
    writeln!(out, "# angles ({})", topology.angles.len())?;
    for a in topology.angles.iter().take(limit) {
        writeln!(
            out,
            "{:?} {} k={:.2} theta0={:.2}",
            a.atoms,
            a.key.join("-"),
            a.params.k,
            a.params.theta0
        )?;
    }
    writeln!(out, "# dihedrals ({})", topology.dihedrals.len())?;
    for d in topology.dihedrals.iter().take(limit) {
        writeln!(out, "{:?} {} {}", d.atoms, d.key.join("-"), describe_dihedral(&d.params))?;
    }
    writeln!(out, "# impropers ({})", topology.impropers.len())?;
    for i in topology.impropers.iter().take(limit) {
        writeln!(out, "{:?} {} {}", i.atoms, i.key.join("-"), describe_improper(&i.params))?;
    }
    if !topology.unparametrized.is_empty() {
        writeln!(out, "# unparametrized ({})", topology.unparametrized.len())?;
        for term in &topology.unparametrized {
            writeln!(out, "{}", term)?;
        }
    }
    Ok(())
}

fn describe_dihedral(params: &DihedralParams) -> String {
    match params {
        DihedralParams::Periodic(terms) => terms
            .iter()
            .map(|t| format!("k={:.3} n={} phase={:.1}", t.k, t.periodicity, t.phase))
            .collect::<Vec<_>>()
            .join(" + "),
        DihedralParams::RyckaertBellemans(c) => format!(
            "rb=[{}]",
            c.iter().map(|v| format!("{:.3}", v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn describe_improper(params: &ImproperParams) -> String {
    match *params {
        ImproperParams::Periodic { k, periodicity, phase } => {
            format!("k={:.3} n={} phase={:.1}", k, periodicity, phase)
        }
        ImproperParams::Harmonic { k, psi0 } => format!("k={:.3} psi0={:.1}", k, psi0),
    }
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);
    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{}{}{}{}{}{}{}",
            INDENT,
            left,
            "─".repeat(name_w + 2),
            mid,
            "─".repeat(count_w + 2),
            mid,
            "─".repeat(dist_w + 2)
        ) + right
    };

    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, truncate(title, SAFE_TABLE_WIDTH - 6));
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        INDENT, "Type", "Count", "Distribution"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (name, count) in data.iter().take(MAX_DISTRIBUTION_ROWS) {
        let pct = if total == 0 { 0.0 } else { (*count as f64 / total as f64) * 100.0 };
        let cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            truncate(name, name_w),
            count,
            cell
        );
    }
    if data.len() > MAX_DISTRIBUTION_ROWS {
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            "...",
            "...",
            format!("({} more types)", data.len() - MAX_DISTRIBUTION_ROWS)
        );
    }
    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);
    let k_line = "─".repeat(key_w + 2);
    let v_line = "─".repeat(val_w + 2);

    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, truncate(title, SAFE_TABLE_WIDTH - 6));
    let _ = writeln!(out, "{}┌{}┬{}┐", INDENT, k_line, v_line);
    let _ = writeln!(out, "{}│ {:<key_w$} │ {:>val_w$} │", INDENT, "Metric", "Value");
    let _ = writeln!(out, "{}├{}┼{}┤", INDENT, k_line, v_line);
    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w)
        );
    }
    let _ = writeln!(out, "{}└{}┴{}┘", INDENT, k_line, v_line);
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let empty = max_width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
