//! Typing rules and the override relation between them.
//!
//! The override relation is plain data: each rule lists the identifiers of the
//! rules it is strictly more specific than. [`RuleTable`] checks that this
//! relation is a DAG (no self-overrides, no mutual overrides, no cycles) and
//! stores its transitive closure so the typing engine can reduce a match set
//! with set lookups.

use super::error::Error;
use super::pattern::{AtomPattern, ElementConstraint, PatternProgram};
use crate::model::types::Element;
use log::debug;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct TypingRule {
    id: String,
    element: Element,
    type_name: String,
    pattern: AtomPattern,
    overrides: BTreeSet<String>,
    description: Option<String>,
    program: PatternProgram,
}

impl TypingRule {
    /// Creates a rule whose pattern is centered on an atom of `element`.
    ///
    /// The assigned type name defaults to the rule identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern root names a different
    /// element, or if the pattern fails to compile.
    pub fn new(id: impl Into<String>, element: Element, mut pattern: AtomPattern) -> Result<Self, Error> {
        let id = id.into();
        match &pattern.element {
            ElementConstraint::Any => pattern.element = ElementConstraint::Is(element),
            ElementConstraint::Is(e) if *e == element => {}
            other => {
                return Err(Error::invalid_pattern(
                    &id,
                    format!("root constraint {:?} conflicts with target element {}", other, element),
                ));
            }
        }
        let program = PatternProgram::compile(&id, &pattern)?;

        Ok(Self {
            type_name: id.clone(),
            id,
            element,
            pattern,
            overrides: BTreeSet::new(),
            description: None,
            program,
        })
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn overriding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn pattern(&self) -> &AtomPattern {
        &self.pattern
    }

    /// Rules this rule directly overrides.
    pub fn overrides(&self) -> &BTreeSet<String> {
        &self.overrides
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn radius(&self) -> usize {
        self.pattern.radius()
    }

    pub(crate) fn program(&self) -> &PatternProgram {
        &self.program
    }
}

/// Validated collection of typing rules for one force field.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<TypingRule>,
    index: HashMap<String, usize>,
    by_element: HashMap<Element, Vec<usize>>,
    closure: Vec<BTreeSet<usize>>,
}

impl RuleTable {
    /// Builds a table, validating the override relation.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate identifiers, overrides naming unknown
    /// rules, self-overrides, mutual overrides, and override cycles.
    pub fn new(rules: Vec<TypingRule>) -> Result<Self, Error> {
        let mut index = HashMap::with_capacity(rules.len());
        let mut by_element: HashMap<Element, Vec<usize>> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            if index.insert(rule.id.clone(), idx).is_some() {
                return Err(Error::DuplicateRule(rule.id.clone()));
            }
            by_element.entry(rule.element).or_default().push(idx);
        }

        let edges = resolve_edges(&rules, &index)?;
        check_acyclic(&rules, &edges)?;
        let closure = transitive_closure(&edges);

        debug!(
            "rule table: {} rules over {} elements, {} direct overrides",
            rules.len(),
            by_element.len(),
            edges.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            rules,
            index,
            by_element,
            closure,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in definition order.
    pub fn rules(&self) -> &[TypingRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&TypingRule> {
        self.index.get(id).map(|&idx| &self.rules[idx])
    }

    /// Rules targeting `element`, in definition order.
    pub fn rules_for_element(&self, element: Element) -> impl Iterator<Item = &TypingRule> + '_ {
        self.element_indices(element)
            .iter()
            .map(move |&idx| &self.rules[idx])
    }

    /// Every rule `id` overrides, directly or transitively. `None` if `id` is unknown.
    pub fn overrides(&self, id: &str) -> Option<BTreeSet<&str>> {
        let idx = *self.index.get(id)?;
        Some(
            self.closure[idx]
                .iter()
                .map(|&other| self.rules[other].id.as_str())
                .collect(),
        )
    }

    /// Returns `true` if rule `a` overrides rule `b`, directly or transitively.
    pub fn is_overridden_by(&self, b: &str, a: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.closure[ia].contains(&ib),
            _ => false,
        }
    }

    /// Returns `true` if any rule pattern references candidate types.
    pub fn has_type_references(&self) -> bool {
        self.rules.iter().any(|r| r.program.has_type_references())
    }

    /// Elements that have at least one rule.
    pub fn elements(&self) -> BTreeSet<Element> {
        self.by_element.keys().copied().collect()
    }

    /// Re-checks the structural invariants of the override relation: every
    /// target exists, no rule overrides itself, and the transitive relation is
    /// antisymmetric.
    pub fn validate(&self) -> Result<(), Error> {
        let edges = resolve_edges(&self.rules, &self.index)?;
        check_acyclic(&self.rules, &edges)?;
        for (a, reach) in self.closure.iter().enumerate() {
            if reach.contains(&a) {
                return Err(Error::OverrideCycle(self.rules[a].id.clone()));
            }
            for &b in reach {
                if self.closure[b].contains(&a) {
                    return Err(not_antisymmetric(&self.rules[a].id, &self.rules[b].id));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn element_indices(&self, element: Element) -> &[usize] {
        self.by_element
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn rule_at(&self, idx: usize) -> &TypingRule {
        &self.rules[idx]
    }

    /// Index-based form of [`Self::is_overridden_by`].
    pub(crate) fn overrides_index(&self, a: usize, b: usize) -> bool {
        self.closure[a].contains(&b)
    }
}

fn not_antisymmetric(a: &str, b: &str) -> Error {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    Error::OverrideNotAntisymmetric {
        a: a.to_string(),
        b: b.to_string(),
    }
}

fn resolve_edges(rules: &[TypingRule], index: &HashMap<String, usize>) -> Result<Vec<Vec<usize>>, Error> {
    let mut edges = Vec::with_capacity(rules.len());
    for (idx, rule) in rules.iter().enumerate() {
        let mut targets = Vec::with_capacity(rule.overrides.len());
        for target in &rule.overrides {
            let Some(&t) = index.get(target) else {
                return Err(Error::UnknownOverride {
                    rule: rule.id.clone(),
                    target: target.clone(),
                });
            };
            if t == idx {
                return Err(Error::SelfOverride(rule.id.clone()));
            }
            if rules[t].overrides.contains(&rule.id) {
                return Err(not_antisymmetric(&rule.id, &rules[t].id));
            }
            targets.push(t);
        }
        edges.push(targets);
    }
    Ok(edges)
}

fn check_acyclic(rules: &[TypingRule], edges: &[Vec<usize>]) -> Result<(), Error> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; rules.len()];
    for start in 0..rules.len() {
        if marks[start] != Mark::New {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Active;
        while let Some(frame) = stack.last_mut() {
            let (node, pos) = (frame.0, frame.1);
            if pos < edges[node].len() {
                frame.1 += 1;
                let next = edges[node][pos];
                match marks[next] {
                    Mark::Active => return Err(Error::OverrideCycle(rules[next].id.clone())),
                    Mark::New => {
                        marks[next] = Mark::Active;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

fn transitive_closure(edges: &[Vec<usize>]) -> Vec<BTreeSet<usize>> {
    (0..edges.len())
        .map(|start| {
            let mut reach = BTreeSet::new();
            let mut stack: Vec<usize> = edges[start].clone();
            while let Some(node) = stack.pop() {
                if reach.insert(node) {
                    stack.extend(edges[node].iter().copied());
                }
            }
            reach
        })
        .collect()
}
