use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::{join_limited, wrap};

const MAX_LISTED_ATOMS: usize = 6;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        collector.collect_io_hints(err);
        collector.collect_forge_hints(err);

        if let Some(ff_err) = err.downcast_ref::<typeforge::forcefield::Error>() {
            collector.mark_typed();
            collector.collect_definition_hints(ff_err);
        }

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_io_hints(&mut self, err: &Error) {
        use typeforge::io::Error as IoError;

        let Some(io_err) = err.downcast_ref::<IoError>() else {
            return;
        };

        self.mark_typed();

        match io_err {
            IoError::Io { source } => self.collect_std_io_hints(source),

            IoError::Parse { what, .. } => {
                self.add(format!("The {} file is not valid TOML for this schema", what));
                self.add("Check for misspelled keys; unknown fields are rejected");
                if *what == "structure" {
                    self.add("Atoms need `element`; bonds need `atoms = [i, j]`");
                }
            }

            IoError::UnknownForcefield { available, .. } => {
                self.add(format!("Bundled force fields: {}", available.join(", ")));
                self.add("Load a custom definition with --ff-file <path>");
            }

            IoError::Forcefield(ff_err) => self.collect_definition_hints(ff_err),

            IoError::InvalidDefinition(_) => {
                self.add("Pattern roots take their element from the rule");
                self.add("A dihedral entry holds either `terms` or `rb`, not both");
            }

            IoError::InvalidStructure(_) => {
                self.add("Bond endpoints are zero-based indices into [[atoms]]");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File contains invalid or non-UTF-8 data");
            }

            ErrorKind::BrokenPipe => {
                self.add("Output consumer terminated early");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path and permissions");
            }
        }
    }

    fn collect_definition_hints(&mut self, err: &typeforge::forcefield::Error) {
        use typeforge::forcefield::Error as FfError;

        match err {
            FfError::DuplicateRule(id) => {
                self.add(format!("Rename one of the rules with id '{}'", id));
            }
            FfError::InvalidPattern { rule, .. } => {
                self.add(format!("Review the pattern of rule '{}'", rule));
                self.add("Closure labels must name an enclosing pattern atom");
            }
            FfError::UnknownOverride { target, .. } => {
                self.add(format!("Define rule '{}' or drop it from `overrides`", target));
            }
            FfError::SelfOverride(id) => {
                self.add(format!("Remove '{}' from its own `overrides` list", id));
            }
            FfError::OverrideNotAntisymmetric { a, b } => {
                self.add(format!("Rules '{}' and '{}' cannot both win", a, b));
                self.add("Overrides must form a strict precedence order");
            }
            FfError::OverrideCycle(id) => {
                self.add(format!("Break the override cycle through '{}'", id));
                self.add("Overrides must form a strict precedence order");
            }
            FfError::InvalidParameter { kind, .. } => {
                self.add(format!("Fix the {} parameter values; all must be finite", kind));
            }
        }
    }

    fn collect_forge_hints(&mut self, err: &Error) {
        use typeforge::{ForgeError, ParametrizationError, TypingError};

        let Some(forge_err) = err.downcast_ref::<ForgeError>() else {
            return;
        };

        self.mark_typed();

        match forge_err {
            ForgeError::MalformedGraph(_) => {
                self.add("Input structure violates graph invariants");
                self.add("Remove self-bonds and duplicate bonds from the input");
                self.add("Drop --strict-valence to downgrade valence checks to warnings");
            }

            ForgeError::AlreadyTyped => {
                self.add("Types are committed once; type a fresh graph instead");
            }

            ForgeError::Typing(errors) => {
                let unmatched: Vec<String> = errors
                    .iter()
                    .filter(|e| matches!(e, TypingError::NoMatchingRule { .. }))
                    .map(|e| e.atom().to_string())
                    .collect();
                let ambiguous: Vec<String> = errors
                    .iter()
                    .filter(|e| matches!(e, TypingError::AmbiguousType { .. }))
                    .map(|e| e.atom().to_string())
                    .collect();

                if !unmatched.is_empty() {
                    self.add(format!(
                        "No rule covers atoms {}",
                        join_limited(&unmatched, MAX_LISTED_ATOMS)
                    ));
                    self.add("Add a typing rule for that chemical environment");
                }
                if !ambiguous.is_empty() {
                    self.add(format!(
                        "Several rules match atoms {}",
                        join_limited(&ambiguous, MAX_LISTED_ATOMS)
                    ));
                    self.add("Declare which rule wins with an `overrides` entry");
                }
            }

            ForgeError::Parametrization(errors) => {
                if errors
                    .iter()
                    .any(|e| matches!(e, ParametrizationError::UntypedAtom { .. }))
                {
                    self.add("Assign types before building the topology");
                } else {
                    self.add("Add the missing entries to the parameter tables");
                    self.add("Wildcard keys (`*`) cover whole families of terms");
                    self.add("Or pass --best-effort to report them without failing");
                }
            }

            ForgeError::Cancelled => {
                self.add("The run was interrupted before it finished");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("terminal") || msg.contains("stdin") || msg.contains("tty") {
            self.add("Input appears to be from a terminal");
            self.add("Pass a structure file or pipe TOML to stdin");
            return;
        }

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    let mut text = err.to_string();

    let mut source = err.source();
    while let Some(cause) = source {
        text.push('\n');
        text.push_str(&cause.to_string());
        source = cause.source();
    }

    text.to_lowercase()
}
