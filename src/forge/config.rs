//! Run-time configuration for typing and parametrization.
//!
//! Everything a force field declares about itself (rules, parameters, the
//! improper policy) lives in the [`Forcefield`](crate::Forcefield) handle. This
//! module holds what the *caller* decides per run: error reporting, parallelism,
//! best-effort output, valence strictness, and cooperative cancellation.

use crate::model::graph::ValenceCheck;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How many typing errors a failed run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Check every atom and report all failures together.
    #[default]
    CollectAll,
    /// Stop at the lowest-indexed failing atom.
    FirstError,
}

/// Cooperative abort flag shared between a caller and a running pipeline.
///
/// The pipeline checks the flag between atoms and between terms. Outputs are only
/// committed after a stage finishes, so an aborted run never leaves a partially
/// typed graph behind.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Main configuration for a typing/parametrization run.
///
/// # Examples
///
/// ```
/// use typeforge::{ErrorPolicy, ForgeConfig};
///
/// let config = ForgeConfig::default()
///     .with_error_policy(ErrorPolicy::FirstError)
///     .with_parallel(false);
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub error_policy: ErrorPolicy,
    /// Type atoms and parametrize terms on the rayon thread pool.
    pub parallel: bool,
    /// Omit terms without parameters and list them in the topology instead of failing.
    pub best_effort: bool,
    pub valence_check: ValenceCheck,
    pub cancel: Option<CancelFlag>,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::CollectAll,
            parallel: true,
            best_effort: false,
            valence_check: ValenceCheck::Advisory,
            cancel: None,
        }
    }
}

impl ForgeConfig {
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn with_valence_check(mut self, check: ValenceCheck) -> Self {
        self.valence_check = check;
        self
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}
