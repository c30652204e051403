//! Continuous match/hide engine.
//!
//! Evaluates a compiled filter once or on a poll timer, diffing each
//! match set against the set of nodes currently hidden. Newly
//! matching nodes are hidden with their prior display value recorded;
//! nodes that stop matching are restored; unchanged nodes are left
//! untouched.

use crate::filter::CompiledFilter;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::task::JoinHandle;
use veil_core::{Result, Rule, TreeBackend};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Nodes newly hidden this pass.
    pub hidden: usize,
    /// Nodes restored to their recorded display value.
    pub restored: usize,
    /// Nodes that matched before and still match.
    pub unchanged: usize,
}

/// One hide session: a compiled filter plus the registry of hidden
/// nodes and their pre-hide display values. The registry is private
/// to the session, so independent sessions never interfere.
pub struct HideSession<T: TreeBackend> {
    tree: T,
    filter: CompiledFilter,
    hidden: HashMap<T::Node, String>,
}

impl<T: TreeBackend> HideSession<T> {
    /// Compile the rule list once. No pass is run yet.
    pub fn new(tree: T, rules: &[Rule]) -> Result<Self> {
        Ok(Self {
            filter: CompiledFilter::compile(rules)?,
            tree,
            hidden: HashMap::new(),
        })
    }

    /// Run one full pass: evaluate the filter, then reconcile the
    /// match set against the hidden registry.
    pub fn tick(&mut self) -> Result<ReconcileOutcome> {
        let matching: HashSet<T::Node> =
            self.filter.evaluate(&self.tree, None)?.into_iter().collect();
        Ok(self.reconcile(matching))
    }

    fn reconcile(&mut self, matching: HashSet<T::Node>) -> ReconcileOutcome {
        let stale: Vec<T::Node> = self
            .hidden
            .keys()
            .filter(|node| !matching.contains(node))
            .cloned()
            .collect();
        let restored = stale.len();
        for node in stale {
            if let Some(previous) = self.hidden.remove(&node) {
                self.tree.set_display(&node, &previous);
            }
        }

        let mut newly_hidden = 0;
        let mut unchanged = 0;
        for node in matching {
            if self.hidden.contains_key(&node) {
                // Still matching: recorded value carries forward,
                // display stays as-is.
                unchanged += 1;
                continue;
            }
            let previous = self.tree.display(&node);
            self.tree.set_display(&node, "none");
            self.hidden.insert(node, previous);
            newly_hidden += 1;
        }

        ReconcileOutcome { hidden: newly_hidden, restored, unchanged }
    }

    /// Number of nodes currently hidden by this session.
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }
}

/// Handle to a running poll session.
pub struct CancelHandle {
    task: JoinHandle<()>,
}

impl CancelHandle {
    /// Stop future poll passes. Nodes hidden so far stay hidden;
    /// cancellation does not restore them.
    pub fn cancel(self) {
        self.task.abort();
    }
}

/// Compile `rules`, apply one hide pass, and, unless `poll_interval`
/// is zero, keep re-evaluating on that interval from a background
/// task. Each pass runs to completion before the next can fire. A
/// pass that fails stops future updates, leaving the last-good hidden
/// state applied.
///
/// Returns `None` in one-shot mode, else a [`CancelHandle`].
/// Must be called within a tokio runtime when polling is requested.
pub fn run<T>(tree: T, rules: &[Rule], poll_interval: Duration) -> Result<Option<CancelHandle>>
where
    T: TreeBackend + Send + 'static,
    T::Node: Send + 'static,
{
    let mut session = HideSession::new(tree, rules)?;
    let outcome = session.tick()?;
    tracing::debug!(hidden = outcome.hidden, "initial hide pass applied");

    if poll_interval.is_zero() {
        return Ok(None);
    }

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        // The first tick completes immediately; the initial pass
        // already ran.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match session.tick() {
                Ok(outcome) => tracing::trace!(
                    hidden = outcome.hidden,
                    restored = outcome.restored,
                    unchanged = outcome.unchanged,
                    "poll pass reconciled"
                ),
                Err(error) => {
                    tracing::error!(%error, "poll pass failed; hiding will no longer update");
                    break;
                }
            }
        }
    });

    Ok(Some(CancelHandle { task }))
}
