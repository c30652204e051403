//! Filter evaluator.
//!
//! Threads a candidate node set through the compiled pipeline.
//! Two entry fast paths avoid materializing every element in the
//! tree, and node-independent operators are tested against a single
//! representative since their outcome is the same for every node.

use crate::filter::CompiledFilter;
use crate::operator::Operator;
use veil_core::{Result, TreeBackend};

impl CompiledFilter {
    /// Evaluate against `tree`, starting from `init_nodes` when
    /// given (used for nested sub-filters and element-scoped
    /// evaluation), else from the whole tree. Returns the surviving
    /// candidates in accumulated order.
    pub fn evaluate<T: TreeBackend>(
        &self,
        tree: &T,
        init_nodes: Option<Vec<T::Node>>,
    ) -> Result<Vec<T::Node>> {
        let operators = self.operators();
        let mut index = 0;

        let mut candidates = match init_nodes {
            Some(nodes) => nodes,
            None => match &operators[0] {
                // Entry css-selector: one whole-tree query instead of
                // filtering every element. Leading sibling/child
                // combinators need a context node, so they take the
                // fallback path below.
                Operator::CssSelector(selector) if !has_leading_combinator(selector) => {
                    index = 1;
                    tree.query_all(selector.trim())?
                }
                Operator::XPath(expression) => {
                    index = 1;
                    tree.evaluate_xpath(None, expression)?
                }
                _ => tree.all_elements(),
            },
        };

        while index < operators.len() && !candidates.is_empty() {
            let operator = &operators[index];
            if operator.is_node_independent() {
                // Identical for every node: test one representative.
                // A pass leaves the candidate set untouched; a fail
                // ends the pipeline with no matches.
                if operator.apply(tree, &candidates[0])?.is_empty() {
                    candidates.clear();
                }
            } else {
                let mut next = Vec::new();
                for node in &candidates {
                    next.extend(operator.apply(tree, node)?);
                }
                candidates = next;
            }
            tracing::trace!(
                stage = index,
                kind = operator.kind(),
                survivors = candidates.len(),
                "pipeline stage applied"
            );
            index += 1;
        }

        Ok(candidates)
    }
}

fn has_leading_combinator(selector: &str) -> bool {
    matches!(selector.trim_start().chars().next(), Some('+' | '~' | '>'))
}
