//! Filter compiler.

use crate::operator::Operator;
use veil_core::{Result, Rule, VeilError};

/// An ordered operator pipeline, compiled once and evaluated
/// repeatedly. Always non-empty.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    operators: Vec<Operator>,
}

impl CompiledFilter {
    /// Bind a rule list to concrete operators. Fails on an empty
    /// list, an unknown rule type, or a malformed argument.
    pub fn compile(rules: &[Rule]) -> Result<Self> {
        if rules.is_empty() {
            return Err(VeilError::EmptyRuleList);
        }
        let operators = rules
            .iter()
            .map(Operator::compile)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(stages = operators.len(), "compiled procedural filter");
        Ok(Self { operators })
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
