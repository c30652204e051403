//! Mini XPath evaluator.
//!
//! Covers the descendant axis only: `//name` (absolute), `.//name`
//! (relative to the context node), `*` as a wildcard name, and an
//! optional `[@attr]` or `[@attr='value']` predicate. Anything else
//! is rejected as unsupported.

use crate::document::DocInner;
use veil_core::{Result, VeilError};

#[derive(Debug, Clone)]
pub(crate) struct XPathQuery {
    relative: bool,
    /// `None` is the `*` wildcard.
    tag: Option<String>,
    predicate: Option<Predicate>,
}

#[derive(Debug, Clone)]
struct Predicate {
    attribute: String,
    value: Option<String>,
}

impl XPathQuery {
    pub(crate) fn parse(expression: &str) -> Result<Self> {
        let unsupported = || VeilError::XPath(expression.to_string());
        let trimmed = expression.trim();
        let (relative, rest) = match trimmed.strip_prefix('.') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix("//").ok_or_else(unsupported)?;

        let (name, predicate_text) = match rest.find('[') {
            Some(idx) => (&rest[..idx], Some(&rest[idx..])),
            None => (rest, None),
        };
        let tag = match name {
            "*" => None,
            n if !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '-') => {
                Some(n.to_ascii_lowercase())
            }
            _ => return Err(unsupported()),
        };

        let predicate = match predicate_text {
            None => None,
            Some(text) => {
                let body = text
                    .strip_prefix('[')
                    .and_then(|t| t.strip_suffix(']'))
                    .and_then(|t| t.strip_prefix('@'))
                    .ok_or_else(unsupported)?;
                match body.split_once('=') {
                    None => Some(Predicate { attribute: body.to_string(), value: None }),
                    Some((attr, raw)) => {
                        let value = raw
                            .strip_prefix('\'')
                            .and_then(|v| v.strip_suffix('\''))
                            .or_else(|| raw.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                            .ok_or_else(unsupported)?;
                        Some(Predicate {
                            attribute: attr.to_string(),
                            value: Some(value.to_string()),
                        })
                    }
                }
            }
        };

        Ok(Self { relative, tag, predicate })
    }

    /// Evaluate against the store: descendants of `context` when the
    /// query is relative (and a context is given), else the whole
    /// document including its root.
    pub(crate) fn evaluate(
        &self,
        doc: &DocInner,
        context: Option<usize>,
        doc_root: usize,
    ) -> Vec<usize> {
        let candidates: Vec<usize> = match (self.relative, context) {
            (true, Some(node)) => doc.descendants(node),
            _ => {
                let mut all = vec![doc_root];
                all.extend(doc.descendants(doc_root));
                all
            }
        };
        candidates
            .into_iter()
            .filter(|&i| self.node_matches(doc, i))
            .collect()
    }

    fn node_matches(&self, doc: &DocInner, node: usize) -> bool {
        if let Some(tag) = &self.tag {
            if !doc.nodes[node].tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        match &self.predicate {
            None => true,
            Some(Predicate { attribute, value: None }) => doc.has_attribute(node, attribute),
            Some(Predicate { attribute, value: Some(expected) }) => {
                doc.attribute(node, attribute) == Some(expected.as_str())
            }
        }
    }
}
