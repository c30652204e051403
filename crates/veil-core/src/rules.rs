//! Rule input format.
//!
//! A procedural selector arrives as an ordered list of
//! `{ "type": ..., "arg": ... }` pairs, where `arg` is either an
//! instruction string or a nested rule list (for `has`, `not` and
//! `upward`). The serde derives preserve that wire shape exactly.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One stage of a procedural selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub arg: RuleArg,
}

/// Argument of a rule: an instruction string or a nested rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleArg {
    Text(String),
    Nested(Vec<Rule>),
}

impl Rule {
    pub fn new(rule_type: impl Into<String>, arg: impl Into<String>) -> Self {
        Self { rule_type: rule_type.into(), arg: RuleArg::Text(arg.into()) }
    }

    pub fn nested(rule_type: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self { rule_type: rule_type.into(), arg: RuleArg::Nested(rules) }
    }
}

impl RuleArg {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleArg::Text(s) => Some(s),
            RuleArg::Nested(_) => None,
        }
    }
}

/// Parse a JSON-encoded procedural selector.
pub fn parse_rule_list(json: &str) -> Result<Vec<Rule>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_arg() {
        let rules = parse_rule_list(r#"[{"type": "css-selector", "arg": "div > p"}]"#).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_type, "css-selector");
        assert_eq!(rules[0].arg.as_text(), Some("div > p"));
    }

    #[test]
    fn test_parse_nested_arg() {
        let rules = parse_rule_list(
            r#"[{"type": "has", "arg": [{"type": "css-selector", "arg": ".x"}]}]"#,
        )
        .unwrap();
        match &rules[0].arg {
            RuleArg::Nested(inner) => {
                assert_eq!(inner.len(), 1);
                assert_eq!(inner[0].rule_type, "css-selector");
            }
            RuleArg::Text(_) => panic!("expected nested arg"),
        }
    }

    #[test]
    fn test_roundtrip_preserves_shape() {
        let rules = vec![Rule::nested("not", vec![Rule::new("has-text", "ad")])];
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.contains(r#""type":"not""#));
        assert_eq!(parse_rule_list(&json).unwrap(), rules);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_rule_list(r#"[{"kind": "css-selector"}]"#).is_err());
    }
}
