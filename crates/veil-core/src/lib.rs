//! Core data model for the Veil procedural filtering engine.
//!
//! Defines the rule input format, the text-match predicate compiler
//! used by several operators, the error taxonomy, and the tree
//! capability interface the evaluation engine is generic over.

pub mod error;
pub mod rules;
pub mod textmatch;
pub mod tree;

pub use error::{Result, VeilError};
pub use rules::{parse_rule_list, Rule, RuleArg};
pub use textmatch::{
    parse_css_property_spec, parse_key_value_spec, parse_value_spec, KeyValueMatchRules,
    TextMatchRule,
};
pub use tree::{PseudoStyle, TreeBackend};
