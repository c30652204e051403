//! Operator library.
//!
//! One variant per rule type, carrying its argument payload in parsed
//! form. Dispatch and argument parsing both happen once, in
//! `Operator::compile`; `apply` is pure matching over the tree
//! capability interface. An operator that does not match yields the
//! empty result, never an error.

use crate::filter::CompiledFilter;
use veil_core::{
    parse_css_property_spec, parse_key_value_spec, parse_value_spec, KeyValueMatchRules,
    PseudoStyle, Result, Rule, RuleArg, TextMatchRule, TreeBackend, VeilError,
};

/// `has`/`not` argument: a plain selector or a nested filter.
#[derive(Debug, Clone)]
pub enum SubFilter {
    Selector(String),
    Nested(CompiledFilter),
}

/// `upward` argument: an ancestor count, a selector, or a nested
/// filter applied as a `has`-style test to each ancestor.
#[derive(Debug, Clone)]
pub enum UpwardInstruction {
    Ancestors(u8),
    Selector(String),
    Nested(CompiledFilter),
}

/// A compiled pipeline stage.
#[derive(Debug, Clone)]
pub enum Operator {
    CssSelector(String),
    Has(SubFilter),
    Not(SubFilter),
    HasText(TextMatchRule),
    MatchesAttr(KeyValueMatchRules),
    MatchesProperty(KeyValueMatchRules),
    MatchesCss {
        pseudo: Option<PseudoStyle>,
        property: String,
        value: TextMatchRule,
    },
    MatchesMedia(String),
    MatchesPath(TextMatchRule),
    MinTextLength(usize),
    Upward(UpwardInstruction),
    XPath(String),
}

impl Operator {
    /// Compile one rule into its operator. Unknown rule types and
    /// malformed arguments are errors.
    pub fn compile(rule: &Rule) -> Result<Self> {
        let op = match rule.rule_type.as_str() {
            "css-selector" => Self::CssSelector(text_arg(rule)?.to_string()),
            "has" => Self::Has(sub_filter_arg(rule)?),
            "not" => Self::Not(sub_filter_arg(rule)?),
            "has-text" | "contains" => Self::HasText(parse_value_spec(text_arg(rule)?)?),
            "matches-attr" => Self::MatchesAttr(parse_key_value_spec(text_arg(rule)?)?),
            "matches-property" => Self::MatchesProperty(parse_key_value_spec(text_arg(rule)?)?),
            "matches-css" => compile_matches_css(rule, None)?,
            "matches-css-before" => compile_matches_css(rule, Some(PseudoStyle::Before))?,
            "matches-css-after" => compile_matches_css(rule, Some(PseudoStyle::After))?,
            "matches-media" => Self::MatchesMedia(text_arg(rule)?.to_string()),
            "matches-path" => Self::MatchesPath(parse_value_spec(text_arg(rule)?)?),
            "min-text-length" => {
                let text = text_arg(rule)?;
                let min = text.trim().parse::<usize>().map_err(|_| {
                    VeilError::Argument(format!("min-text-length: invalid arg {text:?}"))
                })?;
                Self::MinTextLength(min)
            }
            "upward" => Self::Upward(compile_upward(rule)?),
            "xpath" => Self::XPath(text_arg(rule)?.to_string()),
            other => {
                return Err(VeilError::UnknownRuleType { rule_type: other.to_string() });
            }
        };
        Ok(op)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CssSelector(_) => "css-selector",
            Self::Has(_) => "has",
            Self::Not(_) => "not",
            Self::HasText(_) => "has-text",
            Self::MatchesAttr(_) => "matches-attr",
            Self::MatchesProperty(_) => "matches-property",
            Self::MatchesCss { pseudo: None, .. } => "matches-css",
            Self::MatchesCss { pseudo: Some(PseudoStyle::Before), .. } => "matches-css-before",
            Self::MatchesCss { pseudo: Some(PseudoStyle::After), .. } => "matches-css-after",
            Self::MatchesMedia(_) => "matches-media",
            Self::MatchesPath(_) => "matches-path",
            Self::MinTextLength(_) => "min-text-length",
            Self::Upward(_) => "upward",
            Self::XPath(_) => "xpath",
        }
    }

    /// Whether the result is the same for every node, so the
    /// evaluator may test a single representative.
    pub fn is_node_independent(&self) -> bool {
        matches!(self, Self::MatchesMedia(_) | Self::MatchesPath(_))
    }

    /// Apply the operator to one node.
    pub fn apply<T: TreeBackend>(&self, tree: &T, node: &T::Node) -> Result<Vec<T::Node>> {
        match self {
            Self::CssSelector(selector) => apply_css_selector(tree, selector, node),
            Self::Has(sub) => keep_if(sub_filter_matches(tree, sub, node)?, node),
            Self::Not(sub) => keep_if(!sub_filter_matches(tree, sub, node)?, node),
            Self::HasText(rule) => keep_if(rule.matches(&tree.text_content(node)), node),
            Self::MatchesAttr((key_rule, value_rule)) => {
                for name in tree.attribute_names(node) {
                    if !key_rule.matches(&name) {
                        continue;
                    }
                    // A present-but-valueless attribute never matches.
                    match tree.attribute(node, &name) {
                        Some(value) if value_rule.matches(&value) => return keep(node),
                        _ => continue,
                    }
                }
                Ok(Vec::new())
            }
            Self::MatchesProperty((key_rule, value_rule)) => {
                for (name, value) in tree.properties(node) {
                    if key_rule.matches(&name) && value_rule.matches(&value) {
                        return keep(node);
                    }
                }
                Ok(Vec::new())
            }
            Self::MatchesCss { pseudo, property, value } => {
                match tree.computed_style(node, *pseudo, property) {
                    Some(actual) => keep_if(value.matches(&actual), node),
                    None => Ok(Vec::new()),
                }
            }
            Self::MatchesMedia(query) => keep_if(tree.matches_media(query), node),
            Self::MatchesPath(rule) => keep_if(rule.matches(&tree.location_path_query()), node),
            Self::MinTextLength(min) => {
                keep_if(tree.text_content(node).trim().chars().count() >= *min, node)
            }
            Self::Upward(instruction) => apply_upward(tree, instruction, node),
            Self::XPath(expression) => tree.evaluate_xpath(Some(node), expression),
        }
    }
}

fn text_arg(rule: &Rule) -> Result<&str> {
    rule.arg.as_text().ok_or_else(|| {
        VeilError::Argument(format!(
            "{}: expected an instruction string, got a nested rule list",
            rule.rule_type
        ))
    })
}

fn sub_filter_arg(rule: &Rule) -> Result<SubFilter> {
    match &rule.arg {
        RuleArg::Text(selector) => Ok(SubFilter::Selector(selector.clone())),
        RuleArg::Nested(rules) => Ok(SubFilter::Nested(CompiledFilter::compile(rules)?)),
    }
}

fn compile_matches_css(rule: &Rule, pseudo: Option<PseudoStyle>) -> Result<Operator> {
    let (property, expected) = parse_css_property_spec(text_arg(rule)?)?;
    Ok(Operator::MatchesCss {
        pseudo,
        property,
        value: TextMatchRule::compile(&expected, true)?,
    })
}

fn compile_upward(rule: &Rule) -> Result<UpwardInstruction> {
    match &rule.arg {
        RuleArg::Nested(rules) => Ok(UpwardInstruction::Nested(CompiledFilter::compile(rules)?)),
        RuleArg::Text(text) => match text.trim().parse::<i64>() {
            Ok(n) if (1..=255).contains(&n) => Ok(UpwardInstruction::Ancestors(n as u8)),
            Ok(n) => Err(VeilError::Argument(format!("upward: invalid arg, {n}"))),
            Err(_) => Ok(UpwardInstruction::Selector(text.clone())),
        },
    }
}

fn keep<N: Clone>(node: &N) -> Result<Vec<N>> {
    Ok(vec![node.clone()])
}

fn keep_if<N: Clone>(condition: bool, node: &N) -> Result<Vec<N>> {
    if condition {
        keep(node)
    } else {
        Ok(Vec::new())
    }
}

fn sub_filter_matches<T: TreeBackend>(tree: &T, sub: &SubFilter, node: &T::Node) -> Result<bool> {
    match sub {
        SubFilter::Selector(selector) => tree.matches(node, selector),
        SubFilter::Nested(filter) => {
            Ok(!filter.evaluate(tree, Some(vec![node.clone()]))?.is_empty())
        }
    }
}

fn apply_css_selector<T: TreeBackend>(
    tree: &T,
    selector: &str,
    node: &T::Node,
) -> Result<Vec<T::Node>> {
    let trimmed = selector.trim_start();
    if let Some(rest) = trimmed.strip_prefix('+') {
        let rest = rest.trim_start();
        if let Some(sibling) = tree.next_sibling(node) {
            if tree.matches(&sibling, rest)? {
                return Ok(vec![sibling]);
            }
        }
        return Ok(Vec::new());
    }
    if let Some(rest) = trimmed.strip_prefix('~') {
        let rest = rest.trim_start();
        let mut out = Vec::new();
        for sibling in tree.other_siblings(node) {
            if tree.matches(&sibling, rest)? {
                out.push(sibling);
            }
        }
        return Ok(out);
    }
    if let Some(rest) = trimmed.strip_prefix('>') {
        let rest = rest.trim_start();
        let mut out = Vec::new();
        for child in tree.children(node) {
            if tree.matches(&child, rest)? {
                out.push(child);
            }
        }
        return Ok(out);
    }
    tree.query_scoped(node, trimmed)
}

fn apply_upward<T: TreeBackend>(
    tree: &T,
    instruction: &UpwardInstruction,
    node: &T::Node,
) -> Result<Vec<T::Node>> {
    match instruction {
        UpwardInstruction::Ancestors(count) => {
            let mut current = node.clone();
            for _ in 0..*count {
                match tree.parent(&current) {
                    Some(parent) => current = parent,
                    None => return Ok(Vec::new()),
                }
            }
            Ok(vec![current])
        }
        // The element itself is tested first, then its ancestors.
        UpwardInstruction::Selector(selector) => {
            let mut current = Some(node.clone());
            while let Some(candidate) = current {
                if tree.matches(&candidate, selector)? {
                    return Ok(vec![candidate]);
                }
                current = tree.parent(&candidate);
            }
            Ok(Vec::new())
        }
        UpwardInstruction::Nested(filter) => {
            let mut current = Some(node.clone());
            while let Some(candidate) = current {
                if !filter.evaluate(tree, Some(vec![candidate.clone()]))?.is_empty() {
                    return Ok(vec![candidate]);
                }
                current = tree.parent(&candidate);
            }
            Ok(Vec::new())
        }
    }
}
