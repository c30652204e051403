//! Text-match predicate compiler.
//!
//! Several operators take small argument grammars — `key=value` pairs,
//! optionally quoted values, `/pattern/flags` regex literals — and
//! reduce them to reusable string predicates. Everything here is
//! parsed once, at filter compile time.

use crate::error::{Result, VeilError};
use regex::{Regex, RegexBuilder};

/// A compiled text predicate.
///
/// `Blank` is the empty-spec case: it matches only values that are
/// empty or whitespace-only.
#[derive(Debug, Clone)]
pub enum TextMatchRule {
    Blank,
    Substring(String),
    Exact(String),
    Regex(Regex),
}

/// Key and value predicates built from one `key=value` argument.
pub type KeyValueMatchRules = (TextMatchRule, TextMatchRule);

impl TextMatchRule {
    /// Compile a test specification.
    ///
    /// A spec starting with `/` is a regex literal: the text up to the
    /// next `/` is the pattern and anything after it is flags (`i`,
    /// `m` and `s` are honored, other flags are ignored). An empty
    /// spec matches whitespace-only values. Anything else is a
    /// substring test, or an equality test when `exact` is set — the
    /// exact flag has no effect on the regex branch.
    pub fn compile(spec: &str, exact: bool) -> Result<Self> {
        if let Some(rest) = spec.strip_prefix('/') {
            let (pattern, flags) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                None => (rest, ""),
            };
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .build()
                .map_err(|e| VeilError::Argument(format!("bad regex in {spec:?}: {e}")))?;
            return Ok(Self::Regex(regex));
        }
        if spec.is_empty() {
            return Ok(Self::Blank);
        }
        if exact {
            Ok(Self::Exact(spec.to_string()))
        } else {
            Ok(Self::Substring(spec.to_string()))
        }
    }

    /// Test a value against the compiled predicate.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Blank => value.trim().is_empty(),
            Self::Substring(needle) => value.contains(needle.as_str()),
            Self::Exact(expected) => value == expected,
            Self::Regex(regex) => regex.is_match(value),
        }
    }
}

/// Parse an optionally quoted value specification.
///
/// A spec starting with `"` must also end with `"`; the quotes are
/// stripped and the resulting rule matches exactly. Unquoted specs
/// are used verbatim with substring/regex semantics.
pub fn parse_value_spec(text: &str) -> Result<TextMatchRule> {
    parse_value_spec_at(text, 0)
}

fn parse_value_spec_at(text: &str, start: usize) -> Result<TextMatchRule> {
    let rest = &text[start..];
    if rest.starts_with('"') {
        if !rest.ends_with('"') || rest.len() < 2 {
            return Err(VeilError::Argument(format!(
                "value rule in {text:?} starts with '\"' but does not end with '\"'"
            )));
        }
        TextMatchRule::compile(&rest[1..rest.len() - 1], true)
    } else {
        TextMatchRule::compile(rest, false)
    }
}

/// Parse a `key=value` or `"key"="value"` argument into a pair of
/// predicates for attribute/property names and values.
///
/// When the text starts with `"`, the key terminator is the literal
/// sequence `"=` and the key matches exactly; otherwise the
/// terminator is `=` and the key matches as a substring. A spec with
/// no terminator is an error.
pub fn parse_key_value_spec(text: &str) -> Result<KeyValueMatchRules> {
    let quoted = text.starts_with('"');
    let (terminator, key_start) = if quoted { ("\"=", 1) } else { ("=", 0) };
    let terminator_idx = text[key_start..]
        .find(terminator)
        .map(|i| i + key_start)
        .ok_or_else(|| {
            VeilError::Argument(format!(
                "unable to parse key rule from {text:?}: missing {terminator:?} terminator"
            ))
        })?;
    let key_rule = TextMatchRule::compile(&text[key_start..terminator_idx], quoted)?;
    let value_rule = parse_value_spec_at(text, terminator_idx + terminator.len())?;
    Ok((key_rule, value_rule))
}

/// Parse a `property: value` pair for the `matches-css` family.
pub fn parse_css_property_spec(text: &str) -> Result<(String, String)> {
    let mut parts = text.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(property), Some(value), None) => {
            Ok((property.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(VeilError::Argument(format!(
            "unexpected format for a css rule: {text:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        let rule = TextMatchRule::compile("foo", false).unwrap();
        assert!(rule.matches("a foo b"));
        assert!(!rule.matches("f o o"));
    }

    #[test]
    fn test_exact_match() {
        let rule = TextMatchRule::compile("foo", true).unwrap();
        assert!(rule.matches("foo"));
        assert!(!rule.matches("a foo b"));
    }

    #[test]
    fn test_blank_matches_whitespace_only() {
        let rule = TextMatchRule::compile("", false).unwrap();
        assert!(rule.matches(""));
        assert!(rule.matches("  \t\n"));
        assert!(!rule.matches(" x "));
    }

    #[test]
    fn test_regex_with_flags() {
        let rule = TextMatchRule::compile("/^foo$/i", false).unwrap();
        assert!(rule.matches("FOO"));
        assert!(!rule.matches("foobar"));
    }

    #[test]
    fn test_regex_exact_flag_ignored() {
        let rule = TextMatchRule::compile("/oo/", true).unwrap();
        assert!(rule.matches("book"));
    }

    #[test]
    fn test_regex_without_closing_slash() {
        let rule = TextMatchRule::compile("/fo+", false).unwrap();
        assert!(rule.matches("xfoo"));
    }

    #[test]
    fn test_bad_regex_is_error() {
        assert!(matches!(
            TextMatchRule::compile("/(/", false),
            Err(VeilError::Argument(_))
        ));
    }

    #[test]
    fn test_value_spec_quoted() {
        let rule = parse_value_spec("\"10\"").unwrap();
        assert!(rule.matches("10"));
        assert!(!rule.matches("100"));
    }

    #[test]
    fn test_value_spec_unterminated_quote() {
        assert!(matches!(parse_value_spec("\"10"), Err(VeilError::Argument(_))));
    }

    #[test]
    fn test_key_value_quoted_is_exact() {
        let (key, value) = parse_key_value_spec("\"data-x\"=\"10\"").unwrap();
        assert!(key.matches("data-x"));
        assert!(!key.matches("data-xy"));
        assert!(value.matches("10"));
        assert!(!value.matches("103"));
    }

    #[test]
    fn test_key_value_unquoted_is_substring() {
        let (key, value) = parse_key_value_spec("data-x=10").unwrap();
        assert!(key.matches("some-data-x-here"));
        assert!(value.matches("3103"));
    }

    #[test]
    fn test_key_value_missing_terminator() {
        assert!(matches!(parse_key_value_spec("data-x"), Err(VeilError::Argument(_))));
        assert!(matches!(parse_key_value_spec("\"data-x\""), Err(VeilError::Argument(_))));
    }

    #[test]
    fn test_key_value_regex_key() {
        let (key, _) = parse_key_value_spec("/^data-/=1").unwrap();
        assert!(key.matches("data-ad"));
        assert!(!key.matches("x-data-ad"));
    }

    #[test]
    fn test_css_property_spec() {
        let (prop, value) = parse_css_property_spec("display : none ").unwrap();
        assert_eq!(prop, "display");
        assert_eq!(value, "none");
    }

    #[test]
    fn test_css_property_spec_malformed() {
        assert!(parse_css_property_spec("display").is_err());
        assert!(parse_css_property_spec("a:b:c").is_err());
    }
}
