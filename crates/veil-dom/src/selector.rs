//! Small CSS selector engine.
//!
//! Supports selector lists, compound selectors (type, `*`, `#id`,
//! `.class`, `[attr]`, `[attr=v]` with `^=`/`$=`/`*=` variants) and
//! the four combinators. Pseudo-classes are rejected as invalid.
//! Matching runs right-to-left against the flat node store.

use crate::document::DocInner;
use veil_core::{Result, VeilError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone)]
struct AttrCondition {
    name: String,
    value: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

/// One complex selector: compounds linked by combinators. The
/// combinator stored with a part relates it to the part before it;
/// the first part carries `None`.
#[derive(Debug, Clone)]
struct Complex {
    parts: Vec<(Option<Combinator>, Compound)>,
}

#[derive(Debug, Clone)]
pub(crate) struct SelectorList {
    selectors: Vec<Complex>,
}

impl SelectorList {
    pub(crate) fn parse(input: &str) -> Result<Self> {
        let mut selectors = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid(input, "empty selector"));
            }
            selectors.push(Complex::parse(part)?);
        }
        Ok(Self { selectors })
    }

    pub(crate) fn matches(&self, doc: &DocInner, node: usize) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, node))
    }
}

fn invalid(selector: &str, reason: &str) -> VeilError {
    VeilError::Selector(format!("{selector:?}: {reason}"))
}

enum Token {
    Combinator(Combinator),
    Compound(String),
}

/// Split a complex selector into compound and combinator tokens.
/// Whitespace between compounds is the descendant combinator unless
/// an explicit one follows. Brackets and quotes shield their content.
fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token::Compound(std::mem::take(current)));
        }
    };

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            _ if in_brackets => current.push(ch),
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            '>' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Combinator(Combinator::Child));
            }
            '+' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Combinator(Combinator::NextSibling));
            }
            '~' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Combinator(Combinator::SubsequentSibling));
            }
            _ => current.push(ch),
        }
    }
    if quote.is_some() || in_brackets {
        return Err(invalid(input, "unterminated quote or bracket"));
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

impl Complex {
    fn parse(input: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut pending: Option<Combinator> = None;
        for token in tokenize(input)? {
            match token {
                Token::Combinator(c) => {
                    if pending.is_some() || parts.is_empty() {
                        return Err(invalid(input, "misplaced combinator"));
                    }
                    pending = Some(c);
                }
                Token::Compound(text) => {
                    let combinator = if parts.is_empty() {
                        None
                    } else {
                        Some(pending.take().unwrap_or(Combinator::Descendant))
                    };
                    parts.push((combinator, Compound::parse(input, &text)?));
                }
            }
        }
        if pending.is_some() || parts.is_empty() {
            return Err(invalid(input, "dangling combinator"));
        }
        Ok(Self { parts })
    }

    fn matches(&self, doc: &DocInner, node: usize) -> bool {
        matches_from(doc, node, &self.parts)
    }
}

fn matches_from(doc: &DocInner, node: usize, parts: &[(Option<Combinator>, Compound)]) -> bool {
    let (combinator, compound) = match parts.last() {
        Some(part) => part,
        None => return true,
    };
    if !compound.matches(doc, node) {
        return false;
    }
    let rest = &parts[..parts.len() - 1];
    match combinator {
        None => true,
        Some(Combinator::Descendant) => {
            let mut current = doc.nodes[node].parent;
            while let Some(ancestor) = current {
                if matches_from(doc, ancestor, rest) {
                    return true;
                }
                current = doc.nodes[ancestor].parent;
            }
            false
        }
        Some(Combinator::Child) => match doc.nodes[node].parent {
            Some(parent) => matches_from(doc, parent, rest),
            None => false,
        },
        Some(Combinator::NextSibling) => match preceding_siblings(doc, node).last() {
            Some(&prev) => matches_from(doc, prev, rest),
            None => false,
        },
        Some(Combinator::SubsequentSibling) => preceding_siblings(doc, node)
            .iter()
            .any(|&prev| matches_from(doc, prev, rest)),
    }
}

fn preceding_siblings(doc: &DocInner, node: usize) -> Vec<usize> {
    match doc.nodes[node].parent {
        Some(parent) => {
            let children = &doc.nodes[parent].children;
            match children.iter().position(|&c| c == node) {
                Some(idx) => children[..idx].to_vec(),
                None => Vec::new(),
            }
        }
        None => Vec::new(),
    }
}

impl Compound {
    fn parse(selector: &str, text: &str) -> Result<Self> {
        let mut compound = Compound::default();
        let mut chars = text.char_indices().peekable();

        let read_ident = |text: &str, from: usize| -> (String, usize) {
            let rest = &text[from..];
            let end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                .unwrap_or(rest.len());
            (rest[..end].to_string(), from + end)
        };

        while let Some(&(idx, ch)) = chars.peek() {
            match ch {
                '*' => {
                    chars.next();
                }
                '#' => {
                    let (ident, end) = read_ident(text, idx + 1);
                    if ident.is_empty() {
                        return Err(invalid(selector, "empty id"));
                    }
                    compound.id = Some(ident);
                    advance_to(&mut chars, end);
                }
                '.' => {
                    let (ident, end) = read_ident(text, idx + 1);
                    if ident.is_empty() {
                        return Err(invalid(selector, "empty class"));
                    }
                    compound.classes.push(ident);
                    advance_to(&mut chars, end);
                }
                '[' => {
                    let rest = &text[idx..];
                    let close = rest
                        .find(']')
                        .ok_or_else(|| invalid(selector, "unterminated attribute"))?;
                    compound.attrs.push(parse_attr(selector, &rest[1..close])?);
                    advance_to(&mut chars, idx + close + 1);
                }
                c if c.is_alphabetic() => {
                    let (ident, end) = read_ident(text, idx);
                    compound.tag = Some(ident.to_ascii_lowercase());
                    advance_to(&mut chars, end);
                }
                _ => return Err(invalid(selector, "unsupported simple selector")),
            }
        }
        Ok(compound)
    }

    fn matches(&self, doc: &DocInner, node: usize) -> bool {
        let data = &doc.nodes[node];
        if let Some(tag) = &self.tag {
            if !data.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = doc.attribute(node, "class").unwrap_or("");
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        for attr in &self.attrs {
            match &attr.value {
                None => {
                    if !doc.has_attribute(node, &attr.name) {
                        return false;
                    }
                }
                Some((op, expected)) => {
                    let actual = match doc.attribute(node, &attr.name) {
                        Some(v) => v,
                        None => return false,
                    };
                    let ok = match op {
                        AttrOp::Equals => actual == expected,
                        AttrOp::Prefix => actual.starts_with(expected.as_str()),
                        AttrOp::Suffix => actual.ends_with(expected.as_str()),
                        AttrOp::Contains => actual.contains(expected.as_str()),
                    };
                    if !ok {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn advance_to(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, end: usize) {
    while chars.peek().is_some_and(|&(i, _)| i < end) {
        chars.next();
    }
}

fn parse_attr(selector: &str, body: &str) -> Result<AttrCondition> {
    let ops = [("^=", AttrOp::Prefix), ("$=", AttrOp::Suffix), ("*=", AttrOp::Contains), ("=", AttrOp::Equals)];
    for (symbol, op) in ops {
        if let Some(idx) = body.find(symbol) {
            let name = body[..idx].trim().to_string();
            if name.is_empty() {
                return Err(invalid(selector, "empty attribute name"));
            }
            let raw = body[idx + symbol.len()..].trim();
            let value = unquote(raw).to_string();
            return Ok(AttrCondition { name, value: Some((op, value)) });
        }
    }
    let name = body.trim();
    if name.is_empty() {
        return Err(invalid(selector, "empty attribute name"));
    }
    Ok(AttrCondition { name: name.to_string(), value: None })
}

fn unquote(raw: &str) -> &str {
    for q in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(q) && raw.ends_with(q) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
