//! Media query evaluation against the document viewport.
//!
//! Handles `(min-width: Npx)`-style conditions for width and height,
//! joined by `and`. Conditions outside that subset evaluate false,
//! which makes the whole query false.

pub(crate) fn evaluate_media_query(query: &str, viewport: (u32, u32)) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed
        .split(" and ")
        .all(|condition| evaluate_condition(condition.trim(), viewport))
}

fn evaluate_condition(condition: &str, (width, height): (u32, u32)) -> bool {
    let body = match condition.strip_prefix('(').and_then(|c| c.strip_suffix(')')) {
        Some(body) => body,
        None => return false,
    };
    let (feature, raw_value) = match body.split_once(':') {
        Some(pair) => pair,
        None => return false,
    };
    let value: u32 = match raw_value.trim().strip_suffix("px").and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => return false,
    };
    match feature.trim() {
        "min-width" => width >= value,
        "max-width" => width <= value,
        "width" => width == value,
        "min-height" => height >= value,
        "max-height" => height <= value,
        "height" => height == value,
        _ => false,
    }
}
