//! Tree capability interface.
//!
//! The evaluation engine never touches a concrete tree; it drives
//! whatever substrate the host renders through this trait. Nodes are
//! opaque, identity-comparable handles that stay valid for the
//! duration of one evaluation pass.

use crate::error::Result;
use std::fmt::Debug;
use std::hash::Hash;

/// Pseudo-element context for resolved style lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoStyle {
    Before,
    After,
}

/// Capabilities the host tree substrate must provide.
pub trait TreeBackend {
    /// Opaque node handle. Identity comparison decides hide/restore
    /// bookkeeping, so equality must mean "same node".
    type Node: Clone + Eq + Hash + Debug;

    /// All elements matching `selector`, whole-tree scope, document order.
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>>;

    /// Elements in the subtree under `node` (excluding `node` itself)
    /// matching `selector`, document order.
    fn query_scoped(&self, node: &Self::Node, selector: &str) -> Result<Vec<Self::Node>>;

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: &Self::Node, selector: &str) -> Result<bool>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Every element in the tree, document order.
    fn all_elements(&self) -> Vec<Self::Node>;

    /// Attribute names in definition order.
    fn attribute_names(&self, node: &Self::Node) -> Vec<String>;

    /// Attribute value, or `None` when absent or valueless.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Enumerable own properties as name/value pairs.
    fn properties(&self, node: &Self::Node) -> Vec<(String, String)>;

    /// Rendered text content of the subtree rooted at `node`.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Resolved style value for `property` in the given pseudo
    /// context, or `None` when the property is undefined there.
    fn computed_style(
        &self,
        node: &Self::Node,
        pseudo: Option<PseudoStyle>,
        property: &str,
    ) -> Option<String>;

    /// Whether a media query currently evaluates true.
    fn matches_media(&self, query: &str) -> bool;

    /// Current location path plus query string.
    fn location_path_query(&self) -> String;

    /// Evaluate an XPath expression rooted at `node`, or at the
    /// document when `node` is `None`. Ordered element results.
    fn evaluate_xpath(&self, node: Option<&Self::Node>, expression: &str)
        -> Result<Vec<Self::Node>>;

    /// Inline display value (empty string when unset).
    fn display(&self, node: &Self::Node) -> String;

    fn set_display(&self, node: &Self::Node, value: &str);

    /// Next element sibling, if any.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
        let parent = self.parent(node)?;
        let siblings = self.children(&parent);
        let idx = siblings.iter().position(|s| s == node)?;
        siblings.into_iter().nth(idx + 1)
    }

    /// All siblings other than `node` itself, document order.
    fn other_siblings(&self, node: &Self::Node) -> Vec<Self::Node> {
        match self.parent(node) {
            Some(parent) => self
                .children(&parent)
                .into_iter()
                .filter(|s| s != node)
                .collect(),
            None => Vec::new(),
        }
    }
}
