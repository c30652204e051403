//! Flat element store with parent/child indices and shared handles.

use crate::media::evaluate_media_query;
use crate::selector::SelectorList;
use crate::xpath::XPathQuery;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use veil_core::{PseudoStyle, Result, TreeBackend};

/// Handle to one element. Stable for the life of the document;
/// identity comparison means "same element".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    /// Definition-ordered. A `None` value is a bare attribute.
    pub(crate) attributes: Vec<(String, Option<String>)>,
    properties: Vec<(String, String)>,
    text: String,
    display: String,
    styles: HashMap<String, String>,
    before_styles: HashMap<String, String>,
    after_styles: HashMap<String, String>,
}

#[derive(Debug)]
pub(crate) struct DocInner {
    pub(crate) nodes: Vec<ElementData>,
    root: usize,
    viewport: (u32, u32),
    location: String,
}

impl DocInner {
    /// Preorder indices of the subtree under `idx`, excluding `idx`.
    pub(crate) fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[idx].children.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.nodes[i].children.iter().rev());
        }
        out
    }

    pub(crate) fn attribute(&self, idx: usize, name: &str) -> Option<&str> {
        self.nodes[idx]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub(crate) fn has_attribute(&self, idx: usize, name: &str) -> bool {
        self.nodes[idx].attributes.iter().any(|(n, _)| n == name)
    }
}

/// An in-memory document tree, cheaply cloneable and shareable
/// across threads. All handles returned by one document stay tied to
/// it; elements detached from the tree keep their handle so a hide
/// session can still restore their display value.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<RwLock<DocInner>>,
}

impl Document {
    /// Create a document with a single root element (tag `html`).
    pub fn new() -> Self {
        let root = ElementData { tag: "html".into(), ..Default::default() };
        Self {
            inner: Arc::new(RwLock::new(DocInner {
                nodes: vec![root],
                root: 0,
                viewport: (1280, 800),
                location: "/".into(),
            })),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DocInner> {
        self.inner.read().unwrap()
    }

    fn write(&self) -> RwLockWriteGuard<'_, DocInner> {
        self.inner.write().unwrap()
    }

    pub fn root(&self) -> NodeId {
        NodeId(self.read().root)
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        let mut doc = self.write();
        let id = doc.nodes.len();
        doc.nodes.push(ElementData { tag: tag.into(), ..Default::default() });
        NodeId(id)
    }

    /// Append `child` as the last child of `parent`, detaching it
    /// from any previous parent first.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut doc = self.write();
        if let Some(old) = doc.nodes[child.0].parent {
            doc.nodes[old].children.retain(|&c| c != child.0);
        }
        doc.nodes[child.0].parent = Some(parent.0);
        doc.nodes[parent.0].children.push(child.0);
    }

    /// Detach `node` (and its subtree) from the tree. The handle
    /// stays usable for attribute and style access.
    pub fn remove(&self, node: NodeId) {
        let mut doc = self.write();
        if let Some(parent) = doc.nodes[node.0].parent.take() {
            doc.nodes[parent].children.retain(|&c| c != node.0);
        }
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.read().nodes[node.0].tag.clone()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.set_attribute_entry(node, name, Some(value.to_string()));
    }

    /// Set an attribute that is present but carries no value.
    pub fn set_bare_attribute(&self, node: NodeId, name: &str) {
        self.set_attribute_entry(node, name, None);
    }

    fn set_attribute_entry(&self, node: NodeId, name: &str, value: Option<String>) {
        let mut doc = self.write();
        let attrs = &mut doc.nodes[node.0].attributes;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    pub fn set_property(&self, node: NodeId, name: &str, value: &str) {
        let mut doc = self.write();
        let props = &mut doc.nodes[node.0].properties;
        match props.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => props.push((name.to_string(), value.to_string())),
        }
    }

    /// Set the element's own text (not counting descendants).
    pub fn set_text(&self, node: NodeId, text: &str) {
        self.write().nodes[node.0].text = text.to_string();
    }

    pub fn set_style(&self, node: NodeId, property: &str, value: &str) {
        self.write().nodes[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    pub fn set_pseudo_style(&self, node: NodeId, pseudo: PseudoStyle, property: &str, value: &str) {
        let mut doc = self.write();
        let data = &mut doc.nodes[node.0];
        let styles = match pseudo {
            PseudoStyle::Before => &mut data.before_styles,
            PseudoStyle::After => &mut data.after_styles,
        };
        styles.insert(property.to_string(), value.to_string());
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.write().viewport = (width, height);
    }

    /// Set the location path plus query string (e.g. `/news?page=2`).
    pub fn set_location(&self, path_and_query: &str) {
        self.write().location = path_and_query.to_string();
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBackend for Document {
    type Node = NodeId;

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = SelectorList::parse(selector)?;
        let doc = self.read();
        let mut out = vec![doc.root];
        out.extend(doc.descendants(doc.root));
        Ok(out
            .into_iter()
            .filter(|&i| parsed.matches(&doc, i))
            .map(NodeId)
            .collect())
    }

    fn query_scoped(&self, node: &NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = SelectorList::parse(selector)?;
        let doc = self.read();
        Ok(doc
            .descendants(node.0)
            .into_iter()
            .filter(|&i| parsed.matches(&doc, i))
            .map(NodeId)
            .collect())
    }

    fn matches(&self, node: &NodeId, selector: &str) -> Result<bool> {
        let parsed = SelectorList::parse(selector)?;
        Ok(parsed.matches(&self.read(), node.0))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.read().nodes[node.0].parent.map(NodeId)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.read().nodes[node.0].children.iter().copied().map(NodeId).collect()
    }

    fn all_elements(&self) -> Vec<NodeId> {
        let doc = self.read();
        let mut out = vec![NodeId(doc.root)];
        out.extend(doc.descendants(doc.root).into_iter().map(NodeId));
        out
    }

    fn attribute_names(&self, node: &NodeId) -> Vec<String> {
        self.read().nodes[node.0]
            .attributes
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.read().attribute(node.0, name).map(str::to_string)
    }

    fn properties(&self, node: &NodeId) -> Vec<(String, String)> {
        self.read().nodes[node.0].properties.clone()
    }

    fn text_content(&self, node: &NodeId) -> String {
        let doc = self.read();
        let mut text = doc.nodes[node.0].text.clone();
        for i in doc.descendants(node.0) {
            text.push_str(&doc.nodes[i].text);
        }
        text
    }

    fn computed_style(
        &self,
        node: &NodeId,
        pseudo: Option<PseudoStyle>,
        property: &str,
    ) -> Option<String> {
        let doc = self.read();
        let data = &doc.nodes[node.0];
        let styles = match pseudo {
            None => &data.styles,
            Some(PseudoStyle::Before) => &data.before_styles,
            Some(PseudoStyle::After) => &data.after_styles,
        };
        styles.get(property).cloned()
    }

    fn matches_media(&self, query: &str) -> bool {
        evaluate_media_query(query, self.read().viewport)
    }

    fn location_path_query(&self) -> String {
        self.read().location.clone()
    }

    fn evaluate_xpath(&self, node: Option<&NodeId>, expression: &str) -> Result<Vec<NodeId>> {
        let query = XPathQuery::parse(expression)?;
        let doc = self.read();
        let root = node.map(|n| n.0);
        Ok(query.evaluate(&doc, root, doc.root).into_iter().map(NodeId).collect())
    }

    fn display(&self, node: &NodeId) -> String {
        self.read().nodes[node.0].display.clone()
    }

    fn set_display(&self, node: &NodeId, value: &str) {
        self.write().nodes[node.0].display = value.to_string();
    }
}
