//! Node types for the canvas document tree.
//!
//! A [`Node`] owns its children outright (`Vec<Node>`), so the tree can never
//! share a subtree or contain a cycle. Attribute values are opaque JSON; only
//! the resolver and the renderer give them meaning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key that carries a node's merge field in the canonical form.
pub const MERGE_FIELD_KEY: &str = "mergeField";

/// Attribute key holding a text node's content.
pub const TEXT_KEY: &str = "text";

/// Attribute key holding an image node's source reference.
pub const SRC_KEY: &str = "src";

/// Sorted attribute map. Sorting keeps the encoded form stable.
pub type Attributes = BTreeMap<String, Value>;

// ============================================================================
// NODE KIND
// ============================================================================

/// The closed set of node kinds.
///
/// `Rect` through `Polygon` are the vector shapes. Only [`NodeKind::Group`]
/// may hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Text,
    Image,
    Rect,
    Circle,
    Ellipse,
    Line,
    Path,
    Polygon,
}

impl NodeKind {
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Group,
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Rect,
        NodeKind::Circle,
        NodeKind::Ellipse,
        NodeKind::Line,
        NodeKind::Path,
        NodeKind::Polygon,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Rect => "rect",
            NodeKind::Circle => "circle",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Line => "line",
            NodeKind::Path => "path",
            NodeKind::Polygon => "polygon",
        }
    }

    /// Parse a kind name, accepting the older editor's text aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "textbox" | "i-text" => Some(NodeKind::Text),
            other => Self::ALL.iter().copied().find(|k| k.as_str() == other),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Group)
    }

    pub fn is_shape(&self) -> bool {
        !matches!(self, NodeKind::Group | NodeKind::Text | NodeKind::Image)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NODE
// ============================================================================

/// One element of the document tree.
///
/// Identity and structure (`id`, `kind`, children) are only changed through
/// [`crate::document::Document`] operations so that id uniqueness holds.
/// Builder methods (`with_*`) are for assembling detached subtrees; the
/// document re-checks them on insertion.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    kind: NodeKind,
    attributes: Attributes,
    merge_field: Option<String>,
    children: Vec<Node>,
    /// Editor selection marker. Not persisted, not compared.
    pub selected: bool,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.attributes == other.attributes
            && self.merge_field == other.merge_field
            && self.children == other.children
    }
}

impl Node {
    /// Create a node with a fresh UUID id.
    pub fn new(kind: NodeKind) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), kind)
    }

    /// Create a node with an explicit id.
    pub fn with_id(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes: Attributes::new(),
            merge_field: None,
            children: Vec::new(),
            selected: false,
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::with_id(id, NodeKind::Group)
    }

    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(id, NodeKind::Text).with_attr(TEXT_KEY, content.into())
    }

    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self::with_id(id, NodeKind::Image).with_attr(SRC_KEY, src.into())
    }

    pub fn rect(id: impl Into<String>) -> Self {
        Self::with_id(id, NodeKind::Rect)
    }

    /// Set an attribute (builder form). See [`Node::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_merge_field(mut self, field: impl Into<String>) -> Self {
        self.merge_field = Some(field.into());
        self
    }

    /// Append a child (builder form). Does not check ids; the owning
    /// document validates the whole subtree when it is attached.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Set an attribute. The `mergeField` key is routed to the merge field
    /// slot so the two never disagree; a non-string value clears it.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if key == MERGE_FIELD_KEY {
            self.merge_field = value.as_str().map(str::to_string);
            return;
        }
        self.attributes.insert(key, value);
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<Value> {
        if key == MERGE_FIELD_KEY {
            return self.merge_field.take().map(Value::String);
        }
        self.attributes.remove(key)
    }

    /// Merge `attrs` into this node: supplied keys overwrite, others are
    /// untouched, and `null` removes a key.
    pub fn merge_attributes(&mut self, attrs: Attributes) {
        for (key, value) in attrs {
            if value.is_null() {
                self.remove_attr(&key);
            } else {
                self.set_attr(key, value);
            }
        }
    }

    pub fn merge_field(&self) -> Option<&str> {
        self.merge_field.as_deref()
    }

    pub fn set_merge_field(&mut self, field: Option<String>) {
        self.merge_field = field;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Text content for text nodes.
    pub fn text_content(&self) -> Option<&str> {
        self.attr_str(TEXT_KEY)
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Pre-order visit of this node and every descendant, with depth
    /// (this node is depth 0).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Node, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Pre-order iterator over this node and its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Fold over the subtree in pre-order.
    pub fn fold<T>(&self, init: T, mut f: impl FnMut(T, &Node) -> T) -> T {
        self.descendants().fold(init, |acc, node| f(acc, node))
    }

    /// Number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        self.fold(0, |n, _| n + 1)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Clear UI-only state across the subtree.
    pub fn clear_selection(&mut self) {
        self.selected = false;
        for child in &mut self.children {
            child.clear_selection();
        }
    }
}

// ============================================================================
// NODE HANDLE
// ============================================================================

/// Mutable access to one node inside a [`crate::document::Document`].
///
/// Reads go through `Deref<Target = Node>`. Writes are limited to
/// attributes, the merge field and selection, so id uniqueness and
/// container rules cannot be broken through a handle.
pub struct NodeMut<'a> {
    node: &'a mut Node,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(node: &'a mut Node) -> Self {
        Self { node }
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.node.set_attr(key, value);
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<Value> {
        self.node.remove_attr(key)
    }

    pub fn merge_attributes(&mut self, attrs: Attributes) {
        self.node.merge_attributes(attrs);
    }

    pub fn set_merge_field(&mut self, field: Option<String>) {
        self.node.set_merge_field(field);
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.node.selected = selected;
    }
}

impl std::ops::Deref for NodeMut<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Node {
        Node::group("g")
            .with_child(Node::text("a", "hello"))
            .with_child(
                Node::group("inner")
                    .with_child(Node::rect("b"))
                    .with_child(Node::image("c", "storage://x/y.png")),
            )
            .with_child(Node::rect("d"))
    }

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!(NodeKind::parse("textbox"), Some(NodeKind::Text));
        assert_eq!(NodeKind::parse("i-text"), Some(NodeKind::Text));
        assert_eq!(NodeKind::parse("polygon"), Some(NodeKind::Polygon));
        assert_eq!(NodeKind::parse("sprite"), None);
    }

    #[test]
    fn test_only_groups_are_containers() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.is_container(), *kind == NodeKind::Group);
        }
        assert!(NodeKind::Circle.is_shape());
        assert!(!NodeKind::Image.is_shape());
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = sample();
        let ids: Vec<&str> = tree.descendants().map(Node::id).collect();
        assert_eq!(ids, vec!["g", "a", "inner", "b", "c", "d"]);
    }

    #[test]
    fn test_walk_reports_depth() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.walk(&mut |node, depth| seen.push((node.id().to_string(), depth)));
        assert_eq!(seen[0], ("g".to_string(), 0));
        assert_eq!(seen[3], ("b".to_string(), 2));
        assert_eq!(seen[5], ("d".to_string(), 1));
    }

    #[test]
    fn test_subtree_len_counts_descendants() {
        assert_eq!(sample().subtree_len(), 6);
        assert!(Node::rect("x").is_leaf());
    }

    #[test]
    fn test_merge_field_attribute_is_routed() {
        let mut node = Node::image("img", "").with_attr(MERGE_FIELD_KEY, "report.coverImage");
        assert_eq!(node.merge_field(), Some("report.coverImage"));
        assert!(node.attr(MERGE_FIELD_KEY).is_none());

        node.remove_attr(MERGE_FIELD_KEY);
        assert_eq!(node.merge_field(), None);
    }

    #[test]
    fn test_merge_attributes_overwrites_and_removes() {
        let mut node = Node::rect("r")
            .with_attr("fill", "red")
            .with_attr("stroke", "blue")
            .with_attr("left", 10);

        let mut patch = Attributes::new();
        patch.insert("fill".into(), json!("green"));
        patch.insert("stroke".into(), Value::Null);
        patch.insert("top".into(), json!(4));
        node.merge_attributes(patch);

        assert_eq!(node.attr("fill"), Some(&json!("green")));
        assert_eq!(node.attr("stroke"), None);
        assert_eq!(node.attr("left"), Some(&json!(10)));
        assert_eq!(node.attr("top"), Some(&json!(4)));
    }

    #[test]
    fn test_equality_ignores_selection() {
        let a = sample();
        let mut b = sample();
        b.selected = true;
        assert_eq!(a, b);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Node::new(NodeKind::Rect);
        let b = Node::new(NodeKind::Rect);
        assert_ne!(a.id(), b.id());
    }
}
