//! # Document Model
//!
//! A [`Document`] is a root group [`Node`] plus [`Canvas`] metadata. All
//! structural changes go through `Document` methods, which keep two
//! invariants: ids are unique within the document, and only groups hold
//! children. Acyclicity follows from ownership; `move_node` additionally
//! refuses to move a node under its own descendant.
//!
//! ```
//! use coverpage::document::{Canvas, Document, Node};
//!
//! let mut doc = Document::new(Canvas::default());
//! doc.append_child("root", Node::text("title", "{{report.title}}")).unwrap();
//! doc.append_child("root", Node::rect("band").with_attr("fill", "#003366")).unwrap();
//!
//! let bytes = coverpage::document::codec::encode(&doc);
//! let back = coverpage::document::codec::decode(&bytes).unwrap();
//! assert_eq!(doc, back);
//! ```

pub mod codec;
pub mod node;

pub use node::{Attributes, MERGE_FIELD_KEY, Node, NodeKind, NodeMut, SRC_KEY, TEXT_KEY};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::StructuralError;

/// Id given to the root group of a new document.
pub const ROOT_ID: &str = "root";

// ============================================================================
// CANVAS
// ============================================================================

fn default_width() -> f64 {
    612.0
}

fn default_height() -> f64 {
    792.0
}

fn default_background() -> String {
    "#ffffff".to_string()
}

/// Canvas-level metadata. Sizes are in points; the default is US Letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            background: default_background(),
        }
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// A cover page document: the unit of persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub canvas: Canvas,
    root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

impl Document {
    /// Create an empty document with a root group named [`ROOT_ID`].
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            root: Node::group(ROOT_ID),
        }
    }

    /// Wrap an existing tree, checking its invariants.
    pub fn from_root(canvas: Canvas, root: Node) -> Result<Self, StructuralError> {
        if !root.kind().is_container() {
            return Err(StructuralError::NotAContainer {
                id: root.id().to_string(),
                kind: root.kind().to_string(),
            });
        }
        let doc = Self { canvas, root };
        doc.validate()?;
        Ok(doc)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Attribute-level access to the whole tree for in-crate passes that
    /// keep ids and structure intact (merge resolution).
    pub(crate) fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.root.subtree_len()
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.root.descendants().find(|n| n.id() == id)
    }

    /// Mutable access to a node's attributes and merge field. Structure
    /// stays behind the document's own methods.
    pub fn find_mut(&mut self, id: &str) -> Option<NodeMut<'_>> {
        find_node_mut(&mut self.root, id).map(NodeMut::new)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Parent of the node with `id`. `None` for the root or unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.root
            .descendants()
            .find(|n| n.children().iter().any(|c| c.id() == id))
    }

    /// Child indices leading from the root to `id`. Empty for the root.
    pub fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        fn search(node: &Node, id: &str, path: &mut Vec<usize>) -> bool {
            if node.id() == id {
                return true;
            }
            for (i, child) in node.children().iter().enumerate() {
                path.push(i);
                if search(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.root, id, &mut path).then_some(path)
    }

    // ------------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------------

    /// Append `node` (and its subtree) as the last child of `parent_id`.
    pub fn append_child(&mut self, parent_id: &str, node: Node) -> Result<(), StructuralError> {
        let len = self.container(parent_id)?.children().len();
        self.insert_child(parent_id, len, node)
    }

    /// Insert `node` at `index` among `parent_id`'s children.
    pub fn insert_child(
        &mut self,
        parent_id: &str,
        index: usize,
        node: Node,
    ) -> Result<(), StructuralError> {
        let parent = self.container(parent_id)?;
        let len = parent.children().len();
        if index > len {
            return Err(StructuralError::IndexOutOfBounds {
                parent: parent_id.to_string(),
                index,
                len,
            });
        }

        let mut seen: HashSet<&str> = self.root.descendants().map(Node::id).collect();
        check_subtree(&node, &mut seen)?;

        let parent = self.container_mut(parent_id)?;
        parent.children_mut().insert(index, node);
        Ok(())
    }

    /// Detach and return the node with `id` and its subtree.
    pub fn remove(&mut self, id: &str) -> Result<Node, StructuralError> {
        let path = self.path_to(id).ok_or_else(|| not_found(id))?;
        let Some((&index, parent_path)) = path.split_last() else {
            return Err(StructuralError::RootImmutable);
        };
        let parent = node_at_path_mut(&mut self.root, parent_path);
        Ok(parent.children_mut().remove(index))
    }

    /// Move the node with `id` under `new_parent_id` at `index` (append when
    /// `None`). Fails without touching the tree if the move is invalid.
    pub fn move_node(
        &mut self,
        id: &str,
        new_parent_id: &str,
        index: Option<usize>,
    ) -> Result<(), StructuralError> {
        if id == self.root.id() {
            return Err(StructuralError::RootImmutable);
        }
        let node = self.find(id).ok_or_else(|| not_found(id))?;
        if node.descendants().any(|n| n.id() == new_parent_id) {
            return Err(StructuralError::Cycle {
                node: id.to_string(),
                target: new_parent_id.to_string(),
            });
        }

        let parent = self.container(new_parent_id)?;
        let same_parent = parent.children().iter().any(|c| c.id() == id);
        let len = parent.children().len() - usize::from(same_parent);
        let index = index.unwrap_or(len);
        if index > len {
            return Err(StructuralError::IndexOutOfBounds {
                parent: new_parent_id.to_string(),
                index,
                len,
            });
        }

        let node = self.remove(id)?;
        let parent = self.container_mut(new_parent_id)?;
        parent.children_mut().insert(index, node);
        Ok(())
    }

    /// Merge `attrs` into a node's attributes (see [`Node::merge_attributes`]).
    pub fn update_attributes(&mut self, id: &str, attrs: Attributes) -> Result<(), StructuralError> {
        let mut node = self.find_mut(id).ok_or_else(|| not_found(id))?;
        node.merge_attributes(attrs);
        Ok(())
    }

    pub fn set_merge_field(&mut self, id: &str, field: Option<String>) -> Result<(), StructuralError> {
        let mut node = self.find_mut(id).ok_or_else(|| not_found(id))?;
        node.set_merge_field(field);
        Ok(())
    }

    /// Drop every child of the root, keeping canvas metadata.
    pub fn clear(&mut self) {
        self.root.children_mut().clear();
    }

    /// Check id uniqueness and that only groups have children.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let mut seen = HashSet::new();
        check_subtree(&self.root, &mut seen)
    }

    /// Consume the document, returning its root.
    pub fn into_root(self) -> Node {
        self.root
    }

    fn container(&self, id: &str) -> Result<&Node, StructuralError> {
        let node = self.find(id).ok_or_else(|| not_found(id))?;
        if !node.kind().is_container() {
            return Err(StructuralError::NotAContainer {
                id: id.to_string(),
                kind: node.kind().to_string(),
            });
        }
        Ok(node)
    }

    fn container_mut(&mut self, id: &str) -> Result<&mut Node, StructuralError> {
        self.container(id)?;
        find_node_mut(&mut self.root, id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &str) -> StructuralError {
    StructuralError::NodeNotFound { id: id.to_string() }
}

fn find_node_mut<'a>(node: &'a mut Node, id: &str) -> Option<&'a mut Node> {
    if node.id() == id {
        return Some(node);
    }
    node.children_mut()
        .iter_mut()
        .find_map(|child| find_node_mut(child, id))
}

fn node_at_path_mut<'a>(mut node: &'a mut Node, path: &[usize]) -> &'a mut Node {
    for &i in path {
        node = &mut node.children_mut()[i];
    }
    node
}

/// Record every id in `node`'s subtree into `seen`, failing on the first
/// duplicate or on children under a non-group.
fn check_subtree<'a>(node: &'a Node, seen: &mut HashSet<&'a str>) -> Result<(), StructuralError> {
    for n in node.descendants() {
        if !seen.insert(n.id()) {
            return Err(StructuralError::DuplicateId {
                id: n.id().to_string(),
            });
        }
        if !n.kind().is_container() && !n.is_leaf() {
            return Err(StructuralError::NotAContainer {
                id: n.id().to_string(),
                kind: n.kind().to_string(),
            });
        }
    }
    Ok(())
}
