//! Canonical encode/decode for [`Document`].
//!
//! The canonical form is JSON. Each node is
//! `{"id", "kind", "attributes": {...}, "children": [...]}` with the merge
//! field stored as the `mergeField` attribute; the root object also carries
//! `canvas` and `version`. Attribute keys come out sorted, so encoding the
//! same tree twice yields identical bytes.
//!
//! Decoding also accepts the older editor form, where the node kind is under
//! `type`, children under `objects`, and attributes sit directly on the node
//! object:
//!
//! ```
//! use coverpage::document::codec;
//!
//! let legacy = br#"{"type": "group", "objects": [{"type": "textbox", "text": "Hi", "left": 20}]}"#;
//! let doc = codec::decode(legacy).unwrap();
//! let text = &doc.root().children()[0];
//! assert_eq!(text.text_content(), Some("Hi"));
//! ```

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::node::{MERGE_FIELD_KEY, Node, NodeKind};
use super::{Canvas, Document};
use crate::error::ParseError;

/// Version written into every encoded document.
pub const FORMAT_VERSION: u64 = 1;

/// Keys with structural meaning on a node object. Anything else found
/// directly on the object is treated as an attribute.
const RESERVED_KEYS: &[&str] = &[
    "id",
    "kind",
    "type",
    "attributes",
    "children",
    "objects",
    "canvas",
    "version",
];

// ============================================================================
// ENCODE
// ============================================================================

/// Encode a document to canonical JSON bytes.
pub fn encode(doc: &Document) -> Vec<u8> {
    encode_value(doc).to_string().into_bytes()
}

/// Encode to indented JSON, for files meant to be read by people.
pub fn encode_pretty(doc: &Document) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&encode_value(doc)).unwrap_or_default()
}

/// Encode a document to a canonical JSON value.
pub fn encode_value(doc: &Document) -> Value {
    let mut root = encode_node(doc.root());
    if let Value::Object(map) = &mut root {
        map.insert("version".into(), Value::from(FORMAT_VERSION));
        map.insert(
            "canvas".into(),
            serde_json::to_value(&doc.canvas).unwrap_or(Value::Null),
        );
    }
    root
}

/// Encode a single node and its subtree.
pub fn encode_node(node: &Node) -> Value {
    let mut attributes: Map<String, Value> = node
        .attributes()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(field) = node.merge_field() {
        attributes.insert(MERGE_FIELD_KEY.into(), Value::String(field.to_string()));
    }

    let mut map = Map::new();
    map.insert("id".into(), Value::String(node.id().to_string()));
    map.insert("kind".into(), Value::String(node.kind().as_str().into()));
    map.insert("attributes".into(), Value::Object(attributes));
    map.insert(
        "children".into(),
        Value::Array(node.children().iter().map(encode_node).collect()),
    );
    Value::Object(map)
}

// ============================================================================
// DECODE
// ============================================================================

/// Decode canonical (or legacy) JSON bytes into a document.
///
/// Either the whole tree is returned or an error is; a partial tree never
/// escapes.
pub fn decode(bytes: &[u8]) -> Result<Document, ParseError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ParseError::new("/", e.to_string()))?;
    decode_value(value)
}

pub fn decode_str(s: &str) -> Result<Document, ParseError> {
    decode(s.as_bytes())
}

/// Decode into an existing document with replace semantics.
///
/// The input is fully parsed first. On success the target's previous
/// content (tree and canvas) is discarded and replaced; nothing is merged.
/// On failure the target is left exactly as it was.
pub fn decode_into(target: &mut Document, bytes: &[u8]) -> Result<(), ParseError> {
    *target = decode(bytes)?;
    Ok(())
}

/// Decode a document from an already-parsed JSON value.
pub fn decode_value(value: Value) -> Result<Document, ParseError> {
    let Value::Object(mut map) = value else {
        return Err(ParseError::new("/", "document must be a JSON object"));
    };

    if let Some(version) = map.remove("version") {
        match version.as_u64() {
            Some(FORMAT_VERSION) => {}
            _ => {
                return Err(ParseError::new(
                    "/version",
                    format!("unsupported format version {}", version),
                ));
            }
        }
    }

    let canvas = match map.remove("canvas") {
        None | Some(Value::Null) => Canvas::default(),
        Some(v) => serde_json::from_value(v).map_err(|e| ParseError::new("/canvas", e.to_string()))?,
    };

    let mut seen = HashSet::new();
    let root = decode_node(map, "", &mut seen)?;
    if !root.kind().is_container() {
        return Err(ParseError::new(
            "/",
            format!("root must be a group, got {}", root.kind()),
        ));
    }

    // Ids and containers were checked while decoding.
    Document::from_root(canvas, root).map_err(|e| ParseError::new("/", e.to_string()))
}

fn decode_node(
    mut map: Map<String, Value>,
    path: &str,
    seen: &mut HashSet<String>,
) -> Result<Node, ParseError> {
    let here = if path.is_empty() { "/" } else { path };

    let kind_value = map
        .remove("kind")
        .or_else(|| map.remove("type"))
        .ok_or_else(|| ParseError::new(here, "node has no kind"))?;
    let kind_name = kind_value
        .as_str()
        .ok_or_else(|| ParseError::new(here, format!("kind must be a string, got {}", kind_value)))?;
    let kind = NodeKind::parse(kind_name)
        .ok_or_else(|| ParseError::new(here, format!("unknown node kind '{}'", kind_name)))?;

    let id = match map.remove("id") {
        None | Some(Value::Null) => uuid::Uuid::new_v4().to_string(),
        Some(Value::String(id)) => id,
        Some(other) => {
            return Err(ParseError::new(here, format!("id must be a string, got {}", other)));
        }
    };
    if !seen.insert(id.clone()) {
        return Err(ParseError::new(here, format!("duplicate node id '{}'", id)));
    }

    let mut attributes = match map.remove("attributes") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(attrs)) => attrs,
        Some(other) => {
            return Err(ParseError::new(
                format!("{}/attributes", path),
                format!("attributes must be an object, got {}", other),
            ));
        }
    };

    let children = match map.remove("children").or_else(|| map.remove("objects")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::new(
                format!("{}/children", path),
                format!("children must be an array, got {}", other),
            ));
        }
    };

    // Legacy flat attributes; explicit `attributes` entries win.
    for (key, value) in map {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            attributes.entry(key).or_insert(value);
        }
    }

    let merge_field = match attributes.remove(MERGE_FIELD_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(field)) => Some(field),
        Some(other) => {
            return Err(ParseError::new(
                format!("{}/attributes/{}", path, MERGE_FIELD_KEY),
                format!("mergeField must be a string, got {}", other),
            ));
        }
    };

    if !children.is_empty() && !kind.is_container() {
        return Err(ParseError::new(
            format!("{}/children", path),
            format!("{} nodes cannot have children", kind),
        ));
    }

    let mut node = Node::with_id(id, kind);
    for (key, value) in attributes {
        node.set_attr(key, value);
    }
    node.set_merge_field(merge_field);

    for (i, child) in children.into_iter().enumerate() {
        let child_path = format!("{}/children/{}", path, i);
        let Value::Object(child_map) = child else {
            return Err(ParseError::new(child_path, format!("expected object, got {}", child)));
        };
        let child = decode_node(child_map, &child_path, seen)?;
        node.children_mut().push(child);
    }

    Ok(node)
}
