//! # Error Types
//!
//! One error enum per pipeline stage, plus [`CoverError`] which wraps them all
//! for callers (CLI, server) that drive the whole pipeline.

use thiserror::Error;

/// A structural operation would break the tree invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("duplicate node id: {id}")]
    DuplicateId { id: String },

    /// Only groups may hold children.
    #[error("node {id} ({kind}) cannot have children")]
    NotAContainer { id: String, kind: String },

    /// Moving `node` under `target` would make it its own ancestor.
    #[error("cannot move {node} into {target}: would create a cycle")]
    Cycle { node: String, target: String },

    #[error("the root node cannot be removed or moved")]
    RootImmutable,

    #[error("index {index} out of bounds for {parent} ({len} children)")]
    IndexOutOfBounds {
        parent: String,
        index: usize,
        len: usize,
    },
}

/// Malformed canonical form. `path` points at the offending node,
/// e.g. `/root/children/2/attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {path}: {message}")]
pub struct ParseError {
    pub path: String,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Template lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown template: {id}")]
    InvalidTemplate { id: String },

    /// A template factory produced a tree that breaks the document rules.
    #[error("template {id} built an invalid document: {source}")]
    Broken {
        id: String,
        #[source]
        source: StructuralError,
    },
}

/// Signing an internal asset reference failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to resolve asset {reference}: {message}")]
pub struct ResolutionError {
    pub reference: String,
    pub message: String,
}

impl ResolutionError {
    pub fn new(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Main error type for coverpage operations
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Invalid configuration (bad URL, missing setting)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level errors (bind, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
