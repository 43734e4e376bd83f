//! # Coverpage - Cover Page Documents and Merge Resolution
//!
//! Coverpage models a report's cover page as an editable vector document and
//! turns it into a populated, render-ready copy. It provides:
//!
//! - **Document model**: a tree of typed nodes with structural invariants
//! - **Codec**: lossless canonical JSON persistence
//! - **Templates**: a fixed registry of layouts plus color scheme precedence
//! - **Merge resolution**: data substitution and asset signing on a copy
//!
//! ## Quick Start
//!
//! ```no_run
//! use coverpage::{
//!     document::codec,
//!     merge::{MergeResolver, NoSigner, ResolutionContext},
//!     template,
//! };
//!
//! # async fn demo() -> Result<(), coverpage::CoverError> {
//! // Start from a template, recolored with a named palette
//! let scheme = template::resolve_colors(Some("green"), None);
//! let doc = template::instantiate_with_colors("centered", scheme.as_ref())?;
//!
//! // Persist and reload
//! let bytes = codec::encode(&doc);
//! let doc = codec::decode(&bytes)?;
//!
//! // Populate a copy for one report
//! let mut context = ResolutionContext::default();
//! context.report.title = Some("Home Inspection".into());
//! let resolved = MergeResolver::new(&context, &NoSigner).resolve(&doc).await?;
//!
//! println!("{}", codec::encode_pretty(&resolved.document));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Node tree, structural operations, codec |
//! | [`template`] | Template registry and color schemes |
//! | [`merge`] | Merge fields, tokens, asset signing |
//! | [`server`] | HTTP API |
//! | [`config`] | Runtime configuration |
//! | [`error`] | Error types |

pub mod config;
pub mod document;
pub mod error;
pub mod merge;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use document::{Document, Node, NodeKind};
pub use error::CoverError;
pub use merge::{MergeResolver, ResolutionContext, Resolved};
