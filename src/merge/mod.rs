//! # Merge-Field Resolver
//!
//! Turns a token-laden template document into a populated, render-ready
//! copy. The source [`Document`] is never touched: [`MergeResolver::resolve`]
//! clones it and works on the owned copy.
//!
//! Per node, in this order:
//!
//! 1. **Merge field**: a node tagged with a known [`MergeField`] gets its
//!    `src` replaced by the bound value, and its placeholder styling
//!    (dashed stroke, stroke width, background) is cleared. A node that
//!    already shows an external URL with no placeholder styling is left
//!    alone, so resolving a resolved copy changes nothing.
//! 2. **Tokens**: `{{namespace.field}}` in the `text` attribute are
//!    substituted; unresolved tokens stay verbatim.
//! 3. **Assets**: every `src`-like attribute holding an internal reference
//!    is exchanged for a signed URL. External URLs pass through.
//!
//! Children of a group are resolved concurrently with the group's own
//! lookups and joined back in source order.
//!
//! ```no_run
//! # async fn demo() -> Result<(), coverpage::CoverError> {
//! use coverpage::merge::{MergeResolver, NoSigner, ResolutionContext};
//!
//! let template = coverpage::template::instantiate("classic")?;
//! let context = ResolutionContext::default();
//! let resolved = MergeResolver::new(&context, &NoSigner).resolve(&template).await?;
//! for failure in &resolved.failures {
//!     eprintln!("{}: {}", failure.node_id, failure.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod context;
pub mod token;

pub use asset::{
    AssetLocator, AssetRef, AssetResolver, HttpSigner, NoSigner, is_external_url, is_src_key,
};
pub use context::{
    ContactData, FieldSource, InspectorData, OrganizationData, ReportData, ResolutionContext,
};
pub use token::{Namespace, Token, substitute, tokens};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::document::{Document, Node, SRC_KEY, TEXT_KEY};
use crate::error::ResolutionError;

/// Styling that only marks an unfilled image slot.
pub const PLACEHOLDER_KEYS: &[&str] = &["stroke", "strokeWidth", "strokeDashArray", "backgroundColor"];

// ============================================================================
// MERGE FIELDS
// ============================================================================

/// Merge fields that bind a node's `src` to context data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeField {
    ReportCoverImage,
    OrganizationLogo,
    InspectorAvatar,
    ContactAvatar,
}

impl MergeField {
    pub const ALL: &'static [MergeField] = &[
        MergeField::ReportCoverImage,
        MergeField::OrganizationLogo,
        MergeField::InspectorAvatar,
        MergeField::ContactAvatar,
    ];

    /// Parse `namespace.field`. Accepts snake_case fields and the
    /// `image.cover` / `image.logo` / `image.avatar` shorthands.
    pub fn parse(s: &str) -> Option<Self> {
        let (ns, field) = s.trim().split_once('.')?;
        let field = token::snake_to_camel(field);
        match (Namespace::parse(ns)?, field.as_str()) {
            (Namespace::Report, "coverImage") | (Namespace::Image, "cover") => {
                Some(MergeField::ReportCoverImage)
            }
            (Namespace::Organization, "logoUrl") | (Namespace::Image, "logo") => {
                Some(MergeField::OrganizationLogo)
            }
            (Namespace::Inspector, "avatarUrl") | (Namespace::Image, "avatar") => {
                Some(MergeField::InspectorAvatar)
            }
            (Namespace::Contact, "avatarUrl") => Some(MergeField::ContactAvatar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeField::ReportCoverImage => "report.coverImage",
            MergeField::OrganizationLogo => "organization.logoUrl",
            MergeField::InspectorAvatar => "inspector.avatarUrl",
            MergeField::ContactAvatar => "contact.avatarUrl",
        }
    }

    /// The context field this merge field reads.
    pub fn binding(&self) -> (Namespace, &'static str) {
        match self {
            MergeField::ReportCoverImage => (Namespace::Report, "coverImage"),
            MergeField::OrganizationLogo => (Namespace::Organization, "logoUrl"),
            MergeField::InspectorAvatar => (Namespace::Inspector, "avatarUrl"),
            MergeField::ContactAvatar => (Namespace::Contact, "avatarUrl"),
        }
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// What to do when one asset cannot be signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetErrorPolicy {
    /// Keep the node's unsigned reference, record the failure, and finish
    /// the rest of the tree.
    #[default]
    Degrade,
    /// Fail the whole resolution.
    Abort,
}

/// An asset left unsigned under [`AssetErrorPolicy::Degrade`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFailure {
    pub node_id: String,
    pub attribute: String,
    pub reference: String,
    pub message: String,
}

/// A resolved copy plus any degraded assets, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: Document,
    pub failures: Vec<AssetFailure>,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// A merge-field node that already shows an external image with no
/// placeholder styling left. Binding it again would only re-sign the value.
fn is_bound(node: &Node) -> bool {
    node.attr_str(SRC_KEY).is_some_and(is_external_url)
        && PLACEHOLDER_KEYS.iter().all(|key| node.attr(key).is_none())
}

type NodeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<AssetFailure>, ResolutionError>> + Send + 'a>>;

/// Owned inputs for one node's own lookups, taken before its children are
/// borrowed for the concurrent pass.
struct NodeWork {
    id: String,
    merge_field: Option<MergeField>,
    text: Option<String>,
    sources: Vec<(String, String)>,
}

#[derive(Default)]
struct NodeOutcome {
    bound: Option<String>,
    text: Option<String>,
    signed: Vec<(String, String)>,
    failures: Vec<AssetFailure>,
}

enum SourceOutcome {
    Unchanged,
    Signed(String, String),
    Failed(AssetFailure),
}

/// Resolves documents against one context and asset resolver.
///
/// Holds only borrows; build one per render.
pub struct MergeResolver<'a> {
    fields: &'a dyn FieldSource,
    assets: &'a dyn AssetResolver,
    locator: AssetLocator,
    policy: AssetErrorPolicy,
}

impl<'a> MergeResolver<'a> {
    pub fn new(fields: &'a dyn FieldSource, assets: &'a dyn AssetResolver) -> Self {
        Self {
            fields,
            assets,
            locator: AssetLocator::default(),
            policy: AssetErrorPolicy::default(),
        }
    }

    pub fn with_locator(mut self, locator: AssetLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_policy(mut self, policy: AssetErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a copy of `source`. `source` is left exactly as it was.
    pub async fn resolve(&self, source: &Document) -> Result<Resolved, ResolutionError> {
        let mut document = source.clone();
        let failures = self.resolve_node(document.root_mut()).await?;

        tracing::info!(
            nodes = document.node_count(),
            failures = failures.len(),
            "resolved document"
        );
        Ok(Resolved { document, failures })
    }

    /// Resolve one node and its subtree in place.
    fn resolve_node<'n>(&'n self, node: &'n mut Node) -> NodeFuture<'n> {
        Box::pin(async move {
            let work = NodeWork {
                id: node.id().to_string(),
                merge_field: node.merge_field().filter(|_| !is_bound(node)).and_then(|f| {
                    let parsed = MergeField::parse(f);
                    if parsed.is_none() {
                        tracing::debug!(node = node.id(), field = f, "unknown merge field");
                    }
                    parsed
                }),
                text: node.text_content().map(str::to_string),
                sources: node
                    .attributes()
                    .iter()
                    .filter(|(key, _)| is_src_key(key))
                    .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_string())))
                    .collect(),
            };

            let children = node.children_mut();
            let (own, nested) = futures::join!(
                self.resolve_own(work),
                try_join_all(children.iter_mut().map(|child| self.resolve_node(child)))
            );
            let own = own?;
            let nested = nested?;

            if let Some(value) = own.bound {
                node.set_attr(SRC_KEY, value);
                for key in PLACEHOLDER_KEYS {
                    node.remove_attr(key);
                }
            }
            if let Some(text) = own.text {
                node.set_attr(TEXT_KEY, text);
            }
            for (key, url) in own.signed {
                node.set_attr(key, url);
            }

            let mut failures = own.failures;
            failures.extend(nested.into_iter().flatten());
            Ok(failures)
        })
    }

    async fn resolve_own(&self, mut work: NodeWork) -> Result<NodeOutcome, ResolutionError> {
        let bound = async {
            let Some(field) = work.merge_field else {
                return None;
            };
            let (namespace, name) = field.binding();
            let value = self.fields.field(namespace, name).await.filter(|v| !v.is_empty());
            if value.is_none() {
                tracing::debug!(node = %work.id, field = field.as_str(), "merge field has no value");
            }
            value
        };
        let text = async {
            match work.text.as_deref() {
                Some(text) if !token::tokens(text).is_empty() => {
                    Some(substitute(text, self.fields).await)
                }
                _ => None,
            }
        };
        let (bound, text) = futures::join!(bound, text);

        // The bound value replaces `src` before signing.
        if let Some(value) = &bound {
            match work.sources.iter_mut().find(|(key, _)| key == SRC_KEY) {
                Some(entry) => entry.1 = value.clone(),
                None => work.sources.push((SRC_KEY.to_string(), value.clone())),
            }
        }

        let outcomes = try_join_all(
            work.sources
                .iter()
                .map(|(key, value)| self.sign_source(&work.id, key, value)),
        )
        .await?;

        let mut outcome = NodeOutcome {
            bound,
            text,
            ..Default::default()
        };
        for result in outcomes {
            match result {
                SourceOutcome::Unchanged => {}
                SourceOutcome::Signed(key, url) => outcome.signed.push((key, url)),
                SourceOutcome::Failed(failure) => outcome.failures.push(failure),
            }
        }
        Ok(outcome)
    }

    async fn sign_source(
        &self,
        node_id: &str,
        key: &str,
        value: &str,
    ) -> Result<SourceOutcome, ResolutionError> {
        let Some(parsed) = self.locator.internal_ref(value) else {
            return Ok(SourceOutcome::Unchanged);
        };
        let signed = match parsed {
            Ok(asset) => self.assets.sign(&asset).await,
            Err(e) => Err(e),
        };

        match (signed, self.policy) {
            (Ok(url), _) => Ok(SourceOutcome::Signed(key.to_string(), url)),
            (Err(e), AssetErrorPolicy::Abort) => {
                tracing::warn!(node = node_id, attribute = key, error = %e, "asset signing failed, aborting");
                Err(e)
            }
            (Err(e), AssetErrorPolicy::Degrade) => {
                tracing::warn!(node = node_id, attribute = key, error = %e, "asset left unresolved");
                Ok(SourceOutcome::Failed(AssetFailure {
                    node_id: node_id.to_string(),
                    attribute: key.to_string(),
                    reference: e.reference,
                    message: e.message,
                }))
            }
        }
    }
}
