//! Embedded `{{namespace.field}}` tokens in text content.
//!
//! Namespaces form a closed set. A token whose namespace is unknown, or
//! whose field has no value, is left in the text verbatim.

use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use super::context::FieldSource;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("token pattern is valid")
});

/// Data namespaces a token may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Organization,
    Inspector,
    Contact,
    Report,
    Image,
}

impl Namespace {
    pub const ALL: &'static [Namespace] = &[
        Namespace::Organization,
        Namespace::Inspector,
        Namespace::Contact,
        Namespace::Report,
        Namespace::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Organization => "organization",
            Namespace::Inspector => "inspector",
            Namespace::Contact => "contact",
            Namespace::Report => "report",
            Namespace::Image => "image",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ns| ns.as_str() == name)
    }

    /// Canonical field names resolvable in this namespace.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Namespace::Organization => &["name", "phone", "email", "website", "address", "logoUrl"],
            Namespace::Inspector => &["name", "email", "phone", "license", "avatarUrl"],
            Namespace::Contact => &["name", "firstName", "lastName", "email", "phone", "avatarUrl"],
            Namespace::Report => &[
                "title",
                "address",
                "city",
                "state",
                "zip",
                "fullAddress",
                "reportNumber",
                "inspectionDate",
                "coverImage",
            ],
            Namespace::Image => &["cover", "logo", "avatar"],
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The namespace as written.
    pub namespace: String,
    pub field: String,
    /// Byte range of the whole `{{...}}` in the source text.
    pub span: Range<usize>,
}

impl Token {
    /// The namespace, if it is one of the known ones.
    pub fn known_namespace(&self) -> Option<Namespace> {
        Namespace::parse(&self.namespace)
    }

    /// Whether the namespace is known and the field is one of its
    /// canonical fields (snake_case spellings count).
    pub fn is_known(&self) -> bool {
        self.known_namespace().is_some_and(|ns| {
            let camel = snake_to_camel(&self.field);
            ns.fields().contains(&camel.as_str())
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}.{}}}}}", self.namespace, self.field)
    }
}

/// Find every well-formed token in `text`, in order.
pub fn tokens(text: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Token {
                namespace: caps[1].to_string(),
                field: caps[2].to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Replace tokens in `text` with values from `source`.
///
/// Lookups for all tokens are issued together. Unknown namespaces and
/// missing values keep the original token text.
pub async fn substitute(text: &str, source: &dyn FieldSource) -> String {
    let found = tokens(text);
    if found.is_empty() {
        return text.to_string();
    }

    let lookups = found.iter().map(|token| async move {
        let Some(namespace) = token.known_namespace() else {
            return None;
        };
        source
            .field(namespace, &token.field)
            .await
            .filter(|v| !v.is_empty())
    });
    let values = join_all(lookups).await;

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (token, value) in found.iter().zip(values) {
        out.push_str(&text[last..token.span.start]);
        match value {
            Some(v) => out.push_str(&v),
            None => {
                tracing::debug!(token = %token, "unresolved token left in place");
                out.push_str(&text[token.span.clone()]);
            }
        }
        last = token.span.end;
    }
    out.push_str(&text[last..]);
    out
}

/// `logo_url` -> `logoUrl`. Already-camel names pass through.
pub(crate) fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::context::{OrganizationData, ReportData, ResolutionContext};
    use pretty_assertions::assert_eq;

    fn context() -> ResolutionContext {
        ResolutionContext {
            organization: OrganizationData {
                name: Some("Acme Inspections".into()),
                phone: Some("555-0100".into()),
                ..Default::default()
            },
            report: ReportData {
                title: Some("Home Inspection".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_tokens_found_in_order() {
        let found = tokens("{{report.title}} for {{ contact.name }} at {{broken}}");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].namespace, "report");
        assert_eq!(found[0].field, "title");
        assert_eq!(found[0].span, 0..16);
        assert_eq!(found[1].field, "name");
    }

    #[test]
    fn test_token_known() {
        let t = &tokens("{{organization.logo_url}} {{report.colour}} {{weather.today}}");
        assert!(t[0].is_known());
        assert!(!t[1].is_known());
        assert!(!t[2].is_known());
        assert_eq!(t[2].known_namespace(), None);
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("logo_url"), "logoUrl");
        assert_eq!(snake_to_camel("inspection_date"), "inspectionDate");
        assert_eq!(snake_to_camel("logoUrl"), "logoUrl");
        assert_eq!(snake_to_camel("_private"), "private");
    }

    #[tokio::test]
    async fn test_substitute_known_tokens() {
        let out = substitute("{{report.title}} by {{organization.name}} ({{ organization.phone }})", &context()).await;
        assert_eq!(out, "Home Inspection by Acme Inspections (555-0100)");
    }

    #[tokio::test]
    async fn test_unknown_namespace_left_verbatim() {
        let out = substitute("Prepared for {{unknown.field}}", &context()).await;
        assert_eq!(out, "Prepared for {{unknown.field}}");
    }

    #[tokio::test]
    async fn test_missing_value_left_verbatim() {
        let out = substitute("Call {{contact.phone}} or {{organization.phone}}", &context()).await;
        assert_eq!(out, "Call {{contact.phone}} or 555-0100");
    }

    #[tokio::test]
    async fn test_text_without_tokens_unchanged() {
        assert_eq!(substitute("plain {text}", &context()).await, "plain {text}");
        assert_eq!(substitute("", &context()).await, "");
    }

    #[tokio::test]
    async fn test_multibyte_text_around_tokens() {
        let out = substitute("Prüfbericht · {{report.title}} · ✓", &context()).await;
        assert_eq!(out, "Prüfbericht · Home Inspection · ✓");
    }
}
