//! Resolution context: the data a cover page is populated with.
//!
//! [`ResolutionContext`] is built per render by the caller and passed into
//! the resolver explicitly; nothing here is global or cached between
//! renders. Each namespace has its own typed record with a `field` lookup.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::token::{Namespace, snake_to_camel};

/// Something that can answer `namespace.field` lookups.
///
/// `None` means "no value available"; the resolver then leaves the token or
/// merge field unresolved.
#[async_trait]
pub trait FieldSource: Send + Sync {
    async fn field(&self, namespace: Namespace, name: &str) -> Option<String>;
}

/// Treat empty strings as absent.
fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string)
}

// ============================================================================
// NAMESPACE RECORDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub report_number: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    /// Cover photo; usually an internal storage reference.
    pub cover_image: Option<String>,
}

impl ReportData {
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "title" => present(&self.title),
            "address" => present(&self.address),
            "city" => present(&self.city),
            "state" => present(&self.state),
            "zip" => present(&self.zip),
            "fullAddress" => self.full_address(),
            "reportNumber" => present(&self.report_number),
            "inspectionDate" => self
                .inspection_date
                .map(|d| d.format("%B %-d, %Y").to_string()),
            "coverImage" => present(&self.cover_image),
            _ => None,
        }
    }

    /// `"12 Oak St, Springfield, IL 62701"`, skipping missing parts.
    pub fn full_address(&self) -> Option<String> {
        let region = [present(&self.state), present(&self.zip)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let parts: Vec<String> = [present(&self.address), present(&self.city)]
            .into_iter()
            .flatten()
            .chain((!region.is_empty()).then_some(region))
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationData {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
}

impl OrganizationData {
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => present(&self.name),
            "phone" => present(&self.phone),
            "email" => present(&self.email),
            "website" => present(&self.website),
            "address" => present(&self.address),
            "logoUrl" => present(&self.logo_url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectorData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license: Option<String>,
    pub avatar_url: Option<String>,
}

impl InspectorData {
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => present(&self.name),
            "email" => present(&self.email),
            "phone" => present(&self.phone),
            "license" => present(&self.license),
            "avatarUrl" => present(&self.avatar_url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactData {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ContactData {
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => present(&self.name).or_else(|| self.joined_name()),
            "firstName" => present(&self.first_name),
            "lastName" => present(&self.last_name),
            "email" => present(&self.email),
            "phone" => present(&self.phone),
            "avatarUrl" => present(&self.avatar_url),
            _ => None,
        }
    }

    fn joined_name(&self) -> Option<String> {
        let parts: Vec<String> = [present(&self.first_name), present(&self.last_name)]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// All data available to one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionContext {
    pub report: ReportData,
    pub organization: OrganizationData,
    pub inspector: InspectorData,
    pub contact: ContactData,
}

impl ResolutionContext {
    /// Synchronous lookup. Field names may be camelCase or snake_case.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<String> {
        let name = snake_to_camel(name);
        match namespace {
            Namespace::Report => self.report.field(&name),
            Namespace::Organization => self.organization.field(&name),
            Namespace::Inspector => self.inspector.field(&name),
            Namespace::Contact => self.contact.field(&name),
            Namespace::Image => match name.as_str() {
                "cover" => self.report.field("coverImage"),
                "logo" => self.organization.field("logoUrl"),
                "avatar" => self.inspector.field("avatarUrl"),
                _ => None,
            },
        }
    }
}

#[async_trait]
impl FieldSource for ResolutionContext {
    async fn field(&self, namespace: Namespace, name: &str) -> Option<String> {
        self.lookup(namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> ResolutionContext {
        serde_json::from_str(
            r#"{
                "report": {
                    "title": "Pre-Listing Inspection",
                    "address": "12 Oak St",
                    "city": "Springfield",
                    "state": "IL",
                    "zip": "62701",
                    "inspectionDate": "2026-03-05",
                    "coverImage": "storage://reports/r1/cover.jpg"
                },
                "organization": {"name": "Acme", "logoUrl": "https://cdn.example.com/acme.png", "phone": ""},
                "inspector": {"name": "Sam Rivera", "license": "HI-4411"},
                "contact": {"firstName": "Jo", "lastName": "Park"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_report_fields() {
        let ctx = context();
        assert_eq!(ctx.lookup(Namespace::Report, "title").as_deref(), Some("Pre-Listing Inspection"));
        assert_eq!(
            ctx.lookup(Namespace::Report, "fullAddress").as_deref(),
            Some("12 Oak St, Springfield, IL 62701")
        );
        assert_eq!(
            ctx.lookup(Namespace::Report, "inspection_date").as_deref(),
            Some("March 5, 2026")
        );
    }

    #[test]
    fn test_partial_address() {
        let report = ReportData {
            city: Some("Springfield".into()),
            zip: Some("62701".into()),
            ..Default::default()
        };
        assert_eq!(report.full_address().as_deref(), Some("Springfield, 62701"));
        assert_eq!(ReportData::default().full_address(), None);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        assert_eq!(context().lookup(Namespace::Organization, "phone"), None);
    }

    #[test]
    fn test_contact_name_falls_back_to_parts() {
        assert_eq!(context().lookup(Namespace::Contact, "name").as_deref(), Some("Jo Park"));
    }

    #[test]
    fn test_image_namespace_aliases() {
        let ctx = context();
        assert_eq!(
            ctx.lookup(Namespace::Image, "cover").as_deref(),
            Some("storage://reports/r1/cover.jpg")
        );
        assert_eq!(
            ctx.lookup(Namespace::Image, "logo").as_deref(),
            Some("https://cdn.example.com/acme.png")
        );
        assert_eq!(ctx.lookup(Namespace::Image, "avatar"), None);
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(context().lookup(Namespace::Inspector, "shoeSize"), None);
    }

    #[test]
    fn test_every_declared_field_is_routed() {
        // A fully populated context answers every field the namespace declares.
        let full: ResolutionContext = serde_json::from_value(serde_json::json!({
            "report": {"title": "t", "address": "a", "city": "c", "state": "s", "zip": "z",
                       "reportNumber": "n", "inspectionDate": "2026-01-01", "coverImage": "i"},
            "organization": {"name": "n", "phone": "p", "email": "e", "website": "w",
                             "address": "a", "logoUrl": "l"},
            "inspector": {"name": "n", "email": "e", "phone": "p", "license": "l", "avatarUrl": "a"},
            "contact": {"name": "n", "firstName": "f", "lastName": "l", "email": "e",
                        "phone": "p", "avatarUrl": "a"}
        }))
        .unwrap();
        for ns in Namespace::ALL {
            for field in ns.fields() {
                assert!(full.lookup(*ns, field).is_some(), "{}.{} unresolved", ns, field);
            }
        }
    }
}
