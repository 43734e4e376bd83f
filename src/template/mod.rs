//! # Template Registry
//!
//! A fixed set of cover page templates. Each template is a factory that
//! builds a fresh [`Document`] on every call, plus style-class slots for the
//! title/subtitle/footer text and a default color triple.
//!
//! ```
//! use coverpage::template;
//!
//! for t in template::all() {
//!     println!("{} - {}", t.id, t.name);
//! }
//!
//! let doc = template::instantiate("centered").unwrap();
//! assert!(doc.find("title").is_some());
//! ```

pub mod color;
mod layouts;

pub use color::{ColorScheme, CustomColors, Hsl, effective_colors, resolve_colors};

use serde::Serialize;
use serde_json::Value;

use crate::document::{Document, NodeMut};
use crate::error::{StructuralError, TemplateError};

/// Attribute naming which scheme color fills a node.
pub const COLOR_ROLE_KEY: &str = "colorRole";

/// Attribute naming which scheme color strokes a node.
pub const STROKE_ROLE_KEY: &str = "strokeRole";

/// Style class names for the text slots a template exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleSlots {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub footer: &'static str,
}

/// A registered template.
#[derive(Debug, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub styles: StyleSlots,
    /// Built-in colors, used when no scheme overrides them.
    pub colors: ColorScheme,
    #[serde(skip)]
    build: fn(&Template) -> Result<Document, StructuralError>,
}

impl Template {
    const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        styles: StyleSlots,
        colors: ColorScheme,
        build: fn(&Template) -> Result<Document, StructuralError>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            styles,
            colors,
            build,
        }
    }

    /// Build a fresh document painted with the template's own colors.
    pub fn instantiate(&self) -> Result<Document, TemplateError> {
        self.instantiate_with_colors(None)
    }

    /// Build a fresh document, painting `colorRole`/`strokeRole` nodes with
    /// `scheme`, or with the template's colors when `scheme` is `None`.
    pub fn instantiate_with_colors(
        &self,
        scheme: Option<&ColorScheme>,
    ) -> Result<Document, TemplateError> {
        let mut doc = (self.build)(self).map_err(|source| TemplateError::Broken {
            id: self.id.to_string(),
            source,
        })?;
        apply_colors(&mut doc, scheme.unwrap_or(&self.colors));
        Ok(doc)
    }
}

/// All registered templates.
static TEMPLATES: &[Template] = &[
    Template::new(
        "classic",
        "Classic",
        "Full-width header band, large cover photo, details block and footer",
        StyleSlots {
            title: "cover-title cover-title--classic",
            subtitle: "cover-subtitle",
            footer: "cover-footer",
        },
        ColorScheme {
            primary: Hsl::new(215.0, 50.0, 23.0),
            secondary: Hsl::new(215.0, 25.0, 40.0),
            accent: Hsl::new(38.0, 92.0, 50.0),
        },
        layouts::classic,
    ),
    Template::new(
        "centered",
        "Centered",
        "Symmetric layout with the logo on top and a centered title",
        StyleSlots {
            title: "cover-title cover-title--centered",
            subtitle: "cover-subtitle cover-subtitle--centered",
            footer: "cover-footer cover-footer--centered",
        },
        ColorScheme {
            primary: Hsl::new(220.0, 87.0, 56.0),
            secondary: Hsl::new(220.0, 70.0, 40.0),
            accent: Hsl::new(220.0, 90.0, 70.0),
        },
        layouts::centered_layout,
    ),
    Template::new(
        "modern",
        "Modern",
        "Left sidebar in the primary color with content on the right",
        StyleSlots {
            title: "cover-title cover-title--modern",
            subtitle: "cover-subtitle cover-subtitle--modern",
            footer: "cover-footer cover-footer--modern",
        },
        ColorScheme {
            primary: Hsl::new(173.0, 80.0, 30.0),
            secondary: Hsl::new(175.0, 84.0, 22.0),
            accent: Hsl::new(172.0, 66.0, 50.0),
        },
        layouts::modern,
    ),
    Template::new(
        "minimal",
        "Minimal",
        "Plain page with a thin accent rule",
        StyleSlots {
            title: "cover-title cover-title--minimal",
            subtitle: "cover-subtitle",
            footer: "cover-footer cover-footer--minimal",
        },
        ColorScheme {
            primary: Hsl::new(0.0, 0.0, 9.0),
            secondary: Hsl::new(0.0, 0.0, 45.0),
            accent: Hsl::new(0.0, 72.0, 51.0),
        },
        layouts::minimal,
    ),
];

/// Get all registered templates.
pub fn all() -> &'static [Template] {
    TEMPLATES
}

/// Look up a template by id.
pub fn by_id(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// List all template ids.
pub fn list_ids() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.id).collect()
}

fn lookup(id: &str) -> Result<&'static Template, TemplateError> {
    by_id(id).ok_or_else(|| TemplateError::InvalidTemplate { id: id.to_string() })
}

/// Build a fresh document for `id`.
pub fn instantiate(id: &str) -> Result<Document, TemplateError> {
    lookup(id)?.instantiate()
}

/// Build a fresh document for `id` painted with `scheme` (template colors
/// when `None`).
pub fn instantiate_with_colors(
    id: &str,
    scheme: Option<&ColorScheme>,
) -> Result<Document, TemplateError> {
    lookup(id)?.instantiate_with_colors(scheme)
}

/// Paint every node tagged with a color or stroke role.
fn apply_colors(doc: &mut Document, scheme: &ColorScheme) {
    let targets: Vec<(String, Option<String>, Option<String>)> = doc
        .root()
        .descendants()
        .filter_map(|n| {
            let fill = n.attr_str(COLOR_ROLE_KEY).map(str::to_string);
            let stroke = n.attr_str(STROKE_ROLE_KEY).map(str::to_string);
            (fill.is_some() || stroke.is_some()).then(|| (n.id().to_string(), fill, stroke))
        })
        .collect();

    for (id, fill, stroke) in targets {
        let Some(mut node) = doc.find_mut(&id) else {
            continue;
        };
        paint(&mut node, "fill", fill.as_deref(), scheme);
        paint(&mut node, "stroke", stroke.as_deref(), scheme);
    }
}

fn paint(node: &mut NodeMut<'_>, key: &str, role: Option<&str>, scheme: &ColorScheme) {
    let Some(role) = role else {
        return;
    };
    match scheme.role(role) {
        Some(color) => node.set_attr(key, Value::String(color.to_css())),
        None => tracing::warn!(node = node.id(), role, "unknown color role"),
    }
}
