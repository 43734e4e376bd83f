//! Template factories.
//!
//! Every factory builds a brand-new tree with stable, human-readable node
//! ids so that two instantiations are structurally identical. Text slots
//! carry `{{namespace.field}}` tokens; image slots carry merge fields and
//! placeholder styling that the resolver clears once real content arrives.

use serde_json::json;

use super::{COLOR_ROLE_KEY, STROKE_ROLE_KEY, Template};
use crate::document::{Canvas, Document, Node, NodeKind};
use crate::error::StructuralError;

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 40.0;

// ============================================================================
// BUILDING BLOCKS
// ============================================================================

fn text(id: &str, content: &str, left: f64, top: f64, size: f64, class: &str) -> Node {
    Node::text(id, content)
        .with_attr("left", left)
        .with_attr("top", top)
        .with_attr("fontSize", size)
        .with_attr("fontFamily", "Inter")
        .with_attr("styleClass", class)
}

fn centered(node: Node, width: f64) -> Node {
    node.with_attr("left", PAGE_WIDTH / 2.0)
        .with_attr("originX", "center")
        .with_attr("textAlign", "center")
        .with_attr("width", width)
}

fn band(id: &str, left: f64, top: f64, width: f64, height: f64, role: &str) -> Node {
    Node::rect(id)
        .with_attr("left", left)
        .with_attr("top", top)
        .with_attr("width", width)
        .with_attr("height", height)
        .with_attr(COLOR_ROLE_KEY, role)
}

/// Image slot bound to `merge_field`, drawn as a dashed box until resolved.
fn placeholder(id: &str, merge_field: &str, left: f64, top: f64, width: f64, height: f64) -> Node {
    Node::with_id(id, NodeKind::Image)
        .with_attr("src", "")
        .with_merge_field(merge_field)
        .with_attr("left", left)
        .with_attr("top", top)
        .with_attr("width", width)
        .with_attr("height", height)
        .with_attr("stroke", "#94a3b8")
        .with_attr("strokeWidth", 2)
        .with_attr("strokeDashArray", json!([8, 6]))
        .with_attr("backgroundColor", "#f1f5f9")
}

fn details(left: f64, top: f64, align_center: bool) -> Node {
    let lines = [
        ("prepared-for", "Prepared for {{contact.name}}"),
        ("inspection-date", "Inspected on {{report.inspectionDate}}"),
        ("inspector", "Inspector: {{inspector.name}} ({{inspector.license}})"),
    ];
    let mut group = Node::group("details");
    for (i, (id, content)) in lines.into_iter().enumerate() {
        let mut line = text(id, content, left, top + i as f64 * 22.0, 13.0, "cover-detail");
        if align_center {
            line = centered(line, PAGE_WIDTH - 2.0 * MARGIN);
        }
        group = group.with_child(line);
    }
    group
}

fn document(template: &Template, children: Vec<Node>) -> Result<Document, StructuralError> {
    let mut root = Node::group(crate::document::ROOT_ID).with_attr("template", template.id);
    for child in children {
        root = root.with_child(child);
    }
    Document::from_root(Canvas::default(), root)
}

// ============================================================================
// TEMPLATES
// ============================================================================

pub(super) fn classic(t: &Template) -> Result<Document, StructuralError> {
    let footer_top = PAGE_HEIGHT - 70.0;
    document(
        t,
        vec![
            band("header-band", 0.0, 0.0, PAGE_WIDTH, 130.0, "primary"),
            text("title", "{{report.title}}", MARGIN, 36.0, 30.0, t.styles.title)
                .with_attr("fill", "#ffffff"),
            text("subtitle", "{{report.fullAddress}}", MARGIN, 82.0, 15.0, t.styles.subtitle)
                .with_attr("fill", "#ffffff"),
            placeholder("cover-image", "report.coverImage", MARGIN, 160.0, PAGE_WIDTH - 2.0 * MARGIN, 380.0),
            details(MARGIN, 568.0, false),
            Node::group("footer")
                .with_child(band("footer-rule", MARGIN, footer_top - 10.0, PAGE_WIDTH - 2.0 * MARGIN, 2.0, "accent"))
                .with_child(placeholder("logo", "organization.logoUrl", MARGIN, footer_top, 120.0, 48.0))
                .with_child(text(
                    "footer-text",
                    "{{organization.name}} · {{organization.phone}} · {{organization.website}}",
                    180.0,
                    footer_top + 16.0,
                    11.0,
                    t.styles.footer,
                )),
        ],
    )
}

pub(super) fn centered_layout(t: &Template) -> Result<Document, StructuralError> {
    let content_width = PAGE_WIDTH - 2.0 * MARGIN;
    document(
        t,
        vec![
            placeholder("logo", "organization.logoUrl", (PAGE_WIDTH - 140.0) / 2.0, MARGIN, 140.0, 56.0),
            centered(
                text("title", "{{report.title}}", 0.0, 120.0, 32.0, t.styles.title),
                content_width,
            )
            .with_attr(COLOR_ROLE_KEY, "primary"),
            centered(
                text("subtitle", "{{report.fullAddress}}", 0.0, 166.0, 15.0, t.styles.subtitle),
                content_width,
            )
            .with_attr(COLOR_ROLE_KEY, "secondary"),
            placeholder("cover-image", "report.coverImage", 96.0, 210.0, PAGE_WIDTH - 192.0, 320.0)
                .with_attr(STROKE_ROLE_KEY, "accent"),
            details(0.0, 560.0, true),
            Node::group("footer")
                .with_child(band("footer-rule", 156.0, PAGE_HEIGHT - 80.0, 300.0, 2.0, "accent"))
                .with_child(centered(
                    text(
                        "footer-text",
                        "{{organization.name}} · {{organization.email}} · {{organization.phone}}",
                        0.0,
                        PAGE_HEIGHT - 64.0,
                        11.0,
                        t.styles.footer,
                    ),
                    content_width,
                )),
        ],
    )
}

pub(super) fn modern(t: &Template) -> Result<Document, StructuralError> {
    let sidebar = 180.0;
    let left = sidebar + 32.0;
    let width = PAGE_WIDTH - left - MARGIN;
    document(
        t,
        vec![
            band("sidebar", 0.0, 0.0, sidebar, PAGE_HEIGHT, "primary"),
            band("sidebar-accent", sidebar, 0.0, 6.0, PAGE_HEIGHT, "accent"),
            placeholder("logo", "organization.logoUrl", 30.0, MARGIN, 120.0, 120.0),
            text("org-name", "{{organization.name}}", 30.0, 180.0, 14.0, "cover-sidebar")
                .with_attr("fill", "#ffffff")
                .with_attr("width", 120.0),
            text("title", "{{report.title}}", left, 60.0, 28.0, t.styles.title)
                .with_attr(COLOR_ROLE_KEY, "secondary")
                .with_attr("width", width),
            text("subtitle", "{{report.fullAddress}}", left, 104.0, 14.0, t.styles.subtitle)
                .with_attr("width", width),
            placeholder("cover-image", "report.coverImage", left, 150.0, width, 330.0),
            details(left, 510.0, false),
            Node::group("footer").with_child(
                text(
                    "footer-text",
                    "{{organization.phone}} · {{organization.website}}",
                    left,
                    PAGE_HEIGHT - 60.0,
                    11.0,
                    t.styles.footer,
                )
                .with_attr("width", width),
            ),
        ],
    )
}

pub(super) fn minimal(t: &Template) -> Result<Document, StructuralError> {
    let width = PAGE_WIDTH - 2.0 * MARGIN;
    document(
        t,
        vec![
            text("title", "{{report.title}}", MARGIN, 72.0, 26.0, t.styles.title)
                .with_attr(COLOR_ROLE_KEY, "primary"),
            band("rule", MARGIN, 114.0, 64.0, 3.0, "accent"),
            text("subtitle", "{{report.fullAddress}}", MARGIN, 130.0, 13.0, t.styles.subtitle)
                .with_attr(COLOR_ROLE_KEY, "secondary"),
            placeholder("cover-image", "report.coverImage", MARGIN, 180.0, width, 300.0),
            details(MARGIN, 510.0, false),
            Node::group("footer").with_child(text(
                "footer-text",
                "{{organization.name}}",
                MARGIN,
                PAGE_HEIGHT - 56.0,
                10.0,
                t.styles.footer,
            )),
        ],
    )
}
