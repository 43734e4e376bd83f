//! End-to-end: template -> persist -> reload -> resolve.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use coverpage::document::codec;
use coverpage::error::ResolutionError;
use coverpage::merge::{
    AssetErrorPolicy, AssetRef, AssetResolver, MergeResolver, PLACEHOLDER_KEYS, ResolutionContext,
};
use coverpage::template;

struct BucketSigner;

#[async_trait]
impl AssetResolver for BucketSigner {
    async fn sign(&self, asset: &AssetRef) -> Result<String, ResolutionError> {
        if asset.bucket != "reports" {
            return Err(ResolutionError::new(&asset.raw, "access denied"));
        }
        Ok(format!("https://files.example.com/{}?token=t0k", asset.path))
    }
}

fn context() -> ResolutionContext {
    serde_json::from_value(json!({
        "report": {
            "title": "Residential Inspection",
            "address": "12 Oak St",
            "city": "Springfield",
            "state": "IL",
            "zip": "62701",
            "inspectionDate": "2026-03-05",
            "coverImage": "storage://reports/r-77/front.jpg"
        },
        "organization": {
            "name": "Acme Inspections",
            "phone": "555-0100",
            "website": "acme.example.com",
            "logoUrl": "https://cdn.example.com/acme.png"
        },
        "inspector": { "name": "Sam Rivera", "license": "HI-4411" },
        "contact": { "firstName": "Jo", "lastName": "Park" }
    }))
    .unwrap()
}

#[tokio::test]
async fn classic_template_renders_end_to_end() {
    let scheme = template::resolve_colors(Some("slate"), None);
    let source = template::instantiate_with_colors("classic", scheme.as_ref()).unwrap();

    let stored = codec::encode(&source);
    let reloaded = codec::decode(&stored).unwrap();
    assert_eq!(reloaded, source);

    let ctx = context();
    let resolved = MergeResolver::new(&ctx, &BucketSigner)
        .resolve(&reloaded)
        .await
        .unwrap();
    let doc = &resolved.document;
    assert!(resolved.failures.is_empty());

    assert_eq!(doc.find("title").unwrap().text_content(), Some("Residential Inspection"));
    assert_eq!(
        doc.find("subtitle").unwrap().text_content(),
        Some("12 Oak St, Springfield, IL 62701")
    );
    assert_eq!(
        doc.find("inspection-date").unwrap().text_content(),
        Some("Inspected on March 5, 2026")
    );
    assert_eq!(
        doc.find("prepared-for").unwrap().text_content(),
        Some("Prepared for Jo Park")
    );

    let cover = doc.find("cover-image").unwrap();
    assert_eq!(
        cover.attr_str("src"),
        Some("https://files.example.com/r-77/front.jpg?token=t0k")
    );
    for key in PLACEHOLDER_KEYS {
        assert!(cover.attr(key).is_none());
    }

    let logo = doc.find("logo").unwrap();
    assert_eq!(logo.attr_str("src"), Some("https://cdn.example.com/acme.png"));

    // The stored form is untouched by resolution.
    assert_eq!(codec::encode(&reloaded), stored);
}

#[tokio::test]
async fn partial_context_leaves_tokens_and_placeholders() {
    let source = template::instantiate("modern").unwrap();
    let ctx: ResolutionContext =
        serde_json::from_value(json!({ "report": { "title": "Roof Only" } })).unwrap();

    let resolved = MergeResolver::new(&ctx, &BucketSigner)
        .resolve(&source)
        .await
        .unwrap();
    let doc = &resolved.document;

    assert_eq!(doc.find("title").unwrap().text_content(), Some("Roof Only"));
    assert_eq!(
        doc.find("org-name").unwrap().text_content(),
        Some("{{organization.name}}")
    );
    assert!(doc.find("cover-image").unwrap().attr("strokeDashArray").is_some());
}

#[tokio::test]
async fn denied_asset_degrades_or_aborts() {
    let mut ctx = context();
    ctx.organization.logo_url = Some("storage://private/logo.png".into());
    let source = template::instantiate("centered").unwrap();

    let resolved = MergeResolver::new(&ctx, &BucketSigner)
        .resolve(&source)
        .await
        .unwrap();
    assert_eq!(resolved.failures.len(), 1);
    assert_eq!(resolved.failures[0].node_id, "logo");
    assert_eq!(
        resolved.document.find("logo").unwrap().attr_str("src"),
        Some("storage://private/logo.png")
    );
    assert!(
        resolved.document.find("cover-image").unwrap().attr_str("src").unwrap().starts_with("https://")
    );

    let err = MergeResolver::new(&ctx, &BucketSigner)
        .with_policy(AssetErrorPolicy::Abort)
        .resolve(&source)
        .await
        .unwrap_err();
    assert_eq!(err.reference, "storage://private/logo.png");
}

#[test]
fn legacy_editor_json_imports() {
    let legacy = json!({
        "type": "group",
        "objects": [
            { "type": "textbox", "id": "t", "text": "{{report.title}}", "fontSize": 28 },
            { "type": "image", "id": "img", "src": "", "mergeField": "report.coverImage",
              "strokeDashArray": [8, 6], "filters": [] }
        ]
    });
    let doc = codec::decode(legacy.to_string().as_bytes()).unwrap();
    let img = doc.find("img").unwrap();
    assert_eq!(img.merge_field(), Some("report.coverImage"));
    assert_eq!(img.attr("filters"), Some(&json!([])));

    let canonical = codec::encode_value(&doc);
    assert_eq!(canonical["children"][0]["kind"], "text");
    assert_eq!(canonical["children"][0]["attributes"]["fontSize"], 28);
    assert_eq!(codec::decode(&codec::encode(&doc)).unwrap(), doc);
}
