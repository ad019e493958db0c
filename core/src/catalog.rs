//! Catalog records, summaries and the paging cursor.
//!
//! The catalog endpoint is lenient about which fields it fills in, so
//! [`ProductRecord`] defaults everything except the id and
//! [`ProductSummary`] carries the display fallbacks.

use crate::draft::PLACEHOLDER_IMAGE;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque continuation token for catalog paging.
///
/// A cursor is only usable when both parts are present; the backend echoes
/// them back as `cursor_ts` / `cursor_id` query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    /// Timestamp component
    #[serde(default)]
    pub ts: String,
    /// Id component
    #[serde(default)]
    pub id: String,
}

impl Cursor {
    /// Create a cursor from its parts.
    #[must_use]
    pub fn new(ts: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            id: id.into(),
        }
    }

    /// Both components are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.ts.is_empty() && !self.id.is_empty()
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A product as returned by the catalog endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product id
    pub id: String,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Product type
    #[serde(default)]
    pub category: Option<String>,
    /// Materials
    #[serde(default, deserialize_with = "null_as_default")]
    pub materials: Vec<String>,
    /// Images
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    /// Precomputed preview image
    #[serde(default)]
    pub preview_image: Option<String>,
    /// Free-form attributes
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
    /// Units in stock
    #[serde(default)]
    pub inventory: Option<i64>,
    /// Listing flag
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// The fields shown in the catalog list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product id
    pub id: String,
    /// Display name
    pub name: String,
    /// Theme column (the product type)
    pub theme: String,
    /// Kind column (the primary material)
    pub kind: String,
    /// Preview image
    pub preview: String,
    /// Units in stock
    pub inventory: Option<i64>,
}

impl From<&ProductRecord> for ProductSummary {
    fn from(record: &ProductRecord) -> Self {
        let category = record
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let kind = record
            .materials
            .iter()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .or_else(|| {
                record
                    .attributes
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
            })
            .or(category)
            .unwrap_or("craft");

        let preview = record
            .images
            .iter()
            .find(|i| !i.trim().is_empty())
            .map(String::as_str)
            .or_else(|| record.preview_image.as_deref().filter(|p| !p.trim().is_empty()))
            .unwrap_or(PLACEHOLDER_IMAGE);

        Self {
            id: record.id.clone(),
            name: record
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("Untitled")
                .to_string(),
            theme: category.unwrap_or("—").to_string(),
            kind: kind.to_string(),
            preview: preview.to_string(),
            inventory: record.inventory,
        }
    }
}

impl From<ProductRecord> for ProductSummary {
    fn from(record: ProductRecord) -> Self {
        Self::from(&record)
    }
}

/// One page of `GET /v1/products`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Records on this page
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<ProductRecord>,
    /// Cursor for the next page; absent when exhausted
    #[serde(default)]
    pub next: Option<Cursor>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_record_fallbacks() {
        let record: ProductRecord = serde_json::from_value(json!({ "id": "p1" })).unwrap();
        let summary = ProductSummary::from(&record);

        assert_eq!(summary.name, "Untitled");
        assert_eq!(summary.theme, "—");
        assert_eq!(summary.kind, "craft");
        assert_eq!(summary.preview, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_kind_prefers_material_then_attribute_type() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p2",
            "category": "Textiles",
            "attributes": { "type": "Shawl" }
        }))
        .unwrap();
        assert_eq!(ProductSummary::from(&record).kind, "Shawl");

        let record = ProductRecord {
            materials: vec!["Silk".into()],
            ..record
        };
        let summary = ProductSummary::from(record);
        assert_eq!(summary.kind, "Silk");
        assert_eq!(summary.theme, "Textiles");
    }

    #[test]
    fn test_preview_image_fallback() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p3",
            "preview_image": "https://cdn.example.com/p3.jpg"
        }))
        .unwrap();
        assert_eq!(ProductSummary::from(&record).preview, "https://cdn.example.com/p3.jpg");
    }

    #[test]
    fn test_null_collections_decode_as_empty() {
        let page: ProductPage = serde_json::from_value(json!({
            "items": [
                { "id": "a", "materials": null, "images": null, "attributes": null },
                { "id": "b", "materials": ["Clay"] }
            ],
            "next": null
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].materials.is_empty());
        assert!(page.items[0].images.is_empty());
        assert_eq!(ProductSummary::from(&page.items[0]).kind, "craft");
        assert_eq!(ProductSummary::from(&page.items[1]).kind, "Clay");

        let page: ProductPage = serde_json::from_value(json!({ "items": null })).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_without_next() {
        let page: ProductPage = serde_json::from_value(json!({ "items": [] })).unwrap();
        assert!(page.next.is_none());

        let page: ProductPage =
            serde_json::from_value(json!({ "items": [], "next": { "ts": "t", "id": "" } })).unwrap();
        assert!(!page.next.unwrap().is_complete());
    }
}
