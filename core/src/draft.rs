//! Product drafts and the payloads built from them.
//!
//! A [`ProductDraft`] is the editable, unsaved representation of a product.
//! It is turned into a [`ProductPayload`] every time the workflow talks to
//! the backend. Payload building is where the placeholder policy lives:
//! the UI shows a placeholder image when the user supplied none, and that
//! reference must never reach the backend.

use crate::catalog::{ProductRecord, ProductSummary};
use crate::environment::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Image reference the UI renders when a product has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-640x360.png";

/// Every placeholder reference starts with this prefix.
const PLACEHOLDER_PREFIX: &str = "/placeholder-";

/// Currency used when the user has not picked one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Title sent when the user left the name empty.
pub const UNTITLED: &str = "Untitled";

/// Local validation failures, raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// The product name is empty or whitespace
    #[error("Please enter a product name.")]
    MissingTitle,

    /// No product type was selected
    #[error("Please select a product type.")]
    MissingCategory,
}

/// Returns `true` for UI placeholder image references.
#[must_use]
pub fn is_placeholder(reference: &str) -> bool {
    reference.trim_start().starts_with(PLACEHOLDER_PREFIX)
}

/// Drops placeholder and blank references, keeping the original order.
///
/// Returns `None` when nothing is left, so callers can omit the field
/// entirely instead of sending an empty list.
///
/// # Examples
///
/// ```
/// use artisan_studio_core::draft::strip_placeholders;
///
/// assert_eq!(strip_placeholders(&["/placeholder-640x360.png"]), None);
/// assert_eq!(
///     strip_placeholders(&["a.png", "/placeholder-1.png", "b.png"]),
///     Some(vec!["a.png".to_string(), "b.png".to_string()])
/// );
/// ```
#[must_use]
pub fn strip_placeholders<S: AsRef<str>>(images: &[S]) -> Option<Vec<String>> {
    let kept: Vec<String> = images
        .iter()
        .map(AsRef::as_ref)
        .filter(|reference| !reference.trim().is_empty() && !is_placeholder(reference))
        .map(str::to_string)
        .collect();

    if kept.is_empty() { None } else { Some(kept) }
}

/// Lowercase, dash-separated ASCII slug of `name`.
///
/// Runs of anything other than `a-z0-9` collapse into a single dash and
/// leading/trailing dashes are removed. Returns `None` when the name has no
/// ASCII alphanumerics at all.
///
/// # Examples
///
/// ```
/// use artisan_studio_core::draft::slugify;
///
/// assert_eq!(slugify("  Blue Pottery -- Vase! ").as_deref(), Some("blue-pottery-vase"));
/// assert_eq!(slugify("***"), None);
/// ```
#[must_use]
pub fn slugify(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() { None } else { Some(slug) }
}

/// Derive a product id from its title.
///
/// An empty title slugs as `"untitled"`; a title with no usable characters
/// falls back to `item-<unix millis>`.
#[must_use]
pub fn derive_id(title: &str, clock: &dyn Clock) -> String {
    let source = if title.trim().is_empty() { UNTITLED } else { title };
    slugify(source).unwrap_or_else(|| format!("item-{}", clock.now().timestamp_millis()))
}

/// In-memory, unsaved representation of a product being created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Slug id, fixed the first time the workflow needs it
    pub id: Option<String>,
    /// Product name as typed by the user
    pub title: String,
    /// Product type (e.g. "Pottery")
    pub category: String,
    /// Materials / theme tags; the first entry is the theme
    pub materials: Vec<String>,
    /// Remote URLs or inline `data:` references, in the order supplied
    pub images: Vec<String>,
    /// Asking price
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// Units in stock
    pub inventory: u32,
    /// Region of origin
    pub region: String,
    /// Artisan name or id
    pub artisan_name: String,
    /// Free-form attributes (size, color, technique, ...)
    pub attributes: BTreeMap<String, String>,
    /// Provenance facts (year, origin, inspiration, care, ...)
    pub provenance: BTreeMap<String, String>,
    /// Product description
    pub description: String,
    /// Longer story / heritage text
    pub story: String,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            category: String::new(),
            materials: Vec::new(),
            images: Vec::new(),
            price: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            inventory: 1,
            region: String::new(),
            artisan_name: String::new(),
            attributes: BTreeMap::new(),
            provenance: BTreeMap::new(),
            description: String::new(),
            story: String::new(),
        }
    }
}

impl ProductDraft {
    /// Create an empty draft (inventory 1, default currency).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Theme of the product: the first material, if any.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.materials
            .iter()
            .map(String::as_str)
            .find(|m| !m.trim().is_empty())
    }

    /// Replace the theme (first material).
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        let theme = theme.into();
        match self.materials.first_mut() {
            Some(first) => *first = theme,
            None => self.materials.push(theme),
        }
    }

    /// Append an image reference.
    ///
    /// Placeholder and blank references are rejected; returns whether the
    /// reference was added.
    pub fn add_image(&mut self, reference: impl Into<String>) -> bool {
        let reference = reference.into();
        if reference.trim().is_empty() || is_placeholder(&reference) {
            return false;
        }
        self.images.push(reference);
        true
    }

    /// Image to preview: the first supplied image, else the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// Set an attribute. Blank keys are ignored; the last write for a key wins.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) -> bool {
        insert_entry(&mut self.attributes, key, value.into())
    }

    /// Set a provenance entry. Same key rules as [`Self::set_attribute`].
    pub fn set_provenance(&mut self, key: &str, value: impl Into<String>) -> bool {
        insert_entry(&mut self.provenance, key, value.into())
    }

    /// The draft id, computing it from the title on first use.
    ///
    /// Once computed the id stays fixed for the lifetime of the draft, even
    /// if the title changes afterwards.
    pub fn ensure_id(&mut self, clock: &dyn Clock) -> &str {
        self.id
            .get_or_insert_with(|| derive_id(&self.title, clock))
            .as_str()
    }

    /// Check the fields the backend requires.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingTitle`] or [`DraftError::MissingCategory`].
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.category.trim().is_empty() {
            return Err(DraftError::MissingCategory);
        }
        Ok(())
    }

    /// Build the create/replace payload for `id`.
    ///
    /// Placeholder images are stripped; when none remain the `images` key is
    /// omitted and the backend applies its own default.
    #[must_use]
    pub fn to_payload(&self, id: &str) -> ProductPayload {
        ProductPayload {
            id: id.to_string(),
            title: non_empty(&self.title).unwrap_or_else(|| UNTITLED.to_string()),
            category: self.category.trim().to_string(),
            materials: self
                .materials
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
            images: strip_placeholders(&self.images),
            inventory: self.inventory,
            is_active: true,
            price: if self.price.is_finite() { self.price } else { 0.0 },
            currency: non_empty(&self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            description: non_empty(&self.description),
            story: non_empty(&self.story),
            region: non_empty(&self.region),
            artisan_name: non_empty(&self.artisan_name),
            attributes: self.attributes.clone(),
            provenance: self.provenance.clone(),
        }
    }

    /// Catalog row for this draft once saved under `id`.
    #[must_use]
    pub fn summary(&self, id: &str) -> ProductSummary {
        let payload = self.to_payload(id);
        let mut record = ProductRecord {
            id: payload.id,
            title: Some(payload.title),
            category: Some(payload.category).filter(|c| !c.is_empty()),
            materials: payload.materials,
            images: payload.images.unwrap_or_default(),
            inventory: Some(i64::from(payload.inventory)),
            ..ProductRecord::default()
        };
        if record.images.is_empty() {
            record.preview_image = Some(self.primary_image().to_string());
        }
        ProductSummary::from(&record)
    }
}

/// JSON body of `POST /v1/products/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    /// Slug id
    pub id: String,
    /// Title, `"Untitled"` when empty
    pub title: String,
    /// Product type
    pub category: String,
    /// Materials / theme tags
    pub materials: Vec<String>,
    /// Non-placeholder images; omitted when there are none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Units in stock
    pub inventory: u32,
    /// Always `true` for create/replace
    pub is_active: bool,
    /// Asking price
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// Description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Story, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    /// Region, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Artisan name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artisan_name: Option<String>,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Provenance
    #[serde(default)]
    pub provenance: BTreeMap<String, String>,
}

fn insert_entry(map: &mut BTreeMap<String, String>, key: &str, value: String) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return false;
    }
    map.insert(key.to_string(), value);
    true
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    struct StoppedClock;

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        }
    }

    fn sample_draft() -> ProductDraft {
        let mut draft = ProductDraft::new();
        draft.title = "Blue Pottery Vase".to_string();
        draft.category = "Pottery".to_string();
        draft.set_theme("Traditional");
        draft
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("Hand-Woven  Shawl (Red)").as_deref(), Some("hand-woven-shawl-red"));
        assert_eq!(slugify("--edge--").as_deref(), Some("edge"));
        assert_eq!(slugify("   "), None);
        assert_eq!(slugify("मिट्टी"), None);
    }

    #[test]
    fn test_derive_id_fallbacks() {
        assert_eq!(derive_id("", &StoppedClock), "untitled");
        assert_eq!(derive_id("मिट्टी", &StoppedClock), "item-1700000000000");
    }

    #[test]
    fn test_ensure_id_is_stable_after_rename() {
        let mut draft = sample_draft();
        let first = draft.ensure_id(&StoppedClock).to_string();
        draft.title = "Something Else".to_string();
        assert_eq!(draft.ensure_id(&StoppedClock), first);
        assert_eq!(first, "blue-pottery-vase");
    }

    #[test]
    fn test_add_image_rejects_placeholder() {
        let mut draft = ProductDraft::new();
        assert!(!draft.add_image(PLACEHOLDER_IMAGE));
        assert!(!draft.add_image("  "));
        assert!(draft.add_image("https://cdn.example.com/a.png"));
        assert_eq!(draft.images, vec!["https://cdn.example.com/a.png"]);
    }

    #[test]
    fn test_placeholder_only_payload_omits_images_key() {
        let mut draft = sample_draft();
        draft.images = vec![PLACEHOLDER_IMAGE.to_string()];

        let json = serde_json::to_value(draft.to_payload("blue-pottery-vase")).unwrap();
        assert!(json.get("images").is_none());
    }

    #[test]
    fn test_mixed_images_keep_order() {
        let mut draft = sample_draft();
        draft.images = vec![
            "https://cdn.example.com/1.png".to_string(),
            "/placeholder-640x360.png".to_string(),
            "data:image/png;base64,AAAA".to_string(),
        ];

        let payload = draft.to_payload("x");
        assert_eq!(
            payload.images,
            Some(vec![
                "https://cdn.example.com/1.png".to_string(),
                "data:image/png;base64,AAAA".to_string(),
            ])
        );
    }

    #[test]
    fn test_payload_defaults() {
        let draft = ProductDraft::new();
        let payload = draft.to_payload("untitled");

        assert_eq!(payload.title, "Untitled");
        assert_eq!(payload.currency, "INR");
        assert_eq!(payload.inventory, 1);
        assert!(payload.is_active);
        assert_eq!(payload.description, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("region").is_none());
    }

    #[test]
    fn test_attributes_last_write_wins() {
        let mut draft = ProductDraft::new();
        assert!(draft.set_attribute("color", "blue"));
        assert!(draft.set_attribute(" color ", "indigo"));
        assert!(!draft.set_attribute("   ", "ignored"));

        assert_eq!(draft.attributes.len(), 1);
        assert_eq!(draft.attributes["color"], "indigo");
    }

    #[test]
    fn test_validate_messages() {
        let mut draft = ProductDraft::new();
        assert_eq!(draft.validate().unwrap_err().to_string(), "Please enter a product name.");

        draft.title = "Vase".to_string();
        assert_eq!(draft.validate(), Err(DraftError::MissingCategory));

        draft.category = "Pottery".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_summary_uses_placeholder_preview() {
        let draft = sample_draft();
        let summary = draft.summary("blue-pottery-vase");

        assert_eq!(summary.id, "blue-pottery-vase");
        assert_eq!(summary.name, "Blue Pottery Vase");
        assert_eq!(summary.preview, PLACEHOLDER_IMAGE);
        assert_eq!(summary.inventory, Some(1));
    }

    mod properties {
        use super::slugify;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_slug_is_url_safe(name in ".{0,40}") {
                if let Some(slug) = slugify(&name) {
                    prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                    prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
                    prop_assert!(!slug.contains("--"));
                    prop_assert_eq!(slugify(&slug), Some(slug.clone()));
                }
            }
        }
    }
}
