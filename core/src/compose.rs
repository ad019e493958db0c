//! Offline text composition from draft fields.
//!
//! Nothing here touches the network; these are the local fallbacks the
//! workflow offers next to the generation endpoints.

use crate::draft::{ProductDraft, UNTITLED};

/// Append `line` to `existing` on a new line (no leading newline when empty).
///
/// # Examples
///
/// ```
/// use artisan_studio_core::compose::append_line;
///
/// assert_eq!(append_line("", "first"), "first");
/// assert_eq!(append_line("first", "second"), "first\nsecond");
/// ```
#[must_use]
pub fn append_line(existing: &str, line: &str) -> String {
    if existing.is_empty() {
        line.to_string()
    } else {
        format!("{existing}\n{line}")
    }
}

/// One-line description template.
#[must_use]
pub fn description_line(draft: &ProductDraft) -> String {
    let title = non_blank(&draft.title).unwrap_or(UNTITLED);
    let theme = draft.theme().unwrap_or_default();
    format!(
        "{title} — {theme} {}. Thoughtfully crafted with love.",
        draft.category.trim()
    )
}

/// Short provenance paragraph: an opener sentence, a facts line and an
/// optional care line.
#[must_use]
pub fn quick_history(draft: &ProductDraft) -> String {
    let attr = |key: &str| lookup(&draft.attributes, key);
    let prov = |key: &str| lookup(&draft.provenance, key);

    let title = non_blank(&draft.title).unwrap_or("Untitled Piece");
    let style = draft.theme().map(|t| t.trim().to_lowercase());
    let kind = non_blank(&draft.category).map(str::to_lowercase);
    let descriptor = [style, kind]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let year = prov("year").or_else(|| prov("date")).or_else(|| prov("made"));
    let mut opener = format!("\"{title}\" is a {descriptor} crafted");
    if let Some(who) = non_blank(&draft.artisan_name) {
        opener.push_str(&format!(" by {who}"));
    }
    if let Some(place) = non_blank(&draft.region) {
        opener.push_str(&format!(" in {place}"));
    }
    if let Some(year) = year {
        opener.push_str(&format!(" in {year}"));
    }
    let opener = format!("{}.", collapse_whitespace(&opener));

    let facts = [
        ("Technique", attr("technique").or_else(|| prov("technique"))),
        ("Materials", attr("material").or_else(|| prov("material"))),
        ("Size", attr("size").or_else(|| attr("dimensions"))),
        ("Palette", attr("color")),
        ("Origin", prov("origin")),
        ("Inspiration", prov("inspiration")),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}")))
    .collect::<Vec<_>>()
    .join(" • ");

    let mut parts = vec![opener];
    if !facts.is_empty() {
        parts.push(format!("{facts}."));
    }
    if let Some(care) = prov("care").or_else(|| attr("care")) {
        parts.push(format!("Care: {care}."));
    }
    parts.join(" ")
}

fn lookup<'a>(map: &'a std::collections::BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(|v| non_blank(v))
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        let mut draft = ProductDraft::new();
        draft.title = "Painting 1".to_string();
        draft.category = "Drawing".to_string();
        draft.set_theme("Traditional");
        draft
    }

    #[test]
    fn test_description_line() {
        assert_eq!(
            description_line(&draft()),
            "Painting 1 — Traditional Drawing. Thoughtfully crafted with love."
        );
    }

    #[test]
    fn test_quick_history_minimal() {
        assert_eq!(
            quick_history(&draft()),
            "\"Painting 1\" is a traditional drawing crafted."
        );
    }

    #[test]
    fn test_quick_history_full() {
        let mut draft = draft();
        draft.artisan_name = "Meera".to_string();
        draft.region = "Jaipur".to_string();
        draft.set_provenance("date", "1998");
        draft.set_attribute("technique", "Miniature");
        draft.set_attribute("dimensions", "30x40cm");
        draft.set_provenance("origin", "Rajasthan");
        draft.set_attribute("care", "Keep dry");

        assert_eq!(
            quick_history(&draft),
            "\"Painting 1\" is a traditional drawing crafted by Meera in Jaipur in 1998. \
             Technique: Miniature • Size: 30x40cm • Origin: Rajasthan. Care: Keep dry."
        );
    }

    #[test]
    fn test_quick_history_untitled() {
        let draft = ProductDraft::new();
        assert!(quick_history(&draft).starts_with("\"Untitled Piece\" is a crafted"));
    }
}
