//! Prioritized selector catalogue for the review page.
//!
//! Every field is read through an ordered list of CSS selectors. The first
//! selector that matches wins, which lets one catalogue cover the desktop,
//! mobile, and alternate renderings of the host page without branching.

use serde::{Deserialize, Serialize};

/// Where a field's value is read from once its element is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Trimmed `textContent`.
    Text,
    /// The `aria-label` attribute.
    AriaLabel,
    /// The resolved `src` property (images).
    Src,
}

/// An ordered list of selectors plus the value source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReader {
    pub selectors: Vec<String>,
    pub source: FieldSource,
}

impl FieldReader {
    pub fn new(source: FieldSource, selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            source,
        }
    }
}

/// Per-review field readers, serialized into the extraction script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFields {
    pub author: FieldReader,
    pub rating: FieldReader,
    pub text: FieldReader,
    pub time: FieldReader,
    pub avatar: FieldReader,
}

/// All selectors the pipeline uses, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorCatalog {
    /// Review list items.
    pub review_items: Vec<String>,
    /// The scrollable container that lazily loads more reviews.
    pub scroll_container: Vec<String>,
    /// The "Reviews" tab control.
    pub reviews_tab: Vec<String>,
    /// "More" controls that expand truncated review text.
    pub more_button: Vec<String>,
    pub fields: ReviewFields,
    /// Aggregate rating text.
    pub summary_rating: Vec<String>,
    /// Total review count text.
    pub summary_total: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            review_items: owned(&[".jftiEf.fontBodyMedium", ".gws-localreviews__google-review"]),
            scroll_container: owned(&[
                ".m6QErb.DxyBCb.kA9KIf.dS8AEf",
                "[role=\"main\"] > div:nth-child(2)",
                ".section-layout-root",
                ".review-dialog-list",
            ]),
            reviews_tab: owned(&["button[data-tab-index='1']"]),
            more_button: owned(&["button.w8nwRe.kyuRq", ".w8nwRe"]),
            fields: ReviewFields {
                author: FieldReader::new(
                    FieldSource::Text,
                    &[".d4r55", ".TSUbDb", ".section-review-title", ".xYciQ", ".WNxzHc", ".jJcsV"],
                ),
                rating: FieldReader::new(
                    FieldSource::AriaLabel,
                    &[
                        ".kvMYJc",
                        ".section-review-stars",
                        ".q0P1t.fontTitleSmall",
                        ".EBe2gf",
                        ".MyEned > div:nth-child(2) > span[aria-label]",
                        ".F7nice",
                    ],
                ),
                text: FieldReader::new(
                    FieldSource::Text,
                    &[
                        ".wiI7pd",
                        ".section-review-text",
                        ".gws-localreviews__google-review-text",
                        ".Jtu6Td",
                        ".yIgCRd",
                        ".review-full-text",
                        "._gj4l",
                    ],
                ),
                time: FieldReader::new(
                    FieldSource::Text,
                    &[".rsqaWe", ".section-review-publish-date", ".dehC8", ".pqsRP", ".ioQyN", ".eyb5Ce"],
                ),
                avatar: FieldReader::new(
                    FieldSource::Src,
                    &[
                        "img.NBa7we",
                        "img.Qx7uS",
                        ".NBa7we",
                        "._7QSPW",
                        ".lDY1rd",
                        ".RwYf6d img",
                        ".MvC4if img",
                        "img[src*='/a/']",
                        "img[data-photo-id]",
                        "img[src*='googleusercontent.com']",
                        ".jgXp4c img",
                    ],
                ),
            },
            summary_rating: owned(&[
                ".F7nice span[aria-hidden='true'] .fontDisplayLarge",
                ".PPCwl .fontDisplayLarge",
                "span.Aq14fc",
            ]),
            summary_total: owned(&[
                ".F7nice span:nth-child(2)",
                ".PPCwl .fontBodySmall",
                "span.z5jxId",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_every_field() {
        let catalog = SelectorCatalog::default();
        for list in [
            &catalog.review_items,
            &catalog.scroll_container,
            &catalog.reviews_tab,
            &catalog.more_button,
            &catalog.fields.author.selectors,
            &catalog.fields.rating.selectors,
            &catalog.fields.text.selectors,
            &catalog.fields.time.selectors,
            &catalog.fields.avatar.selectors,
            &catalog.summary_rating,
            &catalog.summary_total,
        ] {
            assert!(!list.is_empty());
        }
        assert_eq!(catalog.fields.rating.source, FieldSource::AriaLabel);
        assert_eq!(catalog.fields.avatar.source, FieldSource::Src);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r#"{ "review_items": [".custom-review"] }"#;
        let catalog: SelectorCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.review_items, vec![".custom-review".to_string()]);
        assert_eq!(catalog.reviews_tab, SelectorCatalog::default().reviews_tab);
    }
}
