//! Serialized page scripts.
//!
//! Every DOM interaction is a self-contained JavaScript expression: JSON
//! arguments are embedded as a literal, the body runs inside an async IIFE,
//! and the result is returned by value. Scripts carry no state between
//! calls. Each script starts with a `/* review-scout:<name> */` marker so
//! logs and test doubles can tell them apart.

use crate::selectors::{ReviewFields, SelectorCatalog};
use serde_json::{json, Value};

pub const PROBE: &str = "probe";
pub const ACTIVATE_TAB: &str = "activate_tab";
pub const SCROLL_TO_BOTTOM: &str = "scroll_to_bottom";
pub const MEASURE: &str = "measure";
pub const EXPAND_TRUNCATED: &str = "expand_truncated";
pub const TEXT_VOLUME: &str = "text_volume";
pub const EXTRACT_REVIEWS: &str = "extract_reviews";
pub const SUMMARY: &str = "summary";
pub const NETWORK_STATE: &str = "network_state";

const MARKER_PREFIX: &str = "/* review-scout:";

/// Helpers shared by every script.
const PRELUDE: &str = r#"
  const firstMatch = (root, selectors) => {
    for (const selector of selectors) {
      try {
        const el = root.querySelector(selector);
        if (el) return el;
      } catch (_) {}
    }
    return null;
  };
  const allMatches = (root, selectors) => {
    for (const selector of selectors) {
      try {
        const els = root.querySelectorAll(selector);
        if (els.length > 0) return Array.from(els);
      } catch (_) {}
    }
    return [];
  };
  const readField = (root, reader) => {
    const el = firstMatch(root, reader.selectors);
    if (!el) return null;
    switch (reader.source) {
      case "text": return (el.textContent || "").trim();
      case "aria_label": return el.getAttribute("aria-label");
      case "src": return el.src || el.getAttribute("src") || null;
      default: return null;
    }
  };
"#;

/// A ready-to-evaluate page script.
#[derive(Debug, Clone)]
pub struct PageScript {
    name: &'static str,
    source: String,
}

impl PageScript {
    fn build(name: &'static str, body: &str, args: Value) -> Self {
        let source = format!(
            "{MARKER_PREFIX}{name} */\n(async (args) => {{{PRELUDE}{body}\n}})({args})"
        );
        Self { name, source }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Recover the script name from a script source, if it carries a marker.
pub fn script_name(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(MARKER_PREFIX)?;
    let end = rest.find(" */")?;
    Some(&rest[..end])
}

/// `true` once any of the selectors matches at least one element.
pub fn probe(selectors: &[String]) -> PageScript {
    PageScript::build(
        PROBE,
        "  return allMatches(document, args.selectors).length > 0;",
        json!({ "selectors": selectors }),
    )
}

/// Click the reviews tab unless it is already selected.
pub fn activate_tab(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        ACTIVATE_TAB,
        r#"
  const tab = firstMatch(document, args.selectors);
  if (!tab) return { found: false, already_active: false, clicked: false };
  if (tab.getAttribute("aria-selected") === "true") {
    return { found: true, already_active: true, clicked: false };
  }
  tab.click();
  return { found: true, already_active: false, clicked: true };"#,
        json!({ "selectors": catalog.reviews_tab }),
    )
}

/// Scroll the reviews container to its current bottom.
pub fn scroll_to_bottom(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        SCROLL_TO_BOTTOM,
        r#"
  const container = firstMatch(document, args.container);
  if (!container) return { found: false };
  container.scrollTop = container.scrollHeight;
  return { found: true };"#,
        json!({ "container": catalog.scroll_container }),
    )
}

/// Container scroll height and the number of rendered review items.
pub fn measure(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        MEASURE,
        r#"
  const container = firstMatch(document, args.container);
  return {
    found: container !== null,
    height: container ? container.scrollHeight : 0,
    count: allMatches(document, args.items).length,
  };"#,
        json!({
            "container": catalog.scroll_container,
            "items": catalog.review_items,
        }),
    )
}

/// Click every "more" control inside a review item; returns the click count.
pub fn expand_truncated(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        EXPAND_TRUNCATED,
        r#"
  let clicked = 0;
  for (const item of allMatches(document, args.items)) {
    const more = firstMatch(item, args.more);
    if (!more) continue;
    try {
      more.click();
      clicked += 1;
    } catch (_) {}
  }
  return clicked;"#,
        json!({
            "items": catalog.review_items,
            "more": catalog.more_button,
        }),
    )
}

/// Combined text length of all review items, used to detect settled expansion.
pub fn text_volume(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        TEXT_VOLUME,
        r#"
  return allMatches(document, args.items)
    .reduce((total, item) => total + (item.textContent || "").length, 0);"#,
        json!({ "items": catalog.review_items }),
    )
}

/// Raw field values for every review item, one outcome per element.
///
/// Each element yields either `{ "ok": { author, rating_label, text,
/// time_text, avatar } }` or `{ "error": "<message>" }`.
pub fn extract_reviews(items: &[String], fields: &ReviewFields) -> PageScript {
    PageScript::build(
        EXTRACT_REVIEWS,
        r#"
  return allMatches(document, args.items).map((item) => {
    try {
      return {
        ok: {
          author: readField(item, args.fields.author),
          rating_label: readField(item, args.fields.rating),
          text: readField(item, args.fields.text),
          time_text: readField(item, args.fields.time),
          avatar: readField(item, args.fields.avatar),
        },
      };
    } catch (e) {
      return { error: String(e && e.message ? e.message : e) };
    }
  });"#,
        json!({ "items": items, "fields": fields }),
    )
}

/// Aggregate rating text and total-count text.
pub fn summary(catalog: &SelectorCatalog) -> PageScript {
    PageScript::build(
        SUMMARY,
        r#"
  const rating = firstMatch(document, args.rating);
  const total = firstMatch(document, args.total);
  return {
    rating_text: rating ? rating.textContent : null,
    total_text: total ? total.textContent : null,
  };"#,
        json!({
            "rating": catalog.summary_rating,
            "total": catalog.summary_total,
        }),
    )
}

/// Document readiness and the number of resource loads seen so far.
///
/// The resource-timing buffer holds 250 entries by default, so the first
/// call enlarges it and installs an observer that keeps counting after the
/// buffer would have filled. The counter lives on `window` and resets with
/// each navigation.
pub fn network_state() -> PageScript {
    PageScript::build(
        NETWORK_STATE,
        r#"
  if (!window.__reviewScoutResources) {
    const state = { count: 0 };
    try { performance.setResourceTimingBufferSize(100000); } catch (_) {}
    state.count = performance.getEntriesByType("resource").length;
    try {
      new PerformanceObserver((list) => {
        state.count += list.getEntries().length;
      }).observe({ type: "resource" });
    } catch (_) {}
    window.__reviewScoutResources = state;
  }
  return {
    ready: document.readyState === "complete",
    resources: window.__reviewScoutResources.count,
  };"#,
        json!({}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        let catalog = SelectorCatalog::default();
        let script = measure(&catalog);
        assert_eq!(script.name(), MEASURE);
        assert_eq!(script_name(script.source()), Some(MEASURE));
        assert_eq!(script_name("document.title"), None);
    }

    #[test]
    fn test_selectors_are_embedded_as_json() {
        let catalog = SelectorCatalog::default();
        let script = probe(&catalog.review_items);
        assert!(script
            .source()
            .contains(r#"{"selectors":[".jftiEf.fontBodyMedium",".gws-localreviews__google-review"]}"#));
    }

    #[test]
    fn test_quotes_in_selectors_stay_escaped() {
        let catalog = SelectorCatalog::default();
        let script = scroll_to_bottom(&catalog);
        // The attribute selector carries double quotes; they must be escaped in the literal.
        assert!(script.source().contains(r#"[role=\"main\"] > div:nth-child(2)"#));
    }

    #[test]
    fn test_network_state_outgrows_timing_buffer() {
        let script = network_state();
        assert_eq!(script_name(script.source()), Some(NETWORK_STATE));
        assert!(script.source().contains("setResourceTimingBufferSize(100000)"));
        assert!(script.source().contains("new PerformanceObserver"));
        assert!(script.source().contains("window.__reviewScoutResources.count"));
    }

    #[test]
    fn test_extract_script_carries_field_sources() {
        let catalog = SelectorCatalog::default();
        let script = extract_reviews(&catalog.review_items, &catalog.fields);
        assert!(script.source().contains(r#""source":"aria_label""#));
        assert!(script.source().contains(r#""source":"src""#));
        assert!(script.source().ends_with("})"));
    }
}
