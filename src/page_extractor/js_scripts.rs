//! JavaScript evaluation scripts
//!
//! Scripts that take arguments are built by embedding the arguments as JSON
//! literals, so selector strings never need manual escaping.

use serde::Serialize;

/// One detail field and the selectors tried for it, first non-empty wins
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSelectors {
    pub field: &'static str,
    pub selectors: &'static [&'static str],
}

/// Scalar detail fields, read as trimmed `textContent`
pub const DETAIL_TEXT_FIELDS: &[FieldSelectors] = &[
    FieldSelectors {
        field: "name",
        selectors: &["h1[itemprop=\"name\"]", ".ux-item-name"],
    },
    FieldSelectors {
        field: "description",
        selectors: &[".ux-item-shortdesc", ".ux-item-description"],
    },
    FieldSelectors {
        field: "version",
        selectors: &[".ux-item-meta-version", "#version + td"],
    },
    FieldSelectors {
        field: "author",
        selectors: &[".ux-item-publisher", "#publisher + td"],
    },
    FieldSelectors {
        field: "downloads",
        selectors: &[".ux-item-meta-installs", ".installs"],
    },
    FieldSelectors {
        field: "installs",
        selectors: &[".installs-text", ".installs"],
    },
    FieldSelectors {
        field: "last_updated",
        selectors: &[".extension-last-updated-date", "#last-updated + td"],
    },
    FieldSelectors {
        field: "rating",
        selectors: &[".ux-item-rating-count", ".rating"],
    },
    FieldSelectors {
        field: "review_count",
        selectors: &[".ux-item-rating-count"],
    },
    FieldSelectors {
        field: "repository",
        selectors: &[".ux-repository"],
    },
];

/// Sequence detail fields, every matching element's text in document order
pub const DETAIL_LIST_FIELDS: &[FieldSelectors] = &[
    FieldSelectors {
        field: "categories",
        selectors: &[".meta-data-list-link"],
    },
    FieldSelectors {
        field: "tags",
        selectors: &[".meta-data-list"],
    },
];

/// Per-selector hrefs of every anchor matched by each candidate selector.
///
/// Returns `[{ selector, hrefs }]` in selector order; filtering and union
/// happen on the Rust side.
pub fn candidate_links_script(selectors: &[String]) -> String {
    let selectors = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"
    ((selectors) => {{
        return selectors.map(selector => {{
            let hrefs = [];
            try {{
                hrefs = Array.from(document.querySelectorAll(selector))
                    .map(el => el.href)
                    .filter(href => typeof href === 'string' && href.length > 0);
            }} catch (e) {{
                hrefs = [];
            }}
            return {{ selector, hrefs }};
        }});
    }})({selectors})
"#
    )
}

/// Raw detail strings keyed by field name; missing elements yield `''` / `[]`.
pub fn detail_script() -> String {
    let text_fields =
        serde_json::to_string(DETAIL_TEXT_FIELDS).unwrap_or_else(|_| "[]".to_string());
    let list_fields =
        serde_json::to_string(DETAIL_LIST_FIELDS).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"
    ((textFields, listFields) => {{
        const text = (selector) => {{
            const el = document.querySelector(selector);
            return el ? el.textContent.trim() : '';
        }};
        const out = {{}};
        for (const {{ field, selectors }} of textFields) {{
            out[field] = '';
            for (const selector of selectors) {{
                const value = text(selector);
                if (value) {{
                    out[field] = value;
                    break;
                }}
            }}
        }}
        for (const {{ field, selectors }} of listFields) {{
            out[field] = [];
            for (const selector of selectors) {{
                document.querySelectorAll(selector).forEach(el => {{
                    const value = el.textContent.trim();
                    if (value) out[field].push(value);
                }});
                if (out[field].length > 0) break;
            }}
        }}
        return out;
    }})({text_fields}, {list_fields})
"#
    )
}

/// Scroll down by `viewports` window heights
pub fn scroll_script(viewports: u32) -> String {
    format!("(() => {{ window.scrollBy(0, window.innerHeight * {viewports}); return true; }})()")
}
