//! Search-URL templates from rule descriptors.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use super::TemplateShape;

/// Placeholder tokens, all recognized in the same template.
const PLACEHOLDERS: [&str; 3] = ["{keyword}", "{query}", "%s"];

/// URI-component set: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a keyword as a single URI component.
pub fn encode_keyword(keyword: &str) -> String {
    utf8_percent_encode(keyword, COMPONENT_ENCODE_SET).to_string()
}

/// Find the search template in a descriptor body.
///
/// Lookup order is fixed: `searchUrlTemplate`, `template`, `search.template`,
/// `search.url`. Only string values count; a non-string at a higher-priority
/// key falls through to the next one.
pub fn extract_template(body: &Value) -> TemplateShape {
    let top = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
    let nested = |key: &str| {
        body.get("search")
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    if let Some(t) = top("searchUrlTemplate") {
        TemplateShape::SearchUrlTemplate(t)
    } else if let Some(t) = top("template") {
        TemplateShape::Template(t)
    } else if let Some(t) = nested("template") {
        TemplateShape::NestedTemplate(t)
    } else if let Some(t) = nested("url") {
        TemplateShape::NestedUrl(t)
    } else {
        TemplateShape::Unrecognized
    }
}

/// Replace every placeholder with the percent-encoded keyword.
///
/// Substitution is a single left-to-right pass, so text introduced by the
/// keyword is never re-scanned.
pub fn fill_placeholder(template: &str, keyword: &str) -> String {
    let encoded = encode_keyword(keyword);
    let mut out = String::with_capacity(template.len() + encoded.len());
    let mut rest = template;

    'scan: while !rest.is_empty() {
        for token in PLACEHOLDERS {
            if let Some(after) = rest.strip_prefix(token) {
                out.push_str(&encoded);
                rest = after;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_url_template_wins_over_template() {
        let body = json!({ "template": "https://b/{keyword}", "searchUrlTemplate": "https://a/{keyword}" });
        assert_eq!(
            extract_template(&body),
            TemplateShape::SearchUrlTemplate("https://a/{keyword}".to_string())
        );
    }

    #[test]
    fn test_priority_chain() {
        let body = json!({ "search": { "url": "https://d/%s", "template": "https://c/%s" } });
        assert_eq!(
            extract_template(&body),
            TemplateShape::NestedTemplate("https://c/%s".to_string())
        );

        let body = json!({ "search": { "url": "https://d/%s" } });
        assert_eq!(
            extract_template(&body),
            TemplateShape::NestedUrl("https://d/%s".to_string())
        );

        let body = json!({ "template": "https://b/{query}", "search": { "template": "https://c" } });
        assert_eq!(extract_template(&body).template(), Some("https://b/{query}"));
    }

    #[test]
    fn test_non_string_values_fall_through() {
        let body = json!({ "searchUrlTemplate": 42, "template": ["x"], "search": { "template": "https://c/{keyword}" } });
        assert_eq!(
            extract_template(&body),
            TemplateShape::NestedTemplate("https://c/{keyword}".to_string())
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert_eq!(extract_template(&json!({})), TemplateShape::Unrecognized);
        assert_eq!(extract_template(&json!([1, 2])), TemplateShape::Unrecognized);
        assert_eq!(extract_template(&json!("template")), TemplateShape::Unrecognized);
        assert_eq!(
            extract_template(&json!({ "search": "https://x" })),
            TemplateShape::Unrecognized
        );
    }

    #[test]
    fn test_fill_mixed_placeholders() {
        assert_eq!(
            fill_placeholder("a/{keyword}/b?x={query}", "foo bar"),
            "a/foo%20bar/b?x=foo%20bar"
        );
    }

    #[test]
    fn test_fill_all_occurrences_of_each_token() {
        assert_eq!(
            fill_placeholder("%s-%s-{keyword}-{keyword}", "k"),
            "k-k-k-k"
        );
    }

    #[test]
    fn test_fill_encodes_reserved_characters() {
        assert_eq!(
            fill_placeholder("https://x/?q={query}", "a&b=c/d"),
            "https://x/?q=a%26b%3Dc%2Fd"
        );
        assert_eq!(fill_placeholder("/{keyword}", "电影"), "/%E7%94%B5%E5%BD%B1");
    }

    #[test]
    fn test_fill_keeps_component_safe_marks() {
        assert_eq!(
            fill_placeholder("/s/{keyword}", "it's (new)!*"),
            "/s/it's%20(new)!*"
        );
        assert_eq!(encode_keyword("Ocean's Eleven ~1"), "Ocean's%20Eleven%20~1");
        assert_eq!(encode_keyword("a+b#c?d"), "a%2Bb%23c%3Fd");
    }

    #[test]
    fn test_fill_does_not_rescan_keyword() {
        assert_eq!(fill_placeholder("/{keyword}", "{query}"), "/%7Bquery%7D");
    }

    #[test]
    fn test_fill_without_placeholders_is_identity() {
        assert_eq!(fill_placeholder("https://x/search", "kw"), "https://x/search");
        assert_eq!(fill_placeholder("", "kw"), "");
        assert_eq!(fill_placeholder("100%", "kw"), "100%");
    }
}
