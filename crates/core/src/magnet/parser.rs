//! Total magnet URI parser.

use std::borrow::Cow;

use super::ParsedMagnet;

const MAGNET_PREFIX: &str = "magnet:?";
const BTIH_PREFIX: &str = "urn:btih:";

/// Parse a magnet URI.
///
/// Never fails: input without `magnet:?` yields an empty result and
/// malformed segments are skipped or kept verbatim.
pub fn parse_magnet(uri: &str) -> ParsedMagnet {
    let mut parsed = ParsedMagnet::default();
    let query = uri.split(MAGNET_PREFIX).nth(1).unwrap_or("");

    for segment in query.split('&') {
        let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = percent_decode(raw_key).to_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = percent_decode(raw_value).into_owned();

        match key.as_str() {
            "dn" if parsed.display_name.is_none() => {
                parsed.display_name = Some(value.clone());
            }
            "xt" if parsed.info_hash.is_empty() => {
                if let Some(hash) = strip_btih(&value) {
                    parsed.info_hash = hash.to_string();
                }
            }
            "tr" => parsed.trackers.push(value.clone()),
            _ => {}
        }

        parsed.params.entry(key).or_default().push(value);
    }

    parsed
}

/// Hash part of a `urn:btih:` topic, prefix matched case-insensitively.
fn strip_btih(topic: &str) -> Option<&str> {
    let prefix = topic.get(..BTIH_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(BTIH_PREFIX) {
        Some(&topic[BTIH_PREFIX.len()..])
    } else {
        None
    }
}

/// Percent-decode, keeping the raw text when it does not decode to UTF-8.
fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}
