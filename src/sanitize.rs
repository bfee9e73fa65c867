//! SVG icon markup sanitizer.
//!
//! Accepts a user-supplied `<svg>` document and re-serializes it keeping only
//! an allowlist of presentational elements and attributes. Anything that could
//! execute script, load external resources or hide markup is removed. Input
//! that is not a single well-formed `<svg>` element is rejected.

use crate::config;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

const ALLOWED_TAGS: &[&str] = &[
    "svg",
    "g",
    "path",
    "circle",
    "rect",
    "line",
    "polyline",
    "polygon",
    "ellipse",
    "defs",
    "lineargradient",
    "radialgradient",
    "stop",
    "clippath",
    "mask",
    "title",
    "desc",
];

const ALLOWED_ATTRS: &[&str] = &[
    "xmlns",
    "viewbox",
    "width",
    "height",
    "x",
    "y",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "x1",
    "y1",
    "x2",
    "y2",
    "d",
    "points",
    "transform",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-opacity",
    "clip-path",
    "clip-rule",
    "mask",
    "opacity",
    "id",
    "class",
    "version",
    "preserveaspectratio",
    "gradientunits",
    "gradienttransform",
    "offset",
    "stop-color",
    "stop-opacity",
    "p-id",
    "t",
];

/// Attributes whose value may be a paint server / reference `url(...)`
const URL_REFERENCE_ATTRS: &[&str] = &["fill", "stroke", "clip-path", "mask"];

/// Sanitize icon markup.
///
/// Returns the cleaned markup, or `None` if the input is empty, too long,
/// malformed, or not rooted at an `<svg>` element. Sanitizing already
/// sanitized output returns it unchanged.
pub fn sanitize_svg_markup(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > config::MAX_ICON_MARKUP_LEN {
        return None;
    }

    let mut reader = Reader::from_str(trimmed);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Vec::new());
    // Open elements that are being written
    let mut open: Vec<String> = Vec::new();
    // Depth inside a removed subtree
    let mut skipping = 0usize;
    let mut root_seen = false;
    let mut root_closed = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                log::debug!("Rejecting icon markup: {}", e);
                return None;
            }
        };

        match event {
            Event::Start(element) => {
                if root_closed {
                    return None;
                }
                if skipping > 0 {
                    skipping += 1;
                    continue;
                }
                let tag = element_name(&element)?;
                if !root_seen {
                    if !tag.eq_ignore_ascii_case("svg") {
                        return None;
                    }
                    root_seen = true;
                    let cleaned = clean_element(&element, &tag, true)?;
                    writer.write_event(Event::Start(cleaned)).ok()?;
                    open.push(tag);
                } else if is_allowed_tag(&tag) {
                    let cleaned = clean_element(&element, &tag, false)?;
                    writer.write_event(Event::Start(cleaned)).ok()?;
                    open.push(tag);
                } else {
                    skipping = 1;
                }
            }
            Event::Empty(element) => {
                if root_closed {
                    return None;
                }
                if skipping > 0 {
                    continue;
                }
                let tag = element_name(&element)?;
                if !root_seen {
                    if !tag.eq_ignore_ascii_case("svg") {
                        return None;
                    }
                    root_seen = true;
                    root_closed = true;
                    let cleaned = clean_element(&element, &tag, true)?;
                    writer.write_event(Event::Empty(cleaned)).ok()?;
                } else if is_allowed_tag(&tag) {
                    let cleaned = clean_element(&element, &tag, false)?;
                    writer.write_event(Event::Empty(cleaned)).ok()?;
                }
            }
            Event::End(_) => {
                if skipping > 0 {
                    skipping -= 1;
                    continue;
                }
                let tag = open.pop()?;
                writer.write_event(Event::End(BytesEnd::new(tag))).ok()?;
                if open.is_empty() {
                    root_closed = true;
                }
            }
            Event::Text(text) => {
                let content = text.unescape().ok()?;
                if open.is_empty() {
                    // Only whitespace may surround the root element
                    if !content.trim().is_empty() {
                        return None;
                    }
                    continue;
                }
                if skipping > 0 {
                    continue;
                }
                writer
                    .write_event(Event::Text(BytesText::new(&content)))
                    .ok()?;
            }
            Event::CData(_) if !root_seen || root_closed => return None,
            Event::Eof => break,
            // Comments, CDATA, processing instructions, declarations and
            // doctypes are dropped.
            _ => {}
        }
    }

    if !root_closed || !open.is_empty() {
        return None;
    }

    let serialized = String::from_utf8(writer.into_inner()).ok()?;
    if !serialized.to_ascii_lowercase().starts_with("<svg") {
        return None;
    }
    Some(serialized)
}

fn element_name(element: &BytesStart<'_>) -> Option<String> {
    std::str::from_utf8(element.name().as_ref())
        .ok()
        .map(|s| s.to_string())
}

fn is_allowed_tag(tag: &str) -> bool {
    let lowered = tag.to_ascii_lowercase();
    ALLOWED_TAGS.contains(&lowered.as_str())
}

/// Rebuild an element keeping only safe attributes.
/// Returns `None` when the attribute list itself is malformed.
fn clean_element(element: &BytesStart<'_>, tag: &str, is_root: bool) -> Option<BytesStart<'static>> {
    let mut cleaned = BytesStart::new(tag.to_string());
    let mut has_xmlns = false;

    for attr in element.attributes() {
        let attr = attr.ok()?;
        let name = std::str::from_utf8(attr.key.as_ref()).ok()?.to_string();
        let value = attr.unescape_value().ok()?;
        let lowered = name.to_ascii_lowercase();

        if lowered.starts_with("on") || lowered == "style" {
            continue;
        }
        if lowered == "href" || lowered == "xlink:href" {
            continue;
        }
        if !ALLOWED_ATTRS.contains(&lowered.as_str()) || !is_safe_value(&lowered, &value) {
            continue;
        }

        if lowered == "xmlns" {
            has_xmlns = true;
        }
        cleaned.push_attribute((name.as_str(), &*value));
    }

    if is_root && !has_xmlns {
        cleaned.push_attribute(("xmlns", SVG_NAMESPACE));
    }

    Some(cleaned)
}

fn is_safe_value(name: &str, value: &str) -> bool {
    let normalized = value.trim();
    let lowered = normalized.to_ascii_lowercase();

    if lowered.contains("javascript:")
        || lowered.contains("vbscript:")
        || lowered.contains("data:")
        || lowered.contains('<')
        || lowered.contains('>')
        || normalized.contains('&')
    {
        return false;
    }

    if URL_REFERENCE_ATTRS.contains(&name) && contains_url_call(&lowered) {
        return is_local_url_reference(normalized);
    }

    true
}

/// Whether a lowercased value contains `url` followed by optional whitespace and `(`
fn contains_url_call(lowered: &str) -> bool {
    lowered.match_indices("url").any(|(idx, _)| {
        lowered[idx + 3..]
            .trim_start()
            .starts_with('(')
    })
}

/// Matches `url(#some-id)` with optional inner whitespace
fn is_local_url_reference(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    let Some(rest) = lowered.strip_prefix("url(") else {
        return false;
    };
    let Some(inner) = rest.strip_suffix(')') else {
        return false;
    };
    let Some(id) = inner.trim().strip_prefix('#') else {
        return false;
    };
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_simple_icon() {
        let out = sanitize_svg_markup(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24v24H0z" fill="red"/></svg>"#,
        )
        .unwrap();
        assert!(out.starts_with("<svg"));
        assert!(out.contains(r#"viewBox="0 0 24 24""#));
        assert!(out.contains(r#"<path d="M0 0h24v24H0z" fill="red"/>"#));
    }

    #[test]
    fn test_adds_namespace() {
        let out = sanitize_svg_markup(r#"<svg viewBox="0 0 1 1"></svg>"#).unwrap();
        assert!(out.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    }

    #[test]
    fn test_removes_script_and_handlers() {
        let out = sanitize_svg_markup(
            r#"<svg onload="alert(1)"><script>alert(1)</script><g style="x" onclick="y"><circle r="2"/></g></svg>"#,
        )
        .unwrap();
        assert!(!out.contains("script"));
        assert!(!out.contains("alert"));
        assert!(!out.contains("onload"));
        assert!(!out.contains("onclick"));
        assert!(!out.contains("style"));
        assert!(out.contains(r#"<circle r="2"/>"#));
    }

    #[test]
    fn test_removes_nested_disallowed_subtree() {
        let out = sanitize_svg_markup(
            r#"<svg><foreignObject><div><p>hi</p></div></foreignObject><rect width="1"/></svg>"#,
        )
        .unwrap();
        assert!(!out.contains("foreignObject"));
        assert!(!out.contains("hi"));
        assert!(out.contains("<rect"));
    }

    #[test]
    fn test_drops_links_and_unsafe_values() {
        let out = sanitize_svg_markup(
            r##"<svg><a href="javascript:alert(1)"/><path d="M0" fill="url(https://evil.test/x)" stroke="url(#grad)" xlink:href="#a"/><rect class="javascript:x"/></svg>"##,
        )
        .unwrap();
        assert!(!out.contains("evil"));
        assert!(!out.contains("href"));
        assert!(!out.contains("javascript"));
        assert!(out.contains(r##"stroke="url(#grad)""##));
    }

    #[test]
    fn test_rejects_non_svg_root() {
        assert!(sanitize_svg_markup("<div></div>").is_none());
        assert!(sanitize_svg_markup("<html><svg/></html>").is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(sanitize_svg_markup("").is_none());
        assert!(sanitize_svg_markup("   ").is_none());
        assert!(sanitize_svg_markup("<svg><path></svg>").is_none());
        assert!(sanitize_svg_markup("<svg>").is_none());
        assert!(sanitize_svg_markup("<svg/><svg/>").is_none());
        assert!(sanitize_svg_markup("not markup").is_none());
    }

    #[test]
    fn test_rejects_oversized() {
        let body = "<g/>".repeat(config::MAX_ICON_MARKUP_LEN / 4 + 1);
        let markup = format!("<svg>{}</svg>", body);
        assert!(sanitize_svg_markup(&markup).is_none());
    }

    #[test]
    fn test_drops_comments_and_prolog() {
        let out = sanitize_svg_markup(
            r#"<?xml version="1.0"?><!-- made by hand --><svg><!-- inner --><title>Icon</title></svg>"#,
        )
        .unwrap();
        assert!(!out.contains("<?xml"));
        assert!(!out.contains("<!--"));
        assert!(out.contains("<title>Icon</title>"));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r#"<svg viewBox="0 0 24 24"><path d="M1 1" onclick="x"/><title>A 'quoted' "icon"</title></svg>"#,
            r#"<SVG width="10"><g transform="scale(2)"><ellipse rx="1" ry="2"/></g></SVG>"#,
            r##"<svg><defs><linearGradient id="g"><stop offset="0" stop-color="#fff"/></linearGradient></defs><rect fill="url(#g)"/></svg>"##,
        ];
        for input in inputs {
            let once = sanitize_svg_markup(input).unwrap();
            let twice = sanitize_svg_markup(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_local_url_reference() {
        assert!(is_local_url_reference("url(#grad-1)"));
        assert!(is_local_url_reference("URL( #a_b )"));
        assert!(!is_local_url_reference("url(http://x)"));
        assert!(!is_local_url_reference("url(#)"));
        assert!(!is_local_url_reference("url(#a) extra"));
    }
}
