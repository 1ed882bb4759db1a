//! Turns raw view-hierarchy dumps into [`ElementNode`] trees.
//!
//! Two dump formats are accepted: the XML written by `uiautomator dump` and the JSON
//! node format produced by accessibility-service based dumpers. Both carry the same
//! attribute names, but the JSON form may use native booleans where XML uses the
//! strings `"true"`/`"false"`. Attribute normalization happens once, here, so the rest
//! of the engine only sees typed flags.

use super::snapshot::{Bounds, ElementNode, ScreenSize, SystemInsets};
use crate::{MobileError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)(node|hierarchy)\b((?:[^>"]|"[^"]*")*?)(/?)>"#).expect("tag pattern is valid")
});

static ATTRIBUTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w:.-]+)="([^"]*)""#).expect("attribute pattern is valid"));

static SIZE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Physical|Override) size:\s*(\d+)x(\d+)").expect("size pattern is valid")
});

/// Every attribute name that means "this node has input focus".
const FOCUS_ATTRIBUTES: &[&str] = &["focused", "isFocused", "focus", "accessibility-focused"];
const KEYBOARD_FOCUS_ATTRIBUTES: &[&str] = &["has-keyboard-focus", "hasKeyboardFocus"];

const STATUS_BAR_ID: &str = "android:id/statusBarBackground";
const NAVIGATION_BAR_ID: &str = "android:id/navigationBarBackground";

/// Parses either dump format, choosing by the first meaningful character.
pub fn parse_hierarchy(raw: &str) -> Result<ElementNode> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        parse_json(trimmed)
    } else {
        parse_xml(raw)
    }
}

/// Parses a `uiautomator dump` document. Trailing chatter such as
/// `UI hierchary dumped to: /dev/tty` is ignored.
///
/// The returned root is a synthetic container without bounds, so it never shows up
/// in the flattened index and indices start at the first real node.
pub fn parse_xml(raw: &str) -> Result<ElementNode> {
    let start = raw
        .find("<hierarchy")
        .ok_or_else(|| MobileError::MissingViewHierarchy(dump_excerpt(raw)))?;

    let mut stack: Vec<ElementNode> = Vec::new();
    let mut root: Option<ElementNode> = None;

    for caps in TAG_PATTERN.captures_iter(&raw[start..]) {
        let closing = !caps[1].is_empty();
        let tag = &caps[2];
        let self_closing = !caps[4].is_empty();

        if closing {
            let node = stack.pop().ok_or_else(|| {
                MobileError::MissingViewHierarchy(format!("unbalanced </{}> in dump", tag))
            })?;
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => {
                    root = Some(node);
                    break;
                }
            }
            continue;
        }

        let node = if tag == "hierarchy" {
            ElementNode {
                class_name: "hierarchy".to_string(),
                ..Default::default()
            }
        } else {
            let attributes: HashMap<String, Value> = ATTRIBUTE_PATTERN
                .captures_iter(&caps[3])
                .map(|a| (a[1].to_string(), Value::String(decode_entities(&a[2]))))
                .collect();
            node_from_attributes(&attributes)
        };

        if self_closing {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => {
                    root = Some(node);
                    break;
                }
            }
        } else {
            stack.push(node);
        }
    }

    // Truncated dumps still carry a usable partial tree.
    if root.is_none() {
        while let Some(node) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => root = Some(node),
            }
        }
    }

    root.ok_or_else(|| MobileError::MissingViewHierarchy(dump_excerpt(raw)))
}

/// Parses the JSON node format: `{"hierarchy": {...}}`, a bare node object, or an
/// array of top-level nodes. Children live under `node` or `children`.
pub fn parse_json(raw: &str) -> Result<ElementNode> {
    let value: Value = serde_json::from_str(raw)?;
    let top = match &value {
        Value::Object(map) => map.get("hierarchy").unwrap_or(&value),
        _ => &value,
    };

    let children = match top {
        Value::Array(items) => items.iter().filter_map(json_node).collect(),
        Value::Object(_) => json_node(top).into_iter().collect(),
        _ => Vec::new(),
    };

    if children.is_empty() {
        return Err(MobileError::MissingViewHierarchy(dump_excerpt(raw)));
    }

    Ok(ElementNode {
        class_name: "hierarchy".to_string(),
        children,
        ..Default::default()
    })
}

fn json_node(value: &Value) -> Option<ElementNode> {
    let map = value.as_object()?;
    let attributes: HashMap<String, Value> =
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let mut node = node_from_attributes(&attributes);

    for key in ["node", "children"] {
        match map.get(key) {
            Some(Value::Array(items)) => node.children.extend(items.iter().filter_map(json_node)),
            Some(child @ Value::Object(_)) => node.children.extend(json_node(child)),
            _ => {}
        }
    }
    Some(node)
}

fn node_from_attributes(attributes: &HashMap<String, Value>) -> ElementNode {
    let text_attr = |names: &[&str]| {
        names.iter().find_map(|name| match attributes.get(*name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
    };

    ElementNode {
        bounds: attributes.get("bounds").and_then(bounds_from_value),
        class_name: text_attr(&["class", "className"]).unwrap_or_default(),
        resource_id: text_attr(&["resource-id", "resourceId"]),
        text: text_attr(&["text"]),
        content_description: text_attr(&["content-desc", "contentDescription"]),
        clickable: normalize_flag(attributes, &["clickable"]),
        scrollable: normalize_flag(attributes, &["scrollable"]),
        focused: normalize_flag(attributes, FOCUS_ATTRIBUTES),
        selected: normalize_flag(attributes, &["selected"]),
        has_keyboard_focus: normalize_flag(attributes, KEYBOARD_FOCUS_ATTRIBUTES),
        children: Vec::new(),
    }
}

/// True when any of `names` carries a truthy value: `true`, `"true"`, `"1"` or `1`.
pub fn normalize_flag(attributes: &HashMap<String, Value>, names: &[&str]) -> bool {
    names.iter().any(|name| match attributes.get(*name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}

fn bounds_from_value(value: &Value) -> Option<Bounds> {
    match value {
        Value::String(raw) => Bounds::parse(raw),
        Value::Object(map) => {
            let side = |map: &Map<String, Value>, key: &str| {
                map.get(key)?.as_i64().and_then(|v| i32::try_from(v).ok())
            };
            Bounds::new(
                side(map, "left")?,
                side(map, "top")?,
                side(map, "right")?,
                side(map, "bottom")?,
            )
        }
        _ => None,
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn dump_excerpt(raw: &str) -> String {
    let excerpt: String = raw.trim().chars().take(120).collect();
    if excerpt.is_empty() {
        "device returned an empty hierarchy dump".to_string()
    } else {
        format!("unrecognized hierarchy dump: {}", excerpt)
    }
}

/// Parses `wm size`, preferring the override size when one is set.
pub fn parse_screen_size(raw: &str) -> Option<ScreenSize> {
    let mut physical = None;
    let mut overridden = None;
    for caps in SIZE_PATTERN.captures_iter(raw) {
        let size = ScreenSize {
            width: caps[2].parse().ok()?,
            height: caps[3].parse().ok()?,
        };
        match &caps[1] {
            "Override" => overridden = Some(size),
            _ => physical = Some(size),
        }
    }
    overridden.or(physical)
}

/// Status and navigation bar margins, taken from the system bar background nodes.
pub fn derive_insets(tree: &ElementNode, screen: ScreenSize) -> SystemInsets {
    let mut insets = SystemInsets::default();
    let width = screen.width as i32;
    let height = screen.height as i32;

    tree.visit(&mut |node| {
        let (Some(id), Some(bounds)) = (node.resource_id.as_deref(), node.bounds) else {
            return;
        };
        if id == STATUS_BAR_ID {
            insets.top = insets.top.max(bounds.bottom.max(0) as u32);
        } else if id == NAVIGATION_BAR_ID {
            if bounds.width() >= bounds.height() {
                insets.bottom = insets.bottom.max((height - bounds.top).max(0) as u32);
            } else if bounds.left > width / 2 {
                insets.right = insets.right.max((width - bounds.left).max(0) as u32);
            } else {
                insets.left = insets.left.max(bounds.right.max(0) as u32);
            }
        }
    });

    insets
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0"><node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.example" content-desc="" clickable="false" focused="false" scrollable="false" selected="false" bounds="[0,0][1080,2400]"><node index="0" text="Tom &amp; Jerry" resource-id="com.example:id/title" class="android.widget.TextView" content-desc="" clickable="true" focused="false" scrollable="false" selected="false" bounds="[0,100][1080,200]" /><node index="1" text="" resource-id="com.example:id/input" class="android.widget.EditText" content-desc="Search" clickable="true" focused="true" scrollable="false" selected="false" bounds="[100,200][500,300]" /><node index="2" text="" resource-id="com.example:id/broken" class="android.view.View" bounds="[oops]"><node index="0" text="inner" resource-id="" class="android.widget.TextView" bounds="[10,10][20,20]" /></node></node></hierarchy>
UI hierchary dumped to: /dev/tty"#;

    #[test]
    fn test_parse_xml_dump() {
        let root = parse_hierarchy(DUMP).unwrap();
        assert_eq!(root.class_name, "hierarchy");
        assert!(root.bounds.is_none());

        let frame = &root.children[0];
        assert_eq!(frame.children.len(), 3);

        let title = &frame.children[0];
        assert_eq!(title.text.as_deref(), Some("Tom & Jerry"));
        assert!(title.clickable);
        assert_eq!(title.resource_id.as_deref(), Some("com.example:id/title"));

        let input = &frame.children[1];
        assert!(input.focused);
        assert_eq!(input.text, None);
        assert_eq!(input.label(), Some("Search"));

        let broken = &frame.children[2];
        assert!(broken.bounds.is_none());
        assert_eq!(broken.children[0].text.as_deref(), Some("inner"));
    }

    #[test]
    fn test_parse_xml_without_hierarchy_fails() {
        let err = parse_hierarchy("ERROR: could not get idle state.").unwrap_err();
        assert!(matches!(err, MobileError::MissingViewHierarchy(_)));
    }

    #[test]
    fn test_parse_truncated_xml_keeps_partial_tree() {
        let truncated = r#"<hierarchy rotation="0"><node class="a" bounds="[0,0][10,10]"><node class="b" bounds="[0,0][5,5]" />"#;
        let root = parse_hierarchy(truncated).unwrap();
        assert_eq!(root.children[0].class_name, "a");
        assert_eq!(root.children[0].children[0].class_name, "b");
    }

    #[test]
    fn test_parse_json_with_native_booleans() {
        let json = r#"{"hierarchy": {"class": "android.widget.FrameLayout", "bounds": {"left": 0, "top": 0, "right": 1080, "bottom": 2400},
            "node": [{"class": "android.widget.EditText", "resource-id": "com.example:id/input", "bounds": "[100,200][500,300]", "hasKeyboardFocus": true, "clickable": "true"}]}}"#;
        let root = parse_hierarchy(json).unwrap();
        let frame = &root.children[0];
        assert_eq!(frame.bounds, Bounds::new(0, 0, 1080, 2400));
        let input = &frame.children[0];
        assert!(input.has_keyboard_focus);
        assert!(input.is_focused());
        assert!(!input.focused);
        assert!(input.clickable);
    }

    #[test]
    fn test_normalize_flag_closed_set() {
        let attrs: HashMap<String, Value> = [
            ("isFocused".to_string(), Value::String("TRUE".to_string())),
            ("selected".to_string(), Value::from(0)),
        ]
        .into_iter()
        .collect();
        assert!(normalize_flag(&attrs, FOCUS_ATTRIBUTES));
        assert!(!normalize_flag(&attrs, &["selected"]));
        assert!(!normalize_flag(&attrs, KEYBOARD_FOCUS_ATTRIBUTES));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &unknown; &"), "a <b> AB &unknown; &");
    }

    #[test]
    fn test_parse_screen_size() {
        assert_eq!(
            parse_screen_size("Physical size: 1080x2400\n"),
            Some(ScreenSize {
                width: 1080,
                height: 2400
            })
        );
        assert_eq!(
            parse_screen_size("Physical size: 1080x2400\nOverride size: 720x1600\n"),
            Some(ScreenSize {
                width: 720,
                height: 1600
            })
        );
        assert_eq!(parse_screen_size("error"), None);
    }

    #[test]
    fn test_derive_insets() {
        let xml = r#"<hierarchy><node class="f" bounds="[0,0][1080,2400]"><node resource-id="android:id/statusBarBackground" class="android.view.View" bounds="[0,0][1080,63]" /><node resource-id="android:id/navigationBarBackground" class="android.view.View" bounds="[0,2274][1080,2400]" /></node></hierarchy>"#;
        let root = parse_hierarchy(xml).unwrap();
        let insets = derive_insets(
            &root,
            ScreenSize {
                width: 1080,
                height: 2400,
            },
        );
        assert_eq!(insets.top, 63);
        assert_eq!(insets.bottom, 126);
        assert_eq!(insets.left, 0);
        assert_eq!(insets.right, 0);
    }
}
