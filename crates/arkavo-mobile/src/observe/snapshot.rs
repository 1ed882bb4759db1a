use crate::{MobileError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

static BOUNDS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]$").expect("bounds pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Device-pixel rectangle. Always satisfies `right >= left` and `bottom >= top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        (right >= left && bottom >= top).then_some(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Parses the `"[left,top][right,bottom]"` form devices report.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = BOUNDS_PATTERN.captures(raw.trim())?;
        let value = |i: usize| caps.get(i)?.as_str().parse::<i32>().ok();
        Self::new(value(1)?, value(2)?, value(3)?, value(4)?)
    }

    /// Integer-floor midpoint. Taps are pixel-addressed, so this must never round.
    pub fn center(&self) -> Point {
        let mid = |a: i32, b: i32| ((a as i64 + b as i64).div_euclid(2)) as i32;
        Point {
            x: mid(self.left, self.right),
            y: mid(self.top, self.bottom),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Half-open on the right and bottom edges, like the device's hit testing.
    pub fn contains_point(&self, point: Point) -> bool {
        self.left <= point.x && point.x < self.right && self.top <= point.y && point.y < self.bottom
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}][{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemInsets {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// One node of the on-screen element tree. The tree owns its children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementNode {
    /// `None` when the device reported bounds that do not parse.
    pub bounds: Option<Bounds>,
    pub class_name: String,
    pub resource_id: Option<String>,
    pub text: Option<String>,
    pub content_description: Option<String>,
    pub clickable: bool,
    pub scrollable: bool,
    pub focused: bool,
    pub selected: bool,
    pub has_keyboard_focus: bool,
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Visible text, falling back to the content description only when text is absent.
    pub fn label(&self) -> Option<&str> {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => Some(text),
            _ => self.content_description.as_deref().filter(|d| !d.is_empty()),
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused || self.has_keyboard_focus
    }

    /// Short resource name: `com.example:id/input` -> `input`.
    pub fn resource_name(&self) -> Option<&str> {
        self.resource_id
            .as_deref()
            .map(|id| id.rsplit_once('/').map_or(id, |(_, name)| name))
    }

    fn layout_identifier(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.class_name.hash(&mut hasher);
        self.resource_id.hash(&mut hasher);
        self.bounds.hash(&mut hasher);
        self.text.hash(&mut hasher);
        self.content_description.hash(&mut hasher);
        (self.focused, self.selected, self.has_keyboard_focus).hash(&mut hasher);
        self.children.len().hash(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn visit<'a>(&'a self, f: &mut impl FnMut(&'a ElementNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Everything observed about the screen at one instant. Never mutated after capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub screen_size: ScreenSize,
    pub system_insets: SystemInsets,
    pub element_tree: Option<ElementNode>,
    pub screenshot_path: Option<PathBuf>,
}

impl ScreenSnapshot {
    pub fn tree(&self) -> Result<&ElementNode> {
        self.element_tree.as_ref().ok_or_else(|| {
            MobileError::MissingViewHierarchy(format!(
                "snapshot of {} taken at {} has no element tree",
                self.device_id, self.timestamp
            ))
        })
    }

    /// Cheap layout signature: the wrapping sum of every node's layout identifier.
    pub fn structural_signature(&self) -> Option<u64> {
        let tree = self.element_tree.as_ref()?;
        let mut signature = 0u64;
        tree.visit(&mut |node| signature = signature.wrapping_add(node.layout_identifier()));
        Some(signature)
    }
}
