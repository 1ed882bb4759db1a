use crate::observe::{Bounds, ElementNode, Point, ScreenSnapshot};
use crate::{MobileError, Result};

/// How many alternatives a "not found" diagnostic lists.
pub const DIAGNOSTIC_SAMPLE_SIZE: usize = 5;

/// An element addressed by its pre-order position within one snapshot.
///
/// Indices are only meaningful for the snapshot they came from; the next capture may
/// number the same widget differently.
#[derive(Debug, Clone, Copy)]
pub struct IndexedElement<'a> {
    pub index: usize,
    pub element: &'a ElementNode,
    pub bounds: Bounds,
    pub text: Option<&'a str>,
    /// One past the position of this element's last indexed descendant.
    subtree_end: usize,
}

impl IndexedElement<'_> {
    pub fn center(&self) -> Point {
        self.bounds.center()
    }
}

/// Center of an element: `floor((left+right)/2), floor((top+bottom)/2)`.
pub fn center(element: &IndexedElement<'_>) -> Point {
    element.bounds.center()
}

/// True when nothing is expected, otherwise when the element's label equals `expected`.
pub fn validate_text(found: &IndexedElement<'_>, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => found.text.map(str::trim) == Some(expected.trim()),
    }
}

/// Flattened, addressable view over one snapshot's element tree.
pub struct ElementIndex<'a> {
    entries: Vec<IndexedElement<'a>>,
    /// Nodes left out of `entries` because their bounds did not parse.
    unbounded: Vec<&'a ElementNode>,
}

impl<'a> ElementIndex<'a> {
    /// Fails only when the snapshot carries no tree at all.
    pub fn new(snapshot: &'a ScreenSnapshot) -> Result<Self> {
        Ok(Self::from_tree(snapshot.tree()?))
    }

    pub fn from_tree(root: &'a ElementNode) -> Self {
        let mut index = Self {
            entries: Vec::new(),
            unbounded: Vec::new(),
        };
        flatten_into(root, &mut index.entries, &mut index.unbounded);
        index
    }

    pub fn elements(&self) -> &[IndexedElement<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total over all integers: negative or out-of-range indices give `None`.
    pub fn find_by_index(&self, index: i64) -> Option<&IndexedElement<'a>> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    /// Exact mode matches the full id or its short name (`input` for
    /// `com.example:id/input`); partial mode matches any substring of the full id.
    pub fn find_by_resource_id(
        &self,
        id: &str,
        partial: bool,
        container: Option<&str>,
    ) -> Vec<&IndexedElement<'a>> {
        self.scope(container)
            .iter()
            .filter(|entry| resource_id_matches(entry.element, id, partial))
            .collect()
    }

    /// First element in pre-order whose label matches. Fuzzy means substring
    /// containment; case folding applies in both modes unless `case_sensitive`.
    pub fn find_by_text(
        &self,
        text: &str,
        fuzzy: bool,
        case_sensitive: bool,
        container: Option<&str>,
    ) -> Option<&IndexedElement<'a>> {
        first_text_match(self.scope(container), text, fuzzy, case_sensitive)
    }

    /// [`find_by_text`](Self::find_by_text) limited to the subtree under `scope`.
    pub fn find_text_within(
        &self,
        scope: &IndexedElement<'a>,
        text: &str,
        fuzzy: bool,
        case_sensitive: bool,
    ) -> Option<&IndexedElement<'a>> {
        first_text_match(self.descendants(scope), text, fuzzy, case_sensitive)
    }

    /// The container itself when it scrolls, else its first scrollable descendant.
    /// Without a container, the first scrollable element on screen.
    pub fn find_scrollable(&self, container: Option<&str>) -> Option<&IndexedElement<'a>> {
        if let Some(id) = container {
            let position = self.scope_position(id)?;
            let entry = &self.entries[position];
            if entry.element.scrollable {
                return Some(entry);
            }
            return self.entries[position + 1..entry.subtree_end]
                .iter()
                .find(|e| e.element.scrollable);
        }
        self.entries.iter().find(|e| e.element.scrollable)
    }

    /// Indexed descendants of `entry`, in pre-order.
    pub fn descendants(&self, entry: &IndexedElement<'a>) -> &[IndexedElement<'a>] {
        self.entries
            .get(entry.index + 1..entry.subtree_end)
            .unwrap_or(&[])
    }

    /// Up to [`DIAGNOSTIC_SAMPLE_SIZE`] distinct resource ids, in screen order.
    pub fn sample_resource_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.entries.iter().filter_map(|e| e.element.resource_id.as_deref()) {
            if ids.len() == DIAGNOSTIC_SAMPLE_SIZE {
                break;
            }
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    pub fn sample_texts(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.text)
            .take(DIAGNOSTIC_SAMPLE_SIZE)
            .map(str::to_string)
            .collect()
    }

    /// Why a lookup scoped to `container` cannot match anything, when the container
    /// itself is the problem.
    pub fn scope_problem(&self, container: Option<&str>) -> Option<String> {
        let id = container?;
        if self.scope_position(id).is_some() {
            return None;
        }
        if self.unbounded.iter().any(|node| resource_id_matches(node, id, false)) {
            Some(format!("container '{}' has unparseable bounds", id))
        } else {
            Some(format!("container '{}' is not on screen", id))
        }
    }

    pub fn not_found(&self, description: impl Into<String>) -> MobileError {
        MobileError::not_found(description, self.sample_resource_ids())
    }

    fn scope(&self, container: Option<&str>) -> &[IndexedElement<'a>] {
        match container {
            None => &self.entries,
            Some(id) => match self.scope_position(id) {
                Some(position) => &self.entries[position + 1..self.entries[position].subtree_end],
                None => &[],
            },
        }
    }

    fn scope_position(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| resource_id_matches(entry.element, id, false))
    }
}

/// Deterministic pre-order walk; nodes without parseable bounds are skipped but their
/// descendants are still visited.
pub fn flatten(snapshot: &ScreenSnapshot) -> Result<Vec<IndexedElement<'_>>> {
    Ok(ElementIndex::new(snapshot)?.entries)
}

fn flatten_into<'a>(
    node: &'a ElementNode,
    entries: &mut Vec<IndexedElement<'a>>,
    unbounded: &mut Vec<&'a ElementNode>,
) {
    if node.bounds.is_none() {
        unbounded.push(node);
    }
    let own = node.bounds.map(|bounds| {
        entries.push(IndexedElement {
            index: entries.len(),
            element: node,
            bounds,
            text: node.label(),
            subtree_end: 0,
        });
        entries.len() - 1
    });

    for child in &node.children {
        flatten_into(child, entries, unbounded);
    }

    if let Some(position) = own {
        entries[position].subtree_end = entries.len();
    }
}

fn first_text_match<'i, 'a>(
    entries: &'i [IndexedElement<'a>],
    text: &str,
    fuzzy: bool,
    case_sensitive: bool,
) -> Option<&'i IndexedElement<'a>> {
    let needle = fold(text, case_sensitive);
    entries.iter().find(|entry| {
        entry.text.is_some_and(|label| {
            let label = fold(label, case_sensitive);
            if fuzzy {
                label.contains(&needle)
            } else {
                label == needle
            }
        })
    })
}

fn resource_id_matches(element: &ElementNode, id: &str, partial: bool) -> bool {
    let Some(resource_id) = element.resource_id.as_deref() else {
        return false;
    };
    if partial {
        resource_id.contains(id)
    } else {
        resource_id == id || element.resource_name() == Some(id)
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}
