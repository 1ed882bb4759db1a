use super::index::{ElementIndex, IndexedElement};
use crate::observe::{Point, ScreenSnapshot};
use crate::{MobileError, Result};
use serde::{Deserialize, Serialize};

/// Target descriptor as handed over by the dispatch layer. Exactly one addressing mode
/// is expected; when several are present, coordinates win over text, text over resource
/// id, and resource id over index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDescriptor {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub text: Option<String>,
    pub fuzzy_match: bool,
    pub case_sensitive: bool,
    pub resource_id: Option<String>,
    pub partial_id: bool,
    pub index: Option<i64>,
    /// Restrict text and resource-id lookups to descendants of this container.
    pub container_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Coordinates(Point),
    Text {
        text: String,
        fuzzy: bool,
        case_sensitive: bool,
        container: Option<String>,
    },
    ResourceId {
        id: String,
        partial: bool,
        container: Option<String>,
    },
    Index(i64),
}

impl TargetDescriptor {
    pub fn resource_id(id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn point(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn index(index: i64) -> Self {
        Self {
            index: Some(index),
            ..Default::default()
        }
    }

    /// Picks the addressing mode by fixed precedence.
    pub fn resolve(&self) -> Result<Target> {
        if let (Some(x), Some(y)) = (self.x, self.y) {
            return Ok(Target::Coordinates(Point { x, y }));
        }
        if let Some(text) = self.text.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Target::Text {
                text: text.clone(),
                fuzzy: self.fuzzy_match,
                case_sensitive: self.case_sensitive,
                container: self.container_id.clone(),
            });
        }
        if let Some(id) = self.resource_id.as_ref().filter(|id| !id.is_empty()) {
            return Ok(Target::ResourceId {
                id: id.clone(),
                partial: self.partial_id,
                container: self.container_id.clone(),
            });
        }
        if let Some(index) = self.index {
            return Ok(Target::Index(index));
        }
        if self.x.is_some() || self.y.is_some() {
            return Err(MobileError::InvalidTarget(
                "coordinates need both x and y".to_string(),
            ));
        }
        Err(MobileError::InvalidTarget(
            "one of x/y, text, resource_id or index is required".to_string(),
        ))
    }
}

impl Target {
    pub fn needs_tree(&self) -> bool {
        !matches!(self, Target::Coordinates(_))
    }

    /// Container the lookup is scoped to, if any.
    pub fn container(&self) -> Option<&str> {
        match self {
            Target::Text { container, .. } | Target::ResourceId { container, .. } => {
                container.as_deref()
            }
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Target::Coordinates(p) => format!("point ({}, {})", p.x, p.y),
            Target::Text { text, .. } => format!("text '{}'", text),
            Target::ResourceId { id, .. } => format!("resource id '{}'", id),
            Target::Index(i) => format!("element index {}", i),
        }
    }
}

/// Where a target landed on a particular snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTarget {
    pub point: Point,
    pub index: Option<usize>,
    pub text: Option<String>,
    pub resource_id: Option<String>,
}

impl ResolvedTarget {
    fn from_element(element: &IndexedElement<'_>) -> Self {
        Self {
            point: element.center(),
            index: Some(element.index),
            text: element.text.map(str::to_string),
            resource_id: element.element.resource_id.clone(),
        }
    }
}

/// Resolves a target against `snapshot`. Lookup failures carry a sample of the
/// resource ids (or texts) that were on screen.
pub fn locate(snapshot: &ScreenSnapshot, target: &Target) -> Result<ResolvedTarget> {
    if let Target::Coordinates(point) = target {
        return Ok(ResolvedTarget {
            point: *point,
            index: None,
            text: None,
            resource_id: None,
        });
    }

    let index = ElementIndex::new(snapshot)?;
    let found = match target {
        Target::Text {
            text,
            fuzzy,
            case_sensitive,
            container,
        } => index.find_by_text(text, *fuzzy, *case_sensitive, container.as_deref()),
        Target::ResourceId {
            id,
            partial,
            container,
        } => index
            .find_by_resource_id(id, *partial, container.as_deref())
            .into_iter()
            .next(),
        Target::Index(i) => index.find_by_index(*i),
        Target::Coordinates(_) => None,
    };

    let Some(element) = found else {
        let description = match index.scope_problem(target.container()) {
            Some(problem) => format!("{} ({})", target.describe(), problem),
            None => target.describe(),
        };
        return Err(match target {
            Target::Text { .. } => MobileError::not_found(description, index.sample_texts()),
            _ => index.not_found(description),
        });
    };
    Ok(ResolvedTarget::from_element(element))
}
