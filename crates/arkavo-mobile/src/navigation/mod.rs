//! System navigation (home, recent apps, back) across gesture-bar, on-screen button and
//! hardware-key devices.

pub mod cache;
pub mod resolver;
pub mod strategy;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use cache::{NavigationCache, NavigationCacheEntry};
pub use resolver::{NavigationOutcome, NavigationResolver};
pub use strategy::{NavigationContext, NavigationStrategy, find_navigation_button};

/// Action family; the resolved method is cached per device and family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationAction {
    Home,
    RecentApps,
    Back,
}

impl NavigationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationAction::Home => "home",
            NavigationAction::RecentApps => "recent_apps",
            NavigationAction::Back => "back",
        }
    }
}

impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMethod {
    Gesture,
    Element,
    Hardware,
}

impl NavigationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationMethod::Gesture => "gesture",
            NavigationMethod::Element => "element",
            NavigationMethod::Hardware => "hardware",
        }
    }
}

impl fmt::Display for NavigationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
