use super::{NavigationAction, NavigationMethod};
use crate::device::{DeviceChannel, commands};
use crate::element::ElementIndex;
use crate::gesture::{GestureOptions, GestureSynthesizer};
use crate::observe::{CaptureOptions, Point, ScreenSnapshot, SnapshotReader};
use crate::{MobileError, Result};
use async_trait::async_trait;

/// Distance from the screen edge where system gestures start when no inset is known.
pub const GESTURE_EDGE_OFFSET_PX: i32 = 10;
pub const HOME_GESTURE_DURATION_MS: u64 = 300;
pub const RECENTS_GESTURE_DURATION_MS: u64 = 800;
pub const BACK_GESTURE_DURATION_MS: u64 = 250;

const NAVIGATION_BAR_IDS: &[&str] = &["navigation_bar", "nav_bar", "navbar"];
const NAVIGATION_BUTTON_CLASSES: &[&str] = &["ImageView", "ImageButton", "KeyButtonView"];

/// What a strategy needs to act on one device.
pub struct NavigationContext<'a> {
    pub channel: &'a dyn DeviceChannel,
    pub reader: &'a SnapshotReader,
    pub synthesizer: &'a GestureSynthesizer,
}

#[async_trait]
pub trait NavigationStrategy: Send + Sync {
    fn method(&self) -> NavigationMethod;

    async fn attempt(&self, ctx: &NavigationContext<'_>, action: NavigationAction) -> Result<()>;
}

pub fn strategy_for(method: NavigationMethod) -> &'static dyn NavigationStrategy {
    match method {
        NavigationMethod::Gesture => &GestureNavigation,
        NavigationMethod::Element => &ElementNavigation,
        NavigationMethod::Hardware => &HardwareNavigation,
    }
}

/// System gesture swipes: up from the bottom edge for home and recents, in from the
/// left edge for back.
pub struct GestureNavigation;

#[async_trait]
impl NavigationStrategy for GestureNavigation {
    fn method(&self) -> NavigationMethod {
        NavigationMethod::Gesture
    }

    async fn attempt(&self, ctx: &NavigationContext<'_>, action: NavigationAction) -> Result<()> {
        let snapshot = ctx.reader.capture(CaptureOptions::cached()).await?;
        let (from, to, duration_ms) = gesture_path(&snapshot, action);
        ctx.synthesizer
            .swipe(from, to, &GestureOptions::with_duration(duration_ms))
            .await?;
        Ok(())
    }
}

/// Endpoints and duration of the system gesture for `action` on this screen.
pub fn gesture_path(snapshot: &ScreenSnapshot, action: NavigationAction) -> (Point, Point, u64) {
    let width = snapshot.screen_size.width as i32;
    let height = snapshot.screen_size.height as i32;
    let insets = snapshot.system_insets;
    let bottom_start = height - (insets.bottom as i32 / 2).max(GESTURE_EDGE_OFFSET_PX);
    let center_x = width / 2;

    match action {
        NavigationAction::Home => (
            Point { x: center_x, y: bottom_start },
            Point { x: center_x, y: height * 2 / 5 },
            HOME_GESTURE_DURATION_MS,
        ),
        NavigationAction::RecentApps => (
            Point { x: center_x, y: bottom_start },
            Point { x: center_x, y: height * 3 / 5 },
            RECENTS_GESTURE_DURATION_MS,
        ),
        NavigationAction::Back => (
            Point { x: (insets.left as i32).max(1), y: height / 2 },
            Point { x: width / 3, y: height / 2 },
            BACK_GESTURE_DURATION_MS,
        ),
    }
}

/// Taps the matching button of an on-screen navigation bar.
pub struct ElementNavigation;

#[async_trait]
impl NavigationStrategy for ElementNavigation {
    fn method(&self) -> NavigationMethod {
        NavigationMethod::Element
    }

    async fn attempt(&self, ctx: &NavigationContext<'_>, action: NavigationAction) -> Result<()> {
        let snapshot = ctx.reader.capture(CaptureOptions::cached()).await?;
        let point = find_navigation_button(&snapshot, action)?.ok_or_else(|| {
            MobileError::not_found(format!("{} button in navigation bar", action), Vec::new())
        })?;
        ctx.synthesizer.tap(point).await
    }
}

/// Center of a clickable `action` button inside a navigation-bar container. The
/// resource id and the class name must both match; OEMs reuse ids like `home` for
/// unrelated widgets.
pub fn find_navigation_button(
    snapshot: &ScreenSnapshot,
    action: NavigationAction,
) -> Result<Option<Point>> {
    let index = ElementIndex::new(snapshot)?;
    let fragment = button_id_fragment(action);

    let found = index
        .elements()
        .iter()
        .filter(|entry| {
            entry
                .element
                .resource_id
                .as_deref()
                .is_some_and(|id| NAVIGATION_BAR_IDS.iter().any(|bar| id.to_lowercase().contains(bar)))
        })
        .flat_map(|bar| index.descendants(bar).iter())
        .find(|entry| {
            let element = entry.element;
            element.clickable
                && element
                    .resource_id
                    .as_deref()
                    .is_some_and(|id| id.to_lowercase().contains(fragment))
                && NAVIGATION_BUTTON_CLASSES
                    .iter()
                    .any(|class| element.class_name.ends_with(class))
        });

    Ok(found.map(|entry| entry.center()))
}

fn button_id_fragment(action: NavigationAction) -> &'static str {
    match action {
        NavigationAction::Home => "home",
        NavigationAction::RecentApps => "recent_apps",
        NavigationAction::Back => "back",
    }
}

/// Fixed key events. The fallback of last resort.
pub struct HardwareNavigation;

#[async_trait]
impl NavigationStrategy for HardwareNavigation {
    fn method(&self) -> NavigationMethod {
        NavigationMethod::Hardware
    }

    async fn attempt(&self, ctx: &NavigationContext<'_>, action: NavigationAction) -> Result<()> {
        let keycode = match action {
            NavigationAction::Home => commands::KEYCODE_HOME,
            NavigationAction::RecentApps => commands::KEYCODE_APP_SWITCH,
            NavigationAction::Back => commands::KEYCODE_BACK,
        };
        tracing::info!(device = ctx.channel.device_id(), keycode, action = %action, "hardware key");
        ctx.channel.shell(&commands::keyevent(keycode)).await?;
        Ok(())
    }
}
