use crate::config::EngineConfig;
use crate::device::{AdbChannel, DeviceChannel, commands};
use crate::element::{ElementIndex, IndexedElement, ResolvedTarget, TargetDescriptor, locate, validate_text};
use crate::gesture::synthesizer::{DEFAULT_LONG_PRESS_MS, FLING_DURATION_MS};
use crate::gesture::{
    GestureOptions, GestureSpec, GestureSynthesizer, PinchDirection, ScrollDirection,
    SwipeDirection, content_area, swipe_within,
};
use crate::navigation::{NavigationAction, NavigationCache, NavigationContext, NavigationResolver};
use crate::observe::{Bounds, CaptureOptions, Point, ScreenSnapshot, SnapshotReader};
use crate::result::ActionResult;
use crate::stability::{StabilityMonitor, StabilityReport};
use crate::verify::VerificationLoop;
use crate::{MobileError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Pause between focus re-checks. Focus moves asynchronously after a tap; tapping again
/// would toggle some widgets.
pub const FOCUS_RECHECK_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_PINCH_DURATION_MS: u64 = 500;
pub const DEFAULT_DRAG_DURATION_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TapAction {
    Tap,
    DoubleTap,
    LongPress { duration_ms: u64 },
}

impl TapAction {
    pub fn long_press() -> Self {
        TapAction::LongPress {
            duration_ms: DEFAULT_LONG_PRESS_MS,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TapAction::Tap => "tap",
            TapAction::DoubleTap => "double_tap",
            TapAction::LongPress { .. } => "long_press",
        }
    }
}

/// Keycode for a hardware button name, e.g. `volume_up` or `app_switch`.
pub fn button_keycode(name: &str) -> Option<u32> {
    let keycode = match name.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
        "home" => commands::KEYCODE_HOME,
        "back" => commands::KEYCODE_BACK,
        "menu" => commands::KEYCODE_MENU,
        "power" => commands::KEYCODE_POWER,
        "volume_up" => commands::KEYCODE_VOLUME_UP,
        "volume_down" => commands::KEYCODE_VOLUME_DOWN,
        "enter" => commands::KEYCODE_ENTER,
        "app_switch" | "recent_apps" => commands::KEYCODE_APP_SWITCH,
        _ => return None,
    };
    Some(keycode)
}

/// One device, driven one operation at a time.
///
/// Operations queue on a fair lock, so they reach the device in the order they were
/// requested. Failures become `success: false` results; only an unreachable device is
/// returned as `Err`.
pub struct MobileEngine {
    config: EngineConfig,
    channel: Arc<dyn DeviceChannel>,
    reader: Arc<SnapshotReader>,
    monitor: Arc<StabilityMonitor>,
    synthesizer: GestureSynthesizer,
    resolver: NavigationResolver,
    verifier: VerificationLoop,
    operation_lock: Mutex<()>,
}

impl MobileEngine {
    pub fn new(config: EngineConfig, channel: Arc<dyn DeviceChannel>) -> Self {
        let cache = Arc::new(NavigationCache::new(config.navigation_cache_duration));
        Self::with_navigation_cache(config, channel, cache)
    }

    /// Engines for different devices may share one cache; entries are keyed by device id.
    pub fn with_navigation_cache(
        config: EngineConfig,
        channel: Arc<dyn DeviceChannel>,
        cache: Arc<NavigationCache>,
    ) -> Self {
        let reader = Arc::new(SnapshotReader::new(
            channel.clone(),
            config.screenshot_dir.clone(),
            config.snapshot_cache_ttl,
        ));
        let monitor = Arc::new(StabilityMonitor::new(
            channel.clone(),
            reader.clone(),
            config.idle_timeout,
            config.stability_poll_interval,
        ));

        Self {
            synthesizer: GestureSynthesizer::new(channel.clone(), monitor.clone()),
            resolver: NavigationResolver::new(cache),
            verifier: VerificationLoop::new(reader.clone()),
            config,
            channel,
            reader,
            monitor,
            operation_lock: Mutex::new(()),
        }
    }

    /// Engine over `adb -s <serial>`.
    pub fn connect(config: EngineConfig, serial: impl Into<String>) -> Self {
        let channel = AdbChannel::new(config.adb_path.clone(), serial)
            .with_motion_events(config.motion_events);
        Self::new(config, Arc::new(channel))
    }

    pub fn device_id(&self) -> &str {
        self.channel.device_id()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn navigation_cache(&self) -> &Arc<NavigationCache> {
        self.resolver.cache()
    }

    pub async fn observe(&self, include_screenshot: bool) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.observe_inner(include_screenshot).await;
        self.finish("observe", outcome)
    }

    pub async fn tap_on(
        &self,
        target: &TargetDescriptor,
        action: TapAction,
        expected_text: Option<&str>,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.tap_on_inner(target, action, expected_text).await;
        self.finish(action.as_str(), outcome)
    }

    /// Taps the element with `resource_id` unless it already has focus, then confirms
    /// focus actually moved.
    pub async fn focus_on(&self, resource_id: &str) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.focus_on_inner(resource_id).await;
        self.finish("focus", outcome)
    }

    /// Types `text`, first tapping `target` when one is given.
    pub async fn input_text(&self, text: &str, target: Option<&TargetDescriptor>) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.input_text_inner(text, target).await;
        self.finish("input_text", outcome)
    }

    pub async fn swipe(&self, from: Point, to: Point, options: GestureOptions) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.swipe_inner(from, to, options).await;
        self.finish("swipe", outcome)
    }

    /// Swipes across the area not covered by system bars.
    pub async fn swipe_on_screen(
        &self,
        direction: SwipeDirection,
        options: GestureOptions,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.swipe_on_screen_inner(direction, options).await;
        self.finish("swipe_on_screen", outcome)
    }

    pub async fn fling(&self, direction: SwipeDirection) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self
            .swipe_on_screen_inner(direction, GestureOptions::with_duration(FLING_DURATION_MS))
            .await;
        self.finish("fling", outcome)
    }

    /// Scrolls the scrollable container `container` (or the first one on screen).
    pub async fn scroll(
        &self,
        container: Option<&str>,
        direction: ScrollDirection,
        options: GestureOptions,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.scroll_inner(container, direction, options).await;
        self.finish("scroll", outcome)
    }

    /// Scrolls until an element labelled `text` (substring, case-insensitive) shows up
    /// inside the scrolled container, at most `max_scrolls` times.
    pub async fn scroll_until_visible(
        &self,
        text: &str,
        container: Option<&str>,
        direction: ScrollDirection,
        max_scrolls: Option<u32>,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self
            .scroll_until_visible_inner(text, container, direction, max_scrolls)
            .await;
        self.finish("scroll_until_visible", outcome)
    }

    /// Pinches around `target`, or around the middle of the content area.
    pub async fn pinch_on(
        &self,
        target: Option<&TargetDescriptor>,
        direction: PinchDirection,
        magnitude: f64,
        duration_ms: Option<u64>,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self
            .pinch_on_inner(target, direction, magnitude, duration_ms.unwrap_or(DEFAULT_PINCH_DURATION_MS))
            .await;
        self.finish("pinch", outcome)
    }

    pub async fn drag_and_drop(
        &self,
        from: &TargetDescriptor,
        to: &TargetDescriptor,
        duration_ms: Option<u64>,
    ) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self
            .drag_and_drop_inner(from, to, duration_ms.unwrap_or(DEFAULT_DRAG_DURATION_MS))
            .await;
        self.finish("drag_and_drop", outcome)
    }

    pub async fn navigate(&self, action: NavigationAction) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.navigate_inner(action).await;
        self.finish(action.as_str(), outcome)
    }

    pub async fn go_home(&self) -> Result<ActionResult> {
        self.navigate(NavigationAction::Home).await
    }

    pub async fn recent_apps(&self) -> Result<ActionResult> {
        self.navigate(NavigationAction::RecentApps).await
    }

    pub async fn back(&self) -> Result<ActionResult> {
        self.navigate(NavigationAction::Back).await
    }

    pub async fn press_button(&self, name: &str) -> Result<ActionResult> {
        let _guard = self.operation_lock.lock().await;
        let outcome = self.press_button_inner(name).await;
        self.finish("press_button", outcome)
    }

    async fn observe_inner(&self, include_screenshot: bool) -> Result<ActionResult> {
        let snapshot = self
            .reader
            .capture(CaptureOptions {
                include_tree: true,
                include_screenshot,
                use_cache: false,
            })
            .await?;
        let element_count = ElementIndex::new(&snapshot)?.len();

        let mut result = ActionResult::success(snapshot.clone()).with("element_count", element_count);
        if let Some(path) = &snapshot.screenshot_path {
            result = result.with("screenshot_path", path.display().to_string());
        }
        Ok(result)
    }

    async fn tap_on_inner(
        &self,
        target: &TargetDescriptor,
        action: TapAction,
        expected_text: Option<&str>,
    ) -> Result<ActionResult> {
        let target = target.resolve()?;
        let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
        let resolved = locate(&snapshot, &target)?;

        if let Some(expected) = expected_text {
            let mismatch = {
                let index = ElementIndex::new(&snapshot)?;
                let element = match resolved.index {
                    Some(i) => index.find_by_index(i as i64),
                    None => element_at(&index, resolved.point),
                };
                (!element.is_some_and(|e| validate_text(e, Some(expected))))
                    .then(|| element.and_then(|e| e.text).unwrap_or_default().to_string())
            };
            if let Some(found) = mismatch {
                return Ok(ActionResult::unmet(
                    "TEXT_MISMATCH",
                    format!("Expected text '{}' at {}, found '{}'", expected, target.describe(), found),
                    Some(snapshot),
                )
                .with("expected_text", expected)
                .with("found_text", found));
            }
        }

        self.monitor.initialize_ui_stability_tracking().await?;
        let point = resolved.point;
        match action {
            TapAction::Tap => self.synthesizer.tap(point).await?,
            TapAction::DoubleTap => self.synthesizer.double_tap(point).await?,
            TapAction::LongPress { duration_ms } => self.synthesizer.long_press(point, duration_ms).await?,
        }

        let (report, observation) = self.settle().await?;
        Ok(target_details(ActionResult::success(observation), &resolved)
            .with("action", action.as_str())
            .with("stability", stability_json(&report)))
    }

    async fn focus_on_inner(&self, resource_id: &str) -> Result<ActionResult> {
        let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
        let (point, was_focused) = {
            let index = ElementIndex::new(&snapshot)?;
            let element = index
                .find_by_resource_id(resource_id, false, None)
                .into_iter()
                .next()
                .ok_or_else(|| index.not_found(format!("resource id '{}'", resource_id)))?;
            (element.center(), element.element.is_focused())
        };

        if was_focused {
            tracing::debug!(device = self.device_id(), resource_id, "element already focused");
            return Ok(ActionResult::success(snapshot)
                .with("was_already_focused", true)
                .with("focus_changed", false)
                .with("x", point.x)
                .with("y", point.y));
        }

        self.monitor.initialize_ui_stability_tracking().await?;
        self.synthesizer.tap(point).await?;
        self.reader.invalidate().await;

        let has_focus = |snapshot: &ScreenSnapshot| -> Result<bool> {
            let index = ElementIndex::new(snapshot)?;
            Ok(index
                .find_by_resource_id(resource_id, false, None)
                .first()
                .is_some_and(|e| e.element.is_focused()))
        };
        let outcome = self
            .verifier
            .verify(
                has_focus,
                |_| async {
                    tokio::time::sleep(FOCUS_RECHECK_DELAY).await;
                    Ok(())
                },
                self.config.verify_options(),
            )
            .await?;

        let result = if outcome.achieved {
            // Focus usually brings up the keyboard; report the layout once it has settled.
            let (report, observation) = self.settle().await?;
            ActionResult::success(observation).with("stability", stability_json(&report))
        } else {
            ActionResult::unmet(
                "FOCUS_NOT_ACQUIRED",
                format!("'{}' did not take focus after {} checks", resource_id, outcome.attempts),
                outcome.snapshot,
            )
        };

        Ok(result
            .with("was_already_focused", false)
            .with("focus_changed", outcome.achieved)
            .with("attempts", outcome.attempts)
            .with("x", point.x)
            .with("y", point.y))
    }

    async fn input_text_inner(&self, text: &str, target: Option<&TargetDescriptor>) -> Result<ActionResult> {
        let resolved = match target {
            Some(descriptor) => {
                let target = descriptor.resolve()?;
                let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
                let resolved = locate(&snapshot, &target)?;
                self.monitor.initialize_ui_stability_tracking().await?;
                self.synthesizer.tap(resolved.point).await?;
                Some(resolved)
            }
            None => {
                self.monitor.initialize_ui_stability_tracking().await?;
                None
            }
        };

        tracing::info!(device = self.device_id(), chars = text.chars().count(), "input text");
        self.channel.shell(&commands::input_text(text)).await?;

        let (report, observation) = self.settle().await?;
        let mut result = ActionResult::success(observation)
            .with("text", text)
            .with("stability", stability_json(&report));
        if let Some(resolved) = &resolved {
            result = target_details(result, resolved);
        }
        Ok(result)
    }

    async fn swipe_inner(&self, from: Point, to: Point, options: GestureOptions) -> Result<ActionResult> {
        self.monitor.initialize_ui_stability_tracking().await?;
        let spec = self.synthesizer.swipe(from, to, &options).await?;
        self.gesture_result(&spec).await
    }

    async fn swipe_on_screen_inner(
        &self,
        direction: SwipeDirection,
        options: GestureOptions,
    ) -> Result<ActionResult> {
        let snapshot = self.reader.capture(CaptureOptions::cached()).await?;
        let area = content_area(snapshot.screen_size, snapshot.system_insets);
        let (from, to) = swipe_within(area, direction);

        self.monitor.initialize_ui_stability_tracking().await?;
        let spec = self.synthesizer.swipe(from, to, &options).await?;
        Ok(self.gesture_result(&spec).await?.with("direction", json!(direction)))
    }

    async fn scroll_inner(
        &self,
        container: Option<&str>,
        direction: ScrollDirection,
        options: GestureOptions,
    ) -> Result<ActionResult> {
        let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
        let bounds = scroll_container(&snapshot, container)?;

        self.monitor.initialize_ui_stability_tracking().await?;
        let spec = self.synthesizer.scroll_within(bounds, direction, &options).await?;
        Ok(self
            .gesture_result(&spec)
            .await?
            .with("direction", json!(direction))
            .with("container", bounds.to_string()))
    }

    async fn scroll_until_visible_inner(
        &self,
        text: &str,
        container: Option<&str>,
        direction: ScrollDirection,
        max_scrolls: Option<u32>,
    ) -> Result<ActionResult> {
        let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
        let bounds = scroll_container(&snapshot, container)?;
        let mut options = self.config.verify_options();
        if let Some(max_scrolls) = max_scrolls {
            options.retry_count = max_scrolls;
        }

        let synthesizer = &self.synthesizer;
        let gesture = GestureOptions::default();
        let outcome = self
            .verifier
            .verify(
                |snapshot| visible_text(snapshot, text, container).map(|found| found.is_some()),
                move |attempt| async move {
                    tracing::debug!(attempt, "scrolling for more content");
                    synthesizer.scroll_within(bounds, direction, &gesture).await.map(|_| ())
                },
                options,
            )
            .await?;

        let found = match &outcome.snapshot {
            Some(snapshot) if outcome.achieved => visible_text(snapshot, text, container)?,
            _ => None,
        };

        let result = match (found, outcome.snapshot) {
            (Some(point), Some(snapshot)) => ActionResult::success(snapshot)
                .with("x", point.x)
                .with("y", point.y),
            (_, snapshot) => ActionResult::unmet(
                "TEXT_NOT_VISIBLE",
                format!("'{}' not visible after {} checks", text, outcome.attempts),
                snapshot,
            ),
        };
        Ok(result
            .with("attempts", outcome.attempts)
            .with("direction", json!(direction)))
    }

    async fn pinch_on_inner(
        &self,
        target: Option<&TargetDescriptor>,
        direction: PinchDirection,
        magnitude: f64,
        duration_ms: u64,
    ) -> Result<ActionResult> {
        let center = match target {
            Some(descriptor) => {
                let target = descriptor.resolve()?;
                let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
                locate(&snapshot, &target)?.point
            }
            None => {
                let snapshot = self.reader.capture(CaptureOptions::cached()).await?;
                content_area(snapshot.screen_size, snapshot.system_insets).center()
            }
        };

        self.monitor.initialize_ui_stability_tracking().await?;
        let spec = self
            .synthesizer
            .pinch(center, direction, magnitude, duration_ms)
            .await?;
        Ok(self
            .gesture_result(&spec)
            .await?
            .with("direction", json!(direction))
            .with("x", center.x)
            .with("y", center.y))
    }

    async fn drag_and_drop_inner(
        &self,
        from: &TargetDescriptor,
        to: &TargetDescriptor,
        duration_ms: u64,
    ) -> Result<ActionResult> {
        let (from_target, to_target) = (from.resolve()?, to.resolve()?);
        let snapshot = self.reader.capture(CaptureOptions::fresh()).await?;
        let source = locate(&snapshot, &from_target)?;
        let destination = locate(&snapshot, &to_target)?;

        self.monitor.initialize_ui_stability_tracking().await?;
        let spec = self
            .synthesizer
            .swipe(
                source.point,
                destination.point,
                &GestureOptions::with_duration(duration_ms),
            )
            .await?;
        Ok(self
            .gesture_result(&spec)
            .await?
            .with("from", json!(source.point))
            .with("to", json!(destination.point)))
    }

    async fn navigate_inner(&self, action: NavigationAction) -> Result<ActionResult> {
        self.monitor.initialize_ui_stability_tracking().await?;
        let ctx = NavigationContext {
            channel: self.channel.as_ref(),
            reader: self.reader.as_ref(),
            synthesizer: &self.synthesizer,
        };
        let outcome = self.resolver.navigate(&ctx, action).await?;

        let (report, observation) = self.settle().await?;
        Ok(ActionResult::success(observation)
            .with("action", action.as_str())
            .with("method", outcome.method.as_str())
            .with("from_cache", outcome.from_cache)
            .with("fallbacks", json!(outcome.fallbacks))
            .with("stability", stability_json(&report)))
    }

    async fn press_button_inner(&self, name: &str) -> Result<ActionResult> {
        let keycode = button_keycode(name)
            .ok_or_else(|| MobileError::InvalidTarget(format!("unknown button '{}'", name)))?;

        self.monitor.initialize_ui_stability_tracking().await?;
        tracing::info!(device = self.device_id(), button = name, keycode, "press button");
        self.channel.shell(&commands::keyevent(keycode)).await?;

        let (report, observation) = self.settle().await?;
        Ok(ActionResult::success(observation)
            .with("button", name)
            .with("keycode", keycode)
            .with("stability", stability_json(&report)))
    }

    async fn gesture_result(&self, spec: &GestureSpec) -> Result<ActionResult> {
        let (report, observation) = self.settle().await?;
        Ok(ActionResult::success(observation)
            .with("fingers", spec.fingers)
            .with("duration_ms", spec.duration_ms)
            .with("paths", json!(spec.paths))
            .with("stability", stability_json(&report)))
    }

    /// Waits for the layout to settle after an action and returns the final observation.
    async fn settle(&self) -> Result<(StabilityReport, Arc<ScreenSnapshot>)> {
        self.reader.invalidate().await;
        let report = self
            .monitor
            .wait_for_ui_stability(self.config.stability_max_wait)
            .await?;
        let observation = self.reader.capture(CaptureOptions::cached()).await?;
        Ok((report, observation))
    }

    fn finish(&self, operation: &str, outcome: Result<ActionResult>) -> Result<ActionResult> {
        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_fatal() => {
                tracing::error!(device = self.device_id(), operation, error = %e, "device unreachable");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(device = self.device_id(), operation, code = e.code(), error = %e, "operation failed");
                Ok(ActionResult::failure(&e))
            }
        }
    }
}

fn target_details(result: ActionResult, resolved: &ResolvedTarget) -> ActionResult {
    let mut result = result.with("x", resolved.point.x).with("y", resolved.point.y);
    if let Some(index) = resolved.index {
        result = result.with("index", index);
    }
    if let Some(text) = &resolved.text {
        result = result.with("text", text.as_str());
    }
    if let Some(id) = &resolved.resource_id {
        result = result.with("resource_id", id.as_str());
    }
    result
}

fn stability_json(report: &StabilityReport) -> serde_json::Value {
    json!(report)
}

/// Deepest indexed element whose bounds contain `point`.
fn element_at<'i, 'a>(index: &'i ElementIndex<'a>, point: Point) -> Option<&'i IndexedElement<'a>> {
    index
        .elements()
        .iter()
        .rev()
        .find(|e| e.bounds.contains_point(point))
}

/// The scrollable element a scroll acts on: `container` when it scrolls, its first
/// scrollable descendant, or `container` itself as a last resort.
fn scroll_scope<'i, 'a>(
    index: &'i ElementIndex<'a>,
    container: Option<&str>,
) -> Option<&'i IndexedElement<'a>> {
    index.find_scrollable(container).or_else(|| {
        container.and_then(|id| index.find_by_resource_id(id, false, None).into_iter().next())
    })
}

fn scroll_container(snapshot: &ScreenSnapshot, container: Option<&str>) -> Result<Bounds> {
    let index = ElementIndex::new(snapshot)?;
    scroll_scope(&index, container).map(|e| e.bounds).ok_or_else(|| {
        let description = match (container, index.scope_problem(container)) {
            (Some(_), Some(problem)) => format!("scrollable container ({})", problem),
            (Some(id), None) => format!("scrollable container '{}'", id),
            (None, _) => "scrollable container".to_string(),
        };
        index.not_found(description)
    })
}

/// Center of the first label containing `text` inside the scrolled container.
fn visible_text(snapshot: &ScreenSnapshot, text: &str, container: Option<&str>) -> Result<Option<Point>> {
    let index = ElementIndex::new(snapshot)?;
    Ok(scroll_scope(&index, container)
        .and_then(|scope| index.find_text_within(scope, text, true, false))
        .map(|e| e.center()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_names() {
        assert_eq!(button_keycode("home"), Some(3));
        assert_eq!(button_keycode("Volume Up"), Some(24));
        assert_eq!(button_keycode("volume-down"), Some(25));
        assert_eq!(button_keycode("app_switch"), Some(187));
        assert_eq!(button_keycode("eject"), None);
    }

    #[test]
    fn test_tap_action_from_json() {
        let action: TapAction = serde_json::from_str(r#"{"kind": "long_press", "duration_ms": 1500}"#).unwrap();
        assert_eq!(action, TapAction::LongPress { duration_ms: 1500 });
        assert_eq!(TapAction::long_press(), TapAction::LongPress { duration_ms: 1000 });
    }
}
