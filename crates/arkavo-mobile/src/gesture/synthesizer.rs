use super::spec::{
    FingerPath, GestureOptions, GestureSpec, PathPoint, PinchDirection, RANDOMIZE_JITTER_PX,
};
use crate::device::commands::{self, MotionAction};
use crate::device::DeviceChannel;
use crate::observe::{Bounds, Point, ScreenSize, SystemInsets};
use crate::stability::StabilityMonitor;
use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LONG_PRESS_MS: u64 = 1000;
pub const FLING_DURATION_MS: u64 = 100;
/// Fraction of a container's extent kept clear at each end of a scroll swipe.
const SCROLL_EDGE_FRACTION: f64 = 0.2;

/// Direction the finger travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Direction the content is scrolled towards. Scrolling down reveals what is below,
/// which means the finger travels up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn finger_direction(self) -> SwipeDirection {
        match self {
            ScrollDirection::Up => SwipeDirection::Down,
            ScrollDirection::Down => SwipeDirection::Up,
            ScrollDirection::Left => SwipeDirection::Right,
            ScrollDirection::Right => SwipeDirection::Left,
        }
    }
}

/// Endpoints of a swipe travelling `direction` across `bounds`, keeping 20% clear at
/// each end and staying on the perpendicular center line.
pub fn swipe_within(bounds: Bounds, direction: SwipeDirection) -> (Point, Point) {
    let center = bounds.center();
    let inset_x = (bounds.width() as f64 * SCROLL_EDGE_FRACTION) as i32;
    let inset_y = (bounds.height() as f64 * SCROLL_EDGE_FRACTION) as i32;
    let (near_top, near_bottom) = (bounds.top + inset_y, bounds.bottom - inset_y);
    let (near_left, near_right) = (bounds.left + inset_x, bounds.right - inset_x);

    match direction {
        SwipeDirection::Up => (
            Point { x: center.x, y: near_bottom },
            Point { x: center.x, y: near_top },
        ),
        SwipeDirection::Down => (
            Point { x: center.x, y: near_top },
            Point { x: center.x, y: near_bottom },
        ),
        SwipeDirection::Left => (
            Point { x: near_right, y: center.y },
            Point { x: near_left, y: center.y },
        ),
        SwipeDirection::Right => (
            Point { x: near_left, y: center.y },
            Point { x: near_right, y: center.y },
        ),
    }
}

/// The part of the screen not covered by system bars.
pub fn content_area(screen: ScreenSize, insets: SystemInsets) -> Bounds {
    let width = screen.width as i32;
    let height = screen.height as i32;
    let left = (insets.left as i32).min(width);
    let top = (insets.top as i32).min(height);
    Bounds {
        left,
        top,
        right: (width - insets.right as i32).max(left),
        bottom: (height - insets.bottom as i32).max(top),
    }
}

/// Issues gestures as primitive touch commands and waits for touch input to go quiet.
pub struct GestureSynthesizer {
    channel: Arc<dyn DeviceChannel>,
    monitor: Arc<StabilityMonitor>,
}

impl GestureSynthesizer {
    pub fn new(channel: Arc<dyn DeviceChannel>, monitor: Arc<StabilityMonitor>) -> Self {
        Self { channel, monitor }
    }

    pub async fn tap(&self, point: Point) -> Result<()> {
        tracing::info!(device = self.channel.device_id(), x = point.x, y = point.y, "tap");
        self.channel.shell(&commands::tap(point.x, point.y)).await?;
        self.monitor.wait_for_touch_idle().await?;
        Ok(())
    }

    /// Both taps go out in one shell invocation so they land inside the double-tap window.
    /// Path-capable channels get raw down/up pairs, which skip the per-tap `input` startup.
    pub async fn double_tap(&self, point: Point) -> Result<()> {
        tracing::info!(device = self.channel.device_id(), x = point.x, y = point.y, "double tap");
        let command = if self.channel.capabilities().path_gestures {
            let (x, y) = (point.x, point.y);
            commands::motion_script(&[
                (MotionAction::Down, x, y, 0),
                (MotionAction::Up, x, y, 0),
                (MotionAction::Down, x, y, 0),
                (MotionAction::Up, x, y, 0),
            ])
        } else {
            let tap = commands::tap(point.x, point.y);
            format!("{}; {}", tap, tap)
        };
        self.channel.shell(&command).await?;
        self.monitor.wait_for_touch_idle().await?;
        Ok(())
    }

    pub async fn long_press(&self, point: Point, duration_ms: u64) -> Result<()> {
        tracing::info!(device = self.channel.device_id(), x = point.x, y = point.y, duration_ms, "long press");
        self.channel
            .shell(&commands::swipe(point.x, point.y, point.x, point.y, duration_ms))
            .await?;
        self.monitor.wait_for_touch_idle().await?;
        Ok(())
    }

    pub async fn swipe(&self, from: Point, to: Point, options: &GestureOptions) -> Result<GestureSpec> {
        let spec = GestureSpec::swipe(from, to, options)?;
        self.perform(&spec).await?;
        Ok(spec)
    }

    pub async fn pinch(
        &self,
        center: Point,
        direction: PinchDirection,
        magnitude: f64,
        duration_ms: u64,
    ) -> Result<GestureSpec> {
        let spec = GestureSpec::pinch(center, direction, magnitude, duration_ms)?;
        self.perform(&spec).await?;
        Ok(spec)
    }

    /// Swipes inside `container` opposite to the requested scroll direction.
    pub async fn scroll_within(
        &self,
        container: Bounds,
        direction: ScrollDirection,
        options: &GestureOptions,
    ) -> Result<GestureSpec> {
        let (from, to) = swipe_within(container, direction.finger_direction());
        self.swipe(from, to, options).await
    }

    /// Issues `spec` using the richest primitive the channel supports.
    pub async fn perform(&self, spec: &GestureSpec) -> Result<()> {
        let spec = if spec.randomize { jitter(spec) } else { spec.clone() };
        let device = self.channel.device_id();

        if spec.pressure != 1.0 {
            tracing::debug!(device, pressure = spec.pressure, "pressure is not adjustable over this channel");
        }

        let capabilities = self.channel.capabilities();
        let command = match spec.paths.as_slice() {
            [path] if capabilities.path_gestures && needs_path(&spec) => {
                motion_command(path, spec.lift)
            }
            [path] => {
                if needs_path(&spec) {
                    tracing::info!(
                        device,
                        points = path.points.len(),
                        lift = spec.lift,
                        "channel only takes two-point swipes; finer path control not applied"
                    );
                }
                let (from, to) = endpoints(path);
                commands::swipe(from.x, from.y, to.x, to.y, spec.duration_ms)
            }
            paths if capabilities.multi_touch => pointer_command(paths, spec.lift),
            paths => {
                tracing::info!(
                    device,
                    fingers = paths.len(),
                    lift = spec.lift,
                    "channel only takes single-pointer swipes; fingers issued as separate concurrent swipes"
                );
                let swipes: Vec<_> = paths
                    .iter()
                    .map(|path| {
                        let (from, to) = endpoints(path);
                        (from.x, from.y, to.x, to.y, spec.duration_ms)
                    })
                    .collect();
                commands::concurrent_swipes(&swipes)
            }
        };

        tracing::info!(device, fingers = spec.fingers, duration_ms = spec.duration_ms, "gesture");
        self.channel.shell(&command).await?;
        self.monitor.wait_for_touch_idle().await?;
        Ok(())
    }
}

fn needs_path(spec: &GestureSpec) -> bool {
    !spec.lift || spec.paths.iter().any(|p| p.points.len() > 2)
}

fn endpoints(path: &FingerPath) -> (Point, Point) {
    let first = path.points.first().map(PathPoint::point).unwrap_or(Point { x: 0, y: 0 });
    let last = path.points.last().map(PathPoint::point).unwrap_or(first);
    (first, last)
}

fn motion_command(path: &FingerPath, lift: bool) -> String {
    let mut steps = Vec::with_capacity(path.points.len() + 1);
    let mut previous_offset = 0;
    for (i, point) in path.points.iter().enumerate() {
        let offset = point.offset_ms.unwrap_or(previous_offset);
        let delay = offset.saturating_sub(previous_offset);
        previous_offset = offset;
        let action = if i == 0 { MotionAction::Down } else { MotionAction::Move };
        steps.push((action, point.x, point.y, delay));
    }
    if lift {
        if let Some(last) = path.points.last() {
            steps.push((MotionAction::Up, last.x, last.y, 0));
        }
    }
    commands::motion_script(&steps)
}

/// All fingers merged into one pointer stream, ordered by time offset. At equal offsets
/// presses come before moves and moves before releases; the first press is `DOWN` and
/// the last release `UP`, everything in between uses the pointer variants.
fn pointer_command(paths: &[FingerPath], lift: bool) -> String {
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Phase {
        Press,
        Move,
        Release,
    }

    let mut events = Vec::new();
    for path in paths {
        let mut offset = 0;
        for (i, point) in path.points.iter().enumerate() {
            offset = point.offset_ms.unwrap_or(offset);
            let phase = if i == 0 { Phase::Press } else { Phase::Move };
            events.push((offset, phase, path.finger, point.x, point.y));
        }
        if lift {
            if let Some(last) = path.points.last() {
                events.push((offset, Phase::Release, path.finger, last.x, last.y));
            }
        }
    }
    events.sort_by_key(|(offset, phase, finger, _, _)| (*offset, *phase, *finger));

    let releases = events.iter().filter(|e| e.1 == Phase::Release).count();
    let mut pressed = 0;
    let mut released = 0;
    let mut previous_offset = 0;
    let steps: Vec<_> = events
        .into_iter()
        .map(|(offset, phase, finger, x, y)| {
            let action = match phase {
                Phase::Press => {
                    pressed += 1;
                    if pressed == 1 { MotionAction::Down } else { MotionAction::PointerDown }
                }
                Phase::Move => MotionAction::Move,
                Phase::Release => {
                    released += 1;
                    if released == releases { MotionAction::Up } else { MotionAction::PointerUp }
                }
            };
            let delay = offset.saturating_sub(previous_offset);
            previous_offset = offset;
            (action, finger, x, y, delay)
        })
        .collect();
    commands::pointer_script(&steps)
}

/// Nudges intermediate points by a couple of pixels; endpoints stay put.
fn jitter(spec: &GestureSpec) -> GestureSpec {
    let mut rng = rand::thread_rng();
    let mut jittered = spec.clone();
    for path in &mut jittered.paths {
        let len = path.points.len();
        for point in path.points.iter_mut().take(len.saturating_sub(1)).skip(1) {
            point.x += rng.gen_range(-RANDOMIZE_JITTER_PX..=RANDOMIZE_JITTER_PX);
            point.y += rng.gen_range(-RANDOMIZE_JITTER_PX..=RANDOMIZE_JITTER_PX);
        }
    }
    jittered
}
