use crate::observe::Point;
use crate::{MobileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Smallest pinch span in pixels; keeps the short end of a pinch from collapsing to zero.
pub const PINCH_MIN_MAGNITUDE: f64 = 50.0;
/// Short end of a pinch relative to its long end.
pub const PINCH_START_SCALE: f64 = 0.3;

pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;
pub const DEFAULT_PATH_STEPS: usize = 10;
/// Largest offset, in pixels, applied to intermediate points when randomizing.
pub const RANDOMIZE_JITTER_PX: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    AccelerateDecelerate,
}

impl Easing {
    /// Fraction of distance covered at time fraction `t` (both in `0.0..=1.0`).
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::AccelerateDecelerate => ((t + 1.0) * std::f64::consts::PI).cos() / 2.0 + 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: i32,
    pub y: i32,
    /// Milliseconds since the gesture started.
    pub offset_ms: Option<u64>,
}

impl PathPoint {
    pub fn at(point: Point, offset_ms: Option<u64>) -> Self {
        Self {
            x: point.x,
            y: point.y,
            offset_ms,
        }
    }

    pub fn point(&self) -> Point {
        Point { x: self.x, y: self.y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerPath {
    pub finger: u32,
    pub points: Vec<PathPoint>,
}

impl FingerPath {
    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureOptions {
    pub duration_ms: u64,
    pub easing: Easing,
    pub randomize: bool,
    /// Release the finger at the end of the path.
    pub lift: bool,
    pub pressure: f32,
    /// Points per finger path, endpoints included.
    pub steps: usize,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_SWIPE_DURATION_MS,
            easing: Easing::Linear,
            randomize: false,
            lift: true,
            pressure: 1.0,
            steps: 2,
        }
    }
}

impl GestureOptions {
    pub fn with_duration(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    /// True when a plain two-point swipe cannot express these options.
    pub fn needs_path(&self) -> bool {
        self.steps > 2 || self.easing != Easing::Linear || self.randomize || !self.lift
    }
}

/// One multi-touch action: every finger path shares the same total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSpec {
    pub paths: Vec<FingerPath>,
    pub duration_ms: u64,
    pub easing: Easing,
    pub fingers: usize,
    pub randomize: bool,
    pub lift: bool,
    pub pressure: f32,
}

impl GestureSpec {
    pub fn new(paths: Vec<FingerPath>, options: &GestureOptions) -> Result<Self> {
        if paths.is_empty() {
            return Err(MobileError::InvalidTarget("gesture has no finger paths".to_string()));
        }

        let mut fingers = HashSet::new();
        for path in &paths {
            if !fingers.insert(path.finger) {
                return Err(MobileError::InvalidTarget(format!(
                    "finger {} appears twice in one gesture",
                    path.finger
                )));
            }
            if path.points.len() < 2 {
                return Err(MobileError::InvalidTarget(format!(
                    "finger {} needs at least two points",
                    path.finger
                )));
            }
            if path
                .points
                .iter()
                .any(|p| p.offset_ms.is_some_and(|offset| offset > options.duration_ms))
            {
                return Err(MobileError::InvalidTarget(format!(
                    "finger {} has a point past the gesture duration",
                    path.finger
                )));
            }
        }

        Ok(Self {
            fingers: paths.len(),
            paths,
            duration_ms: options.duration_ms,
            easing: options.easing,
            randomize: options.randomize,
            lift: options.lift,
            pressure: options.pressure,
        })
    }

    /// Single-finger gesture between two points, sampled per the options.
    pub fn swipe(from: Point, to: Point, options: &GestureOptions) -> Result<Self> {
        let points = interpolate(from, to, options.steps, options.duration_ms, options.easing);
        Self::new(vec![FingerPath { finger: 0, points }], options)
    }

    /// Two vertical finger paths mirrored around `center`.
    pub fn pinch(
        center: Point,
        direction: PinchDirection,
        magnitude: f64,
        duration_ms: u64,
    ) -> Result<Self> {
        let (starting, ending) = pinch_magnitudes(direction, magnitude);
        let half = |span: f64| (span / 2.0).round() as i32;
        let finger = |finger: u32, sign: i32| FingerPath {
            finger,
            points: vec![
                PathPoint {
                    x: center.x,
                    y: center.y + sign * half(starting),
                    offset_ms: Some(0),
                },
                PathPoint {
                    x: center.x,
                    y: center.y + sign * half(ending),
                    offset_ms: Some(duration_ms),
                },
            ],
        };

        Self::new(
            vec![finger(0, -1), finger(1, 1)],
            &GestureOptions::with_duration(duration_ms),
        )
    }
}

/// `(starting, ending)` spans. Pinching out grows from the floored short span to the
/// requested magnitude; pinching in runs the other way.
pub fn pinch_magnitudes(direction: PinchDirection, magnitude: f64) -> (f64, f64) {
    let short = PINCH_MIN_MAGNITUDE.max(magnitude * PINCH_START_SCALE);
    match direction {
        PinchDirection::Out => (short, magnitude),
        PinchDirection::In => (magnitude, short),
    }
}

/// `steps` points from `from` to `to` at equal time intervals, positioned by `easing`.
pub fn interpolate(
    from: Point,
    to: Point,
    steps: usize,
    duration_ms: u64,
    easing: Easing,
) -> Vec<PathPoint> {
    let steps = steps.max(2);
    (0..steps)
        .map(|i| {
            let t = i as f64 / (steps - 1) as f64;
            let progress = easing.apply(t);
            let lerp = |a: i32, b: i32| a + ((b - a) as f64 * progress).round() as i32;
            PathPoint {
                x: lerp(from.x, to.x),
                y: lerp(from.y, to.y),
                offset_ms: Some((duration_ms as f64 * t).round() as u64),
            }
        })
        .collect()
}
