pub mod spec;
pub mod synthesizer;

pub use spec::{
    Easing, FingerPath, GestureOptions, GestureSpec, PathPoint, PinchDirection,
    pinch_magnitudes,
};
pub use synthesizer::{
    GestureSynthesizer, ScrollDirection, SwipeDirection, content_area, swipe_within,
};
