pub mod hierarchy;
pub mod reader;
pub mod snapshot;

pub use reader::{CaptureOptions, SnapshotReader};
pub use snapshot::{Bounds, ElementNode, Point, ScreenSize, ScreenSnapshot, SystemInsets};
