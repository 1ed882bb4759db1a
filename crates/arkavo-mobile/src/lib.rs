pub mod config;
pub mod device;
pub mod element;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod navigation;
pub mod observe;
pub mod result;
pub mod stability;
pub mod verify;

pub use config::EngineConfig;
pub use device::{AdbChannel, ChannelCapabilities, DeviceChannel};
pub use element::{Target, TargetDescriptor};
pub use engine::{MobileEngine, TapAction};
pub use error::{MobileError, Result};
pub use gesture::{GestureOptions, PinchDirection, ScrollDirection, SwipeDirection};
pub use navigation::{NavigationAction, NavigationCache, NavigationMethod};
pub use observe::{Bounds, ElementNode, Point, ScreenSnapshot};
pub use result::ActionResult;
pub use verify::{VerificationLoop, VerificationOutcome, VerifyOptions};
