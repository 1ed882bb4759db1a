pub mod index;
pub mod target;

pub use index::{ElementIndex, IndexedElement, center, flatten, validate_text};
pub use target::{ResolvedTarget, Target, TargetDescriptor, locate};
