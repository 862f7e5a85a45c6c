//! Host-bridge implementations of the core's platform traits.

pub mod fixes;
pub mod logs;
pub mod presence;

pub use fixes::StdinFixSource;
pub use logs::{JsonlCallLogSource, JsonlMessageLogSource};
pub use presence::LockFilePresence;
