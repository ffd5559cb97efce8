pub mod handle;
pub mod stack;

pub use handle::RawStackHandle;
pub use stack::{DeviceStack, DrainLifo};
