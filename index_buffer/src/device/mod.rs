/// Device module - the stateful graphics device and the context that owns it

pub mod graphics_device;
pub mod context;
pub mod binding;

pub use graphics_device::*;
pub use context::*;
pub use binding::IndexBinding;
pub(crate) use binding::BindGuard;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
