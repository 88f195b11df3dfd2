/*!
# Index Buffer

GPU index buffers on top of a stateful, bind-then-operate graphics device.

An `IndexBuffer` owns a device-side array of 32-bit indices. It can be
created with a given capacity, updated in whole or in part, copied from
another index buffer (directly on the device when possible, through mapped
memory otherwise), bound to the device's index slot and released.

## Architecture

- **GraphicsDevice**: Backend trait for the buffer primitives of a device
- **DeviceContext**: Scoped, reentrant per-thread ownership of a device, plus the capability cache
- **IndexBinding**: The device's global index buffer binding point
- **IndexBuffer**: The index buffer resource itself
- **Engine**: Process-wide logger and optional shared device context

Backend crates provide concrete types that implement `GraphicsDevice`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod device;
pub mod resource;

// Error types
pub use error::{Error, Result};

// Engine singleton
pub use engine::Engine;

// Device types most callers need
pub use device::{
    BufferHandle, BufferTarget, BufferUsage, ContextConfig, ContextLock, DeviceCapabilities,
    DeviceContext, GraphicsDevice, IndexBinding, MapAccess,
};

// Resources
pub use resource::IndexBuffer;
