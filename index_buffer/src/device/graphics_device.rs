/// GraphicsDevice trait - the stateful device interface index buffers drive
///
/// The device follows the classic bind-then-operate model: buffers are
/// attached to a binding target, and data calls act on whatever buffer is
/// currently bound to that target.

use std::num::NonZeroU32;
use crate::error::Result;

/// Opaque device buffer identifier
///
/// Zero is reserved by devices to mean "no buffer", so a handle is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(NonZeroU32);

impl BufferHandle {
    /// Wrap a raw device name, `None` for zero
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw device name
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Buffer binding targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// The global index buffer slot read by indexed draws
    ElementArray,
    /// Source slot of a device-side copy
    CopyRead,
    /// Destination slot of a device-side copy
    CopyWrite,
}

impl BufferTarget {
    /// All targets, in a stable order
    pub const ALL: [BufferTarget; 3] = [
        BufferTarget::ElementArray,
        BufferTarget::CopyRead,
        BufferTarget::CopyWrite,
    ];
}

/// Allocation hint describing how often the contents will be written
///
/// If data is updated once or more every frame, use `Stream`. If data is set
/// once and drawn many times, use `Static`. `Dynamic` covers everything in
/// between. The hint never changes correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Constantly changing data
    #[default]
    Stream,
    /// Occasionally changing data
    Dynamic,
    /// Rarely changing data
    Static,
}

/// Access mode for mapping buffer storage into process memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAccess {
    ReadOnly,
    WriteOnly,
}

bitflags::bitflags! {
    /// Device features relevant to index buffers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceCapabilities: u32 {
        /// Buffer objects usable as index storage
        const INDEX_BUFFERS = 1 << 0;
        /// Direct device-to-device buffer copies
        const COPY_BUFFER = 1 << 1;
        /// Mapping buffer storage into process memory
        const MAP_BUFFER = 1 << 2;
    }
}

/// Stateful graphics device
///
/// Implemented by backends (e.g., `SoftDevice`). Every call must be made
/// while holding the owning `DeviceContext` lock; the context serializes
/// calls but promises no ordering between threads beyond "writes submitted
/// before a draw are visible to that draw".
pub trait GraphicsDevice: Send {
    /// Report the features this device supports
    ///
    /// Queried once per context and cached.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Generate a new buffer identifier, `None` if the device is out of names
    fn gen_buffer(&mut self) -> Option<BufferHandle>;

    /// Release a buffer identifier and its storage
    ///
    /// Any binding of the buffer is reset to "no buffer".
    fn delete_buffer(&mut self, handle: BufferHandle);

    /// Attach a buffer to a target, or clear the target with `None`
    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<BufferHandle>);

    /// Buffer currently attached to a target
    fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle>;

    /// Replace the storage of the bound buffer with `size` zeroed bytes
    ///
    /// Previous contents are discarded (orphaned).
    fn buffer_data(&mut self, target: BufferTarget, size: u64, usage: BufferUsage) -> Result<()>;

    /// Overwrite `data.len()` bytes of the bound buffer starting at `offset`
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u64, data: &[u8]) -> Result<()>;

    /// Copy `size` bytes between the buffers bound to two targets
    fn copy_buffer_sub_data(
        &mut self,
        read_target: BufferTarget,
        write_target: BufferTarget,
        read_offset: u64,
        write_offset: u64,
        size: u64,
    ) -> Result<()>;

    /// Map the storage of the bound buffer into process memory
    ///
    /// Returns None if mapping failed. The pointer covers the whole buffer
    /// storage and stays valid until the matching `unmap_buffer`.
    fn map_buffer(&mut self, target: BufferTarget, access: MapAccess) -> Option<*mut u8>;

    /// Unmap the bound buffer
    ///
    /// Returns false if the mapped contents were corrupted while mapped.
    fn unmap_buffer(&mut self, target: BufferTarget) -> bool;
}
