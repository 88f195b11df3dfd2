/// Index buffer - device-resident storage of `u32` vertex indices
///
/// An `IndexBuffer` owns one device buffer identifier and tracks how many
/// indices its storage holds. Data is uploaded once and reused by indexed
/// draws until the next update.
///
/// Update rules (`update_range(indices, count, offset)`):
/// - offset != 0 and offset + count > capacity: fails, nothing is written
/// - offset == 0 and count >= capacity: storage is orphaned and reallocated
///   to exactly `count` indices, then written
/// - otherwise: the region [offset, offset + count) is written in place
///
/// Concurrent updates of disjoint regions are safe and complete in no
/// particular order. Concurrent updates of overlapping regions leave the
/// region in whatever order the device executed them. Either way, every write
/// is visible to the next draw reading the buffer.
///
/// Index data is passed as slices, so a "null" array cannot exist and
/// lengths are checked: asking for more indices than the slice holds is a
/// `PreconditionViolated` error instead of undefined behavior.

use std::mem;
use std::ptr;
use std::sync::Arc;

use crate::device::{
    BindGuard, BufferHandle, BufferTarget, BufferUsage, DeviceCapabilities, DeviceContext,
    MapAccess,
};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};

const SOURCE: &str = "index_buffer::IndexBuffer";

/// Size of one index in bytes
const INDEX_SIZE: u64 = mem::size_of::<u32>() as u64;

/// Report an error to diagnostics and hand it back
fn report(error: Error) -> Error {
    match &error {
        Error::UnsupportedPlatform(_) | Error::PreconditionViolated(_) => {
            engine_warn!(SOURCE, "{}", error);
        }
        _ => {
            engine_error!(SOURCE, "{}", error);
        }
    }
    error
}

/// Size in bytes of `index_count` indices
///
/// Fails when the size does not fit in a device size.
fn byte_len(index_count: usize) -> Result<u64> {
    u64::try_from(index_count)
        .ok()
        .and_then(|count| count.checked_mul(INDEX_SIZE))
        .ok_or_else(|| report(Error::PreconditionViolated(format!(
            "{} indices exceed the largest possible buffer size",
            index_count
        ))))
}

/// Device-resident array of indices
pub struct IndexBuffer {
    context: Arc<DeviceContext>,
    /// Device identifier, None until the first `create`
    handle: Option<BufferHandle>,
    /// Number of indices the current storage holds
    size: usize,
    usage: BufferUsage,
}

impl IndexBuffer {
    /// Create an empty index buffer with `Stream` usage
    ///
    /// No device resource is allocated until `create`.
    pub fn new(context: &Arc<DeviceContext>) -> Self {
        Self::with_usage(context, BufferUsage::Stream)
    }

    /// Create an empty index buffer with a usage hint
    pub fn with_usage(context: &Arc<DeviceContext>, usage: BufferUsage) -> Self {
        Self {
            context: Arc::clone(context),
            handle: None,
            size: 0,
            usage,
        }
    }

    /// Whether the device behind `context` supports index buffers
    ///
    /// Computed once per context, then served from the cache. When this
    /// returns false every other operation fails without touching the device.
    pub fn is_available(context: &DeviceContext) -> bool {
        context.capabilities().contains(DeviceCapabilities::INDEX_BUFFERS)
    }

    /// Bind a buffer to the global index binding point, or clear it with `None`
    ///
    /// Escape hatch for mixing raw device calls with index buffers. Silently
    /// does nothing if index buffers are unavailable. See `IndexBinding` for
    /// the ordering caveats of the shared binding point.
    pub fn bind(context: &DeviceContext, index_buffer: Option<&IndexBuffer>) {
        if !Self::is_available(context) {
            return;
        }
        crate::device::IndexBinding::set(context, index_buffer.and_then(|buffer| buffer.handle));
    }

    /// (Re)allocate storage for `index_count` zeroed indices
    ///
    /// Any previous contents are discarded. An `index_count` of 0 frees the
    /// storage but keeps the identifier; recreate with a non-zero count
    /// before updating again.
    pub fn create(&mut self, index_count: usize) -> Result<()> {
        self.ensure_available()?;
        let size = byte_len(index_count)?;

        let lock = self.context.lock();

        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let generated = lock.device().gen_buffer();
                let handle = generated.ok_or_else(|| report(Error::ResourceExhausted(
                    "Could not create index buffer, generation failed".to_string()
                )))?;
                self.handle = Some(handle);
                handle
            }
        };

        let _binding = BindGuard::bind(&lock, BufferTarget::ElementArray, handle);
        lock.device()
            .buffer_data(BufferTarget::ElementArray, size, self.usage)
            .map_err(report)?;
        self.size = index_count;

        engine_debug!(SOURCE, "Allocated {} indices for buffer {}", index_count, handle.raw());
        Ok(())
    }

    /// Number of indices the buffer holds
    pub fn index_count(&self) -> usize {
        self.size
    }

    /// Overwrite the whole buffer
    ///
    /// `indices` must hold at least `index_count()` values; the first
    /// `index_count()` are written.
    pub fn update(&mut self, indices: &[u32]) -> Result<()> {
        self.update_range(indices, self.size, 0)
    }

    /// Write `index_count` indices from `indices` starting at index `offset`
    ///
    /// See the module documentation for the exact resize policy.
    pub fn update_range(&mut self, indices: &[u32], index_count: usize, offset: usize) -> Result<()> {
        self.ensure_available()?;
        let handle = self.allocated_handle()?;

        if offset != 0 && offset.checked_add(index_count).map_or(true, |end| end > self.size) {
            return Err(report(Error::PreconditionViolated(format!(
                "Region of {} indices at offset {} exceeds capacity {}",
                index_count, offset, self.size
            ))));
        }

        if index_count > indices.len() {
            return Err(report(Error::PreconditionViolated(format!(
                "{} indices requested but only {} provided",
                index_count,
                indices.len()
            ))));
        }

        let size = byte_len(index_count)?;
        let start = byte_len(offset)?;

        let lock = self.context.lock();
        let _binding = BindGuard::bind(&lock, BufferTarget::ElementArray, handle);

        // Orphan the storage when the whole buffer is replaced or grown
        if index_count >= self.size {
            lock.device()
                .buffer_data(BufferTarget::ElementArray, size, self.usage)
                .map_err(report)?;
            self.size = index_count;
        }

        let data: &[u8] = bytemuck::cast_slice(&indices[..index_count]);
        lock.device()
            .buffer_sub_data(BufferTarget::ElementArray, start, data)
            .map_err(report)?;

        Ok(())
    }

    /// Copy the contents of another index buffer into this one
    ///
    /// Both buffers must be allocated on the same context. With device-side
    /// copies available, `other.index_count()` indices are copied directly
    /// and this buffer must already be at least that large. Otherwise this
    /// buffer is reallocated to `other.index_count()` and the data goes
    /// through mapped memory.
    ///
    /// Always fails on devices that cannot map buffers.
    pub fn copy_from(&mut self, other: &IndexBuffer) -> Result<()> {
        self.ensure_available()?;

        let capabilities = self.context.capabilities();
        if !capabilities.contains(DeviceCapabilities::MAP_BUFFER) {
            return Err(report(Error::UnsupportedPlatform(
                "Buffer-to-buffer copy requires buffer mapping".to_string()
            )));
        }

        let destination = self.allocated_handle()?;
        let source = other.allocated_handle()?;

        if !Arc::ptr_eq(&self.context, &other.context) {
            return Err(report(Error::PreconditionViolated(
                "Cannot copy between index buffers of different device contexts".to_string()
            )));
        }

        let copy_size = byte_len(other.size)?;
        let lock = self.context.lock();

        if capabilities.contains(DeviceCapabilities::COPY_BUFFER) {
            if self.size < other.size {
                return Err(report(Error::PreconditionViolated(format!(
                    "Destination holds {} indices, source holds {}",
                    self.size, other.size
                ))));
            }

            let _read = BindGuard::bind(&lock, BufferTarget::CopyRead, source);
            let _write = BindGuard::bind(&lock, BufferTarget::CopyWrite, destination);
            lock.device()
                .copy_buffer_sub_data(
                    BufferTarget::CopyRead,
                    BufferTarget::CopyWrite,
                    0,
                    0,
                    copy_size,
                )
                .map_err(report)?;

            return Ok(());
        }

        let mut binding = BindGuard::bind(&lock, BufferTarget::ElementArray, destination);
        lock.device()
            .buffer_data(BufferTarget::ElementArray, copy_size, self.usage)
            .map_err(report)?;
        self.size = other.size;

        let write_ptr = lock.device().map_buffer(BufferTarget::ElementArray, MapAccess::WriteOnly);
        binding.rebind(source);
        let read_ptr = lock.device().map_buffer(BufferTarget::ElementArray, MapAccess::ReadOnly);

        if let (Some(write_ptr), Some(read_ptr)) = (write_ptr, read_ptr) {
            // SAFETY: both mappings cover whole buffers of at least
            // `other.size` indices and stay valid until unmapped below.
            // They belong to distinct buffers, so they cannot overlap.
            unsafe {
                ptr::copy_nonoverlapping(read_ptr as *const u8, write_ptr, copy_size as usize);
            }
        }

        let source_unmapped = read_ptr.is_some() && lock.device().unmap_buffer(BufferTarget::ElementArray);
        binding.rebind(destination);
        let destination_unmapped = write_ptr.is_some() && lock.device().unmap_buffer(BufferTarget::ElementArray);
        drop(binding);

        if write_ptr.is_none() || read_ptr.is_none() {
            return Err(report(Error::TransferFailed(
                "Could not map index buffers for copying".to_string()
            )));
        }

        if !source_unmapped || !destination_unmapped {
            return Err(report(Error::TransferFailed(
                "Index buffer contents were corrupted while mapped".to_string()
            )));
        }

        Ok(())
    }

    /// Read the buffer contents back into process memory
    ///
    /// Goes through buffer mapping, so it is unavailable on devices that
    /// cannot map buffers.
    pub fn download(&self) -> Result<Vec<u32>> {
        self.ensure_available()?;

        if !self.context.capabilities().contains(DeviceCapabilities::MAP_BUFFER) {
            return Err(report(Error::UnsupportedPlatform(
                "Reading index buffers back requires buffer mapping".to_string()
            )));
        }

        let handle = self.allocated_handle()?;
        let mut indices = vec![0u32; self.size];

        let lock = self.context.lock();
        let _binding = BindGuard::bind(&lock, BufferTarget::ElementArray, handle);

        let read_ptr = lock.device().map_buffer(BufferTarget::ElementArray, MapAccess::ReadOnly)
            .ok_or_else(|| report(Error::TransferFailed(
                "Could not map index buffer for reading".to_string()
            )))?;

        let destination: &mut [u8] = bytemuck::cast_slice_mut(&mut indices);
        // SAFETY: the mapping covers the whole buffer, which holds exactly
        // `self.size` indices, and stays valid until unmapped below.
        unsafe {
            ptr::copy_nonoverlapping(read_ptr as *const u8, destination.as_mut_ptr(), destination.len());
        }

        if !lock.device().unmap_buffer(BufferTarget::ElementArray) {
            return Err(report(Error::TransferFailed(
                "Index buffer contents were corrupted while mapped".to_string()
            )));
        }

        Ok(indices)
    }

    /// Copy this buffer into a new, independent device resource
    ///
    /// Unallocated buffers produce an unallocated copy with the same usage.
    pub fn try_clone(&self) -> Result<IndexBuffer> {
        let mut copy = IndexBuffer::with_usage(&self.context, self.usage);

        if self.is_allocated() {
            copy.create(self.size)?;
            copy.copy_from(self)?;
        }

        Ok(copy)
    }

    /// Exchange the contents of two index buffers
    ///
    /// Only the handles, sizes and usages move; no device call is made.
    pub fn swap(&mut self, other: &mut IndexBuffer) {
        mem::swap(self, other);
    }

    /// Raw device identifier, 0 if not yet created
    ///
    /// For renderers issuing indexed draws and for interop with raw device
    /// calls.
    pub fn native_handle(&self) -> u32 {
        self.handle.map_or(0, BufferHandle::raw)
    }

    /// Device identifier, None if not yet created
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    /// Change the usage hint
    ///
    /// Takes effect the next time storage is allocated.
    pub fn set_usage(&mut self, usage: BufferUsage) {
        self.usage = usage;
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The device context this buffer lives on
    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    fn is_allocated(&self) -> bool {
        self.handle.is_some() && self.size > 0
    }

    fn ensure_available(&self) -> Result<()> {
        if Self::is_available(&self.context) {
            Ok(())
        } else {
            Err(report(Error::UnsupportedPlatform(
                "Index buffers are not supported by the device".to_string()
            )))
        }
    }

    fn allocated_handle(&self) -> Result<BufferHandle> {
        match self.handle {
            Some(handle) if self.size > 0 => Ok(handle),
            _ => Err(report(Error::PreconditionViolated(
                "Index buffer has no allocated storage".to_string()
            ))),
        }
    }
}

impl Clone for IndexBuffer {
    /// Copy into a new device resource
    ///
    /// On failure the failure is reported and the copy is left unallocated,
    /// keeping only the usage hint.
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|error| {
            engine_error!(SOURCE, "Could not copy index buffer: {}", error);
            IndexBuffer::with_usage(&self.context, self.usage)
        })
    }

    /// Copy-then-swap: `self` only changes once the copy is complete
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        self.swap(&mut copy);
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let lock = self.context.lock();
            lock.device().delete_buffer(handle);
        }
    }
}

impl std::fmt::Debug for IndexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("handle", &self.native_handle())
            .field("size", &self.size)
            .field("usage", &self.usage)
            .finish()
    }
}

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
