/// Soft device - a CPU implementation of the graphics device
///
/// Buffers live in process memory, keyed by GL-style names handed out by a
/// recycling name allocator. Every binding target holds at most one name;
/// data calls act on the buffer bound to their target. Mapping hands out a
/// pointer into the buffer storage until the buffer is unmapped.
///
/// `SoftDevice` is cheaply clonable: clones share the same device state, so
/// a test or renderer can keep a clone to inspect buffers and issue draws
/// while the original is owned by a `DeviceContext`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use index_buffer::{
    BufferHandle, BufferTarget, BufferUsage, DeviceCapabilities, GraphicsDevice, MapAccess, Result,
};
use index_buffer::{engine_bail, engine_trace};
use rustc_hash::FxHashMap;

use crate::name_allocator::NameAllocator;
use crate::stats::{print_stats_report, DeviceStats, StatsTracker};

const SOURCE: &str = "index_buffer_device_soft::SoftDevice";

/// Device families, by the buffer features they expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceProfile {
    /// Every buffer feature
    #[default]
    Desktop,
    /// No device-side buffer copies
    Embedded,
    /// No buffer mapping
    Restricted,
    /// No buffer objects at all
    Unsupported,
}

impl DeviceProfile {
    /// Capabilities reported by a device of this family
    pub fn capabilities(self) -> DeviceCapabilities {
        match self {
            DeviceProfile::Desktop => DeviceCapabilities::all(),
            DeviceProfile::Embedded => {
                DeviceCapabilities::INDEX_BUFFERS | DeviceCapabilities::MAP_BUFFER
            }
            DeviceProfile::Restricted => {
                DeviceCapabilities::INDEX_BUFFERS | DeviceCapabilities::COPY_BUFFER
            }
            DeviceProfile::Unsupported => DeviceCapabilities::empty(),
        }
    }
}

/// Soft device configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDeviceConfig {
    pub profile: DeviceProfile,
    /// Maximum number of live buffers, `None` for unbounded
    pub max_buffers: Option<u32>,
}

struct SoftBuffer {
    data: Vec<u8>,
    usage: BufferUsage,
    mapped: Option<MapAccess>,
}

impl SoftBuffer {
    fn indices(&self) -> Vec<u32> {
        self.data
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect()
    }
}

struct State {
    buffers: FxHashMap<u32, SoftBuffer>,
    bindings: FxHashMap<BufferTarget, u32>,
    names: NameAllocator,
}

impl State {
    fn bound_name(&self, target: BufferTarget) -> Option<u32> {
        self.bindings.get(&target).copied()
    }

    fn bound_mut(&mut self, target: BufferTarget) -> Option<&mut SoftBuffer> {
        let name = self.bound_name(target)?;
        self.buffers.get_mut(&name)
    }
}

/// CPU graphics device
#[derive(Clone)]
pub struct SoftDevice {
    state: Arc<Mutex<State>>,
    stats: Arc<StatsTracker>,
    config: SoftDeviceConfig,
}

impl SoftDevice {
    /// Create a device
    pub fn new(config: SoftDeviceConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                buffers: FxHashMap::default(),
                bindings: FxHashMap::default(),
                names: NameAllocator::new(config.max_buffers),
            })),
            stats: Arc::new(StatsTracker::default()),
            config,
        }
    }

    /// Create an unbounded device of the given family
    pub fn with_profile(profile: DeviceProfile) -> Self {
        Self::new(SoftDeviceConfig { profile, max_buffers: None })
    }

    pub fn config(&self) -> &SoftDeviceConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== RENDERING =====

    /// Fetch the first `count` indices of the bound index buffer, as an
    /// indexed draw would
    ///
    /// # Errors
    ///
    /// Returns an error if no index buffer is bound, the bound buffer is
    /// mapped, or it holds fewer than `count` indices.
    pub fn draw_indexed(&self, count: usize) -> Result<Vec<u32>> {
        let state = self.state();

        let Some(name) = state.bound_name(BufferTarget::ElementArray) else {
            self.stats.error();
            engine_bail!(SOURCE, "draw_indexed: no index buffer bound");
        };
        let Some(buffer) = state.buffers.get(&name) else {
            self.stats.error();
            engine_bail!(SOURCE, "draw_indexed: bound index buffer {} does not exist", name);
        };
        if buffer.mapped.is_some() {
            self.stats.error();
            engine_bail!(SOURCE, "draw_indexed: index buffer {} is mapped", name);
        }

        let available = buffer.data.len() / 4;
        if count > available {
            self.stats.error();
            engine_bail!(SOURCE, "draw_indexed: {} indices requested, buffer {} holds {}",
                count, name, available);
        }

        self.stats.draw();
        let mut indices = buffer.indices();
        indices.truncate(count);
        Ok(indices)
    }

    // ===== INSPECTION =====

    /// Contents of a buffer as indices, `None` if it does not exist or is mapped
    pub fn indices(&self, handle: BufferHandle) -> Option<Vec<u32>> {
        self.state().buffers.get(&handle.raw())
            .filter(|buffer| buffer.mapped.is_none())
            .map(SoftBuffer::indices)
    }

    /// Storage size of a buffer in bytes
    pub fn buffer_size(&self, handle: BufferHandle) -> Option<usize> {
        self.state().buffers.get(&handle.raw()).map(|buffer| buffer.data.len())
    }

    /// Usage hint of the current storage of a buffer
    pub fn usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.state().buffers.get(&handle.raw()).map(|buffer| buffer.usage)
    }

    pub fn is_mapped(&self, handle: BufferHandle) -> bool {
        self.state().buffers.get(&handle.raw()).is_some_and(|buffer| buffer.mapped.is_some())
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.state().buffers.len()
    }

    /// Highest buffer name ever handed out + 1
    pub fn name_high_water_mark(&self) -> u32 {
        self.state().names.high_water_mark()
    }

    /// Snapshot of the device counters
    pub fn stats(&self) -> DeviceStats {
        self.stats.snapshot()
    }

    /// Print the device counters
    pub fn print_stats_report(&self) {
        print_stats_report(&self.stats());
    }
}

impl Default for SoftDevice {
    fn default() -> Self {
        Self::new(SoftDeviceConfig::default())
    }
}

impl GraphicsDevice for SoftDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.config.profile.capabilities()
    }

    fn gen_buffer(&mut self) -> Option<BufferHandle> {
        let mut state = self.state();
        let Some(name) = state.names.alloc() else {
            self.stats.error();
            engine_trace!(SOURCE, "gen_buffer: out of buffer names ({} live)", state.names.len());
            return None;
        };

        state.buffers.insert(name, SoftBuffer {
            data: Vec::new(),
            usage: BufferUsage::default(),
            mapped: None,
        });
        self.stats.buffer_generated();
        engine_trace!(SOURCE, "gen_buffer: {}", name);

        BufferHandle::new(name)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        let name = handle.raw();
        let mut state = self.state();

        // Unknown names are ignored
        if state.buffers.remove(&name).is_none() {
            return;
        }

        state.names.free(name);
        state.bindings.retain(|_, bound| *bound != name);
        self.stats.buffer_deleted();
        engine_trace!(SOURCE, "delete_buffer: {}", name);
    }

    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<BufferHandle>) {
        let mut state = self.state();
        match handle {
            Some(handle) => {
                state.bindings.insert(target, handle.raw());
            }
            None => {
                state.bindings.remove(&target);
            }
        }
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        self.state().bound_name(target).and_then(BufferHandle::new)
    }

    fn buffer_data(&mut self, target: BufferTarget, size: u64, usage: BufferUsage) -> Result<()> {
        let Ok(len) = usize::try_from(size) else {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_data: {} bytes exceed the address space", size);
        };

        let mut state = self.state();
        let Some(buffer) = state.bound_mut(target) else {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_data: no buffer bound to {:?}", target);
        };

        // Out of memory leaves the previous storage in place
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_data: out of memory allocating {} bytes", size);
        }
        data.resize(len, 0);

        // Respecifying storage implicitly unmaps
        buffer.mapped = None;
        buffer.data = data;
        buffer.usage = usage;
        self.stats.allocation();

        Ok(())
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        let Some(buffer) = state.bound_mut(target) else {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_sub_data: no buffer bound to {:?}", target);
        };
        if buffer.mapped.is_some() {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_sub_data: buffer bound to {:?} is mapped", target);
        }

        let range = usize::try_from(offset).ok()
            .and_then(|start| Some(start..start.checked_add(data.len())?))
            .filter(|range| range.end <= buffer.data.len());
        let Some(range) = range else {
            self.stats.error();
            engine_bail!(SOURCE, "buffer_sub_data: {} bytes at offset {} exceed storage of {} bytes",
                data.len(), offset, buffer.data.len());
        };

        buffer.data[range].copy_from_slice(data);
        self.stats.upload(data.len());

        Ok(())
    }

    fn copy_buffer_sub_data(
        &mut self,
        read_target: BufferTarget,
        write_target: BufferTarget,
        read_offset: u64,
        write_offset: u64,
        size: u64,
    ) -> Result<()> {
        if !self.capabilities().contains(DeviceCapabilities::COPY_BUFFER) {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: not supported by {:?} devices", self.config.profile);
        }

        let mut state = self.state();
        let (Some(read_name), Some(write_name)) =
            (state.bound_name(read_target), state.bound_name(write_target))
        else {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: {:?} and {:?} must both be bound",
                read_target, write_target);
        };

        let to_range = |offset: u64, len: usize| -> Option<std::ops::Range<usize>> {
            let start = usize::try_from(offset).ok()?;
            let end = start.checked_add(usize::try_from(size).ok()?)?;
            (end <= len).then_some(start..end)
        };

        let (Some(source), Some(destination)) =
            (state.buffers.get(&read_name), state.buffers.get(&write_name))
        else {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: bound buffers {} / {} do not exist",
                read_name, write_name);
        };
        if source.mapped.is_some() || destination.mapped.is_some() {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: buffers must not be mapped");
        }

        let (Some(read_range), Some(write_range)) =
            (to_range(read_offset, source.data.len()), to_range(write_offset, destination.data.len()))
        else {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: {} bytes out of range ({} -> {})",
                size, read_offset, write_offset);
        };

        if read_name == write_name
            && read_range.start < write_range.end
            && write_range.start < read_range.end
        {
            self.stats.error();
            engine_bail!(SOURCE, "copy_buffer_sub_data: overlapping ranges within buffer {}", read_name);
        }

        let chunk = source.data[read_range].to_vec();
        if let Some(destination) = state.buffers.get_mut(&write_name) {
            destination.data[write_range].copy_from_slice(&chunk);
        }
        self.stats.copy(size);

        Ok(())
    }

    fn map_buffer(&mut self, target: BufferTarget, access: MapAccess) -> Option<*mut u8> {
        if !self.capabilities().contains(DeviceCapabilities::MAP_BUFFER) {
            self.stats.error();
            engine_trace!(SOURCE, "map_buffer: not supported by {:?} devices", self.config.profile);
            return None;
        }

        let mut state = self.state();
        let buffer = state.bound_mut(target)?;
        if buffer.mapped.is_some() {
            self.stats.error();
            return None;
        }

        buffer.mapped = Some(access);
        self.stats.map();
        Some(buffer.data.as_mut_ptr())
    }

    fn unmap_buffer(&mut self, target: BufferTarget) -> bool {
        let mut state = self.state();
        match state.bound_mut(target) {
            Some(buffer) if buffer.mapped.is_some() => {
                buffer.mapped = None;
                true
            }
            _ => {
                self.stats.error();
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "soft_device_tests.rs"]
mod tests;
