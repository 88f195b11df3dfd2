/// Mock graphics device for unit tests (no GPU required)
///
/// Keeps buffer storage in process memory and records every device call as a
/// string, so tests can assert both on contents and on "no device call made".
/// Clones share state: keep one clone in the test and hand the other to a
/// `DeviceContext`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::device::{
    BufferHandle, BufferTarget, BufferUsage, DeviceCapabilities, GraphicsDevice, MapAccess,
};
use crate::error::Result;
use crate::engine_bail;

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug, Default)]
pub struct MockBuffer {
    pub data: Vec<u8>,
    pub usage: BufferUsage,
    pub mapped: bool,
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<String>,
    pub buffers: HashMap<u32, MockBuffer>,
    pub bindings: HashMap<BufferTarget, u32>,
    pub next_name: u32,
    pub capabilities: DeviceCapabilities,
    pub fail_gen: bool,
    pub fail_unmap: bool,
}

#[derive(Debug, Clone)]
pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockGraphicsDevice {
    /// Device supporting every capability
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::all())
    }

    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                capabilities,
                ..MockState::default()
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of calls whose name starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state().calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub fn set_fail_gen(&self, fail: bool) {
        self.state().fail_gen = fail;
    }

    pub fn set_fail_unmap(&self, fail: bool) {
        self.state().fail_unmap = fail;
    }

    /// Buffer contents as indices
    pub fn indices(&self, handle: u32) -> Option<Vec<u32>> {
        self.state().buffers.get(&handle).map(|buffer| {
            buffer.data
                .chunks_exact(4)
                .map(|bytes| u32::from_ne_bytes(bytes.try_into().unwrap()))
                .collect()
        })
    }

    pub fn usage(&self, handle: u32) -> Option<BufferUsage> {
        self.state().buffers.get(&handle).map(|buffer| buffer.usage)
    }

    pub fn buffer_count(&self) -> usize {
        self.state().buffers.len()
    }

    pub fn bound(&self, target: BufferTarget) -> u32 {
        self.state().bindings.get(&target).copied().unwrap_or(0)
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn bound_name(&self, target: BufferTarget) -> Result<u32> {
        match self.state().bindings.get(&target) {
            Some(&name) => Ok(name),
            None => engine_bail!("index_buffer::mock", "No buffer bound to {:?}", target),
        }
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.record("capabilities".to_string());
        self.state().capabilities
    }

    fn gen_buffer(&mut self) -> Option<BufferHandle> {
        self.record("gen_buffer".to_string());
        let mut state = self.state();
        if state.fail_gen {
            return None;
        }
        state.next_name += 1;
        let name = state.next_name;
        state.buffers.insert(name, MockBuffer::default());
        BufferHandle::new(name)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        self.record(format!("delete_buffer({})", handle.raw()));
        let mut state = self.state();
        state.buffers.remove(&handle.raw());
        state.bindings.retain(|_, name| *name != handle.raw());
    }

    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<BufferHandle>) {
        let name = handle.map_or(0, BufferHandle::raw);
        self.record(format!("bind_buffer({:?}, {})", target, name));
        let mut state = self.state();
        if name == 0 {
            state.bindings.remove(&target);
        } else {
            state.bindings.insert(target, name);
        }
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        BufferHandle::new(self.bound(target))
    }

    fn buffer_data(&mut self, target: BufferTarget, size: u64, usage: BufferUsage) -> Result<()> {
        self.record(format!("buffer_data({:?}, {}, {:?})", target, size, usage));
        let name = self.bound_name(target)?;
        let mut state = self.state();
        let buffer = state.buffers.entry(name).or_default();
        buffer.data = vec![0; size as usize];
        buffer.usage = usage;
        Ok(())
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u64, data: &[u8]) -> Result<()> {
        self.record(format!("buffer_sub_data({:?}, {}, {})", target, offset, data.len()));
        let name = self.bound_name(target)?;
        let mut state = self.state();
        let buffer = state.buffers.entry(name).or_default();
        let start = offset as usize;
        if start + data.len() > buffer.data.len() {
            engine_bail!("index_buffer::mock", "Sub data out of range");
        }
        buffer.data[start..start + data.len()].copy_from_slice(data);
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
        self.record(format!("copy_buffer_sub_data({})", size));
        let source = self.bound_name(read_target)?;
        let destination = self.bound_name(write_target)?;
        let mut state = self.state();
        let (read, write, size) = (read_offset as usize, write_offset as usize, size as usize);
        let bytes = state.buffers[&source].data[read..read + size].to_vec();
        let target = state.buffers.entry(destination).or_default();
        if write + size > target.data.len() {
            engine_bail!("index_buffer::mock", "Copy out of range");
        }
        target.data[write..write + size].copy_from_slice(&bytes);
        Ok(())
    }

    fn map_buffer(&mut self, target: BufferTarget, access: MapAccess) -> Option<*mut u8> {
        self.record(format!("map_buffer({:?}, {:?})", target, access));
        let name = self.bound_name(target).ok()?;
        let mut state = self.state();
        let buffer = state.buffers.get_mut(&name)?;
        buffer.mapped = true;
        Some(buffer.data.as_mut_ptr())
    }

    fn unmap_buffer(&mut self, target: BufferTarget) -> bool {
        self.record(format!("unmap_buffer({:?})", target));
        let Ok(name) = self.bound_name(target) else {
            return false;
        };
        let mut state = self.state();
        let fail = state.fail_unmap;
        match state.buffers.get_mut(&name) {
            Some(buffer) if buffer.mapped => {
                buffer.mapped = false;
                !fail
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
