/// Index binding point - the device's single global "current index buffer" slot
///
/// The slot is process-wide state shared by every index buffer on a context.
/// Nothing here orders `set` calls from different threads against each other
/// or against draws: whoever binds last wins, and a draw reads whatever is
/// bound when it executes. Callers mixing manual binding with rendering are
/// responsible for that ordering.

use crate::device::{BufferHandle, BufferTarget, ContextLock, DeviceContext};

/// The global index buffer binding point of a context
pub struct IndexBinding;

impl IndexBinding {
    /// Bind a buffer to the index slot, or clear the slot with `None`
    pub fn set(context: &DeviceContext, handle: Option<BufferHandle>) {
        let lock = context.lock();
        lock.device().bind_buffer(BufferTarget::ElementArray, handle);
    }

    /// Buffer currently bound to the index slot
    pub fn current(context: &DeviceContext) -> Option<BufferHandle> {
        let lock = context.lock();
        let handle = lock.device().bound_buffer(BufferTarget::ElementArray);
        handle
    }
}

/// Binds a buffer to a target for the duration of a scope
///
/// The target is cleared when the guard drops, including on early returns,
/// so index buffer operations never leave their own buffer bound.
pub(crate) struct BindGuard<'a, 'ctx> {
    lock: &'a ContextLock<'ctx>,
    target: BufferTarget,
}

impl<'a, 'ctx> BindGuard<'a, 'ctx> {
    pub(crate) fn bind(lock: &'a ContextLock<'ctx>, target: BufferTarget, handle: BufferHandle) -> Self {
        lock.device().bind_buffer(target, Some(handle));
        Self { lock, target }
    }

    /// Attach a different buffer to the same target
    pub(crate) fn rebind(&mut self, handle: BufferHandle) {
        self.lock.device().bind_buffer(self.target, Some(handle));
    }
}

impl Drop for BindGuard<'_, '_> {
    fn drop(&mut self) {
        self.lock.device().bind_buffer(self.target, None);
    }
}
