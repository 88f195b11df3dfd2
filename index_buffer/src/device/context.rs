/// Device context - scoped, per-thread ownership of a shared graphics device
///
/// Every device call must happen while the calling thread holds the context,
/// with one exception: the capability query that fills the cache (see below).
/// `DeviceContext::lock()` returns a `ContextLock` guard that releases the
/// context when dropped, on every exit path. Locking is reentrant: a thread
/// that already owns the context can lock it again without blocking.
///
/// The context also owns the capability cache. Capabilities are queried from
/// the device on first use and never recomputed. That query takes only the
/// device mutex, so `capabilities()` may be called from any thread whether or
/// not another thread owns the context.

use std::marker::PhantomData;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use crate::device::{DeviceCapabilities, GraphicsDevice};

/// Context configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextConfig {
    /// Capabilities to hide even if the device reports them
    ///
    /// Masking `COPY_BUFFER` forces buffer copies through mapped memory.
    pub disabled_capabilities: DeviceCapabilities,
}

/// Which thread currently owns the context, and how many times
#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
}

/// Shared graphics device plus the scope lock guarding it
pub struct DeviceContext {
    /// The device itself (only touched by the owning thread)
    device: Mutex<Box<dyn GraphicsDevice>>,
    /// Current owner of the scope
    ownership: Mutex<Ownership>,
    /// Signalled when the scope is released
    released: Condvar,
    /// Capabilities, filled on first query
    capabilities: OnceLock<DeviceCapabilities>,
    config: ContextConfig,
}

impl DeviceContext {
    /// Create a context around a device with the default configuration
    pub fn new<D: GraphicsDevice + 'static>(device: D) -> Arc<Self> {
        Self::with_config(device, ContextConfig::default())
    }

    /// Create a context around a device
    pub fn with_config<D: GraphicsDevice + 'static>(device: D, config: ContextConfig) -> Arc<Self> {
        Arc::new(Self {
            device: Mutex::new(Box::new(device)),
            ownership: Mutex::new(Ownership::default()),
            released: Condvar::new(),
            capabilities: OnceLock::new(),
            config,
        })
    }

    /// Context configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Acquire the context for the current thread
    ///
    /// Blocks while another thread owns it. Reentrant for the owning thread.
    pub fn lock(&self) -> ContextLock<'_> {
        let current = thread::current().id();
        let mut ownership = self.ownership.lock().unwrap_or_else(PoisonError::into_inner);

        while ownership.owner.is_some_and(|owner| owner != current) {
            ownership = self.released.wait(ownership).unwrap_or_else(PoisonError::into_inner);
        }

        ownership.owner = Some(current);
        ownership.depth += 1;

        ContextLock {
            context: self,
            _not_send: PhantomData,
        }
    }

    /// Whether the calling thread currently owns the context
    pub fn is_held_by_current_thread(&self) -> bool {
        let ownership = self.ownership.lock().unwrap_or_else(PoisonError::into_inner);
        ownership.owner == Some(thread::current().id())
    }

    /// Device capabilities, minus the ones disabled by configuration
    ///
    /// The first call queries the device; concurrent first calls wait for
    /// that single query. This is the only device call made without owning
    /// the context: it takes the device mutex alone, so a thread owning the
    /// context never waits on an initializer that is waiting for the context.
    pub fn capabilities(&self) -> DeviceCapabilities {
        *self.capabilities.get_or_init(|| {
            let reported = self.device.lock().unwrap_or_else(PoisonError::into_inner).capabilities();
            reported - self.config.disabled_capabilities
        })
    }

    fn release(&self) {
        let mut ownership = self.ownership.lock().unwrap_or_else(PoisonError::into_inner);
        ownership.depth -= 1;
        if ownership.depth == 0 {
            ownership.owner = None;
            self.released.notify_one();
        }
    }
}

/// Proof that the current thread owns a `DeviceContext`
///
/// Dropping the guard releases one level of ownership. The guard is tied to
/// the thread that created it and cannot be sent elsewhere.
pub struct ContextLock<'a> {
    context: &'a DeviceContext,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ContextLock<'a> {
    /// Access the device
    ///
    /// Keep the returned guard for a single call; taking it twice in the
    /// same expression deadlocks.
    pub fn device(&self) -> MutexGuard<'_, Box<dyn GraphicsDevice>> {
        self.context.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The context this lock belongs to
    pub fn context(&self) -> &'a DeviceContext {
        self.context
    }
}

impl Drop for ContextLock<'_> {
    fn drop(&mut self) {
        self.context.release();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
