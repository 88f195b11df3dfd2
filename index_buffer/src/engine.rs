/// Engine - global state shared by every index buffer
///
/// Holds the process-wide logger (the diagnostics sink) and, optionally, the
/// application's shared device context. Uses thread-safe static storage with
/// RwLock for concurrent access.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;

use crate::device::{ContextConfig, DeviceContext, GraphicsDevice};
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Shared device context
    device_context: RwLock<Option<Arc<DeviceContext>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            device_context: RwLock::new(None),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Global singleton manager
///
/// # Example
///
/// ```no_run
/// use index_buffer::{Engine, IndexBuffer};
///
/// Engine::initialize()?;
/// // Engine::create_device_context(backend_device, ContextConfig::default())?;
/// let context = Engine::device_context()?;
/// let mut indices = IndexBuffer::new(&context);
/// indices.create(6)?;
/// # Ok::<(), index_buffer::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an engine error before returning it
    fn log_and_return_error(error: Error) -> Error {
        crate::engine_error!("index_buffer::Engine", "{}", error);
        error
    }

    /// Initialize the engine
    ///
    /// Idempotent. Must be called before registering a device context.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop the shared device context
    ///
    /// Index buffers keep their own reference to the context, so they stay
    /// usable until they are dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut context) = state.device_context.write() {
                *context = None;
            }
        }
    }

    /// Wrap a device in a context and register it as the shared context
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A device context already exists
    pub fn create_device_context<D: GraphicsDevice + 'static>(
        device: D,
        config: ContextConfig,
    ) -> Result<Arc<DeviceContext>> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::BackendError("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))?;

        let mut lock = state.device_context.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Device context lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::BackendError("Device context already exists. Call Engine::destroy_device_context() first.".to_string())
            ));
        }

        let context = DeviceContext::with_config(device, config);
        *lock = Some(Arc::clone(&context));

        crate::engine_info!("index_buffer::Engine", "Device context created");

        Ok(context)
    }

    /// Get the shared device context
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or no context was created.
    pub fn device_context() -> Result<Arc<DeviceContext>> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::BackendError("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))?;

        let lock = state.device_context.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Device context lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::BackendError("Device context not created. Call Engine::create_device_context() first.".to_string())
            ))
    }

    /// Unregister the shared device context
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized.
    pub fn destroy_device_context() -> Result<()> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::BackendError("Engine not initialized".to_string())
            ))?;

        let mut lock = state.device_context.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Device context lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("index_buffer::Engine", "Device context destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Replace the default logger with a custom implementation
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! and engine_err! to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
