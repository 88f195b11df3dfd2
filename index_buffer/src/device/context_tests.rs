/// Unit tests for DeviceContext and IndexBinding.

use super::*;
use crate::device::mock_graphics_device::MockGraphicsDevice;
use crate::device::{BufferHandle, BufferTarget, IndexBinding};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn test_lock_is_reentrant() {
    let context = DeviceContext::new(MockGraphicsDevice::new());
    assert!(!context.is_held_by_current_thread());

    let outer = context.lock();
    {
        let _inner = context.lock();
        assert!(context.is_held_by_current_thread());
    }
    // Releasing the inner lock keeps the outer one
    assert!(context.is_held_by_current_thread());

    drop(outer);
    assert!(!context.is_held_by_current_thread());
}

#[test]
fn test_lock_blocks_other_threads() {
    let context = DeviceContext::new(MockGraphicsDevice::new());
    let acquired = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = mpsc::channel();

    let guard = context.lock();

    let worker = {
        let context = Arc::clone(&context);
        let acquired = Arc::clone(&acquired);
        std::thread::spawn(move || {
            ready_tx.send(()).unwrap();
            let _lock = context.lock();
            acquired.store(true, Ordering::SeqCst);
            assert!(context.is_held_by_current_thread());
        })
    };

    ready_rx.recv().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!acquired.load(Ordering::SeqCst));

    drop(guard);
    worker.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
    assert!(!context.is_held_by_current_thread());
}

#[test]
fn test_lock_exposes_device_and_context() {
    let device = MockGraphicsDevice::new();
    let context = DeviceContext::new(device.clone());

    let lock = context.lock();
    assert!(std::ptr::eq(lock.context(), &*context));
    assert!(lock.device().gen_buffer().is_some());
    drop(lock);

    assert_eq!(device.buffer_count(), 1);
}

#[test]
fn test_capabilities_are_cached() {
    let device = MockGraphicsDevice::new();
    let context = DeviceContext::new(device.clone());

    assert_eq!(context.capabilities(), DeviceCapabilities::all());
    assert_eq!(context.capabilities(), DeviceCapabilities::all());
    assert_eq!(device.count_calls("capabilities"), 1);
}

#[test]
fn test_capabilities_query_while_locked() {
    let context = DeviceContext::new(MockGraphicsDevice::new());
    let _lock = context.lock();
    assert!(context.capabilities().contains(DeviceCapabilities::INDEX_BUFFERS));
}

#[test]
fn test_capabilities_query_while_other_thread_owns_context() {
    let device = MockGraphicsDevice::new();
    let context = DeviceContext::new(device.clone());
    let _lock = context.lock();

    let worker = {
        let context = Arc::clone(&context);
        std::thread::spawn(move || {
            let capabilities = context.capabilities();
            (capabilities, context.is_held_by_current_thread())
        })
    };

    let (capabilities, worker_held_context) = worker.join().unwrap();
    assert_eq!(capabilities, DeviceCapabilities::all());
    assert!(!worker_held_context);
    assert!(context.is_held_by_current_thread());
    assert_eq!(device.count_calls("capabilities"), 1);
}

#[test]
fn test_disabled_capabilities_are_masked() {
    let device = MockGraphicsDevice::with_capabilities(
        DeviceCapabilities::INDEX_BUFFERS | DeviceCapabilities::MAP_BUFFER,
    );
    let config = ContextConfig { disabled_capabilities: DeviceCapabilities::MAP_BUFFER };
    let context = DeviceContext::with_config(device, config);

    assert_eq!(context.capabilities(), DeviceCapabilities::INDEX_BUFFERS);
    assert_eq!(context.config().disabled_capabilities, DeviceCapabilities::MAP_BUFFER);
}

#[test]
fn test_index_binding_set_and_current() {
    let device = MockGraphicsDevice::new();
    let context = DeviceContext::new(device.clone());
    assert_eq!(IndexBinding::current(&context), None);

    let handle = {
        let lock = context.lock();
        let handle = lock.device().gen_buffer();
        handle
    };
    IndexBinding::set(&context, handle);
    assert_eq!(IndexBinding::current(&context), handle);
    assert_eq!(device.bound(BufferTarget::ElementArray), 1);

    IndexBinding::set(&context, None);
    assert_eq!(IndexBinding::current(&context), None);
}

#[test]
fn test_index_binding_last_writer_wins() {
    let context = DeviceContext::new(MockGraphicsDevice::new());
    IndexBinding::set(&context, BufferHandle::new(4));
    IndexBinding::set(&context, BufferHandle::new(9));
    assert_eq!(IndexBinding::current(&context), BufferHandle::new(9));
}
