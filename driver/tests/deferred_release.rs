//! Integration tests for deferred buffer release.
//!
//! Release callbacks attached to uploaded buffers must fire exactly once, on
//! the thread that calls `purge`, and never before the backend consumed them.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rstest::rstest;

use common::{Released, TestContext};
use lumen_core::SlotState;
use lumen_driver::types::{AttributeArray, IndexType};
use lumen_driver::{
    BufferDescriptor, BufferObjectBinding, BufferUsage, Driver, DriverConfig, ThreadingMode,
};

#[rstest]
#[case::inline(ThreadingMode::Inline)]
#[case::render_thread(ThreadingMode::RenderThread)]
fn test_callbacks_wait_for_purge(#[case] threading: ThreadingMode) {
    let mut ctx = TestContext::new(threading);
    let released = Released::new();

    let vertices = ctx.stream.create_vertex_buffer(
        1,
        1,
        3,
        AttributeArray::default(),
        BufferUsage::Static,
    );
    let indices = ctx
        .stream
        .create_index_buffer(IndexType::UShort, 3, BufferUsage::Static);
    ctx.stream
        .update_vertex_buffer(vertices, 0, released.descriptor(vec![1; 36]), 0);
    ctx.stream
        .update_index_buffer(indices, released.descriptor(vec![0, 0, 1, 0, 2, 0]), 0);
    assert_eq!(ctx.stream.purge(), 0, "nothing executed yet");

    ctx.stream.finish().expect("finish");
    assert_eq!(released.count(), 0, "callbacks must not run on the render thread");

    assert_eq!(ctx.stream.purge(), 2);
    assert_eq!(ctx.stream.purge(), 0, "each callback runs once");

    let buffers = released.take();
    assert_eq!(buffers[0], vec![1; 36]);
    assert_eq!(buffers[1], vec![0, 0, 1, 0, 2, 0]);
}

#[rstest]
#[case::inline(ThreadingMode::Inline)]
#[case::render_thread(ThreadingMode::RenderThread)]
fn test_release_survives_destroy(#[case] threading: ThreadingMode) {
    let mut ctx = TestContext::new(threading);
    let released = Released::new();

    let ubo = ctx
        .stream
        .create_buffer_object(4, BufferObjectBinding::Uniform, BufferUsage::Stream);
    ctx.stream
        .update_buffer_object(ubo, released.descriptor(vec![9, 8, 7, 6]), 0);
    ctx.stream.destroy_buffer_object(ubo);
    ctx.stream.finish().expect("finish");

    assert_eq!(ctx.stream.handle_allocator().state(ubo), SlotState::Vacant);
    assert_eq!(ctx.stream.purge(), 1);
    assert_eq!(released.take(), vec![vec![9, 8, 7, 6]]);
}

#[test]
fn test_stale_update_still_releases() {
    let mut ctx = TestContext::with_config(
        DriverConfig::new()
            .with_threading(ThreadingMode::Inline)
            .with_validate_handles(false),
    );
    let released = Released::new();

    let ubo = ctx
        .stream
        .create_buffer_object(4, BufferObjectBinding::Uniform, BufferUsage::Dynamic);
    ctx.stream.destroy_buffer_object(ubo);
    ctx.stream
        .update_buffer_object(ubo, released.descriptor(vec![1, 2, 3, 4]), 0);
    ctx.stream.finish().expect("finish");

    assert_eq!(ctx.driver.stats().stale_handles, 1);
    assert_eq!(ctx.stream.purge(), 1);
    assert_eq!(released.count(), 1);
}

#[test]
fn test_buffers_without_callback_skip_the_queue() {
    let ctx = TestContext::new(ThreadingMode::Inline);
    let driver = ctx.driver.clone();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let driver = driver.clone();
            thread::spawn(move || {
                for i in 0..32u8 {
                    driver.base().schedule_destroy(BufferDescriptor::new(vec![i; 8]));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    assert_eq!(driver.purge(), 0);
}

#[test]
fn test_callbacks_run_on_purging_thread() {
    let ctx = TestContext::new(ThreadingMode::Inline);
    let driver = ctx.driver.clone();
    let fired = Arc::new(AtomicUsize::new(0));
    let main = thread::current().id();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let driver = driver.clone();
            let fired = fired.clone();
            thread::spawn(move || {
                for _ in 0..16 {
                    let fired = fired.clone();
                    driver
                        .base()
                        .schedule_destroy(BufferDescriptor::with_callback(vec![0; 4], move |_| {
                            assert_eq!(thread::current().id(), main);
                            fired.fetch_add(1, Ordering::SeqCst);
                        }));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(driver.purge(), 64);
    assert_eq!(fired.load(Ordering::SeqCst), 64);
}
