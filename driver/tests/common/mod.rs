//! Common utilities for driver integration tests.
//!
//! Every test builds a [`TestContext`] for one [`ThreadingMode`], so the same
//! scenario runs once inline and once through the render thread.

use std::sync::Arc;

use parking_lot::Mutex;

use lumen_driver::backend::noop::NoopDriver;
use lumen_driver::{BufferDescriptor, CommandStream, DriverConfig, ThreadingMode};

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A stream plus the concrete driver behind it, for inspection.
pub struct TestContext {
    pub driver: Arc<NoopDriver>,
    pub stream: CommandStream,
}

impl TestContext {
    pub fn new(threading: ThreadingMode) -> Self {
        Self::with_config(DriverConfig::new().with_threading(threading))
    }

    pub fn with_config(config: DriverConfig) -> Self {
        init_logging();
        let driver = Arc::new(NoopDriver::new(&config));
        let stream = CommandStream::with_driver(driver.clone(), config).expect("command stream");
        Self { driver, stream }
    }
}

/// Collects the bytes handed back through release callbacks.
#[derive(Clone, Default)]
pub struct Released {
    buffers: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Released {
    pub fn new() -> Self {
        Self::default()
    }

    /// A descriptor over `data` that reports back into this collector.
    pub fn descriptor(&self, data: Vec<u8>) -> BufferDescriptor {
        let buffers = self.buffers.clone();
        BufferDescriptor::with_callback(data, move |bytes| {
            buffers.lock().push(bytes);
        })
    }

    pub fn count(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.buffers.lock())
    }
}
