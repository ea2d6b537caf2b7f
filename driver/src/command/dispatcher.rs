//! Render-side consumer of recorded commands.

use std::sync::Arc;

use super::Command;
use crate::backend::Driver;

/// Maps each [`Command`] onto a [`Driver`].
///
/// Commands that report back through a [`ReturnSlot`](super::ReturnSlot) are
/// resolved here against the driver's synchronous methods; everything else is
/// forwarded to [`Driver::execute`].
#[derive(Clone)]
pub struct Dispatcher {
    driver: Arc<dyn Driver>,
}

impl Dispatcher {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn dispatch(&self, command: Command) {
        log::trace!("{}: dispatch {:?}", self.driver.name(), command.kind());
        match command {
            Command::ReadBufferObject {
                handle,
                byte_offset,
                byte_count,
                result,
            } => {
                let bytes = self
                    .driver
                    .read_buffer_object_synchronous(handle, byte_offset, byte_count);
                result.fulfill(bytes);
            }
            Command::QueryRenderTargetSize { target, result } => {
                result.fulfill(self.driver.render_target_size_synchronous(target));
            }
            command => self.driver.execute(command),
        }
    }

    /// Dispatch a batch in recording order.
    pub fn dispatch_batch(&self, batch: Vec<Command>) {
        for command in batch {
            self.dispatch(command);
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("driver", &self.driver.name())
            .finish()
    }
}

#[cfg(all(test, feature = "noop"))]
mod tests {
    use super::*;
    use crate::backend::noop::NoopDriver;
    use crate::command::{CommandKind, ReturnSlot};
    use crate::config::DriverConfig;

    #[test]
    fn test_side_channel_commands_fulfil_slots() {
        let driver = Arc::new(NoopDriver::new(&DriverConfig::default()));
        let dispatcher = Dispatcher::new(driver.clone());

        let target = driver.handle_allocator().allocate();
        dispatcher.dispatch(Command::CreateRenderTarget {
            handle: target,
            targets: crate::types::TargetBufferFlags::COLOR0,
            width: 320,
            height: 200,
            samples: 1,
            color: Default::default(),
            depth: Default::default(),
            stencil: Default::default(),
        });

        let result = ReturnSlot::new();
        dispatcher.dispatch(Command::QueryRenderTargetSize {
            target,
            result: result.clone(),
        });
        assert_eq!(result.try_take(), Some(Some((320, 200))));

        // Resolved by the dispatcher, never seen by execute.
        assert_eq!(driver.executed(), vec![CommandKind::CreateRenderTarget]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let driver = Arc::new(NoopDriver::new(&DriverConfig::default()));
        let dispatcher = Dispatcher::new(driver.clone());
        dispatcher.dispatch_batch(vec![
            Command::BeginFrame {
                frame_id: 0,
                monotonic_clock_ns: 0,
            },
            Command::Flush,
            Command::EndFrame { frame_id: 0 },
        ]);
        assert_eq!(
            driver.executed(),
            vec![CommandKind::BeginFrame, CommandKind::Flush, CommandKind::EndFrame]
        );
    }
}
