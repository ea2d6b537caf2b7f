//! Dedicated thread that plays back command batches.

use std::sync::mpsc;
use std::thread::JoinHandle;

use super::{Command, Dispatcher};
use crate::error::DriverError;

enum RenderMessage {
    Batch(Vec<Command>),
    /// Reply once every earlier batch has executed.
    Finish(mpsc::SyncSender<()>),
    Shutdown,
}

/// Owns the render thread. Dropping it drains queued batches, then joins.
pub struct RenderThread {
    sender: mpsc::Sender<RenderMessage>,
    join: Option<JoinHandle<()>>,
    name: String,
}

impl RenderThread {
    /// Start a thread called `name` that feeds every batch to `dispatcher`.
    pub fn spawn(name: &str, dispatcher: Dispatcher) -> Result<Self, DriverError> {
        let (sender, receiver) = mpsc::channel::<RenderMessage>();
        let join = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run(receiver, dispatcher))
            .map_err(|e| DriverError::ThreadSpawnFailed(e.to_string()))?;
        log::info!("RenderThread '{}' started", name);
        Ok(Self {
            sender,
            join: Some(join),
            name: name.to_string(),
        })
    }

    fn run(receiver: mpsc::Receiver<RenderMessage>, dispatcher: Dispatcher) {
        while let Ok(message) = receiver.recv() {
            match message {
                RenderMessage::Batch(batch) => dispatcher.dispatch_batch(batch),
                RenderMessage::Finish(reply) => {
                    let _ = reply.send(());
                }
                RenderMessage::Shutdown => break,
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a batch. On failure the batch is handed back untouched.
    pub fn submit(&self, batch: Vec<Command>) -> Result<(), Vec<Command>> {
        self.sender
            .send(RenderMessage::Batch(batch))
            .map_err(|mpsc::SendError(message)| match message {
                RenderMessage::Batch(batch) => batch,
                RenderMessage::Finish(_) | RenderMessage::Shutdown => Vec::new(),
            })
    }

    /// Block until everything submitted so far has executed.
    pub fn finish(&self) -> Result<(), DriverError> {
        let (reply, done) = mpsc::sync_channel(1);
        self.sender
            .send(RenderMessage::Finish(reply))
            .map_err(|_| DriverError::RenderThreadDisconnected)?;
        done.recv().map_err(|_| DriverError::RenderThreadDisconnected)
    }

    /// Returns true while the thread is running.
    pub fn is_alive(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        let _ = self.sender.send(RenderMessage::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("RenderThread '{}' panicked", self.name);
            } else {
                log::info!("RenderThread '{}' stopped", self.name);
            }
        }
    }
}

impl std::fmt::Debug for RenderThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderThread")
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}
