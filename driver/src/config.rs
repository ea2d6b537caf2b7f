//! Driver configuration.

use crate::error::DriverError;

/// Backend implementation to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Pick the best compiled-in backend.
    #[default]
    Default,
    /// In-memory backend that executes no GPU work.
    Noop,
}

impl BackendKind {
    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Noop => "noop",
        }
    }
}

/// Where recorded commands execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadingMode {
    /// On the recording thread, at flush time.
    Inline,
    /// On a dedicated render thread.
    #[default]
    RenderThread,
}

/// Configuration for a driver and its command stream.
///
/// Use [`Default::default()`] for a render-thread setup on the default backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Backend to create. Default: [`BackendKind::Default`].
    pub backend: BackendKind,
    /// Where commands execute. Default: [`ThreadingMode::RenderThread`].
    pub threading: ThreadingMode,
    /// Commands recorded before the pending buffer is flushed automatically.
    /// Default: 1024.
    pub command_buffer_capacity: usize,
    /// Name given to the render thread. Default: `"lumen-render"`.
    pub render_thread_name: String,
    /// Log lookups of stale or unknown handles. Default: `true`.
    pub validate_handles: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Default,
            threading: ThreadingMode::RenderThread,
            command_buffer_capacity: 1024,
            render_thread_name: "lumen-render".to_string(),
            validate_handles: true,
        }
    }
}

impl DriverConfig {
    /// Same as [`DriverConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend to create.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set where recorded commands execute.
    pub fn with_threading(mut self, threading: ThreadingMode) -> Self {
        self.threading = threading;
        self
    }

    /// Set how many commands are buffered before an automatic flush.
    pub fn with_command_buffer_capacity(mut self, capacity: usize) -> Self {
        self.command_buffer_capacity = capacity;
        self
    }

    /// Set the render thread's name.
    pub fn with_render_thread_name(mut self, name: impl Into<String>) -> Self {
        self.render_thread_name = name.into();
        self
    }

    /// Enable or disable logging and debug assertions on stale handles.
    pub fn with_validate_handles(mut self, validate: bool) -> Self {
        self.validate_handles = validate;
        self
    }

    /// Check the configuration for values the driver cannot work with.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.command_buffer_capacity == 0 {
            return Err(DriverError::InvalidParameter(
                "command_buffer_capacity must be at least 1".to_string(),
            ));
        }
        if self.threading == ThreadingMode::RenderThread && self.render_thread_name.is_empty() {
            return Err(DriverError::InvalidParameter(
                "render_thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threading, ThreadingMode::RenderThread);
        assert_eq!(config.command_buffer_capacity, 1024);
    }

    #[test]
    fn test_builder() {
        let config = DriverConfig::new()
            .with_backend(BackendKind::Noop)
            .with_threading(ThreadingMode::Inline)
            .with_command_buffer_capacity(8)
            .with_render_thread_name("gpu")
            .with_validate_handles(false);
        assert_eq!(config.backend, BackendKind::Noop);
        assert_eq!(config.threading, ThreadingMode::Inline);
        assert_eq!(config.command_buffer_capacity, 8);
        assert_eq!(config.render_thread_name, "gpu");
        assert!(!config.validate_handles);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DriverConfig::new().with_command_buffer_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(DriverError::InvalidParameter(_))
        ));

        let config = DriverConfig::new().with_render_thread_name("");
        assert!(config.validate().is_err());

        // The name is unused inline.
        let config = DriverConfig::new()
            .with_threading(ThreadingMode::Inline)
            .with_render_thread_name("");
        assert!(config.validate().is_ok());
    }
}
