//! Resolver worker configuration.

/// Settings applied each time the resolver worker thread is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Name given to the worker thread
    pub thread_name: String,
    /// Worker thread stack size in bytes
    pub stack_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            thread_name: "resolver".to_string(),
            stack_size: 128 * 1024, // 128 KB
        }
    }
}

impl ResolverConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker thread stack size.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }
}
