//! Runtime configuration options

/// Configuration options for the Cinder runtime
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub debug_mode: bool,
    pub trace: bool,
}

impl RuntimeConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode (load summaries and final globals)
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Enable or disable per-instruction tracing
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
