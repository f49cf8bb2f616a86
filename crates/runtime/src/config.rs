use std::time::Duration;

use status_core::EngineConfig;

/// Runtime configuration shared across participants and the tick driver.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub tick_interval: Duration,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}
