/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Maximum number of instances attached to a single combatant.
    pub container_capacity: usize,
    /// Lower bound for the remaining seconds written into an add message, so
    /// an instance about to expire is never encoded as "0 ⇒ default duration".
    pub min_sync_remaining_secs: f32,
}

impl EngineConfig {
    // ===== hard limits =====
    /// Instance ids are a byte and `u8::MAX` marks "unassigned".
    pub const MAX_CONTAINER_CAPACITY: usize = 254;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CONTAINER_CAPACITY: usize = 32;
    pub const DEFAULT_MIN_SYNC_REMAINING_SECS: f32 = 0.05;

    pub fn new() -> Self {
        Self {
            container_capacity: Self::DEFAULT_CONTAINER_CAPACITY,
            min_sync_remaining_secs: Self::DEFAULT_MIN_SYNC_REMAINING_SECS,
        }
    }

    pub fn with_container_capacity(container_capacity: usize) -> Self {
        Self {
            container_capacity,
            ..Self::new()
        }
    }

    /// Capacity clamped to what instance ids can address.
    pub fn effective_capacity(&self) -> usize {
        self.container_capacity.clamp(1, Self::MAX_CONTAINER_CAPACITY)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
