/// Configuration for heap-backed queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Usable capacity (default: 65535, i.e. 64K physical slots).
    ///
    /// One extra slot is always allocated to tell a full ring from an empty
    /// one. A capacity of 0 is treated as 1.
    pub capacity: usize,
}

impl Config {
    /// Creates a new configuration with the given usable capacity.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Usable capacity after clamping 0 up to 1.
    #[inline]
    pub const fn effective_capacity(&self) -> usize {
        if self.capacity == 0 {
            1
        } else {
            self.capacity
        }
    }

    /// Physical slot count (`capacity + 1`), or `None` on overflow.
    #[inline]
    pub const fn slots(&self) -> Option<usize> {
        self.effective_capacity().checked_add(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { capacity: 65_535 }
    }
}

/// Low latency configuration (4K physical slots, fits in L1 cache for u64)
pub const LOW_LATENCY_CONFIG: Config = Config::new(4_095);

/// High throughput configuration (256K physical slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(262_143);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_64k_slots() {
        assert_eq!(Config::default().slots(), Some(65_536));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = Config::new(0);
        assert_eq!(config.effective_capacity(), 1);
        assert_eq!(config.slots(), Some(2));
    }

    #[test]
    fn test_slots_overflow() {
        assert_eq!(Config::new(usize::MAX).slots(), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(LOW_LATENCY_CONFIG.slots(), Some(4_096));
        assert_eq!(HIGH_THROUGHPUT_CONFIG.slots(), Some(262_144));
    }
}
