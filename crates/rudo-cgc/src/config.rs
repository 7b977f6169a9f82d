//! Collector tuning knobs.

/// Default target ratio of occupied registry slots to total slots.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.4;

/// Default growth allowance of the live set between automatic collections.
pub const DEFAULT_SWEEP_FACTOR: f64 = 2.0;

/// Configuration for a [`Collector`](crate::Collector).
///
/// # Example
///
/// ```
/// use rudo_cgc::GcConfig;
///
/// let config = GcConfig::default().with_sweep_factor(1.0).with_max_slots(4733);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcConfig {
    /// Upper bound on `tracked / slots` after every completed resize.
    pub load_factor: f64,
    /// After a sweep leaving `n` survivors, the next automatic collection
    /// runs once more than `n + n * sweep_factor` blocks are tracked.
    pub sweep_factor: f64,
    /// Hard cap on the registry's slot count. Growing past it is reported as
    /// an allocation failure.
    pub max_slots: usize,
}

impl GcConfig {
    /// Create a configuration with the default factors and no slot cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            sweep_factor: DEFAULT_SWEEP_FACTOR,
            max_slots: usize::MAX,
        }
    }

    /// Set the load factor.
    #[must_use]
    pub const fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Set the sweep factor.
    #[must_use]
    pub const fn with_sweep_factor(mut self, sweep_factor: f64) -> Self {
        self.sweep_factor = sweep_factor;
        self
    }

    /// Set the registry slot cap.
    #[must_use]
    pub const fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    /// Check that both factors are usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err("load_factor must be in (0, 1]");
        }
        if !(self.sweep_factor >= 0.0 && self.sweep_factor.is_finite()) {
            return Err("sweep_factor must be a finite, non-negative number");
        }
        Ok(())
    }

    /// Replace every invalid field with its default.
    pub(crate) fn sanitized(self) -> Self {
        let mut config = self;
        if !(config.load_factor > 0.0 && config.load_factor <= 1.0) {
            #[cfg(feature = "tracing")]
            tracing::warn!(load_factor = config.load_factor, "invalid load factor, using default");
            config.load_factor = DEFAULT_LOAD_FACTOR;
        }
        if !(config.sweep_factor >= 0.0 && config.sweep_factor.is_finite()) {
            #[cfg(feature = "tracing")]
            tracing::warn!(sweep_factor = config.sweep_factor, "invalid sweep factor, using default");
            config.sweep_factor = DEFAULT_SWEEP_FACTOR;
        }
        config
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self::new()
    }
}
