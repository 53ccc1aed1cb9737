use legman_core::{Fields, LegmanConfig, LegmanError, Transform, Value};

use crate::node::Legman;

/// Builder for a root node with custom defaults and configuration.
#[derive(Debug, Clone, Default)]
pub struct LegmanBuilder {
    defaults: Fields,
    config: LegmanConfig,
}

impl LegmanBuilder {
    /// Start with no default fields and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default fields.
    #[must_use]
    pub fn defaults(mut self, defaults: impl Into<Fields>) -> Self {
        self.defaults = defaults.into();
        self
    }

    /// Add one default field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Set the high-water mark.
    ///
    /// Behavior and trade-offs:
    /// - Lower values stall producers sooner and keep fewer records in memory.
    /// - Higher values absorb bursts from fast producers at the cost of memory.
    /// - Must be at least 1.
    #[must_use]
    pub fn high_water_mark(mut self, hwm: usize) -> Self {
        self.config.high_water_mark = hwm;
        self
    }

    /// Toggle logging of transform failures nobody listens for.
    #[must_use]
    pub fn log_unhandled_errors(mut self, yes: bool) -> Self {
        self.config.log_unhandled_errors = yes;
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: LegmanConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the node.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration fails validation.
    pub fn build(self) -> Result<Legman, LegmanError> {
        self.config.validate()?;
        Ok(Legman::from_parts(
            Transform::normalize(self.defaults),
            self.config,
        ))
    }
}
