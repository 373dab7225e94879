//! Agent configuration

use serde::{Deserialize, Serialize};

use civic_core::{CivicError, Priority, Result};

/// Tunables for the priority agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size α of the incremental-mean update, in (0, 1]
    pub learning_rate: f64,

    /// Exploration probability ε, in [0, 1]. Zero means purely greedy.
    pub epsilon: f64,

    /// Order used to break ties between equally valued priorities
    pub tie_break: Vec<Priority>,

    /// Pending-queue band boundaries
    pub buckets: BucketBounds,
}

fn default_learning_rate() -> f64 {
    0.1
}
fn default_epsilon() -> f64 {
    0.0
}
fn default_tie_break() -> Vec<Priority> {
    Priority::ALL.to_vec()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epsilon: default_epsilon(),
            tie_break: default_tie_break(),
            buckets: BucketBounds::default(),
        }
    }
}

impl AgentConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_tie_break(mut self, order: [Priority; 3]) -> Self {
        self.tie_break = order.to_vec();
        self
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> Result<()> {
        validate_learning_rate(self.learning_rate)?;
        validate_epsilon(self.epsilon)?;
        self.buckets.validate()?;
        self.tie_break_order()?;
        Ok(())
    }

    /// Tie-break order as a fixed array; must be a permutation of all three priorities
    pub fn tie_break_order(&self) -> Result<[Priority; 3]> {
        let order: [Priority; 3] = self.tie_break.as_slice().try_into().map_err(|_| {
            CivicError::InvalidConfig(format!(
                "tie_break must list exactly 3 priorities, got {}",
                self.tie_break.len()
            ))
        })?;
        for p in Priority::ALL {
            if !order.contains(&p) {
                return Err(CivicError::InvalidConfig(format!(
                    "tie_break is missing {p}"
                )));
            }
        }
        Ok(order)
    }
}

pub(crate) fn validate_learning_rate(alpha: f64) -> Result<()> {
    if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(CivicError::InvalidConfig(format!(
            "learning_rate must be in (0, 1], got {alpha}"
        )))
    }
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<()> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(())
    } else {
        Err(CivicError::InvalidConfig(format!(
            "epsilon must be in [0, 1], got {epsilon}"
        )))
    }
}

/// Pending-count band boundaries.
///
/// `pending < low_below` is LOW, `pending > high_above` is HIGH, anything in
/// between is MEDIUM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketBounds {
    pub low_below: u64,
    pub high_above: u64,
}

impl Default for BucketBounds {
    fn default() -> Self {
        Self {
            low_below: 5,
            high_above: 20,
        }
    }
}

impl BucketBounds {
    pub fn new(low_below: u64, high_above: u64) -> Self {
        Self {
            low_below,
            high_above,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.low_below > self.high_above {
            return Err(CivicError::InvalidConfig(format!(
                "buckets.low_below ({}) must not exceed buckets.high_above ({})",
                self.low_below, self.high_above
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.epsilon, 0.0);
        assert_eq!(
            config.tie_break_order().unwrap(),
            [Priority::High, Priority::Medium, Priority::Low]
        );
        assert_eq!(config.buckets, BucketBounds::new(5, 20));
    }

    #[test]
    fn test_learning_rate_bounds() {
        assert!(AgentConfig::default().with_learning_rate(1.0).validate().is_ok());
        assert!(AgentConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(AgentConfig::default().with_learning_rate(1.5).validate().is_err());
        assert!(AgentConfig::default().with_learning_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_epsilon_bounds() {
        assert!(AgentConfig::default().with_epsilon(1.0).validate().is_ok());
        assert!(AgentConfig::default().with_epsilon(-0.1).validate().is_err());
        assert!(AgentConfig::default().with_epsilon(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_tie_break_must_be_permutation() {
        let mut config = AgentConfig::default();
        config.tie_break = vec![Priority::High, Priority::High, Priority::Low];
        assert!(matches!(config.validate(), Err(CivicError::InvalidConfig(_))));

        config.tie_break = vec![Priority::Low, Priority::Medium];
        assert!(config.validate().is_err());

        let config = AgentConfig::default().with_tie_break([
            Priority::Low,
            Priority::Medium,
            Priority::High,
        ]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_bounds_order() {
        assert!(BucketBounds::new(10, 10).validate().is_ok());
        assert!(BucketBounds::new(11, 10).validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"epsilon": 0.2, "tie_break": ["medium", "high", "low"]}"#)
                .unwrap();
        assert_eq!(config.epsilon, 0.2);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.tie_break[0], Priority::Medium);
        assert_eq!(config.buckets.high_above, 20);
    }
}
