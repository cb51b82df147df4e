//! Hyperparameter des Trainings, einmal beim Start gebaut und durchgereicht.

use crate::error::{PpoError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Diskontfaktor γ.
    pub gamma: f64,
    /// Halbe Breite des Clip-Bands um 1.
    pub clip_eps: f32,
    pub learning_rate: f32,
    /// Gradientenschritte pro erfolgreicher Episode.
    pub update_epochs: usize,
    /// Rand der Pufferbox beim Rejection-Sampling.
    pub buffer_margin: f64,
    pub value_coef: f32,
    pub entropy_coef: f32,
    pub hidden_size: usize,
    /// Fester Seed für reproduzierbare Läufe; sonst aus Entropie.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 200,
            gamma: 0.99,
            clip_eps: 0.2,
            learning_rate: 1e-3,
            update_epochs: 5,
            buffer_margin: 0.1,
            value_coef: 0.5,
            entropy_coef: 0.01,
            hidden_size: 128,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(PpoError::InvalidConfig(format!(
                "gamma must lie in [0, 1], got {}",
                self.gamma
            )));
        }
        if !(self.clip_eps > 0.0 && self.clip_eps < 1.0) {
            return Err(PpoError::InvalidConfig(format!(
                "clip_eps must lie in (0, 1), got {}",
                self.clip_eps
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PpoError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.hidden_size == 0 {
            return Err(PpoError::InvalidConfig("hidden_size must be positive".into()));
        }
        if self.buffer_margin < 0.0 {
            return Err(PpoError::InvalidConfig(format!(
                "buffer_margin must not be negative, got {}",
                self.buffer_margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: TrainingConfig =
            serde_json::from_str(r#"{"episodes": 10, "seed": 7}"#).expect("valid config");
        assert_eq!(cfg.episodes, 10);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.update_epochs, 5);
    }

    #[test]
    fn bad_gamma_is_rejected() {
        let cfg = TrainingConfig {
            gamma: 1.5,
            ..TrainingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PpoError::InvalidConfig(_))));
    }
}
