#![warn(clippy::unwrap_used, clippy::expect_used)]

//! PPO für die Möbelplatzierung.
//!
//! [`PolicyValueNet`] ist ein kleines `burn`-MLP mit Policy- und Wertkopf, das das
//! [`PlacementPolicy`](raumlern_core::PlacementPolicy)-Trait implementiert.
//! Der [`Trainer`] spielt Episoden in der
//! [`PlacementEnv`](raumlern_core::PlacementEnv), verwirft unzulässige
//! Ziehungen per Pufferbox-Test und aktualisiert das Netz nach jeder
//! erfolgreichen Episode mit dem Clipped-Surrogate-Ziel.

pub mod config;
pub mod error;
pub mod net;
pub mod optim;
pub mod trainer;

pub use config::TrainingConfig;
pub use error::{PpoError, Result};
pub use net::{
    ActionDistribution, Batch, InferBackend, LossCoefficients, PolicyValueModel, PolicyValueNet,
    TrainBackend, UpdateStats,
};
pub use optim::PolicyOptimizer;
pub use trainer::{
    discounted_returns, sample_feasible, EpisodeOutcome, EpisodeReport, FailureReason, Trainer,
    TrainingSummary, Trajectory, TrajectoryStep,
};
