#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Raumlern core: Raum, Möbelkatalog, Kandidaten-Generator, Belohnungsregeln
//! und die Platzierungsumgebung.
//!
//! Das Trait [`PlacementPolicy`] ist die Naht zwischen Umgebung und
//! lernender Policy; die PPO-Implementierung liegt in `raumlern-ppo`.

pub mod candidates;
pub mod env;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod reward;
pub mod room;
pub mod telemetry;

pub use candidates::{CandidateSet, Position};
pub use env::{EpisodeStatus, PlacementEnv, PlacementState, RewardBreakdown, StepEvent, StepOutcome};
pub use error::{CoreError, Result};
pub use geometry::{violates_buffer_box, Rect};
pub use layout::{Layout, PlacedItem};
pub use reward::{RewardRule, RewardRuleSet, RewardWeights};
pub use room::{default_catalog, FurnitureKind, FurnitureSpec, RoomSpec};

use rand::RngCore;
use serde_json::Value;

/// Eine Policy, die pro Möbelstück einen Kandidatenindex wählt.
pub trait PlacementPolicy {
    /// Zieht eine Aktion aus den ersten `valid_actions` Kandidaten und liefert
    /// sie zusammen mit ihrer Log-Wahrscheinlichkeit.
    fn act(&self, state: &[f32], valid_actions: usize, rng: &mut dyn RngCore) -> (usize, f32);
    /// Wertschätzung des Zustands.
    fn value(&self, state: &[f32]) -> f32;
    /// Persistiert die Parameter als JSON.
    fn snapshot(&self) -> Value;
    /// Stellt die Parameter aus einem Snapshot wieder her.
    fn load(&mut self, snapshot: Value) -> Result<()>;
}
