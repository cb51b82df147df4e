//! Trainingsschleife: Episoden ausrollen, Aktionen per Rejection-Sampling
//! filtern, diskontierte Returns berechnen und das Netz mit dem
//! Clipped-Surrogate-Ziel aktualisieren.
//!
//! Zum Rejection-Sampling: alle Versuche für ein Möbelstück ziehen aus
//! derselben Verteilung (ein Vorwärtspass). Verworfene Ziehungen werden nicht
//! aufgezeichnet; nur die akzeptierte Aktion und ihre Log-Wahrscheinlichkeit
//! gehen in die Trajektorie. Das ist bewusst nicht rein on-policy: die
//! tatsächlich ausgeführte Verteilung ist die auf zulässige Aktionen
//! bedingte, das Verhältnis im Update nutzt aber die unbedingte.

use crate::config::TrainingConfig;
use crate::error::{PpoError, Result};
use crate::net::{ActionDistribution, Batch, LossCoefficients, PolicyValueNet, UpdateStats};
use crate::optim::PolicyOptimizer;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use raumlern_core::{
    telemetry, violates_buffer_box, CandidateSet, FurnitureSpec, Layout, PlacedItem, PlacementEnv,
    PlacementState, Rect, StepEvent,
};
use serde::Serialize;

/// Ein Eintrag der Trajektorie, einer pro erfolgreich platziertem Möbel.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryStep {
    pub state: Vec<f32>,
    pub action: usize,
    pub log_prob: f32,
    pub value: f32,
    pub reward: f64,
    pub valid_actions: usize,
}

/// Trajektorie genau einer Episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub steps: Vec<TrajectoryStep>,
}

impl Trajectory {
    #[must_use]
    pub fn rewards(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.reward).collect()
    }

    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    /// Baut den Optimierungsbatch; Werte gehen nur als feste Basislinie ein.
    #[must_use]
    pub fn to_batch(&self, gamma: f64) -> Batch {
        let returns = discounted_returns(&self.rewards(), gamma);
        #[allow(clippy::cast_possible_truncation)]
        let returns: Vec<f32> = returns.into_iter().map(|r| r as f32).collect();
        let advantages = returns
            .iter()
            .zip(&self.steps)
            .map(|(r, s)| r - s.value)
            .collect();
        Batch {
            states: self.steps.iter().map(|s| s.state.clone()).collect(),
            actions: self.steps.iter().map(|s| s.action).collect(),
            old_log_probs: self.steps.iter().map(|s| s.log_prob).collect(),
            returns,
            advantages,
            valid_actions: self.steps.iter().map(|s| s.valid_actions).collect(),
        }
    }
}

/// Diskontierte Returns per Rückwärtsrekursion `R_t = r_t + γ·R_{t+1}`.
#[must_use]
pub fn discounted_returns(rewards: &[f64], gamma: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for (t, r) in rewards.iter().enumerate().rev() {
        running = r + gamma * running;
        returns[t] = running;
    }
    returns
}

/// Warum eine Episode abgebrochen wurde.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Kein Versuch innerhalb des Budgets bestand den Pufferbox-Test.
    NoFeasibleAction { item: usize, name: String, attempts: usize },
    /// Die Umgebung lieferte eine negative Belohnung.
    Rejected { item: usize, name: String, reward: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EpisodeOutcome {
    Success,
    Failed(FailureReason),
}

/// Bericht über eine Episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeReport {
    /// Laufende Nummer, ab 1.
    pub episode: usize,
    pub status: EpisodeOutcome,
    /// Summe der Belohnungen aller platzierten Möbel.
    pub total_reward: f64,
    pub layout: Layout,
    /// Nur gesetzt, wenn ein Update stattfand.
    pub update: Option<UpdateStats>,
}

impl EpisodeReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == EpisodeOutcome::Success
    }
}

/// Zusammenfassung eines ganzen Trainingslaufs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub successes: usize,
    pub best_reward: Option<f64>,
    pub best_layout: Option<Layout>,
    pub last_layout: Option<Layout>,
}

/// Zieht aus `dist`, bis eine Aktion den Pufferbox-Test gegen alle bereits
/// platzierten Möbel besteht; höchstens `candidates.len()` Versuche.
pub fn sample_feasible(
    dist: &ActionDistribution,
    candidates: &CandidateSet,
    spec: &FurnitureSpec,
    placed: &[PlacedItem],
    margin: f64,
    rng: &mut dyn RngCore,
) -> Option<(usize, f32)> {
    let others: Vec<Rect> = placed.iter().map(PlacedItem::rect).collect();
    for _ in 0..candidates.len() {
        let (action, log_prob) = dist.sample(rng);
        let Some(position) = candidates.get(action) else {
            continue;
        };
        let rect = spec.footprint(position.x, position.y);
        if !violates_buffer_box(&rect, &others, margin) {
            return Some((action, log_prob));
        }
    }
    None
}

pub struct Trainer {
    env: PlacementEnv,
    net: PolicyValueNet,
    optimizer: PolicyOptimizer,
    config: TrainingConfig,
    rng: StdRng,
    state: PlacementState,
}

impl Trainer {
    /// Neues Netz passend zur Umgebung.
    pub fn new(env: PlacementEnv, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let net = PolicyValueNet::new(env.state_dim(), env.action_dim(), config.hidden_size, &mut rng);
        Self::assemble(env, net, config, rng)
    }

    /// Setzt ein vorhandenes (z. B. geladenes) Netz ein.
    pub fn with_policy(env: PlacementEnv, net: PolicyValueNet, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::assemble(env, net, config, rng)
    }

    fn assemble(env: PlacementEnv, net: PolicyValueNet, config: TrainingConfig, rng: StdRng) -> Result<Self> {
        if net.state_dim() != env.state_dim() || net.action_dim() != env.action_dim() {
            return Err(PpoError::Shape(format!(
                "network is {}→{}, environment needs {}→{}",
                net.state_dim(),
                net.action_dim(),
                env.state_dim(),
                env.action_dim()
            )));
        }
        let optimizer = PolicyOptimizer::new(config.learning_rate);
        let state = env.new_episode();
        Ok(Self {
            env,
            net,
            optimizer,
            config,
            rng,
            state,
        })
    }

    #[must_use]
    pub fn env(&self) -> &PlacementEnv {
        &self.env
    }

    #[must_use]
    pub fn policy(&self) -> &PolicyValueNet {
        &self.net
    }

    #[must_use]
    pub fn into_policy(self) -> PolicyValueNet {
        self.net
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Zustand der zuletzt gespielten Episode.
    #[must_use]
    pub fn episode_state(&self) -> &PlacementState {
        &self.state
    }

    fn coefficients(&self) -> LossCoefficients {
        LossCoefficients {
            clip_eps: self.config.clip_eps,
            value_coef: self.config.value_coef,
            entropy_coef: self.config.entropy_coef,
        }
    }

    /// Spielt eine Episode; `Err` heißt nur Programmierfehler, ein
    /// Abbruch der Episode steht im Bericht.
    fn play(&mut self) -> Result<(Trajectory, Option<FailureReason>)> {
        let mut obs = self.env.reset(&mut self.state);
        let mut trajectory = Trajectory::default();

        while let Some(index) = self.state.cursor() {
            let spec = self
                .env
                .current_spec(&self.state)
                .cloned()
                .ok_or_else(|| PpoError::Shape(format!("no catalog item at {index}")))?;
            let candidates = self.env.candidates_for(index);
            let dist = self.net.distribution(&obs, candidates.len());

            let Some((action, log_prob)) = sample_feasible(
                &dist,
                &candidates,
                &spec,
                self.state.placed(),
                self.config.buffer_margin,
                &mut self.rng,
            ) else {
                return Ok((
                    trajectory,
                    Some(FailureReason::NoFeasibleAction {
                        item: index,
                        name: spec.name,
                        attempts: candidates.len(),
                    }),
                ));
            };

            let outcome = self.env.step(&mut self.state, action)?;
            if outcome.reward < 0.0 {
                telemetry::debug(&format!("episode rejected at {}: {:?}", spec.name, outcome.event));
                return Ok((
                    trajectory,
                    Some(FailureReason::Rejected {
                        item: index,
                        name: spec.name,
                        reward: outcome.reward,
                    }),
                ));
            }
            debug_assert!(matches!(outcome.event, StepEvent::Placed(_)));

            trajectory.steps.push(TrajectoryStep {
                state: obs,
                action,
                log_prob,
                value: dist.value,
                reward: outcome.reward,
                valid_actions: candidates.len(),
            });
            obs = outcome.state;
        }

        Ok((trajectory, None))
    }

    /// Clipped-Surrogate-Updates auf einer vollständigen Trajektorie.
    pub fn update(&mut self, trajectory: &Trajectory) -> UpdateStats {
        let batch = trajectory.to_batch(self.config.gamma);
        let coefs = self.coefficients();
        let mut stats = UpdateStats::default();
        for _ in 0..self.config.update_epochs {
            stats = self.optimizer.step(&mut self.net, &batch, &coefs);
        }
        stats
    }

    /// Eine Trainingsepisode. Fehlgeschlagene Episoden liefern kein Update.
    pub fn run_episode(&mut self, episode: usize) -> Result<EpisodeReport> {
        let (trajectory, failure) = self.play()?;
        let total_reward = trajectory.total_reward();
        let layout = self.env.layout(&self.state);

        let (status, update) = match failure {
            Some(reason) => (EpisodeOutcome::Failed(reason), None),
            None => {
                let stats = self.update(&trajectory);
                telemetry::debug(&format!("episode {episode} update: {stats:?}"));
                (EpisodeOutcome::Success, Some(stats))
            }
        };

        Ok(EpisodeReport {
            episode,
            status,
            total_reward,
            layout,
            update,
        })
    }

    /// Spielt eine Episode mit der aktuellen Policy, ohne zu lernen.
    pub fn rollout(&mut self) -> Result<EpisodeReport> {
        let (trajectory, failure) = self.play()?;
        Ok(EpisodeReport {
            episode: 0,
            status: failure.map_or(EpisodeOutcome::Success, EpisodeOutcome::Failed),
            total_reward: trajectory.total_reward(),
            layout: self.env.layout(&self.state),
            update: None,
        })
    }

    /// Alle Episoden der Konfiguration; `on_episode` sieht jeden Bericht.
    pub fn train(&mut self, mut on_episode: impl FnMut(&EpisodeReport)) -> Result<TrainingSummary> {
        telemetry::info(&format!(
            "training {} episodes: state_dim={} action_dim={} params={}",
            self.config.episodes,
            self.env.state_dim(),
            self.env.action_dim(),
            self.net.n_params()
        ));

        let mut summary = TrainingSummary::default();
        for episode in 1..=self.config.episodes {
            let report = self.run_episode(episode)?;
            summary.episodes += 1;
            if report.succeeded() {
                summary.successes += 1;
                if summary.best_reward.map_or(true, |best| report.total_reward > best) {
                    summary.best_reward = Some(report.total_reward);
                    summary.best_layout = Some(report.layout.clone());
                }
                summary.last_layout = Some(report.layout.clone());
            }
            on_episode(&report);
        }
        Ok(summary)
    }
}
