//! Policy/Value-Netz auf `burn`: gemeinsamer Rumpf aus zwei ReLU-Schichten,
//! ein Aktionskopf (Logits) und ein skalarer Wertkopf.
//!
//! Trainiert wird auf `Autodiff<NdArray>`; Inferenz läuft über
//! [`AutodiffModule::valid`] ohne Gradientenbuchhaltung.

use crate::error::{PpoError, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Module};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::activation::log_softmax;
use burn::tensor::backend::Backend;
use burn::tensor::{Bool, ElementConversion, Int, Tensor, TensorData};
use rand::{Rng, RngCore};
use raumlern_core::PlacementPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// Backend für Training und Optimierer.
pub type TrainBackend = Autodiff<NdArray<f32>>;
/// Backend für Inferenz, ohne Autograd.
pub type InferBackend = NdArray<f32>;

type ModelRecord = <PolicyValueModel<TrainBackend> as Module<TrainBackend>>::Record;

#[derive(Module, Debug)]
pub struct PolicyValueModel<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    action_head: Linear<B>,
    value_head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> PolicyValueModel<B> {
    fn init(state_dim: usize, action_dim: usize, hidden: usize, device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(state_dim, hidden).init(device),
            fc2: LinearConfig::new(hidden, hidden).init(device),
            action_head: LinearConfig::new(hidden, action_dim).init(device),
            value_head: LinearConfig::new(hidden, 1).init(device),
            activation: Relu::new(),
        }
    }

    /// `[batch, state_dim]` → Logits `[batch, action_dim]` und Werte `[batch]`.
    pub fn forward(&self, states: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let x = self.activation.forward(self.fc1.forward(states));
        let x = self.activation.forward(self.fc2.forward(x));
        let logits = self.action_head.forward(x.clone());
        let values = self.value_head.forward(x).squeeze::<1>(1);
        (logits, values)
    }

    /// Gewichtsform `[fan_in, fan_out]` je Schicht, in Vorwärtsreihenfolge.
    fn layer_shapes(&self) -> [(&'static str, [usize; 2]); 4] {
        [
            ("fc1", self.fc1.weight.val().dims()),
            ("fc2", self.fc2.weight.val().dims()),
            ("action_head", self.action_head.weight.val().dims()),
            ("value_head", self.value_head.weight.val().dims()),
        ]
    }
}

/// Maske `[batch, action_dim]`: `true` ab Index `valid` der jeweiligen Zeile.
fn action_mask<B: Backend>(valid_actions: &[usize], action_dim: usize, device: &B::Device) -> Tensor<B, 2, Bool> {
    let data: Vec<bool> = valid_actions
        .iter()
        .flat_map(|&valid| (0..action_dim).map(move |j| j >= valid))
        .collect();
    Tensor::from_data(TensorData::new(data, [valid_actions.len(), action_dim]), device)
}

/// Log-Softmax mit −∞ an maskierten Stellen; deren Wahrscheinlichkeit ist exakt 0.
pub fn masked_log_softmax<B: Backend>(logits: Tensor<B, 2>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
    log_softmax(logits.mask_fill(mask, f32::NEG_INFINITY), 1)
}

fn states_tensor<B: Backend, S: AsRef<[f32]>>(states: &[S], state_dim: usize, device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = states.iter().flat_map(|s| s.as_ref().iter().copied()).collect();
    Tensor::from_data(
        TensorData::new(flat, [states.len(), state_dim]).convert::<B::FloatElem>(),
        device,
    )
}

fn float_tensor<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 1> {
    Tensor::from_data(
        TensorData::new(values.to_vec(), [values.len()]).convert::<B::FloatElem>(),
        device,
    )
}

fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor.into_data().iter::<f32>().collect()
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem::<f32>()
}

#[derive(Clone, Copy)]
struct BatchInput<'a> {
    states: &'a [Vec<f32>],
    actions: &'a [usize],
    valid_actions: &'a [usize],
    state_dim: usize,
    action_dim: usize,
}

struct BatchOutput<B: Backend> {
    log_probs: Tensor<B, 1>,
    values: Tensor<B, 1>,
    entropies: Tensor<B, 1>,
}

/// Ein Vorwärtspass über bereits gezogene Aktionen.
fn evaluate_batch<B: Backend>(model: &PolicyValueModel<B>, batch: BatchInput<'_>, device: &B::Device) -> BatchOutput<B> {
    let (logits, values) = model.forward(states_tensor::<B, _>(batch.states, batch.state_dim, device));
    let mask = action_mask::<B>(batch.valid_actions, batch.action_dim, device);
    let log_probs = masked_log_softmax(logits, mask.clone());
    // 0·(−∞) vermeiden: maskierte Stellen tragen 0 zur Entropie bei.
    let entropies = (log_probs.clone().exp() * log_probs.clone().mask_fill(mask, 0.0))
        .sum_dim(1)
        .squeeze::<1>(1)
        .neg();
    #[allow(clippy::cast_possible_wrap)]
    let actions: Vec<i64> = batch.actions.iter().map(|&a| a as i64).collect();
    let actions = Tensor::<B, 1, Int>::from_data(
        TensorData::new(actions, [batch.actions.len()]).convert::<B::IntElem>(),
        device,
    )
    .unsqueeze_dim::<2>(1);
    BatchOutput {
        log_probs: log_probs.gather(1, actions).squeeze::<1>(1),
        values,
        entropies,
    }
}

/// Kategoriale Verteilung über die ersten `valid` Aktionen; der Rest ist maskiert.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDistribution {
    log_probs: Vec<f32>,
    /// Wertschätzung aus demselben Vorwärtspass.
    pub value: f32,
}

impl ActionDistribution {
    /// Anzahl zulässiger Aktionen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log_probs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log_probs.is_empty()
    }

    #[must_use]
    pub fn log_prob(&self, action: usize) -> Option<f32> {
        self.log_probs.get(action).copied()
    }

    pub fn probs(&self) -> impl Iterator<Item = f32> + '_ {
        self.log_probs.iter().map(|lp| lp.exp())
    }

    #[must_use]
    pub fn entropy(&self) -> f32 {
        -self.log_probs.iter().map(|lp| lp.exp() * lp).sum::<f32>()
    }

    /// Zieht eine Aktion per inverser Verteilungsfunktion.
    pub fn sample(&self, rng: &mut dyn RngCore) -> (usize, f32) {
        let u: f32 = rng.gen();
        let mut cumulative = 0.0;
        let last = self.log_probs.len().saturating_sub(1);
        let action = self
            .probs()
            .position(|p| {
                cumulative += p;
                u < cumulative
            })
            .unwrap_or(last);
        (action, self.log_probs.get(action).copied().unwrap_or(f32::NEG_INFINITY))
    }
}

/// Ein Minibatch für den Clipped-Surrogate-Schritt.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<usize>,
    /// Log-Wahrscheinlichkeiten beim Ziehen (fest, nicht abgeleitet).
    pub old_log_probs: Vec<f32>,
    pub returns: Vec<f32>,
    pub advantages: Vec<f32>,
    /// Aktionsmaske je Eintrag: Anzahl gültiger Kandidaten.
    pub valid_actions: Vec<usize>,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Koeffizienten der Verlustfunktion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossCoefficients {
    pub clip_eps: f32,
    pub value_coef: f32,
    pub entropy_coef: f32,
}

/// Kennzahlen eines Optimierungsschritts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UpdateStats {
    pub actor_loss: f32,
    pub critic_loss: f32,
    pub entropy: f32,
    pub loss: f32,
    /// Anteil der Einträge, deren Verhältnis außerhalb des Clip-Bands lag.
    pub clip_fraction: f32,
}

/// Ergebnis von [`PolicyValueNet::evaluate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub log_probs: Vec<f32>,
    pub values: Vec<f32>,
    pub entropies: Vec<f32>,
}

/// Persistierte Form: Kopfdaten plus Recorder-Bytes des Moduls.
#[derive(Debug, Serialize, Deserialize)]
struct NetSnapshot {
    state_dim: usize,
    action_dim: usize,
    hidden_size: usize,
    record: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PolicyValueNet {
    state_dim: usize,
    action_dim: usize,
    hidden_size: usize,
    pub(crate) model: PolicyValueModel<TrainBackend>,
    device: NdArrayDevice,
}

impl PolicyValueNet {
    /// Initialisiert die Gewichte; `rng` liefert den Backend-Seed.
    pub fn new(state_dim: usize, action_dim: usize, hidden: usize, rng: &mut dyn RngCore) -> Self {
        let device = NdArrayDevice::default();
        TrainBackend::seed(rng.next_u64());
        Self {
            state_dim,
            action_dim,
            hidden_size: hidden,
            model: PolicyValueModel::init(state_dim, action_dim, hidden, &device),
            device,
        }
    }

    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    #[must_use]
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[must_use]
    pub fn n_params(&self) -> usize {
        self.model.num_params()
    }

    fn clamp_valid(&self, valid_actions: usize) -> usize {
        valid_actions.clamp(1, self.action_dim.max(1))
    }

    fn input<'a>(&self, states: &'a [Vec<f32>], actions: &'a [usize], valid_actions: &'a [usize]) -> BatchInput<'a> {
        BatchInput {
            states,
            actions,
            valid_actions,
            state_dim: self.state_dim,
            action_dim: self.action_dim,
        }
    }

    /// Maskierte Verteilung über die ersten `valid_actions` Aktionen.
    #[must_use]
    pub fn distribution(&self, state: &[f32], valid_actions: usize) -> ActionDistribution {
        let valid = self.clamp_valid(valid_actions);
        let model = self.model.valid();
        let (logits, values) = model.forward(states_tensor::<InferBackend, _>(&[state], self.state_dim, &self.device));
        let mask = action_mask::<InferBackend>(&[valid], self.action_dim, &self.device);
        let mut log_probs = to_vec(masked_log_softmax(logits, mask));
        log_probs.truncate(valid);
        ActionDistribution {
            log_probs,
            value: to_vec(values).first().copied().unwrap_or(0.0),
        }
    }

    /// Zieht eine Aktion und liefert ihre Log-Wahrscheinlichkeit.
    pub fn act(&self, state: &[f32], valid_actions: usize, rng: &mut dyn RngCore) -> (usize, f32) {
        self.distribution(state, valid_actions).sample(rng)
    }

    /// Berechnet Log-Wahrscheinlichkeiten, Werte und Entropien für bereits
    /// gezogene Aktionen neu, ohne zu sampeln.
    #[must_use]
    pub fn evaluate(&self, states: &[Vec<f32>], actions: &[usize], valid_actions: &[usize]) -> Evaluation {
        if states.is_empty() {
            return Evaluation::default();
        }
        let valid: Vec<usize> = valid_actions.iter().map(|&v| self.clamp_valid(v)).collect();
        let out = evaluate_batch(&self.model.valid(), self.input(states, actions, &valid), &self.device);
        Evaluation {
            log_probs: to_vec(out.log_probs),
            values: to_vec(out.values),
            entropies: to_vec(out.entropies),
        }
    }

    /// Verlust `actor + value_coef·critic − entropy_coef·entropy` als
    /// Autodiff-Tensor, dazu seine Kennzahlen.
    pub(crate) fn loss_tensor(&self, batch: &Batch, coefs: &LossCoefficients) -> (Tensor<TrainBackend, 1>, UpdateStats) {
        let valid: Vec<usize> = batch.valid_actions.iter().map(|&v| self.clamp_valid(v)).collect();
        let out = evaluate_batch(
            &self.model,
            self.input(&batch.states, &batch.actions, &valid),
            &self.device,
        );
        let old_log_probs = float_tensor::<TrainBackend>(&batch.old_log_probs, &self.device);
        let advantages = float_tensor::<TrainBackend>(&batch.advantages, &self.device);
        let returns = float_tensor::<TrainBackend>(&batch.returns, &self.device);

        let (low, high) = (1.0 - coefs.clip_eps, 1.0 + coefs.clip_eps);
        let ratio = (out.log_probs - old_log_probs).exp();
        let surr1 = ratio.clone() * advantages.clone();
        let surr2 = ratio.clone().clamp(low, high) * advantages;
        let actor_loss = surr1.min_pair(surr2).mean().neg();
        let critic_loss = (out.values - returns).powf_scalar(2.0).mean();
        let entropy = out.entropies.mean();
        let loss = actor_loss.clone() + critic_loss.clone() * coefs.value_coef
            - entropy.clone() * coefs.entropy_coef;

        let ratios = to_vec(ratio.detach());
        let clipped = ratios.iter().filter(|r| !(low..=high).contains(*r)).count();
        #[allow(clippy::cast_precision_loss)]
        let clip_fraction = clipped as f32 / ratios.len().max(1) as f32;

        let stats = UpdateStats {
            actor_loss: scalar(actor_loss.detach()),
            critic_loss: scalar(critic_loss.detach()),
            entropy: scalar(entropy.detach()),
            loss: scalar(loss.clone().detach()),
            clip_fraction,
        };
        (loss, stats)
    }

    /// Kennzahlen des Verlusts, ohne Schritt.
    #[must_use]
    pub fn loss(&self, batch: &Batch, coefs: &LossCoefficients) -> UpdateStats {
        if batch.is_empty() {
            return UpdateStats::default();
        }
        self.loss_tensor(batch, coefs).1
    }

    fn to_snapshot(&self) -> Result<NetSnapshot> {
        let record = BinBytesRecorder::<FullPrecisionSettings>::default()
            .record(self.model.clone().into_record(), ())
            .map_err(|e| PpoError::Record(format!("{e:?}")))?;
        Ok(NetSnapshot {
            state_dim: self.state_dim,
            action_dim: self.action_dim,
            hidden_size: self.hidden_size,
            record,
        })
    }

    fn from_snapshot(snapshot: NetSnapshot) -> Result<Self> {
        let device = NdArrayDevice::default();
        let record: ModelRecord = BinBytesRecorder::<FullPrecisionSettings>::default()
            .load(snapshot.record, &device)
            .map_err(|e| PpoError::Record(format!("{e:?}")))?;
        let model = PolicyValueModel::init(snapshot.state_dim, snapshot.action_dim, snapshot.hidden_size, &device)
            .load_record(record);
        let net = Self {
            state_dim: snapshot.state_dim,
            action_dim: snapshot.action_dim,
            hidden_size: snapshot.hidden_size,
            model,
            device,
        };
        net.check_shapes()?;
        Ok(net)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer(file, &self.to_snapshot()?)?;
        Ok(())
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_snapshot(serde_json::from_reader(file)?)
    }

    /// Prüft die geladenen Gewichte gegen die Kopfdaten.
    fn check_shapes(&self) -> Result<()> {
        let hidden = self.hidden_size;
        let expected = [
            [self.state_dim, hidden],
            [hidden, hidden],
            [hidden, self.action_dim],
            [hidden, 1],
        ];
        for ((name, found), want) in self.model.layer_shapes().into_iter().zip(expected) {
            if found != want {
                return Err(PpoError::Shape(format!(
                    "{name}: expected {}x{}, found {}x{}",
                    want[0], want[1], found[0], found[1]
                )));
            }
        }
        Ok(())
    }
}

impl PlacementPolicy for PolicyValueNet {
    fn act(&self, state: &[f32], valid_actions: usize, rng: &mut dyn RngCore) -> (usize, f32) {
        PolicyValueNet::act(self, state, valid_actions, rng)
    }

    fn value(&self, state: &[f32]) -> f32 {
        self.distribution(state, 1).value
    }

    fn snapshot(&self) -> Value {
        self.to_snapshot()
            .and_then(|s| serde_json::to_value(s).map_err(PpoError::from))
            .unwrap_or(Value::Null)
    }

    fn load(&mut self, snapshot: Value) -> raumlern_core::Result<()> {
        let snapshot: NetSnapshot = serde_json::from_value(snapshot)?;
        if (snapshot.state_dim, snapshot.action_dim) != (self.state_dim, self.action_dim) {
            return Err(raumlern_core::CoreError::InvalidSnapshot(format!(
                "snapshot is {}→{}, policy is {}→{}",
                snapshot.state_dim, snapshot.action_dim, self.state_dim, self.action_dim
            )));
        }
        *self = Self::from_snapshot(snapshot)
            .map_err(|e| raumlern_core::CoreError::InvalidSnapshot(e.to_string()))?;
        Ok(())
    }
}
