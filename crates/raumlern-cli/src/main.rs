//! CLI for raumlern.
//!
//! Trains the placement policy, inspects candidate sets, samples layouts from
//! a saved model, runs reward ablations and summarizes their logs. Episode
//! lines go to stdout; diagnostics go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use raumlern_core::reward::{load_overrides, write_overrides};
use raumlern_core::{default_catalog, FurnitureSpec, PlacementEnv, RewardRuleSet, RoomSpec};
use raumlern_feedback::ablation::{self, RunPaths};
use raumlern_feedback::{format_episode_line, RewardTable};
use raumlern_ppo::{EpisodeReport, PolicyValueNet, Trainer, TrainingConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the placement policy and print one line per episode
    Train {
        #[command(flatten)]
        setup: SetupArgs,

        #[command(flatten)]
        training: TrainingArgs,

        /// Write the trained network to this file
        #[arg(long)]
        save_model: Option<PathBuf>,

        /// Write the best layout found during training to this file
        #[arg(long)]
        layout_out: Option<PathBuf>,
    },
    /// Print the candidate positions of every catalog item
    Candidates {
        /// Path to a room description (JSON)
        #[arg(long)]
        room: Option<PathBuf>,

        /// Only show this item
        #[arg(long)]
        item: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Sample a layout from a saved model
    Layout {
        #[command(flatten)]
        setup: SetupArgs,

        /// Saved network
        #[arg(long)]
        model: PathBuf,

        /// Output file for the layout JSON
        #[arg(long, default_value = "layout.json")]
        out: PathBuf,

        /// Episodes to try before giving up
        #[arg(long, default_value = "10")]
        attempts: usize,

        /// RNG seed for sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Train once per reward ablation preset and keep logs and configs
    Ablate {
        /// Path to a room description (JSON)
        #[arg(long)]
        room: Option<PathBuf>,

        #[command(flatten)]
        training: TrainingArgs,

        /// Presets to run (default: all)
        #[arg(long = "preset")]
        presets: Vec<String>,

        /// Reward config file the presets are written to
        #[arg(long, default_value = "reward_config.yaml")]
        reward_config: PathBuf,

        /// Directory for run logs and archived configs
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,

        /// List presets and exit
        #[arg(long)]
        list: bool,
    },
    /// Compile all run logs into one CSV and print per-run statistics
    Summarize {
        /// Directory containing `*.txt` training logs
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,

        /// Output CSV path
        #[arg(long, default_value = "ablation_rewards.csv")]
        csv: PathBuf,
    },
}

#[derive(Args)]
struct SetupArgs {
    /// Path to a room description (JSON)
    #[arg(long)]
    room: Option<PathBuf>,

    /// Reward rule overrides (YAML)
    #[arg(long, default_value = "reward_config.yaml")]
    reward_config: PathBuf,
}

#[derive(Args)]
struct TrainingArgs {
    /// Training config file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Hidden layer width
    #[arg(long)]
    hidden: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f32>,
}

impl TrainingArgs {
    fn resolve(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open training config {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("failed to parse training config {}", path.display()))?
            }
            None => TrainingConfig::default(),
        };
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(hidden) = self.hidden {
            config.hidden_size = hidden;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Room and catalog as read from `--room`. Missing parts fall back to the
/// default bedroom.
#[derive(Deserialize, Debug)]
struct RoomFile {
    #[serde(default)]
    room: RoomSpec,
    #[serde(default = "default_catalog")]
    catalog: Vec<FurnitureSpec>,
}

impl RoomFile {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                room: RoomSpec::default(),
                catalog: default_catalog(),
            });
        };
        let file =
            File::open(path).with_context(|| format!("failed to open room {}", path.display()))?;
        let room = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse room {}", path.display()))?;
        Ok(room)
    }
}

fn build_env(room: Option<&Path>, rules: RewardRuleSet) -> Result<PlacementEnv> {
    let RoomFile { room, catalog } = RoomFile::load(room)?;
    PlacementEnv::new(room, catalog, rules).context("invalid room or catalog")
}

fn load_rules(path: &Path) -> RewardRuleSet {
    RewardRuleSet::with_overrides(&load_overrides(path))
}

fn episode_line(report: &EpisodeReport, episodes: usize) -> String {
    format_episode_line(
        report.episode,
        episodes,
        report.succeeded().then_some(report.total_reward),
    )
}

fn train(
    setup: &SetupArgs,
    training: &TrainingArgs,
    save_model: Option<&Path>,
    layout_out: Option<&Path>,
) -> Result<()> {
    let config = training.resolve()?;
    let env = build_env(setup.room.as_deref(), load_rules(&setup.reward_config))?;
    let episodes = config.episodes;
    let mut trainer = Trainer::new(env, config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_err = None;
    let summary = trainer.train(|report| {
        if write_err.is_none() {
            if let Err(e) = writeln!(out, "{}", episode_line(report, episodes)) {
                write_err = Some(e);
            }
        }
    })?;
    if let Some(e) = write_err {
        return Err(e).context("failed to write episode log");
    }

    eprintln!(
        "{} of {} episodes placed every item",
        summary.successes, summary.episodes
    );

    if let Some(path) = save_model {
        trainer
            .policy()
            .save(path)
            .with_context(|| format!("failed to save model to {}", path.display()))?;
        eprintln!("Model saved to {}", path.display());
    }
    if let Some(path) = layout_out {
        let Some(layout) = &summary.best_layout else {
            bail!("no episode succeeded, no layout to write");
        };
        layout
            .save(path)
            .with_context(|| format!("failed to write layout to {}", path.display()))?;
        eprintln!("Layout saved to {}", path.display());
    }
    Ok(())
}

fn candidates(room: Option<&Path>, item: Option<&str>, json: bool) -> Result<()> {
    let env = build_env(room, RewardRuleSet::default())?;
    let selected: Vec<(usize, &FurnitureSpec)> = env
        .catalog()
        .iter()
        .enumerate()
        .filter(|(_, spec)| item.map_or(true, |name| spec.name.eq_ignore_ascii_case(name)))
        .collect();
    if selected.is_empty() {
        bail!("no catalog item named {}", item.unwrap_or_default());
    }

    if json {
        let map: BTreeMap<&str, _> = selected
            .iter()
            .map(|(index, spec)| (spec.name.as_str(), env.candidates_for(*index)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (index, spec) in selected {
        let set = env.candidates_for(index);
        println!("{} ({} candidates)", spec.name, set.len());
        for (action, p) in set.iter().enumerate() {
            println!("  {action:>3}: ({:.2}, {:.2})", p.x, p.y);
        }
    }
    Ok(())
}

fn layout(setup: &SetupArgs, model: &Path, out: &Path, attempts: usize, seed: Option<u64>) -> Result<()> {
    let net = PolicyValueNet::load_file(model)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    let env = build_env(setup.room.as_deref(), load_rules(&setup.reward_config))?;
    let config = TrainingConfig {
        seed,
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::with_policy(env, net, config).context("model does not fit the room")?;

    for attempt in 1..=attempts {
        let report = trainer.rollout()?;
        if report.succeeded() {
            report
                .layout
                .save(out)
                .with_context(|| format!("failed to write layout to {}", out.display()))?;
            println!(
                "Layout with total reward {:.2} written to {}",
                report.total_reward,
                out.display()
            );
            return Ok(());
        }
        eprintln!("Attempt {attempt}/{attempts} failed: {:?}", report.status);
    }
    bail!("no complete layout in {attempts} attempts")
}

fn ablate(
    room: Option<&Path>,
    training: &TrainingArgs,
    presets: &[String],
    reward_config: &Path,
    logs_dir: &Path,
) -> Result<()> {
    let config = training.resolve()?;
    let presets = ablation::select(presets)?;
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;

    for preset in presets {
        let timestamp = ablation::timestamp_now();
        println!("Running config: {} [{timestamp}]", preset.name);

        let paths = RunPaths::new(logs_dir, preset.name, &timestamp);
        write_overrides(reward_config, &preset.overrides_map())
            .with_context(|| format!("failed to write {}", reward_config.display()))?;
        fs::copy(reward_config, &paths.config)
            .with_context(|| format!("failed to archive config to {}", paths.config.display()))?;

        let env = build_env(room, load_rules(reward_config))?;
        let episodes = config.episodes;
        let mut trainer = Trainer::new(env, config.clone())?;

        let file = File::create(&paths.log)
            .with_context(|| format!("failed to create {}", paths.log.display()))?;
        let mut log = BufWriter::new(file);
        let mut write_err = None;
        let summary = trainer.train(|report| {
            if write_err.is_none() {
                if let Err(e) = writeln!(log, "{}", episode_line(report, episodes)) {
                    write_err = Some(e);
                }
            }
        })?;
        if let Some(e) = write_err {
            return Err(e).with_context(|| format!("failed to write {}", paths.log.display()));
        }
        log.flush()?;

        println!(
            "Log saved to {} ({}/{} successful)",
            paths.log.display(),
            summary.successes,
            summary.episodes
        );
        println!("Config saved to {}", paths.config.display());
    }
    Ok(())
}

fn summarize(logs_dir: &Path, csv: &Path) -> Result<()> {
    let table = RewardTable::from_dir(logs_dir)?;
    if table.is_empty() {
        bail!("no *.txt logs in {}", logs_dir.display());
    }
    table
        .write_csv(csv)
        .with_context(|| format!("failed to write {}", csv.display()))?;

    for (label, s) in table.summaries() {
        let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
        println!(
            "{label}: episodes={} missing={} mean={} std={}",
            s.count + s.missing,
            s.missing,
            fmt(s.mean),
            fmt(s.std)
        );
    }
    println!("Saved CSV to {}", csv.display());
    Ok(())
}

/// Log records go to stderr so stdout stays parseable. `RUST_LOG` overrides
/// the default `info` level.
#[cfg(feature = "telemetry")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    #[cfg(feature = "telemetry")]
    init_tracing();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Train {
            setup,
            training,
            save_model,
            layout_out,
        } => train(setup, training, save_model.as_deref(), layout_out.as_deref()),
        Commands::Candidates { room, item, json } => {
            candidates(room.as_deref(), item.as_deref(), *json)
        }
        Commands::Layout {
            setup,
            model,
            out,
            attempts,
            seed,
        } => layout(setup, model, out, *attempts, *seed),
        Commands::Ablate {
            room,
            training,
            presets,
            reward_config,
            logs_dir,
            list,
        } => {
            if *list {
                for preset in ablation::PRESETS {
                    println!("{:<24} {}", preset.name, preset.description);
                }
                return Ok(());
            }
            ablate(room.as_deref(), training, presets, reward_config, logs_dir)
        }
        Commands::Summarize { logs_dir, csv } => summarize(logs_dir, csv),
    }
}
