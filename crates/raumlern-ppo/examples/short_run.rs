//! Kurzer Trainingslauf im Standardzimmer; gibt das beste Layout als JSON aus.
//!
//! Aufruf: `cargo run -p raumlern-ppo --example short_run -- [episoden] [seed]`

use raumlern_core::{default_catalog, PlacementEnv, RewardRuleSet, RoomSpec};
use raumlern_ppo::{Trainer, TrainingConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let episodes = args.next().map(|s| s.parse::<usize>()).transpose()?.unwrap_or(20);
    let seed = args.next().map(|s| s.parse::<u64>()).transpose()?;

    let env = PlacementEnv::new(RoomSpec::default(), default_catalog(), RewardRuleSet::default())?;
    let config = TrainingConfig {
        episodes,
        seed,
        hidden_size: 32,
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(env, config)?;
    let summary = trainer.train(|report| {
        let total = if report.succeeded() {
            format!("{:.2}", report.total_reward)
        } else {
            "n/a".to_string()
        };
        eprintln!("episode {:>3}: {total}", report.episode);
    })?;

    eprintln!("{}/{} erfolgreich", summary.successes, summary.episodes);
    if let Some(layout) = &summary.best_layout {
        println!("{}", serde_json::to_string_pretty(layout)?);
    }
    Ok(())
}
