//! Reward ablation presets.
//!
//! Each preset zeroes a group of reward rules. Presets are plain override
//! maps; everything not named keeps its default weight. Running a preset
//! produces two artifacts in the log directory that share a stem:
//!
//! - `<preset>_<timestamp>.txt`: the training log
//! - `<preset>_<timestamp>_config.yaml`: the exact overrides used

use crate::{FeedbackError, Result};
use raumlern_core::RewardRuleSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

const FALLBACK_TIMESTAMP: &str = "19700101_000000";

/// A named set of reward overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AblationPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub overrides: &'static [(&'static str, f64)],
}

impl AblationPreset {
    #[must_use]
    pub fn overrides_map(&self) -> BTreeMap<String, f64> {
        self.overrides
            .iter()
            .map(|(key, value)| ((*key).to_string(), *value))
            .collect()
    }

    #[must_use]
    pub fn rules(&self) -> RewardRuleSet {
        RewardRuleSet::with_overrides(&self.overrides_map())
    }
}

/// Presets in the order the ablation runner executes them.
pub const PRESETS: &[AblationPreset] = &[
    AblationPreset {
        name: "all_rules",
        description: "Every rule at its default weight",
        overrides: &[],
    },
    AblationPreset {
        name: "no_window",
        description: "Desk-to-window closeness disabled",
        overrides: &[("desk_window_weight", 0.0)],
    },
    AblationPreset {
        name: "no_path_check",
        description: "Door path bonus and penalty disabled",
        overrides: &[("path_clear_bonus", 0.0), ("path_block_penalty", 0.0)],
    },
    AblationPreset {
        name: "no_spacing",
        description: "Inter-item spacing penalties disabled",
        overrides: &[
            ("inter_item_too_close_penalty", 0.0),
            ("inter_item_close_penalty", 0.0),
        ],
    },
    AblationPreset {
        name: "only_wall_and_spacing",
        description: "Only wall bonus and spacing penalties active",
        overrides: &[
            ("path_clear_bonus", 0.0),
            ("path_block_penalty", 0.0),
            ("desk_window_weight", 0.0),
            ("nightstand_near_bed_bonus", 0.0),
            ("nightstand_far_penalty", 0.0),
            ("wardrobe_near_penalty", 0.0),
            ("wardrobe_far_bonus", 0.0),
        ],
    },
];

pub fn preset(name: &str) -> Result<&'static AblationPreset> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| FeedbackError::UnknownPreset {
            name: name.to_string(),
            valid: PRESETS.iter().map(|p| p.name.to_string()).collect(),
        })
}

/// Resolves a list of preset names; an empty list means all presets.
pub fn select(names: &[String]) -> Result<Vec<&'static AblationPreset>> {
    if names.is_empty() {
        return Ok(PRESETS.iter().collect());
    }
    names.iter().map(|name| preset(name)).collect()
}

/// Run timestamp `YYYYMMDD_HHMMSS`.
#[must_use]
pub fn run_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))
    .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[must_use]
pub fn timestamp_now() -> String {
    run_timestamp(OffsetDateTime::now_utc())
}

/// Paths of the artifacts of one ablation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub log: PathBuf,
    pub config: PathBuf,
}

impl RunPaths {
    #[must_use]
    pub fn new(log_dir: &Path, preset: &str, timestamp: &str) -> Self {
        Self {
            log: log_dir.join(format!("{preset}_{timestamp}.txt")),
            config: log_dir.join(format!("{preset}_{timestamp}_config.yaml")),
        }
    }
}
