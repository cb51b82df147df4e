//! Gewichte der Belohnungsregeln.
//!
//! Jede bekannte Regel hat einen festen Standardwert. Eine (teilweise)
//! Override-Datei wird darübergelegt: der Override gewinnt pro Schlüssel,
//! nicht genannte Schlüssel behalten ihren Standardwert.

use crate::error::{CoreError, Result};
use crate::telemetry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Die bekannten Belohnungsregeln.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardRule {
    WallBonus,
    PathClearBonus,
    PathBlockPenalty,
    DeskWindowWeight,
    NightstandNearBedBonus,
    NightstandFarPenalty,
    WardrobeNearPenalty,
    WardrobeFarBonus,
    InterItemTooClosePenalty,
    InterItemClosePenalty,
}

impl RewardRule {
    pub const ALL: [RewardRule; 10] = [
        Self::WallBonus,
        Self::PathClearBonus,
        Self::PathBlockPenalty,
        Self::DeskWindowWeight,
        Self::NightstandNearBedBonus,
        Self::NightstandFarPenalty,
        Self::WardrobeNearPenalty,
        Self::WardrobeFarBonus,
        Self::InterItemTooClosePenalty,
        Self::InterItemClosePenalty,
    ];

    /// Schlüssel in der Konfigurationsdatei.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::WallBonus => "wall_bonus",
            Self::PathClearBonus => "path_clear_bonus",
            Self::PathBlockPenalty => "path_block_penalty",
            Self::DeskWindowWeight => "desk_window_weight",
            Self::NightstandNearBedBonus => "nightstand_near_bed_bonus",
            Self::NightstandFarPenalty => "nightstand_far_penalty",
            Self::WardrobeNearPenalty => "wardrobe_near_penalty",
            Self::WardrobeFarBonus => "wardrobe_far_bonus",
            Self::InterItemTooClosePenalty => "inter_item_too_close_penalty",
            Self::InterItemClosePenalty => "inter_item_close_penalty",
        }
    }

    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::WallBonus => 0.2,
            Self::PathClearBonus => 0.5,
            Self::PathBlockPenalty => -1.0,
            Self::DeskWindowWeight => 1.0,
            Self::NightstandNearBedBonus => 0.5,
            Self::NightstandFarPenalty => -0.5,
            Self::WardrobeNearPenalty => -0.5,
            Self::WardrobeFarBonus => 0.3,
            Self::InterItemTooClosePenalty => -1.0,
            Self::InterItemClosePenalty => -0.5,
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.key() == key)
    }
}

/// Regelname → Gewicht, nach dem Zusammenführen von Defaults und Overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardRuleSet {
    weights: BTreeMap<String, f64>,
}

impl Default for RewardRuleSet {
    fn default() -> Self {
        Self {
            weights: RewardRule::ALL
                .into_iter()
                .map(|rule| (rule.key().to_string(), rule.default_weight()))
                .collect(),
        }
    }
}

impl RewardRuleSet {
    /// Legt `overrides` über die Standardwerte. Unbekannte Schlüssel werden
    /// mit einer Warnung ignoriert.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Self {
        let mut set = Self::default();
        for (key, value) in overrides {
            if RewardRule::from_key(key).is_none() {
                telemetry::warn(&format!("ignoring unknown reward rule '{key}'"));
                continue;
            }
            set.weights.insert(key.clone(), *value);
        }
        set
    }

    /// Gewicht einer Regel; fehlt es, ist die Konfiguration defekt.
    pub fn weight(&self, rule: RewardRule) -> Result<f64> {
        self.weights
            .get(rule.key())
            .copied()
            .ok_or_else(|| CoreError::MissingRule(rule.key().to_string()))
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }
}

/// Aufgelöste Gewichte, wie sie die Umgebung pro Schritt liest.
///
/// Die Namen der `*_penalty`-Felder sind Beträge: die Umgebung zieht sie ab,
/// unabhängig von ihrem Vorzeichen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RewardWeights {
    pub wall_bonus: f64,
    pub path_clear_bonus: f64,
    pub path_block_penalty: f64,
    pub desk_window_weight: f64,
    pub nightstand_near_bed_bonus: f64,
    pub nightstand_far_penalty: f64,
    pub wardrobe_near_penalty: f64,
    pub wardrobe_far_bonus: f64,
    pub inter_item_too_close_penalty: f64,
    pub inter_item_close_penalty: f64,
}

impl RewardWeights {
    /// Löst alle bekannten Regeln auf; eine fehlende Regel ist ein Fehler.
    pub fn resolve(rules: &RewardRuleSet) -> Result<Self> {
        Ok(Self {
            wall_bonus: rules.weight(RewardRule::WallBonus)?,
            path_clear_bonus: rules.weight(RewardRule::PathClearBonus)?,
            path_block_penalty: rules.weight(RewardRule::PathBlockPenalty)?,
            desk_window_weight: rules.weight(RewardRule::DeskWindowWeight)?,
            nightstand_near_bed_bonus: rules.weight(RewardRule::NightstandNearBedBonus)?,
            nightstand_far_penalty: rules.weight(RewardRule::NightstandFarPenalty)?,
            wardrobe_near_penalty: rules.weight(RewardRule::WardrobeNearPenalty)?,
            wardrobe_far_bonus: rules.weight(RewardRule::WardrobeFarBonus)?,
            inter_item_too_close_penalty: rules.weight(RewardRule::InterItemTooClosePenalty)?,
            inter_item_close_penalty: rules.weight(RewardRule::InterItemClosePenalty)?,
        })
    }
}

/// Liest eine Override-Datei (YAML, JSON als Teilmenge).
///
/// Fehlende oder kaputte Dateien sind nie fatal: es gibt eine Warnung und
/// einen leeren Override. Nicht-numerische Werte werden übersprungen.
#[must_use]
pub fn load_overrides(path: &Path) -> BTreeMap<String, f64> {
    if !path.exists() {
        telemetry::warn(&format!(
            "reward config file not found at {}; using defaults",
            path.display()
        ));
        return BTreeMap::new();
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            telemetry::warn(&format!(
                "failed to read reward config {}: {e}; using defaults",
                path.display()
            ));
            return BTreeMap::new();
        }
    };

    parse_overrides(&text).unwrap_or_else(|e| {
        telemetry::warn(&format!(
            "malformed reward config {}: {e}; using defaults",
            path.display()
        ));
        BTreeMap::new()
    })
}

/// Parst den Inhalt einer Override-Datei.
pub fn parse_overrides(text: &str) -> Result<BTreeMap<String, f64>> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    let mut overrides = BTreeMap::new();

    match value {
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let Some(key) = k.as_str() else {
                    telemetry::warn(&format!("skipping non-string reward key {k:?}"));
                    continue;
                };
                match v.as_f64() {
                    Some(weight) if weight.is_finite() => {
                        overrides.insert(key.to_string(), weight);
                    }
                    _ => telemetry::warn(&format!("skipping non-numeric weight for '{key}'")),
                }
            }
        }
        other => {
            telemetry::warn(&format!(
                "reward config must be a mapping, found {other:?}; using defaults"
            ));
        }
    }

    Ok(overrides)
}

/// Schreibt einen Override als YAML, z. B. für Ablationsläufe.
pub fn write_overrides(path: &Path, overrides: &BTreeMap<String, f64>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = if overrides.is_empty() {
        "{}\n".to_string()
    } else {
        serde_yaml::to_string(overrides)?
    };
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_and_rest_keeps_defaults() {
        let defaults = RewardRuleSet::default();
        let overrides = BTreeMap::from([("wall_bonus".to_string(), 0.0)]);
        let merged = RewardRuleSet::with_overrides(&overrides);

        for rule in RewardRule::ALL {
            let got = merged.weight(rule).expect("rule present");
            if rule == RewardRule::WallBonus {
                assert!(got.abs() < f64::EPSILON);
            } else {
                assert!((got - defaults.weight(rule).expect("default")).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let overrides = BTreeMap::from([("sofa_bonus".to_string(), 9.0)]);
        let merged = RewardRuleSet::with_overrides(&overrides);
        assert_eq!(merged, RewardRuleSet::default());
    }

    #[test]
    fn missing_rule_fails_resolution() {
        let mut broken = RewardRuleSet::default();
        broken.weights.remove("wardrobe_far_bonus");
        assert!(matches!(
            RewardWeights::resolve(&broken),
            Err(CoreError::MissingRule(key)) if key == "wardrobe_far_bonus"
        ));
    }

    #[test]
    fn yaml_overrides_parse_and_skip_garbage() {
        let text = "desk_window_weight: 0.0\npath_clear_bonus: 2\nwall_bonus: lots\n";
        let parsed = parse_overrides(text).expect("valid yaml");
        assert_eq!(parsed.len(), 2);
        assert!((parsed["path_clear_bonus"] - 2.0).abs() < f64::EPSILON);
        assert!(!parsed.contains_key("wall_bonus"));
    }

    #[test]
    fn empty_file_is_empty_override() {
        assert!(parse_overrides("").expect("empty yaml").is_empty());
        assert!(parse_overrides("{}").expect("empty map").is_empty());
    }

    #[test]
    fn missing_file_yields_empty_override() {
        let path = std::env::temp_dir().join(format!(
            "raumlern_missing_reward_config_{}.yaml",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        assert!(load_overrides(&path).is_empty());
    }

    #[test]
    fn written_overrides_load_back() {
        let path = std::env::temp_dir().join(format!(
            "raumlern_reward_config_{}.yaml",
            std::process::id()
        ));
        let overrides = BTreeMap::from([
            ("inter_item_close_penalty".to_string(), 0.0),
            ("inter_item_too_close_penalty".to_string(), 0.0),
        ]);
        write_overrides(&path, &overrides).expect("write should succeed");
        assert_eq!(load_overrides(&path), overrides);
        let _ = fs::remove_file(&path);
    }
}
