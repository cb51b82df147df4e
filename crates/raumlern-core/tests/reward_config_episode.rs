//! Integrationstest: Override-Datei laden, Umgebung bauen, eine Episode
//! vollständig durchspielen und das Layout speichern.

use raumlern_core::reward::{load_overrides, write_overrides};
use raumlern_core::{
    default_catalog, EpisodeStatus, Layout, PlacementEnv, RewardRuleSet, RoomSpec, StepEvent,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("raumlern_core_{name}_{}", std::process::id()))
}

#[test]
fn yaml_overrides_reach_the_reward() {
    let path = temp_path("rules.yaml");
    fs::write(
        &path,
        "wall_bonus: 1.0\npath_clear_bonus: 0.25\nsofa_bonus: 3\ndesk_window_weight: high\n",
    )
    .unwrap_or_else(|e| panic!("Fehler beim Schreiben der Regeldatei: {e}"));

    let overrides = load_overrides(&path);
    assert_eq!(overrides.len(), 3, "nicht-numerische Werte fallen weg");
    let rules = RewardRuleSet::with_overrides(&overrides);
    assert!(!rules.as_map().contains_key("sofa_bonus"));

    let env = PlacementEnv::new(RoomSpec::default(), default_catalog(), rules)
        .unwrap_or_else(|e| panic!("Umgebung ungültig: {e}"));
    let mut state = env.new_episode();
    env.reset(&mut state);

    // Bett in der Ecke (0, 0): Basis 1.0 + Wand 1.0 + freier Weg 0.25.
    let outcome = env
        .step(&mut state, 0)
        .unwrap_or_else(|e| panic!("Schritt fehlgeschlagen: {e}"));
    assert!((outcome.reward - 2.25).abs() < 1e-9, "reward = {}", outcome.reward);

    let _ = fs::remove_file(&path);
}

#[test]
fn written_overrides_load_back() {
    let path = temp_path("written.yaml");
    let overrides = BTreeMap::from([
        ("desk_window_weight".to_string(), 0.0),
        ("inter_item_close_penalty".to_string(), -0.75),
    ]);
    write_overrides(&path, &overrides).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(load_overrides(&path), overrides);

    write_overrides(&path, &BTreeMap::new()).unwrap_or_else(|e| panic!("{e}"));
    assert!(load_overrides(&path).is_empty());
    let _ = fs::remove_file(&path);
}

#[test]
fn greedy_episode_places_the_whole_catalog() {
    let env = PlacementEnv::new(RoomSpec::default(), default_catalog(), RewardRuleSet::default())
        .unwrap_or_else(|e| panic!("Umgebung ungültig: {e}"));
    let mut state = env.new_episode();
    env.reset(&mut state);
    let resolution = env.room().occupancy_resolution;

    while let Some(index) = state.cursor() {
        let spec = env.catalog()[index].clone();
        let action = env
            .candidates_for(index)
            .iter()
            .position(|p| state.occupancy().is_free(&spec.footprint(p.x, p.y), resolution))
            .unwrap_or_else(|| panic!("kein freier Platz für {}", spec.name));
        let outcome = env
            .step(&mut state, action)
            .unwrap_or_else(|e| panic!("Schritt fehlgeschlagen: {e}"));
        assert!(matches!(outcome.event, StepEvent::Placed(_)));
    }

    assert_eq!(state.status(), EpisodeStatus::Done);
    assert!(env.step(&mut state, 0).is_err(), "Schritt nach Episodenende");

    let layout = env.layout(&state);
    assert_eq!(layout.items.len(), default_catalog().len());
    let path = temp_path("layout.json");
    layout.save(&path).unwrap_or_else(|e| panic!("{e}"));
    let loaded = Layout::load(&path).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(loaded, layout);
    let _ = fs::remove_file(&path);
}
