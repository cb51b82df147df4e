//! End-to-end checks of the `raumlern` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("raumlern_cli_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir)
        .unwrap_or_else(|e| panic!("failed to create scratch dir {}: {e}", dir.display()));
    dir
}

fn raumlern() -> Command {
    Command::cargo_bin("raumlern").unwrap_or_else(|e| panic!("binary not built: {e}"))
}

#[test]
fn candidates_for_bed_all_touch_a_wall() {
    let output = raumlern()
        .args(["candidates", "--item", "bed"])
        .output()
        .unwrap_or_else(|e| panic!("failed to run: {e}"));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BED (30 candidates)"), "{stdout}");
    assert!(stdout.contains("0: (0.00, 0.00)"));

    // BED is 2.0 x 1.5 in the default 6 x 5 room.
    let positions: Vec<(f64, f64)> = stdout
        .lines()
        .filter_map(|line| line.split_once(": (")?.1.strip_suffix(')')?.split_once(", "))
        .map(|(x, y)| {
            let parse = |v: &str| v.parse::<f64>().unwrap_or_else(|e| panic!("{v}: {e}"));
            (parse(x), parse(y))
        })
        .collect();
    assert_eq!(positions.len(), 30);
    for (x, y) in positions {
        let touches = x < 0.1 || y < 0.1 || x + 2.0 > 6.0 - 0.1 || y + 1.5 > 5.0 - 0.1;
        assert!(touches, "({x}, {y}) misses every wall");
    }
}

#[test]
fn candidates_json_is_keyed_by_name() {
    let output = raumlern()
        .args(["candidates", "--json"])
        .output()
        .unwrap_or_else(|e| panic!("failed to run: {e}"));
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| panic!("not JSON: {e}"));
    for name in ["BED", "WARDROBE", "DESK", "BOOKSHELF", "NIGHTSTAND"] {
        assert!(value[name].as_array().is_some_and(|a| !a.is_empty()), "{name}");
    }
}

#[test]
fn unknown_item_fails() {
    raumlern()
        .args(["candidates", "--item", "sofa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no catalog item named sofa"));
}

#[test]
fn train_prints_one_line_per_episode() {
    let dir = scratch_dir("train");
    let missing_config = dir.join("absent.yaml");
    let model = dir.join("model.json");

    raumlern()
        .args(["train", "--episodes", "3", "--seed", "7", "--hidden", "8"])
        .arg("--reward-config")
        .arg(&missing_config)
        .arg("--save-model")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^Episode 1/3 \| Total reward: (-?\d+\.\d{2}|n/a)$").unwrap_or_else(|e| panic!("{e}")))
        .stdout(predicate::str::contains("Episode 3/3 | Total reward:"))
        .stderr(predicate::str::contains("reward config file not found"));

    assert!(model.exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn reward_config_warnings_reach_stderr() {
    let dir = scratch_dir("warnings");
    let rules = dir.join("rules.yaml");
    fs::write(&rules, "sofa_bonus: 3\n").unwrap_or_else(|e| panic!("{e}"));

    let assert = raumlern()
        .args(["train", "--episodes", "1", "--seed", "2", "--hidden", "8"])
        .arg("--reward-config")
        .arg(&rules)
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring unknown reward rule 'sofa_bonus'"));

    // Plain prefix without a subscriber, fmt level names with `telemetry`.
    #[cfg(not(feature = "telemetry"))]
    assert.stderr(predicate::str::contains("[warn]"));
    #[cfg(feature = "telemetry")]
    assert.stderr(predicate::str::contains("WARN"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn layout_samples_from_saved_model() {
    let dir = scratch_dir("layout");
    let model = dir.join("model.json");
    let layout = dir.join("layout.json");
    let rules = dir.join("rules.yaml");
    fs::write(&rules, "wall_bonus: 0.4\n").unwrap_or_else(|e| panic!("{e}"));

    raumlern()
        .args(["train", "--episodes", "2", "--seed", "3", "--hidden", "8"])
        .arg("--reward-config")
        .arg(&rules)
        .arg("--save-model")
        .arg(&model)
        .assert()
        .success();

    raumlern()
        .args(["layout", "--attempts", "200", "--seed", "11"])
        .arg("--model")
        .arg(&model)
        .arg("--reward-config")
        .arg(&rules)
        .arg("--out")
        .arg(&layout)
        .assert()
        .success()
        .stdout(predicate::str::contains("written to"));

    let text = fs::read_to_string(&layout).unwrap_or_else(|e| panic!("{e}"));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(value["room_width"], 6.0);
    assert_eq!(value["items"].as_array().map(Vec::len), Some(5));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ablate_writes_log_and_config_per_preset() {
    let dir = scratch_dir("ablate");
    let logs = dir.join("logs");
    let config = dir.join("reward_config.yaml");

    raumlern()
        .args(["ablate", "--preset", "no_window", "--episodes", "2", "--seed", "1", "--hidden", "8"])
        .arg("--reward-config")
        .arg(&config)
        .arg("--logs-dir")
        .arg(&logs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Running config: no_window"));

    let mut names: Vec<String> = fs::read_dir(&logs)
        .unwrap_or_else(|e| panic!("{e}"))
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("no_window_") && names[0].ends_with(".txt"));
    assert!(names[1].ends_with("_config.yaml"));

    let archived = fs::read_to_string(logs.join(&names[1])).unwrap_or_else(|e| panic!("{e}"));
    assert!(archived.contains("desk_window_weight"));
    let log = fs::read_to_string(logs.join(&names[0])).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(log.lines().filter(|l| l.contains("Total reward")).count(), 2);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ablate_rejects_unknown_preset() {
    let dir = scratch_dir("ablate_unknown");
    raumlern()
        .args(["ablate", "--preset", "no_sofa"])
        .arg("--logs-dir")
        .arg(dir.join("logs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown ablation preset 'no_sofa'"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn summarize_compiles_csv() {
    let dir = scratch_dir("summarize");
    fs::write(
        dir.join("a.txt"),
        "Episode 1/2 | Total reward: 1.00\nEpisode 2/2 | Total reward: 3.00\n",
    )
    .unwrap_or_else(|e| panic!("{e}"));
    fs::write(dir.join("b.txt"), "Episode 1/1 | Total reward: n/a\n")
        .unwrap_or_else(|e| panic!("{e}"));
    fs::write(dir.join("a_config.yaml"), "{}\n").unwrap_or_else(|e| panic!("{e}"));
    let csv = dir.join("rewards.csv");

    raumlern()
        .arg("summarize")
        .arg("--logs-dir")
        .arg(&dir)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("a: episodes=2 missing=0 mean=2.000 std=1.414"))
        .stdout(predicate::str::contains("b: episodes=1 missing=1 mean=n/a"));

    let text = fs::read_to_string(&csv).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(text, "Episode,a,b\n0,1.0,\n1,3.0,\n");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn summarize_fails_without_logs() {
    let dir = scratch_dir("summarize_empty");
    raumlern()
        .arg("summarize")
        .arg("--logs-dir")
        .arg(&dir)
        .arg("--csv")
        .arg(dir.join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no *.txt logs"));
    let _ = fs::remove_dir_all(&dir);
}
