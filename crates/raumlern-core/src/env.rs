//! Platzierungsumgebung: Zustandsautomat einer Episode plus geformte Belohnung.
//!
//! Der veränderliche Episodenzustand ([`PlacementState`]) gehört dem Aufrufer
//! und wird per `&mut` in [`PlacementEnv::reset`] und [`PlacementEnv::step`]
//! gereicht. Die Umgebung selbst ist nach dem Bau unveränderlich.

use crate::candidates::{self, CandidateSet};
use crate::error::{CoreError, Result};
use crate::geometry::{distance, Rect};
use crate::layout::{Layout, PlacedItem};
use crate::reward::{RewardRuleSet, RewardWeights};
use crate::room::{cell_index, FurnitureKind, FurnitureSpec, RoomSpec};
use crate::telemetry;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Belohnung für einen ungültigen Aktionsindex.
pub const INVALID_ACTION_REWARD: f64 = -1.0;
/// Belohnung, wenn die Grundfläche bereits belegte Zellen trifft.
pub const COLLISION_REWARD: f64 = -1.0;

const BASE_REWARD: f64 = 1.0;
const PATH_BUFFER: f64 = 0.1;
const NIGHTSTAND_NEAR_DISTANCE: f64 = 1.0;
const WARDROBE_NEAR_DISTANCE: f64 = 1.5;
const WARDROBE_FAR_DISTANCE: f64 = 2.5;
const SPACING_BUFFER: f64 = 0.1;

/// Belegungsraster; Zelle `(i, j)` ist belegt, wenn ein platziertes Möbel sie überdeckt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![false; cols * rows],
        }
    }

    #[must_use]
    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> bool {
        i < self.cols && j < self.rows && self.cells[i * self.rows + j]
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }

    /// Zellbereiche, die `rect` bei Auflösung `resolution` überdeckt.
    fn footprint(&self, rect: &Rect, resolution: f64) -> (Range<usize>, Range<usize>) {
        let i0 = cell_index(rect.x, resolution).min(self.cols);
        let i1 = cell_index(rect.right(), resolution).min(self.cols);
        let j0 = cell_index(rect.y, resolution).min(self.rows);
        let j1 = cell_index(rect.top(), resolution).min(self.rows);
        (i0..i1, j0..j1)
    }

    #[must_use]
    pub fn is_free(&self, rect: &Rect, resolution: f64) -> bool {
        let (is, js) = self.footprint(rect, resolution);
        is.into_iter()
            .all(|i| js.clone().all(|j| !self.cells[i * self.rows + j]))
    }

    pub fn mark(&mut self, rect: &Rect, resolution: f64) {
        let (is, js) = self.footprint(rect, resolution);
        for i in is {
            for j in js.clone() {
                self.cells[i * self.rows + j] = true;
            }
        }
    }

    /// Zeilenweise abgeflachte Belegung (`i` außen, `j` innen) als 0.0/1.0.
    pub fn features(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().map(|c| if *c { 1.0 } else { 0.0 })
    }
}

/// Zustand des Episodenautomaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// Wartet auf das Möbelstück mit diesem Katalogindex.
    AwaitingItem(usize),
    Done,
    Failed,
}

/// Veränderlicher Zustand genau einer Episode.
#[derive(Debug, Clone)]
pub struct PlacementState {
    occupancy: OccupancyGrid,
    placed: Vec<PlacedItem>,
    status: EpisodeStatus,
}

impl PlacementState {
    #[must_use]
    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    #[must_use]
    pub fn placed(&self) -> &[PlacedItem] {
        &self.placed
    }

    #[must_use]
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Katalogindex des nächsten Möbelstücks, falls die Episode noch läuft.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        match self.status {
            EpisodeStatus::AwaitingItem(k) => Some(k),
            EpisodeStatus::Done | EpisodeStatus::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.cursor().is_none()
    }
}

/// Beiträge der einzelnen Regeln zu einer Platzierung.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RewardBreakdown {
    pub base: f64,
    pub wall: f64,
    pub path: f64,
    pub window: f64,
    pub nightstand: f64,
    pub wardrobe: f64,
    pub spacing: f64,
}

impl RewardBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.base
            + self.wall
            + self.path
            + self.window
            + self.nightstand
            + self.wardrobe
            + self.spacing
    }
}

/// Was bei einem Schritt passiert ist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StepEvent {
    Placed(PlacedItem),
    InvalidAction { action: usize, candidates: usize },
    Collision { x: f64, y: f64 },
}

/// Ergebnis von [`PlacementEnv::step`].
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Zustandsvektor nach dem Schritt.
    pub state: Vec<f32>,
    pub reward: f64,
    pub done: bool,
    pub event: StepEvent,
    /// Nur bei erfolgreicher Platzierung gesetzt.
    pub breakdown: Option<RewardBreakdown>,
}

/// Die Platzierungsumgebung.
#[derive(Debug, Clone)]
pub struct PlacementEnv {
    room: RoomSpec,
    catalog: Vec<FurnitureSpec>,
    rules: RewardRuleSet,
    weights: RewardWeights,
    action_dim: usize,
}

impl PlacementEnv {
    /// Baut die Umgebung; prüft Raum und Katalog und löst alle Regelgewichte
    /// auf, damit Konfigurationsfehler sofort beim Start auffallen.
    pub fn new(room: RoomSpec, catalog: Vec<FurnitureSpec>, rules: RewardRuleSet) -> Result<Self> {
        room.validate(&catalog)?;
        let weights = RewardWeights::resolve(&rules)?;

        let action_dim = candidates::max_candidates(&catalog, &room);
        if let Some(spec) = catalog
            .iter()
            .find(|spec| candidates::generate(spec, &room).is_empty())
        {
            return Err(CoreError::InvalidCatalog(format!(
                "{} has no legal position in the room",
                spec.name
            )));
        }

        telemetry::info(&format!("reward config loaded: {:?}", rules.as_map()));

        Ok(Self {
            room,
            catalog,
            rules,
            weights,
            action_dim,
        })
    }

    #[must_use]
    pub fn room(&self) -> &RoomSpec {
        &self.room
    }

    #[must_use]
    pub fn catalog(&self) -> &[FurnitureSpec] {
        &self.catalog
    }

    #[must_use]
    pub fn rules(&self) -> &RewardRuleSet {
        &self.rules
    }

    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Breite des Aktionskopfs: größte Kandidatenmenge im Katalog.
    #[must_use]
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Länge des Zustandsvektors: Belegungsraster plus Breite und Höhe.
    #[must_use]
    pub fn state_dim(&self) -> usize {
        let (cols, rows) = self.room.occupancy_dims();
        cols * rows + 2
    }

    /// Kandidaten des Möbelstücks mit Katalogindex `index`, frisch berechnet.
    #[must_use]
    pub fn candidates_for(&self, index: usize) -> CandidateSet {
        self.catalog
            .get(index)
            .map(|spec| candidates::generate(spec, &self.room))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn new_episode(&self) -> PlacementState {
        let (cols, rows) = self.room.occupancy_dims();
        PlacementState {
            occupancy: OccupancyGrid::new(cols, rows),
            placed: Vec::with_capacity(self.catalog.len()),
            status: EpisodeStatus::AwaitingItem(0),
        }
    }

    /// Leert Raster und Platzierungsliste und beginnt beim ersten Möbelstück.
    pub fn reset(&self, state: &mut PlacementState) -> Vec<f32> {
        state.occupancy.clear();
        state.placed.clear();
        state.status = EpisodeStatus::AwaitingItem(0);
        self.observe(state)
    }

    /// Möbelstück, das als Nächstes platziert wird.
    #[must_use]
    pub fn current_spec(&self, state: &PlacementState) -> Option<&FurnitureSpec> {
        state.cursor().and_then(|k| self.catalog.get(k))
    }

    /// Zustandsvektor: Belegung, dann (Breite, Höhe) des nächsten Möbels oder
    /// (0, 0), wenn keines mehr folgt.
    #[must_use]
    pub fn observe(&self, state: &PlacementState) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.state_dim());
        features.extend(state.occupancy.features());
        #[allow(clippy::cast_possible_truncation)]
        let size = self
            .current_spec(state)
            .map_or([0.0, 0.0], |spec| [spec.width as f32, spec.height as f32]);
        features.extend(size);
        features
    }

    /// Platziert das aktuelle Möbelstück an Kandidat `action`.
    ///
    /// Ungültiger Index oder Kollision beenden die Episode mit fester
    /// Strafe; das ist ein erwartetes Ergebnis, kein Fehler. Ein Fehler ist
    /// nur der Aufruf auf einer bereits beendeten Episode.
    pub fn step(&self, state: &mut PlacementState, action: usize) -> Result<StepOutcome> {
        let EpisodeStatus::AwaitingItem(index) = state.status else {
            return Err(CoreError::EpisodeOver(state.status));
        };
        let spec = self
            .catalog
            .get(index)
            .ok_or_else(|| CoreError::InvalidCatalog(format!("no item at index {index}")))?;
        let candidates = candidates::generate(spec, &self.room);

        let Some(position) = candidates.get(action) else {
            state.status = EpisodeStatus::Failed;
            return Ok(self.failed(
                state,
                INVALID_ACTION_REWARD,
                StepEvent::InvalidAction {
                    action,
                    candidates: candidates.len(),
                },
            ));
        };

        let rect = spec.footprint(position.x, position.y);
        let resolution = self.room.occupancy_resolution;
        if !state.occupancy.is_free(&rect, resolution) {
            state.status = EpisodeStatus::Failed;
            return Ok(self.failed(
                state,
                COLLISION_REWARD,
                StepEvent::Collision {
                    x: position.x,
                    y: position.y,
                },
            ));
        }

        let breakdown = self.score(spec, &rect, &state.placed);
        state.occupancy.mark(&rect, resolution);
        let item = PlacedItem {
            name: spec.name.clone(),
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
        };
        state.placed.push(item.clone());
        state.status = if index + 1 >= self.catalog.len() {
            EpisodeStatus::Done
        } else {
            EpisodeStatus::AwaitingItem(index + 1)
        };

        telemetry::debug(&format!(
            "placed {} at ({}, {}): {breakdown:?}",
            item.name, item.x, item.y
        ));

        Ok(StepOutcome {
            state: self.observe(state),
            reward: breakdown.total(),
            done: state.is_terminal(),
            event: StepEvent::Placed(item),
            breakdown: Some(breakdown),
        })
    }

    fn failed(&self, state: &PlacementState, reward: f64, event: StepEvent) -> StepOutcome {
        StepOutcome {
            state: self.observe(state),
            reward,
            done: true,
            event,
            breakdown: None,
        }
    }

    /// Geformte Belohnung für `spec` auf `rect`, gegeben die zuvor platzierten
    /// Möbel (ohne das aktuelle).
    ///
    /// Strafgewichte werden immer abgezogen, auch wenn sie negativ
    /// konfiguriert sind.
    #[must_use]
    pub fn score(&self, spec: &FurnitureSpec, rect: &Rect, placed_before: &[PlacedItem]) -> RewardBreakdown {
        let w = &self.weights;
        let room = &self.room;
        let center = rect.center();
        let door = room.door_center();
        let window = room.window_point();
        let kind = spec.kind();

        let mut breakdown = RewardBreakdown {
            base: BASE_REWARD,
            ..RewardBreakdown::default()
        };

        if rect.touches_wall(room.width, room.height) {
            breakdown.wall = w.wall_bonus;
        }

        if matches!(kind, FurnitureKind::Bed | FurnitureKind::Desk) {
            let blocked = placed_before
                .iter()
                .any(|item| item.rect().inflate(PATH_BUFFER).intersects_segment(door, center));
            breakdown.path = if blocked {
                -w.path_block_penalty
            } else {
                w.path_clear_bonus
            };
        }

        if kind == FurnitureKind::Desk {
            let closeness = (1.0 - distance(center, window) / room.diagonal()).max(0.0);
            breakdown.window = closeness * w.desk_window_weight;
        }

        if kind == FurnitureKind::Nightstand {
            if let Some(bed) = placed_before
                .iter()
                .find(|item| FurnitureKind::from_name(&item.name) == FurnitureKind::Bed)
            {
                breakdown.nightstand = if distance(center, bed.center()) < NIGHTSTAND_NEAR_DISTANCE {
                    w.nightstand_near_bed_bonus
                } else {
                    -w.nightstand_far_penalty
                };
            }
        }

        if kind == FurnitureKind::Wardrobe {
            let to_door = distance(center, door);
            let to_window = distance(center, window);
            if to_door < WARDROBE_NEAR_DISTANCE || to_window < WARDROBE_NEAR_DISTANCE {
                breakdown.wardrobe = -w.wardrobe_near_penalty;
            } else if to_door > WARDROBE_FAR_DISTANCE && to_window > WARDROBE_FAR_DISTANCE {
                breakdown.wardrobe = w.wardrobe_far_bonus;
            }
        }

        for item in placed_before {
            let d = distance(center, item.center());
            if d < SPACING_BUFFER {
                breakdown.spacing -= w.inter_item_too_close_penalty;
            } else if d < 2.0 * SPACING_BUFFER {
                breakdown.spacing -= w.inter_item_close_penalty;
            }
        }

        breakdown
    }

    /// Layout-Artefakt der Episode.
    #[must_use]
    pub fn layout(&self, state: &PlacementState) -> Layout {
        Layout {
            room_width: self.room.width,
            room_height: self.room.height,
            items: state.placed.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::room::default_catalog;
    use std::collections::BTreeMap;

    fn env_with(catalog: Vec<FurnitureSpec>) -> PlacementEnv {
        PlacementEnv::new(RoomSpec::default(), catalog, RewardRuleSet::default())
            .expect("valid environment")
    }

    fn action_at(env: &PlacementEnv, index: usize, x: f64, y: f64) -> usize {
        env.candidates_for(index)
            .iter()
            .position(|p| (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9)
            .unwrap_or_else(|| panic!("({x}, {y}) is not a candidate for item {index}"))
    }

    fn first_free_action(env: &PlacementEnv, state: &PlacementState) -> usize {
        let k = state.cursor().expect("episode running");
        let spec = &env.catalog()[k];
        env.candidates_for(k)
            .iter()
            .position(|p| {
                state
                    .occupancy()
                    .is_free(&spec.footprint(p.x, p.y), env.room().occupancy_resolution)
            })
            .expect("some free candidate")
    }

    #[test]
    fn state_vector_has_grid_and_item_size() {
        let env = env_with(default_catalog());
        let mut state = env.new_episode();
        let obs = env.reset(&mut state);
        assert_eq!(obs.len(), env.state_dim());
        assert_eq!(obs.len(), 60 * 50 + 2);
        assert!((obs[obs.len() - 2] - 2.0).abs() < f32::EPSILON);
        assert!((obs[obs.len() - 1] - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn occupancy_grows_monotonically_and_matches_footprints() {
        let env = env_with(default_catalog());
        let res = env.room().occupancy_resolution;
        let mut state = env.new_episode();
        env.reset(&mut state);

        while !state.is_terminal() {
            let before = state.occupancy().clone();
            let action = first_free_action(&env, &state);
            let outcome = env.step(&mut state, action).expect("episode running");
            assert!(matches!(outcome.event, StepEvent::Placed(_)));

            let (cols, rows) = before.dims();
            for i in 0..cols {
                for j in 0..rows {
                    if before.get(i, j) {
                        assert!(state.occupancy().get(i, j));
                    }
                }
            }

            let mut expected = OccupancyGrid::new(cols, rows);
            for item in state.placed() {
                expected.mark(&item.rect(), res);
            }
            assert_eq!(&expected, state.occupancy());
        }

        assert_eq!(state.status(), EpisodeStatus::Done);
        assert_eq!(state.placed().len(), env.catalog().len());
        let names: Vec<_> = state.placed().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["BED", "WARDROBE", "DESK", "BOOKSHELF", "NIGHTSTAND"]);
    }

    #[test]
    fn invalid_action_fails_episode() {
        let env = env_with(default_catalog());
        let mut state = env.new_episode();
        env.reset(&mut state);
        let outcome = env
            .step(&mut state, env.action_dim() + 10)
            .expect("episode running");
        assert!((outcome.reward - INVALID_ACTION_REWARD).abs() < f64::EPSILON);
        assert!(outcome.done);
        assert_eq!(state.status(), EpisodeStatus::Failed);
        assert!(state.occupancy().is_empty());
        assert!(matches!(
            env.step(&mut state, 0),
            Err(CoreError::EpisodeOver(EpisodeStatus::Failed))
        ));
    }

    #[test]
    fn collision_fails_episode() {
        let catalog = vec![
            FurnitureSpec::new("BOX", 1.0, 1.0),
            FurnitureSpec::new("CRATE", 1.0, 1.0),
        ];
        let env = env_with(catalog);
        let mut state = env.new_episode();
        env.reset(&mut state);
        let a = action_at(&env, 0, 2.0, 2.0);
        env.step(&mut state, a).expect("first placement");
        let b = action_at(&env, 1, 2.5, 2.5);
        let outcome = env.step(&mut state, b).expect("episode running");
        assert!((outcome.reward - COLLISION_REWARD).abs() < f64::EPSILON);
        assert!(matches!(outcome.event, StepEvent::Collision { .. }));
        assert_eq!(state.status(), EpisodeStatus::Failed);
        assert_eq!(state.placed().len(), 1);
    }

    #[test]
    fn reset_after_failure_clears_everything() {
        let env = env_with(default_catalog());
        let mut state = env.new_episode();
        env.reset(&mut state);
        for _ in 0..2 {
            let action = first_free_action(&env, &state);
            env.step(&mut state, action).expect("episode running");
        }
        env.step(&mut state, usize::MAX).expect("episode running");
        assert_eq!(state.status(), EpisodeStatus::Failed);

        env.reset(&mut state);
        assert!(state.occupancy().is_empty());
        assert!(state.placed().is_empty());
        assert_eq!(state.status(), EpisodeStatus::AwaitingItem(0));
    }

    #[test]
    fn bed_with_clear_path_gets_clear_bonus() {
        let catalog = vec![
            FurnitureSpec::new("WARDROBE", 1.0, 1.5).touching_wall(),
            FurnitureSpec::new("BED", 2.0, 1.5).touching_wall(),
        ];
        let env = env_with(catalog);
        let mut state = env.new_episode();
        env.reset(&mut state);
        env.step(&mut state, action_at(&env, 0, 5.0, 0.0))
            .expect("wardrobe placed");
        let outcome = env
            .step(&mut state, action_at(&env, 1, 0.0, 3.5))
            .expect("bed placed");
        let breakdown = outcome.breakdown.expect("placement breakdown");
        assert!((breakdown.path - 0.5).abs() < 1e-12);
        // base + wall + clear bonus
        assert!((outcome.reward - (1.0 + 0.2 + 0.5)).abs() < 1e-12);
        assert!(outcome.done);
    }

    #[test]
    fn blocked_path_subtracts_penalty_literally() {
        let catalog = vec![
            FurnitureSpec::new("WARDROBE", 1.0, 1.5).touching_wall(),
            FurnitureSpec::new("BED", 2.0, 1.5).touching_wall(),
        ];

        // Default -1.0 wird abgezogen, erhöht also die Belohnung.
        let env = env_with(catalog.clone());
        let mut state = env.new_episode();
        env.reset(&mut state);
        env.step(&mut state, action_at(&env, 0, 0.0, 1.5))
            .expect("wardrobe placed");
        let outcome = env
            .step(&mut state, action_at(&env, 1, 0.0, 3.5))
            .expect("bed placed");
        let breakdown = outcome.breakdown.expect("placement breakdown");
        assert!((breakdown.path - 1.0).abs() < 1e-12);

        let rules = RewardRuleSet::with_overrides(&BTreeMap::from([(
            "path_block_penalty".to_string(),
            2.0,
        )]));
        let env = PlacementEnv::new(RoomSpec::default(), catalog, rules).expect("valid env");
        let mut state = env.new_episode();
        env.reset(&mut state);
        env.step(&mut state, action_at(&env, 0, 0.0, 1.5))
            .expect("wardrobe placed");
        let outcome = env
            .step(&mut state, action_at(&env, 1, 0.0, 3.5))
            .expect("bed placed");
        let breakdown = outcome.breakdown.expect("placement breakdown");
        assert!((breakdown.path + 2.0).abs() < 1e-12);
    }

    #[test]
    fn nightstand_near_bed_gets_bonus() {
        let catalog = vec![
            FurnitureSpec::new("BED", 1.0, 1.0),
            FurnitureSpec::new("NIGHTSTAND", 0.7, 0.7).avoiding_door(),
        ];
        let env = env_with(catalog);
        let mut state = env.new_episode();
        env.reset(&mut state);
        env.step(&mut state, action_at(&env, 0, 0.0, 4.0))
            .expect("bed placed");
        let outcome = env
            .step(&mut state, action_at(&env, 1, 1.0, 4.0))
            .expect("nightstand placed");
        let breakdown = outcome.breakdown.expect("placement breakdown");
        assert!((breakdown.nightstand - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nightstand_far_from_bed_subtracts_far_penalty() {
        let env = env_with(default_catalog());
        let nightstand = &env.catalog()[4];
        let bed = PlacedItem {
            name: "BED".into(),
            x: 4.0,
            y: 3.5,
            w: 2.0,
            h: 1.5,
        };
        let b = env.score(nightstand, &nightstand.footprint(2.0, 2.0), &[bed]);
        // Default -0.5 wird abgezogen.
        assert!((b.nightstand - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nightstand_without_bed_is_neutral() {
        let env = env_with(default_catalog());
        let nightstand = &env.catalog()[4];
        let b = env.score(nightstand, &nightstand.footprint(2.0, 2.0), &[]);
        assert!(b.nightstand.abs() < f64::EPSILON);
    }

    #[test]
    fn wardrobe_near_and_far_zones() {
        let env = env_with(default_catalog());
        let wardrobe = &env.catalog()[1];

        let near = env.score(wardrobe, &wardrobe.footprint(0.0, 0.0), &[]);
        assert!((near.wardrobe - 0.5).abs() < 1e-12);

        let far = env.score(wardrobe, &wardrobe.footprint(5.0, 0.0), &[]);
        assert!((far.wardrobe - 0.3).abs() < 1e-12);

        // Mittelpunkt (2.0, 1.25): Tür ≈ 1.68, Fenster ≈ 3.64
        let dead = env.score(wardrobe, &wardrobe.footprint(1.5, 0.5), &[]);
        assert!(dead.wardrobe.abs() < f64::EPSILON);
    }

    #[test]
    fn desk_at_window_gets_full_weight() {
        let env = env_with(default_catalog());
        let desk = &env.catalog()[2];
        let rect = desk.footprint(2.25, 4.375);
        let b = env.score(desk, &rect, &[]);
        assert!((b.window - 1.0).abs() < 1e-12);

        let corner = env.score(desk, &desk.footprint(0.0, 0.0), &[]);
        assert!(corner.window > 0.0 && corner.window < 1.0);
    }

    #[test]
    fn spacing_penalties_by_distance() {
        let env = env_with(default_catalog());
        let shelf = &env.catalog()[3];
        let rect = shelf.footprint(2.0, 0.0);
        let (cx, cy) = rect.center();
        let at = |dx: f64| PlacedItem {
            name: "OTHER".into(),
            x: cx + dx - 0.5,
            y: cy - 0.5,
            w: 1.0,
            h: 1.0,
        };

        let too_close = env.score(shelf, &rect, &[at(0.05)]);
        assert!((too_close.spacing - 1.0).abs() < 1e-12);

        let close = env.score(shelf, &rect, &[at(0.15)]);
        assert!((close.spacing - 0.5).abs() < 1e-12);

        let fine = env.score(shelf, &rect, &[at(0.25)]);
        assert!(fine.spacing.abs() < f64::EPSILON);
    }

    #[test]
    fn layout_lists_placements_in_order() {
        let env = env_with(default_catalog());
        let mut state = env.new_episode();
        env.reset(&mut state);
        let action = first_free_action(&env, &state);
        env.step(&mut state, action).expect("episode running");
        let layout = env.layout(&state);
        assert_eq!(layout.items.len(), 1);
        assert_eq!(layout.items[0].name, "BED");
        assert!((layout.room_width - 6.0).abs() < f64::EPSILON);
    }
}
