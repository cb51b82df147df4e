//! Kandidaten-Generator: alle zulässigen, rasterausgerichteten linken unteren
//! Ecken für ein Möbelstück.
//!
//! Die Reihenfolge ist deterministisch (x außen, y innen). Der Aktionsindex
//! der Policy ist ein Index in genau diese Folge.

use crate::room::{FurnitureSpec, RoomSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Zuschlag auf die obere Schleifengrenze, damit die letzte Reihe/Spalte trotz
/// aufsummierter Gleitkommafehler dabei ist.
const BOUNDARY_EPSILON: f64 = 0.01;

/// Linke untere Ecke eines Kandidaten, auf zwei Nachkommastellen gerundet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Geordnete Kandidatenmenge eines Möbelstücks.
pub type CandidateSet = Vec<Position>;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ganzzahliger Schlüssel in Hundertsteln; gleiche gerundete Positionen
/// haben denselben Schlüssel.
#[allow(clippy::cast_possible_truncation)]
fn centi_key(position: Position) -> (i64, i64) {
    ((position.x * 100.0).round() as i64, (position.y * 100.0).round() as i64)
}

fn grid_steps(limit: f64, grid_size: f64) -> impl Iterator<Item = f64> {
    (0_u32..)
        .map(move |k| f64::from(k) * grid_size)
        .take_while(move |v| *v < limit + BOUNDARY_EPSILON)
}

/// Erzeugt die Kandidatenmenge für `spec` in `room`.
///
/// Reine Funktion: gleiche Eingaben liefern dieselbe Folge in derselben
/// Reihenfolge.
#[must_use]
pub fn generate(spec: &FurnitureSpec, room: &RoomSpec) -> CandidateSet {
    let mut candidates = CandidateSet::new();
    let mut seen = BTreeSet::new();

    for x in grid_steps(room.width - spec.width, room.grid_size) {
        for y in grid_steps(room.height - spec.height, room.grid_size) {
            let rect = spec.footprint(x, y);

            if spec.must_touch_wall && !rect.touches_wall(room.width, room.height) {
                continue;
            }
            if spec.avoid_door_zone && rect.overlaps(&room.door_zone) {
                continue;
            }

            let position = Position {
                x: round2(x),
                y: round2(y),
            };
            // Feinere Raster als 0.01 runden auf schon gesehene Punkte.
            if seen.insert(centi_key(position)) {
                candidates.push(position);
            }
        }
    }

    candidates
}

/// Kandidatenmengen für den ganzen Katalog, in Katalogreihenfolge.
#[must_use]
pub fn generate_all(catalog: &[FurnitureSpec], room: &RoomSpec) -> Vec<CandidateSet> {
    catalog.iter().map(|spec| generate(spec, room)).collect()
}

/// Größte Kandidatenmenge im Katalog; legt die Breite des Aktionskopfs fest.
#[must_use]
pub fn max_candidates(catalog: &[FurnitureSpec], room: &RoomSpec) -> usize {
    catalog
        .iter()
        .map(|spec| generate(spec, room).len())
        .max()
        .unwrap_or(0)
}
