//! Achsenparallele Rechtecke und die wenigen Geometrie-Tests, die die
//! Belohnungsregeln und das Rejection-Sampling brauchen.

use serde::{Deserialize, Serialize};

/// Toleranz, innerhalb derer eine Kante als „an der Wand“ gilt.
pub const WALL_TOLERANCE: f64 = 0.1;

/// Ein achsenparalleles Rechteck mit linker unterer Ecke `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y + self.h
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Vergrößert das Rechteck auf allen Seiten um `margin`.
    #[must_use]
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2.0 * margin,
            h: self.h + 2.0 * margin,
        }
    }

    /// Echte Überlappung: reine Berührung an einer Kante zählt nicht.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.top()
            && self.top() > other.y
    }

    /// Liegt mindestens eine Kante innerhalb von [`WALL_TOLERANCE`] an einer
    /// Raumgrenze eines `room_width` × `room_height` großen Raums?
    #[must_use]
    pub fn touches_wall(&self, room_width: f64, room_height: f64) -> bool {
        self.x.abs() < WALL_TOLERANCE
            || (self.right() - room_width).abs() < WALL_TOLERANCE
            || self.y.abs() < WALL_TOLERANCE
            || (self.top() - room_height).abs() < WALL_TOLERANCE
    }

    /// Schneidet die Strecke `start`–`end` das (geschlossene) Rechteck?
    ///
    /// Liang-Barsky-Clipping; Berührung des Randes zählt als Schnitt.
    #[must_use]
    pub fn intersects_segment(&self, start: (f64, f64), end: (f64, f64)) -> bool {
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        for (p, q) in [
            (-dx, start.0 - self.x),
            (dx, self.right() - start.0),
            (-dy, start.1 - self.y),
            (dy, self.top() - start.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return false;
            }
        }
        true
    }
}

/// Euklidischer Abstand zweier Punkte.
#[must_use]
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Prüft, ob die um `margin` vergrößerte Box von `rect` eine ebenso
/// vergrößerte Box eines der `others` überlappt.
///
/// Der Test ist symmetrisch: `a` gegen `[b]` liefert dasselbe wie `b` gegen `[a]`.
#[must_use]
pub fn violates_buffer_box<'a, I>(rect: &Rect, others: I, margin: f64) -> bool
where
    I: IntoIterator<Item = &'a Rect>,
{
    let own = rect.inflate(margin);
    others
        .into_iter()
        .any(|other| own.overlaps(&other.inflate(margin)))
}
