//! Statische Beschreibung des Raums und des Möbelkatalogs.
//!
//! Beides wird einmal beim Start erzeugt und danach nur noch gelesen.

use crate::error::{CoreError, Result};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Abmessungen des Raums, Rasterweite für Kandidaten und Türbereich.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub width: f64,
    pub height: f64,
    /// Schrittweite, mit der Kandidaten-Ecken aufgezählt werden.
    pub grid_size: f64,
    /// Freizuhaltender Bereich vor der Tür.
    pub door_zone: Rect,
    /// Kantenlänge einer Zelle des Belegungsrasters.
    #[serde(default = "RoomSpec::default_occupancy_resolution")]
    pub occupancy_resolution: f64,
}

impl Default for RoomSpec {
    fn default() -> Self {
        Self {
            width: 6.0,
            height: 5.0,
            grid_size: 0.5,
            door_zone: Rect::new(0.0, 0.0, 1.0, 1.0),
            occupancy_resolution: Self::default_occupancy_resolution(),
        }
    }
}

impl RoomSpec {
    const fn default_occupancy_resolution() -> f64 {
        0.1
    }

    /// Mittelpunkt des Türbereichs, Startpunkt der Laufweg-Prüfung.
    #[must_use]
    pub fn door_center(&self) -> (f64, f64) {
        self.door_zone.center()
    }

    /// Fester „Fenster“-Punkt: Raummitte, knapp vor der gegenüberliegenden Wand.
    #[must_use]
    pub fn window_point(&self) -> (f64, f64) {
        (self.width / 2.0, self.height - 0.25)
    }

    /// Länge der Raumdiagonale.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Spalten und Zeilen des Belegungsrasters.
    #[must_use]
    pub fn occupancy_dims(&self) -> (usize, usize) {
        (
            cell_index(self.width, self.occupancy_resolution),
            cell_index(self.height, self.occupancy_resolution),
        )
    }

    /// Prüft den Raum und alle Möbel auf Plausibilität.
    pub fn validate(&self, catalog: &[FurnitureSpec]) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("grid_size", self.grid_size),
            ("occupancy_resolution", self.occupancy_resolution),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidRoom(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        let door = &self.door_zone;
        if door.x < 0.0 || door.y < 0.0 || door.right() > self.width || door.top() > self.height
        {
            return Err(CoreError::InvalidRoom(format!(
                "door zone {door:?} lies outside the room"
            )));
        }

        if catalog.is_empty() {
            return Err(CoreError::InvalidCatalog("catalog is empty".into()));
        }
        for spec in catalog {
            if !(spec.width > 0.0 && spec.height > 0.0) {
                return Err(CoreError::InvalidCatalog(format!(
                    "{} has a non-positive size",
                    spec.name
                )));
            }
            if spec.width > self.width || spec.height > self.height {
                return Err(CoreError::InvalidCatalog(format!(
                    "{} ({}x{}) does not fit into the room",
                    spec.name, spec.width, spec.height
                )));
            }
        }
        Ok(())
    }
}

/// Index der Rasterzelle, in die die Koordinate `value` fällt.
///
/// Das kleine Epsilon fängt Rundungsrauschen wie `11.999999` ab.
#[must_use]
pub(crate) fn cell_index(value: f64, resolution: f64) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (value / resolution + 1e-9).floor().max(0.0) as usize
    }
}

/// Möbeltypen mit eigenen Belegungsregeln.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureKind {
    Bed,
    Wardrobe,
    Desk,
    Bookshelf,
    Nightstand,
    Other,
}

impl FurnitureKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "BED" => Self::Bed,
            "WARDROBE" => Self::Wardrobe,
            "DESK" => Self::Desk,
            "BOOKSHELF" => Self::Bookshelf,
            "NIGHTSTAND" => Self::Nightstand,
            _ => Self::Other,
        }
    }
}

/// Ein zu platzierendes Möbelstück.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureSpec {
    /// Eindeutiger Name, z. B. "BED".
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub must_touch_wall: bool,
    #[serde(default)]
    pub avoid_door_zone: bool,
}

impl FurnitureSpec {
    #[must_use]
    pub fn new(name: &str, width: f64, height: f64) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            must_touch_wall: false,
            avoid_door_zone: false,
        }
    }

    #[must_use]
    pub fn touching_wall(mut self) -> Self {
        self.must_touch_wall = true;
        self
    }

    #[must_use]
    pub fn avoiding_door(mut self) -> Self {
        self.avoid_door_zone = true;
        self
    }

    #[must_use]
    pub fn kind(&self) -> FurnitureKind {
        FurnitureKind::from_name(&self.name)
    }

    /// Grundfläche bei linker unterer Ecke `(x, y)`.
    #[must_use]
    pub fn footprint(&self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }
}

/// Der Standardkatalog in Platzierungsreihenfolge.
#[must_use]
pub fn default_catalog() -> Vec<FurnitureSpec> {
    vec![
        FurnitureSpec::new("BED", 2.0, 1.5).touching_wall(),
        FurnitureSpec::new("WARDROBE", 1.0, 1.5).touching_wall(),
        FurnitureSpec::new("DESK", 1.5, 0.75).touching_wall(),
        FurnitureSpec::new("BOOKSHELF", 0.8, 1.2).touching_wall(),
        FurnitureSpec::new("NIGHTSTAND", 0.7, 0.7).avoiding_door(),
    ]
}
