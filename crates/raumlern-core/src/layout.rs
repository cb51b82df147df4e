//! Platzierte Möbel und das Layout-Artefakt für externe Renderer.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Ein fest platziertes Möbelstück.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PlacedItem {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        self.rect().center()
    }
}

/// Platzierungsliste plus Raummaße: alles, was ein Renderer braucht.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub room_width: f64,
    pub room_height: f64,
    pub items: Vec<PlacedItem>,
}

impl Layout {
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
