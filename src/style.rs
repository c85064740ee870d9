use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::probe::{MediaTags, format_title};
use crate::timeline::select::Selection;

/// Colors for every overlay role. Values are passed to the renderer verbatim (`white`, `#8E8E93`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub title: String,
    pub subtitle: String,
    pub bullet: String,
    pub pending: String,
    pub active: String,
    pub done: String,
    pub checkbox_selected: String,
    pub checkbox_unselected: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            title: "white".to_owned(),
            subtitle: "white".to_owned(),
            bullet: "white".to_owned(),
            pending: "gray".to_owned(),
            active: "yellow".to_owned(),
            done: "white".to_owned(),
            checkbox_selected: "yellow".to_owned(),
            checkbox_unselected: "#8E8E93".to_owned(),
        }
    }
}

/// Overlay geometry in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    pub title_y: i64,
    pub title_size: u32,
    pub subtitle_y: i64,
    pub subtitle_size: u32,
    pub bullet_x: i64,
    pub bullet_y: i64,
    pub bullet_size: u32,
    /// Top of the first checklist row.
    pub list_top: i64,
    pub row_height: i64,
    pub icon_x: i64,
    pub icon_size: u32,
    pub text_x: i64,
    /// Added to the row top so text sits on the icon's baseline.
    pub text_nudge: i64,
    pub text_size: u32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            title_y: 100,
            title_size: 42,
            subtitle_y: 180,
            subtitle_size: 36,
            bullet_x: 60,
            bullet_y: 260,
            bullet_size: 36,
            list_top: 340,
            row_height: 72,
            icon_x: 60,
            icon_size: 36,
            text_x: 120,
            text_nudge: 4,
            text_size: 36,
        }
    }
}

impl OverlayLayout {
    /// Top edge of checklist row `row` (0-based).
    pub fn row_y(&self, row: usize) -> i64 {
        self.list_top + row as i64 * self.row_height
    }
}

/// Everything the overlay compiler draws with.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
    pub palette: Palette,
    pub layout: OverlayLayout,
    pub font: PathBuf,
    pub title: String,
    pub subtitle: String,
    pub bullet: String,
}

impl StyleConfig {
    /// Title from the track tags, artist as subtitle, opening line as bullet.
    pub fn from_tags(
        palette: Palette,
        layout: OverlayLayout,
        font: PathBuf,
        tags: &MediaTags,
        selection: &Selection,
    ) -> Self {
        Self {
            palette,
            layout,
            font,
            title: format_title(tags),
            subtitle: tags.artist.clone(),
            bullet: selection.first().text.clone(),
        }
    }
}
