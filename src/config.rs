use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compile::audio::AudioGains;
use crate::foundation::error::{LyricError, LyricResult};
use crate::style::{OverlayLayout, Palette};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 720,
            height: 1280,
        }
    }
}

/// Pre-made checkbox images. When absent the pipeline renders its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPaths {
    pub unchecked: PathBuf,
    pub checked: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Codec of the mixed audio artifact.
    pub audio_codec: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    /// Codec the audio is re-encoded to in the final mux.
    pub mux_audio_codec: String,
    /// Trailing renderer stderr lines kept for a failed stage's error.
    pub diagnostic_lines: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_owned(),
            ffprobe: "ffprobe".to_owned(),
            audio_codec: "libmp3lame".to_owned(),
            video_codec: "libx264".to_owned(),
            preset: "veryfast".to_owned(),
            crf: 20,
            mux_audio_codec: "aac".to_owned(),
            diagnostic_lines: 40,
        }
    }
}

/// Everything one run needs: source assets, output locations, mix levels and look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClipConfig {
    pub original_audio: PathBuf,
    pub backing_audio: PathBuf,
    pub lyrics: PathBuf,
    pub font: PathBuf,
    pub output: PathBuf,
    /// Directory for intermediate artifacts.
    pub work_dir: PathBuf,
    pub icons: Option<IconPaths>,
    pub original_gain: f64,
    pub backing_gain: f64,
    pub canvas: Canvas,
    pub background_color: String,
    pub palette: Palette,
    pub layout: OverlayLayout,
    pub encoding: EncodingConfig,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            original_audio: PathBuf::from("audio/original.mp3"),
            backing_audio: PathBuf::from("audio/backing.mp3"),
            lyrics: PathBuf::from("lyrics/lyrics.lrc"),
            font: PathBuf::from("fonts/font.ttf"),
            output: PathBuf::from("output/result.mp4"),
            work_dir: PathBuf::from("output"),
            icons: None,
            original_gain: 0.2,
            backing_gain: 0.75,
            canvas: Canvas::default(),
            background_color: "black".to_owned(),
            palette: Palette::default(),
            layout: OverlayLayout::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

impl ClipConfig {
    pub fn load(path: &Path) -> LyricResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| LyricError::source_unavailable(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            LyricError::validation(format!("invalid config '{}': {e}", path.display()))
        })
    }

    pub fn validate(&self) -> LyricResult<()> {
        self.gains()?;
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(LyricError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(LyricError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.layout.icon_size == 0 {
            return Err(LyricError::validation("layout icon_size must be non-zero"));
        }
        if self.layout.row_height <= 0 {
            return Err(LyricError::validation("layout row_height must be positive"));
        }
        if self.encoding.ffmpeg.trim().is_empty() || self.encoding.ffprobe.trim().is_empty() {
            return Err(LyricError::validation(
                "ffmpeg/ffprobe program names must be non-empty",
            ));
        }
        if self.encoding.diagnostic_lines == 0 {
            return Err(LyricError::validation("encoding diagnostic_lines must be non-zero"));
        }
        if self.background_color.trim().is_empty() {
            return Err(LyricError::validation("background_color must be non-empty"));
        }
        Ok(())
    }

    pub fn gains(&self) -> LyricResult<AudioGains> {
        AudioGains::new(self.original_gain, self.backing_gain)
    }

    /// Path of intermediate artifact `name` inside the work directory.
    pub fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}
