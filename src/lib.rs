//! lyric-clip turns a timed lyric file into a short vertical lyric video.
//!
//! The crate never touches pixels or samples itself. It parses an LRC timeline, lets the caller
//! pick a contiguous run of lines, compiles two ffmpeg filter graphs from that selection and
//! sequences the `ffmpeg` invocations that render, mix and mux the clip:
//!
//! - [`parse_timeline`] / [`read_timeline`] produce [`TimedLine`]s
//! - [`Selection::new`] picks the working range, [`ClipTiming`] derives offset and duration
//! - [`compile_audio_graph`] and [`compile_overlay_graph`] emit [`CompiledGraph`]s
//! - [`Pipeline`] drives the whole run through a [`CommandRunner`]
#![forbid(unsafe_code)]

pub mod compile;
pub mod config;
pub mod encode;
mod foundation;
pub mod graph;
pub mod pipeline;
pub mod probe;
pub mod style;
pub mod timeline;

pub use crate::compile::audio::{AudioGains, compile_audio_graph};
pub use crate::compile::overlay::compile_overlay_graph;
pub use crate::config::{Canvas, ClipConfig, EncodingConfig, IconPaths};
pub use crate::encode::ffmpeg::{
    CommandRunner, FfmpegCommand, FfmpegRunner, Stage, ensure_parent_dir, is_program_on_path,
};
pub use crate::foundation::error::{LyricError, LyricResult};
pub use crate::graph::builder::{CompiledGraph, FilterGraph, FilterNode, MediaKind, StreamLabel};
pub use crate::graph::filter::{Anchor, DrawText, Filter, Gate};
pub use crate::pipeline::{Pipeline, RenderPlan, RunReport};
pub use crate::probe::{FfprobeProbe, MediaTags, MetadataProbe, TITLE_PLACEHOLDER, format_title};
pub use crate::style::{OverlayLayout, Palette, StyleConfig};
pub use crate::timeline::parse::{TimedLine, parse_timeline, read_timeline};
pub use crate::timeline::select::{LineRange, Selection, parse_line_range};
pub use crate::timeline::timing::ClipTiming;
