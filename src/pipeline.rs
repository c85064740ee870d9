use std::path::{Path, PathBuf};

use crate::compile::audio::compile_audio_graph;
use crate::compile::overlay::compile_overlay_graph;
use crate::config::ClipConfig;
use crate::encode::ffmpeg::{CommandRunner, FfmpegCommand, FfmpegRunner};
use crate::foundation::error::{LyricError, LyricResult};
use crate::graph::builder::CompiledGraph;
use crate::probe::{FfprobeProbe, MediaTags, MetadataProbe};
use crate::style::StyleConfig;
use crate::timeline::parse::{TimedLine, read_timeline};
use crate::timeline::select::{LineRange, Selection};
use crate::timeline::timing::ClipTiming;

pub const BACKGROUND_FILE: &str = "background.mp4";
pub const MIXED_AUDIO_FILE: &str = "audio_mixed.mp3";
pub const SILENT_VIDEO_FILE: &str = "video_no_audio.mp4";
pub const UNCHECKED_ICON_FILE: &str = "icon_unchecked.png";
pub const CHECKED_ICON_FILE: &str = "icon_checked.png";

/// Everything decided before the renderer is invoked.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub selection: Selection,
    pub audio: CompiledGraph,
    pub overlay: CompiledGraph,
    pub style: StyleConfig,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub output: PathBuf,
    pub offset: f64,
    pub duration: f64,
    pub first_line: usize,
    pub line_count: usize,
}

pub struct Pipeline<R: CommandRunner, P: MetadataProbe> {
    config: ClipConfig,
    runner: R,
    probe: P,
}

impl Pipeline<FfmpegRunner, FfprobeProbe> {
    /// Pipeline backed by the system `ffmpeg`/`ffprobe` named in the config.
    pub fn system(config: ClipConfig) -> LyricResult<Self> {
        let runner = FfmpegRunner::new(config.encoding.ffmpeg.clone())
            .with_diagnostic_lines(config.encoding.diagnostic_lines);
        let probe = FfprobeProbe::new(config.encoding.ffprobe.clone());
        Self::new(config, runner, probe)
    }
}

impl RenderPlan {
    pub fn timing(&self) -> ClipTiming {
        self.selection.timing()
    }
}

impl<R: CommandRunner, P: MetadataProbe> Pipeline<R, P> {
    pub fn new(config: ClipConfig, runner: R, probe: P) -> LyricResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            runner,
            probe,
        })
    }

    pub fn config(&self) -> &ClipConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Load the timeline, pick the range with `select`, and compile both graphs.
    ///
    /// A failed metadata probe is not fatal: the header falls back to the placeholder title.
    pub fn plan<F>(&self, select: F) -> LyricResult<RenderPlan>
    where
        F: FnOnce(&[TimedLine]) -> LyricResult<LineRange>,
    {
        let timeline = read_timeline(&self.config.lyrics)?;
        if timeline.is_empty() {
            return Err(LyricError::invalid_selection(format!(
                "no timed lines in '{}'",
                self.config.lyrics.display()
            )));
        }
        let range = select(&timeline)?;
        let selection = Selection::new(&timeline, range)?;
        let timing = selection.timing();
        tracing::info!(
            range = %range,
            lines = selection.len(),
            offset = timing.offset,
            duration = timing.duration,
            "selected lines"
        );

        let tags = match self.probe.probe_tags(&self.config.original_audio) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(error = %e, "metadata probe failed; using placeholder title");
                MediaTags::default()
            }
        };
        let style = StyleConfig::from_tags(
            self.config.palette.clone(),
            self.config.layout,
            self.config.font.clone(),
            &tags,
            &selection,
        );

        let audio = compile_audio_graph(&selection, self.config.gains()?)?;
        let overlay = compile_overlay_graph(&selection, timing, &style)?;

        Ok(RenderPlan {
            selection,
            audio,
            overlay,
            style,
        })
    }

    /// Renderer invocations for `plan`, in execution order.
    pub fn commands(&self, plan: &RenderPlan) -> Vec<FfmpegCommand> {
        let c = &self.config;
        let enc = &c.encoding;
        let background = c.work_path(BACKGROUND_FILE);
        let mixed = c.work_path(MIXED_AUDIO_FILE);
        let silent = c.work_path(SILENT_VIDEO_FILE);

        let mut cmds = vec![
            FfmpegCommand::background(
                c.canvas,
                &c.background_color,
                plan.timing().duration,
                enc,
                &background,
            ),
            FfmpegCommand::audio_mix(&c.original_audio, &c.backing_audio, &plan.audio, enc, &mixed),
        ];

        let (unchecked, checked) = match &c.icons {
            Some(icons) => (icons.unchecked.clone(), icons.checked.clone()),
            None => {
                let unchecked = c.work_path(UNCHECKED_ICON_FILE);
                let checked = c.work_path(CHECKED_ICON_FILE);
                let size = c.layout.icon_size;
                cmds.push(FfmpegCommand::icon(
                    size,
                    &c.palette.checkbox_unselected,
                    false,
                    &unchecked,
                ));
                cmds.push(FfmpegCommand::icon(
                    size,
                    &c.palette.checkbox_selected,
                    true,
                    &checked,
                ));
                (unchecked, checked)
            }
        };

        cmds.push(FfmpegCommand::overlay(
            &background,
            &unchecked,
            &checked,
            &plan.overlay,
            enc,
            &silent,
        ));
        cmds.push(FfmpegCommand::mux(&silent, &mixed, enc, &c.output));
        cmds
    }

    /// Plan and render the clip. Stops at the first failing renderer invocation.
    pub fn run<F>(&mut self, select: F) -> LyricResult<RunReport>
    where
        F: FnOnce(&[TimedLine]) -> LyricResult<LineRange>,
    {
        self.check_sources()?;
        let plan = self.plan(select)?;
        let commands = self.commands(&plan);
        let total = commands.len();

        for (i, cmd) in commands.iter().enumerate() {
            tracing::info!(step = i + 1, total, stage = %cmd.stage, output = %cmd.output.display(), "rendering");
            self.runner.run(cmd)?;
        }

        tracing::info!(output = %self.config.output.display(), "clip written");
        Ok(RunReport {
            output: self.config.output.clone(),
            offset: plan.timing().offset,
            duration: plan.timing().duration,
            first_line: plan.selection.first_number(),
            line_count: plan.selection.len(),
        })
    }

    fn check_sources(&self) -> LyricResult<()> {
        let c = &self.config;
        let mut required: Vec<&Path> = vec![&c.original_audio, &c.backing_audio, &c.font];
        if let Some(icons) = &c.icons {
            required.push(&icons.unchecked);
            required.push(&icons.checked);
        }
        for path in required {
            std::fs::metadata(path).map_err(|e| LyricError::source_unavailable(path, e))?;
        }
        Ok(())
    }
}
