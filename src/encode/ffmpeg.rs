use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{Canvas, EncodingConfig};
use crate::foundation::error::{LyricError, LyricResult};
use crate::graph::builder::CompiledGraph;
use crate::graph::filter::num;

/// Which step of the run a renderer invocation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Background,
    Icon,
    AudioMix,
    Overlay,
    Mux,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Background => "background",
            Self::Icon => "icon",
            Self::AudioMix => "audio mix",
            Self::Overlay => "overlay",
            Self::Mux => "mux",
        })
    }
}

/// A fully built renderer invocation. Arguments exclude the program name.
#[derive(Clone, Debug, PartialEq)]
pub struct FfmpegCommand {
    pub stage: Stage,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl FfmpegCommand {
    fn new(stage: Stage, output: &Path) -> Self {
        Self {
            stage,
            args: vec!["-y".into(), "-hide_banner".into()],
            output: output.to_path_buf(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path)
    }

    fn finish(self) -> Self {
        let out = self.output.clone();
        self.arg(out)
    }

    /// Solid-color video of exactly `duration` seconds.
    pub fn background(
        canvas: Canvas,
        color: &str,
        duration: f64,
        enc: &EncodingConfig,
        output: &Path,
    ) -> Self {
        Self::new(Stage::Background, output)
            .args(["-f", "lavfi", "-i"])
            .arg(format!(
                "color=c={color}:s={}x{}:d={}",
                canvas.width,
                canvas.height,
                num(duration)
            ))
            .args(["-c:v", enc.video_codec.as_str(), "-pix_fmt", "yuv420p"])
            .finish()
    }

    /// Single-frame square checkbox icon: an outline, or a filled box when `filled`.
    pub fn icon(size: u32, color: &str, filled: bool, output: &Path) -> Self {
        let thickness = if filled {
            "fill".to_owned()
        } else {
            (size / 9).max(2).to_string()
        };
        Self::new(Stage::Icon, output)
            .args(["-f", "lavfi", "-i"])
            .arg(format!(
                "color=c=black@0.0:s={size}x{size},format=rgba,\
                 drawbox=x=0:y=0:w={size}:h={size}:color={color}:t={thickness}"
            ))
            .args(["-frames:v", "1"])
            .finish()
    }

    /// Apply the compiled audio graph to the original and backing tracks.
    pub fn audio_mix(
        original: &Path,
        backing: &Path,
        graph: &CompiledGraph,
        enc: &EncodingConfig,
        output: &Path,
    ) -> Self {
        Self::new(Stage::AudioMix, output)
            .input(original)
            .input(backing)
            .arg("-filter_complex")
            .arg(graph.filter_complex())
            .arg("-map")
            .arg(graph.map_arg())
            .args(["-c:a", enc.audio_codec.as_str()])
            .finish()
    }

    /// Apply the compiled overlay graph to the background and icons; output has no audio.
    pub fn overlay(
        background: &Path,
        unchecked_icon: &Path,
        checked_icon: &Path,
        graph: &CompiledGraph,
        enc: &EncodingConfig,
        output: &Path,
    ) -> Self {
        Self::new(Stage::Overlay, output)
            .input(background)
            .input(unchecked_icon)
            .input(checked_icon)
            .arg("-filter_complex")
            .arg(graph.filter_complex())
            .arg("-map")
            .arg(graph.map_arg())
            .args([
                "-an",
                "-c:v",
                enc.video_codec.as_str(),
                "-preset",
                enc.preset.as_str(),
                "-crf",
            ])
            .arg(enc.crf.to_string())
            .args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .finish()
    }

    /// Copy the video stream, re-encode the audio, stop at the shorter input.
    pub fn mux(video: &Path, audio: &Path, enc: &EncodingConfig, output: &Path) -> Self {
        Self::new(Stage::Mux, output)
            .input(video)
            .input(audio)
            .args([
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                enc.mux_audio_codec.as_str(),
                "-shortest",
                "-movflags",
                "+faststart",
            ])
            .finish()
    }

    /// Arguments as display strings.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Executes renderer invocations. Implementations block until the renderer exits.
pub trait CommandRunner {
    fn run(&mut self, cmd: &FfmpegCommand) -> LyricResult<()>;
}

/// Runs the system `ffmpeg`, showing its output live and keeping the tail of stderr for errors.
#[derive(Clone, Debug)]
pub struct FfmpegRunner {
    program: String,
    diagnostic_lines: usize,
    checked_on_path: bool,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            diagnostic_lines: 40,
            checked_on_path: false,
        }
    }

    pub fn with_diagnostic_lines(mut self, lines: usize) -> Self {
        self.diagnostic_lines = lines.max(1);
        self
    }
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl CommandRunner for FfmpegRunner {
    fn run(&mut self, cmd: &FfmpegCommand) -> LyricResult<()> {
        if !self.checked_on_path {
            if !is_program_on_path(&self.program) {
                return Err(LyricError::render_failed(
                    cmd.stage,
                    "not started",
                    format!("{} is required but was not found on PATH", self.program),
                ));
            }
            self.checked_on_path = true;
        }
        ensure_parent_dir(&cmd.output)?;

        tracing::debug!(stage = %cmd.stage, args = ?cmd.arg_strings(), "spawning {}", self.program);
        let mut child = Command::new(&self.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LyricError::render_failed(
                    cmd.stage,
                    "not started",
                    format!("failed to spawn {}: {e}", self.program),
                )
            })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            LyricError::render_failed(cmd.stage, "not started", "failed to open stderr")
        })?;
        let keep = self.diagnostic_lines;
        let drain = std::thread::spawn(move || tee_lines(stderr, std::io::stderr(), keep));

        let status = child.wait().map_err(|e| {
            LyricError::render_failed(cmd.stage, "unknown", format!("failed to wait: {e}"))
        })?;
        let tail = drain
            .join()
            .map_err(|_| LyricError::render_failed(cmd.stage, status.to_string(), "stderr drain panicked"))?
            .map_err(|e| {
                LyricError::render_failed(cmd.stage, status.to_string(), format!("stderr read failed: {e}"))
            })?;

        if !status.success() {
            return Err(LyricError::render_failed(
                cmd.stage,
                status.to_string(),
                tail.join("\n"),
            ));
        }
        Ok(())
    }
}

/// Copy `reader` to `sink` as it arrives, returning the last `keep` lines.
///
/// Carriage returns count as line breaks so progress updates stay separate lines in the tail.
fn tee_lines(mut reader: impl Read, mut sink: impl Write, keep: usize) -> std::io::Result<Vec<String>> {
    let mut buf = [0u8; 4096];
    let mut partial = Vec::new();
    let mut tail = VecDeque::with_capacity(keep + 1);

    let flush_line = |partial: &mut Vec<u8>, tail: &mut VecDeque<String>| {
        if partial.is_empty() {
            return;
        }
        tail.push_back(String::from_utf8_lossy(partial).into_owned());
        partial.clear();
        if tail.len() > keep {
            tail.pop_front();
        }
    };

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        // A closed terminal must not abort the render.
        let _ = sink.write_all(&buf[..n]);
        for &b in &buf[..n] {
            if b == b'\n' || b == b'\r' {
                flush_line(&mut partial, &mut tail);
            } else {
                partial.push(b);
            }
        }
    }
    flush_line(&mut partial, &mut tail);
    let _ = sink.flush();

    Ok(tail.into())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LyricResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `program -version` can be invoked.
pub fn is_program_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{FilterGraph, MediaKind};
    use crate::graph::filter::Filter;

    fn graph() -> CompiledGraph {
        let mut g = FilterGraph::new();
        let out = g
            .chain(
                FilterGraph::input(0, MediaKind::Audio),
                vec![Filter::Volume(1.0)],
                "out",
            )
            .unwrap();
        g.finish(out).unwrap()
    }

    #[test]
    fn background_uses_lavfi_color_with_duration() {
        let cmd = FfmpegCommand::background(
            Canvas::default(),
            "black",
            14.0,
            &EncodingConfig::default(),
            Path::new("work/bg.mp4"),
        );
        let args = cmd.arg_strings();
        assert_eq!(&args[..2], ["-y", "-hide_banner"]);
        assert!(args.contains(&"color=c=black:s=720x1280:d=14.000".to_owned()));
        assert_eq!(args.last().unwrap(), "work/bg.mp4");
        assert_eq!(cmd.stage, Stage::Background);
    }

    #[test]
    fn audio_mix_maps_graph_output_and_codec() {
        let g = graph();
        let cmd = FfmpegCommand::audio_mix(
            Path::new("o.mp3"),
            Path::new("b.mp3"),
            &g,
            &EncodingConfig::default(),
            Path::new("mix.mp3"),
        );
        let args = cmd.arg_strings();
        let i = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert_eq!(args[i + 1], "[0:a]volume=1.000[out0]");
        assert_eq!(args[i + 2..i + 4], ["-map", "[out0]"]);
        assert!(args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
        let inputs: Vec<&String> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| &w[1])
            .collect();
        assert_eq!(inputs, ["o.mp3", "b.mp3"]);
    }

    #[test]
    fn overlay_orders_background_then_icons_and_drops_audio() {
        let g = graph();
        let cmd = FfmpegCommand::overlay(
            Path::new("bg.mp4"),
            Path::new("off.png"),
            Path::new("on.png"),
            &g,
            &EncodingConfig::default(),
            Path::new("v.mp4"),
        );
        let args = cmd.arg_strings();
        let inputs: Vec<&String> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| &w[1])
            .collect();
        assert_eq!(inputs, ["bg.mp4", "off.png", "on.png"]);
        assert!(args.contains(&"-an".to_owned()));
        assert!(args.windows(2).any(|w| w == ["-preset", "veryfast"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "20"]));
    }

    #[test]
    fn mux_copies_video_and_stops_at_shortest() {
        let cmd = FfmpegCommand::mux(
            Path::new("v.mp4"),
            Path::new("a.mp3"),
            &EncodingConfig::default(),
            Path::new("out/final.mp4"),
        );
        let args = cmd.arg_strings();
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.contains(&"-shortest".to_owned()));
        assert_eq!(cmd.output, PathBuf::from("out/final.mp4"));
    }

    #[test]
    fn icons_are_outline_or_filled() {
        let off = FfmpegCommand::icon(36, "#8E8E93", false, Path::new("off.png")).arg_strings();
        let on = FfmpegCommand::icon(36, "yellow", true, Path::new("on.png")).arg_strings();
        assert!(off.iter().any(|a| a.ends_with("color=#8E8E93:t=4")));
        assert!(on.iter().any(|a| a.ends_with("color=yellow:t=fill")));
        assert!(on.windows(2).any(|w| w == ["-frames:v", "1"]));
    }

    #[test]
    fn tee_forwards_everything_and_keeps_tail() {
        let input = b"line one\nprogress 1\rprogress 2\rline four\nlast";
        let mut sink = Vec::new();
        let tail = tee_lines(&input[..], &mut sink, 2).unwrap();
        assert_eq!(sink, input.to_vec());
        assert_eq!(tail, vec!["line four".to_owned(), "last".to_owned()]);
    }

    #[test]
    fn missing_program_is_render_failed() {
        let mut runner = FfmpegRunner::new("lyric-clip-no-such-ffmpeg");
        let cmd = FfmpegCommand::mux(
            Path::new("v.mp4"),
            Path::new("a.mp3"),
            &EncodingConfig::default(),
            Path::new("target/never/out.mp4"),
        );
        let err = runner.run(&cmd).unwrap_err();
        assert!(matches!(err, LyricError::RenderFailed { .. }));
        assert!(err.to_string().starts_with("mux render failed"));
    }

    /// Stand-in renderer: answers `-version`, otherwise complains on stderr and exits 1.
    #[cfg(unix)]
    fn failing_renderer(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt as _;

        std::fs::create_dir_all(dir).unwrap();
        let script = dir.join("fake-ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             if [ \"$1\" = \"-version\" ]; then exit 0; fi\n\
             echo 'Input #0, lavfi' >&2\n\
             printf 'frame=  1\\rframe=  2\\n' >&2\n\
             echo '[AVFilterGraph] No such filter: bogus' >&2\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr_tail() {
        let dir = PathBuf::from("target").join("ffmpeg_runner");
        let script = failing_renderer(&dir);
        let mut runner = FfmpegRunner::new(script.to_string_lossy()).with_diagnostic_lines(2);
        let cmd = FfmpegCommand::mux(
            Path::new("v.mp4"),
            Path::new("a.mp3"),
            &EncodingConfig::default(),
            &dir.join("out").join("clip.mp4"),
        );

        let err = runner.run(&cmd).unwrap_err();
        let LyricError::RenderFailed {
            stage,
            status,
            diagnostics,
        } = &err
        else {
            panic!("unexpected error {err}");
        };
        assert_eq!(stage, "mux");
        assert!(status.contains('1'), "status was {status}");
        assert_eq!(diagnostics, "frame=  2\n[AVFilterGraph] No such filter: bogus");
        assert!(dir.join("out").is_dir());
    }
}
