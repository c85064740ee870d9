use std::fmt::{self, Display};
use std::path::PathBuf;

/// Time-window visibility predicate, evaluated by the renderer against the stream clock `t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gate {
    /// `t < at`
    Before(f64),
    /// `t >= at`
    From(f64),
    /// `start <= t <= end`
    Within { start: f64, end: f64 },
    /// `t > at`
    After(f64),
}

impl Gate {
    /// Same predicate the renderer evaluates for `enable`.
    pub fn is_open(&self, t: f64) -> bool {
        match *self {
            Self::Before(at) => t < at,
            Self::From(at) => t >= at,
            Self::Within { start, end } => start <= t && t <= end,
            Self::After(at) => t > at,
        }
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Before(at) => write!(f, "lt(t,{})", num(at)),
            Self::From(at) => write!(f, "gte(t,{})", num(at)),
            Self::Within { start, end } => write!(f, "between(t,{},{})", num(start), num(end)),
            Self::After(at) => write!(f, "gt(t,{})", num(at)),
        }
    }
}

/// Horizontal placement of drawn text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Centered,
    Left(i64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawText {
    pub font: PathBuf,
    pub text: String,
    pub size: u32,
    pub color: String,
    pub x: Anchor,
    pub y: i64,
    pub enable: Option<Gate>,
}

impl DrawText {
    pub fn at(mut self, x: Anchor, y: i64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.enable = Some(gate);
        self
    }
}

/// One filter inside a node's chain. Serializes to the renderer's filter syntax.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    ATrim { start: f64, end: f64 },
    /// `asetpts=PTS-STARTPTS`: restart timestamps at zero after a trim.
    ResetAudioPts,
    Volume(f64),
    /// `amix` whose output length follows its first input.
    AMix { inputs: usize },
    Concat { segments: usize, video: usize, audio: usize },
    Scale { width: u32, height: u32 },
    Split(usize),
    Overlay { x: i64, y: i64, enable: Option<Gate> },
    DrawText(DrawText),
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ATrim { start, end } => write!(f, "atrim={}:{}", num(*start), num(*end)),
            Self::ResetAudioPts => f.write_str("asetpts=PTS-STARTPTS"),
            Self::Volume(gain) => write!(f, "volume={}", num(*gain)),
            Self::AMix { inputs } => write!(f, "amix=inputs={inputs}:duration=first"),
            Self::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={segments}:v={video}:a={audio}"),
            Self::Scale { width, height } => write!(f, "scale={width}:{height}"),
            Self::Split(n) => write!(f, "split={n}"),
            Self::Overlay { x, y, enable } => {
                write!(f, "overlay=x={x}:y={y}")?;
                write_enable(f, enable.as_ref())
            }
            Self::DrawText(d) => {
                write!(
                    f,
                    "drawtext=fontfile={}:expansion=none:text={}:fontsize={}:fontcolor={}",
                    escape_value(&d.font.to_string_lossy()),
                    escape_value(&d.text),
                    d.size,
                    escape_value(&d.color),
                )?;
                match d.x {
                    Anchor::Centered => f.write_str(":x=(w-text_w)/2")?,
                    Anchor::Left(x) => write!(f, ":x={x}")?,
                }
                write!(f, ":y={}", d.y)?;
                write_enable(f, d.enable.as_ref())
            }
        }
    }
}

fn write_enable(f: &mut fmt::Formatter<'_>, gate: Option<&Gate>) -> fmt::Result {
    match gate {
        Some(gate) => write!(f, ":enable='{gate}'"),
        None => Ok(()),
    }
}

/// Seconds and gains are written with millisecond precision.
pub(crate) fn num(v: f64) -> String {
    format!("{v:.3}")
}

/// Escape a free-form option value for use inside a filter graph.
///
/// Two levels apply: the option parser treats `\ ' :` as special, then the graph parser treats
/// `\ ' [ ] , ;` as special. Each level gets its own backslash pass.
pub fn escape_value(raw: &str) -> String {
    escape_chars(&escape_chars(raw, &['\\', '\'', ':']), &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
