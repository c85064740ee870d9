use crate::foundation::error::{LyricError, LyricResult};
use crate::graph::builder::{CompiledGraph, FilterGraph, FilterNode, MediaKind};
use crate::graph::filter::Filter;
use crate::timeline::parse::TimedLine;
use crate::timeline::select::Selection;

/// `-i` position of the original (vocal) track.
pub const ORIGINAL_INPUT: usize = 0;
/// `-i` position of the backing (instrumental) track.
pub const BACKING_INPUT: usize = 1;

/// Gains applied to lines after the opening one. The opening line always plays at 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioGains {
    pub original: f64,
    pub backing: f64,
}

impl AudioGains {
    pub fn new(original: f64, backing: f64) -> LyricResult<Self> {
        for (name, gain) in [("original", original), ("backing", backing)] {
            if !gain.is_finite() || !(0.0..=1.0).contains(&gain) {
                return Err(LyricError::validation(format!(
                    "{name} gain must be within [0, 1], got {gain}"
                )));
            }
        }
        Ok(Self { original, backing })
    }
}

/// Compile the audio graph for `selection`.
///
/// The opening line is cut from the original track alone at full volume. Every later line is
/// cut from both tracks, each at its own gain, and mixed with the backing cut first so the
/// mix length follows it. All segments are concatenated in selection order into `out`.
#[tracing::instrument(skip_all, fields(lines = selection.len()))]
pub fn compile_audio_graph(selection: &Selection, gains: AudioGains) -> LyricResult<CompiledGraph> {
    let original = FilterGraph::input(ORIGINAL_INPUT, MediaKind::Audio);
    let backing = FilterGraph::input(BACKING_INPUT, MediaKind::Audio);
    let mut graph = FilterGraph::new();

    let first = graph.named("first")?;
    graph.push(FilterNode::new(
        vec![original.clone()],
        cut(selection.first(), 1.0),
        vec![first.clone()],
    ))?;

    let mut segments = Vec::with_capacity(selection.len());
    segments.push(first);
    // `first` is segment 0; the mixed segments follow as seg1, seg2, ...
    for (n, line) in (1..).zip(selection.rest()) {
        let back = graph.named(&format!("back{n}"))?;
        let orig = graph.named(&format!("orig{n}"))?;
        let seg = graph.named(&format!("seg{n}"))?;
        graph.push(FilterNode::new(
            vec![backing.clone()],
            cut(line, gains.backing),
            vec![back.clone()],
        ))?;
        graph.push(FilterNode::new(
            vec![original.clone()],
            cut(line, gains.original),
            vec![orig.clone()],
        ))?;
        graph.push(FilterNode::new(
            vec![back, orig],
            vec![Filter::AMix { inputs: 2 }],
            vec![seg.clone()],
        ))?;
        segments.push(seg);
    }

    let out = graph.named("out")?;
    let count = segments.len();
    graph.push(FilterNode::new(
        segments,
        vec![Filter::Concat {
            segments: count,
            video: 0,
            audio: 1,
        }],
        vec![out.clone()],
    ))?;

    let compiled = graph.finish(out)?;
    tracing::debug!(nodes = compiled.nodes().len(), "compiled audio graph");
    Ok(compiled)
}

fn cut(line: &TimedLine, gain: f64) -> Vec<Filter> {
    vec![
        Filter::ATrim {
            start: line.start,
            end: line.end,
        },
        Filter::ResetAudioPts,
        Filter::Volume(gain),
    ]
}
