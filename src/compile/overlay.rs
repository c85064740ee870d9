use crate::foundation::error::LyricResult;
use crate::graph::builder::{CompiledGraph, FilterGraph, FilterNode, MediaKind, StreamLabel};
use crate::graph::filter::{Anchor, DrawText, Filter, Gate};
use crate::style::StyleConfig;
use crate::timeline::select::Selection;
use crate::timeline::timing::ClipTiming;

pub const BACKGROUND_INPUT: usize = 0;
pub const UNCHECKED_ICON_INPUT: usize = 1;
pub const CHECKED_ICON_INPUT: usize = 2;

/// Compile the checklist overlay graph for `selection`.
///
/// Header text (title, subtitle, bullet) is drawn first. The opening line is the bullet, so
/// the checklist holds only the lines after it. Each row gets two icon overlays and three text
/// draws, gated on clip-relative time: unchecked before the line starts, checked from the
/// start on; pending text before start, active text over `[start, end]`, done text after end.
/// Every step reads the previous step's output, so the chain is strictly linear.
#[tracing::instrument(skip_all, fields(rows = selection.rest().len(), offset = timing.offset))]
pub fn compile_overlay_graph(
    selection: &Selection,
    timing: ClipTiming,
    style: &StyleConfig,
) -> LyricResult<CompiledGraph> {
    let layout = &style.layout;
    let palette = &style.palette;
    let mut graph = FilterGraph::new();
    let mut current = FilterGraph::input(BACKGROUND_INPUT, MediaKind::Video);

    current = draw(
        &mut graph,
        current,
        text(style, style.title.clone(), layout.title_size, &palette.title)
            .at(Anchor::Centered, layout.title_y),
    )?;
    current = draw(
        &mut graph,
        current,
        text(
            style,
            format!("-{}", style.subtitle),
            layout.subtitle_size,
            &palette.subtitle,
        )
        .at(Anchor::Centered, layout.subtitle_y),
    )?;
    current = draw(
        &mut graph,
        current,
        text(
            style,
            format!("• {}", style.bullet),
            layout.bullet_size,
            &palette.bullet,
        )
        .at(Anchor::Left(layout.bullet_x), layout.bullet_y),
    )?;

    let rows = selection.rest();
    if rows.is_empty() {
        return graph.finish(current);
    }

    let unchecked = fan_out(
        &mut graph,
        FilterGraph::input(UNCHECKED_ICON_INPUT, MediaKind::Video),
        layout.icon_size,
        rows.len(),
        "unchecked",
    )?;
    let checked = fan_out(
        &mut graph,
        FilterGraph::input(CHECKED_ICON_INPUT, MediaKind::Video),
        layout.icon_size,
        rows.len(),
        "checked",
    )?;

    for (row, ((line, off_icon), on_icon)) in rows.iter().zip(unchecked).zip(checked).enumerate() {
        let y = layout.row_y(row);
        let start = timing.relative(line.start);
        let end = timing.relative(line.end);

        current = overlay(&mut graph, current, off_icon, layout.icon_x, y, Gate::Before(start))?;
        current = overlay(&mut graph, current, on_icon, layout.icon_x, y, Gate::From(start))?;

        let text_y = y + layout.text_nudge;
        let phases = [
            (&palette.pending, Gate::Before(start)),
            (&palette.active, Gate::Within { start, end }),
            (&palette.done, Gate::After(end)),
        ];
        for (color, gate) in phases {
            current = draw(
                &mut graph,
                current,
                text(style, line.text.clone(), layout.text_size, color)
                    .at(Anchor::Left(layout.text_x), text_y)
                    .gated(gate),
            )?;
        }
    }

    let compiled = graph.finish(current)?;
    tracing::debug!(nodes = compiled.nodes().len(), "compiled overlay graph");
    Ok(compiled)
}

fn text(style: &StyleConfig, text: String, size: u32, color: &str) -> DrawText {
    DrawText {
        font: style.font.clone(),
        text,
        size,
        color: color.to_owned(),
        x: Anchor::Centered,
        y: 0,
        enable: None,
    }
}

fn draw(graph: &mut FilterGraph, current: StreamLabel, d: DrawText) -> LyricResult<StreamLabel> {
    graph.chain(current, vec![Filter::DrawText(d)], "v")
}

fn overlay(
    graph: &mut FilterGraph,
    current: StreamLabel,
    icon: StreamLabel,
    x: i64,
    y: i64,
    gate: Gate,
) -> LyricResult<StreamLabel> {
    let out = graph.fresh("v");
    graph.push(FilterNode::new(
        vec![current, icon],
        vec![Filter::Overlay {
            x,
            y,
            enable: Some(gate),
        }],
        vec![out.clone()],
    ))?;
    Ok(out)
}

/// Scale an icon input once and split it into `count` single-use links.
fn fan_out(
    graph: &mut FilterGraph,
    source: StreamLabel,
    size: u32,
    count: usize,
    hint: &str,
) -> LyricResult<Vec<StreamLabel>> {
    let outputs: Vec<StreamLabel> = (0..count).map(|_| graph.fresh(hint)).collect();
    graph.push(FilterNode::new(
        vec![source],
        vec![
            Filter::Scale {
                width: size,
                height: size,
            },
            Filter::Split(count),
        ],
        outputs.clone(),
    ))?;
    Ok(outputs)
}
