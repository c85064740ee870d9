use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use crate::foundation::error::{LyricError, LyricResult};
use crate::graph::filter::Filter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// A stream endpoint in the graph: either a stream of an input file or an internal link.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamLabel {
    Input { file: usize, kind: MediaKind },
    Link(String),
}

impl StreamLabel {
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

impl Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input { file, kind } => {
                let k = match kind {
                    MediaKind::Audio => 'a',
                    MediaKind::Video => 'v',
                };
                write!(f, "{file}:{k}")
            }
            Self::Link(name) => f.write_str(name),
        }
    }
}

/// One `[in]...filter,filter[out]...` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterNode {
    pub inputs: Vec<StreamLabel>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<StreamLabel>,
}

impl FilterNode {
    pub fn new(inputs: Vec<StreamLabel>, filters: Vec<Filter>, outputs: Vec<StreamLabel>) -> Self {
        Self {
            inputs,
            filters,
            outputs,
        }
    }
}

impl Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{input}]")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for output in &self.outputs {
            write!(f, "[{output}]")?;
        }
        Ok(())
    }
}

/// In-memory filter graph under construction.
///
/// Internal links are allocated by the graph itself, produced by exactly one node and consumed
/// by at most one later node. Input-file streams may be read any number of times. Because a
/// node can only consume links produced by earlier nodes, node order is always a valid
/// topological order.
#[derive(Debug, Default)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
    reserved: HashSet<String>,
    produced: HashSet<String>,
    consumed: HashSet<String>,
    /// Next index per hint, so `seg` and `back` number independently.
    counters: HashMap<String, u32>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream `kind` of input file number `file` (the renderer's `-i` order).
    pub fn input(file: usize, kind: MediaKind) -> StreamLabel {
        StreamLabel::Input { file, kind }
    }

    /// Allocate a unique link named `{hint}{n}`, counting from 0 for each hint.
    pub fn fresh(&mut self, hint: &str) -> StreamLabel {
        let next = self.counters.entry(hint.to_owned()).or_default();
        loop {
            let name = format!("{hint}{next}");
            *next += 1;
            if self.reserved.insert(name.clone()) {
                return StreamLabel::Link(name);
            }
        }
    }

    /// Reserve a link with an exact name.
    pub fn named(&mut self, name: &str) -> LyricResult<StreamLabel> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(LyricError::graph(format!("invalid link name '{name}'")));
        }
        if !self.reserved.insert(name.to_owned()) {
            return Err(LyricError::graph(format!("link '{name}' is already allocated")));
        }
        Ok(StreamLabel::Link(name.to_owned()))
    }

    pub fn push(&mut self, node: FilterNode) -> LyricResult<()> {
        if node.filters.is_empty() {
            return Err(LyricError::graph("filter node has no filters"));
        }
        if node.outputs.is_empty() {
            return Err(LyricError::graph("filter node has no outputs"));
        }

        let mut seen_inputs = HashSet::new();
        for input in &node.inputs {
            let StreamLabel::Link(name) = input else {
                continue;
            };
            if !self.produced.contains(name) {
                return Err(LyricError::graph(format!(
                    "link '{name}' is consumed before it is produced"
                )));
            }
            if self.consumed.contains(name) || !seen_inputs.insert(name) {
                return Err(LyricError::graph(format!(
                    "link '{name}' is consumed more than once"
                )));
            }
        }

        let mut seen_outputs = HashSet::new();
        for output in &node.outputs {
            let StreamLabel::Link(name) = output else {
                return Err(LyricError::graph(format!(
                    "input stream '{output}' cannot be a node output"
                )));
            };
            if !self.reserved.contains(name) {
                return Err(LyricError::graph(format!(
                    "link '{name}' was not allocated by this graph"
                )));
            }
            if self.produced.contains(name) || !seen_outputs.insert(name) {
                return Err(LyricError::graph(format!(
                    "link '{name}' is produced more than once"
                )));
            }
        }

        for input in &node.inputs {
            if let StreamLabel::Link(name) = input {
                self.consumed.insert(name.clone());
            }
        }
        for output in &node.outputs {
            if let StreamLabel::Link(name) = output {
                self.produced.insert(name.clone());
            }
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Push a single-input, single-output node and return its freshly allocated output.
    pub fn chain(
        &mut self,
        input: StreamLabel,
        filters: Vec<Filter>,
        hint: &str,
    ) -> LyricResult<StreamLabel> {
        let output = self.fresh(hint);
        self.push(FilterNode::new(vec![input], filters, vec![output.clone()]))?;
        Ok(output)
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Seal the graph with `output` as the stream handed to the encoder.
    ///
    /// Every other produced link must already be consumed; the renderer would otherwise route
    /// dangling outputs into the output file on its own.
    pub fn finish(self, output: StreamLabel) -> LyricResult<CompiledGraph> {
        let StreamLabel::Link(out_name) = &output else {
            return Err(LyricError::graph("graph output must be an internal link"));
        };
        if !self.produced.contains(out_name) {
            return Err(LyricError::graph(format!(
                "graph output '{out_name}' is never produced"
            )));
        }
        if self.consumed.contains(out_name) {
            return Err(LyricError::graph(format!(
                "graph output '{out_name}' is already consumed inside the graph"
            )));
        }

        let mut dangling: Vec<&String> = self
            .produced
            .iter()
            .filter(|name| *name != out_name && !self.consumed.contains(*name))
            .collect();
        if !dangling.is_empty() {
            dangling.sort();
            return Err(LyricError::graph(format!(
                "links produced but never consumed: {dangling:?}"
            )));
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            output,
        })
    }
}

/// A sealed graph plus the link that gets mapped to the output file.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledGraph {
    nodes: Vec<FilterNode>,
    output: StreamLabel,
}

impl CompiledGraph {
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn output(&self) -> &StreamLabel {
        &self.output
    }

    /// The node producing `label`, if any.
    pub fn producer_of(&self, label: &StreamLabel) -> Option<&FilterNode> {
        self.nodes.iter().find(|n| n.outputs.contains(label))
    }

    /// Text for `-filter_complex`.
    pub fn filter_complex(&self) -> String {
        self.to_string()
    }

    /// Argument for `-map`.
    pub fn map_arg(&self) -> String {
        format!("[{}]", self.output)
    }
}

impl Display for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vol(g: f64) -> Vec<Filter> {
        vec![Filter::Volume(g)]
    }

    #[test]
    fn fresh_labels_are_unique_and_skip_reserved_names() {
        let mut g = FilterGraph::new();
        g.named("seg0").unwrap();
        let a = g.fresh("seg");
        let b = g.fresh("seg");
        assert_eq!(a, StreamLabel::Link("seg1".to_owned()));
        assert_eq!(b, StreamLabel::Link("seg2".to_owned()));
    }

    #[test]
    fn each_hint_counts_on_its_own() {
        let mut g = FilterGraph::new();
        let labels: Vec<String> = ["back", "orig", "seg", "back", "seg"]
            .into_iter()
            .map(|hint| g.fresh(hint).to_string())
            .collect();
        assert_eq!(labels, ["back0", "orig0", "seg0", "back1", "seg1"]);
    }

    #[test]
    fn named_rejects_duplicates_and_bad_names() {
        let mut g = FilterGraph::new();
        g.named("out").unwrap();
        assert!(matches!(g.named("out"), Err(LyricError::Graph(_))));
        assert!(matches!(g.named("a b"), Err(LyricError::Graph(_))));
        assert!(matches!(g.named(""), Err(LyricError::Graph(_))));
    }

    #[test]
    fn chain_serializes_in_order() {
        let mut g = FilterGraph::new();
        let a = g
            .chain(FilterGraph::input(0, MediaKind::Audio), vol(0.5), "a")
            .unwrap();
        let b = g.chain(a, vol(2.0), "a").unwrap();
        let compiled = g.finish(b).unwrap();
        assert_eq!(
            compiled.filter_complex(),
            "[0:a]volume=0.500[a0];[a0]volume=2.000[a1]"
        );
        assert_eq!(compiled.map_arg(), "[a1]");
    }

    #[test]
    fn consuming_unproduced_link_fails() {
        let mut g = FilterGraph::new();
        let ghost = g.fresh("x");
        let out = g.fresh("y");
        let err = g
            .push(FilterNode::new(vec![ghost], vol(1.0), vec![out]))
            .unwrap_err();
        assert!(err.to_string().contains("before it is produced"));
    }

    #[test]
    fn consuming_a_link_twice_fails() {
        let mut g = FilterGraph::new();
        let a = g
            .chain(FilterGraph::input(0, MediaKind::Audio), vol(1.0), "a")
            .unwrap();
        g.chain(a.clone(), vol(1.0), "b").unwrap();
        assert!(g.chain(a, vol(1.0), "c").is_err());
    }

    #[test]
    fn inputs_may_be_read_repeatedly() {
        let mut g = FilterGraph::new();
        let src = FilterGraph::input(1, MediaKind::Audio);
        let a = g.chain(src.clone(), vol(1.0), "a").unwrap();
        let b = g.chain(src, vol(1.0), "b").unwrap();
        let out = g.named("out").unwrap();
        g.push(FilterNode::new(
            vec![a, b],
            vec![Filter::AMix { inputs: 2 }],
            vec![out.clone()],
        ))
        .unwrap();
        let compiled = g.finish(out).unwrap();
        assert_eq!(compiled.nodes().len(), 3);
    }

    #[test]
    fn producing_into_input_or_foreign_link_fails() {
        let mut g = FilterGraph::new();
        let src = FilterGraph::input(0, MediaKind::Video);
        assert!(
            g.push(FilterNode::new(vec![], vol(1.0), vec![src]))
                .is_err()
        );
        let foreign = StreamLabel::Link("nobody".to_owned());
        assert!(
            g.push(FilterNode::new(vec![], vol(1.0), vec![foreign]))
                .is_err()
        );
    }

    #[test]
    fn finish_rejects_dangling_links() {
        let mut g = FilterGraph::new();
        let src = FilterGraph::input(0, MediaKind::Audio);
        let _unused = g.chain(src.clone(), vol(1.0), "a").unwrap();
        let out = g.chain(src, vol(1.0), "b").unwrap();
        let err = g.finish(out).unwrap_err();
        assert!(err.to_string().contains("never consumed"));
    }

    #[test]
    fn finish_rejects_consumed_output() {
        let mut g = FilterGraph::new();
        let a = g
            .chain(FilterGraph::input(0, MediaKind::Audio), vol(1.0), "a")
            .unwrap();
        let _b = g.chain(a.clone(), vol(1.0), "b").unwrap();
        assert!(g.finish(a).is_err());
    }

    #[test]
    fn multi_output_node_serializes_every_output() {
        let mut g = FilterGraph::new();
        let left = g.fresh("icon");
        let right = g.fresh("icon");
        g.push(FilterNode::new(
            vec![FilterGraph::input(1, MediaKind::Video)],
            vec![
                Filter::Scale {
                    width: 36,
                    height: 36,
                },
                Filter::Split(2),
            ],
            vec![left.clone(), right.clone()],
        ))
        .unwrap();
        let node = &g.nodes()[0];
        assert_eq!(
            node.to_string(),
            "[1:v]scale=36:36,split=2[icon0][icon1]"
        );
    }
}
