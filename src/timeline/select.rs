use crate::foundation::error::{LyricError, LyricResult};
use crate::timeline::parse::TimedLine;
use crate::timeline::timing::ClipTiming;

/// Inclusive, 1-based line numbers as an operator would type them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parse `"5 12"` (or `"5-12"`) into a [`LineRange`].
///
/// Only the shape is checked here; bounds are checked against a timeline by [`Selection::new`].
pub fn parse_line_range(input: &str) -> LyricResult<LineRange> {
    let parts: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    let [start, end] = parts.as_slice() else {
        return Err(LyricError::invalid_selection(format!(
            "expected two line numbers, got '{}'",
            input.trim()
        )));
    };
    let parse = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| LyricError::invalid_selection(format!("'{s}' is not a line number")))
    };
    Ok(LineRange::new(parse(start)?, parse(end)?))
}

/// The contiguous run of lines chosen for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    lines: Vec<TimedLine>,
    first_number: usize,
    timing: ClipTiming,
}

impl Selection {
    pub fn new(timeline: &[TimedLine], range: LineRange) -> LyricResult<Self> {
        if timeline.is_empty() {
            return Err(LyricError::invalid_selection("timeline has no lines"));
        }
        if range.start < 1 || range.start > range.end || range.end > timeline.len() {
            return Err(LyricError::invalid_selection(format!(
                "range {range} must satisfy 1 <= start <= end <= {}",
                timeline.len()
            )));
        }

        let lines = timeline[range.start - 1..range.end].to_vec();
        // Both graphs trim `start..end`; an out-of-order timestamp would invert the cut.
        for (number, line) in (range.start..).zip(&lines) {
            if line.end <= line.start {
                return Err(LyricError::invalid_selection(format!(
                    "line {number} ends at {:.3}s, not after its start at {:.3}s \
                     (timestamps out of order?)",
                    line.end, line.start
                )));
            }
        }
        let timing = ClipTiming::for_lines(&lines)?;
        Ok(Self {
            lines,
            first_number: range.start,
            timing,
        })
    }

    pub fn lines(&self) -> &[TimedLine] {
        &self.lines
    }

    /// The opening line. A selection always has one.
    pub fn first(&self) -> &TimedLine {
        &self.lines[0]
    }

    /// Every line after the opening one, in selection order.
    pub fn rest(&self) -> &[TimedLine] {
        &self.lines[1..]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 1-based timeline number of the opening line.
    pub fn first_number(&self) -> usize {
        self.first_number
    }

    pub fn timing(&self) -> ClipTiming {
        self.timing
    }
}
