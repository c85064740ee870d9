use crate::foundation::error::{LyricError, LyricResult};
use crate::timeline::parse::TimedLine;

/// How long the final line of a timeline stays current when nothing follows it.
pub const LAST_LINE_HOLD_SEC: f64 = 5.0;

/// Extra time rendered after the last selected line ends.
pub const TAIL_PAD_SEC: f64 = 2.0;

/// Assign `end` to every line: the next line's start, or `start + LAST_LINE_HOLD_SEC` for the last.
pub(crate) fn infer_end_times(lines: &mut [TimedLine]) {
    for i in (0..lines.len()).rev() {
        lines[i].end = match lines.get(i + 1) {
            Some(next) => next.start,
            None => lines[i].start + LAST_LINE_HOLD_SEC,
        };
    }
}

/// Offset and length of the rendered clip on the absolute timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTiming {
    pub offset: f64,
    pub duration: f64,
}

impl ClipTiming {
    pub fn for_lines(lines: &[TimedLine]) -> LyricResult<Self> {
        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return Err(LyricError::EmptySelection);
        };
        let offset = first.start;
        Ok(Self {
            offset,
            duration: last.end - offset + TAIL_PAD_SEC,
        })
    }

    /// Convert an absolute timeline instant into clip-relative render time.
    pub fn relative(&self, absolute: f64) -> f64 {
        absolute - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: f64, text: &str) -> TimedLine {
        TimedLine {
            start,
            end: 0.0,
            text: text.to_owned(),
        }
    }

    #[test]
    fn end_inference_matches_next_start() {
        let mut lines = vec![line(0.0, "a"), line(3.0, "b"), line(7.0, "c")];
        infer_end_times(&mut lines);
        assert_eq!(lines[0].end, 3.0);
        assert_eq!(lines[1].end, 7.0);
        assert_eq!(lines[2].end, 12.0);
    }

    #[test]
    fn timing_of_whole_scenario() {
        let mut lines = vec![line(0.0, "a"), line(3.0, "b"), line(7.0, "c")];
        infer_end_times(&mut lines);
        let timing = ClipTiming::for_lines(&lines).unwrap();
        assert_eq!(timing.offset, 0.0);
        assert_eq!(timing.duration, 14.0);
    }

    #[test]
    fn timing_of_inner_range_pads_tail() {
        let mut lines = vec![line(10.0, "a"), line(12.5, "b"), line(15.0, "c")];
        infer_end_times(&mut lines);
        let timing = ClipTiming::for_lines(&lines[1..2]).unwrap();
        assert_eq!(timing.offset, 12.5);
        assert!((timing.duration - 4.5).abs() < 1e-9);
        assert!((timing.relative(15.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_lines_have_no_timing() {
        assert!(matches!(
            ClipTiming::for_lines(&[]),
            Err(LyricError::EmptySelection)
        ));
    }
}
