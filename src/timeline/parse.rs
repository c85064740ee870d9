use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::error::{LyricError, LyricResult};
use crate::timeline::timing::infer_end_times;

static LRC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+):(\d+\.\d+)\](.*)").expect("LRC timestamp pattern is a valid regex")
});

/// One lyric line on the absolute timeline, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TimedLine {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Parse LRC source text into timed lines.
///
/// Only `[mm:ss.ff]text` entries are kept; metadata tags, blank lines and malformed stamps are
/// dropped without error. End times are inferred once all lines are known.
pub fn parse_timeline(source: &str) -> Vec<TimedLine> {
    let mut lines = Vec::new();
    for raw in source.lines() {
        let Some(caps) = LRC_LINE.captures(raw) else {
            continue;
        };
        let Ok(minutes) = caps[1].parse::<u64>() else {
            continue;
        };
        let Ok(seconds) = caps[2].parse::<f64>() else {
            continue;
        };
        lines.push(TimedLine {
            start: minutes as f64 * 60.0 + seconds,
            end: 0.0,
            text: caps[3].trim().to_owned(),
        });
    }

    infer_end_times(&mut lines);
    lines
}

/// Read and parse an LRC file. Non-UTF-8 bytes are replaced rather than rejected.
pub fn read_timeline(path: &Path) -> LyricResult<Vec<TimedLine>> {
    let bytes = std::fs::read(path).map_err(|e| LyricError::source_unavailable(path, e))?;
    let lines = parse_timeline(&String::from_utf8_lossy(&bytes));
    tracing::debug!(path = %path.display(), lines = lines.len(), "parsed lyric timeline");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_fraction_are_combined() {
        let lines = parse_timeline("[01:02.50]hello");
        assert_eq!(lines.len(), 1);
        assert!((lines[0].start - 62.5).abs() < 1e-9);
        assert_eq!(lines[0].text, "hello");
    }

    #[test]
    fn ends_chain_to_next_start_and_last_line_holds_five_seconds() {
        let lines = parse_timeline("[00:00.00]a\n[00:03.00]b\n[00:07.00]c\n");
        let ends: Vec<f64> = lines.iter().map(|l| l.end).collect();
        assert_eq!(ends, vec![3.0, 7.0, 12.0]);
    }

    #[test]
    fn non_matching_lines_are_skipped() {
        let src = "[ti:Some Song]\n[ar:Someone]\n\n[00:01]no fraction\nplain text\n[00:05.10]  kept  \n";
        let lines = parse_timeline(src);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "kept");
        assert!((lines[0].end - 10.1).abs() < 1e-9);
    }

    #[test]
    fn empty_text_is_allowed() {
        let lines = parse_timeline("[00:01.00]\n[00:02.00]x");
        assert_eq!(lines[0].text, "");
        assert_eq!(lines[0].end, 2.0);
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let lines = parse_timeline("\u{feff}[00:01.00]first\r\n[00:02.00]second\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn no_matches_is_empty_not_error() {
        assert!(parse_timeline("nothing here\n[by:nobody]").is_empty());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = read_timeline(Path::new("target/does-not-exist/none.lrc")).unwrap_err();
        assert!(matches!(err, LyricError::SourceUnavailable { .. }));
    }
}
