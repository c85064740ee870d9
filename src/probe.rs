use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::foundation::error::{LyricError, LyricResult};

/// Title shown when the original track carries no usable title tag.
pub const TITLE_PLACEHOLDER: &str = "《Unknown》";

/// Artist/title tags of a media file. Missing tags are empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaTags {
    pub artist: String,
    pub title: String,
}

/// `《artist - title》`, `《title》`, or [`TITLE_PLACEHOLDER`].
pub fn format_title(tags: &MediaTags) -> String {
    match (tags.artist.is_empty(), tags.title.is_empty()) {
        (false, false) => format!("《{} - {}》", tags.artist, tags.title),
        (true, false) => format!("《{}》", tags.title),
        _ => TITLE_PLACEHOLDER.to_owned(),
    }
}

pub trait MetadataProbe {
    fn probe_tags(&self, path: &Path) -> LyricResult<MediaTags>;
}

/// Reads container tags with the system `ffprobe`.
#[derive(Clone, Debug)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MetadataProbe for FfprobeProbe {
    fn probe_tags(&self, path: &Path) -> LyricResult<MediaTags> {
        let out = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_entries",
                "format_tags",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| LyricError::metadata(format!("failed to run {}: {e}", self.program)))?;
        if !out.status.success() {
            return Err(LyricError::metadata(format!(
                "{} failed for '{}': {}",
                self.program,
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_probe_json(&out.stdout)
    }
}

fn parse_probe_json(bytes: &[u8]) -> LyricResult<MediaTags> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        #[serde(default)]
        tags: BTreeMap<String, String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| LyricError::metadata(format!("ffprobe json parse failed: {e}")))?;
    let tags = parsed.format.map(|f| f.tags).unwrap_or_default();

    // Tag key case differs between containers (ID3 `artist`, Vorbis `ARTIST`).
    let lookup = |key: &str| {
        tags.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_owned())
            .unwrap_or_default()
    };
    Ok(MediaTags {
        artist: lookup("artist"),
        title: lookup("title"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(artist: &str, title: &str) -> MediaTags {
        MediaTags {
            artist: artist.to_owned(),
            title: title.to_owned(),
        }
    }

    #[test]
    fn title_formatting_policy() {
        assert_eq!(format_title(&tags("X", "Y")), "《X - Y》");
        assert_eq!(format_title(&tags("", "Y")), "《Y》");
        assert_eq!(format_title(&tags("X", "")), TITLE_PLACEHOLDER);
        assert_eq!(format_title(&tags("", "")), TITLE_PLACEHOLDER);
    }

    #[test]
    fn probe_json_reads_tags_case_insensitively() {
        let json = br#"{"programs":[],"streams":[],"format":{"tags":{"ARTIST":" X ","Title":"Y","album":"Z"}}}"#;
        assert_eq!(parse_probe_json(json).unwrap(), tags("X", "Y"));
    }

    #[test]
    fn probe_json_without_tags_is_empty() {
        assert_eq!(parse_probe_json(br#"{"format":{}}"#).unwrap(), tags("", ""));
        assert_eq!(parse_probe_json(br#"{}"#).unwrap(), tags("", ""));
    }

    #[test]
    fn probe_json_garbage_is_metadata_unavailable() {
        assert!(matches!(
            parse_probe_json(b"not json"),
            Err(LyricError::MetadataUnavailable(_))
        ));
    }

    #[test]
    fn missing_program_is_metadata_unavailable() {
        let probe = FfprobeProbe::new("lyric-clip-no-such-ffprobe");
        assert!(matches!(
            probe.probe_tags(Path::new("a.mp3")),
            Err(LyricError::MetadataUnavailable(_))
        ));
    }
}
