use std::path::PathBuf;
use std::process::Command;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_lyric-clip")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "lyric-clip.exe"
            } else {
                "lyric-clip"
            });
            p
        })
}

fn lyrics_file(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, "[00:01.00]first\n[00:02.50]second\n[00:04.00]third\n").unwrap();
    path
}

#[test]
fn cli_lines_lists_numbered_timeline() {
    let lyrics = lyrics_file("lines.lrc");
    let out = Command::new(exe())
        .arg("lines")
        .arg("--lyrics")
        .arg(&lyrics)
        .output()
        .unwrap();

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains("1.000 ->    2.500  first"));
    assert!(rows[2].trim_start().starts_with("3 "));
    assert!(rows[2].ends_with("third"));
}

#[test]
fn cli_graph_prints_both_graphs() {
    let lyrics = lyrics_file("graph.lrc");
    let out = Command::new(exe())
        .args(["graph", "--lines", "1 3", "--commands", "--lyrics"])
        .arg(&lyrics)
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("concat=n=3:v=0:a=1[out]"));
    assert!(stdout.contains("[1:v]scale=36:36,split=2"));
    assert!(stdout.contains("# commands"));
    assert!(stdout.contains("-shortest"));
}

#[test]
fn cli_graph_rejects_out_of_range_lines() {
    let lyrics = lyrics_file("range.lrc");
    let out = Command::new(exe())
        .args(["graph", "--lines", "2 9", "--lyrics"])
        .arg(&lyrics)
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid selection"));
}
