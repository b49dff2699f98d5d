// Write followed by End leaves the file holding exactly the buffer's lines.

use std::fs;

use n_editor::command::Flow;
use n_editor::options::Options;
use n_editor::session::Session;
use n_term::terminal::Console;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn open(dir: &TempDir, name: &str, keys: &[u8]) -> Session<std::io::Cursor<Vec<u8>>, Vec<u8>> {
    Session::open(
        dir.path().join(name),
        Options::default(),
        Console::scripted(keys.to_vec()),
        Vec::new(),
    )
    .unwrap()
}

#[test]
fn write_then_end_reproduces_buffer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poem.txt");
    fs::write(&path, "uno\ndue\ntre\nquattro\ncinque\n").unwrap();

    let mut session = open(&dir, "poem.txt", b"");
    assert_eq!(session.execute(b"2,3d").unwrap(), Flow::Continue);
    assert_eq!(session.execute(b"1,1,#c").unwrap(), Flow::Continue);
    let expected: Vec<Vec<u8>> = session.buffer().lines().to_vec();

    assert_eq!(session.execute(b"2w").unwrap(), Flow::Continue);
    assert_eq!(session.execute(b"e").unwrap(), Flow::Quit);

    let on_disk = fs::read(&path).unwrap();
    let records: Vec<Vec<u8>> = on_disk
        .split(|&b| b == b'\n')
        .map(<[u8]>::to_vec)
        .collect();
    let (last, records) = records.split_last().unwrap();
    assert!(last.is_empty(), "file ends with a newline");
    assert_eq!(records, expected.as_slice());
    assert!(!dir.path().join("poem.txt~").exists());
}

#[test]
fn new_file_round_trip() {
    let dir = TempDir::new().unwrap();

    let mut session = open(&dir, "fresh.txt", b"first\rsecond\r\x1a\r");
    assert_eq!(session.output().as_slice(), b"New file\n");
    session.execute(b"i").unwrap();
    assert_eq!(session.execute(b"e").unwrap(), Flow::Quit);

    assert_eq!(fs::read(dir.path().join("fresh.txt")).unwrap(), b"first\nsecond\n");
}

#[test]
fn quit_after_write_leaves_original() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.txt");
    fs::write(&path, "a\nb\n").unwrap();

    let mut session = open(&dir, "keep.txt", b"y");
    session.execute(b"1w").unwrap();
    assert!(dir.path().join("keep.txt~").exists());
    assert_eq!(session.execute(b"q").unwrap(), Flow::Quit);

    assert_eq!(fs::read(&path).unwrap(), b"a\nb\n");
    assert!(!dir.path().join("keep.txt~").exists());
}

#[test]
fn reopening_clears_stale_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.txt");
    fs::write(&path, "x\n").unwrap();

    let mut first = open(&dir, "doc.txt", b"");
    first.execute(b"1w").unwrap();
    drop(first);

    // An abandoned session leaves its backup behind.
    assert!(dir.path().join("doc.txt~").exists());
    let mut second = open(&dir, "doc.txt", b"");
    assert!(!dir.path().join("doc.txt~").exists());
    assert_eq!(second.buffer().len(), 1);
    assert_eq!(second.execute(b"e").unwrap(), Flow::Quit);
    assert_eq!(fs::read(&path).unwrap(), b"x\n");
}
