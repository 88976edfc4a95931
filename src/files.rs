//! Substring search over log directories.

use anyhow::{ensure, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Lines of `reader` containing `search`, with line endings stripped.
/// Invalid UTF-8 is decoded lossily.
pub fn grep_lines<R: BufRead>(mut reader: R, search: &str) -> std::io::Result<Vec<String>> {
    let mut matching = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.contains(search) {
            matching.push(line.to_string());
        }
    }

    Ok(matching)
}

/// Recursively searches `dir` for files containing `search`. Symlinks are not
/// followed; files without a match are left out of the result.
pub fn grep_dir(dir: &Path, search: &str) -> Result<BTreeMap<PathBuf, Vec<String>>> {
    let mut results = BTreeMap::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory: {}", current.display()))?;

        for entry in entries {
            let path = entry?.path();
            let file_type = fs::symlink_metadata(&path)
                .with_context(|| format!("Failed to stat: {}", path.display()))?
                .file_type();

            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            let file = fs::File::open(&path)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            let lines = grep_lines(BufReader::new(file), search)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            if !lines.is_empty() {
                results.insert(path, lines);
            }
        }
    }

    Ok(results)
}

pub fn assert_file_in_dir_contains(dir: &Path, search: &str) -> Result<()> {
    let results = grep_dir(dir, search)?;
    ensure!(
        !results.is_empty(),
        "{} should have a file containing '{search}' but no file was found",
        dir.display()
    );
    Ok(())
}

pub fn assert_no_files_in_dir_contain(dir: &Path, search: &str) -> Result<()> {
    let results = grep_dir(dir, search)?;
    ensure!(
        results.is_empty(),
        "{} should not have any file containing '{search}' but found: {:?}",
        dir.display(),
        results.keys().collect::<Vec<_>>()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_grep_lines() {
        let input = "I1017 session expired\nW1017 slow rpc\r\nI1017 session expired again";
        let lines = grep_lines(Cursor::new(input), "expired").unwrap();
        assert_eq!(
            lines,
            vec!["I1017 session expired", "I1017 session expired again"]
        );
    }

    #[test]
    fn test_grep_lines_lossy() {
        let input: &[u8] = b"bad \xff byte MARK\nclean line\n";
        let lines = grep_lines(Cursor::new(input), "MARK").unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("MARK"));
    }

    #[test]
    fn test_grep_dir_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("impalad");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("catalogd.INFO"), "event id 42 processed\n").unwrap();
        fs::write(nested.join("impalad.INFO"), "Expiring session\nother\n").unwrap();
        fs::write(nested.join("impalad.WARNING"), "nothing here\n").unwrap();

        let results = grep_dir(dir.path(), "Expiring").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results.get(&nested.join("impalad.INFO")).unwrap(),
            &vec!["Expiring session".to_string()]
        );

        assert!(assert_file_in_dir_contains(dir.path(), "event id").is_ok());
        assert!(assert_file_in_dir_contains(dir.path(), "stack trace").is_err());
        assert!(assert_no_files_in_dir_contain(dir.path(), "stack trace").is_ok());
        assert!(assert_no_files_in_dir_contain(dir.path(), "session").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_grep_dir_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("elsewhere.log");
        fs::write(&target, "secret marker\n").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link.log")).unwrap();

        assert!(grep_dir(dir.path(), "marker").unwrap().is_empty());
    }

    #[test]
    fn test_grep_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(grep_dir(&dir.path().join("absent"), "x").is_err());
    }
}
