//! # Media Library
//!
//! Lists playable files in a directory in the order a person would expect:
//! `clip2` before `clip10`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, PlayerResult};

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn runs(s: &str) -> impl Iterator<Item = Run<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some(if digit { Run::Number(run) } else { Run::Text(run) })
    })
}

fn cmp_numbers(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // "007" after "7"
        .then_with(|| a.len().cmp(&b.len()))
}

/// Natural ordering: digit runs compare by value, text runs lexicographically,
/// and a number sorts before text.
///
/// Time complexity: O(n) in the shorter name.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = runs(a);
    let mut right = runs(b);
    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Run::Number(x)), Some(Run::Number(y))) => cmp_numbers(x, y),
            (Some(Run::Text(x)), Some(Run::Text(y))) => x.cmp(y),
            (Some(Run::Number(_)), Some(Run::Text(_))) => Ordering::Less,
            (Some(Run::Text(_)), Some(Run::Number(_))) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Regular files in `dir` with one of `extensions` (case-insensitive, no dot),
/// naturally sorted by file name.
pub fn list_media<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> PlayerResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| PlayerError::io(format!("list {}", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PlayerError::io(format!("list {}", dir.display()), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|wanted| wanted.as_ref().eq_ignore_ascii_case(ext))
            });
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    log::debug!("{} media files in {}", files.len(), dir.display());
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_natural_cmp_numbers() {
        assert_eq!(natural_cmp("clip2", "clip10"), Ordering::Less);
        assert_eq!(natural_cmp("clip10", "clip9"), Ordering::Greater);
        assert_eq!(natural_cmp("a1b2", "a1b2"), Ordering::Equal);
        assert_eq!(natural_cmp("7", "007"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_number_before_text() {
        assert_eq!(natural_cmp("1abc", "abc"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
        assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_natural_cmp_long_numbers() {
        let big = "99999999999999999999999";
        assert_eq!(natural_cmp(big, "1"), Ordering::Greater);
    }

    #[test]
    fn test_list_media_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["ep10.avi", "ep2.AVI", "ep1.mjpeg", "notes.txt", "ep3.wav"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("sub.avi")).unwrap();

        let files = list_media(dir.path(), &["avi", "mjpeg"]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["ep1.mjpeg", "ep2.AVI", "ep10.avi"]);
    }

    #[test]
    fn test_list_media_missing_dir() {
        let err = list_media(Path::new("/definitely/not/here"), &["avi"]).unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
