//! Deterministic directory listings.
//!
//! File systems return entries in arbitrary order, so every level of a tile
//! tree is sorted by name with embedded digit runs compared numerically
//! (`block_2` < `block_10`). Hidden entries (leading `.`) are skipped.
use crate::error::Result;
use log::{debug, warn};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Compare two names treating runs of ASCII digits as numbers.
///
/// Equal numeric values with different zero padding fall back to a plain
/// byte comparison so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ai, mut bi) = (a.as_bytes(), b.as_bytes());
    loop {
        match (ai.first(), bi.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (da, ra) = split_digits(ai);
                let (db, rb) = split_digits(bi);
                let ord = cmp_digit_runs(da, db);
                if ord != Ordering::Equal {
                    return ord;
                }
                ai = ra;
                bi = rb;
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(cb);
                }
                ai = &ai[1..];
                bi = &bi[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let a = &a[strip(a)..];
    let b = &b[strip(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn sorted_entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            debug!("skipping hidden entry {}", entry.path().display());
            continue;
        }
        let is_dir = entry.file_type()?.is_dir();
        if is_dir == want_dirs {
            entries.push(entry.path());
        } else {
            warn!(
                "skipping unexpected {} {}",
                if is_dir { "directory" } else { "file" },
                entry.path().display()
            );
        }
    }
    entries.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    Ok(entries)
}

/// Sub-directories of `dir` in natural order.
pub fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    sorted_entries(dir, true)
}

/// Regular files of `dir` in natural order.
pub fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    sorted_entries(dir, false)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_runs_compare_numerically() {
        let mut names = vec!["b_10", "b_2", "b_1", "a_30", "b_02"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a_30", "b_1", "b_02", "b_2", "b_10"]);
    }

    #[test]
    fn prefix_orders_first() {
        assert_eq!(natural_cmp("000000", "000000_000000"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }

    #[test]
    fn listing_separates_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("20")).unwrap();
        fs::create_dir(dir.path().join("3")).unwrap();
        fs::write(dir.path().join("note.txt"), b"x").unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();

        let dirs = sorted_dirs(dir.path()).unwrap();
        let names: Vec<String> = dirs.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["3", "20"]);

        let files = sorted_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(file_name(&files[0]), "note.txt");
    }
}
