// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Normalizer Domain Service
//!
//! Lexical POSIX path normalization for mount locations. Mount locations are
//! paths on the *target* machine, so normalization is purely textual: the
//! local filesystem is never consulted and `/` is the only separator,
//! whatever platform the compiler runs on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Canonical form of guest paths embedded in boot scripts

/// Normalize a POSIX path lexically.
///
/// - Repeated separators collapse to one (`/mnt//nfs` → `/mnt/nfs`)
/// - `.` segments are removed
/// - `..` removes the preceding segment; at the root of an absolute path it
///   is dropped, in a relative path with nothing left to remove it is kept
/// - A trailing separator is dropped, except for the root itself
/// - An empty path (or one that reduces to nothing) becomes `.`
///
/// # Examples
/// ```
/// use nfsboot_core::domain::path_normalizer::normalize_posix;
///
/// assert_eq!(normalize_posix("/mnt//nfs/"), "/mnt/nfs");
/// assert_eq!(normalize_posix("/mnt/./a/../nfs"), "/mnt/nfs");
/// assert_eq!(normalize_posix("/"), "/");
/// ```
pub fn normalize_posix(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            part => segments.push(part),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_redundant_separators() {
        assert_eq!(normalize_posix("/mnt//nfs/"), "/mnt/nfs");
        assert_eq!(normalize_posix("//mnt///nfs"), "/mnt/nfs");
    }

    #[test]
    fn test_already_normal_path_is_unchanged() {
        assert_eq!(normalize_posix("/mnt/nfs"), "/mnt/nfs");
    }

    #[test]
    fn test_current_dir_segments_removed() {
        assert_eq!(normalize_posix("/mnt/./nfs/."), "/mnt/nfs");
    }

    #[test]
    fn test_parent_segments_resolved() {
        assert_eq!(normalize_posix("/mnt/scratch/../nfs"), "/mnt/nfs");
        assert_eq!(normalize_posix("/../mnt"), "/mnt");
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(normalize_posix("mnt//nfs/"), "mnt/nfs");
        assert_eq!(normalize_posix("../mnt"), "../mnt");
        assert_eq!(normalize_posix("a/.."), ".");
        assert_eq!(normalize_posix(""), ".");
    }

    #[test]
    fn test_root_is_preserved() {
        assert_eq!(normalize_posix("/"), "/");
        assert_eq!(normalize_posix("///"), "/");
    }
}
