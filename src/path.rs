//! Relinkable paths and their normalized form.
//! - PathKind distinguishes files from directories (affects prefix replacement).
//! - RelinkablePath::normalize_path produces the canonical string used as an identity.
//!
//! Notes:
//! - Normalization is purely lexical; the filesystem is never consulted.
//! - A leading "//" is preserved because it denotes a network path.

use std::fmt;

/// What a tracked path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    File,
    Directory,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathKind::File => "file",
            PathKind::Directory => "dir",
        })
    }
}

/// A path together with its kind, as handed to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelinkablePath {
    normalized: String,
    kind: PathKind,
}

impl RelinkablePath {
    pub fn new(path: &str, kind: PathKind) -> Self {
        Self {
            normalized: Self::normalize_path(path),
            kind,
        }
    }

    pub fn normalized_path(&self) -> &str {
        &self.normalized
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    /// Lexically normalize `path` so that logically-equal paths compare equal.
    ///
    /// Backslashes become forward slashes, repeated separators collapse, `.`
    /// segments vanish and `..` pops the previous segment when there is one.
    /// A trailing separator is dropped unless the result is the root itself.
    pub fn normalize_path(path: &str) -> String {
        let unified = path.replace('\\', "/");

        let (lead, rest) = if let Some(r) = unified.strip_prefix("//") {
            ("//", r)
        } else if let Some(r) = unified.strip_prefix('/') {
            ("/", r)
        } else {
            ("", unified.as_str())
        };

        let mut segments: Vec<&str> = Vec::new();
        for seg in rest.split('/') {
            match seg {
                "" | "." => {}
                ".." => match segments.last().copied() {
                    Some(last) if last != ".." => {
                        segments.pop();
                    }
                    // Nothing left to pop: an absolute path stays at its root,
                    // a relative one keeps the "..".
                    _ if lead.is_empty() => segments.push(".."),
                    _ => {}
                },
                other => segments.push(other),
            }
        }

        let mut out = String::with_capacity(unified.len());
        out.push_str(lead);
        out.push_str(&segments.join("/"));
        out
    }
}

impl fmt::Display for RelinkablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Append a '/' unless `s` already ends with one.
pub(crate) fn ensure_ends_with_slash(s: &mut String) {
    if !s.ends_with('/') {
        s.push('/');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_become_slashes() {
        assert_eq!(RelinkablePath::normalize_path(r"C:\docs\a.txt"), "C:/docs/a.txt");
    }

    #[test]
    fn collapses_dots_and_duplicate_separators() {
        assert_eq!(RelinkablePath::normalize_path("/docs//./sub/../a.txt"), "/docs/a.txt");
        assert_eq!(RelinkablePath::normalize_path("/docs/sub/"), "/docs/sub");
    }

    #[test]
    fn keeps_network_prefix_and_root() {
        assert_eq!(RelinkablePath::normalize_path("//server/share/x"), "//server/share/x");
        assert_eq!(RelinkablePath::normalize_path("/"), "/");
        assert_eq!(RelinkablePath::normalize_path("/.."), "/");
    }

    #[test]
    fn relative_parent_segments_survive() {
        assert_eq!(RelinkablePath::normalize_path("../a/../../b"), "../../b");
    }

    #[test]
    fn ensure_slash_is_idempotent() {
        let mut s = String::from("/docs");
        ensure_ends_with_slash(&mut s);
        ensure_ends_with_slash(&mut s);
        assert_eq!(s, "/docs/");
    }
}
