//! Original-to-committed path mapping.
//!
//! A Relinker answers "where does this path live now?". Paths without a
//! recorded mapping map to themselves.

use std::collections::HashMap;

use crate::path::RelinkablePath;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relinker {
    mappings: HashMap<String, String>,
}

impl Relinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` now lives at `to`. Last write wins.
    pub fn add_mapping(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.mappings.insert(from.into(), to.into());
    }

    /// Mapped path for `path`, or `path` itself when nothing was recorded.
    pub fn substitution_for<'a>(&'a self, path: &'a str) -> &'a str {
        self.mappings.get(path).map(String::as_str).unwrap_or(path)
    }

    /// Same lookup keyed by the normalized form of `path`.
    pub fn substitution_path_for(&self, path: &RelinkablePath) -> String {
        self.substitution_for(path.normalized_path()).to_string()
    }

    /// Exchange mapping tables with `other` in constant time.
    pub fn swap(&mut self, other: &mut Relinker) {
        std::mem::swap(&mut self.mappings, &mut other.mappings);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathKind;

    #[test]
    fn unknown_path_maps_to_itself() {
        let r = Relinker::new();
        assert_eq!(r.substitution_for("/a/b"), "/a/b");
    }

    #[test]
    fn last_mapping_wins() {
        let mut r = Relinker::new();
        r.add_mapping("/a", "/b");
        r.add_mapping("/a", "/c");
        assert_eq!(r.substitution_for("/a"), "/c");
        assert_eq!(r.len(), 1);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![("/a", "/c")]);
    }

    #[test]
    fn lookup_by_relinkable_path_uses_normalized_form() {
        let mut r = Relinker::new();
        r.add_mapping("/old/x.tif", "/new/x.tif");
        let p = RelinkablePath::new(r"\old\.\x.tif", PathKind::File);
        assert_eq!(r.substitution_path_for(&p), "/new/x.tif");
    }

    #[test]
    fn swap_exchanges_tables() {
        let mut live = Relinker::new();
        live.add_mapping("/stale", "/gone");
        let mut fresh = Relinker::new();
        fresh.add_mapping("/a", "/b");

        live.swap(&mut fresh);
        assert_eq!(live.substitution_for("/a"), "/b");
        assert_eq!(live.substitution_for("/stale"), "/stale");
        assert_eq!(fresh.substitution_for("/stale"), "/gone");
    }
}
