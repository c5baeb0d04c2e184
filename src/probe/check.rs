//! The single I/O capability the probe worker depends on.

use std::path::Path;

/// Answers whether a path currently exists. Called from the worker thread.
pub trait ExistenceCheck: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Checks the real filesystem. Errors such as permission denied count as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsExistenceCheck;

impl ExistenceCheck for FsExistenceCheck {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).try_exists().unwrap_or(false)
    }
}

impl<F> ExistenceCheck for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, path: &str) -> bool {
        self(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn fs_check_sees_files_and_dirs() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.touch().unwrap();
        let dir = temp.child("sub");
        dir.create_dir_all().unwrap();

        let check = FsExistenceCheck;
        assert!(check.exists(&file.path().to_string_lossy()));
        assert!(check.exists(&dir.path().to_string_lossy()));
        assert!(!check.exists(&temp.child("nope").path().to_string_lossy()));
    }

    #[test]
    fn closures_are_checks() {
        let check = |p: &str| p == "/yes";
        assert!(ExistenceCheck::exists(&check, "/yes"));
        assert!(!ExistenceCheck::exists(&check, "/no"));
    }
}
