//! Discovers text files to ingest.
//!
//! Directory traversal respects `.gitignore` and `.docvecignore` files and
//! skips hidden entries. Explicit file arguments are taken as given, whatever
//! their extension.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Custom ignore file honored alongside `.gitignore`.
pub const IGNORE_FILE_NAME: &str = ".docvecignore";

/// Walks directories to find files with accepted extensions
#[derive(Debug, Clone)]
pub struct FileWalker {
    extensions: Vec<String>,
}

impl FileWalker {
    /// Create a walker accepting the given extensions (without the dot,
    /// case-insensitive)
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|accepted| *accepted == ext)
            })
    }

    /// Walk a directory and return an iterator of files to ingest
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false); // Allow gitignore to work outside git repositories
        builder.add_custom_ignore_filename(IGNORE_FILE_NAME);

        builder
            .build()
            .filter_map(Result::ok) // Skip entries we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(move |path| self.accepts(path))
    }

    /// Expands `paths` into a sorted, de-duplicated file list.
    ///
    /// Directories are walked; files are kept as-is. Paths that do not exist
    /// are returned separately so the caller can report them.
    pub fn collect(&self, paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut missing = Vec::new();

        for path in paths {
            if path.is_dir() {
                let mut found: Vec<PathBuf> = self.walk(path).collect();
                found.sort();
                files.extend(found);
            } else if path.is_file() {
                files.push(path.clone());
            } else {
                missing.push(path.clone());
            }
        }

        let mut seen = std::collections::HashSet::new();
        files.retain(|path| seen.insert(path.clone()));
        (files, missing)
    }
}

/// Shorthand for [`FileWalker::collect`].
pub fn collect_files<S: AsRef<str>>(
    paths: &[PathBuf],
    extensions: &[S],
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    FileWalker::new(extensions).collect(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("notes.txt"), "cats are pets").unwrap();
        fs::write(root.join("README.MD"), "# Title").unwrap();
        fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested").join("deep.txt"), "dogs").unwrap();

        let walker = FileWalker::new(&["txt", ".md"]);
        let mut files: Vec<_> = walker.walk(root).collect();
        files.sort();

        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|p| p.ends_with("README.MD")));
        assert!(files.iter().any(|p| p.ends_with("deep.txt")));
        assert!(!files.iter().any(|p| p.ends_with("image.png")));
    }

    #[test]
    fn test_ignore_files_and_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join(".gitignore"), "ignored.txt\n").unwrap();
        fs::write(root.join(IGNORE_FILE_NAME), "drafts/\n").unwrap();
        fs::write(root.join("ignored.txt"), "x").unwrap();
        fs::write(root.join(".hidden.txt"), "x").unwrap();
        fs::create_dir(root.join("drafts")).unwrap();
        fs::write(root.join("drafts").join("draft.txt"), "x").unwrap();
        fs::write(root.join("kept.txt"), "x").unwrap();

        let files: Vec<_> = FileWalker::new(&["txt"]).walk(root).collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("kept.txt"));
    }

    #[test]
    fn test_collect_mixes_files_dirs_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b.log"), "b").unwrap();

        let explicit = root.join("b.log");
        let missing = root.join("nope.txt");
        let (files, not_found) = collect_files(
            &[root.to_path_buf(), explicit.clone(), missing.clone(), root.join("a.txt")],
            &["txt"],
        );

        // Explicit files bypass the extension filter; duplicates collapse
        assert_eq!(files, vec![root.join("a.txt"), explicit]);
        assert_eq!(not_found, vec![missing]);
    }
}
