//! Category file discovery.
//!
//! Every file directly inside the input directory whose name ends in the
//! configured extension is one category; the category is named after the
//! file with the extension removed.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for category scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extension without the dot (e.g. "xlsx").
    pub extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "xlsx".to_string(),
        }
    }
}

impl From<&crate::config::AggregateConfig> for ScanConfig {
    fn from(config: &crate::config::AggregateConfig) -> Self {
        Self {
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }
}

/// One category source file.
#[derive(Debug, Clone)]
pub struct CategoryFile {
    /// Category name (file name without extension).
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

/// Scanner for category files in a single directory.
pub struct CategoryScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl CategoryScanner {
    /// Create a new scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Find all category files, sorted by file name.
    pub fn scan(&self) -> Result<Vec<CategoryFile>> {
        if !self.root.is_dir() {
            bail!("Input directory not found: {}", self.root.display());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to list {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            let Some(name) = self.category_name(&file_name) else {
                debug!("Skipping {}", entry.path().display());
                continue;
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(CategoryFile {
                name,
                path: entry.path().to_path_buf(),
                size,
            });
        }

        debug!("Found {} category files in {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Category name for a file name, or `None` when the extension differs.
    pub fn category_name(&self, file_name: &str) -> Option<String> {
        let suffix = format!(".{}", self.config.extension);
        file_name
            .strip_suffix(&suffix)
            .filter(|stem| !stem.is_empty())
            .map(String::from)
    }

    /// Directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_category_name() {
        let scanner = CategoryScanner::new(PathBuf::from("."), ScanConfig::default());
        assert_eq!(scanner.category_name("亚洲.xlsx"), Some("亚洲".to_string()));
        assert_eq!(scanner.category_name("A.b.xlsx"), Some("A.b".to_string()));
        assert_eq!(scanner.category_name("A.XLSX"), None);
        assert_eq!(scanner.category_name("A.xls"), None);
        assert_eq!(scanner.category_name(".xlsx"), None);
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("a.xlsx"), b"xy").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.xlsx")).unwrap();

        let scanner = CategoryScanner::new(dir.path().to_path_buf(), ScanConfig::default());
        let files = scanner.scan().unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(files[0].size, 2);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let scanner =
            CategoryScanner::new(dir.path().join("missing"), ScanConfig::default());
        assert!(scanner.scan().is_err());
    }
}
