use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::section::Section;

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob {
    path: String,
    basename: String,
    extension: String,
    ancestors: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobPathError {
    #[error("{path} is not under partition root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{0} is absolute; blob paths must be relative to the partition root")]
    Absolute(PathBuf),
    #[error("{0} contains a parent directory component")]
    ParentComponent(PathBuf),
    #[error("{0} is not valid UTF-8")]
    NonUtf8(PathBuf),
    #[error("blob path is empty")]
    Empty,
}

impl Blob {
    pub fn new(relative: impl Into<String>) -> Self {
        let path = relative.into();
        let (parent, basename) = match path.rfind('/') {
            Some(index) => (&path[..index], &path[index + 1..]),
            None => ("", path.as_str()),
        };

        let mut ancestors = Vec::new();
        let mut current = parent;
        while !current.is_empty() {
            ancestors.push(current.to_string());
            current = match current.rfind('/') {
                Some(index) => &current[..index],
                None => "",
            };
        }

        let basename = basename.to_string();
        let extension = extension_of(&basename).to_string();
        Self {
            path,
            basename,
            extension,
            ancestors,
        }
    }

    pub fn from_path(root: &Path, path: &Path) -> Result<Self, BlobPathError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| BlobPathError::OutsideRoot {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            })?;
        Self::from_relative(relative)
    }

    pub fn from_relative(relative: &Path) -> Result<Self, BlobPathError> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| BlobPathError::NonUtf8(relative.to_path_buf()))?;
                    parts.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(BlobPathError::ParentComponent(relative.to_path_buf()))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(BlobPathError::Absolute(relative.to_path_buf()))
                }
            }
        }
        if parts.is_empty() {
            return Err(BlobPathError::Empty);
        }
        Ok(Self::new(parts.join("/")))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn stem(&self) -> &str {
        if self.extension.is_empty() {
            &self.basename
        } else {
            &self.basename[..self.basename.len() - self.extension.len() - 1]
        }
    }

    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn extension_of(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(0) | None => "",
        Some(index) => &basename[index + 1..],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "matched", rename_all = "snake_case")]
pub enum IgnoreRule {
    Binary,
    SharedLibrary,
    Filename,
    Extension,
    Folder(String),
    Path,
    Pattern(String),
}

impl IgnoreRule {
    pub fn label(&self) -> &'static str {
        match self {
            IgnoreRule::Binary => "binary",
            IgnoreRule::SharedLibrary => "shared_library",
            IgnoreRule::Filename => "filename",
            IgnoreRule::Extension => "extension",
            IgnoreRule::Folder(_) => "folder",
            IgnoreRule::Path => "path",
            IgnoreRule::Pattern(_) => "pattern",
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Folder(folder) => write!(f, "folder {folder}"),
            IgnoreRule::Pattern(pattern) => write!(f, "pattern {pattern}"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult<'a> {
    Excluded(IgnoreRule),
    Categorized(&'a Section),
    Uncategorized,
}

impl<'a> ClassificationResult<'a> {
    pub fn section(&self) -> Option<&'a Section> {
        match *self {
            ClassificationResult::Categorized(section) => Some(section),
            _ => None,
        }
    }

    pub fn section_name(&self) -> Option<&'a str> {
        self.section().map(Section::name)
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, ClassificationResult::Excluded(_))
    }
}

impl fmt::Display for ClassificationResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationResult::Excluded(rule) => write!(f, "excluded ({rule})"),
            ClassificationResult::Categorized(section) => write!(f, "section {}", section.name()),
            ClassificationResult::Uncategorized => f.write_str("uncategorized"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationReport {
    pub report_version: String,
    pub generated_at: String,
    pub scan_id: String,
    pub scan: ScanMetadata,
    #[serde(default)]
    pub metrics: ScanMetrics,
    pub sections: Vec<SectionGroup>,
    pub uncategorized: Vec<String>,
    pub excluded: Vec<ExcludedBlob>,
    #[serde(default)]
    pub exclusion_counts: Vec<ExclusionCount>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanMetadata {
    pub root: String,
    pub max_depth: Option<usize>,
    pub excludes: Vec<String>,
    #[serde(default)]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScanMetrics {
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub scanned_files: u64,
    #[serde(default)]
    pub scanned_directories: u64,
    #[serde(default)]
    pub excluded: u64,
    #[serde(default)]
    pub categorized: u64,
    #[serde(default)]
    pub uncategorized: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionGroup {
    pub name: String,
    pub blobs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcludedBlob {
    pub path: String,
    pub rule: IgnoreRule,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExclusionCount {
    pub rule: String,
    pub blobs: u64,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Blob, BlobPathError};

    #[test]
    fn splits_path_into_basename_extension_and_ancestors() {
        let blob = Blob::new("vendor/lib64/hw/audio.primary.so");
        assert_eq!(blob.basename(), "audio.primary.so");
        assert_eq!(blob.extension(), "so");
        assert_eq!(blob.stem(), "audio.primary");
        assert_eq!(
            blob.ancestors(),
            &["vendor/lib64/hw", "vendor/lib64", "vendor"]
        );
    }

    #[test]
    fn root_level_and_dotfiles_have_no_extension_or_ancestors() {
        let blob = Blob::new(".nomedia");
        assert_eq!(blob.extension(), "");
        assert_eq!(blob.stem(), ".nomedia");
        assert!(blob.ancestors().is_empty());

        let bare = Blob::new("bin/foo");
        assert_eq!(bare.extension(), "");
        assert_eq!(bare.ancestors(), &["bin"]);
    }

    #[test]
    fn walker_paths_are_made_relative_and_validated() {
        let blob = Blob::from_path(Path::new("/dump/vendor"), Path::new("/dump/vendor/etc/a.xml"))
            .expect("path under root");
        assert_eq!(blob.path(), "etc/a.xml");

        assert!(matches!(
            Blob::from_path(Path::new("/dump/vendor"), Path::new("/dump/odm/a.xml")),
            Err(BlobPathError::OutsideRoot { .. })
        ));
        assert!(matches!(
            Blob::from_relative(Path::new("etc/../a.xml")),
            Err(BlobPathError::ParentComponent(_))
        ));
        assert!(matches!(
            Blob::from_relative(Path::new("/etc/a.xml")),
            Err(BlobPathError::Absolute(_))
        ));
        assert_eq!(Blob::from_relative(Path::new("")), Err(BlobPathError::Empty));
        assert_eq!(
            Blob::from_relative(Path::new("./etc/a.xml")).map(|blob| blob.path().to_string()),
            Ok("etc/a.xml".to_string())
        );
    }
}
