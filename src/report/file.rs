use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{LcaError, Result};
use crate::report::render::normalize;

const DEFAULT_FILE_NAME: &str = "report.md";

/// Characters replaced in report file names, besides whitespace
const UNSAFE_CHARS: &str = "/@.,&'\\(|)<>#;";

/// A rendered markdown report, attached to a dataset or loaded detached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Product system name the file is named after
    pub name: String,
    pub text: String,
}

/// Outcome of saving a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    Written(PathBuf),
    /// An identical report already exists at this path
    Unchanged(PathBuf),
}

impl Saved {
    pub fn path(&self) -> &Path {
        match self {
            Saved::Written(path) | Saved::Unchanged(path) => path,
        }
    }
}

impl Report {
    pub fn new(name: impl Into<String>, text: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            text: normalize(text.as_ref()),
        }
    }

    /// Markdown file name derived from the product system name
    pub fn file_name(&self) -> String {
        sanitize_file_name(&self.name)
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Hex SHA-256 of the rendered bytes, as they land on disk
    pub fn digest(&self) -> String {
        digest_bytes(self.render().as_bytes())
    }

    /// The report text in canonical form
    pub fn render(&self) -> String {
        normalize(&self.text)
    }

    /// Write into `dir`. An existing file with different content is only
    /// replaced when `overwrite` is set.
    pub fn save(&self, dir: &Path, overwrite: bool) -> Result<Saved> {
        std::fs::create_dir_all(dir)?;
        let path = self.path_in(dir);
        if path.exists() {
            let existing = std::fs::read(&path)?;
            if digest_bytes(&existing) == self.digest() {
                log::debug!("{} already up to date", path.display());
                return Ok(Saved::Unchanged(path));
            }
            if !overwrite {
                return Err(LcaError::ReportExists(path));
            }
        }
        std::fs::write(&path, self.render())?;
        log::info!("report written to {}", path.display());
        Ok(Saved::Written(path))
    }

    /// Load a saved report without any backend
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LcaError::MissingReport(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, text))
    }
}

fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whitespace and unsafe characters become `_`, runs collapse to one,
/// a trailing `_` is dropped; `report.md` when nothing usable remains
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let replaced = if c.is_whitespace() || UNSAFE_CHARS.contains(c) {
            '_'
        } else {
            c
        };
        if replaced == '_' && out.ends_with('_') {
            continue;
        }
        out.push(replaced);
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return DEFAULT_FILE_NAME.to_string();
    }
    out.push_str(".md");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Alkaline electrolysis"), "Alkaline_electrolysis.md");
        assert_eq!(
            sanitize_file_name("Electricity, at grid (ERCOT) 2030."),
            "Electricity_at_grid_ERCOT_2030.md"
        );
        assert_eq!(sanitize_file_name("a__b"), "a_b.md");
        assert_eq!(sanitize_file_name(""), "report.md");
        assert_eq!(sanitize_file_name(" ./ "), "report.md");
    }

    #[test]
    fn test_save_refuses_overwrite_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let first = Report::new("ERCOT 2030", "# Overview\nfirst\n");
        let saved = first.save(dir.path(), false).unwrap();
        assert!(matches!(saved, Saved::Written(_)));

        // same content is not an overwrite
        let again = first.save(dir.path(), false).unwrap();
        assert!(matches!(again, Saved::Unchanged(_)));

        let second = Report::new("ERCOT 2030", "# Overview\nsecond\n");
        match second.save(dir.path(), false) {
            Err(LcaError::ReportExists(path)) => assert_eq!(path, saved.path()),
            other => panic!("expected ReportExists, got {:?}", other),
        }
        assert_eq!(Report::load(saved.path()).unwrap().text, first.text);

        second.save(dir.path(), true).unwrap();
        assert_eq!(Report::load(saved.path()).unwrap().text, second.text);
    }

    #[test]
    fn test_load_roundtrip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new("ERCOT 2030", "# Overview  \n\n| a | b |\n");
        let saved = report.save(dir.path(), false).unwrap();
        let loaded = Report::load(saved.path()).unwrap();
        assert_eq!(loaded.name, "ERCOT_2030");
        assert_eq!(loaded.render(), report.render());
        assert_eq!(loaded.digest(), report.digest());
    }

    #[test]
    fn test_save_compares_bytes_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new("ERCOT 2030", "# Overview\nfirst\n");
        let path = report.save(dir.path(), false).unwrap().path().to_path_buf();

        // same text once normalized, different bytes
        std::fs::write(&path, "# Overview   \nfirst\n\n\n").unwrap();
        assert_eq!(Report::load(&path).unwrap().digest(), report.digest());

        let err = report.save(dir.path(), false).unwrap_err();
        assert!(matches!(err, LcaError::ReportExists(_)));
        assert!(matches!(report.save(dir.path(), true).unwrap(), Saved::Written(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.render());
        assert!(matches!(report.save(dir.path(), false).unwrap(), Saved::Unchanged(_)));
    }

    #[test]
    fn test_load_missing_report() {
        let err = Report::load(Path::new("/no/such/report.md")).unwrap_err();
        assert!(matches!(err, LcaError::MissingReport(_)));
    }
}
