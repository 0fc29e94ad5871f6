use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// One tagged image as written by the tagging tool.
///
/// Only `file_name` and `class_name` matter here; the kernel and colour
/// filter fields describe preprocessing that was already baked into the
/// saved image and are kept for round-tripping the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    #[serde(alias = "name")]
    pub file_name: String,
    #[serde(alias = "tipo_pez")]
    pub class_name: String,
    #[serde(default, alias = "kernels_applied")]
    pub kernels_applied: Vec<String>,
    #[serde(default, alias = "filter")]
    pub color_filter: Option<String>,
}

/// A list of records plus the directory their file names resolve against.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub base_dir: PathBuf,
    pub records: Vec<CatalogRecord>,
}

impl Catalog {
    pub fn new(base_dir: impl Into<PathBuf>, records: Vec<CatalogRecord>) -> Catalog {
        Catalog { base_dir: base_dir.into(), records }
    }

    /// Reads a JSON array of records. File names resolve against the
    /// directory containing the catalog file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Catalog> {
        let path = path.as_ref();
        let catalog_err = |reason: String| Error::Catalog { path: path.to_path_buf(), reason };

        let file = std::fs::File::open(path).map_err(|e| catalog_err(e.to_string()))?;
        let reader = std::io::BufReader::new(file);
        let records: Vec<CatalogRecord> =
            serde_json::from_reader(reader).map_err(|e| catalog_err(e.to_string()))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Catalog { base_dir, records })
    }

    /// Writes the records back as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.records)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    pub fn resolve(&self, record: &CatalogRecord) -> PathBuf {
        self.base_dir.join(&record.file_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_field_names() {
        let json = r#"[{"fileName": "a.png", "className": "Angel",
                        "kernelsApplied": ["sobel"], "colorFilter": "red"}]"#;
        let records: Vec<CatalogRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].file_name, "a.png");
        assert_eq!(records[0].class_name, "Angel");
        assert_eq!(records[0].kernels_applied, vec!["sobel"]);
        assert_eq!(records[0].color_filter.as_deref(), Some("red"));
    }

    #[test]
    fn parses_tagging_tool_field_names() {
        let json = r#"[{"name": "b.png", "path": "/abs/b.png", "filter": "none",
                        "kernels_applied": [], "tipo_pez": "Trout"}]"#;
        let records: Vec<CatalogRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].file_name, "b.png");
        assert_eq!(records[0].class_name, "Trout");
        assert!(records[0].kernels_applied.is_empty());
    }

    #[test]
    fn optional_fields_default() {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(r#"[{"fileName": "c.png", "className": "Carp"}]"#).unwrap();
        assert!(records[0].kernels_applied.is_empty());
        assert_eq!(records[0].color_filter, None);
    }

    #[test]
    fn load_resolves_against_catalog_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let catalog = Catalog::new(dir.path(), vec![CatalogRecord {
            file_name: "x.png".into(),
            class_name: "Angel".into(),
            kernels_applied: vec![],
            color_filter: None,
        }]);
        catalog.save_json(&path).unwrap();

        let loaded = Catalog::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.resolve(&loaded.records[0]), dir.path().join("x.png"));
    }

    #[test]
    fn missing_or_malformed_catalog_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Catalog::load_json(dir.path().join("nope.json")), Err(Error::Catalog { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(Catalog::load_json(&bad), Err(Error::Catalog { .. })));
    }
}
