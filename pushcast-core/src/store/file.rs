//! Template persistence using one JSON file per name

use super::{is_valid_template_name, validate_template_name, StoreError, TemplateStore};
use crate::models::TemplateData;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// Directory-backed template store: `<dir>/<name>.json` holds `{tokens, payload}`
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    dir: PathBuf,
}

impl FileTemplateStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, RECORD_EXTENSION))
    }
}

impl TemplateStore for FileTemplateStore {
    fn put(&self, name: &str, data: &TemplateData) -> Result<(), StoreError> {
        validate_template_name(name)?;
        let json = serde_json::to_string_pretty(data)?;

        // Truncate only once the lock is held so readers never see a torn record.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.record_path(name))?;
        FileExt::lock_exclusive(&file)?;
        file.set_len(0)?;

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        FileExt::unlock(&file)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<TemplateData>, StoreError> {
        validate_template_name(name)?;
        let file = match File::open(self.record_path(name)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_shared(&file)?;
        let mut contents = String::new();
        (&file).read_to_string(&mut contents)?;
        FileExt::unlock(&file)?;

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            // Skip files written out of band under names `get` would reject
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if is_valid_template_name(stem) => names.push(stem.to_string()),
                _ => {}
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn sample(tag: &str) -> TemplateData {
        TemplateData {
            tokens: vec![format!("{}-1", tag), format!("{}-2", tag)],
            payload: json!({"notification": {"title": tag, "body": "hello"}}),
        }
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("saved_data");
        let store = FileTemplateStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_and_layout() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path()).unwrap();

        store.put("welcome", &sample("welcome")).unwrap();
        assert_eq!(store.get("welcome").unwrap(), Some(sample("welcome")));

        // Pretty-printed with 2-space indentation
        let raw = std::fs::read_to_string(temp_dir.path().join("welcome.json")).unwrap();
        assert!(raw.starts_with("{\n  \"tokens\": [\n    \"welcome-1\""));
    }

    #[test]
    fn test_overwrite_keeps_only_latest() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path()).unwrap();

        // A long record followed by a short one must not leave trailing bytes
        let long = TemplateData {
            tokens: (0..50).map(|i| format!("token-{}", i)).collect(),
            payload: json!({"data": {"k": "v".repeat(200)}}),
        };
        store.put("promo", &long).unwrap();
        store.put("promo", &sample("short")).unwrap();

        assert_eq!(store.get("promo").unwrap(), Some(sample("short")));
        assert_eq!(store.list().unwrap(), vec!["promo"]);
    }

    #[test]
    fn test_list_ignores_other_files() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path()).unwrap();
        store.put("a", &sample("a")).unwrap();
        store.put("b", &sample("b")).unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let names: HashSet<String> = store.list().unwrap().into_iter().collect();
        let expected: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_list_skips_unloadable_names() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path()).unwrap();
        store.put("visible", &sample("visible")).unwrap();
        std::fs::write(temp_dir.path().join(".hidden.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("a:b.json"), "{}").unwrap();

        let names = store.list().unwrap();
        assert_eq!(names, vec!["visible"]);
        for name in &names {
            assert!(store.get(name).is_ok());
        }
    }

    #[test]
    fn test_missing_and_corrupt_records() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);

        std::fs::write(temp_dir.path().join("broken.json"), "{\"tokens\": [").unwrap();
        assert!(matches!(
            store.get("broken"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_invalid_name_never_touches_disk() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::open(temp_dir.path().join("inner")).unwrap();
        assert!(matches!(
            store.put("../escape", &sample("x")),
            Err(StoreError::InvalidName(_))
        ));
        assert!(!temp_dir.path().join("escape.json").exists());
    }
}
