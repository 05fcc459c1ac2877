use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerDocument {
    pub name: String,
    pub path: PathBuf,
    pub kind: String,
    pub added_at: DateTime<Local>,
}

/// Locally persisted document registry. The whole list is rewritten to the
/// JSON registry file on every mutation; a missing file is an empty locker.
pub struct LockerModule {
    pub documents: Vec<LockerDocument>,
    registry_path: PathBuf,
}

impl LockerModule {
    pub fn new(registry_path: Option<PathBuf>) -> Result<Self> {
        let registry_path = registry_path.unwrap_or_else(|| {
            if let Some(data) = dirs::data_dir() {
                data.join("belfry").join("locker.json")
            } else {
                PathBuf::from("./locker.json")
            }
        });

        let mut module = Self {
            documents: Vec::new(),
            registry_path,
        };
        module.load()?;
        Ok(module)
    }

    fn load(&mut self) -> Result<()> {
        if !self.registry_path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(&self.registry_path)
            .with_context(|| format!("Reading {:?}", self.registry_path))?;
        let mut documents: Vec<LockerDocument> =
            serde_json::from_str(&content).with_context(|| "Parsing locker registry JSON")?;
        documents.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        self.documents = documents;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.registry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.documents)?;
        fs::write(&self.registry_path, json)
            .with_context(|| format!("Writing {:?}", self.registry_path))?;
        Ok(())
    }

    pub fn add_from_string(&mut self, input: &str) -> Result<()> {
        let parts: Vec<&str> = input.split('|').collect();
        if parts.len() < 2 {
            anyhow::bail!("Invalid format. Use: name|path|kind");
        }
        let name = parts[0].trim().to_string();
        let path = PathBuf::from(parts[1].trim());
        let kind = if parts.len() > 2 {
            parts[2].trim().to_string()
        } else {
            "file".to_string()
        };
        self.documents.insert(
            0,
            LockerDocument {
                name,
                path,
                kind,
                added_at: Local::now(),
            },
        );
        self.save()
    }

    pub fn delete(&mut self, index: usize) -> Result<()> {
        if index >= self.documents.len() {
            return Ok(());
        }
        self.documents.remove(index);
        self.save()
    }

    /// A registered local path that no longer exists. URLs are never missing.
    pub fn missing(&self, index: usize) -> bool {
        self.documents
            .get(index)
            .is_some_and(|d| d.kind != "url" && !d.path.exists())
    }

    pub fn open_document(&self, index: usize) -> Result<()> {
        if index >= self.documents.len() {
            return Ok(());
        }
        open_with_platform_handler(&self.documents[index].path)
    }
}

fn open_with_platform_handler(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").arg("/C").arg("start").arg("").arg(path).spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_registry_file_is_an_empty_locker() {
        let dir = tempdir().unwrap();
        let registry = dir.path().join("locker.json");
        let locker = LockerModule::new(Some(registry)).unwrap();
        assert!(locker.documents.is_empty());
    }

    #[test]
    fn test_added_document_survives_a_reload() {
        let dir = tempdir().unwrap();
        let registry = dir.path().join("nested").join("locker.json");

        let mut locker = LockerModule::new(Some(registry.clone())).unwrap();
        locker
            .add_from_string("Tax return|/home/casey/docs/tax.pdf|file")
            .unwrap();

        let reloaded = LockerModule::new(Some(registry)).unwrap();
        assert_eq!(reloaded.documents.len(), 1);
        assert_eq!(reloaded.documents[0].name, "Tax return");
        assert_eq!(
            reloaded.documents[0].path,
            PathBuf::from("/home/casey/docs/tax.pdf")
        );
        assert_eq!(reloaded.documents[0].kind, "file");
    }

    #[test]
    fn test_delete_is_persisted() {
        let dir = tempdir().unwrap();
        let registry = dir.path().join("locker.json");

        let mut locker = LockerModule::new(Some(registry.clone())).unwrap();
        locker.add_from_string("One|/tmp/one.txt").unwrap();
        locker.add_from_string("Two|/tmp/two.txt").unwrap();
        locker.delete(0).unwrap();

        let reloaded = LockerModule::new(Some(registry)).unwrap();
        assert_eq!(reloaded.documents.len(), 1);
        assert_eq!(reloaded.documents[0].name, "One");
    }

    #[test]
    fn test_kind_defaults_to_file() {
        let dir = tempdir().unwrap();
        let mut locker = LockerModule::new(Some(dir.path().join("locker.json"))).unwrap();
        locker.add_from_string("Note|/tmp/note.txt").unwrap();
        assert_eq!(locker.documents[0].kind, "file");
    }

    #[test]
    fn test_malformed_add_input_is_an_error() {
        let dir = tempdir().unwrap();
        let mut locker = LockerModule::new(Some(dir.path().join("locker.json"))).unwrap();
        assert!(locker.add_from_string("no pipe here").is_err());
        assert!(locker.documents.is_empty());
    }

    #[test]
    fn test_out_of_range_delete_and_open_are_no_ops() {
        let dir = tempdir().unwrap();
        let mut locker = LockerModule::new(Some(dir.path().join("locker.json"))).unwrap();
        assert!(locker.delete(5).is_ok());
        assert!(locker.open_document(5).is_ok());
    }

    #[test]
    fn test_missing_reports_vanished_local_paths_but_not_urls() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("real.txt");
        fs::write(&existing, "contents").unwrap();

        let mut locker = LockerModule::new(Some(dir.path().join("locker.json"))).unwrap();
        locker
            .add_from_string(&format!("Real|{}", existing.display()))
            .unwrap();
        locker.add_from_string("Gone|/nowhere/gone.txt").unwrap();
        locker
            .add_from_string("Portal|https://example.com/locker|url")
            .unwrap();

        // Newest first: Portal, Gone, Real.
        assert!(!locker.missing(0));
        assert!(locker.missing(1));
        assert!(!locker.missing(2));
        assert!(!locker.missing(99));
    }

    #[test]
    fn test_registry_reload_sorts_newest_first() {
        let dir = tempdir().unwrap();
        let registry = dir.path().join("locker.json");
        let older = LockerDocument {
            name: "Older".to_string(),
            path: PathBuf::from("/tmp/older.txt"),
            kind: "file".to_string(),
            added_at: Local::now() - chrono::Duration::hours(2),
        };
        let newer = LockerDocument {
            name: "Newer".to_string(),
            path: PathBuf::from("/tmp/newer.txt"),
            kind: "file".to_string(),
            added_at: Local::now(),
        };
        fs::write(
            &registry,
            serde_json::to_string_pretty(&vec![older, newer]).unwrap(),
        )
        .unwrap();

        let locker = LockerModule::new(Some(registry)).unwrap();
        assert_eq!(locker.documents[0].name, "Newer");
        assert_eq!(locker.documents[1].name, "Older");
    }

    #[test]
    fn test_unreadable_registry_is_an_error_not_a_panic() {
        let dir = tempdir().unwrap();
        let registry = dir.path().join("locker.json");
        fs::write(&registry, "not json at all").unwrap();
        assert!(LockerModule::new(Some(registry)).is_err());
    }
}
