//! Temporary files for delivering rendered decks.
//!
//! A rendered deck is written to a uniquely named temporary file that is
//! removed when the [`TempExport`] is dropped, whether delivery succeeded
//! or not. [`TempExport::persist`] moves it to a permanent location instead.

use crate::writer::RenderedDeck;
use deck_core::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A rendered deck staged in a temporary file.
#[derive(Debug)]
pub struct TempExport {
    file: NamedTempFile,
    file_name: String,
}

impl TempExport {
    /// Write `rendered` into a fresh temporary file inside `dir`.
    pub fn create(dir: impl AsRef<Path>, rendered: &RenderedDeck) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("deck-")
            .suffix(".pptx")
            .tempfile_in(dir)?;
        file.write_all(&rendered.bytes)?;
        file.flush()?;

        log::debug!(
            "Staged '{}' at {}",
            rendered.file_name,
            file.path().display()
        );

        Ok(Self {
            file,
            file_name: rendered.file_name.clone(),
        })
    }

    /// Location of the staged file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Suggested name to deliver the file under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Move the staged file to `dest`, keeping it after this value is gone.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let dest = dest.as_ref().to_path_buf();
        self.file
            .persist(&dest)
            .map_err(|e| Error::IoError(e.error))?;
        Ok(dest)
    }
}

/// Stage `rendered` in `dir`, hand it to `deliver`, then remove it.
///
/// The temporary file is removed even when `deliver` fails.
pub fn with_temp_export<T, F>(dir: impl AsRef<Path>, rendered: &RenderedDeck, deliver: F) -> Result<T>
where
    F: FnOnce(&TempExport) -> Result<T>,
{
    let export = TempExport::create(dir, rendered)?;
    let result = deliver(&export);
    drop(export);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> RenderedDeck {
        RenderedDeck {
            file_name: "Team_Sync.pptx".to_string(),
            bytes: b"PK fake package".to_vec(),
        }
    }

    #[test]
    fn test_staged_file_holds_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let export = TempExport::create(dir.path(), &rendered()).unwrap();

        assert_eq!(export.file_name(), "Team_Sync.pptx");
        assert_eq!(std::fs::read(export.path()).unwrap(), b"PK fake package");
    }

    #[test]
    fn test_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let export = TempExport::create(dir.path(), &rendered()).unwrap();
        let path = export.path().to_path_buf();

        assert!(path.exists());
        drop(export);
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_after_delivery() {
        let dir = tempfile::tempdir().unwrap();

        let path = with_temp_export(dir.path(), &rendered(), |export| {
            Ok(export.path().to_path_buf())
        })
        .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_after_failed_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let mut seen = None;

        let result: Result<()> = with_temp_export(dir.path(), &rendered(), |export| {
            seen = Some(export.path().to_path_buf());
            Err(Error::RenderError("client went away".to_string()))
        });

        assert!(result.is_err());
        assert!(!seen.unwrap().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_persist_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("kept.pptx");

        let export = TempExport::create(dir.path(), &rendered()).unwrap();
        let kept = export.persist(&dest).unwrap();

        assert_eq!(kept, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PK fake package");
    }
}
