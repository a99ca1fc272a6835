use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tokio::fs;

use crate::editor::Editor;

const MAX_RECENT_FILES: usize = 10;
const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

// Host I/O layer. The editing core never touches the disk; it hands text in
// and out through this manager, and failures come back as error strings.
pub struct FileManager {
    current_path: Option<PathBuf>,
    is_readonly: bool,
    recent: Vec<PathBuf>,
}

impl FileManager {
    pub fn new() -> Self {
        Self {
            current_path: None,
            is_readonly: false,
            recent: Vec::new(),
        }
    }

    pub fn current_path(&self) -> Option<&PathBuf> {
        self.current_path.as_ref()
    }

    pub fn set_current_path(&mut self, path: Option<PathBuf>) {
        self.current_path = path;
    }

    pub fn has_file(&self) -> bool {
        self.current_path.is_some()
    }

    pub fn is_readonly(&self) -> bool {
        self.is_readonly
    }

    pub fn display_name(&self) -> String {
        self.current_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("[No Name]"))
    }

    pub fn recent_files(&self) -> &[PathBuf] {
        &self.recent
    }

    fn push_recent(&mut self, path: &PathBuf) {
        self.recent.retain(|p| p != path);
        self.recent.insert(0, path.clone());
        self.recent.truncate(MAX_RECENT_FILES);
    }

    pub async fn open_file(&mut self, path: PathBuf) -> Result<String> {
        if !path.exists() {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
        if !path.is_file() {
            return Err(anyhow::anyhow!("Not a regular file: {}", path.display()));
        }

        match fs::metadata(&path).await {
            Ok(metadata) => {
                self.is_readonly = metadata.permissions().readonly();
                if metadata.len() > LARGE_FILE_THRESHOLD {
                    log::warn!(
                        "Large file ({} bytes): {}",
                        metadata.len(),
                        path.display()
                    );
                }
            }
            Err(e) => {
                log::warn!("Failed to read metadata for {}: {}", path.display(), e);
                self.is_readonly = false;
            }
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read {}: {}", path.display(), e)
        })?;
        if content.contains('\0') {
            return Err(anyhow::anyhow!(
                "File appears to be binary: {}",
                path.display()
            ));
        }

        self.push_recent(&path);
        self.current_path = Some(path.clone());
        log::info!("Opened file: {}", path.display());
        Ok(content)
    }

    pub async fn save_file(&self, editor: &mut Editor) -> Result<String> {
        let Some(path) = self.current_path.as_ref() else {
            return Err(anyhow::anyhow!("No file name specified"));
        };
        if self.is_readonly {
            return Err(anyhow::anyhow!("File is read-only: {}", path.display()));
        }

        let content = editor.text();

        // Keep the previous version around before overwriting.
        if path.exists() {
            let backup_path = path.with_extension("bak");
            if let Err(e) = fs::copy(path, &backup_path).await {
                log::warn!("Failed to create backup: {}", e);
            }
        }

        let mut attempts = 0;
        const MAX_ATTEMPTS: u32 = 3;
        loop {
            match fs::write(path, content.as_bytes()).await {
                Ok(()) => {
                    editor.mark_saved();
                    log::info!("Saved file: {}", path.display());
                    let timestamp = Local::now().format("%H:%M:%S %d/%m/%Y");
                    return Ok(format!(
                        "\"{}\" {}L written {}",
                        self.display_name(),
                        editor.line_count(),
                        timestamp
                    ));
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_ATTEMPTS {
                        return Err(anyhow::anyhow!(
                            "Failed to write {}: {}",
                            path.display(),
                            e
                        ));
                    }
                    log::warn!(
                        "Save attempt {} failed for {}, retrying",
                        attempts,
                        path.display()
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        100 * u64::from(attempts),
                    ))
                    .await;
                }
            }
        }
    }

    pub async fn save_file_as(&mut self, path: PathBuf, editor: &mut Editor) -> Result<String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("Failed to create {}: {}", parent.display(), e)
                })?;
            }
        }

        let content = editor.text();
        fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;

        self.current_path = Some(path.clone());
        self.is_readonly = false;
        self.push_recent(&path);
        editor.mark_saved();
        log::info!("Saved file as: {}", path.display());
        let timestamp = Local::now().format("%H:%M:%S %d/%m/%Y");
        Ok(format!(
            "\"{}\" {}L written {}",
            self.display_name(),
            editor.line_count(),
            timestamp
        ))
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_open_and_save_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Hello World").unwrap();

        let mut fm = FileManager::new();
        let mut editor = Editor::new();

        let content = fm.open_file(temp_file.path().to_path_buf()).await.unwrap();
        editor.set_text(&content);
        assert!(fm.has_file());
        assert_eq!(fm.recent_files().len(), 1);

        editor.insert_char('!');
        let message = fm.save_file(&mut editor).await.unwrap();
        assert!(message.contains("written"));
        assert!(!editor.is_modified());
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let mut fm = FileManager::new();
        let result = fm.open_file(PathBuf::from("/no/such/file.txt")).await;
        assert!(result.is_err());
        assert!(!fm.has_file());
    }

    #[tokio::test]
    async fn test_save_without_path_fails() {
        let fm = FileManager::new();
        let mut editor = Editor::new();
        let result = fm.save_file(&mut editor).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No file name"));
    }

    #[tokio::test]
    async fn test_save_file_as_sets_current() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut fm = FileManager::new();
        let mut editor = Editor::new();
        editor.set_text("content");

        let message = fm
            .save_file_as(temp_file.path().to_path_buf(), &mut editor)
            .await
            .unwrap();
        assert!(message.contains("1L written"));
        assert!(fm.has_file());
        assert!(!editor.is_modified());
    }

    #[tokio::test]
    async fn test_recent_files_dedupe_and_cap() {
        let mut fm = FileManager::new();
        let mut files = Vec::new();
        for _ in 0..12 {
            let mut f = NamedTempFile::new().unwrap();
            writeln!(f, "x").unwrap();
            files.push(f);
        }
        for f in &files {
            fm.open_file(f.path().to_path_buf()).await.unwrap();
        }
        assert_eq!(fm.recent_files().len(), MAX_RECENT_FILES);
        // Re-opening moves to the front without duplicating.
        fm.open_file(files[5].path().to_path_buf()).await.unwrap();
        assert_eq!(fm.recent_files()[0], files[5].path());
        assert_eq!(fm.recent_files().len(), MAX_RECENT_FILES);
    }
}
