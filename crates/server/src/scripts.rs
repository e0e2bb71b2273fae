//! Local storage for generated YouTube Shorts scripts.
//!
//! One flat directory of Markdown files named
//! `youtube_shorts_<sanitized-keyword>_<timestamp>.md`. A file is written
//! once with a fixed template and only ever listed, read, or deleted
//! afterwards; there is no other mutation path.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Filename prefix shared by every generated script.
pub const SCRIPT_PREFIX: &str = "youtube_shorts_";

/// Errors from script file operations.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The named file does not exist in the script directory.
    #[error("script file not found: {0}")]
    NotFound(String),
    /// A script with the same keyword and timestamp was already written.
    #[error("script file already exists: {0}")]
    AlreadyExists(String),
    /// The filename is empty or would escape the script directory.
    #[error("invalid filename: {0:?}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata returned after writing a script file.
#[derive(Debug, Serialize)]
pub struct CreatedScript {
    pub filename: String,
    pub path: String,
    pub keyword: String,
    pub created_at: String,
    pub content_length: usize,
}

/// One entry of the script directory listing.
#[derive(Debug, Serialize)]
pub struct ScriptEntry {
    pub filename: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// Store managing the flat directory of script files.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    dir: PathBuf,
}

impl ScriptStore {
    /// Create a store rooted at the given directory. The directory itself is
    /// created lazily on the first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Render the script template and write it as a new file.
    pub async fn create(&self, keyword: &str, content: &str) -> Result<CreatedScript, ScriptError> {
        self.create_at(keyword, content, Local::now()).await
    }

    // Timestamp injected so collisions and filenames are testable.
    pub(crate) async fn create_at(
        &self,
        keyword: &str,
        content: &str,
        created: DateTime<Local>,
    ) -> Result<CreatedScript, ScriptError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = format!(
            "{SCRIPT_PREFIX}{}_{}.md",
            sanitize_keyword(keyword),
            created.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(&filename);

        // create_new keeps a same-second collision from clobbering the
        // earlier file; the caller gets an explicit error instead.
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ScriptError::AlreadyExists(filename));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(render_script(keyword, content, &created).as_bytes())
            .await?;
        file.flush().await?;
        tracing::info!(file = %path.display(), "created script file");

        Ok(CreatedScript {
            filename,
            path: path.display().to_string(),
            keyword: keyword.to_string(),
            created_at: created.to_rfc3339(),
            content_length: content.chars().count(),
        })
    }

    /// List script files, newest first. A directory that does not exist yet
    /// lists as empty.
    pub async fn list(&self) -> Result<Vec<ScriptEntry>, ScriptError> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.starts_with(SCRIPT_PREFIX) || !filename.ends_with(".md") {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let sort_key = meta.created().or_else(|_| meta.modified()).ok();
            entries.push((
                sort_key,
                ScriptEntry {
                    filename,
                    size: meta.len(),
                    created: meta.created().ok().and_then(format_timestamp),
                    modified: meta.modified().ok().and_then(format_timestamp),
                },
            ));
        }

        // newest first
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.filename.cmp(&a.1.filename)));
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Return the full contents of a script file.
    pub async fn read(&self, filename: &str) -> Result<String, ScriptError> {
        let path = self.entry_path(filename)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ScriptError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a script file. There is no trash, the file is gone.
    pub async fn delete(&self, filename: &str) -> Result<(), ScriptError> {
        let path = self.entry_path(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %path.display(), "deleted script file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ScriptError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reject names that are empty or would resolve outside the directory.
    fn entry_path(&self, filename: &str) -> Result<PathBuf, ScriptError> {
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\', '\0'])
        {
            return Err(ScriptError::InvalidName(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

/// Replace characters that cannot appear in a filename with underscores and
/// cap the length at 50 characters. Non-ASCII keywords pass through.
fn sanitize_keyword(keyword: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ' '];
    let replaced: String = keyword
        .chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim().chars().take(50).collect()
}

/// Render the fixed three-section script template.
fn render_script(keyword: &str, content: &str, created: &DateTime<Local>) -> String {
    format!(
        r#"# YouTube Shorts Script

## Metadata
- **Keyword**: {keyword}
- **Created**: {timestamp}
- **Length**: {length} characters

---

## Script Content

{content}

---

## Production Guidelines

### Shorts format
- Length: 15-60 seconds (30 or less works best)
- Aspect ratio: 9:16 vertical, 1080x1920 or higher
- The first 3 seconds need a strong hook

### Shooting and editing
- Fast cuts and transitions to hold attention
- Captions for accessibility
- Trending audio or sound effects
- A clear call to action at the end

### Measuring results
- Track views, likes, comments, and shares
- Watch audience retention
- Check subscriber conversion

---

*This script was generated automatically; review it before production use.*
"#,
        keyword = keyword,
        timestamp = created.format("%Y-%m-%d %H:%M:%S"),
        length = content.chars().count(),
        content = content,
    )
}

fn format_timestamp(time: SystemTime) -> Option<String> {
    time.duration_since(std::time::UNIX_EPOCH)
        .ok()
        .and_then(|d| chrono::DateTime::from_timestamp(d.as_secs() as i64, d.subsec_nanos()))
        .map(|dt| dt.to_rfc3339())
}
