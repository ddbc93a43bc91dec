use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::AppConfig;
use crate::error::ValidationError;

const MIB: u64 = 1024 * 1024;

/// A local file picked for upload but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: Option<&'static str>,
}

impl PendingFile {
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let content_type = content_type_for(&path);
        Ok(Self {
            path,
            size,
            content_type,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}

pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    let ct = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(ct)
}

/// Photo limits shared by the submission form and the after-repair upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_files: usize,
    pub max_bytes: u64,
    pub allowed_prefix: &'static str,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_bytes: 10 * MIB,
            allowed_prefix: "image/",
        }
    }
}

impl UploadPolicy {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            max_files: cfg.upload_max_files,
            max_bytes: cfg.upload_max_mb.saturating_mul(MIB),
            ..Self::default()
        }
    }

    pub fn check_file(&self, file: &PendingFile) -> Result<(), ValidationError> {
        let allowed = file
            .content_type
            .map(|ct| ct.starts_with(self.allowed_prefix))
            .unwrap_or(false);
        if !allowed {
            return Err(ValidationError::UnsupportedFileType {
                file: file.file_name(),
            });
        }
        if file.size > self.max_bytes {
            return Err(ValidationError::FileTooLarge {
                file: file.file_name(),
                limit_mb: self.max_bytes / MIB,
            });
        }
        Ok(())
    }

    /// The batch is refused as a whole when it would push the list past
    /// `max_files`.
    pub fn check_batch(
        &self,
        existing: usize,
        files: &[PendingFile],
    ) -> Result<(), ValidationError> {
        for f in files {
            self.check_file(f)?;
        }
        if existing + files.len() > self.max_files {
            return Err(ValidationError::TooManyFiles {
                max: self.max_files,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Before,
    After,
}

impl PhotoKind {
    fn prefix(&self) -> &'static str {
        match self {
            PhotoKind::Before => "before",
            PhotoKind::After => "after",
        }
    }
}

/// Copies accepted photos under `<root>/<ticket_id>/` and hands back the
/// references stored on the ticket.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn store(
        &self,
        ticket_id: &str,
        kind: PhotoKind,
        first_index: usize,
        files: &[PendingFile],
    ) -> std::io::Result<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let dir = self.root.join(ticket_id);
        fs::create_dir_all(&dir).await?;

        let mut refs = Vec::with_capacity(files.len());
        for (offset, file) in files.iter().enumerate() {
            let name = format!(
                "{}-{}.{}",
                kind.prefix(),
                first_index + offset + 1,
                file.extension()
            );
            fs::copy(&file.path, dir.join(&name)).await?;
            refs.push(format!("{}/{}", ticket_id, name));
        }
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str, size: u64) -> PendingFile {
        let path = PathBuf::from(name);
        let content_type = content_type_for(&path);
        PendingFile {
            path,
            size,
            content_type,
        }
    }

    #[test]
    fn huge_size_limit_saturates() {
        let cfg = AppConfig::from_lookup(|key| {
            (key == "TPM_UPLOAD_MAX_MB").then(|| "99999999999999999".to_string())
        });
        let policy = UploadPolicy::from_config(&cfg);
        assert_eq!(policy.max_bytes, u64::MAX);
        assert!(policy.check_file(&pending("belt.jpg", 50 * MIB)).is_ok());
    }

    #[test]
    fn accepts_images_within_limits() {
        let policy = UploadPolicy::default();
        assert!(policy.check_file(&pending("belt.JPG", 2 * MIB)).is_ok());
        assert!(policy.check_file(&pending("gear.png", 10 * MIB)).is_ok());
    }

    #[test]
    fn rejects_non_images_and_oversized_files() {
        let policy = UploadPolicy::default();
        assert_eq!(
            policy.check_file(&pending("manual.pdf", 10)),
            Err(ValidationError::UnsupportedFileType {
                file: "manual.pdf".to_string()
            })
        );
        assert_eq!(
            policy.check_file(&pending("huge.png", 10 * MIB + 1)),
            Err(ValidationError::FileTooLarge {
                file: "huge.png".to_string(),
                limit_mb: 10
            })
        );
        assert!(policy.check_file(&pending("noext", 1)).is_err());
    }

    #[test]
    fn batch_counts_existing_photos() {
        let policy = UploadPolicy::default();
        let two = vec![pending("a.png", 1), pending("b.png", 1)];
        assert!(policy.check_batch(3, &two).is_ok());
        assert_eq!(
            policy.check_batch(4, &two),
            Err(ValidationError::TooManyFiles { max: 5 })
        );
    }

    #[tokio::test]
    async fn store_copies_into_ticket_folder() {
        let src = tempfile::tempdir().unwrap();
        let photo = src.path().join("leak.png");
        std::fs::write(&photo, b"not really a png").unwrap();
        let file = PendingFile::from_path(&photo).unwrap();
        assert_eq!(file.content_type, Some("image/png"));

        let root = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(root.path());
        let refs = store
            .store("TPM-20240115-0007", PhotoKind::After, 2, &[file])
            .await
            .unwrap();
        assert_eq!(refs, vec!["TPM-20240115-0007/after-3.png".to_string()]);
        assert!(root.path().join(&refs[0]).exists());
    }
}
