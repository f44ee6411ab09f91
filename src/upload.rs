use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures_util::StreamExt;
use tracing::warn;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::error::ApiError;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub const UPLOAD_FIELD: &str = "file";

const URL_PREFIX: &str = "/static/uploads";

/// The `file` part of a multipart request.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Reads the multipart body and keeps the first `file` part that carries a
/// filename. Other parts are drained and ignored. All part bodies together may
/// not exceed `limit` bytes.
pub async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Option<Upload>, ApiError> {
    let mut upload = None;
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;

        let disposition = field.content_disposition();
        let filename = match disposition.get_filename() {
            Some(name) if upload.is_none() && disposition.get_name() == Some(UPLOAD_FIELD) => {
                Some(name.to_string())
            }
            _ => None,
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(malformed)?;
            total += data.len();
            if total > limit {
                return Err(ApiError::PayloadTooLarge { limit });
            }
            if filename.is_some() {
                bytes.extend_from_slice(&data);
            }
        }

        if let Some(filename) = filename {
            upload = Some(Upload { filename, bytes });
        }
    }

    Ok(upload)
}

fn malformed(err: actix_multipart::MultipartError) -> ApiError {
    warn!(error = %err, "malformed multipart payload");
    ApiError::MalformedUpload
}

pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename).map_or(false, |ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reduces a client-supplied name to `[A-Za-z0-9._-]` with no directory parts.
/// Accented letters are folded to their base letter first.
pub fn secure_filename(filename: &str) -> String {
    let folded: String = filename.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let spaced = folded.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Public upload directory, `<static>/uploads`.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(static_dir: &Path) -> Self {
        Self {
            root: static_dir.join("uploads"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<uuid>_<cleansed name>`, unique per call.
    pub fn unique_name(original: &str) -> String {
        let mut safe = secure_filename(original);
        if safe.is_empty() {
            safe = "image".to_string();
        }
        format!("{}_{}", Uuid::new_v4(), safe)
    }

    pub fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Looks up a previously stored file. Names that would not survive
    /// [`secure_filename`] unchanged are refused.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || secure_filename(name) != name {
            return None;
        }
        Some(self.root.join(name))
    }

    pub fn url_for(name: &str) -> String {
        format!("{URL_PREFIX}/{name}")
    }
}

pub fn content_type_for(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_only_image_extensions() {
        assert!(allowed_file("apple.png"));
        assert!(allowed_file("apple.JPG"));
        assert!(allowed_file("my.apple.jpeg"));
        assert!(allowed_file("banana.webp"));
        assert!(!allowed_file("banana.gif"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file("archive.png.zip"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn secure_filename_strips_paths_and_symbols() {
        assert_eq!(secure_filename("My cool movie.png"), "My_cool_movie.png");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\photos\\apple.jpg"), "C_photos_apple.jpg");
        assert_eq!(secure_filename("äpfel (1).png"), "apfel_1.png");
        assert_eq!(secure_filename("crème brûlée.jpg"), "creme_brulee.jpg");
        assert_eq!(secure_filename("日本.png"), "png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn unique_names_keep_the_cleansed_suffix() {
        let a = UploadDir::unique_name("fresh apple.png");
        let b = UploadDir::unique_name("fresh apple.png");
        assert_ne!(a, b);
        assert!(a.ends_with("_fresh_apple.png"));
        assert_eq!(a.len(), 36 + 1 + "fresh_apple.png".len());
    }

    #[test]
    fn unique_name_falls_back_when_nothing_survives() {
        assert!(UploadDir::unique_name("???").ends_with("_image"));
    }

    #[test]
    fn save_creates_the_upload_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::new(dir.path());
        assert!(!uploads.root().exists());

        let path = uploads.save("x.png", b"data").unwrap();
        assert_eq!(path, dir.path().join("uploads").join("x.png"));
        assert_eq!(fs::read(path).unwrap(), b"data");
    }

    #[test]
    fn resolve_refuses_unclean_names() {
        let uploads = UploadDir::new(Path::new("static"));
        assert!(uploads.resolve("../secret.png").is_none());
        assert!(uploads.resolve("").is_none());
        assert_eq!(
            uploads.resolve("abc_apple.png"),
            Some(PathBuf::from("static/uploads/abc_apple.png"))
        );
    }

    #[test]
    fn urls_and_content_types() {
        assert_eq!(UploadDir::url_for("a.png"), "/static/uploads/a.png");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }
}
