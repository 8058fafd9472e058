use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::utils::AppError;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Longest text field accepted alongside a file.
const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

#[derive(Debug)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// File part plus the plain text fields of a multipart form.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub image: Option<UploadedImage>,
    pub fields: HashMap<String, String>,
}

impl ImageForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Checks extension and size, returning the normalised extension.
pub fn validate_image(filename: &str, size: usize, max_bytes: usize) -> Result<String, AppError> {
    let ext = extension_of(filename)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "Only image files are allowed ({})",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    if size == 0 {
        return Err(AppError::InvalidRequest("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(too_large(max_bytes));
    }
    Ok(ext)
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::InvalidRequest(format!(
        "File too large (max {} MB)",
        max_bytes as f64 / (1024.0 * 1024.0)
    ))
}

/// Stored names are `<uuid>.<ext>`; anything else is rejected before touching disk.
pub fn is_stored_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, ext)) => {
            uuid::Uuid::parse_str(stem).is_ok() && ALLOWED_EXTENSIONS.contains(&ext)
        }
        None => false,
    }
}

pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Validates and writes the image, returning its public URL.
pub async fn save_image(dir: &Path, image: &UploadedImage, max_bytes: usize) -> Result<String, AppError> {
    let ext = validate_image(&image.filename, image.bytes.len(), max_bytes)?;
    let name = format!("{}.{}", uuid::Uuid::new_v4(), ext);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;
    tokio::fs::write(dir.join(&name), &image.bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    log::info!("📁 Stored upload {} ({} bytes)", name, image.bytes.len());
    Ok(format!("{}{}", UPLOADS_PREFIX, name))
}

/// Resolves a stored file name inside the upload directory.
pub fn stored_path(dir: &Path, name: &str) -> Option<PathBuf> {
    is_stored_name(name).then(|| dir.join(name))
}

/// Best effort removal of a file previously returned by `save_image`.
pub async fn remove_image(dir: &Path, url: &str) {
    let Some(path) = url.strip_prefix(UPLOADS_PREFIX).and_then(|name| stored_path(dir, name)) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&path).await {
        log::warn!("⚠️  Could not remove upload {}: {}", path.display(), e);
    }
}

/// Drains a multipart payload. The part named `file_field` becomes the image,
/// every other part is read as text. The size ceiling is enforced while the
/// bytes stream in.
pub async fn read_image_form(
    mut payload: Multipart,
    file_field: &str,
    max_bytes: usize,
) -> Result<ImageForm, AppError> {
    let mut form = ImageForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let limit = if name == file_field { max_bytes } else { MAX_TEXT_FIELD_BYTES };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidRequest(format!("Upload interrupted: {}", e)))?;
            if bytes.len() + chunk.len() > limit {
                return Err(if name == file_field {
                    too_large(max_bytes)
                } else {
                    AppError::InvalidRequest(format!("Field {} is too long", name))
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        if name == file_field {
            let filename = filename
                .ok_or_else(|| AppError::InvalidRequest("Image part has no file name".to_string()))?;
            form.image = Some(UploadedImage { filename, bytes });
        } else {
            let text = String::from_utf8(bytes)
                .map_err(|_| AppError::InvalidRequest(format!("Field {} is not valid UTF-8", name)))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    #[test]
    fn accepts_known_image_extensions() {
        assert_eq!(validate_image("poster.PNG", 10, MB).unwrap(), "png");
        assert_eq!(validate_image("me.jpeg", 10, MB).unwrap(), "jpeg");
        assert!(validate_image("notes.pdf", 10, MB).is_err());
        assert!(validate_image("noext", 10, MB).is_err());
    }

    #[test]
    fn enforces_size_ceiling() {
        assert!(validate_image("a.gif", MB, MB).is_ok());
        assert!(validate_image("a.gif", MB + 1, MB).is_err());
        assert!(validate_image("a.gif", 0, MB).is_err());
    }

    #[test]
    fn only_generated_names_are_served() {
        let name = format!("{}.webp", uuid::Uuid::new_v4());
        assert!(is_stored_name(&name));
        assert!(!is_stored_name("../etc/passwd"));
        assert!(!is_stored_name("logo.png"));
        assert_eq!(content_type_for(&name), "image/webp");
    }

    #[tokio::test]
    async fn save_then_remove() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", uuid::Uuid::new_v4()));
        let image = UploadedImage {
            filename: "cup.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };

        let url = save_image(&dir, &image, MB).await.unwrap();
        assert!(url.starts_with(UPLOADS_PREFIX));
        assert!(url.ends_with(".jpg"));

        let name = url.trim_start_matches(UPLOADS_PREFIX);
        let path = stored_path(&dir, name).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), image.bytes);

        remove_image(&dir, &url).await;
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
