//! Image uploads.

use std::path::Path;

use ecom_core::ResponseApi;
use tracing::instrument;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, FilePart};

const UPLOADS_PATH: &str = "/uploads";
const FILES_FIELD: &str = "files";

/// Uploads images and returns their public URLs.
#[derive(Debug, Clone)]
pub struct UploadService {
    client: ApiClient,
}

impl UploadService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload `files` as one multipart request, one `files` part per file.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_images(&self, files: Vec<FilePart>) -> Result<Vec<String>, ApiError> {
        let files = files
            .into_iter()
            .map(|file| FilePart {
                field: FILES_FIELD.to_owned(),
                ..file
            })
            .collect();

        let response: ResponseApi<Vec<String>> = self.client.upload(UPLOADS_PATH, files).await?;
        Ok(response.into_data())
    }
}

/// Read `path` into a `files` part, inferring the MIME type from the
/// extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn file_part(path: &Path) -> std::io::Result<FilePart> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());

    let part = FilePart::new(FILES_FIELD, file_name, bytes);
    Ok(match image_mime(path) {
        Some(mime) => part.with_content_type(mime),
        None => part,
    })
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("a/b/photo.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("logo.svg")), Some("image/svg+xml"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn test_file_part_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let part = file_part(&path).await.unwrap();
        assert_eq!(part.field, "files");
        assert_eq!(part.file_name, "banner.png");
        assert_eq!(part.content_type.as_deref(), Some("image/png"));
        assert_eq!(part.bytes.len(), 4);
    }
}
