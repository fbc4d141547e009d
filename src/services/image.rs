use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No file was submitted.")]
    Missing,

    #[error("The submitted data was not a file. Check the encoding type on the form.")]
    NotAFile,

    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
    )]
    NotAnImage,

    #[error("The submitted file is empty.")]
    Empty,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageError {
    /// Whether the failure is the client's input rather than the disk.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Image bytes with the extension they will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// Decodes `data:<mime>;base64,<payload>`. The extension is the MIME
    /// subtype, e.g. `png` for `image/png`.
    pub fn from_data_uri(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageError::Missing);
        }

        let rest = input.strip_prefix("data:").ok_or(ImageError::NotAFile)?;
        let (mime, payload) = rest.split_once(";base64,").ok_or(ImageError::NotAFile)?;

        let extension = mime
            .rsplit('/')
            .next()
            .filter(|ext| !ext.is_empty())
            .ok_or(ImageError::NotAnImage)?
            .to_ascii_lowercase();

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| ImageError::NotAnImage)?;

        Self::checked(extension, bytes)
    }

    /// A file part from a multipart upload.
    pub fn from_upload(filename: Option<&str>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        let extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(ImageError::NotAnImage)?;

        Self::checked(extension, bytes)
    }

    fn checked(extension: String, bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let is_image = mime_guess::from_ext(&extension)
            .first()
            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
        if !is_image || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ImageError::NotAnImage);
        }

        Ok(Self { extension, bytes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Recipe,
    Avatar,
}

impl ImageKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Recipe => "recipes",
            Self::Avatar => "avatars",
        }
    }
}

/// Stores uploaded images under the media root and builds their public URLs.
pub struct ImageService {
    root: PathBuf,
    url_base: String,
}

impl ImageService {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let url_base = format!(
            "{}/{}",
            config.server.public_url.trim_end_matches('/'),
            config.media.url_prefix.trim_matches('/')
        );

        Self {
            root: PathBuf::from(&config.media.root),
            url_base,
        }
    }

    /// Writes the image under a fresh unique name and returns its path
    /// relative to the media root.
    pub async fn store(&self, kind: ImageKind, image: DecodedImage) -> Result<String, ImageError> {
        let dir = self.root.join(kind.dir());
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let filename = format!("{}.{}", Uuid::new_v4(), image.extension);
        let file_path = dir.join(&filename);
        fs::write(&file_path, &image.bytes).await?;

        info!(path = %file_path.display(), size = image.bytes.len(), "Stored image");

        Ok(format!("{}/{filename}", kind.dir()))
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "Failed to remove image");
        }
    }

    #[must_use]
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{relative}", self.url_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_data_uri_with_subtype_extension() {
        let image = DecodedImage::from_data_uri(&format!("data:image/png;base64,{PNG}")).unwrap();
        assert_eq!(image.extension, "png");
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn rejects_plain_strings_and_bad_payloads() {
        assert!(matches!(
            DecodedImage::from_data_uri("http://example.com/a.png"),
            Err(ImageError::NotAFile)
        ));
        assert!(matches!(
            DecodedImage::from_data_uri("data:image/png;base64,@@@"),
            Err(ImageError::NotAnImage)
        ));
        assert!(matches!(
            DecodedImage::from_data_uri("data:text/plain;base64,aGVsbG8="),
            Err(ImageError::NotAnImage)
        ));
        assert!(matches!(
            DecodedImage::from_data_uri("  "),
            Err(ImageError::Missing)
        ));
    }

    #[test]
    fn upload_extension_comes_from_filename() {
        let image = DecodedImage::from_upload(Some("me.JPG"), vec![1, 2, 3]).unwrap();
        assert_eq!(image.extension, "jpg");
        assert!(matches!(
            DecodedImage::from_upload(Some("notes.txt"), vec![1]),
            Err(ImageError::NotAnImage)
        ));
        assert!(matches!(
            DecodedImage::from_upload(Some("a.png"), Vec::new()),
            Err(ImageError::Empty)
        ));
    }

    #[tokio::test]
    async fn store_writes_under_kind_directory() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", Uuid::new_v4()));
        let mut config = Config::default();
        config.media.root = root.to_string_lossy().into_owned();
        let service = ImageService::new(&config);

        let image = DecodedImage::from_data_uri(&format!("data:image/png;base64,{PNG}")).unwrap();
        let relative = service.store(ImageKind::Recipe, image).await.unwrap();

        assert!(relative.starts_with("recipes/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());
        assert_eq!(
            service.url(&relative),
            format!("http://localhost:8000/media/{relative}")
        );

        service.remove(&relative).await;
        assert!(!root.join(&relative).exists());
        let _ = std::fs::remove_dir_all(root);
    }
}
