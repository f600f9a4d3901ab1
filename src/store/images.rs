// src/store/images.rs — Artwork image files
//
// Generated images arrive either inline (`data:` URLs from the placeholder or
// b64 responses) or as short-lived remote URLs. Both are copied into the
// images directory so gallery links keep working after the remote expires.

use base64::Engine;
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::infra::errors::TalkArtError;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageBytes {
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.content_type)
    }
}

/// Decode `data:image/png;base64,....`.
pub fn decode_data_url(source: &str) -> Result<ImageBytes, TalkArtError> {
    let rest = source
        .strip_prefix("data:")
        .ok_or_else(|| TalkArtError::Image("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| TalkArtError::Image("data URL has no payload".into()))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| TalkArtError::Image("only base64 data URLs are supported".into()))?;
    if !content_type.starts_with("image/") {
        return Err(TalkArtError::Image(format!("unsupported content type {content_type}")));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| TalkArtError::Image(format!("invalid base64: {e}")))?;
    Ok(ImageBytes {
        bytes,
        content_type: content_type.to_string(),
    })
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

fn sanitize(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "session".into()
    } else {
        cleaned
    }
}

pub struct ImageStore {
    dir: PathBuf,
    client: reqwest::Client,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            client: reqwest::Client::new(),
            max_bytes,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, file_name: &str) -> Result<PathBuf, TalkArtError> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(TalkArtError::Image(format!("invalid image name '{file_name}'")));
        }
        Ok(self.dir.join(file_name))
    }

    /// Copy an image (data URL or http(s) URL) into the store. Returns the file name.
    pub async fn save(&self, source: &str, session_id: &str) -> Result<String, TalkArtError> {
        let image = if source.starts_with("data:") {
            // base64 expands by 4/3, so an oversized payload is rejected before decoding
            if source.len() / 4 * 3 > self.max_bytes + 3 {
                return Err(TalkArtError::Image("image exceeds size limit".into()));
            }
            let image = decode_data_url(source)?;
            if image.bytes.len() > self.max_bytes {
                return Err(TalkArtError::Image("image exceeds size limit".into()));
            }
            image
        } else {
            self.fetch_remote(source).await?
        };

        let file_name = format!(
            "{}_{}.{}",
            sanitize(session_id),
            Utc::now().timestamp_millis(),
            extension_for(&image.content_type)
        );
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_of(&file_name)?, &image.bytes).await?;
        tracing::info!(file = %file_name, bytes = image.bytes.len(), "Stored artwork image");
        Ok(file_name)
    }

    pub async fn read(&self, file_name: &str) -> Result<ImageBytes, TalkArtError> {
        let bytes = tokio::fs::read(self.path_of(file_name)?).await?;
        Ok(ImageBytes {
            bytes,
            content_type: content_type_for(file_name).to_string(),
        })
    }

    /// Remove a stored file. Missing files are not an error.
    pub async fn remove(&self, file_name: &str) -> Result<(), TalkArtError> {
        match tokio::fs::remove_file(self.path_of(file_name)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Download an http(s) image, refusing anything over the size cap.
    pub async fn fetch_remote(&self, source: &str) -> Result<ImageBytes, TalkArtError> {
        let url = url::Url::parse(source)
            .map_err(|e| TalkArtError::Image(format!("invalid image URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TalkArtError::Image(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TalkArtError::Image(format!(
                "Failed to fetch image: {}",
                response.status()
            )));
        }
        if response
            .content_length()
            .is_some_and(|len| len as usize > self.max_bytes)
        {
            return Err(TalkArtError::Image("image exceeds size limit".into()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "image/png".into());

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(TalkArtError::Image("image exceeds size limit".into()));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(ImageBytes {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_url() {
        let img = decode_data_url(PNG_1X1).unwrap();
        assert_eq!(img.content_type, "image/png");
        assert_eq!(&img.bytes[1..4], b"PNG");
        assert_eq!(img.to_data_url(), PNG_1X1);
    }

    #[test]
    fn test_decode_rejects_non_images() {
        assert!(decode_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("https://example.com/a.png").is_err());
    }

    #[tokio::test]
    async fn test_save_read_remove() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path().join("images"), 1024 * 1024);

        let name = store.save(PNG_1X1, "session_1/../evil").await.unwrap();
        assert!(name.starts_with("session_1evil_"));
        assert!(name.ends_with(".png"));

        let img = store.read(&name).await.unwrap();
        assert_eq!(img.content_type, "image/png");

        store.remove(&name).await.unwrap();
        store.remove(&name).await.unwrap();
        assert!(store.read(&name).await.is_err());
    }

    #[tokio::test]
    async fn test_save_caps_inline_images() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path().join("images"), 16);

        let err = store.save(PNG_1X1, "session_1").await.unwrap_err();
        assert!(err.to_string().contains("size limit"));
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn test_rejects_traversal_and_schemes() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path(), 1024);
        assert!(store.read("../secret.png").await.is_err());
        assert!(store.fetch_remote("file:///etc/passwd").await.is_err());
    }
}
