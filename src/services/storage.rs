// src/services/storage.rs

use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::common::error::AppError;

pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

// Formatos aceitos pelo modelo de visão
const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
];

/// Imagem enviada pelo cliente, já decodificada do data URI.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Lê `data:<mimetype>;base64,<dados>`.
    pub fn from_data_uri(uri: &str) -> Result<Self, AppError> {
        let invalid = |reason: &str| AppError::InvalidImage(reason.to_string());

        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("expected a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| invalid("missing data section"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("only base64 data URIs are supported"))?
            .trim()
            .to_ascii_lowercase();

        if !ALLOWED_MIME_TYPES.iter().any(|(mime, _)| *mime == mime_type) {
            return Err(invalid("unsupported image type"));
        }

        // Estimativa antes de decodificar, para não alocar payloads enormes
        if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
            return Err(invalid("image exceeds 8 MiB"));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| invalid("malformed base64 data"))?;

        if bytes.is_empty() {
            return Err(invalid("image is empty"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(invalid("image exceeds 8 MiB"));
        }

        Ok(Self { mime_type, bytes })
    }

    pub fn extension(&self) -> &'static str {
        ALLOWED_MIME_TYPES
            .iter()
            .find(|(mime, _)| *mime == self.mime_type)
            .map(|(_, ext)| *ext)
            .unwrap_or("bin")
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Armazenamento de fotos de lavouras. Devolve a URL pública do arquivo.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, image: &ImageUpload) -> Result<String, AppError>;

    /// Apaga o arquivo de uma URL devolvida por `save`. Arquivo ausente não é erro.
    async fn remove(&self, url: &str) -> Result<(), AppError>;
}

// Grava em disco; o diretório é servido em /uploads pelo router
#[derive(Clone, Debug)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, image: &ImageUpload) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::StorageError(format!("{}: {}", self.root.display(), e)))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension());
        let path = self.root.join(&file_name);

        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| AppError::StorageError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("📷 Imagem salva em {} ({} bytes)", path.display(), image.bytes.len());

        Ok(format!("{}/uploads/{}", self.public_base_url, file_name))
    }

    async fn remove(&self, url: &str) -> Result<(), AppError> {
        let file_name = url
            .strip_prefix(&format!("{}/uploads/", self.public_base_url))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.'))
            .ok_or_else(|| AppError::StorageError(format!("URL fora do armazenamento local: {}", url)))?;

        let path = self.root.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("🧹 Imagem removida: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(format!("{}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_uri(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn parses_base64_data_uri() {
        let image = ImageUpload::from_data_uri(&png_uri(b"\x89PNG fake")).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"\x89PNG fake");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn mime_type_is_case_insensitive() {
        let uri = format!("data:IMAGE/JPEG;base64,{}", STANDARD.encode(b"jpeg"));
        assert_eq!(ImageUpload::from_data_uri(&uri).unwrap().extension(), "jpg");
    }

    #[test]
    fn rejects_non_image_and_malformed_uris() {
        let cases = [
            "https://example.com/leaf.png".to_string(),
            "data:image/png,plain-text".to_string(),
            format!("data:application/pdf;base64,{}", STANDARD.encode(b"pdf")),
            "data:image/png;base64,@@@".to_string(),
            "data:image/png;base64,".to_string(),
        ];

        for uri in cases {
            assert!(
                matches!(ImageUpload::from_data_uri(&uri), Err(AppError::InvalidImage(_))),
                "deveria rejeitar {}",
                uri
            );
        }
    }

    #[test]
    fn rejects_oversized_images() {
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = ImageUpload::from_data_uri(&png_uri(&big)).unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(reason) if reason.contains("8 MiB")));
    }

    #[tokio::test]
    async fn local_store_writes_file_and_returns_public_url() {
        let root = std::env::temp_dir().join(format!("agricheck-test-{}", Uuid::new_v4()));
        let store = LocalImageStore::new(&root, "http://localhost:3000/");
        let image = ImageUpload {
            mime_type: "image/webp".into(),
            bytes: b"webp-bytes".to_vec(),
        };

        let url = store.save(&image).await.unwrap();

        assert!(url.starts_with("http://localhost:3000/uploads/"));
        assert!(url.ends_with(".webp"));
        let file_name = url.rsplit('/').next().unwrap();
        let stored = tokio::fs::read(root.join(file_name)).await.unwrap();
        assert_eq!(stored, b"webp-bytes");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_saved_file_and_ignores_foreign_urls() {
        let root = std::env::temp_dir().join(format!("agricheck-test-{}", Uuid::new_v4()));
        let store = LocalImageStore::new(&root, "http://localhost:3000");
        let image = ImageUpload {
            mime_type: "image/png".into(),
            bytes: b"png-bytes".to_vec(),
        };

        let url = store.save(&image).await.unwrap();
        store.remove(&url).await.unwrap();
        // segunda remoção: arquivo já não existe
        store.remove(&url).await.unwrap();

        let mut entries = tokio::fs::read_dir(&root).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        assert!(store.remove("http://elsewhere/uploads/x.png").await.is_err());
        assert!(store.remove("http://localhost:3000/uploads/../secret").await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
