// src/services/storage.rs

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::common::error::AppError;

/// Armazena artefatos no disco, sob `root`. As referências devolvidas são
/// caminhos relativos (ex.: `proofs/<uuid>_recibo.pdf`).
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn save(&self, folder: &str, bytes: &[u8], suggested_name: &str) -> Result<String, AppError> {
        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(suggested_name));
        let reference = format!("{folder}/{file_name}");

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::debug!("Artefato salvo em {}", reference);
        Ok(reference)
    }

    /// Remove o artefato. Arquivo inexistente não é erro.
    pub async fn delete(&self, reference: &str) -> Result<(), AppError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Artefato {} já não existia no disco", reference);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(reference);
        let is_safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !is_safe {
            return Err(AppError::bad_request("Invalid artifact reference."));
        }
        Ok(self.root.join(relative))
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("ledger-store-{}", Uuid::new_v4()))
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("recibo final.pdf"), "recibo_final.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".."), "artifact");
        assert_eq!(sanitize_file_name(""), "artifact");
    }

    #[tokio::test]
    async fn save_then_delete_removes_the_file() {
        let root = temp_root();
        let store = ArtifactStore::new(root.clone());

        let reference = store.save("proofs", b"%PDF-1.4", "receipt.pdf").await.unwrap();
        assert!(reference.starts_with("proofs/"));
        assert!(reference.ends_with("_receipt.pdf"));
        assert!(root.join(&reference).exists());

        store.delete(&reference).await.unwrap();
        assert!(!root.join(&reference).exists());

        // Segunda remoção é silenciosa
        store.delete(&reference).await.unwrap();

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn refuses_references_outside_root() {
        let store = ArtifactStore::new(temp_root());
        let err = store.delete("../outside.txt").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
