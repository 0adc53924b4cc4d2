use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::Circle;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("circle/embedding count mismatch: {circles} circles vs {embeddings} vectors")]
    CountMismatch { circles: usize, embeddings: usize },
    #[error("embedding dimension mismatch at index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("embedding at index {index} has zero norm")]
    ZeroVector { index: usize },
}

/// 起動時に一度だけ構築される不変のサークルカタログ
///
/// circles.json と circle_embeddings.json は index で 1:1 対応する。
/// 件数・次元・ゼロベクトルは構築時に検証し、失敗したら起動を中断する。
#[derive(Debug, Clone)]
pub struct Catalog {
    circles: Vec<Circle>,
    embeddings: Vec<Vec<f32>>,
    dimension: Option<usize>,
}

impl Catalog {
    /// 読み込み済みのサークルと埋め込みから検証付きで構築する
    pub fn from_parts(
        circles: Vec<Circle>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, CatalogError> {
        if circles.len() != embeddings.len() {
            return Err(CatalogError::CountMismatch {
                circles: circles.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = embeddings.first().map(|vector| vector.len());

        for (index, vector) in embeddings.iter().enumerate() {
            let expected = dimension.unwrap_or_default();
            if vector.len() != expected {
                return Err(CatalogError::DimensionMismatch {
                    index,
                    expected,
                    actual: vector.len(),
                });
            }

            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm == 0.0 {
                return Err(CatalogError::ZeroVector { index });
            }
        }

        Ok(Self {
            circles,
            embeddings,
            dimension,
        })
    }

    /// circles.json と circle_embeddings.json を読み込んでカタログを構築する
    pub fn load(
        circles_path: impl AsRef<Path>,
        embeddings_path: impl AsRef<Path>,
    ) -> Result<Self, CatalogError> {
        let circles: Vec<Circle> = read_json(circles_path.as_ref())?;
        let embeddings: Vec<Vec<f32>> = read_json(embeddings_path.as_ref())?;

        let catalog = Self::from_parts(circles, embeddings)?;
        tracing::info!(
            circles = catalog.len(),
            dimension = ?catalog.dimension(),
            "circle catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    /// 全埋め込みが共有する次元数（カタログが空なら None）
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// サークルと埋め込みのペアをカタログ順に返す
    pub fn entries(&self) -> impl Iterator<Item = (&Circle, &[f32])> {
        self.circles
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| CatalogError::Json {
        path: path.display().to_string(),
        source,
    })
}
