pub mod config;
pub mod hash_embedder;
pub mod similarity;
pub mod tokenizer;

use crate::Circle;
pub use config::EmbedderConfig;
pub use hash_embedder::HashEmbedder;
pub use similarity::cosine_similarity;

/// テキスト埋め込みの抽象インターフェース
///
/// 実装例:
/// - HashEmbedder: Feature Hashing（決定論的、学習不要）
///
/// 検索レスポンスには name() と version() が記録される。
/// 同一テキストに対して常に同一のベクトルを返すこと。バージョンを
/// またいだ互換性は保証されないため、埋め込み空間を変えたら
/// version() を上げ、保存済みベクトルを再生成する。
pub trait TextEmbedder: Send + Sync {
    /// 実装名（"hash" など）
    fn name(&self) -> &'static str;

    /// バージョン情報（埋め込み空間の世代管理用）
    fn version(&self) -> &str;

    /// 埋め込み次元数
    fn dimension(&self) -> usize;

    /// 検索クエリを埋め込みベクトルに変換（設定された接頭辞を適用）
    fn embed_query(&self, text: &str) -> Embedding;

    /// サークル紹介文を埋め込みベクトルに変換
    fn embed_circle(&self, circle: &Circle) -> Embedding;

    /// カテゴリ代表文を埋め込みベクトルに変換
    fn embed_category(&self, text: &str) -> Embedding;
}

#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmbeddingSource {
    Query,
    Circle,
    Category,
}

impl Embedding {
    /// L2ノルム
    pub fn norm(&self) -> f32 {
        self.vector.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// ゼロベクトル判定（コサイン類似度が定義できない入力）
    pub fn is_zero(&self) -> bool {
        self.norm() == 0.0
    }
}

/// 埋め込み実装のファクトリ
pub fn create_embedder(name: &str, config: EmbedderConfig) -> Box<dyn TextEmbedder> {
    if name != "hash" {
        tracing::warn!(embedder = name, "unknown embedder name; falling back to hash");
    }
    Box::new(HashEmbedder::new(config))
}

/// 環境変数から埋め込み設定を読み込み
pub fn load_config_from_env() -> EmbedderConfig {
    EmbedderConfig {
        dimension: std::env::var("CR_EMBED_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        query_prefix: std::env::var("CR_EMBED_QUERY_PREFIX").unwrap_or_default(),
    }
}
