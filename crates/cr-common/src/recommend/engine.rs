use std::cmp::Ordering;

use thiserror::Error;

use super::scoring::{score_circle, CircleScore, ScoringConfig};
use crate::{
    catalog::Catalog,
    category::{CategorySet, DetectedCategory},
    embedding::TextEmbedder,
    normalize::normalize_query,
    Circle,
};

/// 推薦エンジン設定
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// 返却件数の上限
    pub top_k: usize,
    pub scoring: ScoringConfig,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            scoring: ScoringConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog dimension {catalog} does not match embedder dimension {embedder}")]
    DimensionMismatch { catalog: usize, embedder: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("query embedding has zero norm")]
    ZeroNormQuery,
}

/// ランキング済みサークル
#[derive(Debug, Clone)]
pub struct RankedCircle {
    pub circle: Circle,
    pub score: CircleScore,
}

/// 検索結果（検出カテゴリ + ランキング）
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// 正規化済みクエリ
    pub query: String,
    pub category: DetectedCategory,
    pub results: Vec<RankedCircle>,
}

/// サークル推薦エンジン
///
/// カタログ・カテゴリ・埋め込み器を構築時に固定し、以後は読み取り専用。
/// 検索は共有状態を変更しないため並行呼び出しに安全で、同一クエリ・
/// 同一データに対して常に同一の結果を返す。
pub struct RecommendEngine {
    catalog: Catalog,
    embedder: Box<dyn TextEmbedder>,
    categories: CategorySet,
    config: RecommendConfig,
}

impl RecommendEngine {
    /// カタログと埋め込み器の次元一致を検証して構築する
    ///
    /// 次元不一致はデータとモデルの世代ずれを意味するため、検索時ではなく
    /// ここで失敗させる。カテゴリ埋め込みもこの時点で一度だけ計算する。
    pub fn new(
        catalog: Catalog,
        embedder: Box<dyn TextEmbedder>,
        config: RecommendConfig,
    ) -> Result<Self, EngineError> {
        if let Some(dimension) = catalog.dimension() {
            if dimension != embedder.dimension() {
                return Err(EngineError::DimensionMismatch {
                    catalog: dimension,
                    embedder: embedder.dimension(),
                });
            }
        }

        let categories = CategorySet::build(embedder.as_ref());

        Ok(Self {
            catalog,
            embedder,
            categories,
            config,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    pub fn embedder_version(&self) -> &str {
        self.embedder.version()
    }

    /// クエリを正規化・埋め込みし、全サークルを採点して上位 top_k を返す
    pub fn search(&self, raw_query: &str) -> Result<SearchOutcome, SearchError> {
        self.search_with_limit(raw_query, self.config.top_k)
    }

    /// 件数上限を指定する検索。空クエリは埋め込み前に弾く。
    pub fn search_with_limit(
        &self,
        raw_query: &str,
        limit: usize,
    ) -> Result<SearchOutcome, SearchError> {
        let query = normalize_query(raw_query);
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let query_embedding = self.embedder.embed_query(&query);
        if query_embedding.is_zero() {
            return Err(SearchError::ZeroNormQuery);
        }

        let category = self.categories.detect(&query_embedding);

        let mut results: Vec<RankedCircle> = self
            .catalog
            .entries()
            .map(|(circle, embedding)| RankedCircle {
                circle: circle.clone(),
                score: score_circle(
                    &query_embedding.vector,
                    circle,
                    embedding,
                    category.label,
                    &self.config.scoring,
                ),
            })
            .collect();

        // 同点はカタログ読み込み順を保つ（安定ソート）
        results.sort_by(|a, b| {
            match b
                .score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(Ordering::Equal)
            {
                Ordering::Equal => Ordering::Equal,
                other => other,
            }
        });
        results.truncate(limit);

        tracing::debug!(
            query = %query,
            category = category.label,
            results = results.len(),
            "search completed"
        );

        Ok(SearchOutcome {
            query,
            category,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedding, EmbeddingSource};

    /// テキスト内容で固定2次元ベクトルを返すスタブ埋め込み
    ///
    /// - "音楽" を含む → [1, 0]
    /// - "無音" を含む → ゼロベクトル
    /// - それ以外     → [0, 1]
    struct StubEmbedder {
        dimension: usize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self { dimension: 2 }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            if text.contains("無音") {
                vec![0.0, 0.0]
            } else if text.contains("音楽") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            }
        }

        fn embedding(text: &str, source: EmbeddingSource) -> Embedding {
            Embedding {
                vector: Self::vector_for(text),
                source,
                created_at: chrono::Utc::now(),
            }
        }
    }

    impl TextEmbedder for StubEmbedder {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn version(&self) -> &str {
            "test"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn embed_query(&self, text: &str) -> Embedding {
            Self::embedding(text, EmbeddingSource::Query)
        }

        fn embed_circle(&self, circle: &Circle) -> Embedding {
            Self::embedding(&circle.embedding_text(), EmbeddingSource::Circle)
        }

        fn embed_category(&self, text: &str) -> Embedding {
            Self::embedding(text, EmbeddingSource::Category)
        }
    }

    fn circle(name: &str, tags: &[&str]) -> Circle {
        Circle {
            name: name.into(),
            description: format!("{name}の紹介文"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn engine_with(circles: Vec<Circle>, embeddings: Vec<Vec<f32>>) -> RecommendEngine {
        let catalog = Catalog::from_parts(circles, embeddings).unwrap();
        RecommendEngine::new(catalog, Box::new(StubEmbedder::new()), RecommendConfig::default())
            .unwrap()
    }

    #[test]
    fn category_bonus_ranks_tagged_circle_first() {
        let engine = engine_with(
            vec![circle("コーラス会", &["音楽"]), circle("囲碁クラブ", &[])],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        );

        let outcome = engine.search("音楽がやりたい").unwrap();

        assert_eq!(outcome.category.label, "音楽");
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].circle.name, "コーラス会");
        assert!((outcome.results[0].score.total - 1.25).abs() < 1e-6);
        assert!(outcome.results[1].score.total.abs() < 1e-6);
    }

    #[test]
    fn returns_at_most_top_k_results() {
        let count = 7;
        let circles = (0..count).map(|i| circle(&format!("サークル{i}"), &[])).collect();
        let embeddings = (0..count).map(|_| vec![0.0, 1.0]).collect();
        let engine = engine_with(circles, embeddings);

        let outcome = engine.search("なにかしたい").unwrap();

        assert_eq!(outcome.results.len(), 5);
    }

    #[test]
    fn small_catalogs_are_returned_in_full() {
        let engine = engine_with(
            vec![circle("A", &[]), circle("B", &[]), circle("C", &[])],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        );

        let outcome = engine.search("なにかしたい").unwrap();

        assert_eq!(outcome.results.len(), 3);
        let totals: Vec<f32> = outcome.results.iter().map(|r| r.score.total).collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn equal_scores_preserve_catalog_order() {
        let engine = engine_with(
            vec![circle("先に登録", &[]), circle("後に登録", &[])],
            vec![vec![0.0, 1.0], vec![0.0, 1.0]],
        );

        let outcome = engine.search("なにかしたい").unwrap();

        assert_eq!(outcome.results[0].circle.name, "先に登録");
        assert_eq!(outcome.results[1].circle.name, "後に登録");
    }

    #[test]
    fn search_is_idempotent() {
        let engine = engine_with(
            vec![circle("コーラス会", &["音楽"]), circle("囲碁クラブ", &[])],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        );

        let first = engine.search("音楽がやりたい").unwrap();
        let second = engine.search("音楽がやりたい").unwrap();

        let names = |o: &SearchOutcome| {
            o.results
                .iter()
                .map(|r| (r.circle.name.clone(), r.score.total))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(first.category, second.category);
    }

    #[test]
    fn blank_queries_are_rejected_before_embedding() {
        let engine = engine_with(vec![], vec![]);

        assert_eq!(engine.search("").unwrap_err(), SearchError::EmptyQuery);
        assert_eq!(engine.search("   ").unwrap_err(), SearchError::EmptyQuery);
        assert_eq!(engine.search("　　").unwrap_err(), SearchError::EmptyQuery);
    }

    #[test]
    fn empty_catalog_yields_empty_results() {
        let engine = engine_with(vec![], vec![]);

        let outcome = engine.search("音楽がやりたい").unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.category.label, "音楽");
    }

    #[test]
    fn zero_norm_query_embedding_is_an_input_error() {
        let engine = engine_with(vec![circle("A", &[])], vec![vec![0.0, 1.0]]);

        assert_eq!(
            engine.search("無音のテスト").unwrap_err(),
            SearchError::ZeroNormQuery
        );
    }

    #[test]
    fn rejects_catalog_embedder_dimension_mismatch() {
        let catalog =
            Catalog::from_parts(vec![circle("A", &[])], vec![vec![1.0, 0.0, 0.0]]).unwrap();

        let result = RecommendEngine::new(
            catalog,
            Box::new(StubEmbedder::new()),
            RecommendConfig::default(),
        );

        assert!(matches!(
            result,
            Err(EngineError::DimensionMismatch {
                catalog: 3,
                embedder: 2
            })
        ));
    }

    #[test]
    fn limit_override_truncates_results() {
        let engine = engine_with(
            vec![circle("A", &[]), circle("B", &[]), circle("C", &[])],
            vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]],
        );

        let outcome = engine.search_with_limit("なにかしたい", 1).unwrap();

        assert_eq!(outcome.results.len(), 1);
    }
}
