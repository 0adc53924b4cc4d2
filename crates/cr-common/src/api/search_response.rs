use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recommend::{RankedCircle, SearchOutcome};

/// GUI向け検索レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// 正規化済みクエリ
    pub query: String,
    /// 検出カテゴリ
    pub category: DetectedCategoryDto,
    /// ランキング結果（スコア降順）。空のときは該当なし。
    pub results: Vec<CircleResult>,
    /// カタログ全体のサークル数（画面表示用）
    pub circle_count: usize,
    /// 埋め込み実装名
    pub embedder: String,
    /// 埋め込みバージョン（空間の世代管理用）
    pub embedder_version: String,
    pub searched_at: DateTime<Utc>,
}

/// 検出カテゴリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedCategoryDto {
    pub label: String,
    /// クエリとの類似度（-1.0〜1.0）
    pub score: f32,
}

/// ランキング1件分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleResult {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// タグに応じた表示用アイコン
    pub icon: String,
    /// 合計スコア（base_score + category_bonus）
    pub score: f32,
    /// コサイン類似度
    pub base_score: f32,
    /// カテゴリボーナス（0.0 または加点値）
    pub category_bonus: f32,
}

impl SearchResponse {
    /// エンジンの検索結果からレスポンスを構築する
    pub fn from_outcome(
        outcome: SearchOutcome,
        circle_count: usize,
        embedder: &str,
        embedder_version: &str,
        searched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query: outcome.query,
            category: DetectedCategoryDto {
                label: outcome.category.label.to_string(),
                score: outcome.category.score,
            },
            results: outcome.results.iter().map(CircleResult::from).collect(),
            circle_count,
            embedder: embedder.to_string(),
            embedder_version: embedder_version.to_string(),
            searched_at,
        }
    }
}

impl From<&RankedCircle> for CircleResult {
    fn from(ranked: &RankedCircle) -> Self {
        Self {
            name: ranked.circle.name.clone(),
            description: ranked.circle.description.clone(),
            tags: ranked.circle.tags.clone(),
            icon: ranked.circle.icon().to_string(),
            score: ranked.score.total,
            base_score: ranked.score.base,
            category_bonus: ranked.score.bonus,
        }
    }
}
