use crate::embedding::cosine_similarity;
use crate::Circle;

/// カテゴリボーナス（検出カテゴリがタグに含まれる場合の加点）
/// 加算式のため、適用後のスコアは 1.0 を超えうる。
pub const CATEGORY_BONUS: f32 = 0.25;

/// スコアリング設定
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    pub category_bonus: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            category_bonus: CATEGORY_BONUS,
        }
    }
}

/// スコア内訳
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleScore {
    /// コサイン類似度（-1.0〜1.0）
    pub base: f32,
    /// カテゴリボーナス（0.0 または category_bonus）
    pub bonus: f32,
    /// 合計（base + bonus）
    pub total: f32,
}

/// クエリとサークルの類似度にカテゴリボーナスを加えたスコアを返す
///
/// 同一入力に対して常に同一の結果を返す（乱数なし）。
pub fn score_circle(
    query: &[f32],
    circle: &Circle,
    circle_embedding: &[f32],
    detected_label: &str,
    config: &ScoringConfig,
) -> CircleScore {
    let base = cosine_similarity(query, circle_embedding);
    let bonus = if circle.has_tag(detected_label) {
        config.category_bonus
    } else {
        0.0
    };

    CircleScore {
        base,
        bonus,
        total: base + bonus,
    }
}
