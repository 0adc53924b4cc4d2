use crate::embedding::{cosine_similarity, Embedding, TextEmbedder};

/// 固定カテゴリ定義（ラベル, 代表文）
///
/// 並び順は検出時の同点タイブレークに使われる（先勝ち）。
pub const CATEGORY_DEFS: [(&str, &str); 5] = [
    ("スポーツ", "体を動かすスポーツや運動を楽しむ活動"),
    ("音楽", "楽器の演奏や歌など音楽を楽しむ活動"),
    ("アート", "絵を描いたり工芸などの創作を楽しむ活動"),
    ("学び", "語学や歴史など教養を学ぶ活動"),
    ("交流", "地域の仲間と集まって親睦を深める活動"),
];

/// カテゴリ（ラベル + 代表文 + 埋め込み）
#[derive(Debug, Clone)]
pub struct Category {
    pub label: &'static str,
    pub representative_text: &'static str,
    pub embedding: Embedding,
}

/// 検出結果（最近傍カテゴリとその類似度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedCategory {
    pub label: &'static str,
    pub score: f32,
}

/// 起動時に一度だけ構築される固定カテゴリ集合
#[derive(Debug, Clone)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    /// 代表文を埋め込んでカテゴリ集合を構築する
    pub fn build(embedder: &dyn TextEmbedder) -> Self {
        let categories = CATEGORY_DEFS
            .iter()
            .map(|(label, text)| Category {
                label,
                representative_text: text,
                embedding: embedder.embed_category(text),
            })
            .collect();

        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// クエリ埋め込みに最も近いカテゴリを返す（同点は宣言順で先勝ち）
    ///
    /// カテゴリ集合は定義上空にならないため、常に結果を返す。
    pub fn detect(&self, query: &Embedding) -> DetectedCategory {
        let mut best = DetectedCategory {
            label: self.categories[0].label,
            score: f32::NEG_INFINITY,
        };

        for category in &self.categories {
            let score = cosine_similarity(&query.vector, &category.embedding.vector);
            if score > best.score {
                best = DetectedCategory {
                    label: category.label,
                    score,
                };
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingSource;
    use crate::Circle;

    /// 代表文に "音楽" を含むカテゴリだけ [1,0]、それ以外は [0,1] を返すスタブ
    struct StubEmbedder;

    impl StubEmbedder {
        fn vector_for(text: &str) -> Vec<f32> {
            if text.contains("音楽") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
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
            2
        }

        fn embed_query(&self, text: &str) -> Embedding {
            Embedding {
                vector: Self::vector_for(text),
                source: EmbeddingSource::Query,
                created_at: chrono::Utc::now(),
            }
        }

        fn embed_circle(&self, circle: &Circle) -> Embedding {
            Embedding {
                vector: Self::vector_for(&circle.embedding_text()),
                source: EmbeddingSource::Circle,
                created_at: chrono::Utc::now(),
            }
        }

        fn embed_category(&self, text: &str) -> Embedding {
            Embedding {
                vector: Self::vector_for(text),
                source: EmbeddingSource::Category,
                created_at: chrono::Utc::now(),
            }
        }
    }

    #[test]
    fn detects_nearest_category() {
        let categories = CategorySet::build(&StubEmbedder);

        let detected = categories.detect(&StubEmbedder.embed_query("音楽がやりたい"));

        assert_eq!(detected.label, "音楽");
        assert!((detected.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_resolve_to_declaration_order() {
        let categories = CategorySet::build(&StubEmbedder);

        // [0,1] は音楽以外の4カテゴリと同点になる → 宣言順で最初のスポーツが勝つ
        let detected = categories.detect(&StubEmbedder.embed_query("なにかしたい"));

        assert_eq!(detected.label, "スポーツ");
        assert!((detected.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn builds_all_fixed_categories() {
        let categories = CategorySet::build(&StubEmbedder);

        let labels: Vec<_> = categories.categories().iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["スポーツ", "音楽", "アート", "学び", "交流"]);
    }
}
