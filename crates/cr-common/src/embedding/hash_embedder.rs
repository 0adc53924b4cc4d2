use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use super::{tokenizer, EmbedderConfig, Embedding, EmbeddingSource, TextEmbedder};
use crate::Circle;

/// 固定 seed（決定論的 hash のため）
/// ⚠️ この値を変更すると全 embedding が変わる → version を上げて再生成すること
const HASH_SEED_K0: u64 = 0x7c0f_3a5d_9b1e_4682;
const HASH_SEED_K1: u64 = 0x2d84_6f1b_c7e9_053a;

/// Feature Hashing を用いた決定論的テキスト埋め込み
///
/// - 学習不要（固定ハッシュ関数）
/// - 高速（O(n) where n = token count）
/// - SipHash13 + 固定 seed で Rust バージョン間の安定性を保証
pub struct HashEmbedder {
    pub config: EmbedderConfig,
}

impl HashEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        let mut cfg = config;
        cfg.dimension = cfg.dimension.max(1);
        Self { config: cfg }
    }

    /// トークンをハッシュして次元インデックスに変換
    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dimension
    }

    /// 重み付きトークン列を埋め込みベクトルに変換
    fn tokens_to_embedding(
        &self,
        tokens: Vec<tokenizer::WeightedToken>,
        source: EmbeddingSource,
    ) -> Embedding {
        let mut vector = vec![0.0f32; self.config.dimension];

        for wt in &tokens {
            let idx = self.hash_token(&wt.token);
            // Sign hashing: 偶数ハッシュ → +weight, 奇数ハッシュ → -weight
            let sign = if self.hash_token(&format!("{}_sign", wt.token)) % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign * wt.weight;
        }

        // L2正規化
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Embedding {
            vector,
            source,
            created_at: chrono::Utc::now(),
        }
    }
}

impl TextEmbedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn version(&self) -> &str {
        // トークン設計やハッシュ seed が変わったらバージョンを上げる
        "v1"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed_query(&self, text: &str) -> Embedding {
        let prefixed = if self.config.query_prefix.is_empty() {
            text.to_string()
        } else {
            format!("{}{}", self.config.query_prefix, text)
        };
        self.tokens_to_embedding(tokenizer::tokenize_text(&prefixed), EmbeddingSource::Query)
    }

    fn embed_circle(&self, circle: &Circle) -> Embedding {
        self.tokens_to_embedding(
            tokenizer::tokenize_text(&circle.embedding_text()),
            EmbeddingSource::Circle,
        )
    }

    fn embed_category(&self, text: &str) -> Embedding {
        self.tokens_to_embedding(tokenizer::tokenize_text(text), EmbeddingSource::Category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    fn circle(name: &str, description: &str) -> Circle {
        Circle {
            name: name.into(),
            description: description.into(),
            tags: vec![],
        }
    }

    #[test]
    fn produces_normalized_vectors() {
        let embedder = HashEmbedder::new(EmbedderConfig::default());

        let emb = embedder.embed_query("サッカーがしたい");

        let norm: f32 = emb.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 1e-5,
            "L2 norm should be 1.0, got {}",
            norm
        );
    }

    #[test]
    fn identical_text_embeds_identically() {
        let embedder = HashEmbedder::new(EmbedderConfig::default());

        let first = embedder.embed_query("絵を描きたい");
        let second = embedder.embed_query("絵を描きたい");

        assert_eq!(first.vector, second.vector);
    }

    #[test]
    fn similar_text_has_higher_similarity() {
        let embedder = HashEmbedder::new(EmbedderConfig::default());

        let query = embedder.embed_query("サッカーがしたい");
        let soccer = embedder.embed_circle(&circle(
            "稲城サッカークラブ",
            "週末にサッカーの練習と試合をしています",
        ));
        let chorus = embedder.embed_circle(&circle("合唱団", "童謡や唱歌をみんなで歌います"));

        let soccer_score = cosine_similarity(&query.vector, &soccer.vector);
        let chorus_score = cosine_similarity(&query.vector, &chorus.vector);

        assert!(
            soccer_score > chorus_score,
            "soccer circle should score higher: {} vs {}",
            soccer_score,
            chorus_score
        );
    }

    #[test]
    fn query_prefix_only_affects_queries() {
        let plain = HashEmbedder::new(EmbedderConfig::default());
        let prefixed = HashEmbedder::new(EmbedderConfig {
            query_prefix: "query: ".into(),
            ..EmbedderConfig::default()
        });

        assert_ne!(
            plain.embed_query("山歩き").vector,
            prefixed.embed_query("山歩き").vector
        );
        assert_eq!(
            plain.embed_category("山歩き").vector,
            prefixed.embed_category("山歩き").vector
        );
    }

    #[test]
    fn dimension_is_clamped_to_at_least_one() {
        let embedder = HashEmbedder::new(EmbedderConfig {
            dimension: 0,
            ..EmbedderConfig::default()
        });

        assert_eq!(embedder.dimension(), 1);
    }
}
