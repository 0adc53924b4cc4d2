pub mod api;
pub mod catalog;
pub mod category;
pub mod embedding;
pub mod logging;
pub mod normalize;
pub mod recommend;

use serde::{Deserialize, Serialize};

// Commonly used data models for the recommendation service.

/// サークル基本情報（circles.json の1レコード）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Circle {
    /// タグ一致判定（カテゴリボーナス用）
    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|tag| tag == label)
    }

    /// 埋め込み対象テキスト（名前・紹介文・タグを連結）
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{} {}", self.name, self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }

    /// タグに応じた表示用アイコン（先頭一致優先）
    pub fn icon(&self) -> &'static str {
        if self.has_tag("スポーツ") {
            "⚽"
        } else if self.has_tag("音楽") {
            "🎵"
        } else if self.has_tag("アート") {
            "🎨"
        } else {
            "🌟"
        }
    }
}
