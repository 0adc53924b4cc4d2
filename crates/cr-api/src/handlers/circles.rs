use axum::{extract::State, Json};
use serde::Serialize;

use crate::SharedState;

/// カタログ一覧レスポンス（サークル数の画面表示用）
#[derive(Debug, Serialize)]
pub struct CircleListResponse {
    pub count: usize,
    pub circles: Vec<CircleSummary>,
}

#[derive(Debug, Serialize)]
pub struct CircleSummary {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub icon: String,
}

/// 読み込み済みサークルをカタログ順で返す
pub async fn list_circles(State(state): State<SharedState>) -> Json<CircleListResponse> {
    let circles = state
        .engine
        .catalog()
        .circles()
        .iter()
        .map(|circle| CircleSummary {
            name: circle.name.clone(),
            description: circle.description.clone(),
            tags: circle.tags.clone(),
            icon: circle.icon().to_string(),
        })
        .collect::<Vec<_>>();

    Json(CircleListResponse {
        count: circles.len(),
        circles,
    })
}

/// カテゴリ一覧レスポンス
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub label: String,
    pub representative_text: String,
}

/// 固定カテゴリを宣言順で返す
pub async fn list_categories(State(state): State<SharedState>) -> Json<CategoryListResponse> {
    let categories = state
        .engine
        .categories()
        .categories()
        .iter()
        .map(|category| CategorySummary {
            label: category.label.to_string(),
            representative_text: category.representative_text.to_string(),
        })
        .collect();

    Json(CategoryListResponse { categories })
}
