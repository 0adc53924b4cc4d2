use serde::Deserialize;

/// HTTP APIからの検索リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// 自由文クエリ（例: サッカーがしたい）
    pub query: String,
    /// 返却件数の上書き（省略時はサーバ既定値）
    #[serde(default)]
    pub limit: Option<usize>,
}
