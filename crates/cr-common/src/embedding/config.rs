#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// 埋め込み次元数（2のべき乗推奨: 256, 512, 1024）
    pub dimension: usize,
    /// クエリ埋め込み時に付与する接頭辞
    ///
    /// e5 系モデルはクエリに "query: " を付けて埋め込む約束になっている。
    /// hash 埋め込みでは不要なので既定は空。
    pub query_prefix: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            query_prefix: String::new(),
        }
    }
}
