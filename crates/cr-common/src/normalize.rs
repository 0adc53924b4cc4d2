use once_cell::sync::Lazy;
use regex::Regex;

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// 検索クエリの正規化（前後の空白除去と連続空白の圧縮）
///
/// 全角スペース（U+3000）も空白として扱う。正規化後に空になる入力は
/// 空文字を返し、呼び出し側が入力エラーとして扱う。
pub fn normalize_query(input: &str) -> String {
    RE_SPACES.replace_all(input, " ").trim().to_string()
}
