/// 重み付きトークン
#[derive(Debug, Clone)]
pub struct WeightedToken {
    pub token: String,
    pub weight: f32,
}

impl WeightedToken {
    pub fn new(token: impl Into<String>, weight: f32) -> Self {
        Self {
            token: token.into(),
            weight,
        }
    }
}

/// トークン形式（自由文テキスト方式）
/// - word:<語>       (ASCII 英数字の連なり、小文字化)
/// - cjk:<2文字>     (日本語など非 ASCII 文字列の文字バイグラム)
/// - cjk:<1文字>     (孤立した1文字)
///
/// 記号・空白は区切りとして扱い、トークンには含めない。
pub fn tokenize_text(text: &str) -> Vec<WeightedToken> {
    let mut tokens = Vec::new();
    let mut ascii_word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            flush_cjk(&mut cjk_run, &mut tokens);
            ascii_word.push(ch.to_ascii_lowercase());
        } else if ch.is_alphanumeric() {
            flush_ascii(&mut ascii_word, &mut tokens);
            cjk_run.push(ch);
        } else {
            flush_ascii(&mut ascii_word, &mut tokens);
            flush_cjk(&mut cjk_run, &mut tokens);
        }
    }

    flush_ascii(&mut ascii_word, &mut tokens);
    flush_cjk(&mut cjk_run, &mut tokens);

    tokens
}

fn flush_ascii(word: &mut String, tokens: &mut Vec<WeightedToken>) {
    if !word.is_empty() {
        tokens.push(WeightedToken::new(format!("word:{word}"), 1.0));
        word.clear();
    }
}

fn flush_cjk(run: &mut Vec<char>, tokens: &mut Vec<WeightedToken>) {
    match run.len() {
        0 => {}
        1 => tokens.push(WeightedToken::new(format!("cjk:{}", run[0]), 1.0)),
        _ => {
            for pair in run.windows(2) {
                tokens.push(WeightedToken::new(format!("cjk:{}{}", pair[0], pair[1]), 1.0));
            }
        }
    }
    run.clear();
}
