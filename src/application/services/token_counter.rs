use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("Failed to initialize cl100k_base tokenizer")
});

pub fn count_tokens(text: &str) -> usize {
    TOKENIZER.encode_with_special_tokens(text).len()
}

/// Cuts `text` down to at most `max_tokens` cl100k tokens.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let tokens = TOKENIZER.encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }

    match TOKENIZER.decode(tokens.into_iter().take(max_tokens).collect()) {
        Ok(truncated) => truncated,
        Err(e) => {
            tracing::warn!(error = %e, "Token-boundary truncation failed, falling back to chars");
            text.chars().take(max_tokens * 4).collect()
        }
    }
}
