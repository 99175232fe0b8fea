use once_cell::sync::Lazy;
use regex::Regex;

static NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+|[^a-zA-Z\s]").expect("noise pattern compiles"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Lowercases, strips URLs and anything that is not an ASCII letter or
/// whitespace, then collapses runs of whitespace.
pub fn preprocess_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NOISE.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
