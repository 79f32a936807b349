//! Name candidates and name cleaning

use crate::config::ExtractionConfig;
use crate::lexicon::{self, Lexicon};

use super::price::normalize_numerals;

const PUNCTUATION: &[char] = &[';', ':', ',', '.', '*', '+', '-', '|', '[', ']', '(', ')'];

/// Whether a raw line may name the product of a nearby price.
///
/// Price anchors and discount lines are excluded by the caller.
pub fn is_candidate(line: &str, lexicon: &Lexicon, config: &ExtractionConfig) -> bool {
    let len = line.chars().count();
    if len < 3 || len > config.max_name_len {
        return false;
    }
    if lexicon.is_noise(line) {
        return false;
    }

    let normalized = normalize_numerals(line);
    if normalized
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '.' || c == ',')
    {
        return false;
    }

    if config.require_arabic_name {
        lexicon::has_arabic(line)
    } else {
        lexicon::has_arabic(line)
            || lexicon.has_product_keyword(line)
            || line.chars().filter(|c| c.is_alphabetic()).count() > 3
    }
}

/// Strip OCR debris from a name line.
///
/// Short Latin fragments are dropped from Arabic names (unit tokens such as
/// `kg` survive), punctuation runs become spaces except decimal points inside
/// numbers, and a purely numeric first or last token is removed.
pub fn clean(name: &str, lexicon: &Lexicon) -> String {
    let normalized = normalize_numerals(name);
    let punctuated = replace_punctuation(&normalized);
    let arabic = lexicon::has_arabic(&punctuated);

    let mut tokens: Vec<&str> = punctuated
        .split_whitespace()
        .filter(|t| !(arabic && is_latin_fragment(t) && !lexicon.is_unit(t)))
        .collect();

    if tokens.first().is_some_and(|t| is_number(t)) {
        tokens.remove(0);
    }
    if tokens.last().is_some_and(|t| is_number(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}

/// Weight or volume token inside `name`: `1 كجم`, `500ml`, `1.5 لتر`.
pub fn find_size(name: &str, lexicon: &Lexicon) -> Option<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();

    for (i, tok) in tokens.iter().enumerate() {
        let split = numeric_prefix_len(tok);
        if split == 0 {
            continue;
        }
        let (number, unit) = tok.split_at(split);
        if unit.is_empty() {
            if let Some(next) = tokens.get(i + 1).filter(|n| lexicon.is_unit(n)) {
                return Some(format!("{} {}", number, next));
            }
        } else if lexicon.is_unit(unit) {
            return Some(tok.to_string());
        }
    }
    None
}

fn replace_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if !PUNCTUATION.contains(&c) {
            out.push(c);
            continue;
        }
        let between_digits = i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if between_digits && (c == '.' || c == ',') {
            out.push('.');
        } else {
            out.push(' ');
        }
    }
    out
}

fn is_latin_fragment(token: &str) -> bool {
    let len = token.chars().count();
    (1..=3).contains(&len) && token.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_number(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}

fn numeric_prefix_len(token: &str) -> usize {
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return 0;
    }
    let end = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    token[..end].trim_end_matches('.').len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(line: &str) -> bool {
        is_candidate(line, &Lexicon::default(), &ExtractionConfig::default())
    }

    #[test]
    fn test_candidate_needs_arabic() {
        assert!(candidate("حليب المراعي"));
        assert!(!candidate("Almarai milk"));
    }

    #[test]
    fn test_candidate_rejects_numbers_noise_and_length() {
        assert!(!candidate("25.99"));
        assert!(!candidate("١٢٣"));
        assert!(!candidate("كازيون"));
        assert!(!candidate("ديسمبر 2024"));
        assert!(!candidate("لب"));
        assert!(!candidate(&"جبنة ".repeat(30)));
    }

    #[test]
    fn test_latin_names_allowed_when_arabic_not_required() {
        let config = ExtractionConfig {
            require_arabic_name: false,
            ..ExtractionConfig::default()
        };
        assert!(is_candidate("Almarai milk", &Lexicon::default(), &config));
        assert!(!is_candidate("ab 12", &Lexicon::default(), &config));
    }

    #[test]
    fn test_clean_strips_fragments_and_edge_numbers() {
        let lexicon = Lexicon::default();
        assert_eq!(clean("12 جبنة رومي ab 3", &lexicon), "جبنة رومي");
        assert_eq!(clean("زيت عباد الشمس ** 1.5 لتر", &lexicon), "زيت عباد الشمس 1.5 لتر");
        assert_eq!(clean("(شاي) - ليبتون | 100", &lexicon), "شاي ليبتون");
    }

    #[test]
    fn test_clean_keeps_units_and_latin_names() {
        let lexicon = Lexicon::default();
        assert_eq!(clean("عصير جهينة 1 l", &lexicon), "عصير جهينة 1 l");
        // nothing Arabic: short words are real words, not OCR debris
        assert_eq!(clean("Tea bag box", &lexicon), "Tea bag box");
    }

    #[test]
    fn test_clean_normalizes_digits() {
        let lexicon = Lexicon::default();
        assert_eq!(clean("أرز ٢ كجم", &lexicon), "أرز 2 كجم");
    }

    #[test]
    fn test_find_size() {
        let lexicon = Lexicon::default();
        assert_eq!(find_size("أرز 2 كجم", &lexicon).as_deref(), Some("2 كجم"));
        assert_eq!(find_size("شامبو 400ml", &lexicon).as_deref(), Some("400ml"));
        assert_eq!(find_size("زيت 1.5 لتر", &lexicon).as_deref(), Some("1.5 لتر"));
        assert_eq!(find_size("جبنة رومي", &lexicon), None);
        assert_eq!(find_size("عرض 3 قطع", &lexicon), None);
    }
}
