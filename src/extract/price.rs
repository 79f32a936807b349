//! Price and discount tokens
//!
//! Lines are normalized first (Arabic-Indic digits, Arabic separators, `;`
//! read in place of a decimal point), then four shapes are tried in order and
//! the first that matches wins:
//!
//! 1. number followed by a currency token: `25.99 جنيه`, `8.50 EGP`
//! 2. currency token followed by a number: `LE 45`
//! 3. 2-3 digit integer with 1-2 decimals: `19.95`, `34,95`
//! 4. bare 2-4 digit integer, unless a month name or unit follows it
//!
//! A number directly followed by `%` is never a price.

use regex::{Match, Regex};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::lexicon::{self, Lexicon};

re!(re_currency_suffix,
    r"(?i)([0-9]+(?:[.,][0-9]+)?)\s*(?:جنيه\w*|ج\.م|جم|egp|le|pounds?)\b");
re!(re_currency_prefix,
    r"(?i)\b(?:جنيه|ج\.م|جم|egp|le|pounds?)\s*([0-9]+(?:[.,][0-9]+)?)\b");
re!(re_decimal,
    r"\b([0-9]{2,3}[.,][0-9]{1,2})\b");
re!(re_bare_integer,
    r"\b([0-9]{2,4})\b");
re!(re_percent,
    r"([0-9]+(?:\.[0-9]+)?)\s*%");

/// Which pattern produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceShape {
    CurrencySuffix,
    CurrencyPrefix,
    Decimal,
    BareInteger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceToken {
    pub value: Decimal,
    pub shape: PriceShape,
}

/// Map Arabic-Indic and Persian digits to ASCII, fix OCR'd separators and
/// drop thousands grouping (`١٬٢٩٩`, `1,299`, `1.299,00` all read as 1299).
pub fn normalize_numerals(text: &str) -> String {
    let chars: Vec<char> = text
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => shift_digit(c, '\u{0660}'),
            '\u{06F0}'..='\u{06F9}' => shift_digit(c, '\u{06F0}'),
            '٫' | ';' => '.',
            '،' => ',',
            '٪' => '%',
            _ => c,
        })
        .collect();

    chars
        .iter()
        .enumerate()
        .filter(|(i, _)| !is_group_separator(&chars, *i))
        .map(|(_, c)| *c)
        .collect()
}

fn shift_digit(c: char, zero: char) -> char {
    char::from_digit(c as u32 - zero as u32, 10).unwrap_or(c)
}

/// `٬` after a digit, or `,`/`.` after a digit and followed by exactly three digits.
fn is_group_separator(chars: &[char], i: usize) -> bool {
    if i == 0 || !chars[i - 1].is_ascii_digit() {
        return false;
    }
    match chars[i] {
        '\u{066C}' => chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()),
        '.' | ',' => chars[i + 1..].iter().take_while(|c| c.is_ascii_digit()).count() == 3,
        _ => false,
    }
}

/// First price on `line`, before any range check.
pub fn parse_price(line: &str, lexicon: &Lexicon) -> Option<PriceToken> {
    let text = prepare(line, lexicon);

    if let Some(m) = first_capture(re_currency_suffix(), &text, |_| true) {
        return token(m.as_str(), PriceShape::CurrencySuffix);
    }
    if let Some(m) = first_capture(re_currency_prefix(), &text, |m| !followed_by_percent(&text, m)) {
        return token(m.as_str(), PriceShape::CurrencyPrefix);
    }
    if let Some(m) = first_capture(re_decimal(), &text, |m| {
        !followed_by_percent(&text, m) && !followed_by_unit(&text, m, lexicon)
    }) {
        return token(m.as_str(), PriceShape::Decimal);
    }
    if let Some(m) = first_capture(re_bare_integer(), &text, |m| is_standalone_integer(&text, m, lexicon)) {
        return token(m.as_str(), PriceShape::BareInteger);
    }
    None
}

/// `N%` on the line, if it is a usable discount (strictly between 0 and 100).
pub fn parse_discount(line: &str) -> Option<Decimal> {
    let text = normalize_numerals(line);
    let caps = re_percent().captures(&text)?;
    let value = Decimal::from_str(caps.get(1)?.as_str()).ok()?;
    (value > Decimal::ZERO && value < Decimal::ONE_HUNDRED).then_some(value)
}

/// A line that only announces a discount: percent token plus discount words.
pub fn is_discount_line(line: &str, lexicon: &Lexicon) -> bool {
    let text = normalize_numerals(line);
    if !re_percent().is_match(&text) {
        return false;
    }
    let rest = re_percent().replace_all(&text, " ");
    let only_discount_words = lexicon::words(&rest).all(|w| lexicon.is_discount_word(w));
    only_discount_words
}

/// Pre-discount price, rounded half away from zero to 2 decimals.
///
/// `None` when the rounded result would not exceed `price`.
pub fn original_price(price: Decimal, discount_percent: Decimal) -> Option<Decimal> {
    let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
    if factor <= Decimal::ZERO {
        return None;
    }
    let original = price
        .checked_div(factor)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (original > price).then_some(original)
}

fn prepare(line: &str, lexicon: &Lexicon) -> String {
    normalize_numerals(line)
        .split_whitespace()
        .map(|t| unglue(t, lexicon))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop Latin letter runs stuck to either end of a numeric token ("995Salg").
/// Currency and unit suffixes stay attached.
fn unglue<'t>(token: &'t str, lexicon: &Lexicon) -> &'t str {
    if !token.chars().any(|c| c.is_ascii_digit()) {
        return token;
    }

    let mut t = token;
    let body = t.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let lead = &t[..t.len() - body.len()];
    if !lead.is_empty() && !body.is_empty() && !lexicon.is_currency(lead) {
        t = body;
    }

    let body = t.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let trail = &t[body.len()..];
    if !trail.is_empty() && !body.is_empty() && !lexicon.is_currency(trail) && !lexicon.is_unit(trail) {
        t = body;
    }
    t
}

fn first_capture<'t>(
    re: &Regex,
    text: &'t str,
    accept: impl Fn(&Match<'t>) -> bool,
) -> Option<Match<'t>> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .find(|m| accept(m))
}

fn token(raw: &str, shape: PriceShape) -> Option<PriceToken> {
    let value = Decimal::from_str(&raw.replace(',', ".")).ok()?;
    Some(PriceToken { value, shape })
}

fn followed_by_percent(text: &str, m: &Match) -> bool {
    text[m.end()..].trim_start().starts_with('%')
}

fn is_standalone_integer(text: &str, m: &Match, lexicon: &Lexicon) -> bool {
    if followed_by_percent(text, m) {
        return false;
    }

    let before = text[..m.start()].chars().next_back();
    let mut after = text[m.end()..].chars();
    let next = after.next();

    // part of a decimal, a date like 12/2024 or a time
    if matches!(before, Some('.' | ',' | '/' | ':')) {
        return false;
    }
    match next {
        Some('/' | ':') => return false,
        Some('.' | ',') if after.next().is_some_and(|c| c.is_ascii_digit()) => return false,
        _ => {}
    }

    // "15 ديسمبر" is a date, "400 جرام" a size
    !lexicon::words(&text[m.end()..])
        .next()
        .is_some_and(|w| lexicon.is_month(w) || lexicon.is_unit(w))
}

fn followed_by_unit(text: &str, m: &Match, lexicon: &Lexicon) -> bool {
    lexicon::words(&text[m.end()..])
        .next()
        .is_some_and(|w| lexicon.is_unit(w))
}
