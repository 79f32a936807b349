//! Structured extraction of product records from recognized text
//!
//! One forward pass over the lines: every line with a valid price becomes an
//! anchor, and the closest acceptable name line inside a small window around
//! it becomes the product name. Name lines are not consumed, so two anchors
//! may share one name.

use rust_decimal::Decimal;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod name;
pub mod price;

use crate::config::ExtractionConfig;
use crate::lexicon::Lexicon;
use crate::record::ProductRecord;

use price::PriceShape;

/// Per-line facts gathered before anchors are resolved
#[derive(Debug)]
struct Line {
    price: Option<Decimal>,
    discount: Option<Decimal>,
    discount_only: bool,
    /// Cleaned name, if the line can serve as one
    name: Option<String>,
}

pub struct Extractor<'a> {
    lexicon: &'a Lexicon,
    config: &'a ExtractionConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a ExtractionConfig) -> Self {
        Self { lexicon, config }
    }

    /// Extract every product record from `text`, in anchor order.
    pub fn extract(&self, text: &str) -> Vec<ProductRecord> {
        let lines = self.scan(text);
        let mut records = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(price) = line.price else {
                continue;
            };

            let Some(product) = self.nearest(&lines, i, |l| l.name.as_deref()) else {
                tracing::trace!("Price {} on line {} has no name nearby", price, i);
                continue;
            };

            let discount = line
                .discount
                .or_else(|| self.nearest(&lines, i, |l| l.discount.filter(|_| l.discount_only)));
            let original_price = discount.and_then(|d| price::original_price(price, d));
            // a discount that can't produce a higher original price is dropped with it
            let discount = discount.filter(|_| original_price.is_some());

            let category = self.lexicon.categories().classify(product).label();

            records.push(ProductRecord {
                name: product.to_string(),
                price,
                discount_percent: discount,
                original_price,
                size: name::find_size(product, self.lexicon),
                category,
                page: None,
            });
        }

        records
    }

    fn scan(&self, text: &str) -> Vec<Line> {
        let raw: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| l.chars().count() > 1)
            .collect();

        let mut lines = Vec::with_capacity(raw.len());
        for (r, text) in raw.iter().enumerate() {
            if self.lexicon.is_noise(text) {
                continue;
            }

            let follows_date = r > 0 && self.lexicon.mentions_month(raw[r - 1]);
            let price = self.valid_price(text, follows_date);
            let discount_only = price::is_discount_line(text, self.lexicon);

            let name = if price.is_none() && !discount_only {
                self.name_for(text)
            } else {
                None
            };

            lines.push(Line {
                price,
                discount: price::parse_discount(text),
                discount_only,
                name,
            });
        }
        lines
    }

    /// Price on the line if it's in the band and doesn't look like part of a date.
    fn valid_price(&self, text: &str, follows_date: bool) -> Option<Decimal> {
        let token = price::parse_price(text, self.lexicon)?;

        if token.shape == PriceShape::BareInteger && follows_date {
            tracing::trace!("Rejecting {} under a date line", token.value);
            return None;
        }
        if token.value < self.config.min_price || token.value > self.config.max_price {
            tracing::trace!("Rejecting {} outside price band", token.value);
            return None;
        }
        Some(token.value)
    }

    fn name_for(&self, text: &str) -> Option<String> {
        if !name::is_candidate(text, self.lexicon, self.config) {
            return None;
        }
        let cleaned = name::clean(text, self.lexicon);
        let len = cleaned.chars().count();
        (len >= 3 && len <= self.config.max_name_len).then_some(cleaned)
    }

    /// Closest line in the anchor window for which `pick` yields a value.
    ///
    /// Lines above are scanned before lines below, so at equal distance the
    /// line above wins.
    fn nearest<'l, T>(
        &self,
        lines: &'l [Line],
        anchor: usize,
        pick: impl Fn(&'l Line) -> Option<T>,
    ) -> Option<T> {
        let start = anchor.saturating_sub(self.config.window_before);
        let end = (anchor + self.config.window_after).min(lines.len().saturating_sub(1));

        (start..anchor)
            .chain(anchor + 1..=end)
            .filter_map(|j| pick(&lines[j]).map(|v| (anchor.abs_diff(j), v)))
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, v)| v)
    }
}
