//! Lexical tables used by the extractor
//!
//! Everything here is read-only once built. One `Lexicon` is created at
//! startup and shared by reference across page workers.

pub mod categories;

pub use categories::{Category, CategoryTable};

/// Substrings that mark a line as boilerplate (case-insensitive).
const NOISE_FRAGMENTS: &[&str] = &[
    "www.", ".com", ".eg", "http", "kazyon", "كازيون", "ماركت", "market", "page", "valid",
];

const MONTHS_AR: &[&str] = &[
    "يناير", "فبراير", "مارس", "ابريل", "أبريل", "مايو", "يونيو", "يوليو", "اغسطس", "أغسطس",
    "سبتمبر", "اكتوبر", "أكتوبر", "نوفمبر", "ديسمبر",
];

const MONTHS_EN: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

const WEEKDAYS: &[&str] = &[
    "خميس", "الخميس", "جمعة", "الجمعة", "سبت", "السبت", "احد", "الاحد", "الأحد", "اثنين",
    "الاثنين", "الإثنين", "ثلاثاء", "الثلاثاء", "اربعاء", "الاربعاء", "الأربعاء",
];

/// Connectors of validity ranges ("من ... حتى ...").
const DATE_WORDS: &[&str] = &["حتى", "من", "الى", "إلى"];

const STORE_WORDS: &[&str] = &["bim"];

const CURRENCY_TOKENS: &[&str] = &["جنيه", "ج.م", "جم", "egp", "le", "pound", "pounds"];

const UNIT_TOKENS: &[&str] = &[
    "kg", "g", "gm", "l", "ml", "كجم", "كيلو", "جرام", "لتر", "مل",
];

const DISCOUNT_WORDS: &[&str] = &[
    "خصم", "تخفيض", "وفر", "توفير", "off", "discount", "save", "sale",
];

const PRODUCT_KEYWORDS: &[&str] = &[
    "دجاج", "لحم", "برجر", "جبنة", "زبدة", "لبن", "حليب", "زيت", "أرز", "مكرونة", "سكر", "شاي",
    "قهوة", "عصير", "مياه", "صابون", "شامبو", "منظف", "معجون", "بسكويت", "شيكولاتة", "تونة",
    "سمك", "بيض", "خضار", "فاكهة", "طماطم", "بطاطس", "فول", "عدس", "فاصوليا", "بازلاء", "ذرة",
    "خبز", "توست", "مجمد", "طازج", "معلب", "بانيه", "صدور", "اوراك", "مشكل", "كجم", "جرام",
    "لتر", "مل", "قطعة", "علبة", "كيس", "عبوة",
];

#[derive(Debug, Clone)]
pub struct Lexicon {
    noise_fragments: Vec<String>,
    noise_words: Vec<String>,
    months: Vec<String>,
    currency: Vec<String>,
    units: Vec<String>,
    discount_words: Vec<String>,
    product_keywords: Vec<String>,
    categories: CategoryTable,
}

impl Default for Lexicon {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>();

        let months: Vec<String> = owned(MONTHS_AR).into_iter().chain(owned(MONTHS_EN)).collect();
        let noise_words = months
            .iter()
            .cloned()
            .chain(owned(WEEKDAYS))
            .chain(owned(DATE_WORDS))
            .chain(owned(STORE_WORDS))
            .collect();

        Self {
            noise_fragments: owned(NOISE_FRAGMENTS),
            noise_words,
            months,
            currency: owned(CURRENCY_TOKENS),
            units: owned(UNIT_TOKENS),
            discount_words: owned(DISCOUNT_WORDS),
            product_keywords: owned(PRODUCT_KEYWORDS),
            categories: CategoryTable::default(),
        }
    }
}

impl Lexicon {
    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Domain fragments, dates, weekdays and store boilerplate.
    pub fn is_noise(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        if self.noise_fragments.iter().any(|f| lowered.contains(f.as_str())) {
            return true;
        }
        let has_noise_word = words(&lowered).any(|w| contains(&self.noise_words, w));
        has_noise_word
    }

    pub fn is_month(&self, word: &str) -> bool {
        contains(&self.months, &word.to_lowercase())
    }

    /// Whether any word of `line` is a month name.
    pub fn mentions_month(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        let found = words(&lowered).any(|w| contains(&self.months, w));
        found
    }

    pub fn is_currency(&self, word: &str) -> bool {
        contains(&self.currency, &word.to_lowercase())
    }

    pub fn is_unit(&self, word: &str) -> bool {
        contains(&self.units, &word.to_lowercase())
    }

    pub fn is_discount_word(&self, word: &str) -> bool {
        contains(&self.discount_words, &word.to_lowercase())
    }

    pub fn has_product_keyword(&self, line: &str) -> bool {
        self.product_keywords.iter().any(|k| line.contains(k.as_str()))
    }
}

fn contains(list: &[String], word: &str) -> bool {
    list.iter().any(|w| w == word)
}

/// Split on anything that is not a letter, digit or '.'.
///
/// Keeping '.' inside words lets `ج.م` survive as a single token.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
}

/// Arabic script block
pub fn has_arabic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}
