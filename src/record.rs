use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bilingual category assigned to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub id: String,
    pub ar: String,
    pub en: String,
}

/// One product recovered from a flyer page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Cleaned name line
    pub name: String,
    /// Always within the configured price band
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub discount_percent: Option<Decimal>,
    /// `price / (1 - discount / 100)`, two decimals
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_price: Option<Decimal>,
    /// Weight or volume token found in the name, e.g. "1 كجم"
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<String>,
    pub category: CategoryLabel,
    /// 1-based page number, set by the orchestrator
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<usize>,
}
