//! Grocery category table

use serde::Serialize;

use crate::record::CategoryLabel;

/// One row of the category table
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub label_ar: &'static str,
    pub label_en: &'static str,
    #[serde(skip)]
    pub keywords_ar: &'static [&'static str],
    #[serde(skip)]
    pub keywords_en: &'static [&'static str],
}

impl Category {
    pub fn label(&self) -> CategoryLabel {
        CategoryLabel {
            id: self.id.to_string(),
            ar: self.label_ar.to_string(),
            en: self.label_en.to_string(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords_ar.iter().any(|k| lowered.contains(k))
            || self.keywords_en.iter().any(|k| lowered.contains(k))
    }
}

pub const OTHER_ID: &str = "other";

const OTHER: Category = Category {
    id: OTHER_ID,
    label_ar: "منتجات أخرى",
    label_en: "Other Products",
    keywords_ar: &[],
    keywords_en: &[],
};

const STANDARD: &[Category] = &[
    Category {
        id: "dairy",
        label_ar: "منتجات الألبان",
        label_en: "Dairy Products",
        keywords_ar: &["حليب", "لبن", "جبن", "زبادي", "روب", "قشطة", "زبدة", "جبنة"],
        keywords_en: &["milk", "cheese", "yogurt", "butter", "cream", "dairy"],
    },
    Category {
        id: "meat",
        label_ar: "اللحوم والدواجن",
        label_en: "Meat & Poultry",
        keywords_ar: &["لحم", "دجاج", "فراخ", "بيف", "كفتة", "سجق", "همبرجر"],
        keywords_en: &["meat", "chicken", "beef", "poultry", "burger", "sausage"],
    },
    Category {
        id: "fish",
        label_ar: "الأسماك والمأكولات البحرية",
        label_en: "Fish & Seafood",
        keywords_ar: &["سمك", "جمبري", "كابوريا", "تونة"],
        keywords_en: &["fish", "shrimp", "tuna", "seafood", "salmon"],
    },
    Category {
        id: "fruits",
        label_ar: "الفواكه",
        label_en: "Fruits",
        keywords_ar: &["تفاح", "موز", "برتقال", "عنب", "فراولة", "مانجو", "بطيخ", "فاكهة"],
        keywords_en: &["apple", "banana", "orange", "grape", "strawberry", "mango", "fruit"],
    },
    Category {
        id: "vegetables",
        label_ar: "الخضروات",
        label_en: "Vegetables",
        keywords_ar: &["طماطم", "بطاطس", "خيار", "جزر", "بصل", "خضار", "فلفل", "كوسة"],
        keywords_en: &["tomato", "potato", "cucumber", "carrot", "onion", "vegetable", "pepper"],
    },
    Category {
        id: "bakery",
        label_ar: "المخبوزات",
        label_en: "Bakery",
        keywords_ar: &["خبز", "عيش", "كيك", "بسكويت", "كرواسون"],
        keywords_en: &["bread", "cake", "cookie", "biscuit", "croissant", "bakery"],
    },
    Category {
        id: "rice",
        label_ar: "الأرز والمكرونة",
        label_en: "Rice & Pasta",
        keywords_ar: &["أرز", "رز", "مكرونة", "معكرونة", "باستا", "شعرية"],
        keywords_en: &["rice", "pasta", "noodles", "spaghetti", "macaroni"],
    },
    Category {
        id: "oils",
        label_ar: "الزيوت والسمن",
        label_en: "Oils & Ghee",
        keywords_ar: &["زيت", "سمن", "زبدة"],
        keywords_en: &["oil", "ghee", "butter", "margarine"],
    },
    Category {
        id: "beverages",
        label_ar: "المشروبات",
        label_en: "Beverages",
        keywords_ar: &["عصير", "مياه", "ماء", "شاي", "قهوة", "نسكافيه", "كولا", "بيبسي"],
        keywords_en: &["juice", "water", "tea", "coffee", "cola", "pepsi", "beverage", "drink"],
    },
    Category {
        id: "snacks",
        label_ar: "الوجبات الخفيفة",
        label_en: "Snacks",
        keywords_ar: &["شيبسي", "بسكويت", "شوكولاتة", "حلويات", "سناك"],
        keywords_en: &["chips", "snack", "chocolate", "candy", "sweets", "popcorn"],
    },
    Category {
        id: "frozen",
        label_ar: "المجمدات",
        label_en: "Frozen Foods",
        keywords_ar: &["مجمد", "آيس كريم", "بوظة"],
        keywords_en: &["frozen", "ice cream", "popsicle"],
    },
    Category {
        id: "cleaning",
        label_ar: "منتجات التنظيف",
        label_en: "Cleaning Products",
        keywords_ar: &["منظف", "صابون", "مسحوق", "تايد", "أومو", "فيري", "ديتول"],
        keywords_en: &["detergent", "soap", "cleaner", "tide", "omo", "fairy", "dettol"],
    },
    Category {
        id: "personal_care",
        label_ar: "العناية الشخصية",
        label_en: "Personal Care",
        keywords_ar: &["شامبو", "صابون", "معجون", "فرشاة", "كريم", "مزيل"],
        keywords_en: &["shampoo", "soap", "toothpaste", "cream", "deodorant", "lotion"],
    },
    Category {
        id: "baby",
        label_ar: "منتجات الأطفال",
        label_en: "Baby Products",
        keywords_ar: &["حفاضات", "بامبرز", "لبن أطفال", "سيريلاك"],
        keywords_en: &["diaper", "pampers", "baby", "infant", "cerelac"],
    },
];

/// Read-only category table; `other` is the fallback and is never matched by keyword.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: &'static [Category],
    other: Category,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            categories: STANDARD,
            other: OTHER,
        }
    }
}

impl CategoryTable {
    /// First category in table order whose keywords appear in `name`.
    pub fn classify(&self, name: &str) -> &Category {
        let lowered = name.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.matches(&lowered))
            .unwrap_or(&self.other)
    }

    /// Lookup by id; unknown ids resolve to `other`.
    pub fn get(&self, id: &str) -> &Category {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .unwrap_or(&self.other)
    }

    /// All categories in table order, `other` last.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().chain(std::iter::once(&self.other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_keyword() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("حليب المراعي كامل الدسم").id, "dairy");
        assert_eq!(table.classify("شيبسي توست").id, "snacks");
    }

    #[test]
    fn test_english_keyword_is_case_insensitive() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("Frozen Chicken Breast").id, "meat");
        assert_eq!(table.classify("DETTOL 500ml").id, "cleaning");
    }

    #[test]
    fn test_table_order_decides_overlaps() {
        let table = CategoryTable::default();
        // butter is listed under dairy before oils
        assert_eq!(table.classify("زبدة فلاحي").id, "dairy");
    }

    #[test]
    fn test_unmatched_falls_back_to_other() {
        let table = CategoryTable::default();
        let category = table.classify("منتج غير معروف");
        assert_eq!(category.id, OTHER_ID);
        assert_eq!(category.label_ar, "منتجات أخرى");
        assert_eq!(category.label_en, "Other Products");
    }

    #[test]
    fn test_lookup_by_id() {
        let table = CategoryTable::default();
        assert_eq!(table.get("fish").label_en, "Fish & Seafood");
        assert_eq!(table.get("no-such-id").id, OTHER_ID);
        assert_eq!(table.iter().count(), 15);
        assert_eq!(table.iter().last().map(|c| c.id), Some(OTHER_ID));
    }
}
