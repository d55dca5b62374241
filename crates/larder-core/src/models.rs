use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default display name when a lookup result has none.
pub const DEFAULT_PRODUCT_NAME: &str = "No name";
/// Default brand when a lookup result has none.
pub const DEFAULT_BRAND: &str = "Unknown";

/// Raw product description from an external lookup.
///
/// Every field is optional because the food database tolerates wildly
/// incomplete entries. Normalization into a saveable record happens in the
/// inventory service, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodProduct {
    pub code: Option<String>,
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub image_small_url: Option<String>,
    pub nutriscore_grade: Option<String>,
}

/// A saved inventory record - the star of the show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    /// Store-generated id (UUID v4).
    pub id: String,
    /// The user who saved this item. Opaque and pre-authenticated; the core
    /// never derives it from anything client-supplied.
    pub owner_id: String,
    /// External product code (barcode or catalog id). Unique per owner.
    pub code: String,
    pub product_name: String,
    pub brands: String,
    pub image_url: String,
    pub nutriscore_grade: Option<String>,
    pub quantity: u32,
    pub unit: Unit,
    /// Date-only. Legacy rows may lack it; the expiring view skips those.
    pub expiration_date: Option<NaiveDate>,
    /// Set once by the store at creation.
    pub created_at: DateTime<Utc>,
}

/// A validated candidate handed to the store for insertion.
///
/// By the time one of these exists, defaults have been applied and the
/// expiration date and code are known to be present.
#[derive(Debug, Clone)]
pub struct NewFoodItem {
    pub code: String,
    pub product_name: String,
    pub brands: String,
    pub image_url: String,
    pub nutriscore_grade: Option<String>,
    pub quantity: u32,
    pub unit: Unit,
    pub expiration_date: NaiveDate,
}

/// How a saved quantity is counted
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Items,
    Cases,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Items => "items",
            Unit::Cases => "cases",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Unit {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "items" => Ok(Unit::Items),
            "cases" => Ok(Unit::Cases),
            other => Err(crate::Error::Validation(format!(
                "unknown unit {:?} (expected \"items\" or \"cases\")",
                other
            ))),
        }
    }
}

/// Optional filters for listing saved items, mirroring the search surface:
/// exact code match and case-insensitive name substring.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl ItemFilter {
    /// Whether an item passes this filter. Store backends may evaluate the
    /// same predicate in SQL instead; results must agree with this.
    pub fn matches(&self, item: &FoodItem) -> bool {
        if let Some(code) = &self.code {
            if &item.code != code {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !item
                .product_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Nutri-Score grade from the food database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NutriScore {
    A,
    B,
    C,
    D,
    E,
}

impl NutriScore {
    /// Parse a grade as the lookup API reports it ("a".."e", any case).
    pub fn parse(grade: &str) -> Option<Self> {
        match grade.trim().to_lowercase().as_str() {
            "a" => Some(NutriScore::A),
            "b" => Some(NutriScore::B),
            "c" => Some(NutriScore::C),
            "d" => Some(NutriScore::D),
            "e" => Some(NutriScore::E),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NutriScore::A => "A",
            NutriScore::B => "B",
            NutriScore::C => "C",
            NutriScore::D => "D",
            NutriScore::E => "E",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            NutriScore::A => "green",
            NutriScore::B => "light-green",
            NutriScore::C => "yellow",
            NutriScore::D => "orange",
            NutriScore::E => "red",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_round_trip() {
        assert_eq!("items".parse::<Unit>().unwrap(), Unit::Items);
        assert_eq!("CASES".parse::<Unit>().unwrap(), Unit::Cases);
        assert_eq!(Unit::Cases.to_string(), "cases");
        assert!("crates".parse::<Unit>().is_err());
    }

    #[test]
    fn test_unit_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Unit::Items).unwrap(), "\"items\"");
        let unit: Unit = serde_json::from_str("\"cases\"").unwrap();
        assert_eq!(unit, Unit::Cases);
    }

    #[test]
    fn test_nutriscore_parse() {
        assert_eq!(NutriScore::parse("a"), Some(NutriScore::A));
        assert_eq!(NutriScore::parse(" E "), Some(NutriScore::E));
        assert_eq!(NutriScore::parse("unknown"), None);
        assert_eq!(NutriScore::parse("f"), None);
    }

    #[test]
    fn test_filter_matches() {
        let item = FoodItem {
            id: "1".into(),
            owner_id: "alice".into(),
            code: "737628064502".into(),
            product_name: "Rice Noodles".into(),
            brands: "Thai Kitchen".into(),
            image_url: String::new(),
            nutriscore_grade: None,
            quantity: 1,
            unit: Unit::Items,
            expiration_date: None,
            created_at: Utc::now(),
        };

        assert!(ItemFilter::default().matches(&item));
        assert!(ItemFilter {
            code: Some("737628064502".into()),
            name: None,
        }
        .matches(&item));
        assert!(ItemFilter {
            code: None,
            name: Some("noodle".into()),
        }
        .matches(&item));
        assert!(!ItemFilter {
            code: Some("000".into()),
            name: None,
        }
        .matches(&item));
        assert!(!ItemFilter {
            code: None,
            name: Some("soup".into()),
        }
        .matches(&item));
    }
}
