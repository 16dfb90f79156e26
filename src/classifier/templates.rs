use std::fmt;
use std::str::FromStr;
use crate::classifier::{Attributes, ClassificationResult};
use crate::error::{AppError, Result};

/// Fixed attribute sets returned by the stand-in classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    TShirt,
    SportsShoes,
}

const TSHIRT_GLOBAL: &[(&str, &str)] = &[
    ("Type", "T-Shirts"),
    ("Colour", "Black"),
    ("Occasion", "Casual"),
];

const TSHIRT_SPECIFIC: &[(&str, &str)] = &[
    ("Brand", "Uniqlo"),
    ("Gender", "Men"),
    ("Material", "Cotton"),
    ("Style", "Basic"),
    ("Fit", "Regular Fit"),
    ("Pattern", "Solid"),
    ("Neck Type", "Crew Neck"),
    ("Sleeve Type", "Short Sleeve"),
];

const SHOES_GLOBAL: &[(&str, &str)] = &[
    ("Type", "Sports Shoes"),
    ("Colour", "White"),
    ("Occasion", "Sports"),
];

const SHOES_SPECIFIC: &[(&str, &str)] = &[
    ("Brand", "Nike"),
    ("Gender", "Unisex"),
    ("Material", "Synthetic"),
    ("Style", "Sneakers"),
    ("Closure Type", "Laces"),
    ("Sports Type", "Running"),
    ("Performance Feature", "Cushioning"),
];

impl Template {
    pub const ALL: [Template; 2] = [Template::TShirt, Template::SportsShoes];

    pub fn label(&self) -> &'static str {
        match self {
            Template::TShirt => "T-Shirt",
            Template::SportsShoes => "Sports Shoes",
        }
    }

    pub fn result(&self) -> ClassificationResult {
        let (global, specific) = match self {
            Template::TShirt => (TSHIRT_GLOBAL, TSHIRT_SPECIFIC),
            Template::SportsShoes => (SHOES_GLOBAL, SHOES_SPECIFIC),
        };

        ClassificationResult {
            global: to_attributes(global),
            category_specific: to_attributes(specific),
        }
    }
}

fn to_attributes(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl FromStr for Template {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tshirt" | "t-shirt" => Ok(Template::TShirt),
            "shoes" | "sports-shoes" => Ok(Template::SportsShoes),
            other => Err(AppError::Config(format!("Unknown classifier template: {}", other))),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
