use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Product categories a pickup-point accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "электроника")]
    Electronics,
    #[serde(rename = "одежда")]
    Clothes,
    #[serde(rename = "обувь")]
    Shoes,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [ProductType::Electronics, ProductType::Clothes, ProductType::Shoes];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "электроника",
            ProductType::Clothes => "одежда",
            ProductType::Shoes => "обувь",
        }
    }
}

impl core::fmt::Display for ProductType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::UnsupportedProductType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types() {
        assert_eq!("одежда".parse::<ProductType>().unwrap(), ProductType::Clothes);
        assert_eq!("обувь".parse::<ProductType>().unwrap(), ProductType::Shoes);
        assert_eq!("электроника".parse::<ProductType>().unwrap(), ProductType::Electronics);
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let err = "мебель".parse::<ProductType>().unwrap_err();
        assert_eq!(err, LedgerError::UnsupportedProductType("мебель".to_string()));
    }

    #[test]
    fn serializes_as_russian_name() {
        assert_eq!(serde_json::to_string(&ProductType::Clothes).unwrap(), "\"одежда\"");
    }
}
