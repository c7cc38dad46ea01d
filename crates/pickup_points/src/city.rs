use core::str::FromStr;

use serde::{Deserialize, Serialize};

use pvz_core::DomainError;

/// Cities where pickup-points may be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "Москва")]
    Moscow,
    #[serde(rename = "Казань")]
    Kazan,
    #[serde(rename = "Санкт-Петербург")]
    SaintPetersburg,
}

impl City {
    pub const ALL: [City; 3] = [City::Moscow, City::Kazan, City::SaintPetersburg];

    pub fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Москва",
            City::Kazan => "Казань",
            City::SaintPetersburg => "Санкт-Петербург",
        }
    }
}

impl core::fmt::Display for City {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for City {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unsupported city: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_city() {
        for city in City::ALL {
            assert_eq!(city.as_str().parse::<City>().unwrap(), city);
        }
    }

    #[test]
    fn rejects_unknown_city() {
        let err = "Новосибирск".parse::<City>().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("Новосибирск")),
            _ => panic!("Expected Validation error for unknown city"),
        }
    }

    #[test]
    fn serde_uses_russian_names() {
        let json = serde_json::to_string(&City::SaintPetersburg).unwrap();
        assert_eq!(json, "\"Санкт-Петербург\"");

        let city: City = serde_json::from_str("\"Казань\"").unwrap();
        assert_eq!(city, City::Kazan);
    }
}
