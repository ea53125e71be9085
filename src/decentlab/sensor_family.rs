use std::fmt;
use std::str::FromStr;

use crate::decentlab::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorFamily {
    Sht35,
    Blg,
    Atm41,
}

impl SensorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorFamily::Sht35 => "SHT35",
            SensorFamily::Blg => "BLG",
            SensorFamily::Atm41 => "ATM41",
        }
    }

    /// Guesses the family from a folder slug such as
    /// `stadt-dortmund-klimasensoren-aktiv-blackglobe`.
    pub fn from_folder(slug: &str) -> Option<Self> {
        let suffix = slug.rsplit('-').next()?;
        suffix.parse().ok()
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorFamily {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            // STH35 is a common misspelling in deployed folder names
            "sht35" | "sth35" => Ok(SensorFamily::Sht35),
            "blg" | "blackglobe" => Ok(SensorFamily::Blg),
            "atm41" => Ok(SensorFamily::Atm41),
            _ => Err(DecodeError::UnknownFamily(s.to_string())),
        }
    }
}
