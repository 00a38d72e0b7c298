//! Station code and station record types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix appended to many station names in the directory ("Helsinki asema").
const NAME_SUFFIX: &str = " asema";

/// Maximum length of a station short code, in characters.
const MAX_CODE_CHARS: usize = 6;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A station short code such as `HKI`, `PSL` or `MÄK`.
///
/// Codes are 1–6 uppercase letters. Unlike CRS codes they are not limited
/// to ASCII: Finnish codes routinely contain `Ä`, `Ö` and `Å`.
///
/// # Examples
///
/// ```
/// use train_board::domain::StationCode;
///
/// let hki = StationCode::parse("HKI").unwrap();
/// assert_eq!(hki.as_str(), "HKI");
///
/// assert!(StationCode::parse("MÄK").is_ok());
/// assert!(StationCode::parse("hki").is_err());
/// assert!(StationCode::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code. The input must already be uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let count = s.chars().count();

        if count == 0 {
            return Err(InvalidStationCode {
                reason: "must not be empty",
            });
        }

        if count > MAX_CODE_CHARS {
            return Err(InvalidStationCode {
                reason: "must be at most 6 characters",
            });
        }

        if !s.chars().all(|c| c.is_alphabetic() && c.is_uppercase()) {
            return Err(InvalidStationCode {
                reason: "must be uppercase letters",
            });
        }

        Ok(StationCode(s.to_string()))
    }

    /// Parse a code after trimming and uppercasing it (for user input).
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StationCode {
    type Error = InvalidStationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationCode> for String {
    fn from(value: StationCode) -> Self {
        value.0
    }
}

/// A station known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Short code, unique within the directory.
    pub code: StationCode,
    /// Full name as published, e.g. "Helsinki asema".
    pub name: String,
    /// Numeric UIC code, if published.
    pub uic_code: Option<u32>,
    /// Whether the station serves passengers.
    pub passenger_traffic: bool,
}

impl Station {
    /// Returns the name with the locale suffix removed.
    ///
    /// ```
    /// use train_board::domain::{Station, StationCode};
    ///
    /// let station = Station {
    ///     code: StationCode::parse("HKI").unwrap(),
    ///     name: "Helsinki asema".into(),
    ///     uic_code: Some(1),
    ///     passenger_traffic: true,
    /// };
    /// assert_eq!(station.display_name(), "Helsinki");
    /// ```
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

/// Strip the locale suffix from a station name.
pub fn display_name(name: &str) -> &str {
    name.strip_suffix(NAME_SUFFIX).unwrap_or(name)
}
