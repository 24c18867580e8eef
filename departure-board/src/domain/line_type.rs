//! Transit mode classification for departure lines.

use std::fmt;

use serde::Serialize;

/// Transit mode category used for grouping and colouring departures.
///
/// Always derived from the line label and the upstream `motType` code via
/// [`LineType::classify`]; never read from upstream directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineType {
    UBahn,
    SBahn,
    Strassenbahn,
    Bus,
    Regional,
    Other,
}

impl LineType {
    /// Classify a line by its label and upstream mode-of-transport code.
    ///
    /// Rules are checked in order and the first match wins. Prefix checks
    /// are case-insensitive. `mot_type` is `-1` when upstream omitted it.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::LineType;
    ///
    /// assert_eq!(LineType::classify("U79", -1), LineType::UBahn);
    /// assert_eq!(LineType::classify("RE1", -1), LineType::Regional);
    /// assert_eq!(LineType::classify("122", 5), LineType::Strassenbahn);
    /// assert_eq!(LineType::classify("SW1", 3), LineType::SBahn);
    /// ```
    pub fn classify(line: &str, mot_type: i32) -> Self {
        let lower = line.to_lowercase();

        if lower.starts_with('u') || mot_type == 2 {
            LineType::UBahn
        } else if lower.starts_with('s') || mot_type == 1 {
            LineType::SBahn
        } else if mot_type == 4 || mot_type == 5 {
            LineType::Strassenbahn
        } else if lower.starts_with("re") || lower.starts_with("rb") || mot_type == 0 {
            LineType::Regional
        } else {
            LineType::Bus
        }
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            LineType::UBahn => "U-Bahn",
            LineType::SBahn => "S-Bahn",
            LineType::Strassenbahn => "Straßenbahn",
            LineType::Bus => "Bus",
            LineType::Regional => "Regional",
            LineType::Other => "Other",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
