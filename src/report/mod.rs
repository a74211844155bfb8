//! Crash report parsing
//!
//! A detail page is made of four tables in a fixed order: the crash header,
//! the vehicle list, the injury list and the miscellaneous notes. This module
//! slices a page into those sections and turns their rows into typed fields.
//! Values stay text; no numeric or date coercion happens here.

mod fields;
mod parser;

pub use fields::{CrashFields, InjuryFields, VehicleFields};
pub use parser::parse_report;

use std::fmt;
use thiserror::Error;

/// The four logical sections of a detail page, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Crash,
    Vehicle,
    Injury,
    Misc,
}

impl Section {
    /// Page order of the sections
    pub const ALL: [Section; 4] = [Self::Crash, Self::Vehicle, Self::Injury, Self::Misc];

    /// Position of this section among the section tables
    pub fn index(&self) -> usize {
        match self {
            Self::Crash => 0,
            Self::Vehicle => 1,
            Self::Injury => 2,
            Self::Misc => 3,
        }
    }

    /// Lowercase word the section's caption must contain
    pub fn caption_keyword(&self) -> &'static str {
        match self {
            Self::Crash => "crash",
            Self::Vehicle => "vehicle",
            Self::Injury => "injur",
            Self::Misc => "misc",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Crash => "crash",
            Self::Vehicle => "vehicle",
            Self::Injury => "injury",
            Self::Misc => "misc",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural mismatch between a detail page and the known layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportFormatError {
    #[error("{section} section is missing or malformed")]
    Section { section: Section },

    #[error("expected 4 report sections, found {found}")]
    SectionCount { found: usize },

    #[error("{section} row {row} has {found} cells, expected {expected}")]
    FieldCount {
        section: Section,
        row: usize,
        expected: usize,
        found: usize,
    },
}


/// Everything extracted from one detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub crash: CrashFields,
    /// Vehicles in source row order
    pub vehicles: Vec<VehicleFields>,
    /// Injured parties in source row order
    pub injuries: Vec<InjuryFields>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_order_matches_index() {
        for (position, section) in Section::ALL.iter().enumerate() {
            assert_eq!(section.index(), position);
        }
    }

    #[test]
    fn test_error_names_section() {
        let err = ReportFormatError::Section {
            section: Section::Injury,
        };
        assert_eq!(err.to_string(), "injury section is missing or malformed");

        let err = ReportFormatError::FieldCount {
            section: Section::Vehicle,
            row: 2,
            expected: 11,
            found: 7,
        };
        assert_eq!(err.to_string(), "vehicle row 2 has 7 cells, expected 11");

        let err = ReportFormatError::SectionCount { found: 5 };
        assert_eq!(err.to_string(), "expected 4 report sections, found 5");
    }
}
