//! Typed rows of a detail page
//!
//! Each constructor takes the trimmed cells of one row, checks the cell count
//! up front and maps cells positionally onto named fields.

use crate::report::{ReportFormatError, Section};

/// Fields of the crash header plus the miscellaneous notes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrashFields {
    /// Report number as printed on the page
    pub incident_num: String,
    pub investigated_by: String,
    pub gps_latitude: String,
    pub gps_longitude: String,
    pub date: String,
    pub time: String,
    pub county: String,
    pub location: String,
    pub troop: String,
    pub misc_info: String,
}

impl CrashFields {
    /// Labeled cells in the crash header
    pub const CELL_COUNT: usize = 9;

    /// Builds crash fields from the header cells and the notes text
    pub fn from_cells(cells: &[String], misc_info: String) -> Result<Self, ReportFormatError> {
        check_count(Section::Crash, 1, cells, Self::CELL_COUNT)?;

        Ok(Self {
            incident_num: cells[0].clone(),
            investigated_by: cells[1].clone(),
            gps_latitude: cells[2].clone(),
            gps_longitude: cells[3].clone(),
            date: cells[4].clone(),
            time: cells[5].clone(),
            county: cells[6].clone(),
            location: cells[7].clone(),
            troop: cells[8].clone(),
            misc_info,
        })
    }
}

/// One row of the vehicle table
///
/// The first cell holds the vehicle number printed by the source. Stored
/// vehicles are numbered by row order instead, so that cell is not kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VehicleFields {
    pub description: String,
    pub damage: String,
    pub disposition: String,
    pub driver_name: String,
    pub driver_gender: String,
    pub driver_age: String,
    pub safety_device: String,
    pub driver_city_state: String,
    pub driver_insurance: String,
    pub direction: String,
}

impl VehicleFields {
    pub const CELL_COUNT: usize = 11;

    pub fn from_cells(row: usize, cells: &[String]) -> Result<Self, ReportFormatError> {
        check_count(Section::Vehicle, row, cells, Self::CELL_COUNT)?;

        Ok(Self {
            description: cells[1].clone(),
            damage: cells[2].clone(),
            disposition: cells[3].clone(),
            driver_name: cells[4].clone(),
            driver_gender: cells[5].clone(),
            driver_age: cells[6].clone(),
            safety_device: cells[7].clone(),
            driver_city_state: cells[8].clone(),
            driver_insurance: cells[9].clone(),
            direction: cells[10].clone(),
        })
    }
}

/// One row of the injury table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InjuryFields {
    /// Vehicle the injured party occupied, as printed (not cross-checked)
    pub vehicle_num: String,
    pub name: String,
    pub gender: String,
    pub age: String,
    pub injury_type: String,
    pub safety_device: String,
    pub city_state: String,
    pub involvement: String,
    pub disposition: String,
}

impl InjuryFields {
    pub const CELL_COUNT: usize = 9;

    pub fn from_cells(row: usize, cells: &[String]) -> Result<Self, ReportFormatError> {
        check_count(Section::Injury, row, cells, Self::CELL_COUNT)?;

        Ok(Self {
            vehicle_num: cells[0].clone(),
            name: cells[1].clone(),
            gender: cells[2].clone(),
            age: cells[3].clone(),
            injury_type: cells[4].clone(),
            safety_device: cells[5].clone(),
            city_state: cells[6].clone(),
            involvement: cells[7].clone(),
            disposition: cells[8].clone(),
        })
    }
}

/// Rejects rows shorter than their record type; extra trailing cells are ignored
fn check_count(
    section: Section,
    row: usize,
    cells: &[String],
    expected: usize,
) -> Result<(), ReportFormatError> {
    if cells.len() < expected {
        return Err(ReportFormatError::FieldCount {
            section,
            row,
            expected,
            found: cells.len(),
        });
    }
    Ok(())
}
