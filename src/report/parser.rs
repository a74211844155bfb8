//! Detail page parser
//!
//! Sections are the `table.accidentOutput` elements of the page, addressed by
//! position. Each must carry a caption naming its section so that a missing
//! table is reported by name instead of shifting every later section.

use crate::report::{
    CrashFields, InjuryFields, ParsedReport, ReportFormatError, Section, VehicleFields,
};
use scraper::{ElementRef, Html, Selector};

// Header rows are normally `th` cells. Some pages write the labels as `td`
// cells instead; see `record_rows`.
const SECTION_SELECTOR: &str = "table.accidentOutput";
const CAPTION_SELECTOR: &str = "caption";
const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td";

/// Parses a detail page into crash, vehicle and injury fields
///
/// Rows made only of `th` cells are headers and are skipped, so a table with
/// or without a header row parses the same way. A leading row of `td` labels
/// (no cell containing a digit) is a header too. Row order is preserved.
///
/// # Errors
///
/// * `ReportFormatError::Section` - a section is absent, out of order, or empty
/// * `ReportFormatError::SectionCount` - more than four section tables
/// * `ReportFormatError::FieldCount` - a data row is shorter than its record
///
/// # Example
///
/// ```no_run
/// use crash_harvest::report::parse_report;
///
/// let html = std::fs::read_to_string("AB123.html").unwrap();
/// let report = parse_report(&html).unwrap();
/// println!("{} vehicles", report.vehicles.len());
/// ```
pub fn parse_report(html: &str) -> Result<ParsedReport, ReportFormatError> {
    let document = Html::parse_document(html);
    let sections = locate_sections(&document)?;

    let crash_table = sections[Section::Crash.index()];
    let crash_cells = record_rows(crash_table)
        .into_iter()
        .next()
        .ok_or(ReportFormatError::Section {
            section: Section::Crash,
        })?;
    let misc_info = misc_text(sections[Section::Misc.index()])?;
    let crash = CrashFields::from_cells(&crash_cells, misc_info)?;

    let vehicles = record_rows(sections[Section::Vehicle.index()])
        .iter()
        .enumerate()
        .map(|(i, cells)| VehicleFields::from_cells(i + 1, cells))
        .collect::<Result<Vec<_>, _>>()?;

    let injuries = record_rows(sections[Section::Injury.index()])
        .iter()
        .enumerate()
        .map(|(i, cells)| InjuryFields::from_cells(i + 1, cells))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedReport {
        crash,
        vehicles,
        injuries,
    })
}

/// Finds the four section tables and checks their captions in page order
fn locate_sections(document: &Html) -> Result<[ElementRef<'_>; 4], ReportFormatError> {
    let table_selector = selector(SECTION_SELECTOR);
    let tables: Vec<ElementRef<'_>> = document.select(&table_selector).collect();

    for section in Section::ALL {
        let matches = tables
            .get(section.index())
            .map(|table| caption_matches(*table, section))
            .unwrap_or(false);
        if !matches {
            return Err(ReportFormatError::Section { section });
        }
    }

    if tables.len() != Section::ALL.len() {
        return Err(ReportFormatError::SectionCount {
            found: tables.len(),
        });
    }

    Ok([tables[0], tables[1], tables[2], tables[3]])
}

fn caption_matches(table: ElementRef<'_>, section: Section) -> bool {
    let caption_selector = selector(CAPTION_SELECTOR);
    table
        .select(&caption_selector)
        .next()
        .map(|caption| {
            cell_text(caption)
                .to_lowercase()
                .contains(section.caption_keyword())
        })
        .unwrap_or(false)
}

/// Trimmed `td` texts of every row that has at least one `td`
fn data_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let row_selector = selector(ROW_SELECTOR);
    let cell_selector = selector(CELL_SELECTOR);

    table
        .select(&row_selector)
        .map(|row| row.select(&cell_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Data rows of a record section, without a leading row of `td` labels
///
/// Every record row carries at least one number (vehicle number, age, date),
/// column labels never do.
fn record_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let mut rows = data_rows(table);
    let is_label_row = rows
        .first()
        .map(|cells| !cells.iter().any(|cell| cell.chars().any(|c| c.is_ascii_digit())))
        .unwrap_or(false);
    if is_label_row {
        rows.remove(0);
    }
    rows
}

/// The free-text block of the notes section
fn misc_text(table: ElementRef<'_>) -> Result<String, ReportFormatError> {
    let blocks: Vec<String> = data_rows(table).into_iter().flatten().collect();
    if blocks.is_empty() {
        return Err(ReportFormatError::Section {
            section: Section::Misc,
        });
    }

    Ok(blocks
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn selector(css: &'static str) -> Selector {
    // The selectors are constants known to be valid
    Selector::parse(css).unwrap_or_else(|_| unreachable!("invalid selector {css}"))
}
