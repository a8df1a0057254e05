use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use serde::Serialize;

use crate::auth::require_admin;
use crate::err::Error;
use crate::models::{ExamRecord, Role, StudentAccount};
use crate::session::Identity;
use crate::state::AppState;

pub const COLUMNS: usize = 9;
pub const EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

static EMPTY_CELL: Data = Data::Empty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub enrollment_number: String,
    pub name: String,
    pub branch: String,
    pub password: String,
    pub exam_name: String,
    pub room_number: String,
    pub bench_number: String,
    pub block: String,
    pub exam_date: String,
}

impl ImportRow {
    fn exam(&self) -> ExamRecord {
        ExamRecord::new(
            self.enrollment_number.as_str(),
            self.exam_name.as_str(),
            self.room_number.as_str(),
            self.bench_number.as_str(),
            self.block.as_str(),
            self.exam_date.as_str(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub students_added: u32,
    pub exams_added: u32,
}

pub fn accepts_filename(filename: &str) -> bool {
    let filename = filename.to_ascii_lowercase();
    EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// Opens the first worksheet of an `.xlsx`/`.xls` workbook.
pub fn open_sheet(bytes: &[u8]) -> Result<Range<Data>, Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range?),
        None => Err(Error::invalid(
            "Error processing Excel file: workbook has no worksheets",
        )),
    }
}

/// Data rows of the sheet as `(1-based sheet row, cells)`, starting below the
/// header. Cells are padded so index 0 is always column A.
pub fn data_rows(range: &Range<Data>) -> impl Iterator<Item = (u32, Vec<&Data>)> + '_ {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    range
        .rows()
        .enumerate()
        .map(move |(i, cells)| {
            let row = first_row + i as u32;
            let mut padded = vec![&EMPTY_CELL; first_col as usize];
            padded.extend(cells.iter());
            (row + 1, padded)
        })
        .filter(|(row, _)| *row > 1)
}

/// Decodes one sheet row. `Ok(None)` marks a blank separator row.
pub fn decode_row(row: u32, cells: &[&Data]) -> Result<Option<ImportRow>, Error> {
    // A blank first cell skips the row whatever the other cells hold.
    if cells.first().map_or(true, |cell| is_blank(cell)) {
        return Ok(None);
    }

    let mut texts = Vec::with_capacity(cells.len());
    for (col, cell) in cells.iter().enumerate() {
        texts.push(cell_text(cell).map_err(|cause| {
            Error::invalid(format!(
                "Error processing Excel file: row {}, column {}: {}",
                row,
                col + 1,
                cause
            ))
        })?);
    }

    while matches!(texts.last(), Some(None)) {
        texts.pop();
    }
    if texts.len() != COLUMNS {
        return Err(Error::invalid(format!(
            "Error processing Excel file: row {} has {} columns, expected {}",
            row,
            texts.len(),
            COLUMNS
        )));
    }

    let mut values = texts.into_iter().map(Option::unwrap_or_default);
    let mut next = || values.next().unwrap_or_default();
    Ok(Some(ImportRow {
        enrollment_number: next(),
        name: next(),
        branch: next(),
        password: next(),
        exam_name: next(),
        room_number: next(),
        bench_number: next(),
        block: next(),
        exam_date: next(),
    }))
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Text form of a cell. `None` for empty cells.
pub fn cell_text(cell: &Data) -> Result<Option<String>, String> {
    let text = match cell {
        Data::Empty => return Ok(None),
        Data::String(s) if s.is_empty() => return Ok(None),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(datetime) => datetime.to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => return Err(format!("cell holds the error value {}", e)),
    };
    Ok(Some(text))
}

/// Creates unknown students and appends one exam per row. Rows written before
/// a failing row stay written.
pub async fn import_spreadsheet(
    state: &AppState,
    identity: &Identity,
    bytes: &[u8],
    filename: &str,
) -> Result<ImportSummary, Error> {
    require_admin(identity)?;
    if !accepts_filename(filename) {
        return Err(Error::invalid("Only Excel files are allowed"));
    }

    let range = open_sheet(bytes)?;
    let mut summary = ImportSummary::default();

    for (row, cells) in data_rows(&range) {
        let record = match decode_row(row, &cells)? {
            Some(record) => record,
            None => continue,
        };

        let existing = state.students.find_student(&record.enrollment_number).await?;
        if existing.is_none() {
            let account = StudentAccount::new(
                record.enrollment_number.as_str(),
                record.name.as_str(),
                record.branch.as_str(),
                state.hasher.hash(&record.password).await?,
                Role::Student,
            );
            if state.students.insert_student(&account).await? {
                summary.students_added += 1;
            }
        }

        state.exams.insert_exam(&record.exam()).await?;
        summary.exams_added += 1;
    }

    log::info!(
        "`{}` imported {}: {} students added, {} exams added",
        identity.enrollment_number,
        filename,
        summary.students_added,
        summary.exams_added
    );
    summary.message = "Successfully uploaded data".to_string();
    Ok(summary)
}
