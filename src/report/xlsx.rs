//! XLSX workbook writers
//!
//! Excel output is more robust than CSV against non-ASCII names, and the
//! flashcard application consumes workbooks directly.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

use crate::survey::MatrixTable;

/// Excel limits sheet names to 31 characters
const MAX_SHEET_TITLE: usize = 31;

/// Truncate a worksheet title to Excel's limit, marking the cut
pub fn truncate_sheet_title(title: &str) -> String {
    if title.chars().count() <= MAX_SHEET_TITLE {
        return title.to_string();
    }
    let mut truncated: String = title.chars().take(MAX_SHEET_TITLE - 1).collect();
    truncated.push('…');
    truncated
}

/// Write one worksheet per question matrix: raters down the side, ratees
/// across the top.
pub fn write_matrix_workbook(path: &Path, matrices: &[MatrixTable]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for matrix in matrices {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(truncate_sheet_title(&matrix.title))
            .with_context(|| format!("Invalid worksheet title: {:?}", matrix.title))?;

        for (col, ratee) in matrix.ratees.iter().enumerate() {
            worksheet.write_string_with_format(0, (col + 1) as u16, ratee.as_str(), &header_format)?;
        }
        for (row, rater) in matrix.raters.iter().enumerate() {
            worksheet.write_string_with_format((row + 1) as u32, 0, rater.as_str(), &header_format)?;
            for (col, cell) in matrix.cells[row].iter().enumerate() {
                if let Some(value) = cell {
                    worksheet.write_string((row + 1) as u32, (col + 1) as u16, value.as_str())?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// A flashcard row: front text, back text, picture file name
pub type FlashcardRow = (String, String, String);

/// Write the flashcard deck workbook with the columns the flashcard
/// application expects.
pub fn write_flashcard_workbook(path: &Path, rows: &[FlashcardRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in ["Text 1", "Text 2", "Picture 1"].iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (row, (text1, text2, picture)) in rows.iter().enumerate() {
        let row = (row + 1) as u32;
        worksheet.write_string(row, 0, text1.as_str())?;
        worksheet.write_string(row, 1, text2.as_str())?;
        worksheet.write_string(row, 2, picture.as_str())?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sheet_title() {
        assert_eq!(truncate_sheet_title("Short title"), "Short title");

        let long = "How well did this person contribute to the project?";
        let truncated = truncate_sheet_title(long);
        assert_eq!(truncated.chars().count(), 31);
        assert!(truncated.ends_with('…'));

        let exactly_31 = "a".repeat(31);
        assert_eq!(truncate_sheet_title(&exactly_31), exactly_31);
    }

    #[test]
    fn test_write_matrix_workbook() {
        let matrix = MatrixTable {
            title: "Rate this teammate".to_string(),
            raters: vec!["Jane Doe".to_string(), "John Smith".to_string()],
            ratees: vec!["Jane Doe".to_string(), "John Smith".to_string()],
            cells: vec![
                vec![Some("4".to_string()), Some("5".to_string())],
                vec![Some("4".to_string()), None],
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrices.xlsx");
        write_matrix_workbook(&path, &[matrix]).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_flashcard_workbook() {
        let rows = vec![
            (String::new(), "Alice Aalto".to_string(), "Alice Aalto.jpg".to_string()),
            (String::new(), "Bob Burns".to_string(), "Bob Burns.jpg".to_string()),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.xlsx");
        write_flashcard_workbook(&path, &rows).unwrap();
        assert!(path.exists());
    }
}
