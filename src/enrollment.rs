//! Course-enrollment page parsing
//!
//! The input is a course-enrollment HTML page saved from a browser. The
//! class-list table header carries the term and course fields separated by
//! `|`; each body cell holds a student photo and a "Last, First" caption.
//! The page structure is rigid enough that targeted regexes extract both.

use anyhow::{Context, Result};
use regex::Regex;

const CLASS_LIST_ID: &str = "pg0_V_ggClassList";

/// One enrolled student
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Student {
    pub last_name: String,
    pub first_name: String,
    /// Photo path, relative to the saved page
    pub img_path: String,
}

/// The parsed enrollment page
#[derive(Debug)]
pub struct Enrollment {
    pub season: String,
    pub year: String,
    pub course_number: String,
    pub section: String,
    pub students: Vec<Student>,
}

impl Enrollment {
    /// Default output basename: `<number> <section> <season> <year>`
    pub fn output_basename(&self) -> String {
        format!(
            "{} {} {} {}",
            self.course_number, self.section, self.season, self.year
        )
    }
}

/// Parse a saved enrollment page
pub fn parse_enrollment(html: &str) -> Result<Enrollment> {
    let table = html
        .split_once(CLASS_LIST_ID)
        .map(|(_, rest)| rest)
        .with_context(|| format!("No class list (id {:?}) in the enrollment page", CLASS_LIST_ID))?;

    let header_re = Regex::new(r"(?s)<thead[^>]*>.*?<tr[^>]*>(.*?)</tr>").unwrap();
    let header_row = header_re
        .captures(table)
        .context("No class-list header row in the enrollment page")?
        .get(1)
        .unwrap()
        .as_str();
    let header_fields: Vec<String> = strip_tags(header_row)
        .split('|')
        .map(|field| field.trim().to_string())
        .collect();
    if header_fields.len() < 3 {
        return Err(anyhow::anyhow!(
            "Malformed class-list header: {:?}",
            header_fields.join("|")
        ));
    }
    let course_term_field = &header_fields[0];
    let course_number_field = &header_fields[2];

    let term_re = Regex::new(r"(Spring|Fall) Term - (\d{4})").unwrap();
    let term = term_re
        .captures(course_term_field)
        .with_context(|| format!("Unrecognized course term: {:?}", course_term_field))?;
    let number_re = Regex::new(r"(.+)-(\d+)").unwrap();
    let number = number_re
        .captures(course_number_field)
        .with_context(|| format!("Unrecognized course number: {:?}", course_number_field))?;

    let body_re = Regex::new(r"(?s)<tbody[^>]*>(.*?)</tbody>").unwrap();
    let body = body_re
        .captures(table)
        .context("No class-list body in the enrollment page")?
        .get(1)
        .unwrap()
        .as_str();

    let cell_re = Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap();
    let src_re = Regex::new(r#"<img[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).unwrap();
    let mut students = Vec::new();
    for cell in cell_re.captures_iter(body) {
        let cell = cell.get(1).unwrap().as_str();
        let Some(src) = src_re.captures(cell) else {
            continue;
        };
        let caption = strip_tags(cell);
        let caption = caption.trim();
        let (last, first) = caption
            .split_once(", ")
            .with_context(|| format!("Unrecognized student caption: {:?}", caption))?;
        // Underscores stand in for hyphens in the export; keep the first
        // word of a multi-part first name
        let last_name = last.replace('_', "-");
        let first_name = first
            .replace('_', "-")
            .split(' ')
            .next()
            .unwrap_or_default()
            .to_string();
        students.push(Student {
            last_name,
            first_name,
            img_path: src.get(1).unwrap().as_str().to_string(),
        });
    }
    if students.is_empty() {
        return Err(anyhow::anyhow!("No students found in the enrollment page"));
    }
    students.sort();

    Ok(Enrollment {
        season: term.get(1).unwrap().as_str().to_string(),
        year: term.get(2).unwrap().as_str().to_string(),
        course_number: number.get(1).unwrap().as_str().trim().to_string(),
        section: number.get(2).unwrap().as_str().to_string(),
        students,
    })
}

/// Remove markup tags and collapse basic entities
fn strip_tags(html: &str) -> String {
    let tag_re = Regex::new(r"<[^>]*>").unwrap();
    tag_re
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
