//! Answer extraction
//!
//! A template notebook defines question prompts: each cell whose metadata
//! marks it `is_question` starts a prompt, and the following question cell
//! (or the end of the notebook) stops it. Submissions are sliced against
//! these prompts by edit distance: the cell closest to the prompt's source
//! is the match, provided the distance stays under a threshold.

use anyhow::{Context, Result};
use log::info;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::{cells_text, markdown_heading_cell, Cell, Notebook};
use crate::similarity;

/// Maximum edit distance to consider something a match
pub const MATCH_THRESHOLD: usize = 10;

/// Where a prompt's answer range ends
#[derive(Debug, Clone, PartialEq)]
pub enum StopMarker {
    /// Exactly one cell after the question
    NextCell,
    /// Everything to the end of the notebook
    EndOfNotebook,
    /// The cell closest to this text
    Text(String),
}

/// A question prompt built from a template cell
#[derive(Debug, Clone)]
pub struct QuestionPrompt {
    pub index: usize,
    /// Explicit name from the cell's `problem` metadata
    pub name: Option<String>,
    /// The question cell's source text (the start marker)
    pub start: String,
    pub stop: StopMarker,
    pub is_optional: bool,
    pub is_poll: bool,
}

impl QuestionPrompt {
    /// Display title: the explicit name, else `{number}. {heading}` from the
    /// start marker's leading heading, else just the number.
    pub fn title(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let heading = Regex::new(r"^#+\s*(.+)").unwrap();
        let first_line = self.start.lines().next().unwrap_or_default();
        match heading.captures(first_line) {
            Some(captures) => format!("{}. {}", self.index + 1, captures.get(1).unwrap().as_str()),
            None => format!("{}", self.index + 1),
        }
    }

    /// The cells that most closely match this prompt. Returns the empty list
    /// when no cell is within `threshold` of the start (or stop) marker.
    /// With `suppress_non_answer_cells` the matched question cell itself is
    /// omitted and only the answer range is returned.
    pub fn closest_match(
        &self,
        cells: &[Cell],
        threshold: usize,
        suppress_non_answer_cells: bool,
    ) -> Vec<Cell> {
        let texts: Vec<String> = cells.iter().map(Cell::text).collect();
        let Some((best_match, distance)) = similarity::closest(&self.start, &texts) else {
            return Vec::new();
        };
        if distance > threshold {
            return Vec::new();
        }

        let end_offset = match &self.stop {
            StopMarker::NextCell => 2,
            StopMarker::EndOfNotebook => cells.len() - best_match,
            StopMarker::Text(stop_text) => {
                let Some((offset, stop_distance)) =
                    similarity::closest(stop_text, &texts[best_match..])
                else {
                    return Vec::new();
                };
                if stop_distance > threshold {
                    return Vec::new();
                }
                offset
            }
        };

        let mut matched = Vec::new();
        if !suppress_non_answer_cells {
            matched.push(cells[best_match].clone());
        }
        // The answer range follows the matched cell; a stop marker that
        // resolves to the question itself yields an empty range
        let start = best_match + 1;
        let end = (best_match + end_offset).min(cells.len());
        if start < end {
            matched.extend(cells[start..end].iter().cloned());
        }
        matched
    }
}

/// Build the prompt list from a template notebook.
///
/// A question cell stops the preceding multi-cell prompt. `is_poll` defaults
/// to whether the first line mentions "Reading Journal feedback";
/// `is_optional` to whether it mentions "optional".
pub fn build_prompts(template: &Notebook) -> Vec<QuestionPrompt> {
    let optional_re = Regex::new(r"(?i)optional").unwrap();
    let mut prompts: Vec<QuestionPrompt> = Vec::new();
    let mut previous_is_open = false;

    let cell_count = template.cells.len();
    for (idx, cell) in template.cells.iter().enumerate() {
        if !cell.is_question() {
            continue;
        }
        let source = cell.text();
        let first_line = source.lines().next().unwrap_or_default().to_string();

        if previous_is_open {
            if let Some(prev) = prompts.last_mut() {
                prev.stop = StopMarker::Text(source.clone());
            }
        }

        let is_poll = if cell.metadata.get("is_poll").is_some() {
            cell.flag("is_poll")
        } else {
            first_line.contains("Reading Journal feedback")
        };
        let is_optional = if cell.metadata.get("is_optional").is_some() {
            cell.flag("is_optional")
        } else {
            optional_re.is_match(&first_line)
        };

        let is_final_cell = idx + 1 == cell_count;
        let allow_multi_cell = cell.flag("allow_multi_cell");
        prompts.push(QuestionPrompt {
            index: prompts.len(),
            name: cell.meta_str("problem").map(str::to_string),
            start: source,
            stop: if allow_multi_cell && is_final_cell {
                StopMarker::EndOfNotebook
            } else {
                StopMarker::NextCell
            },
            is_optional,
            is_poll,
        });
        previous_is_open = allow_multi_cell;
    }
    prompts
}

/// How a student fared on one prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Missed,
    Blank,
    Answered,
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerStatus::Missed => write!(f, "Missed"),
            AnswerStatus::Blank => write!(f, "Blank"),
            AnswerStatus::Answered => write!(f, "Answered"),
        }
    }
}

/// One prompt's extraction results across all submissions
#[derive(Debug)]
pub struct PromptExtraction {
    pub prompt: QuestionPrompt,
    /// Question cells, taken from the first answered submission
    pub question_cells: Vec<Cell>,
    /// Username -> answer cells, in submission order
    pub answers: Vec<(String, Vec<Cell>)>,
    /// Username -> status, in submission order
    pub statuses: Vec<(String, AnswerStatus)>,
}

impl PromptExtraction {
    pub fn answered(&self, username: &str) -> bool {
        self.answers.iter().any(|(u, _)| u == username)
    }

    pub fn answer_text(&self, username: &str) -> Option<String> {
        self.answers
            .iter()
            .find(|(u, _)| u == username)
            .map(|(_, cells)| cells_text(cells))
    }

    /// Answers with exact-duplicate texts removed, first occurrence kept
    pub fn answers_without_duplicates(&self) -> Vec<(&String, &Vec<Cell>)> {
        let mut seen: Vec<String> = Vec::new();
        let mut unique = Vec::new();
        for (username, cells) in &self.answers {
            let text = cells_text(cells);
            if seen.contains(&text) {
                continue;
            }
            seen.push(text);
            unique.push((username, cells));
        }
        unique
    }
}

/// Slice every submission against every prompt.
///
/// The first answered submission also contributes the question cells
/// themselves; later submissions contribute answer cells only.
pub fn extract(
    template: &Notebook,
    submissions: &[(String, Option<Notebook>)],
    threshold: usize,
) -> Vec<PromptExtraction> {
    let prompts = build_prompts(template);
    prompts
        .into_iter()
        .map(|prompt| {
            let mut extraction = PromptExtraction {
                prompt,
                question_cells: Vec::new(),
                answers: Vec::new(),
                statuses: Vec::new(),
            };
            for (username, notebook) in submissions {
                let Some(notebook) = notebook else {
                    continue;
                };
                let suppress_non_answer = !extraction.answers.is_empty();
                let mut response_cells = extraction.prompt.closest_match(
                    &notebook.cells,
                    threshold,
                    suppress_non_answer,
                );

                let status = if response_cells.is_empty() {
                    AnswerStatus::Missed
                } else if response_cells
                    .last()
                    .map(|cell| cell.source.is_empty())
                    .unwrap_or(true)
                    || cells_text(&response_cells).is_empty()
                {
                    AnswerStatus::Blank
                } else {
                    if !suppress_non_answer {
                        // First answered submission: pull the question cells
                        // out of the matched range
                        extraction.question_cells = response_cells
                            .iter()
                            .filter(|cell| cell.is_question())
                            .cloned()
                            .collect();
                        response_cells.retain(|cell| !extraction.question_cells.contains(cell));
                    }
                    extraction
                        .answers
                        .push((username.clone(), response_cells));
                    AnswerStatus::Answered
                };
                extraction.statuses.push((username.clone(), status));
            }
            extraction
        })
        .collect()
}

/// Assemble the combined notebook: per prompt, the question cells followed by
/// the answers. Without usernames, duplicate answers are dropped; with them,
/// each answer is preceded by a level-4 heading naming the student.
pub fn combined_notebook(
    template: &Notebook,
    extractions: &[PromptExtraction],
    include_usernames: bool,
    full_names: &HashMap<String, String>,
) -> Notebook {
    let mut cells = Vec::new();
    for extraction in extractions {
        cells.extend(extraction.question_cells.iter().cloned());
        if include_usernames {
            for (username, answer_cells) in &extraction.answers {
                let name = full_names
                    .get(username)
                    .cloned()
                    .unwrap_or_else(|| username.clone());
                cells.push(markdown_heading_cell(&name, 4));
                cells.extend(answer_cells.iter().cloned());
            }
        } else {
            for (_, answer_cells) in extraction.answers_without_duplicates() {
                cells.extend(answer_cells.iter().cloned());
            }
        }
    }
    template.with_cells(cells)
}

/// Write the response-count matrix: one row per prompt, one column per
/// student, 1/0 cells, a leading Total column and a trailing Total row.
/// Returns the per-prompt (title, total) pairs for console display.
pub fn write_response_counts(
    path: &Path,
    extractions: &[PromptExtraction],
    students: &[(String, String)],
) -> Result<Vec<(String, usize)>> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec![String::new(), "Total".to_string()];
    header.extend(students.iter().map(|(_, full_name)| full_name.clone()));
    writer.write_record(&header)?;

    let mut totals = Vec::new();
    let mut column_totals = vec![0usize; students.len()];
    for extraction in extractions {
        let flags: Vec<bool> = students
            .iter()
            .map(|(username, _)| extraction.answered(username))
            .collect();
        let total = flags.iter().filter(|&&answered| answered).count();
        for (column, answered) in flags.iter().enumerate() {
            if *answered {
                column_totals[column] += 1;
            }
        }

        let mut record = vec![extraction.prompt.title(), total.to_string()];
        record.extend(
            flags
                .iter()
                .map(|&answered| (if answered { "1" } else { "0" }).to_string()),
        );
        writer.write_record(&record)?;
        totals.push((extraction.prompt.title(), total));
    }

    let grand_total: usize = column_totals.iter().sum();
    let mut record = vec!["Total".to_string(), grand_total.to_string()];
    record.extend(column_totals.iter().map(usize::to_string));
    writer.write_record(&record)?;

    writer.flush()?;
    Ok(totals)
}

/// Write one CSV per poll prompt: student name, response text. Empty
/// responses are skipped. Returns the paths written.
pub fn write_poll_results(
    summary_dir: &Path,
    stem: &str,
    extractions: &[PromptExtraction],
    students: &[(String, String)],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for extraction in extractions.iter().filter(|e| e.prompt.is_poll) {
        let slug = extraction.prompt.title().replace(' ', "_").to_lowercase();
        let path = summary_dir.join(format!("{}_{}.csv", stem, slug));
        info!(
            "Writing {}: poll results for {}",
            path.display(),
            extraction.prompt.title()
        );

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(["Student", "Response"])?;
        for (username, full_name) in students {
            let Some(response) = extraction.answer_text(username) else {
                continue;
            };
            if response.is_empty() {
                continue;
            }
            writer.write_record([full_name.as_str(), response.as_str()])?;
        }
        writer.flush()?;
        written.push(path);
    }
    Ok(written)
}

/// Lines reporting missed and blank answers to mandatory prompts
pub fn missing_answer_report(
    extractions: &[PromptExtraction],
    full_names: &HashMap<String, String>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for extraction in extractions {
        if extraction.prompt.is_poll || extraction.prompt.is_optional {
            continue;
        }
        let mut unanswered: Vec<&(String, AnswerStatus)> = extraction
            .statuses
            .iter()
            .filter(|(_, status)| *status != AnswerStatus::Answered)
            .collect();
        unanswered.sort_by(|a, b| a.0.cmp(&b.0));
        for (username, status) in unanswered {
            let name = full_names
                .get(username)
                .map(String::as_str)
                .unwrap_or(username.as_str());
            lines.push(format!("{} {}: {}", status, extraction.prompt.title(), name));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn markdown_cell(source: &str, metadata: serde_json::Value) -> Cell {
        serde_json::from_value(json!({
            "cell_type": "markdown",
            "metadata": metadata,
            "source": source
        }))
        .unwrap()
    }

    fn template() -> Notebook {
        serde_json::from_value(json!({
            "cells": [
                {
                    "cell_type": "markdown",
                    "metadata": {"is_question": true},
                    "source": "## Exercise 1\nWhat is ownership?"
                },
                {"cell_type": "markdown", "metadata": {}, "source": ""},
                {
                    "cell_type": "markdown",
                    "metadata": {"is_question": true, "allow_multi_cell": true},
                    "source": "## Exercise 2 (optional)\nShow an example."
                },
                {"cell_type": "markdown", "metadata": {}, "source": ""},
                {
                    "cell_type": "markdown",
                    "metadata": {"is_question": true, "is_poll": true, "problem": "Feedback"},
                    "source": "## Reading Journal feedback\nAny comments?"
                },
                {"cell_type": "markdown", "metadata": {}, "source": ""}
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 2
        }))
        .unwrap()
    }

    fn submission(answers: [&str; 3]) -> Notebook {
        let template = template();
        let mut cells = template.cells.clone();
        cells[1] = markdown_cell(answers[0], json!({}));
        cells[3] = markdown_cell(answers[1], json!({}));
        cells[5] = markdown_cell(answers[2], json!({}));
        template.with_cells(cells)
    }

    #[test]
    fn test_build_prompts() {
        let prompts = build_prompts(&template());
        assert_eq!(prompts.len(), 3);

        assert_eq!(prompts[0].stop, StopMarker::NextCell);
        assert!(!prompts[0].is_optional);
        assert!(!prompts[0].is_poll);
        assert_eq!(prompts[0].title(), "1. Exercise 1");

        // The multi-cell prompt stops at the next question cell
        assert_eq!(
            prompts[1].stop,
            StopMarker::Text("## Reading Journal feedback\nAny comments?".to_string())
        );
        assert!(prompts[1].is_optional);

        assert!(prompts[2].is_poll);
        assert_eq!(prompts[2].title(), "Feedback");
    }

    #[test]
    fn test_trailing_multi_cell_prompt_reads_to_end() {
        let template: Notebook = serde_json::from_value(json!({
            "cells": [{
                "cell_type": "markdown",
                "metadata": {"is_question": true, "allow_multi_cell": true},
                "source": "## Final question"
            }],
            "metadata": {}, "nbformat": 4, "nbformat_minor": 2
        }))
        .unwrap();
        let prompts = build_prompts(&template);
        assert_eq!(prompts[0].stop, StopMarker::EndOfNotebook);
    }

    #[test]
    fn test_closest_match_within_threshold() {
        let nb = submission(["An answer.", "", ""]);
        let prompts = build_prompts(&template());
        let cells = prompts[0].closest_match(&nb.cells, MATCH_THRESHOLD, false);
        assert_eq!(cells.len(), 2);
        assert!(cells[0].is_question());
        assert_eq!(cells[1].text(), "An answer.");

        let suppressed = prompts[0].closest_match(&nb.cells, MATCH_THRESHOLD, true);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].text(), "An answer.");
    }

    #[test]
    fn test_no_match_above_threshold() {
        let nb: Notebook = serde_json::from_value(json!({
            "cells": [{"cell_type": "markdown", "metadata": {}, "source": "entirely different"}],
            "metadata": {}, "nbformat": 4, "nbformat_minor": 2
        }))
        .unwrap();
        let prompts = build_prompts(&template());
        assert!(prompts[0]
            .closest_match(&nb.cells, MATCH_THRESHOLD, false)
            .is_empty());
    }

    #[test]
    fn test_extract_statuses() {
        let submissions = vec![
            ("alice".to_string(), Some(submission(["Ownership moves.", "ex", "+1"]))),
            ("bob".to_string(), Some(submission(["", "", ""]))),
            ("carol".to_string(), None),
        ];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);

        let ex1 = &extractions[0];
        assert_eq!(
            ex1.statuses,
            vec![
                ("alice".to_string(), AnswerStatus::Answered),
                ("bob".to_string(), AnswerStatus::Blank),
            ]
        );
        assert_eq!(ex1.question_cells.len(), 1);
        assert_eq!(ex1.answers.len(), 1);
        assert_eq!(ex1.answer_text("alice").unwrap(), "Ownership moves.");
    }

    #[test]
    fn test_duplicate_answers_dropped() {
        let submissions = vec![
            ("alice".to_string(), Some(submission(["Same answer.", "", ""]))),
            ("bob".to_string(), Some(submission(["Same answer.", "", ""]))),
            ("carol".to_string(), Some(submission(["Different.", "", ""]))),
        ];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);
        let unique = extractions[0].answers_without_duplicates();
        let users: Vec<&str> = unique.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(users, vec!["alice", "carol"]);
    }

    #[test]
    fn test_combined_notebook_with_usernames() {
        let submissions = vec![(
            "alice".to_string(),
            Some(submission(["Ownership moves.", "", ""])),
        )];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);
        let full_names =
            HashMap::from([("alice".to_string(), "Alice Aalto".to_string())]);

        let combined = combined_notebook(&template(), &extractions, true, &full_names);
        let texts: Vec<String> = combined.cells.iter().map(Cell::text).collect();
        assert!(texts.contains(&"#### Alice Aalto".to_string()));
        assert!(texts.contains(&"Ownership moves.".to_string()));
    }

    #[test]
    fn test_missing_answer_report_skips_optional_and_polls() {
        let submissions = vec![("bob".to_string(), Some(submission(["", "", ""])))];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);
        let full_names = HashMap::from([("bob".to_string(), "Bob Burns".to_string())]);
        let report = missing_answer_report(&extractions, &full_names);
        // Exercise 2 is optional and Feedback is a poll; only Exercise 1 reports
        assert_eq!(report, vec!["Blank 1. Exercise 1: Bob Burns"]);
    }

    #[test]
    fn test_write_response_counts() {
        let submissions = vec![
            ("alice".to_string(), Some(submission(["Answer.", "", ""]))),
            ("bob".to_string(), Some(submission(["", "", ""]))),
        ];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);
        let students = vec![
            ("alice".to_string(), "Alice Aalto".to_string()),
            ("bob".to_string(), "Bob Burns".to_string()),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        let totals = write_response_counts(&path, &extractions, &students).unwrap();
        assert_eq!(totals[0], ("1. Exercise 1".to_string(), 1));

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), ",Total,Alice Aalto,Bob Burns");
        assert_eq!(lines.next().unwrap(), "1. Exercise 1,1,1,0");
        assert!(content.lines().last().unwrap().starts_with("Total,"));
    }

    #[test]
    fn test_write_poll_results_skips_empty() {
        let submissions = vec![
            ("alice".to_string(), Some(submission(["a", "b", "Loved it"]))),
            ("bob".to_string(), Some(submission(["a", "b", ""]))),
        ];
        let extractions = extract(&template(), &submissions, MATCH_THRESHOLD);
        let students = vec![
            ("alice".to_string(), "Alice Aalto".to_string()),
            ("bob".to_string(), "Bob Burns".to_string()),
        ];

        let dir = tempfile::tempdir().unwrap();
        let written =
            write_poll_results(dir.path(), "day2_reading", &extractions, &students).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].file_name().unwrap().to_str().unwrap().starts_with("day2_reading_"));

        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("Alice Aalto,Loved it"));
        assert!(!content.contains("Bob Burns"));
    }
}
