// End-to-end test for notebook answer extraction: a template and a set of
// submissions in, a combined notebook and summary CSVs out

use serde_json::json;
use std::collections::HashMap;

use coursekit::notebook::extract::{
    combined_notebook, extract, missing_answer_report, write_poll_results,
    write_response_counts, AnswerStatus, MATCH_THRESHOLD,
};
use coursekit::notebook::{Cell, Notebook};

fn template() -> Notebook {
    serde_json::from_value(json!({
        "cells": [
            {
                "cell_type": "markdown",
                "metadata": {"is_question": true},
                "source": "## Exercise 1\nDescribe the borrow checker."
            },
            {"cell_type": "markdown", "metadata": {}, "source": ""},
            {
                "cell_type": "markdown",
                "metadata": {"is_question": true, "is_poll": true, "problem": "Feedback"},
                "source": "## Reading Journal feedback\nHow was this reading?"
            },
            {"cell_type": "markdown", "metadata": {}, "source": ""}
        ],
        "metadata": {"language_info": {"name": "python"}},
        "nbformat": 4,
        "nbformat_minor": 2
    }))
    .unwrap()
}

fn submission(answer: &str, poll: &str) -> Notebook {
    let template = template();
    let mut cells = template.cells.clone();
    cells[1] = markdown_cell(answer);
    cells[3] = markdown_cell(poll);
    template.with_cells(cells)
}

fn markdown_cell(source: &str) -> Cell {
    serde_json::from_value(json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": source
    }))
    .unwrap()
}

#[test]
fn extraction_pipeline_produces_all_artifacts() {
    let submissions = vec![
        (
            "alice".to_string(),
            Some(submission("Borrows must not outlive owners.", "Great")),
        ),
        ("bob".to_string(), Some(submission("", ""))),
        ("carol".to_string(), None),
    ];
    let full_names: HashMap<String, String> = HashMap::from([
        ("alice".to_string(), "Alice Aalto".to_string()),
        ("bob".to_string(), "Bob Burns".to_string()),
        ("carol".to_string(), "Carol Chen".to_string()),
    ]);

    let template = template();
    let extractions = extract(&template, &submissions, MATCH_THRESHOLD);
    assert_eq!(extractions.len(), 2);

    let exercise = &extractions[0];
    assert_eq!(
        exercise.statuses,
        vec![
            ("alice".to_string(), AnswerStatus::Answered),
            ("bob".to_string(), AnswerStatus::Blank),
        ]
    );

    // Missing-answer report covers the mandatory question only
    let report = missing_answer_report(&extractions, &full_names);
    assert_eq!(report, vec!["Blank 1. Exercise 1: Bob Burns"]);

    // Combined notebook keeps the template metadata and carries the answer
    let combined = combined_notebook(&template, &extractions, false, &full_names);
    assert_eq!(combined.metadata, template.metadata);
    let texts: Vec<String> = combined.cells.iter().map(|c| c.text()).collect();
    assert!(texts.iter().any(|t| t == "Borrows must not outlive owners."));
    assert!(texts.iter().any(|t| t.starts_with("## Exercise 1")));

    // Summary CSVs
    let dir = tempfile::tempdir().unwrap();
    let students = vec![
        ("alice".to_string(), "Alice Aalto".to_string()),
        ("bob".to_string(), "Bob Burns".to_string()),
    ];
    let counts_path = dir.path().join("day2_response_counts.csv");
    let totals = write_response_counts(&counts_path, &extractions, &students).unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].1, 1);
    let counts = std::fs::read_to_string(&counts_path).unwrap();
    assert!(counts.starts_with(",Total,Alice Aalto,Bob Burns"));

    let polls = write_poll_results(dir.path(), "day2", &extractions, &students).unwrap();
    assert_eq!(polls.len(), 1);
    let poll = std::fs::read_to_string(&polls[0]).unwrap();
    assert!(poll.contains("Alice Aalto,Great"));
    assert!(!poll.contains("Bob Burns"));

    // Round trip: the combined notebook parses back
    let notebook_path = dir.path().join("day2_responses.ipynb");
    combined.write_to(&notebook_path).unwrap();
    let reread = Notebook::from_path(&notebook_path).unwrap();
    assert_eq!(reread.cells.len(), combined.cells.len());
}

#[test]
fn duplicate_answers_collapse_without_usernames() {
    let submissions = vec![
        ("alice".to_string(), Some(submission("Same words.", ""))),
        ("bob".to_string(), Some(submission("Same words.", ""))),
    ];
    let full_names = HashMap::new();
    let template = template();
    let extractions = extract(&template, &submissions, MATCH_THRESHOLD);

    let collapsed = combined_notebook(&template, &extractions, false, &full_names);
    let answers = collapsed
        .cells
        .iter()
        .filter(|c| c.text() == "Same words.")
        .count();
    assert_eq!(answers, 1);

    let with_names = combined_notebook(&template, &extractions, true, &full_names);
    let answers = with_names
        .cells
        .iter()
        .filter(|c| c.text() == "Same words.")
        .count();
    assert_eq!(answers, 2);
}
