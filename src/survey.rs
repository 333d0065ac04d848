//! Peer-and-self survey tables
//!
//! The survey export is one CSV row per (participant, evaluatee) pair, with
//! identity columns first and one column per survey question after the
//! `part_id` column. `part` abbreviates `participant`, matching the input
//! CSV columns. Rows with an empty evaluatee carry the participant's
//! overall responses.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::roster::short_names;
use crate::text::decode_text;

const FIRST_NAME_COLUMN: &str = "part_fname";
const LAST_NAME_COLUMN: &str = "part_lname";
const USER_NAME_COLUMN: &str = "part_uname";
const EVAL_USER_COLUMN: &str = "eval_uname";
const RESPONSE_FACTOR_COLUMN: &str = "resp_fac";
const SURVEY_NAME_COLUMN: &str = "surveyname";
/// Everything after this column is a survey question
const LAST_IDENTITY_COLUMN: &str = "part_id";

/// The literal evaluatee name of the overall (non-peer) response column
pub const OVERALL: &str = "(overall)";

/// One survey response row
#[derive(Debug, Clone)]
pub struct SurveyRow {
    pub part_fname: String,
    pub part_lname: String,
    pub part_uname: String,
    pub eval_uname: Option<String>,
    pub resp_fac: Option<String>,
    /// Aligned with [`Survey::questions`]; empty string marks no answer
    pub answers: Vec<String>,
}

impl SurveyRow {
    /// "First Last" of the participant
    pub fn participant_full_name(&self) -> String {
        format!("{} {}", self.part_fname, self.part_lname)
    }

    /// The evaluatee name from `resp_fac`: "Last, First" reversed, with
    /// `(overall)` passed through
    pub fn evaluatee_full_name(&self) -> Option<String> {
        let resp_fac = self.resp_fac.as_deref()?.trim();
        if resp_fac.is_empty() {
            return None;
        }
        if resp_fac == OVERALL {
            return Some(OVERALL.to_string());
        }
        let mut parts: Vec<&str> = resp_fac.splitn(2, ", ").collect();
        parts.reverse();
        Some(parts.join(" "))
    }
}

/// A parsed survey export
#[derive(Debug)]
pub struct Survey {
    pub name: String,
    pub questions: Vec<String>,
    pub rows: Vec<SurveyRow>,
}

impl Survey {
    /// Load a survey CSV. ISO-8859-1 files are tolerated.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read survey: {}", path.display()))?;
        Self::parse(&decode_text(&bytes))
            .with_context(|| format!("Failed to parse survey: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = reader.headers().context("Failed to read survey headers")?.clone();

        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("Survey has no {:?} column", name))
        };
        let fname_ix = column(FIRST_NAME_COLUMN)?;
        let lname_ix = column(LAST_NAME_COLUMN)?;
        let uname_ix = column(USER_NAME_COLUMN)?;
        let part_id_ix = column(LAST_IDENTITY_COLUMN)?;
        let eval_ix = headers.iter().position(|h| h.trim() == EVAL_USER_COLUMN);
        let resp_fac_ix = headers.iter().position(|h| h.trim() == RESPONSE_FACTOR_COLUMN);
        let survey_name_ix = headers.iter().position(|h| h.trim() == SURVEY_NAME_COLUMN);

        let first_question_ix = part_id_ix + 1;
        let questions: Vec<String> = headers
            .iter()
            .skip(first_question_ix)
            .map(str::to_string)
            .collect();

        let mut name = String::new();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read survey row")?;
            let get = |ix: usize| record.get(ix).unwrap_or("").trim().to_string();
            if name.is_empty() {
                if let Some(ix) = survey_name_ix {
                    name = get(ix);
                }
            }
            let optional = |ix: Option<usize>| {
                ix.map(|ix| get(ix)).filter(|value| !value.is_empty())
            };
            let answers = (first_question_ix..headers.len()).map(|ix| get(ix)).collect();
            rows.push(SurveyRow {
                part_fname: get(fname_ix),
                part_lname: get(lname_ix),
                part_uname: get(uname_ix),
                eval_uname: optional(eval_ix),
                resp_fac: optional(resp_fac_ix),
                answers,
            });
        }

        Ok(Self { name, questions, rows })
    }

    /// Participant short names keyed by username: a first name when unique
    /// among the participants, else the full name
    pub fn short_names_by_username(&self) -> HashMap<String, String> {
        let pairs: Vec<(String, String)> = self
            .rows
            .iter()
            .map(|row| (row.part_fname.clone(), row.part_lname.clone()))
            .collect();
        let names = short_names(&pairs);
        self.rows
            .iter()
            .map(|row| {
                let pair = (row.part_fname.clone(), row.part_lname.clone());
                (row.part_uname.clone(), names[&pair].clone())
            })
            .collect()
    }
}

/// One question pivoted into a rater × ratee matrix
#[derive(Debug)]
pub struct MatrixTable {
    pub title: String,
    pub raters: Vec<String>,
    pub ratees: Vec<String>,
    /// `cells[rater][ratee]`; `None` marks no response
    pub cells: Vec<Vec<Option<String>>>,
}

/// Pivot every question column into a matrix, using `resp_fac` to name the
/// ratee. Ratee columns with no responses at all are dropped.
pub fn question_matrices(survey: &Survey) -> Result<Vec<MatrixTable>> {
    let mut rater_set = HashSet::new();
    let mut ratee_set = HashSet::new();
    for row in &survey.rows {
        rater_set.insert(row.participant_full_name());
        if let Some(ratee) = row.evaluatee_full_name() {
            ratee_set.insert(ratee);
        }
    }
    let mut raters: Vec<String> = rater_set.into_iter().collect();
    raters.sort();
    let mut ratees: Vec<String> = ratee_set.into_iter().collect();
    ratees.sort();

    let non_overall: Vec<&String> = ratees.iter().filter(|r| *r != OVERALL).collect();
    if raters.iter().collect::<Vec<_>>() != non_overall {
        return Err(anyhow::anyhow!(
            "Survey raters and ratees disagree: raters {:?}, ratees {:?}",
            raters,
            ratees
        ));
    }

    let mut matrices = Vec::new();
    for (question_ix, title) in survey.questions.iter().enumerate() {
        let mut scores: HashMap<(String, String), String> = HashMap::new();
        for row in &survey.rows {
            let Some(ratee) = row.evaluatee_full_name() else {
                continue;
            };
            let answer = row.answers.get(question_ix).cloned().unwrap_or_default();
            if !answer.is_empty() {
                scores.insert((row.participant_full_name(), ratee), answer);
            }
        }

        // Drop ratee columns that are empty for every rater
        let kept_ratees: Vec<String> = ratees
            .iter()
            .filter(|ratee| {
                raters
                    .iter()
                    .any(|rater| scores.contains_key(&(rater.clone(), (*ratee).clone())))
            })
            .cloned()
            .collect();
        if kept_ratees.is_empty() {
            continue;
        }

        let cells = raters
            .iter()
            .map(|rater| {
                kept_ratees
                    .iter()
                    .map(|ratee| scores.get(&(rater.clone(), ratee.clone())).cloned())
                    .collect()
            })
            .collect();
        matrices.push(MatrixTable {
            title: title.clone(),
            raters: raters.clone(),
            ratees: kept_ratees,
            cells,
        });
    }
    Ok(matrices)
}

/// The survey pivoted for the per-participant report
#[derive(Debug)]
pub struct ReportData {
    pub survey_name: String,
    /// Sorted participant short names
    pub participants: Vec<String>,
    /// Participant -> (question, answer) pairs for the overall questions
    pub overall: HashMap<String, Vec<(String, String)>>,
    pub peer_questions: Vec<String>,
    /// Participant -> question -> their self rating
    pub self_reviews: HashMap<String, HashMap<String, String>>,
    /// (rater, ratee) -> question -> rating
    pub peer_reviews: HashMap<(String, String), HashMap<String, String>>,
}

impl ReportData {
    /// Teammates of a participant: everyone they rated or were rated by
    pub fn teammates(&self, participant: &str) -> Vec<String> {
        let mut teammates: Vec<String> = self
            .participants
            .iter()
            .filter(|other| *other != participant)
            .filter(|other| {
                self.peer_reviews
                    .contains_key(&(participant.to_string(), (*other).clone()))
                    || self
                        .peer_reviews
                        .contains_key(&((*other).clone(), participant.to_string()))
            })
            .cloned()
            .collect();
        teammates.sort();
        teammates
    }
}

/// Partition the survey into overall, self-review, and peer-review tables.
///
/// A question belongs to a partition when every row of that partition
/// answered it; the overall partition additionally excludes integer-valued
/// (rating) columns, leaving the free-text questions.
pub fn report_data(survey: &Survey) -> Result<ReportData> {
    let short = survey.short_names_by_username();
    let short_of = |row: &SurveyRow| -> String {
        short
            .get(&row.part_uname)
            .cloned()
            .unwrap_or_else(|| row.participant_full_name())
    };
    let eval_short_of = |row: &SurveyRow| -> Option<String> {
        row.eval_uname.as_ref().and_then(|uname| short.get(uname)).cloned()
    };

    let overall_rows: Vec<&SurveyRow> = survey
        .rows
        .iter()
        .filter(|row| eval_short_of(row).is_none())
        .collect();
    let self_rows: Vec<&SurveyRow> = survey
        .rows
        .iter()
        .filter(|row| eval_short_of(row).as_deref() == Some(short_of(row).as_str()))
        .collect();
    let peer_rows: Vec<&SurveyRow> = survey
        .rows
        .iter()
        .filter(|row| {
            matches!(eval_short_of(row), Some(eval) if eval != short_of(row))
        })
        .collect();

    let answered_by_all = |rows: &[&SurveyRow], question_ix: usize| {
        !rows.is_empty()
            && rows
                .iter()
                .all(|row| row.answers.get(question_ix).map_or(false, |a| !a.is_empty()))
    };
    let all_integers = |rows: &[&SurveyRow], question_ix: usize| {
        rows.iter().all(|row| {
            row.answers
                .get(question_ix)
                .map_or(false, |a| a.parse::<i64>().is_ok())
        })
    };

    let overall_questions: Vec<usize> = (0..survey.questions.len())
        .filter(|&ix| answered_by_all(&overall_rows, ix) && !all_integers(&overall_rows, ix))
        .collect();
    let peer_question_ixs: Vec<usize> = (0..survey.questions.len())
        .filter(|&ix| answered_by_all(&peer_rows, ix))
        .collect();
    let self_question_ixs: Vec<usize> = (0..survey.questions.len())
        .filter(|&ix| answered_by_all(&self_rows, ix))
        .collect();

    let mut overall: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for row in &overall_rows {
        overall.entry(short_of(row)).or_insert_with(|| {
            overall_questions
                .iter()
                .map(|&ix| (survey.questions[ix].clone(), row.answers[ix].clone()))
                .collect()
        });
    }

    let mut self_reviews: HashMap<String, HashMap<String, String>> = HashMap::new();
    for row in &self_rows {
        let reviews = self_question_ixs
            .iter()
            .map(|&ix| (survey.questions[ix].clone(), row.answers[ix].clone()))
            .collect();
        self_reviews.insert(short_of(row), reviews);
    }

    let mut peer_reviews: HashMap<(String, String), HashMap<String, String>> = HashMap::new();
    for row in &peer_rows {
        let Some(ratee) = eval_short_of(row) else {
            continue;
        };
        let reviews = peer_question_ixs
            .iter()
            .map(|&ix| (survey.questions[ix].clone(), row.answers[ix].clone()))
            .collect();
        peer_reviews.insert((short_of(row), ratee), reviews);
    }

    let mut participants: Vec<String> = survey
        .rows
        .iter()
        .map(|row| short_of(row))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    participants.sort();

    Ok(ReportData {
        survey_name: survey.name.clone(),
        participants,
        overall,
        peer_questions: peer_question_ixs
            .iter()
            .map(|&ix| survey.questions[ix].clone())
            .collect(),
        self_reviews,
        peer_reviews,
    })
}
