//! Survey HTML report
//!
//! One `<section>` per participant: their overall free-text responses as a
//! definition list, then for each peer question a table of ratings received
//! from and given to each teammate, plus their self rating. The templates
//! are inline so the tool stays single-file distributable.

use std::fmt::Write as _;

use crate::survey::ReportData;

const HTML_HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/materialize/0.97.8/css/materialize.min.css">
<title>{title}</title>
<style>
    body { margin: 5pt; }
    section.participant::after { page-break-after: always; }
    dt { margin-top: 10pt; font-weight: bold; }
    th { font-weight: normal; font-style: italic; }
    th, td { vertical-align: top; padding: 2pt; }
    div.self-review { margin-top: 5pt; }
    span.label { padding-right: 5pt; font-style: italic; }
</style>
</head>
<body>
"#;

const HTML_FOOTER: &str = "</body></html>\n";

const RATED_BY_CAPTION: &str = "This person rated by teammates";
const RATED_CAPTION: &str = "This person rated teammates";

/// Render the full report document
pub fn render_survey_report(data: &ReportData) -> String {
    let mut out = String::new();
    out.push_str(&HTML_HEADER.replace("{title}", &escape(&data.survey_name)));
    for participant in &data.participants {
        render_participant(&mut out, data, participant);
    }
    out.push_str(HTML_FOOTER);
    out
}

fn render_participant(out: &mut String, data: &ReportData, participant: &str) {
    writeln!(
        out,
        "<section class=\"participant\"><h1>{}</h1>",
        escape(participant)
    )
    .unwrap();
    out.push_str("    <dl>\n");

    if let Some(responses) = data.overall.get(participant) {
        for (question, answer) in responses {
            writeln!(out, "        <dt>{}</dt>", escape(question)).unwrap();
            writeln!(out, "        <dd>{}</dd>", escape(answer)).unwrap();
        }
    }

    let teammates = data.teammates(participant);
    for question in &data.peer_questions {
        writeln!(out, "        <dt>{}</dt>", escape(question)).unwrap();
        out.push_str("        <dd>\n");
        render_peer_table(out, data, participant, question, &teammates);

        let self_review = data
            .self_reviews
            .get(participant)
            .and_then(|reviews| reviews.get(question))
            .map(String::as_str)
            .unwrap_or_default();
        writeln!(
            out,
            "            <div class=\"self-review\"><span class=\"label\">Self:</span> {}</div>",
            escape(self_review)
        )
        .unwrap();
        out.push_str("        </dd>\n");
    }

    out.push_str("    </dl>\n</section>\n");
}

fn render_peer_table(
    out: &mut String,
    data: &ReportData,
    participant: &str,
    question: &str,
    teammates: &[String],
) {
    out.push_str("            <table>\n");
    writeln!(
        out,
        "                <tr><th></th><th>{}</th><th>{}</th></tr>",
        RATED_BY_CAPTION, RATED_CAPTION
    )
    .unwrap();
    for teammate in teammates {
        let rated_by = data
            .peer_reviews
            .get(&(teammate.clone(), participant.to_string()))
            .and_then(|reviews| reviews.get(question))
            .map(String::as_str)
            .unwrap_or_default();
        let rated = data
            .peer_reviews
            .get(&(participant.to_string(), teammate.clone()))
            .and_then(|reviews| reviews.get(question))
            .map(String::as_str)
            .unwrap_or_default();
        writeln!(
            out,
            "                <tr><th>{}</th><td>{}</td><td>{}</td></tr>",
            escape(teammate),
            escape(rated_by),
            escape(rated)
        )
        .unwrap();
    }
    out.push_str("            </table>\n");
}

/// Escape text for HTML element content
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
