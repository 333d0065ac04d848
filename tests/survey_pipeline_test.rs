// End-to-end tests for the survey tools: CSV in, XLSX/HTML artifacts out

use std::io::Write;

use coursekit::report::html::render_survey_report;
use coursekit::report::xlsx::write_matrix_workbook;
use coursekit::survey::{question_matrices, report_data, Survey};

const SAMPLE: &str = "\
surveyname,part_fname,part_lname,part_uname,eval_uname,resp_fac,part_id,How did the project go?,Rate this teammate,Advice for this teammate
Design Review,Jane,Doe,jdoe,,(overall),1,Shipped on time,,
Design Review,Jane,Doe,jdoe,jdoe,\"Doe, Jane\",1,,4,Keep it up
Design Review,Jane,Doe,jdoe,jsmith,\"Smith, John\",1,,5,More tests
Design Review,John,Smith,jsmith,,(overall),2,Scope was too big,,
Design Review,John,Smith,jsmith,jsmith,\"Smith, John\",2,,3,Speak up earlier
Design Review,John,Smith,jsmith,jdoe,\"Doe, Jane\",2,,4,Share designs sooner
";

#[test]
fn survey_csv_to_matrix_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("survey.csv");
    std::fs::write(&csv_path, SAMPLE).unwrap();

    let survey = Survey::load(&csv_path).unwrap();
    assert_eq!(survey.name, "Design Review");
    assert_eq!(survey.questions.len(), 3);

    let matrices = question_matrices(&survey).unwrap();
    assert_eq!(matrices.len(), 3);

    let xlsx_path = dir.path().join("survey matrices.xlsx");
    write_matrix_workbook(&xlsx_path, &matrices).unwrap();
    assert!(xlsx_path.exists());
    // XLSX files are zip archives
    let bytes = std::fs::read(&xlsx_path).unwrap();
    assert_eq!(bytes[..2], *b"PK");
}

#[test]
fn survey_csv_to_html_report() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("survey.csv");
    std::fs::write(&csv_path, SAMPLE).unwrap();

    let survey = Survey::load(&csv_path).unwrap();
    let data = report_data(&survey).unwrap();
    assert_eq!(data.participants, vec!["Jane", "John"]);
    // Ratings are integers, so only the free-text question is an overall one
    assert_eq!(data.overall["Jane"].len(), 1);
    assert_eq!(data.peer_questions.len(), 2);

    let html = render_survey_report(&data);
    let html_path = dir.path().join("survey.html");
    std::fs::write(&html_path, &html).unwrap();

    assert!(html.contains("<title>Design Review</title>"));
    assert!(html.contains("<h1>Jane</h1>"));
    assert!(html.contains("Shipped on time"));
    assert!(html.contains("More tests"));
}

#[test]
fn survey_load_tolerates_latin1() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("survey.csv");

    // "Zoë" with a Latin-1 encoded e-diaeresis (0xEB), invalid as UTF-8
    let mut file = std::fs::File::create(&csv_path).unwrap();
    file.write_all(b"surveyname,part_fname,part_lname,part_uname,eval_uname,resp_fac,part_id,Q\n")
        .unwrap();
    file.write_all(b"S,Zo\xEB,Doe,zdoe,,(overall),1,fine\n").unwrap();
    drop(file);

    let survey = Survey::load(&csv_path).unwrap();
    assert_eq!(survey.rows[0].part_fname, "Zo\u{eb}");
}
