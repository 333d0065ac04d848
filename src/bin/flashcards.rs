//! Create an XLSX file and media folder with the names and photos of the
//! students enrolled in a course, suitable for a flashcard application.
//!
//! The input is a course-enrollment HTML page saved from a browser with its
//! image files alongside. Photos are copied into a media folder named after
//! the workbook; `--delete` removes media files for students no longer
//! enrolled.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use coursekit::cli::LogArgs;
use coursekit::enrollment::{parse_enrollment, Student};
use coursekit::hashing::files_identical;
use coursekit::report::xlsx::write_flashcard_workbook;
use coursekit::roster::Nicknames;

/// Build a flashcard deck from a course-enrollment page
#[derive(Parser, Debug)]
#[command(name = "flashcards")]
#[command(version)]
struct Args {
    /// Enrollment HTML page saved from a browser
    #[arg(value_name = "HTML_FILE")]
    html_file: PathBuf,

    /// Output workbook path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Base name for the workbook and media folder
    #[arg(long, value_name = "NAME")]
    course_name: Option<String>,

    /// Directory the workbook lands in (defaults next to the input)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Text file list of First "Nick" Last
    #[arg(long, value_name = "FILE")]
    nicknames: Option<PathBuf>,

    /// Remove media files that no longer correspond to a student
    #[arg(long)]
    delete: bool,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    args.log.init()?;

    let html = std::fs::read_to_string(&args.html_file)
        .with_context(|| format!("Failed to read {}", args.html_file.display()))?;
    let enrollment = parse_enrollment(&html)?;
    let nicknames = Nicknames::load_optional(args.nicknames.as_deref())?;

    let input_dir = args
        .html_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let basename = args
        .course_name
        .clone()
        .unwrap_or_else(|| enrollment.output_basename());
    let output_path = args.output.clone().unwrap_or_else(|| {
        args.output_dir
            .clone()
            .unwrap_or_else(|| input_dir.clone())
            .join(format!("{}.xlsx", basename))
    });
    let media_dir = output_path.with_extension("");

    let full_name = |student: &Student| {
        format!(
            "{} {}",
            nicknames.preferred_first_name(&student.first_name, &student.last_name),
            student.last_name
        )
    };
    let image_name = |student: &Student| {
        let extension = Path::new(&student.img_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        format!("{}.{}", full_name(student), extension)
    };

    let rows: Vec<(String, String, String)> = enrollment
        .students
        .iter()
        .map(|student| (String::new(), full_name(student), image_name(student)))
        .collect();
    write_flashcard_workbook(&output_path, &rows)?;
    info!("Created {}", output_path.display());

    std::fs::create_dir_all(&media_dir)
        .with_context(|| format!("Failed to create {}", media_dir.display()))?;
    for student in &enrollment.students {
        let src = input_dir.join(&student.img_path);
        let dst = media_dir.join(image_name(student));
        if dst.exists() && files_identical(&src, &dst)? {
            continue;
        }
        info!(
            "cp {} -> {}",
            src.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
            dst.file_name().and_then(|n| n.to_str()).unwrap_or_default()
        );
        std::fs::copy(&src, &dst)
            .with_context(|| format!("Failed to copy {}", src.display()))?;
    }

    if args.delete {
        let expected: HashSet<String> =
            enrollment.students.iter().map(&image_name).collect();
        for entry in std::fs::read_dir(&media_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !expected.contains(&name) {
                info!("rm {}", name);
                std::fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to remove {}", name))?;
            }
        }
    }
    Ok(())
}
