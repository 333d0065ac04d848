//! README collation
//!
//! Repositories generated from a template are annotated with the student
//! login (the repo name minus the generated names' common prefix) and a
//! display name from the roster, then their READMEs are collated into one
//! Markdown document with a section per student.

use chrono::{DateTime, FixedOffset};
use log::warn;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::github::graphql::OrgRepo;
use crate::roster::Roster;
use crate::text::{increment_headings, longest_common_prefix};

/// A commit authored in a generated repository
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub oid: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

/// A generated repository annotated for collation
#[derive(Debug, Clone)]
pub struct StudentRepo {
    pub name: String,
    pub login: String,
    pub author: String,
    pub readme: Option<String>,
    /// Commits not authored by the instructor
    pub commits: Vec<CommitInfo>,
}

/// Annotate generated repos with logins, display names, and student commits.
///
/// The login is the repo name with the longest common prefix of all the
/// generated names stripped. Commits whose author email matches
/// `instructor_email` are dropped; the template's own history shows up in
/// every generated repo with that authorship.
pub fn annotate_repos(
    repos: &[OrgRepo],
    roster: &Roster,
    instructor_email: Option<&str>,
) -> Vec<StudentRepo> {
    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    let common_prefix = longest_common_prefix(&names);

    repos
        .iter()
        .map(|repo| {
            let login = repo.name[common_prefix.len()..].to_string();
            let author = roster.display_name(&login);
            let commits = repo
                .history()
                .into_iter()
                .filter(|commit| match (instructor_email, commit.author.as_ref()) {
                    (Some(instructor), Some(author)) => {
                        author.email.as_deref() != Some(instructor)
                    }
                    _ => true,
                })
                .map(|commit| CommitInfo {
                    oid: commit.oid.clone(),
                    author_name: commit.author.as_ref().and_then(|a| a.name.clone()),
                    author_email: commit.author.as_ref().and_then(|a| a.email.clone()),
                    date: commit.author.as_ref().and_then(|a| a.date),
                })
                .collect();
            StudentRepo {
                name: repo.name.clone(),
                login,
                author,
                readme: repo.readme.as_ref().map(|b| b.text.clone()),
                commits,
            }
        })
        .collect()
}

/// One collated section: the student's README, retitled and with its
/// headings demoted one level so section titles stay at the top.
pub fn readme_section(author: &str, readme_text: &str) -> String {
    let about = readme_text.trim();
    let (heading, body) = match about.strip_prefix("# ") {
        Some(_) => {
            let mut parts = about.splitn(2, '\n');
            let heading = parts.next().unwrap_or_default().to_string();
            let body = parts.next().unwrap_or_default();
            (Some(heading), body)
        }
        None => (None, about),
    };

    let mut title = match heading {
        Some(heading) if heading != "# About Me" => heading,
        _ => format!("# {}", author),
    };
    if !title.contains(author) {
        write!(title, " ({})", author).unwrap();
    }

    increment_headings(&format!("{}\n{}", title, body))
}

/// Collate repo READMEs into one Markdown document. Repos with no README
/// are skipped with a warning.
pub fn collate(repos: &[StudentRepo]) -> String {
    let mut output = String::new();
    for repo in repos {
        let Some(readme) = &repo.readme else {
            warn!("{}: no README; skipping", repo.login);
            continue;
        };
        output.push_str(&readme_section(&repo.author, readme));
        output.push_str("\n\n---\n\n");
    }
    output
}

/// Late-assignment report: repos with no commits, with only late commits,
/// and with some late commits, each repo reported once in that priority
/// order, followed by the late timestamps per student.
pub fn late_report(repos: &[StudentRepo], deadline: DateTime<FixedOffset>) -> String {
    let is_late =
        |commit: &CommitInfo| commit.date.map(|date| date > deadline).unwrap_or(false);

    let no_commits: Vec<&StudentRepo> = repos.iter().filter(|r| r.commits.is_empty()).collect();
    let all_late: Vec<&StudentRepo> = repos
        .iter()
        .filter(|r| !r.commits.is_empty() && r.commits.iter().all(is_late))
        .collect();
    let some_late: Vec<&StudentRepo> = repos
        .iter()
        .filter(|r| r.commits.iter().any(is_late))
        .collect();

    let mut output = String::new();
    let mut reported: Vec<&str> = Vec::new();
    for (label, group) in [
        ("No commits", no_commits),
        ("Late", all_late),
        ("Some late commits", some_late),
    ] {
        let fresh: Vec<&StudentRepo> = group
            .into_iter()
            .filter(|r| !reported.contains(&r.login.as_str()))
            .collect();
        if fresh.is_empty() {
            continue;
        }
        let mut logins: Vec<&str> = fresh.iter().map(|r| r.login.as_str()).collect();
        logins.sort_unstable();
        writeln!(output, "{}: {}", label, logins.join(", ")).unwrap();
        reported.extend(logins);
    }

    for repo in repos {
        let late_dates: BTreeSet<DateTime<FixedOffset>> = repo
            .commits
            .iter()
            .filter(|c| is_late(c))
            .filter_map(|c| c.date)
            .collect();
        if late_dates.is_empty() {
            continue;
        }
        writeln!(output, "  {}:", repo.login).unwrap();
        for date in late_dates {
            writeln!(output, "    {}", date.format("%H:%M %a, %b %-d")).unwrap();
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn student(login: &str, commits: Vec<CommitInfo>) -> StudentRepo {
        StudentRepo {
            name: format!("1-WELCOME-{}", login),
            login: login.to_string(),
            author: login.to_string(),
            readme: Some("# About Me\nHello.".to_string()),
            commits,
        }
    }

    fn commit(date: &str) -> CommitInfo {
        CommitInfo {
            oid: "oid".to_string(),
            author_name: Some("Student".to_string()),
            author_email: Some("student@example.edu".to_string()),
            date: Some(DateTime::parse_from_rfc3339(date).unwrap()),
        }
    }

    #[test]
    fn test_readme_section_replaces_about_me_title() {
        let section = readme_section("Alice Aalto", "# About Me\nHello there.");
        assert!(section.starts_with("## Alice Aalto\n"));
        assert!(section.contains("Hello there."));
    }

    #[test]
    fn test_readme_section_appends_name_to_custom_title() {
        let section = readme_section("Bob Burns", "# My Semester\nNotes.");
        assert!(section.starts_with("## My Semester (Bob Burns)\n"));
    }

    #[test]
    fn test_readme_section_keeps_title_mentioning_name() {
        let section = readme_section("Bob", "# Bob's Page\nNotes.");
        assert!(section.starts_with("## Bob's Page\n"));
        assert!(!section.contains("(Bob)"));
    }

    #[test]
    fn test_readme_section_without_title() {
        let section = readme_section("Carol Chen", "Just some text.\n## Interests\nRust.");
        // No H1 in the body, so the added title makes one and everything shifts
        assert!(section.starts_with("## Carol Chen\n"));
        assert!(section.contains("### Interests"));
    }

    #[test]
    fn test_collate_skips_missing_readme() {
        let mut with_readme = student("alice", vec![]);
        with_readme.author = "Alice".to_string();
        let mut without = student("bob", vec![]);
        without.readme = None;
        let output = collate(&[with_readme, without]);
        assert!(output.contains("Alice"));
        assert!(!output.contains("bob"));
        assert_eq!(output.matches("\n---\n").count(), 1);
    }

    #[test]
    fn test_late_report_groups() {
        let deadline = chrono::FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2019, 9, 9, 3, 0, 0)
            .unwrap()
            .fixed_offset();
        let repos = vec![
            student("empty", vec![]),
            student("ontime", vec![commit("2019-09-08T10:00:00+08:00")]),
            student("late", vec![commit("2019-09-10T10:00:00+08:00")]),
            student(
                "mixed",
                vec![
                    commit("2019-09-08T10:00:00+08:00"),
                    commit("2019-09-10T11:00:00+08:00"),
                ],
            ),
        ];
        let report = late_report(&repos, deadline);
        assert!(report.contains("No commits: empty"));
        assert!(report.contains("Late: late"));
        // The all-late repo is not repeated in the some-late group
        assert!(report.contains("Some late commits: mixed"));
        assert!(!report.contains("Some late commits: late"));
        assert!(report.contains("  mixed:"));
        assert!(!report.contains("ontime:"));
    }
}
