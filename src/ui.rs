// Terminal output for the end-of-run summary

use colored::Colorize;

use crate::domain::tag::TagOutcome;
use crate::services::RunReport;

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// Count of tag results per outcome, in display order
pub fn tag_counts(report: &RunReport) -> Vec<(TagOutcome, usize)> {
    [
        TagOutcome::Created,
        TagOutcome::AlreadyExists,
        TagOutcome::Deleted,
        TagOutcome::Absent,
    ]
    .into_iter()
    .map(|outcome| {
        let count = report
            .tags
            .results
            .iter()
            .filter(|r| r.outcome == outcome)
            .count();
        (outcome, count)
    })
    .filter(|(_, count)| *count > 0)
    .collect()
}

/// Build types the release build depends on, as one line
pub fn dependency_line(report: &RunReport) -> Option<String> {
    let build_types = &report.metadata.dependency_build_types;
    if build_types.is_empty() {
        return None;
    }
    let names: Vec<&str> = build_types.iter().map(String::as_str).collect();
    Some(format!("Dependency build types: {}", names.join(", ")))
}

pub fn print_summary(title: &str, report: &RunReport) {
    print_header(title);

    if let Some(line) = dependency_line(report) {
        print_info(&line);
    }

    print_info(&format!(
        "Pins: {} updated, {} failed",
        report.pins.updated.len(),
        report.pins.failed.len()
    ));
    print_info(&format!(
        "Repositories: {} mapped, {} excluded roots, {} dropped edges",
        report.mapping.map.len(),
        report.mapping.excluded.len(),
        report.mapping.dropped.len()
    ));
    for (endpoint, hash) in report.mapping.map.iter() {
        println!("   {} {}", endpoint, hash.dimmed());
    }

    let counts: Vec<String> = tag_counts(report)
        .into_iter()
        .map(|(outcome, count)| format!("{} {}", count, outcome.name()))
        .collect();
    if counts.is_empty() {
        print_info("Tags: none");
    } else {
        print_info(&format!("Tags: {}", counts.join(", ")));
    }

    if let Some(e) = &report.build_tag_error {
        print_warning(&e.to_string());
    }
    for e in &report.pins.failed {
        print_warning(&e.to_string());
    }
    for e in &report.mapping.dropped {
        print_warning(&e.to_string());
    }
    for e in &report.tags.failed {
        print_warning(&e.to_string());
    }

    if report.failure_count() == 0 {
        print_success(&format!(
            "Done in {:.1}s",
            report.duration.as_secs_f64()
        ));
    } else {
        print_error(&format!(
            "Done in {:.1}s with {} failures, rerun to retry",
            report.duration.as_secs_f64(),
            report.failure_count()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;
    use crate::domain::build::BuildIdentifier;
    use crate::domain::tag::TagMode;
    use crate::infrastructure::fakes::{revision, FakeCi, FakeVcs};
    use crate::services::{ReleaseRequest, TagService};
    use std::sync::Arc;

    #[test]
    fn test_summary_counts_and_build_types() {
        let ci = Arc::new(
            FakeCi::new()
                .with_property("dep.fw_core.system.build.number", "101")
                .with_property("dep.sim.system.build.vcs.number", "9f1c")
                .with_snapshot_build("/app/rest/builds/id:1", vec![revision("acme_a", "aaa")])
                .with_snapshot_build("/app/rest/builds/id:2", vec![revision("acme_b", "bbb")])
                .with_root("acme_a", "git@bitbucket.org:acme/a.git")
                .with_root("acme_b", "git@bitbucket.org:acme/b.git"),
        );
        let vcs = Arc::new(FakeVcs::new());
        let service = TagService::new(ci, vcs, MappingConfig::default(), 2);
        let request = ReleaseRequest {
            build: BuildIdentifier::new("bt", "1"),
            release: "1.0.0".to_string(),
            mode: TagMode::Create,
        };

        let report = tokio_test::block_on(service.execute(&request)).unwrap();

        assert_eq!(tag_counts(&report), vec![(TagOutcome::Created, 2)]);
        assert_eq!(
            dependency_line(&report).as_deref(),
            Some("Dependency build types: fw_core, sim")
        );
        print_summary("Release 1.0.0", &report);
    }
}
