//! Aggregate command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::AggregateArgs;
use console::style;
use fuzzcov::{
    select_format, AggregationConfig, Aggregator, FuzzcovError, PathNormalizer, ProjectReport,
};
use serde::Serialize;

/// One line of the JSON result printed by `aggregate --json`
#[derive(Debug, Serialize)]
pub struct ProjectResultJson<'a> {
    /// Project name
    pub project: &'a str,
    /// Whether the project's report was published
    pub ok: bool,
    /// Report details on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ProjectReport>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the path normalizer from the command line
#[must_use]
pub fn build_normalizer(args: &AggregateArgs) -> PathNormalizer {
    let base = if args.no_default_prefixes {
        PathNormalizer::without_prefixes()
    } else {
        PathNormalizer::new()
    };
    args.strip_prefixes
        .iter()
        .fold(base, |normalizer, prefix| normalizer.with_prefix(prefix))
}

/// Build the aggregation settings from the command line
pub fn build_aggregation_config(
    config: &CliConfig,
    args: &AggregateArgs,
) -> CliResult<AggregationConfig> {
    let format = select_format(args.format, args.language.as_deref())?;
    let mut aggregation = AggregationConfig::new(&config.report_root, format)
        .with_normalizer(build_normalizer(args))
        .with_jobs(config.parallel_jobs);
    if let Some(root) = &args.source_root {
        aggregation = aggregation.with_source_root(root);
    }
    Ok(aggregation)
}

/// Execute the aggregate command
pub fn execute_aggregate(config: &CliConfig, args: &AggregateArgs) -> CliResult<()> {
    let aggregator = Aggregator::new(build_aggregation_config(config, args)?);
    tracing::info!(
        format = %aggregator.config().format,
        toolchain = aggregator.config().format.toolchain(),
        "artifact format selected"
    );

    let results: Vec<(String, Result<ProjectReport, FuzzcovError>)> = match &args.project {
        Some(project) => {
            let result = aggregator.aggregate_project(&args.store.join(project));
            vec![(project.clone(), result)]
        }
        None => aggregator
            .aggregate_fleet(&args.store)?
            .projects
            .into_iter()
            .map(|outcome| (outcome.project, outcome.result))
            .collect(),
    };

    if args.json {
        print_json(&results)?;
    } else if !config.verbosity.is_quiet() {
        for (project, result) in &results {
            print_result(project, result);
        }
    }

    let total = results.len();
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if args.project.is_some() {
        if let Some((_, Err(e))) = results.into_iter().next() {
            return Err(e.into());
        }
        return Ok(());
    }
    if failed > 0 {
        return Err(CliError::ProjectsFailed { failed, total });
    }
    Ok(())
}

fn print_json(results: &[(String, Result<ProjectReport, FuzzcovError>)]) -> CliResult<()> {
    let rows: Vec<ProjectResultJson<'_>> = results
        .iter()
        .map(|(project, result)| ProjectResultJson {
            project,
            ok: result.is_ok(),
            report: result.as_ref().ok(),
            error: result.as_ref().err().map(ToString::to_string),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_result(project: &str, result: &Result<ProjectReport, FuzzcovError>) {
    match result {
        Ok(report) => {
            println!(
                "{} {}  lines {}/{} ({:.2}%)  {}",
                style("✓").green(),
                style(project).bold(),
                report.lines.covered,
                report.lines.total,
                report.lines.percent(),
                report.outputs.html.display()
            );
            let skipped = report.coverage_warnings.len() + report.profiling_warnings.len();
            if skipped > 0 {
                println!(
                    "  {} {skipped} artifact(s) skipped, see summary.txt",
                    style("!").yellow()
                );
            }
        }
        Err(e) => println!("{} {}  {e}", style("✗").red(), style(project).bold()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;
    use fuzzcov::ArtifactFormat;

    fn parse(extra: &[&str]) -> AggregateArgs {
        let mut argv = vec!["fuzzcov", "aggregate", "--store", "/store"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Aggregate(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_normalizer_keeps_default_prefix() {
        let normalizer = build_normalizer(&parse(&["--strip-prefix", "/work"]));
        assert_eq!(normalizer.normalize("/src/p/a.c"), "p/a.c");
        assert_eq!(normalizer.normalize("/work/p/a.c"), "p/a.c");
    }

    #[test]
    fn test_normalizer_without_defaults() {
        let normalizer = build_normalizer(&parse(&["--no-default-prefixes"]));
        assert_eq!(normalizer.normalize("/src/p/a.c"), "/src/p/a.c");
    }

    #[test]
    fn test_format_override_wins() {
        let args = parse(&["--language", "c++", "--format", "lcov"]);
        let aggregation = build_aggregation_config(&CliConfig::new(), &args).unwrap();
        assert_eq!(aggregation.format, ArtifactFormat::Lcov);
    }

    #[test]
    fn test_language_selects_format() {
        let args = parse(&["--language", "python"]);
        let aggregation = build_aggregation_config(&CliConfig::new(), &args).unwrap();
        assert_eq!(aggregation.format, ArtifactFormat::CoveragePy);
    }

    #[test]
    fn test_unknown_language_fails() {
        let args = parse(&["--language", "cobol"]);
        assert!(build_aggregation_config(&CliConfig::new(), &args).is_err());
    }
}
