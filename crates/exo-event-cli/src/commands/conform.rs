//! Conformance run: the default command.

use std::sync::Arc;

use anyhow::Context;
use exo_event_testkit::file::{load_vector_file, LoadError};
use exo_event_testkit::runner::{ConformanceReport, ConformanceRunner, ReportStyle, RunnerConfig};
use exo_event_testkit::vectors::{builtin_registry, Registry};

use crate::ConformArgs;

/// Run every source and print the report. Returns whether everything passed.
///
/// A file that cannot be read aborts the run; a file that cannot be parsed
/// is reported and the remaining sources still run.
pub fn run(args: &ConformArgs) -> anyhow::Result<bool> {
    let config = RunnerConfig {
        check_canonical_bytes: !args.skip_bytes,
        include_superseded: args.include_superseded,
    };
    let runner = Arc::new(ConformanceRunner::reference(config));

    let runtime = if args.concurrent {
        Some(
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?,
        )
    } else {
        None
    };

    let evaluate = |registry: &Registry, source: &str| match &runtime {
        Some(rt) => rt.block_on(Arc::clone(&runner).run_concurrent(registry, source)),
        None => runner.run(registry, source),
    };

    let mut report = ConformanceReport::default();
    if args.files.is_empty() {
        report.merge(evaluate(&builtin_registry(), "builtin"));
    }
    for path in &args.files {
        let source = path.display().to_string();
        match load_vector_file(path) {
            Ok(registry) => report.merge(evaluate(&registry, &source)),
            Err(LoadError::Format { source: err, .. }) => report.record_load_failure(source, err),
            Err(err @ LoadError::Io { .. }) => return Err(err.into()),
        }
    }

    let style = if args.digests {
        ReportStyle::Digest
    } else {
        ReportStyle::Verdict
    };
    for line in report.lines(style) {
        println!("{}", line);
    }
    tracing::info!(summary = %report, "conformance run finished");

    Ok(report.is_success())
}
