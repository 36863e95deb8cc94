use crate::cli::RunArgs;
use crate::config::{Config, OutputFormat, Registry, RunOptions};
use crate::discovery;
use crate::output::{self, RunSummary, TestReport};
use crate::runner::{self, EngineSettings, Orchestrator, ProcessLauncher};
use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn execute(args: RunArgs, verbose: bool) -> anyhow::Result<ExitCode> {
    let options = resolve_options(&args, verbose)?;
    let summary = run_pipeline(&options).await?;
    Ok(ExitCode::from(summary.exit_code()))
}

/// Merge config file, registries and CLI flags into validated options
pub fn resolve_options(args: &RunArgs, verbose: bool) -> anyhow::Result<RunOptions> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Root directory {:?} is not accessible", args.root))?;

    let config = Config::load_or_default(args.config.as_deref(), &root)?;
    config.validate()?;
    let registry = Registry::from_config(&config)?;

    let projects = registry.select_projects(args.projects.as_deref())?;
    let test_types = registry.select_test_types(args.types.as_deref())?;

    let parallel = !args.no_parallel;
    let max_concurrency = if parallel {
        args.concurrency
            .map(|c| c as usize)
            .unwrap_or(config.concurrency)
    } else {
        1
    };

    let report_dir = if args.no_report {
        None
    } else {
        let dir = args.report_dir.clone().unwrap_or(config.report_dir);
        Some(root.join(dir))
    };

    Ok(RunOptions {
        root,
        projects,
        test_types,
        parallel,
        max_concurrency,
        max_retries: args.retries.unwrap_or(config.max_retries),
        backoff_base: Duration::from_millis(config.backoff_base_ms),
        verbose,
        coverage: args.coverage,
        incremental: args.incremental,
        fail_fast: args.fail_fast,
        base_branch: args.base.clone().unwrap_or(config.base_branch),
        format: args.format,
        report_dir,
        max_output_bytes: config.max_output_bytes,
        test_env: config.test_env,
    })
}

/// Detect, plan, execute, summarize, render and persist one run
pub async fn run_pipeline(options: &RunOptions) -> anyhow::Result<RunSummary> {
    let git = discovery::detect(&options.root);

    let changed = if options.incremental {
        match discovery::changed_files(&options.root, &options.base_branch) {
            Ok(files) => {
                info!(
                    "{} files changed since {}",
                    files.len(),
                    options.base_branch
                );
                Some(files)
            }
            Err(e) => {
                warn!("Incremental filter disabled, running everything: {}", e);
                None
            }
        }
    } else {
        None
    };

    let queue = runner::plan_tasks(options, changed.as_deref())?;
    let console = options.format == OutputFormat::Console;
    if console && queue.is_empty() {
        println!("No test tasks to run");
    }

    let launcher = Arc::new(ProcessLauncher::from_options(options));
    let engine = Orchestrator::new(launcher, EngineSettings::from_options(options));
    let report = engine
        .run(queue, |result| {
            if console {
                println!("{}", output::format_task_line(result));
            }
        })
        .await;

    let summary = output::summarize(&report.results, report.total_duration);
    let test_report = TestReport::new(
        report.results,
        summary,
        git,
        options.record(),
        report.cancelled,
    );

    println!("{}", output::render(&test_report, options.format)?);

    if let Some(dir) = &options.report_dir {
        let path = output::write_report(dir, &test_report)
            .with_context(|| format!("Failed to write report under {:?}", dir))?;
        info!("Report written to {:?}", path);
        if console {
            println!("Report: {}", path.display());
        }
    }

    Ok(test_report.summary)
}
