use anyhow::{Context, Result};
use std::sync::Arc;
use stepflow::cli::commands::{HistoryCommand, PlanCommand, RunCommand, ValidateCommand};
use stepflow::cli::output::*;
use stepflow::cli::{Cli, Command};
use stepflow::core::config::PipelineConfig;
use stepflow::core::{ExecutionStatus, RunOutcome};
use stepflow::execution::{plan, ExecutionEngine, ExecutionEvent};
use stepflow::persistence::{InMemoryPersistence, PersistenceBackend, RunSummary};
use stepflow::ActionDispatcher;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Plan(cmd) => show_plan(cmd)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    Ok(Arc::new(stepflow::persistence::SqliteRunStore::with_default_path().await?))
}

#[cfg(not(feature = "sqlite"))]
async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    debug!("Built without sqlite, history is kept in memory only");
    Ok(Arc::new(InMemoryPersistence::new()))
}

fn load_config(file: &str) -> Result<PipelineConfig> {
    PipelineConfig::from_file(file).with_context(|| format!("Failed to load pipeline config {}", file))
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let mut config = load_config(&cmd.file)?;
    config.apply_env_overrides(&cmd.env);
    for (key, value) in &cmd.env {
        println!(
            "{} Env override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let pipeline = config.to_pipeline();
    println!("{} Loaded pipeline: {}", INFO, style(&pipeline.name).bold());

    // Nothing is spawned until the graph is known to be sound.
    let execution_plan = match plan(&pipeline) {
        Ok(execution_plan) => execution_plan,
        Err(e) => {
            println!("{} Planning failed:", CROSS);
            println!("  {}", style(&e).red());
            std::process::exit(1);
        }
    };
    debug!("Planned {} levels", execution_plan.len());

    let store: Arc<dyn PersistenceBackend> = if cmd.no_history {
        Arc::new(InMemoryPersistence::new())
    } else {
        open_history().await?
    };

    let mut engine = ExecutionEngine::new(ActionDispatcher::default());
    if let Some(dir) = &cmd.log_dir {
        engine = engine.with_log_dir(dir);
    }

    let progress = create_progress_bar(execution_plan.len());
    let bar = progress.clone();
    engine.add_event_handler(move |event| {
        match event {
            ExecutionEvent::LevelStarted { index, step_ids } => {
                bar.set_position(*index as u64);
                bar.set_message(step_ids.join(", "));
            }
            ExecutionEvent::StepLog { step_id, log } => bar.println(format_step_log(step_id, log)),
            ExecutionEvent::PipelineFinished { .. } => bar.set_position(bar.length().unwrap_or(0)),
            _ => {}
        }
        if let Some(line) = format_execution_event(event) {
            bar.println(line);
        }
    });

    println!();
    let report = engine
        .run(&execution_plan, &pipeline)
        .await
        .context("Pipeline run aborted")?;
    progress.finish_and_clear();

    if !cmd.no_history {
        let summary = RunSummary::from(&report);
        store.save_run(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.execution_id.to_string()[..8]).dim()
        );
    }

    let elapsed = report
        .completed_at
        .signed_duration_since(report.started_at)
        .to_std()
        .unwrap_or_default();

    match &report.outcome {
        RunOutcome::Success => {
            println!(
                "\n{} {} completed {} in {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green(),
                format_duration(elapsed)
            );
        }
        RunOutcome::Failed {
            step_id,
            kind,
            message,
            ..
        } => {
            println!("\n{}", format_failure(step_id, *kind, message));
            println!(
                "{} {} {} after {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red(),
                format_duration(elapsed)
            );
        }
    }

    std::process::exit(report.outcome.exit_code());
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let pipeline = load_config(&cmd.file)?.to_pipeline();

    match plan(&pipeline) {
        Ok(execution_plan) => {
            let levels = execution_plan.step_ids(&pipeline);
            if cmd.json {
                let data = serde_json::json!({
                    "pipeline": pipeline.name,
                    "levels": levels,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}", format_plan(&execution_plan, &levels));
            }
            Ok(())
        }
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({ "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Planning failed:", CROSS);
                println!("  {}", style(&e).red());
            }
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    let result = load_config(&cmd.file).and_then(|config| {
        plan(&config.to_pipeline())?;
        Ok(config)
    });

    match result {
        Ok(config) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!("  Env: {}", style(config.env.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_history().await?;

    if let Some(exec_id_str) = &cmd.execution_id {
        let exec_id = uuid::Uuid::parse_str(exec_id_str).context("Invalid execution ID format")?;
        match store.load_run(exec_id).await? {
            Some(summary) => print_run_details(&summary, cmd.json)?,
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    let mut runs = match &cmd.pipeline {
        Some(pipeline_name) => store.list_runs(pipeline_name).await?,
        None => {
            let mut all_runs = Vec::new();
            for pipeline in store.list_pipelines().await? {
                all_runs.extend(store.list_runs(&pipeline).await?);
            }
            all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            all_runs
        }
    };
    runs.truncate(cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    println!("  Completed: {}", style(summary.completed_at.to_rfc3339()).dim());
    if let Ok(duration) = summary
        .completed_at
        .signed_duration_since(summary.started_at)
        .to_std()
    {
        println!("  Duration: {}", style(format_duration(duration)).dim());
    }
    println!(
        "  Steps: {} total, {} succeeded, {} skipped, {} failed, {} not started",
        summary.total_steps,
        style(summary.succeeded_steps).green(),
        summary.skipped_steps,
        style(summary.failed_steps).red(),
        summary.not_started()
    );
    if let (Some(step), Some(kind)) = (&summary.failed_step, summary.failure_kind) {
        println!("  First failure: {} ({})", style(step).red(), kind);
    }
    if summary.status == ExecutionStatus::Running {
        println!("  {} Run did not record a final status", WARN);
    }

    Ok(())
}
