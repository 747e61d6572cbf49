//! Command handlers

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use chrono::{Months, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use ghg_app::app::{CalculateRequest, CalculationService, TrendService};
use ghg_app::config::Config;
use ghg_app::export::{export_calculation, export_trends};
use ghg_app::repository::{load_registry, open_repository};
use ghg_domain::model::ReportingPeriod;
use ghg_domain::repository::{ActivityRepository, ReportingRecordRepository};
use ghg_infra::activity_csv::load_activities;
use ghg_infra::persistence::FileEmissionsRepository;
use ghg_types::{Category, ConfigError, Error, OutputFormat, RecordId, Result};

use crate::cli::{ActivityAction, Cli, Commands, RecordAction};
use crate::output::{
    output_activities, output_factors, output_outcome, output_records, output_trends,
};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Config commands work on the file itself, not the merged view
    if let Commands::Config {
        show,
        set_output,
        set_months,
        set_store,
        set_factors,
        set_occupancy,
        reset,
    } = &cli.command
    {
        return cmd_config(
            cli.config.as_deref(),
            *show,
            *set_output,
            *set_months,
            set_store.clone(),
            set_factors.clone(),
            set_occupancy.clone(),
            *reset,
        );
    }

    // Load config
    let mut config = load_config(cli.config.as_deref())?;

    // Override from CLI args
    if cli.store.is_some() {
        config.store_dir = cli.store.clone();
    }
    if cli.factors.is_some() {
        config.factors_path = cli.factors.clone();
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Record { action } => match action {
            RecordAction::Add {
                org,
                start,
                end,
                label,
            } => cmd_record_add(&config, output_format, org, *start, *end, label.clone()),
            RecordAction::List { org } => cmd_record_list(&config, output_format, org),
        },

        Commands::Activity { action } => match action {
            ActivityAction::Import { id, file } => cmd_activity_import(&config, *id, file),
            ActivityAction::List { id } => cmd_activity_list(&config, output_format, *id),
        },

        Commands::Calculate {
            id,
            force,
            occupancy,
            export,
        } => {
            let mut request = CalculateRequest::new().with_force(*force);
            if let Some(occupancy) = occupancy {
                request = request.with_occupancy(occupancy.clone());
            }
            cmd_calculate(&config, output_format, *id, &request, export.as_deref())
        }

        Commands::CalculateAll { org, jobs } => {
            // 0 = auto CPU count
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => *n,
                None => num_cpus::get().min(4),
            };
            cmd_calculate_all(&config, output_format, org, job_count)
        }

        Commands::Trends {
            org,
            months,
            export,
        } => {
            let months_back = months.unwrap_or(config.default_months_back);
            cmd_trends(&config, output_format, org, months_back, export.as_deref())
        }

        Commands::Factors { category } => cmd_factors(&config, output_format, *category),

        Commands::Config { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn save_config(config: &Config, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => config.save_to(path),
        None => config.save(),
    }
}

fn cmd_record_add(
    config: &Config,
    output_format: OutputFormat,
    org: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    label: Option<String>,
) -> Result<()> {
    let end = match end {
        Some(end) => end,
        None => start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| Error::InvalidPeriod(format!("no month after {}", start)))?,
    };
    let period = ReportingPeriod::new(start, end)?;

    let repo = open_repository(config)?;
    let record = repo.insert_reporting_record(org, period, label)?;
    info!(reporting_record_id = record.id, organization_id = org, "reporting record created");

    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Created reporting record #{} ({})", record.id, record.period);
    }
    Ok(())
}

fn cmd_record_list(config: &Config, output_format: OutputFormat, org: &str) -> Result<()> {
    let repo = open_repository(config)?;
    let mut records = repo.list_reporting_records(org)?;
    records.sort_by_key(|r| (r.period.start, r.id));
    output_records(output_format, &records)
}

fn cmd_activity_import(config: &Config, id: RecordId, file: &Path) -> Result<()> {
    let repo = open_repository(config)?;
    if repo.get_reporting_record(id)?.is_none() {
        return Err(Error::RecordNotFound(id));
    }

    let activities = load_activities(file)?;
    let total = repo.add_activities(id, activities)?.len();

    println!("Imported {} activity record(s) into record #{}", total, id);
    if total > 0 {
        println!("Run `ghg-calc calculate {}` to update its totals.", id);
    }
    Ok(())
}

fn cmd_activity_list(config: &Config, output_format: OutputFormat, id: RecordId) -> Result<()> {
    let repo = open_repository(config)?;
    if repo.get_reporting_record(id)?.is_none() {
        return Err(Error::RecordNotFound(id));
    }
    let mut activities = repo.list_activity_records(id)?;
    activities.sort_by_key(|a| a.id());
    output_activities(output_format, &activities)
}

fn open_service(config: &Config) -> Result<CalculationService<FileEmissionsRepository>> {
    let repo = Arc::new(open_repository(config)?);
    let registry = Arc::new(load_registry(config)?);
    Ok(CalculationService::new(repo, registry, config.clone()))
}

fn cmd_calculate(
    config: &Config,
    output_format: OutputFormat,
    id: RecordId,
    request: &CalculateRequest,
    export: Option<&Path>,
) -> Result<()> {
    let service = open_service(config)?;
    let outcome = service.calculate(id, request)?;

    let record = service
        .engine()
        .repository()
        .get_reporting_record(id)?
        .ok_or(Error::RecordNotFound(id))?;
    output_outcome(output_format, &record, &outcome)?;

    if let Some(path) = export {
        export_calculation(&record, &outcome, service.engine().registry(), path)?;
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

/// Per-record line of a `calculate-all` run
#[derive(Debug, Serialize)]
struct BatchLine {
    reporting_record_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_co2e: Option<f64>,
    warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    organization_id: String,
    calculated: usize,
    failed: usize,
    elapsed_ms: u64,
    records: Vec<BatchLine>,
}

fn cmd_calculate_all(
    config: &Config,
    output_format: OutputFormat,
    org: &str,
    jobs: usize,
) -> Result<()> {
    let service = open_service(config)?;
    let ids = service.record_ids(org)?;
    if ids.is_empty() {
        return Err(Error::Repository(format!(
            "No reporting records for organization {}",
            org
        )));
    }

    let started = Instant::now();
    let jobs = jobs.clamp(1, ids.len());
    info!(organization_id = org, records = ids.len(), jobs, "recalculating organization");

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    // Shared results collector
    let lines: Arc<Mutex<Vec<BatchLine>>> = Arc::new(Mutex::new(Vec::new()));
    let ids = Arc::new(ids);
    let next_index = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..jobs {
        let service = service.clone();
        let ids = Arc::clone(&ids);
        let next_index = Arc::clone(&next_index);
        let lines = Arc::clone(&lines);
        let pb = pb.clone();

        handles.push(thread::spawn(move || loop {
            let idx = next_index.fetch_add(1, Ordering::SeqCst);
            if idx >= ids.len() {
                break;
            }
            let id = ids[idx];
            pb.set_message(format!("#{}", id));

            let line = match service.calculate(id, &CalculateRequest::new().with_force(true)) {
                Ok(outcome) => BatchLine {
                    reporting_record_id: id,
                    total_co2e: Some(outcome.result.total_co2e),
                    warnings: outcome.warnings.len(),
                    error: None,
                },
                Err(e) => BatchLine {
                    reporting_record_id: id,
                    total_co2e: None,
                    warnings: 0,
                    error: Some(e.to_string()),
                },
            };
            lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(line);
            pb.inc(1);
        }));
    }

    // Wait for all workers to complete
    for handle in handles {
        if handle.join().is_err() {
            return Err(Error::Repository("calculation worker panicked".to_string()));
        }
    }
    pb.finish_and_clear();

    let mut records = std::mem::take(&mut *lines.lock().unwrap_or_else(PoisonError::into_inner));
    records.sort_by_key(|l| l.reporting_record_id);
    let failed = records.iter().filter(|l| l.error.is_some()).count();
    let summary = BatchSummary {
        organization_id: org.to_string(),
        calculated: records.len() - failed,
        failed,
        elapsed_ms: started.elapsed().as_millis() as u64,
        records,
    };

    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\nRecalculated {} ({} record(s))", summary.organization_id, summary.records.len());
        println!("================================");
        for line in &summary.records {
            match (&line.total_co2e, &line.error) {
                (Some(total), _) => println!(
                    "  #{:<5} {:>14.4} kg CO2e{}",
                    line.reporting_record_id,
                    total,
                    if line.warnings > 0 {
                        format!("  ({} excluded)", line.warnings)
                    } else {
                        String::new()
                    }
                ),
                (None, Some(error)) => println!("  #{:<5} FAILED: {}", line.reporting_record_id, error),
                (None, None) => {}
            }
        }
        println!(
            "\nCalculated: {}  Failed: {}  ({:.1}s)",
            summary.calculated,
            summary.failed,
            summary.elapsed_ms as f64 / 1000.0
        );
    }
    Ok(())
}

fn cmd_trends(
    config: &Config,
    output_format: OutputFormat,
    org: &str,
    months_back: u32,
    export: Option<&Path>,
) -> Result<()> {
    let repo = Arc::new(open_repository(config)?);
    let service = TrendService::new(repo);
    let report = service.trends(org, months_back)?;

    output_trends(output_format, org, &report)?;

    if let Some(path) = export {
        export_trends(org, &report, path)?;
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

fn cmd_factors(config: &Config, output_format: OutputFormat, category: Option<Category>) -> Result<()> {
    let registry = load_registry(config)?;
    let factors = match category {
        Some(category) => registry.factors_for(category),
        None => registry.factors(),
    };
    output_factors(output_format, &factors)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    path: Option<&Path>,
    show: bool,
    set_output: Option<OutputFormat>,
    set_months: Option<u32>,
    set_store: Option<PathBuf>,
    set_factors: Option<PathBuf>,
    set_occupancy: Option<String>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        save_config(&config, path)?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = load_config(path)?;
    let mut modified = false;

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(months) = set_months {
        config.default_months_back = months;
        modified = true;
    }

    if let Some(store_dir) = set_store {
        config.store_dir = Some(store_dir);
        modified = true;
    }

    if let Some(factors_path) = set_factors {
        config.factors_path = Some(factors_path);
        modified = true;
    }

    if let Some(assignment) = set_occupancy {
        let (org, occupancy) = assignment.split_once('=').ok_or_else(|| {
            ConfigError::ParseError(format!("expected ORG=TYPE, got {}", assignment))
        })?;
        config.require_occupancy(occupancy)?;
        config
            .organization_occupancy
            .insert(org.trim().to_string(), occupancy.trim().to_ascii_lowercase());
        modified = true;
    }

    if modified {
        save_config(&config, path)?;
        println!("Configuration saved");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
