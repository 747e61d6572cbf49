//! Output formatting module

use serde::Serialize;

use ghg_domain::model::{
    ActivityRecord, CalculationOutcome, EmissionFactor, FactorKind, ReportingRecord, TrendReport,
};
use ghg_types::{Category, OutputFormat, Result, Scope};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

pub fn output_outcome(
    output_format: OutputFormat,
    record: &ReportingRecord,
    outcome: &CalculationOutcome,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(outcome);
    }

    let result = &outcome.result;
    println!("\nEmissions for record #{} ({})", record.id, record.organization_id);
    println!("================================");
    println!("Period:          {}", record.period);
    if let Some(ref label) = record.label {
        println!("Label:           {}", label);
    }

    println!();
    for scope in Scope::ALL {
        println!("{:<17}{:>14.4} kg CO2e", format!("{}:", scope), result.scope_total(scope));
    }
    println!("{:<17}{:>14.4} kg CO2e", "Total:", result.total_co2e);

    println!("\n--- By category ---");
    for category in Category::ALL {
        println!(
            "{:<17}{:>14.4}",
            format!("{}:", category),
            result.category_total(category)
        );
    }
    println!("-------------------");

    println!(
        "Aggregated:      {} record(s){}",
        result.records_aggregated,
        if outcome.skipped > 0 {
            format!(", {} out of scope", outcome.skipped)
        } else {
            String::new()
        }
    );
    if outcome.replaced_previous {
        println!("Previous result replaced");
    }

    if outcome.has_warnings() {
        println!("\nExcluded ({}):", outcome.warnings.len());
        for warning in &outcome.warnings {
            println!("  #{} [{}] {}", warning.activity_id, warning.category, warning.reason);
        }
    }

    Ok(())
}

pub fn output_records(output_format: OutputFormat, records: &[ReportingRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(records);
    }

    if records.is_empty() {
        println!("No reporting records.");
        return Ok(());
    }

    println!("{:<6} {:<12} {:<12} {}", "ID", "Start", "End", "Label");
    println!("{}", "-".repeat(48));
    for record in records {
        println!(
            "{:<6} {:<12} {:<12} {}",
            record.id,
            record.period.start.to_string(),
            record.period.end.to_string(),
            record.label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn output_activities(output_format: OutputFormat, activities: &[ActivityRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(activities);
    }

    if activities.is_empty() {
        println!("No activity records.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<18} {:>12} {:<6} {}",
        "ID", "Category", "Subtype", "Quantity", "Unit", "Date"
    );
    println!("{}", "-".repeat(70));
    for activity in activities {
        println!(
            "{:<6} {:<12} {:<18} {:>12.3} {:<6} {}",
            activity.id(),
            activity.category().as_str(),
            activity.subtype(),
            activity.emitting_quantity(),
            activity.unit(),
            activity.date()
        );
    }
    Ok(())
}

pub fn output_trends(output_format: OutputFormat, organization_id: &str, report: &TrendReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    println!("\nEmission trend for {}", organization_id);
    println!("================================");
    println!(
        "{:<9} {:>14} {:>12} {:>12} {:>12} {:>14}",
        "Month", "Total", "Scope 1", "Scope 2", "Scope 3", "3-mo avg"
    );
    for (point, average) in report.series.iter().zip(&report.moving_average) {
        println!(
            "{:<9} {:>14.4} {:>12.4} {:>12.4} {:>12.4} {:>14}",
            point.month,
            point.total_co2e,
            point.scope1,
            point.scope2,
            point.scope3,
            average.map(|a| format!("{:.4}", a)).unwrap_or_else(|| "-".to_string())
        );
    }

    let stats = &report.statistics;
    println!("\nPoints:  {}", stats.data_points);
    println!("Min:     {:.4} kg CO2e", stats.min);
    println!("Max:     {:.4} kg CO2e", stats.max);
    println!("Average: {:.4} kg CO2e", stats.average);
    Ok(())
}

pub fn output_factors(output_format: OutputFormat, factors: &[&EmissionFactor]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(factors);
    }

    println!(
        "{:<12} {:<18} {:>12} {:<14} {}",
        "Category", "Subtype", "Value", "Per", "Source"
    );
    println!("{}", "-".repeat(72));
    for factor in factors {
        let per = match factor.kind {
            FactorKind::Co2ePerUnit => format!("kg CO2e/{}", factor.unit.symbol()),
            FactorKind::Gwp => "GWP".to_string(),
        };
        println!(
            "{:<12} {:<18} {:>12.4} {:<14} {}",
            factor.category.as_str(),
            factor.subtype,
            factor.value,
            per,
            factor.source.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
