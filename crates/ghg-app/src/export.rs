//! Excel export functionality

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use ghg_domain::model::{CalculationOutcome, ReportingRecord, TrendReport};
use ghg_domain::service::EmissionFactorRegistry;
use ghg_types::{Category, Error, Result, Scope};

const CO2E_FORMAT: &str = "#,##0.0000";

fn excel_err(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export one calculation to an Excel file
///
/// Sheets: Summary, Breakdown, Contributions and, when any record was
/// excluded, Warnings.
pub fn export_calculation(
    record: &ReportingRecord,
    outcome: &CalculationOutcome,
    registry: &EmissionFactorRegistry,
    output_path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, record, outcome)?;

    let breakdown_sheet = workbook.add_worksheet();
    write_breakdown_sheet(breakdown_sheet, outcome)?;

    let contributions_sheet = workbook.add_worksheet();
    write_contributions_sheet(contributions_sheet, outcome, registry)?;

    if outcome.has_warnings() {
        let warnings_sheet = workbook.add_worksheet();
        write_warnings_sheet(warnings_sheet, outcome)?;
    }

    workbook.save(output_path).map_err(excel_err)?;
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    record: &ReportingRecord,
    outcome: &CalculationOutcome,
) -> Result<()> {
    sheet.set_name("Summary").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(CO2E_FORMAT);

    sheet
        .write_string_with_format(0, 0, "GHG Emissions Report", &header_format)
        .map_err(excel_err)?;

    let rows: [(&str, String); 4] = [
        ("Organization:", record.organization_id.clone()),
        ("Reporting record:", record.id.to_string()),
        ("Period:", record.period.to_string()),
        ("Label:", record.label.clone().unwrap_or_default()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = 2 + i as u32;
        sheet.write_string(row, 0, *label).map_err(excel_err)?;
        sheet.write_string(row, 1, value).map_err(excel_err)?;
    }

    sheet
        .write_string_with_format(7, 0, "Scope", &header_format)
        .map_err(excel_err)?;
    sheet
        .write_string_with_format(7, 1, "kg CO2e", &header_format)
        .map_err(excel_err)?;
    for (i, scope) in Scope::ALL.iter().enumerate() {
        let row = 8 + i as u32;
        sheet
            .write_string(row, 0, &scope.to_string())
            .map_err(excel_err)?;
        sheet
            .write_number_with_format(row, 1, outcome.result.scope_total(*scope), &number_format)
            .map_err(excel_err)?;
    }
    sheet
        .write_string_with_format(11, 0, "Total", &header_format)
        .map_err(excel_err)?;
    sheet
        .write_number_with_format(11, 1, outcome.result.total_co2e, &number_format)
        .map_err(excel_err)?;

    sheet
        .write_string(13, 0, "Records aggregated:")
        .map_err(excel_err)?;
    sheet
        .write_number(13, 1, outcome.result.records_aggregated as f64)
        .map_err(excel_err)?;
    sheet.write_string(14, 0, "Records excluded:").map_err(excel_err)?;
    sheet
        .write_number(14, 1, outcome.warnings.len() as f64)
        .map_err(excel_err)?;
    sheet
        .write_string(15, 0, "Out of scope:")
        .map_err(excel_err)?;
    sheet
        .write_number(15, 1, outcome.skipped as f64)
        .map_err(excel_err)?;

    sheet.set_column_width(0, 20).map_err(excel_err)?;
    sheet.set_column_width(1, 24).map_err(excel_err)?;
    Ok(())
}

fn write_breakdown_sheet(sheet: &mut Worksheet, outcome: &CalculationOutcome) -> Result<()> {
    sheet.set_name("Breakdown").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(CO2E_FORMAT);
    let percent_format = Format::new().set_num_format("0.0%");

    for (col, header) in ["Category", "Scope", "kg CO2e", "Share"].iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }

    let total = outcome.result.total_co2e;
    for (i, category) in Category::ALL.iter().enumerate() {
        let row = 1 + i as u32;
        let value = outcome.result.category_total(*category);
        sheet
            .write_string(row, 0, category.as_str())
            .map_err(excel_err)?;
        sheet
            .write_string(row, 1, &category.scope().to_string())
            .map_err(excel_err)?;
        sheet
            .write_number_with_format(row, 2, value, &number_format)
            .map_err(excel_err)?;
        let share = if total > 0.0 { value / total } else { 0.0 };
        sheet
            .write_number_with_format(row, 3, share, &percent_format)
            .map_err(excel_err)?;
    }

    sheet.set_column_width(0, 14).map_err(excel_err)?;
    sheet.set_column_width(2, 18).map_err(excel_err)?;
    Ok(())
}

fn write_contributions_sheet(
    sheet: &mut Worksheet,
    outcome: &CalculationOutcome,
    registry: &EmissionFactorRegistry,
) -> Result<()> {
    sheet.set_name("Contributions").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(CO2E_FORMAT);

    let headers = [
        "Activity",
        "Scope",
        "Category",
        "Subtype",
        "Quantity",
        "Unit",
        "kg CO2e",
        "CO2",
        "CH4",
        "N2O",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }

    for (i, c) in outcome.contributions.iter().enumerate() {
        let row = 1 + i as u32;
        sheet
            .write_number(row, 0, c.activity_id as f64)
            .map_err(excel_err)?;
        sheet
            .write_number(row, 1, f64::from(c.scope.number()))
            .map_err(excel_err)?;
        sheet
            .write_string(row, 2, c.category.as_str())
            .map_err(excel_err)?;
        sheet.write_string(row, 3, &c.subtype).map_err(excel_err)?;
        sheet
            .write_number(row, 4, c.canonical_quantity)
            .map_err(excel_err)?;
        sheet
            .write_string(row, 5, c.canonical_unit.symbol())
            .map_err(excel_err)?;
        sheet
            .write_number_with_format(row, 6, c.co2e, &number_format)
            .map_err(excel_err)?;

        // Per-gas split only where the factor table provides one
        if let Some(gases) = registry.gas_breakdown(c.category, &c.subtype, c.canonical_unit) {
            let split = [gases.co2, gases.ch4, gases.n2o];
            for (offset, per_unit) in split.iter().enumerate() {
                sheet
                    .write_number_with_format(
                        row,
                        7 + offset as u16,
                        per_unit * c.canonical_quantity,
                        &number_format,
                    )
                    .map_err(excel_err)?;
            }
        }
    }

    sheet.set_column_width(3, 18).map_err(excel_err)?;
    sheet.set_column_width(6, 16).map_err(excel_err)?;
    Ok(())
}

fn write_warnings_sheet(sheet: &mut Worksheet, outcome: &CalculationOutcome) -> Result<()> {
    sheet.set_name("Warnings").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    for (col, header) in ["Activity", "Category", "Reason"].iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }

    for (i, warning) in outcome.warnings.iter().enumerate() {
        let row = 1 + i as u32;
        sheet
            .write_number(row, 0, warning.activity_id as f64)
            .map_err(excel_err)?;
        sheet
            .write_string(row, 1, warning.category.as_str())
            .map_err(excel_err)?;
        sheet
            .write_string(row, 2, &warning.reason)
            .map_err(excel_err)?;
    }

    sheet.set_column_width(2, 60).map_err(excel_err)?;
    Ok(())
}

/// Export a trend report to an Excel file
pub fn export_trends(organization_id: &str, report: &TrendReport, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Trends").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(CO2E_FORMAT);

    sheet
        .write_string_with_format(0, 0, "Emissions Trend", &header_format)
        .map_err(excel_err)?;
    sheet.write_string(0, 1, organization_id).map_err(excel_err)?;

    let mut headers = vec![
        "Month".to_string(),
        "Total".to_string(),
        "Scope 1".to_string(),
        "Scope 2".to_string(),
        "Scope 3".to_string(),
        "3-month avg".to_string(),
    ];
    headers.extend(Category::ALL.iter().map(|c| c.as_str().to_string()));
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(2, col as u16, header, &header_format)
            .map_err(excel_err)?;
    }

    for (i, (point, average)) in report
        .series
        .iter()
        .zip(report.moving_average.iter())
        .enumerate()
    {
        let row = 3 + i as u32;
        sheet.write_string(row, 0, &point.month).map_err(excel_err)?;
        let totals = [point.total_co2e, point.scope1, point.scope2, point.scope3];
        for (offset, value) in totals.iter().enumerate() {
            sheet
                .write_number_with_format(row, 1 + offset as u16, *value, &number_format)
                .map_err(excel_err)?;
        }
        if let Some(average) = average {
            sheet
                .write_number_with_format(row, 5, *average, &number_format)
                .map_err(excel_err)?;
        }
        for (offset, category) in Category::ALL.iter().enumerate() {
            let value = point.breakdown.get(category).copied().unwrap_or(0.0);
            sheet
                .write_number_with_format(row, 6 + offset as u16, value, &number_format)
                .map_err(excel_err)?;
        }
    }

    let stats_row = 4 + report.series.len() as u32;
    let stats = [
        ("Minimum", report.statistics.min),
        ("Maximum", report.statistics.max),
        ("Average", report.statistics.average),
    ];
    for (i, (label, value)) in stats.iter().enumerate() {
        let row = stats_row + i as u32;
        sheet
            .write_string_with_format(row, 0, *label, &header_format)
            .map_err(excel_err)?;
        sheet
            .write_number_with_format(row, 1, *value, &number_format)
            .map_err(excel_err)?;
    }

    sheet.set_column_width(0, 12).map_err(excel_err)?;
    workbook.save(output_path).map_err(excel_err)?;
    Ok(())
}
