// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use csv::{ReaderBuilder, Trim};
use plot_inventory_rs::pager::SortOrder;
use plot_inventory_rs::report::{AreaQuery, AreaSortKey, SectionQuery, SectionSortKey};
use plot_inventory_rs::{
    ContractPlotId, InventoryError, NewPhysicalPlot, Period, PhysicalPlotId, PlotRegistry,
    PlotStatus,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Plot Inventory - Occupancy reports over cemetery parcels
///
/// Loads parcels and sale claims from CSV files and prints a report as JSON
/// to stdout. Set RUST_LOG to see skipped rows and rejected claims.
#[derive(Parser, Debug)]
#[command(name = "plot-inventory-rs")]
#[command(about = "Parcel allocation and occupancy reports from CSV", long_about = None)]
struct Args {
    /// CSV file with parcels
    ///
    /// Expected format: id,plot_number,period,area_sqm,notes
    #[arg(long, value_name = "FILE")]
    plots: PathBuf,

    /// CSV file with claims, applied in file order
    ///
    /// Expected format: id,physical_plot_id,area_sqm
    #[arg(long, value_name = "FILE")]
    claims: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an occupancy report
    Report {
        #[command(subcommand)]
        report: Report,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Report {
    /// Counts, areas and usage across every parcel
    Summary,
    /// Counts and usage per sales period
    Periods {
        #[arg(long)]
        period: Option<Period>,
    },
    /// Occupancy per (period, section)
    Sections(SectionArgs),
    /// Occupancy per (period, area, plot type)
    Areas(AreaArgs),
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
struct SectionArgs {
    #[arg(long)]
    period: Option<Period>,
    #[arg(long)]
    status: Option<PlotStatus>,
    #[arg(long)]
    search: Option<String>,
    /// period, section, totalCount, usedCount, remainingCount or usageRate
    #[arg(long, value_parser = parse_camel::<SectionSortKey>)]
    sort_by: Option<SectionSortKey>,
    /// asc or desc
    #[arg(long, value_parser = parse_camel::<SortOrder>)]
    sort_order: Option<SortOrder>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<SectionArgs> for SectionQuery {
    fn from(args: SectionArgs) -> Self {
        SectionQuery {
            period: args.period,
            status: args.status,
            search: args.search,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
            page: args.page,
            limit: args.limit,
        }
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
struct AreaArgs {
    #[arg(long)]
    period: Option<Period>,
    #[arg(long)]
    search: Option<String>,
    /// period, areaSqm, totalCount, usedCount, remainingCount, remainingAreaSqm or plotType
    #[arg(long, value_parser = parse_camel::<AreaSortKey>)]
    sort_by: Option<AreaSortKey>,
    /// asc or desc
    #[arg(long, value_parser = parse_camel::<SortOrder>)]
    sort_order: Option<SortOrder>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<AreaArgs> for AreaQuery {
    fn from(args: AreaArgs) -> Self {
        AreaQuery {
            period: args.period,
            search: args.search,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
            page: args.page,
            limit: args.limit,
        }
    }
}

/// Parses a flag value with the same spelling the JSON API accepts.
fn parse_camel<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|err| err.to_string())
}

#[derive(thiserror::Error, Debug)]
enum ReportError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let registry = PlotRegistry::new();

    let plots = open(&args.plots);
    if let Err(e) = load_plots(&registry, plots) {
        tracing::error!("Error reading plots '{}': {}", args.plots.display(), e);
        process::exit(1);
    }

    if let Some(path) = &args.claims {
        let claims = open(path);
        if let Err(e) = load_claims(&registry, claims) {
            tracing::error!("Error reading claims '{}': {}", path.display(), e);
            process::exit(1);
        }
    }

    let Command::Report { report } = args.command;
    if let Err(e) = write_report(&registry, report, std::io::stdout().lock()) {
        tracing::error!("Error producing report: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> BufReader<File> {
    match File::open(path) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            tracing::error!("Error opening file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// Raw parcel row. Fields: `id, plot_number, period, area_sqm, notes`
#[derive(Debug, Deserialize)]
struct PlotRecord {
    id: u32,
    plot_number: String,
    period: Period,
    area_sqm: Decimal,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    notes: Option<String>,
}

impl From<PlotRecord> for NewPhysicalPlot {
    fn from(record: PlotRecord) -> Self {
        NewPhysicalPlot {
            id: PhysicalPlotId(record.id),
            plot_number: record.plot_number,
            period: record.period,
            total_area_sqm: record.area_sqm,
            notes: record.notes.filter(|notes| !notes.is_empty()),
        }
    }
}

/// Raw claim row. Fields: `id, physical_plot_id, area_sqm`
#[derive(Debug, Deserialize)]
struct ClaimRecord {
    id: u32,
    physical_plot_id: u32,
    area_sqm: Decimal,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Registers every well-formed parcel row.
///
/// Malformed rows and rejected parcels are logged and skipped. Returns the
/// number of parcels registered.
///
/// # Errors
///
/// Returns a CSV error if the header cannot be read.
fn load_plots<R: Read>(registry: &PlotRegistry, reader: R) -> Result<usize, csv::Error> {
    let mut rdr = csv_reader(reader);
    rdr.headers()?;

    let mut plots = Vec::new();
    for result in rdr.deserialize::<PlotRecord>() {
        match result {
            Ok(record) => plots.push(NewPhysicalPlot::from(record)),
            Err(e) => tracing::warn!("Skipping malformed plot row: {}", e),
        }
    }

    let mut registered = 0;
    for result in registry.import_plots(plots) {
        match result {
            Ok(_) => registered += 1,
            Err(e) => tracing::warn!("Skipping plot: {}", e),
        }
    }
    Ok(registered)
}

/// Applies every well-formed claim row in order.
///
/// Malformed rows and rejected claims are logged and skipped. Returns the
/// number of claims created.
///
/// # Errors
///
/// Returns a CSV error if the header cannot be read.
fn load_claims<R: Read>(registry: &PlotRegistry, reader: R) -> Result<usize, csv::Error> {
    let mut rdr = csv_reader(reader);
    rdr.headers()?;

    let mut created = 0;
    for result in rdr.deserialize::<ClaimRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping malformed claim row: {}", e);
                continue;
            }
        };

        match registry.create_claim(
            PhysicalPlotId(record.physical_plot_id),
            ContractPlotId(record.id),
            record.area_sqm,
            Utc::now(),
        ) {
            Ok(_) => created += 1,
            Err(e) => tracing::warn!("Skipping claim {}: {}", record.id, e),
        }
    }
    Ok(created)
}

/// Writes the requested report as pretty-printed JSON followed by a newline.
fn write_report<W: Write>(
    registry: &PlotRegistry,
    report: Report,
    mut writer: W,
) -> Result<(), ReportError> {
    match report {
        Report::Summary => serde_json::to_writer_pretty(&mut writer, &registry.summary()?)?,
        Report::Periods { period } => {
            serde_json::to_writer_pretty(&mut writer, &registry.periods(period)?)?
        }
        Report::Sections(args) => {
            serde_json::to_writer_pretty(&mut writer, &registry.sections(&args.into())?)?
        }
        Report::Areas(args) => {
            serde_json::to_writer_pretty(&mut writer, &registry.areas(&args.into())?)?
        }
    }
    writeln!(writer)?;
    Ok(())
}
