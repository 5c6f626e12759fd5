use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use insights::{
    choropleth::{Category, Choropleth},
    config::Config,
    formatters::{
        GeoJSONFormatter, GeoJSONSeqFormatter, HtmlFormatter, OutputFormatter, OutputGenerator,
    },
    metrics::RandomMetrics,
    region::Region,
    Dashboard, COL,
};
use log::{debug, info};
use polars::prelude::{BooleanChunked, DataFrame};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_countries, display_details, display_metrics};
use crate::error::InsightsCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_BOUNDARIES_STRING: &str = "Loading world map data";

/// Defines the output formats we are able to produce the map in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    GeoJSON,
    GeoJSONSeq,
    Html,
}

impl From<&OutputFormat> for OutputFormatter {
    fn from(value: &OutputFormat) -> Self {
        match value {
            OutputFormat::GeoJSON => OutputFormatter::GeoJSON(GeoJSONFormatter),
            OutputFormat::GeoJSONSeq => OutputFormatter::GeoJSONSeq(GeoJSONSeqFormatter),
            OutputFormat::Html => OutputFormatter::Html(HtmlFormatter),
        }
    }
}

impl From<OutputFormat> for OutputFormatter {
    fn from(value: OutputFormat) -> Self {
        Self::from(&value)
    }
}

fn write_output<T, U>(
    output_generator: T,
    map: &Choropleth,
    output_file: Option<U>,
) -> InsightsCliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, map)?;
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        output_generator.save(&mut stdout_lock, map)?;
    };
    Ok(())
}

/// Run `f` with a progress spinner unless quiet
async fn with_spinner<F, T>(quiet: bool, message: &str, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            message.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let result = f.await;
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    result
}

fn print_updated_at() {
    println!(
        "\nData updated as of {}",
        chrono::Local::now().format("%H:%M:%S")
    );
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, config: Config) -> InsightsCliResult<()>;
}

/// The `map` command renders the choropleth for a data category.
#[derive(Args, Debug)]
pub struct MapCommand {
    #[arg(
        short = 'c',
        long,
        value_name = "weather|economic|air-quality",
        help = "Data category used to color the map"
    )]
    category: Category,
    #[arg(
        short = 'f',
        long,
        value_name = "geojson|geojsonseq|html",
        default_value = "geojson",
        help = "Output format for the map"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the map")]
    output_file: Option<String>,
    #[arg(long, help = "Seed for the placeholder metrics")]
    seed: Option<u64>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for MapCommand {
    async fn run(&self, config: Config) -> InsightsCliResult<()> {
        info!("Running `map` subcommand");
        let dashboard =
            Dashboard::new_with_config(config)?.with_metrics_source(RandomMetrics::new(self.seed));
        let map = with_spinner(
            self.quiet,
            LOADING_BOUNDARIES_STRING,
            dashboard.choropleth(self.category),
        )
        .await?;
        debug!(
            "{} of {} boundaries filled",
            map.filled(),
            map.features.len()
        );
        let formatter: OutputFormatter = (&self.output_format).into();
        write_output(formatter, &map, self.output_file.as_deref())?;
        Ok(())
    }
}

/// The `countries` command lists the country selector for a region.
#[derive(Args, Debug)]
pub struct CountriesCommand {
    #[arg(
        short = 'r',
        long,
        default_value = "Global",
        help = "Region to list countries for, e.g. 'Europe' or 'north-america'"
    )]
    region: Region,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for CountriesCommand {
    async fn run(&self, config: Config) -> InsightsCliResult<()> {
        info!("Running `countries` subcommand");
        let dashboard = Dashboard::new_with_config(config)?;
        let countries = with_spinner(
            self.quiet,
            LOADING_BOUNDARIES_STRING,
            dashboard.countries(self.region),
        )
        .await?;
        println!("\nCountries in {}:", self.region);
        display_countries(&countries);
        print_updated_at();
        Ok(())
    }
}

/// The `details` command shows the details panel for one country.
#[derive(Args, Debug)]
pub struct DetailsCommand {
    #[arg(index = 1, help = "Country name as listed by the `countries` command")]
    country: String,
    #[arg(short = 'r', long, default_value = "Global", help = "Region the country is selected from")]
    region: Region,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for DetailsCommand {
    async fn run(&self, config: Config) -> InsightsCliResult<()> {
        info!("Running `details` subcommand");
        let dashboard = Dashboard::new_with_config(config)?;
        let details = with_spinner(
            self.quiet,
            "Fetching country details",
            dashboard.country_details(&self.country, self.region),
        )
        .await?;
        display_details(&details);
        print_updated_at();
        Ok(())
    }
}

/// The `metrics` command prints the global metrics table behind the map.
#[derive(Args, Debug)]
pub struct MetricsCommand {
    #[arg(short = 'r', long, default_value = "Global", help = "Only show countries in this region")]
    region: Region,
    #[arg(long, help = "Seed for the placeholder metrics")]
    seed: Option<u64>,
    #[arg(long, help = "Maximum number of rows to show")]
    limit: Option<usize>,
    #[arg(from_global)]
    quiet: bool,
}

/// Rows of the metrics table whose country is in `countries`
fn restrict_to(table: &DataFrame, countries: &[String]) -> InsightsCliResult<DataFrame> {
    let wanted: HashSet<&str> = countries.iter().map(String::as_str).collect();
    let mask: BooleanChunked = table
        .column(COL::COUNTRY)?
        .str()?
        .into_iter()
        .map(|country| country.is_some_and(|c| wanted.contains(c)))
        .collect();
    Ok(table.filter(&mask)?)
}

impl RunCommand for MetricsCommand {
    async fn run(&self, config: Config) -> InsightsCliResult<()> {
        info!("Running `metrics` subcommand");
        let dashboard =
            Dashboard::new_with_config(config)?.with_metrics_source(RandomMetrics::new(self.seed));
        let (table, countries) = with_spinner(self.quiet, LOADING_BOUNDARIES_STRING, async {
            let table = dashboard.global_table().await?;
            let countries = dashboard.countries(self.region).await?;
            InsightsCliResult::Ok((table, countries))
        })
        .await?;
        let table = restrict_to(&table, &countries)?;
        display_metrics(&table, self.limit)?;
        print_updated_at();
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Global insights on weather, economy and air quality, country by country", long_about = None, name="insights")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress bar to stdout. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implmement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Render the choropleth world map for a data category
    Map(MapCommand),
    /// List the countries of a region
    Countries(CountriesCommand),
    /// Show economic, weather and air quality details for a country
    Details(DetailsCommand),
    /// Print the global metrics table
    Metrics(MetricsCommand),
}
