// crates/segdash/src/main.rs

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use segdash_core::export::{export_csv, export_parquet, DEFAULT_EXPORT_NAME};
use segdash_core::{
    derive_view, load_narrative, load_shared_dataset, DashboardConfig, DerivedView, FilterState,
    Pagination,
};
use segdash_table::Dataset;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

/// Customer segmentation dashboard for the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file; defaults to ./segdash.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Segmentation table to load, overriding config and SEGDASH_DATA_PATH
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline KPIs and key takeaways
    Summary,
    /// Customer distribution and spend heatmap by city and segment
    Overview(FilterArgs),
    /// City totals, normalised profiles and per-city averages
    Cities(CitiesArgs),
    /// Segment profiles and strategy suggestions
    Segments(FilterArgs),
    /// Rows on the current page, sorted by city and cluster
    Data(FilterArgs),
    /// Write the rows on the current page to a file; `--show-all` writes every page
    Export(ExportArgs),
    /// The whole derived view as JSON
    View(CitiesArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// City to include; repeat for several. Defaults to every city
    #[arg(long = "city", value_name = "CITY")]
    cities: Vec<String>,
    /// Cluster to include; repeat for several. Defaults to every cluster
    #[arg(long = "cluster", value_name = "ID")]
    clusters: Vec<u32>,
    /// Keep only the N cities with the most customers
    #[arg(long)]
    top_n: Option<NonZeroUsize>,
    /// Cities per page
    #[arg(long)]
    page_size: Option<NonZeroUsize>,
    /// One-based page index; out-of-range values are clamped
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Ignore pagination and show every city
    #[arg(long)]
    show_all: bool,
}

#[derive(Args, Debug, Clone, Default)]
struct CitiesArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// City to compare; up to four are kept
    #[arg(long = "compare", value_name = "CITY")]
    compare: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// Output file
    #[arg(long, default_value = DEFAULT_EXPORT_NAME)]
    out: PathBuf,
    /// Write parquet instead of CSV
    #[arg(long)]
    parquet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    let dataset = load_shared_dataset(&config.data_path).with_context(|| {
        format!(
            "cannot build the dashboard from '{}'",
            config.data_path.display()
        )
    })?;

    match cli.command {
        Command::Summary => handle_summary(&dataset, &config, cli.format),
        Command::Overview(args) => {
            let view = build_view(&dataset, &config, &args, &[]);
            handle_overview(&view, cli.format)
        }
        Command::Cities(args) => {
            let view = build_view(&dataset, &config, &args.filters, &args.compare);
            handle_cities(&view, cli.format)
        }
        Command::Segments(args) => {
            let view = build_view(&dataset, &config, &args, &[]);
            handle_segments(&view, cli.format)
        }
        Command::Data(args) => {
            let view = build_view(&dataset, &config, &args, &[]);
            handle_data(&dataset, &view, cli.format)
        }
        Command::Export(args) => handle_export(&dataset, &config, &args),
        Command::View(args) => {
            let view = build_view(&dataset, &config, &args.filters, &args.compare);
            print_json(&view)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_filter(dataset: &Dataset, config: &DashboardConfig, args: &FilterArgs) -> FilterState {
    let mut filter = FilterState::all(dataset);

    if !args.cities.is_empty() {
        let known = dataset.cities();
        for city in args.cities.iter().filter(|city| !known.contains(*city)) {
            warn!(city = %city, "selected city does not appear in the data");
        }
        filter = filter.with_cities(args.cities.iter().cloned());
    }
    if !args.clusters.is_empty() {
        filter = filter.with_clusters(args.clusters.iter().copied());
    }

    filter
        .with_top_n(args.top_n.or_else(|| config.top_n()))
        .with_pagination(Pagination {
            page_size: args.page_size.unwrap_or_else(|| config.page_size()),
            page: args.page,
            show_all: args.show_all,
        })
}

fn build_view<'a>(
    dataset: &'a Dataset,
    config: &DashboardConfig,
    args: &FilterArgs,
    compare: &[String],
) -> DerivedView<'a> {
    let filter = build_filter(dataset, config, args);
    derive_view(dataset, &filter, compare)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialise output")?
    );
    Ok(())
}

fn handle_summary(dataset: &Dataset, config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let kpis = segdash_core::compute_kpis(dataset);
    let narrative = load_narrative(&config.narrative_path);

    match format {
        OutputFormat::Json => print_json(&json!({ "kpis": kpis, "narrative": narrative })),
        OutputFormat::Table => {
            println!("{}", render::kpis(&kpis));
            println!();
            print!("{}", render::narrative(&narrative));
            Ok(())
        }
    }
}

fn handle_overview(view: &DerivedView<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "page": { "page": view.page.page, "total_pages": view.page.total_pages, "cities": view.page.cities },
            "customer_distribution": view.customer_pivot.to_long(),
            "spend_heatmap": view.spend_heatmap,
            "segment_mix": view.segment_mix,
            "insights": view.insights,
        })),
        OutputFormat::Table => {
            println!(
                "Customer Distribution by City & Segment: {} cities (page view)",
                view.page.cities.len()
            );
            println!("{}", render::pivot(&view.customer_pivot));
            println!();
            println!("Avg Total Monetary by City & Segment");
            println!("{}", render::pivot(&view.spend_heatmap));
            println!();
            println!("{}", render::insights(&view.insights));
            println!("{}", render::page_footer(&view.page));
            Ok(())
        }
    }
}

fn handle_cities(view: &DerivedView<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "city_totals": view.city_totals,
            "city_profile": view.city_profile,
            "comparison": view.comparison,
            "segment_mix": view.segment_mix,
            "city_means": view.city_means,
        })),
        OutputFormat::Table => {
            println!("Total Customers by City");
            println!("{}", render::city_totals(&view.city_totals));
            println!();
            println!("City Profile: Normalized Metrics");
            println!("{}", render::comparison(&view.city_profile, &view.comparison));
            println!();
            println!("Average Metrics by City");
            println!("{}", render::city_metrics(&view.city_means));
            println!("{}", render::page_footer(&view.page));
            Ok(())
        }
    }
}

fn handle_segments(view: &DerivedView<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "segments": view.segments,
            "strategies": view.strategies,
        })),
        OutputFormat::Table => {
            println!("Segment Profiles (current page)");
            println!("{}", render::segments(&view.segments));
            println!();
            println!("Strategy Suggestions");
            println!("{}", render::strategies(&view.strategies));
            Ok(())
        }
    }
}

fn handle_data(dataset: &Dataset, view: &DerivedView<'_>, format: OutputFormat) -> Result<()> {
    let preview = view.preview();
    match format {
        OutputFormat::Json => print_json(&preview),
        OutputFormat::Table => {
            println!("{}", render::records(dataset, &preview));
            println!("{}", render::page_footer(&view.page));
            Ok(())
        }
    }
}

fn handle_export(dataset: &Dataset, config: &DashboardConfig, args: &ExportArgs) -> Result<()> {
    let view = build_view(dataset, config, &args.filters, &[]);
    let rows = &view.page.rows;
    let written = if args.parquet {
        export_parquet(dataset, rows, &args.out)
    } else {
        export_csv(dataset, rows, &args.out)
    };
    written.with_context(|| format!("failed to export to '{}'", args.out.display()))?;

    info!(rows = rows.len(), page = view.page.page, "export finished");
    println!("Wrote {} rows to {}", rows.len(), args.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use segdash_table::Record;

    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            Record::new("PUNE", 0, 40),
            Record::new("MUMBAI", 1, 200),
            Record::new("AGRA", 2, 10),
        ])
    }

    fn exported_cities(args: &ExportArgs) -> Vec<String> {
        let data = dataset();
        handle_export(&data, &DashboardConfig::default(), args).expect("export");
        let written = segdash_table::load_dataset(&args.out).expect("reload").dataset;
        written.cities()
    }

    #[test]
    fn export_writes_only_the_current_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = ExportArgs {
            filters: FilterArgs {
                page_size: NonZeroUsize::new(2),
                page: 2,
                ..FilterArgs::default()
            },
            out: dir.path().join(DEFAULT_EXPORT_NAME),
            parquet: false,
        };
        // cities page as [AGRA, MUMBAI], [PUNE]
        assert_eq!(exported_cities(&args), vec!["PUNE"]);
    }

    #[test]
    fn export_with_show_all_writes_every_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = ExportArgs {
            filters: FilterArgs {
                page_size: NonZeroUsize::new(2),
                page: 2,
                show_all: true,
                ..FilterArgs::default()
            },
            out: dir.path().join(DEFAULT_EXPORT_NAME),
            parquet: false,
        };
        assert_eq!(exported_cities(&args), vec!["AGRA", "MUMBAI", "PUNE"]);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_flags_parse() {
        let cli = Cli::parse_from([
            "segdash",
            "--format",
            "json",
            "cities",
            "--city",
            "PUNE",
            "--city",
            "AGRA",
            "--cluster",
            "0",
            "--top-n",
            "1",
            "--page",
            "2",
            "--compare",
            "PUNE",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Cities(args) = cli.command else {
            panic!("expected cities command");
        };
        assert_eq!(args.filters.cities, vec!["PUNE", "AGRA"]);
        assert_eq!(args.filters.clusters, vec![0]);
        assert_eq!(args.filters.top_n, NonZeroUsize::new(1));
        assert_eq!(args.filters.page, 2);
        assert_eq!(args.compare, vec!["PUNE"]);
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert!(Cli::try_parse_from(["segdash", "overview", "--top-n", "0"]).is_err());
    }

    #[test]
    fn unset_flags_select_everything() {
        let data = dataset();
        let filter = build_filter(&data, &DashboardConfig::default(), &FilterArgs::default());
        assert_eq!(filter.cities.len(), 3);
        assert_eq!(filter.clusters.len(), 3);
        assert_eq!(filter.top_n, None);
        assert_eq!(filter.pagination.page_size.get(), 10);
    }

    #[test]
    fn config_supplies_defaults_flags_override() {
        let data = dataset();
        let config = DashboardConfig {
            page_size: 5,
            top_n: Some(2),
            ..DashboardConfig::default()
        };
        let from_config = build_filter(&data, &config, &FilterArgs::default());
        assert_eq!(from_config.pagination.page_size.get(), 5);
        assert_eq!(from_config.top_n, NonZeroUsize::new(2));

        let args = FilterArgs {
            page_size: NonZeroUsize::new(3),
            top_n: NonZeroUsize::new(1),
            ..FilterArgs::default()
        };
        let from_flags = build_filter(&data, &config, &args);
        assert_eq!(from_flags.pagination.page_size.get(), 3);
        assert_eq!(from_flags.top_n, NonZeroUsize::new(1));
    }
}
