use anyhow::{Context, Result};
use aztro_natal::report::ChartRequest;
use aztro_natal::{
    compute_natal_chart, BackendConfig, BirthInput, ChartResponse, LocalDateTime, Location,
    NatalChart,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Cast a natal chart and print it.
#[derive(Debug, Parser)]
#[command(name = "aztro_natal", version, about)]
struct Args {
    /// Birth date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date, required_unless_present = "request")]
    date: Option<NaiveDate>,

    /// Local birth time, HH:MM or HH:MM:SS
    #[arg(long, value_parser = parse_time, required_unless_present = "request")]
    time: Option<NaiveTime>,

    /// UTC offset in hours, e.g. 5.5 or -8
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    offset: f64,

    /// Latitude in degrees, north positive
    #[arg(long, allow_negative_numbers = true, required_unless_present = "request")]
    lat: Option<f64>,

    /// Longitude in degrees, east positive
    #[arg(long, allow_negative_numbers = true, required_unless_present = "request")]
    lon: Option<f64>,

    /// Read the birth data from a JSON request file instead
    #[arg(long, conflicts_with_all = ["date", "time", "lat", "lon"])]
    request: Option<PathBuf>,

    /// Ephemeris snapshot to replay instead of the analytic backend;
    /// defaults to $AZTRO_EPHEMERIS_SNAPSHOT
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{}: {}", s, e))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("{}: {}", s, e))
}

impl Args {
    fn birth_input(&self) -> Result<BirthInput> {
        if let Some(path) = &self.request {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let request: ChartRequest = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            return Ok(request.into());
        }

        // clap enforces these when --request is absent
        let (Some(date), Some(time), Some(lat), Some(lon)) =
            (self.date, self.time, self.lat, self.lon)
        else {
            anyhow::bail!("--date, --time, --lat and --lon are required without --request");
        };
        Ok(BirthInput::new(
            LocalDateTime::from(NaiveDateTime::new(date, time)),
            self.offset,
            Location::new(lat, lon),
        ))
    }

    fn backend_config(&self) -> BackendConfig {
        match &self.snapshot {
            Some(path) => BackendConfig::Snapshot(path.clone()),
            None => BackendConfig::from_env(),
        }
    }
}

fn render_text(chart: &NatalChart) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Julian Day {:.6}", chart.julian_day);
    let _ = writeln!(out);
    for position in &chart.positions {
        let _ = writeln!(
            out,
            "{:<11} {:>9.3}  {:<12} {:>6.2}{}",
            position.point.point.name(),
            position.point.longitude,
            position.placement.sign.name(),
            position.placement.degree_in_sign,
            if position.point.is_retrograde { "  R" } else { "" },
        );
    }
    let _ = writeln!(out);
    for aspect in &chart.aspects {
        let _ = writeln!(
            out,
            "{:<11} {:<12} {:<11} orb {:.2}",
            aspect.point_a.name(),
            aspect.kind.name(),
            aspect.point_b.name(),
            aspect.orb,
        );
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aztro_natal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let input = args.birth_input()?;

    let backend = args
        .backend_config()
        .build()
        .context("setting up the ephemeris")?;
    let chart = compute_natal_chart(backend.as_ref(), &input)
        .await
        .context("computing the natal chart")?;

    match args.format {
        OutputFormat::Json => println!("{}", ChartResponse::from(&chart).to_json_pretty()?),
        OutputFormat::Text => print!("{}", render_text(&chart)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_time_with_and_without_seconds() {
        assert_eq!(parse_time("14:30"), Ok(NaiveTime::from_hms_opt(14, 30, 0).unwrap()));
        assert_eq!(parse_time("07:10:05"), Ok(NaiveTime::from_hms_opt(7, 10, 5).unwrap()));
        assert!(parse_time("7pm").is_err());
    }

    #[test]
    fn test_negative_offset_parses() {
        let args = Args::try_parse_from([
            "aztro_natal", "--date", "1990-06-15", "--time", "14:30", "--offset", "-8", "--lat",
            "-33.9", "--lon", "-118.4",
        ])
        .unwrap();
        let input = args.birth_input().unwrap();
        assert_eq!(input.utc_offset_hours, -8.0);
        assert_eq!(input.location, Location::new(-33.9, -118.4));
        assert_eq!(input.datetime, LocalDateTime::ymd_hm(1990, 6, 15, 14, 30));
    }

    #[test]
    fn test_snapshot_flag_selects_fixed_backend() {
        let args = Args::try_parse_from([
            "aztro_natal", "--request", "birth.json", "--snapshot", "positions.json",
        ])
        .unwrap();
        assert_eq!(
            args.backend_config(),
            BackendConfig::Snapshot(PathBuf::from("positions.json"))
        );
    }

    #[test]
    fn test_birth_fields_required_without_request() {
        assert!(Args::try_parse_from(["aztro_natal", "--date", "1990-06-15"]).is_err());
    }
}
