use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use forecast_core::{
    ForecastFetcher, ForecastState, Outcome, ProviderId, StationConfig, TempUnit, WindUnit,
};
use inquire::{CustomType, Password, Select, Text};
use tracing::info;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather-station forecast console")]
pub struct Cli {
    /// Log more detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "metoffice", "darksky" or "openweather".
        provider: String,
    },

    /// Configure station location, timezone and display units.
    Station,

    /// Download and print the current forecast once.
    Show {
        /// Print the forecast fields as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep the forecast current, retrying failed downloads.
    Watch,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure_provider(&provider),
            Command::Station => configure_station(),
            Command::Show { json } => show(json).await,
            Command::Watch => watch().await,
        }
    }
}

fn configure_provider(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut cfg = StationConfig::load()?;

    let api_key = Password::new(&format!("{} API key:", id.source_name()))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.upsert_provider_api_key(id, api_key.trim().to_string());

    if id == ProviderId::MetOffice {
        let current = cfg.station.met_office_id.clone().unwrap_or_default();
        let site_id = Text::new("DataPoint site id:")
            .with_default(&current)
            .prompt()
            .context("Failed to read site id")?;
        cfg.station.met_office_id = Some(site_id.trim().to_string()).filter(|site| !site.is_empty());
    }

    cfg.save()?;
    println!("Saved {id} credentials to {}", StationConfig::config_file_path()?.display());
    Ok(())
}

fn configure_station() -> anyhow::Result<()> {
    let mut cfg = StationConfig::load()?;

    let country = Text::new("Country code (ISO 3166, e.g. GB):")
        .with_default(&cfg.station.country)
        .prompt()?;
    cfg.station.country = country.trim().to_uppercase();

    let timezone =
        Text::new("Timezone (IANA name):").with_default(&cfg.station.timezone).prompt()?;
    cfg.station.timezone = timezone.trim().to_string();
    cfg.timezone()?;

    cfg.station.latitude =
        CustomType::<f64>::new("Latitude:").with_default(cfg.station.latitude).prompt()?;
    cfg.station.longitude =
        CustomType::<f64>::new("Longitude:").with_default(cfg.station.longitude).prompt()?;

    let temp = Select::new("Temperature unit:", vec!["c", "f"])
        .with_starting_cursor(if cfg.units.temp == TempUnit::F { 1 } else { 0 })
        .prompt()?;
    cfg.units.temp = TempUnit::try_from(temp)?;

    let winds: Vec<&str> = WindUnit::all().iter().map(WindUnit::as_str).collect();
    let cursor = WindUnit::all().iter().position(|unit| *unit == cfg.units.wind).unwrap_or(0);
    let wind = Select::new("Wind speed unit:", winds).with_starting_cursor(cursor).prompt()?;
    cfg.units.wind = WindUnit::try_from(wind)?;

    cfg.save()?;
    println!("Saved station settings to {}", StationConfig::config_file_path()?.display());
    Ok(())
}

async fn show(json: bool) -> anyhow::Result<()> {
    let fetcher = ForecastFetcher::from_config(StationConfig::load()?)?;
    let mut state = ForecastState::new();

    let outcome = fetcher.download(&mut state).await;
    if outcome == Outcome::NoProvider {
        bail!(no_provider_hint());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render::Panel(&state));
    }

    if let Outcome::RetryAfter(delay) = outcome {
        eprintln!("Forecast unavailable right now; try again in {} minutes.", delay.as_secs() / 60);
    }

    Ok(())
}

/// Host loop: the fetcher says when to come back, this loop waits and calls again.
async fn watch() -> anyhow::Result<()> {
    let fetcher = ForecastFetcher::from_config(StationConfig::load()?)?;
    let refresh = fetcher.config().system.refresh_interval();
    let mut state = ForecastState::new();

    loop {
        let delay = match fetcher.download(&mut state).await {
            Outcome::Updated => refresh,
            Outcome::RetryAfter(delay) => delay,
            Outcome::NoProvider => bail!(no_provider_hint()),
        };

        println!("{}", render::Panel(&state));
        info!(next_in_secs = delay.as_secs(), "waiting for next forecast download");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn no_provider_hint() -> String {
    "No forecast provider configured for this station.\n\
     Hint: run `forecast configure darksky` or `forecast configure openweather`, \
     or set the station country to GB and run `forecast configure metoffice`."
        .to_string()
}
