#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line client for the dispatch server.
//!
//! ```text
//! orbit feed [--type FIRE] [--hours 24] [--radius 15] [--lat 25.6 --lng 85.1]
//! orbit watch [same options as feed]
//! orbit submit --lat 25.6 --lng 85.1 --type FIRE --severity high --description "..."
//! orbit verify <id> --token <access token>
//! orbit notes <id> "<text>" --token <access token>
//! ```

mod render;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use futures::StreamExt as _;
use geo::Point;
use orbit_feed::{DispatchClient, FeedComposer, FeedFilter, FeedSource, spatial};
use orbit_incident_models::{IncidentStatus, IncidentType, Severity};
use orbit_server_models::CreateIncidentRequest;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "orbit", about = "Report, verify and follow incidents")]
struct Cli {
    /// Dispatch server base URL
    #[arg(
        long,
        env = "ORBIT_BACKEND_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    backend: String,

    /// Access token for officer commands
    #[arg(long, env = "ORBIT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ranked feed around a point once
    Feed(ViewArgs),
    /// Print the feed and reprint it on every change
    Watch(ViewArgs),
    /// Report a new incident
    Submit {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// FIRE, ACCIDENT, MEDICAL or INFRASTRUCTURE
        #[arg(long = "type", value_parser = parse_type)]
        incident_type: IncidentType,
        /// low, medium or high
        #[arg(long, value_parser = parse_severity)]
        severity: Severity,
        #[arg(long)]
        description: String,
        /// Public URL of a photo or video
        #[arg(long)]
        media_url: Option<String>,
    },
    /// Mark an incident as verified (officer)
    Verify {
        id: Uuid,
    },
    /// Replace an incident's internal notes (officer)
    Notes {
        id: Uuid,
        text: String,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Only show this incident type
    #[arg(long = "type", value_parser = parse_type)]
    incident_type: Option<IncidentType>,
    /// Rolling window in hours
    #[arg(long, default_value = "24")]
    hours: u32,
    /// View radius in kilometres
    #[arg(long, default_value_t = spatial::DEFAULT_RADIUS_KM)]
    radius: f64,
    /// View center latitude
    #[arg(long, default_value_t = spatial::DEFAULT_CENTER.1, allow_hyphen_values = true)]
    lat: f64,
    /// View center longitude
    #[arg(long, default_value_t = spatial::DEFAULT_CENTER.0, allow_hyphen_values = true)]
    lng: f64,
}

impl ViewArgs {
    fn filter(&self) -> FeedFilter {
        FeedFilter {
            incident_type: self.incident_type,
            window_hours: self.hours,
            radius_km: self.radius,
        }
    }

    fn center(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

fn parse_type(value: &str) -> Result<IncidentType, String> {
    value
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| format!("unknown incident type '{value}'"))
}

fn parse_severity(value: &str) -> Result<Severity, String> {
    value
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| format!("unknown severity '{value}'"))
}

fn print_feed<S: FeedSource>(composer: &FeedComposer<S>) {
    let now = Utc::now();
    let center = composer.center();
    let mut shown = 0;

    for (i, ranked) in composer.visible().enumerate() {
        println!("{}", render::feed_row(i + 1, ranked, center, now));
        shown += 1;
    }

    if shown == 0 {
        println!("No incidents within {} km.", composer.filter().radius_km);
    }
}

async fn open_feed(
    client: DispatchClient,
    view: &ViewArgs,
) -> Result<FeedComposer<DispatchClient>, Box<dyn std::error::Error>> {
    let mut composer = FeedComposer::new(client, view.filter());
    composer.set_view_center(view.center());
    composer.reload().await?;
    Ok(composer)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut client = DispatchClient::new(&cli.backend);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match cli.command {
        Commands::Feed(view) => {
            let composer = open_feed(client, &view).await?;
            print_feed(&composer);
        }
        Commands::Watch(view) => {
            let events = client.subscribe().await?;
            let mut events = std::pin::pin!(events);

            let mut composer = open_feed(client, &view).await?;
            print_feed(&composer);

            while let Some(event) = events.next().await {
                let event = event?;
                let ops = composer.handle_change(&event).await?;
                println!(
                    "\n-- {:?} at {} | markers {} --",
                    event.kind,
                    Utc::now().format("%H:%M:%S"),
                    render::marker_summary(&ops)
                );
                print_feed(&composer);
            }

            log::info!("Change stream ended");
        }
        Commands::Submit {
            lat,
            lng,
            incident_type,
            severity,
            description,
            media_url,
        } => {
            let incident = client
                .submit(&CreateIncidentRequest {
                    lat,
                    lng,
                    incident_type,
                    description,
                    severity,
                    media_url,
                })
                .await?;
            println!("Reported {} ({})", incident.id, incident.status);
        }
        Commands::Verify { id } => {
            let incident = client.set_status(id, IncidentStatus::Verified).await?;
            println!("{} is now {}", incident.id, incident.status);
        }
        Commands::Notes { id, text } => {
            let incident = client.set_notes(id, &text).await?;
            println!("Notes saved on {}", incident.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_enums_case_insensitively() {
        assert_eq!(parse_type("fire").unwrap(), IncidentType::Fire);
        assert_eq!(parse_severity("HIGH").unwrap(), Severity::High);
        assert!(parse_type("flood").is_err());
    }

    #[test]
    fn feed_defaults() {
        let cli = Cli::try_parse_from(["orbit", "feed"]).unwrap();
        let Commands::Feed(view) = cli.command else {
            panic!("expected feed");
        };
        assert_eq!(view.filter(), FeedFilter::default());
        assert_eq!(view.center(), spatial::default_center());
    }
}
