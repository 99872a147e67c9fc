use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use report_core::{
    Config, Coordinates, FixedGeolocator, Geolocator, IpGeolocator, NewsClient, NoGeolocation,
    Nominatim, Post, ProviderKind, Resolver, WeatherWidget, provider_for,
    render::{render_masthead, render_weather},
};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "daily-report", version, about = "The Daily Report, in your terminal")]
pub struct Cli {
    /// Show debug logs (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose a weather provider and store its credentials.
    Configure {
        /// Provider short name: "openweather" or "open-meteo".
        provider: String,
    },

    /// Show the current weather line.
    Weather {
        #[command(flatten)]
        location: LocationArgs,

        /// Print the resolved state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Masthead, weather and the latest articles.
    Home {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show a single article.
    Post {
        id: u64,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude to use instead of detecting it.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of detecting it.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Don't try to detect the location at all.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub no_locate: bool,

    /// Override the configured provider for this run.
    #[arg(long)]
    pub provider: Option<String>,
}

impl LocationArgs {
    fn geolocator(&self) -> Arc<dyn Geolocator> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Arc::new(FixedGeolocator(Coordinates::new(lat, lon))),
            _ if self.no_locate => Arc::new(NoGeolocation),
            _ => Arc::new(IpGeolocator::new()),
        }
    }

    /// Provider choice is made here, once, before anything is mounted.
    fn resolver(&self) -> anyhow::Result<Resolver> {
        let mut config = Config::load()?.with_env_overrides();
        if let Some(provider) = &self.provider {
            config.provider = Some(provider.clone());
        }

        let kind = config.provider_kind()?;
        debug!(provider = %kind, "weather provider selected");

        Ok(Resolver::new(
            self.geolocator(),
            Arc::new(Nominatim::new()),
            Arc::from(provider_for(kind, &config)),
        ))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Weather { location, json } => {
                let mut widget = WeatherWidget::mount(location.resolver()?);
                let state = widget.resolved().await;
                widget.close().await;

                if json {
                    let out = serde_json::to_string_pretty(&state)
                        .context("Failed to serialize weather state")?;
                    println!("{out}");
                } else {
                    println!("{}", render_weather(&state));
                }
                Ok(())
            }
            Command::Home { location } => {
                let mut widget = WeatherWidget::mount(location.resolver()?);
                let news = NewsClient::new();

                let (state, posts) = tokio::join!(widget.resolved(), news.posts());
                widget.close().await;

                println!("{}\n", render_masthead(&state));
                for post in posts? {
                    print_summary(&post);
                }
                Ok(())
            }
            Command::Post { id } => {
                let post = NewsClient::new().post(id).await?;
                print_article(&post);
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let kind = ProviderKind::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = if kind.needs_api_key() {
        let key = inquire::Password::new(&format!("API key for {kind}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        Some(key.trim().to_string()).filter(|k| !k.is_empty())
    } else {
        None
    };

    if kind.needs_api_key() && api_key.is_none() && config.api_key().is_none() {
        println!("No API key stored; weather will show as unavailable until one is configured.");
    }

    config.set_provider(kind, api_key);
    config.save()?;

    println!(
        "Provider set to {kind}. Config saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn print_summary(post: &Post) {
    println!("[{}] {}", post.id, post.title);
    println!("    {}\n", post.excerpt());
}

fn print_article(post: &Post) {
    println!("{}", post.title);
    if !post.tags.is_empty() {
        println!("{}", post.tags.join(" · "));
    }
    println!("\n{}", post.body);
}
