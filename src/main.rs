use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result, WrapErr};
use reqwest::Url;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use weathervane::config::Credentials;
use weathervane::display::{Console, Display, Ws2812};
use weathervane::render::DEFAULT_TICK;
use weathervane::weather::{OpenWeather, ReqwestClient};
use weathervane::Settings;

#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// OpenWeather API key; read from API_KEY.txt when not given
    #[arg(long, env = "WEATHERVANE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// City to report on; read from LOCATION.txt when not given
    #[arg(long, env = "WEATHERVANE_CITY", global = true)]
    city: Option<String>,

    /// Directory holding API_KEY.txt and LOCATION.txt
    #[arg(long, default_value = ".", global = true)]
    credentials_dir: PathBuf,

    #[arg(long, default_value = OpenWeather::<ReqwestClient>::DEFAULT_BASE_URL, global = true)]
    base_url: Url,

    /// Connect and read timeout for each HTTP request, in seconds
    #[arg(long, default_value_t = 10, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the current condition as a pulsing color until interrupted
    Run(RunArgs),

    /// Print the location and a one-line weather summary, then exit
    Report,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, value_enum, default_value_t = Sink::Console)]
    sink: Sink,

    /// Milliseconds between frames
    #[arg(long, default_value_t = DEFAULT_TICK.as_millis() as u64, value_parser = clap::value_parser!(u64).range(10..=1000))]
    tick_ms: u64,

    /// Number of LEDs on the strip
    #[arg(long, default_value_t = 1)]
    pixels: usize,

    /// LED brightness, 0-255
    #[arg(long, default_value_t = 255)]
    brightness: u8,

    /// Give up waiting for the network after this many seconds
    #[arg(long, default_value_t = 30)]
    network_wait_secs: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Sink {
    /// Print an (r, g, b) line per frame
    Console,
    /// WS2812 strip on SPI0
    Led,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging()?;

    match execute(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast::<weathervane::Error>() {
            Ok(fatal) => {
                eprintln!("{}", fatal);
                Ok(ExitCode::FAILURE)
            }
            Err(other) => Err(other),
        },
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| eyre!("Unable to install logger: {}", e))
}

async fn execute(cli: Cli) -> Result<()> {
    let credentials = Credentials::load(&cli.credentials_dir, cli.api_key, cli.city)?;
    let client = ReqwestClient::new(Duration::from_secs(cli.timeout_secs))
        .wrap_err("Unable to build HTTP client")?;
    let api = OpenWeather::new(client, cli.base_url, credentials.api_key);

    match cli.command {
        Command::Report => report(&api, &credentials.city).await,
        Command::Run(args) => {
            let settings = Settings {
                tick: Duration::from_millis(args.tick_ms),
                network_wait: Duration::from_secs(args.network_wait_secs),
            };
            match args.sink {
                Sink::Console => animate(&api, &credentials.city, Console::new(), &settings).await,
                Sink::Led => {
                    let leds = Ws2812::new(args.pixels, args.brightness)
                        .map_err(|e| weathervane::Error::Device(e.to_string()))?;
                    animate(&api, &credentials.city, leds, &settings).await
                }
            }
        }
    }
}

async fn animate<D: Display>(
    api: &OpenWeather,
    city: &str,
    display: D,
    settings: &Settings,
) -> Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Unable to listen for shutdown signal.");
            std::future::pending::<()>().await;
        }
    };

    weathervane::run(api, city, display, settings, shutdown).await?;
    Ok(())
}

async fn report(api: &OpenWeather, city: &str) -> Result<()> {
    let location = api.geocode(city).await?;
    println!("Location: {}", location);

    match api.current_weather(location.coordinates).await {
        Ok(weather) => {
            println!("{}", weather.sky());
            let key = weather.condition_key();
            println!("Condition: {} ({})", key, key.describe());
        }
        Err(e) => {
            error!(error = %e, "weather lookup failed");
            println!("{}", weathervane::weather::Sky::Unknown);
        }
    }

    Ok(())
}
