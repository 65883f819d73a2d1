use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gnome_rotate::apply::{ApplyOrchestrator, Durability};
use gnome_rotate::backends::dummy::DummyDisplayConfig;
use gnome_rotate::backends::mutter::MutterDisplayConfig;
use gnome_rotate::backends::DisplayConfigService;
use gnome_rotate::display::PhysicalMonitor;
use gnome_rotate::listener::ChangeListener;
use gnome_rotate::orientation::Rotation;
use gnome_rotate::store::DisplayStateStore;

#[derive(Parser, Debug)]
#[clap(name = "gnome-rotate", version, about = "Rotate the whole monitor layout of a GNOME session")]
struct Args {
    /// Display configuration service to talk to
    #[clap(long, value_enum, env = "GNOME_ROTATE_BACKEND", default_value = "mutter")]
    backend: Backend,

    /// How long an applied layout should stick
    #[clap(long, value_enum, env = "GNOME_ROTATE_DURABILITY", default_value = "temporary")]
    durability: Durability,

    /// Log filter, overridden by RUST_LOG
    #[clap(long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current display state as JSON
    State,
    /// Rotate every monitor and the layout as a whole
    Rotate {
        /// clockwise, counter-clockwise, half, none, or clockwise degrees
        /// in multiples of 90 (negative turns counter-clockwise)
        #[clap(value_parser = Rotation::from_str, allow_hyphen_values = true)]
        rotation: Rotation,
    },
    /// Follow layout changes until interrupted
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    Mutter,
    Dummy,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let service: Arc<dyn DisplayConfigService> = match args.backend {
        Backend::Mutter => Arc::new(
            MutterDisplayConfig::connect()
                .await
                .context("could not connect to org.gnome.Mutter.DisplayConfig")?,
        ),
        Backend::Dummy => Arc::new(DummyDisplayConfig::laptop_with_external()),
    };
    let store = Arc::new(DisplayStateStore::new(service));

    match args.command {
        Command::State => {
            let state = store.refresh().await?;
            println!("{}", serde_json::to_string_pretty(&*state)?);
        }
        Command::Rotate { rotation } => {
            let state = store.refresh().await?;
            let orchestrator = ApplyOrchestrator::new(store.clone(), args.durability);
            let layout = orchestrator
                .rotate(rotation)
                .await
                .context("rotation failed, the layout may have changed meanwhile; try again")?;
            for logical in &layout {
                let names = logical
                    .connectors
                    .iter()
                    .map(|connector| {
                        state
                            .physical_monitor(connector)
                            .map_or(connector.as_str(), PhysicalMonitor::display_name)
                    })
                    .collect::<Vec<_>>();
                info!(
                    monitors = ?names,
                    x = logical.x,
                    y = logical.y,
                    transform = logical.transform.to_wire(),
                    "rotated"
                );
            }
        }
        Command::Watch => {
            // Subscribes before the first refresh.
            let listener = ChangeListener::subscribe(store.clone()).await?;
            info!("watching for layout changes, Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            drop(listener);
            info!("stopped watching");
        }
    }

    Ok(())
}
