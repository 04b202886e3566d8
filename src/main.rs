use clap::{Parser, Subcommand};
use relm4::prelude::*;
use std::io::Write;
use std::os::unix::net::UnixStream;
use vane::config::{self, LayerKind};
use vane::gui::app::{AppInit, AppModel};
use vane::sys::runtime;
use vane::sys::server::SOCKET_PATH;
use vane::sys::wm::{self, MonitorName};

#[derive(Parser, Debug)]
#[command(name = "vane", version, about = "A field of arrows that follow the pointer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Layer-shell layer to draw on (overrides the config file)
    #[arg(short = 'l', long)]
    layer: Option<LayerKind>,

    /// Output connector to cover, e.g. "DP-1"
    #[arg(short = 'm', long)]
    monitor: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the running field
    Show,
    /// Hide the running field
    Hide,
    /// Toggle the running field
    Toggle,
    /// Write the default config file if there is none
    Init,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Show) => send_command("show"),
        Some(Commands::Hide) => send_command("hide"),
        Some(Commands::Toggle) => send_command("toggle"),
        Some(Commands::Init) => {
            let path = config::write_default_config()?;
            println!("{}", path.display());
            Ok(())
        }
        None => {
            run(cli.layer, cli.monitor.map(MonitorName::new));
            Ok(())
        }
    }
}

fn run(layer: Option<LayerKind>, monitor: Option<MonitorName>) {
    let mut config = config::load_or_default();
    if let Some(layer) = layer {
        config.appearance.layer = layer;
    }

    // Polled cursor coordinates are relative to one monitor; pin the surface
    // to it so both agree.
    let monitor = monitor.or_else(|| {
        config
            .appearance
            .hyprland_cursor
            .then(wm::get_active_monitor)
            .flatten()
    });

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx, &config.appearance, monitor.clone());

    let app = RelmApp::new("org.vane.vane").with_args(Vec::new());

    app.run::<AppModel>(AppInit {
        config,
        monitor,
        rx,
    });
}

fn send_command(cmd: &str) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to vane at {}: {}. Is vane running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", cmd)?;
    Ok(())
}
