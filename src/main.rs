use anyhow::Result;
use clap::{Arg, Command};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{io, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::mpsc;

mod app;
mod chat;
mod config;
mod crypto;
mod logging;
mod refresh;
mod session;
mod ui;

use app::{App, Effect};
use chat::SystemClock;
use config::{Config, Overrides};
use refresh::RefreshTimer;

const BURNCHAT_LOGO: &str = r#"
 ____                       _           _
| __ ) _   _ _ __ _ __   ___| |__   __ _| |_
|  _ \| | | | '__| '_ \ / __| '_ \ / _` | __|
| |_) | |_| | |  | | | | (__| | | | (_| | |_
|____/ \__,_|_|  |_| |_|\___|_| |_|\__,_|\__|
"#;

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

fn show_startup_logo() {
    print!("\x1B[2J\x1B[1;1H");

    // Ember gradient, top to bottom
    let colors = [
        "\x1B[38;5;226m",
        "\x1B[38;5;220m",
        "\x1B[38;5;214m",
        "\x1B[38;5;208m",
        "\x1B[38;5;202m",
        "\x1B[38;5;196m",
    ];

    for (i, line) in BURNCHAT_LOGO.lines().enumerate() {
        if i < colors.len() && !line.trim().is_empty() {
            println!("{}{}\x1B[0m", colors[i], line);
        } else {
            println!("{}", line);
        }
    }

    println!(
        "\n\x1B[38;5;208m=== burnchat v{} - self-destructing terminal chat ===\x1B[0m",
        env!("CARGO_PKG_VERSION")
    );
    println!("\x1B[38;5;196mThe peer mask is a toy XOR. Nothing leaves this machine.\x1B[0m");
    println!("\x1B[38;5;220mPress Enter to continue...\x1B[0m\n");

    let _ = std::io::Read::read(&mut std::io::stdin(), &mut [0u8; 1]);
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("burnchat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal chat with self-destructing messages")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Config file (defaults to <config dir>/burnchat/config.toml)"),
        )
        .arg(
            Arg::new("peer")
                .short('p')
                .long("peer")
                .value_name("PEER_ID")
                .help("Connect to this peer ID on startup"),
        )
        .arg(
            Arg::new("ttl")
                .short('t')
                .long("ttl")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Default auto-delete time for messages"),
        )
        .arg(
            Arg::new("refresh-ms")
                .long("refresh-ms")
                .value_name("MILLIS")
                .value_parser(clap::value_parser!(u64))
                .help("How often the chat view is refreshed"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("off, error, warn, info, debug or trace"),
        )
        .arg(
            Arg::new("no-logo")
                .long("no-logo")
                .action(clap::ArgAction::SetTrue)
                .help("Skip startup logo"),
        )
        .get_matches();

    let overrides = Overrides {
        refresh_interval_ms: matches.get_one::<u64>("refresh-ms").copied(),
        default_ttl_secs: matches.get_one::<u64>("ttl").copied(),
        no_logo: matches.get_flag("no-logo"),
        log_level: matches.get_one::<String>("log-level").cloned(),
    };
    let config_path = matches.get_one::<PathBuf>("config");
    let config = Config::load(config_path.map(PathBuf::as_path))?.apply(&overrides);

    if let Err(err) = logging::init(&config) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }
    log::info!("Starting burnchat with {:?}", config);

    if config.show_logo {
        show_startup_logo();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, Arc::new(SystemClock));
    if let Some(peer_id) = matches.get_one::<String>("peer") {
        app.connect_to_peer(peer_id);
    }

    let res = run_app(&mut terminal, &mut app, config.refresh_interval()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{:?}", err);
        println!("Error: {:?}", err);
    }

    log::info!("Exiting");
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, refresh: Duration) -> Result<()> {
    let (timer, mut ticks) = RefreshTimer::spawn(refresh);
    let res = event_loop(terminal, app, &mut ticks);
    if timer.is_finished() {
        log::warn!("Refresh timer stopped before shutdown");
    }
    timer.shutdown().await;
    res
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ticks: &mut mpsc::UnboundedReceiver<()>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(POLL_TIMEOUT)? {
            let effects = app.handle_input(event::read()?);
            apply_effects(app, effects);
        }

        let mut ticked = false;
        while ticks.try_recv().is_ok() {
            ticked = true;
        }
        if ticked {
            app.on_tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn apply_effects(app: &mut App, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Quit => app.should_quit = true,
            Effect::CopyToClipboard { label, text } => match copy_to_clipboard(&text) {
                Ok(()) => app.notify(format!("Copied {} to clipboard", label)),
                Err(err) => {
                    log::warn!("Clipboard unavailable: {}", err);
                    app.notify(format!("Clipboard unavailable: {}", err));
                }
            },
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_owned())
}
