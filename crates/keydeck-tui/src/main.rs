use std::io;
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use keydeck_service::BlockingKeyList;
use keydeck_tui::app::App;
use keydeck_tui::components::toast::ToastQueue;
use ratatui::prelude::*;

const DEFAULT_PORT: u16 = 3720;
const DEFAULT_URL: &str = "http://127.0.0.1:3720";
const TOAST_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "keydeck", about = "Manage API keys from the terminal")]
struct Cli {
    /// Connect to a running keydeck-server instead of spawning one
    #[arg(long, env = "KEYDECK_SERVER_URL")]
    server: Option<String>,

    /// Service key for the record store
    #[arg(long, env = "KEYDECK_SERVICE_KEY", hide_env_values = true)]
    service_key: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let service_key = cli.service_key.filter(|k| !k.is_empty());

    let (server_url, mut child) = match cli.server {
        Some(url) => (url, None),
        None => {
            let child = spawn_server(service_key.as_deref())?;
            (DEFAULT_URL.to_string(), Some(child))
        }
    };

    let toasts = ToastQueue::new();
    let keys = BlockingKeyList::connect(&server_url, service_key, Arc::new(toasts.clone()))?;
    let result = wait_for_server(&keys).and_then(|_| run_tui(App::new(keys, toasts)));

    // Cleanup: kill server if we spawned it
    if let Some(ref mut child) = child {
        let _ = child.kill();
        let _ = child.wait();
    }

    result
}

/// The TUI owns the terminal, so logs go to stderr only when asked for.
fn init_logging() {
    if let Ok(filter) = std::env::var("KEYDECK_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(io::stderr)
            .init();
    }
}

fn spawn_server(service_key: Option<&str>) -> Result<Child> {
    // Look for keydeck-server next to our own binary first, then fall back to PATH
    let self_exe = std::env::current_exe().unwrap_or_default();
    let server_bin = self_exe
        .parent()
        .map(|d| d.join("keydeck-server"))
        .filter(|p| p.exists())
        .unwrap_or_else(|| "keydeck-server".into());

    let mut command = Command::new(&server_bin);
    command
        .env("KEYDECK_BIND", "127.0.0.1")
        .env("KEYDECK_PORT", DEFAULT_PORT.to_string())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    if let Some(key) = service_key {
        command.env("KEYDECK_SERVICE_KEY", key);
    }

    let child = command
        .spawn()
        .with_context(|| format!("failed to start {}", server_bin.display()))?;
    Ok(child)
}

fn wait_for_server(keys: &BlockingKeyList) -> Result<()> {
    let start = Instant::now();
    let timeout = Duration::from_secs(10);

    loop {
        if keys.health_check().is_ok() {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!(
                "keydeck-server did not become ready within {}s",
                timeout.as_secs()
            );
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn run_tui(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Queued store work runs once its loading/creating frame is on screen
        if app.has_pending() {
            app.tick();
            continue;
        }

        // Poll while toasts are pending so they disappear on time
        if app.needs_polling() && !event::poll(TOAST_POLL)? {
            app.tick();
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            app.handle_key(key);
            app.tick();
        }
    }

    Ok(())
}
