mod cli;
mod config;
mod input;
mod model;
mod runtime;
mod screens;
mod source;
mod theme;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use runtime::{Completion, Message, Navigator, Screen};
use screens::{ScreenContext, initial_screen};
use source::{CatalogSource, ResourceSource};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use theme::Theme;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;
    init_tracing(&settings.log_filter, settings.log_file.as_deref())?;
    if let Some(path) = &settings.source {
        info!(config = %path.display(), "config file loaded");
    }

    let catalog = settings.catalog.as_deref().context(
        "no catalog configured (pass --catalog, set DECKHAND_CATALOG or add `catalog:` to deckhand.yaml)",
    )?;
    let source = CatalogSource::load(catalog)?;
    if let Some(workspace) = &settings.workspace {
        source.set_workspace(workspace).await?;
    }

    let ctx = ScreenContext {
        source: Arc::new(source),
        table_height: settings.table_height,
        search_char_limit: settings.search_char_limit,
    };
    let screen = initial_screen(&ctx, &args)?;

    run(screen, settings.tick_ms).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(screen: Box<dyn Screen>, tick_ms: u64) -> Result<()> {
    let (tasks_tx, mut tasks_rx) = mpsc::unbounded_channel::<Completion>();
    let mut navigator = Navigator::new(tasks_tx);
    let theme = Theme::default();

    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    navigator.push(screen);
    let run_result = run_loop(&mut terminal, &mut navigator, &mut tasks_rx, &theme, tick_ms).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);
    let run_result = run_result.and_then(|()| match navigator.take_failure() {
        Some(failure) => Err(failure),
        None => Ok(()),
    });

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    navigator: &mut Navigator,
    tasks: &mut mpsc::UnboundedReceiver<Completion>,
    theme: &Theme,
    tick_ms: u64,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while navigator.running() {
        terminal
            .draw(|frame| ui::render(frame, navigator, theme))
            .context("failed to render terminal frame")?;

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        debug!(?key, "key");
                        navigator.handle_key(key);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        navigator.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        info!("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => navigator.dispatch(Message::Tick),
            Some(completion) = tasks.recv() => navigator.complete(completion),
        }
    }

    Ok(())
}
