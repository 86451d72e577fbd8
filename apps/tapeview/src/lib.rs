mod app;
pub mod headless;
pub mod logging;
mod ui;

use crate::app::App;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use tapeview_application::config::{Config, TRACKED_SYMBOLS};
use tapeview_application::frame::FrameOrchestrator;
use tapeview_infrastructure::tick_log::CsvTickLogRepository;
use tokio::time::MissedTickBehavior;

#[derive(Clone)]
pub struct TuiOpts {
    pub config: Config,
    pub log_store: Arc<parking_lot::Mutex<logging::LogStore>>,
}

pub fn run(opts: TuiOpts) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| format!("failed to init tokio runtime: {err}"))?;
    runtime.block_on(run_async(opts))
}

async fn run_async(opts: TuiOpts) -> Result<(), String> {
    enable_raw_mode().map_err(|err| format!("failed to enable raw mode: {err}"))?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|err| format!("failed to enter alternate screen: {err}"))?;
    stdout
        .execute(crossterm::terminal::Clear(
            crossterm::terminal::ClearType::All,
        ))
        .map_err(|err| format!("failed to clear screen: {err}"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|err| format!("failed to init terminal: {err}"))?;
    terminal
        .hide_cursor()
        .map_err(|err| format!("failed to hide cursor: {err}"))?;

    let result = run_loop(&mut terminal, opts).await;

    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = terminal.show_cursor();

    result
}

async fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    opts: TuiOpts,
) -> Result<(), String> {
    let config = opts.config;
    let timeframe = config.timeframe()?;
    let repo = CsvTickLogRepository::new(&config.tick_log.path, TRACKED_SYMBOLS)
        .with_leading_index_column(config.tick_log.leading_index_column);
    let orchestrator = FrameOrchestrator::new(repo, config.symbol_slots(), timeframe)?;

    let refresh = config.refresh_interval();
    let mut app = App::new(
        opts.log_store,
        format!(
            "{} buckets  refresh={}ms",
            config.resample.bucket,
            refresh.as_millis()
        ),
    );
    tracing::info!(
        path = %config.tick_log.path,
        bucket = %config.resample.bucket,
        refresh_ms = refresh.as_millis() as u64,
        "dashboard started"
    );

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    app.spawn_input_reader(event_tx);

    // The first tick fires immediately, so the initial frame is drawn at startup.
    let mut refresh_tick = tokio::time::interval(refresh);
    refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if app.dirty {
            terminal
                .draw(|frame| ui::draw(frame, &mut app))
                .map_err(|err| format!("terminal draw failed: {err}"))?;
            app.dirty = false;
        }

        tokio::select! {
            _ = refresh_tick.tick() => {
                if app.should_run_cycle() {
                    let wall_clock = chrono::Local::now().naive_local();
                    let result = orchestrator.run_cycle(&mut app.ctx, wall_clock);
                    app.on_cycle(result);
                }
            }
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { return Ok(()); };
                if app.on_event(event)? { return Ok(()); }
            }
        }
    }
}
