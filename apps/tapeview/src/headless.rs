use std::path::PathBuf;
use tapeview_application::config::{load_config, Config, TRACKED_SYMBOLS};
use tapeview_application::frame::{FrameOrchestrator, RenderContext};
use tapeview_infrastructure::render::RecordingRenderSink;
use tapeview_infrastructure::tick_log::CsvTickLogRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessMode {
    /// Read and derive every symbol once, print the per-stage reports.
    Validate,
    /// Run full cycles into an in-memory sink and print the last frame.
    Frame,
}

pub struct HeadlessArgs {
    pub mode: HeadlessMode,
    pub config_path: Option<PathBuf>,
    pub cycles: usize,
}

pub fn run_headless(args: HeadlessArgs) -> Result<serde_json::Value, String> {
    let config = match args.config_path.as_deref() {
        Some(path) => load_config(path)?,
        None => {
            let config = Config::default();
            config.validate()?;
            config
        }
    };

    match args.mode {
        HeadlessMode::Validate => run_validate(&config),
        HeadlessMode::Frame => run_frames(&config, args.cycles),
    }
}

fn build_repo(config: &Config) -> CsvTickLogRepository {
    CsvTickLogRepository::new(&config.tick_log.path, TRACKED_SYMBOLS)
        .with_leading_index_column(config.tick_log.leading_index_column)
}

fn run_validate(config: &Config) -> Result<serde_json::Value, String> {
    let repo = build_repo(config);
    let summary = tapeview_application::validation::validate(config, &repo)?;
    Ok(serde_json::json!({
        "mode": "validate",
        "status": "ok",
        "summary": summary,
    }))
}

fn run_frames(config: &Config, cycles: usize) -> Result<serde_json::Value, String> {
    if cycles == 0 {
        return Err("--cycles must be >= 1".to_string());
    }
    let orchestrator =
        FrameOrchestrator::new(build_repo(config), config.symbol_slots(), config.timeframe()?)?;
    let mut ctx = RenderContext::new(RecordingRenderSink::new());

    let mut last_cycle = None;
    for cycle in 0..cycles {
        if cycle > 0 {
            std::thread::sleep(config.refresh_interval());
        }
        let wall_clock = chrono::Local::now().naive_local();
        let report = orchestrator
            .run_cycle(&mut ctx, wall_clock)
            .map_err(|err| format!("cycle {} failed: {err}", cycle + 1))?;
        last_cycle = Some(report);
    }

    let frame = serde_json::to_value(ctx.sink().dump())
        .map_err(|err| format!("failed to serialize frame: {err}"))?;
    Ok(serde_json::json!({
        "mode": "frame",
        "status": "ok",
        "cycles": cycles,
        "last_cycle": last_cycle,
        "frame": frame,
    }))
}
