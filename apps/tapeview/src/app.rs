use crate::logging::LogStore;
use crossterm::event::{Event as CtEvent, KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;
use std::sync::Arc;
use tapeview_application::frame::{CycleReport, RenderContext};
use tapeview_domain::error::TickLogError;
use tapeview_infrastructure::render::RecordingRenderSink;

pub enum AppEvent {
    Input(CtEvent),
}

pub struct App {
    pub ctx: RenderContext<RecordingRenderSink>,
    pub logs: Arc<Mutex<LogStore>>,
    pub log_scroll: usize,
    pub paused: bool,
    /// Set by a structural log error; scheduling stays stopped until the user resumes.
    pub halted: Option<String>,
    /// Most recent transient read failure, cleared by the next good cycle.
    pub last_warning: Option<String>,
    pub last_cycle: Option<CycleReport>,
    pub cycles: u64,
    pub dirty: bool,
    pub refresh_label: String,
}

impl App {
    pub fn new(logs: Arc<Mutex<LogStore>>, refresh_label: String) -> Self {
        Self {
            ctx: RenderContext::new(RecordingRenderSink::new()),
            logs,
            log_scroll: 0,
            paused: false,
            halted: None,
            last_warning: None,
            last_cycle: None,
            cycles: 0,
            dirty: true,
            refresh_label,
        }
    }

    pub fn spawn_input_reader(&self, tx: tokio::sync::mpsc::UnboundedSender<AppEvent>) {
        std::thread::spawn(move || {
            while let Ok(event) = crossterm::event::read() {
                if tx.send(AppEvent::Input(event)).is_err() {
                    break;
                }
            }
        });
    }

    pub fn should_run_cycle(&self) -> bool {
        !self.paused && self.halted.is_none()
    }

    pub fn on_cycle(&mut self, result: Result<CycleReport, TickLogError>) {
        match result {
            Ok(report) => {
                self.cycles = self.cycles.wrapping_add(1);
                self.last_warning = None;
                self.last_cycle = Some(report);
            }
            Err(err) if err.is_fatal() => {
                self.halted = Some(err.to_string());
            }
            Err(err) => {
                self.last_warning = Some(err.to_string());
            }
        }
        self.dirty = true;
    }

    /// Returns `Ok(true)` when the app should exit.
    pub fn on_event(&mut self, event: AppEvent) -> Result<bool, String> {
        match event {
            AppEvent::Input(CtEvent::Key(key)) => self.on_key(key),
            AppEvent::Input(CtEvent::Resize(_, _)) => {
                self.dirty = true;
                Ok(false)
            }
            AppEvent::Input(_) => Ok(false),
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<bool, String> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('p') => {
                self.paused = !self.paused;
                tracing::info!(paused = self.paused, "refresh toggled");
            }
            KeyCode::Char('r') => {
                if let Some(reason) = self.halted.take() {
                    tracing::info!(%reason, "resuming after halt");
                }
                self.paused = false;
            }
            KeyCode::PageUp => {
                let total = self.logs.lock().len();
                self.log_scroll = (self.log_scroll + 5).min(total);
            }
            KeyCode::PageDown => {
                self.log_scroll = self.log_scroll.saturating_sub(5);
            }
            KeyCode::End => {
                self.log_scroll = 0;
            }
            _ => return Ok(false),
        }
        self.dirty = true;
        Ok(false)
    }
}
