use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Bounded ring of formatted log lines shown in the dashboard's log pane.
pub struct LogStore {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl LogStore {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.is_empty() {
            return;
        }
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Up to `max` lines ending `skip_from_end` lines before the newest, oldest first.
    pub fn tail(&self, skip_from_end: usize, max: usize) -> Vec<String> {
        let skip = skip_from_end.min(self.lines.len());
        let mut visible: Vec<String> = self
            .lines
            .iter()
            .rev()
            .skip(skip)
            .take(max)
            .cloned()
            .collect();
        visible.reverse();
        visible
    }
}

#[derive(Clone)]
pub struct LogMakeWriter {
    store: Arc<Mutex<LogStore>>,
}

impl LogMakeWriter {
    pub fn new(store: Arc<Mutex<LogStore>>) -> Self {
        Self { store }
    }
}

impl<'a> MakeWriter<'a> for LogMakeWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            store: self.store.clone(),
            partial: String::new(),
        }
    }
}

/// Splits formatted events into lines.
pub struct LogWriter {
    store: Arc<Mutex<LogStore>>,
    partial: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(idx) = self.partial.find('\n') {
            let line = self.partial[..idx].trim_end_matches('\r').to_string();
            self.partial.drain(..=idx);
            self.store.lock().push_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let line = self.partial.trim();
        if !line.is_empty() {
            self.store.lock().push_line(line.to_string());
        }
    }
}
