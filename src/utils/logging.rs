use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the log overlay
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }

    /// Parse one line of the compact fmt output: "LEVEL target: message"
    pub fn parse_compact(line: &str) -> Self {
        let (level, rest) = [
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
        ]
        .into_iter()
        .find_map(|level| {
            line.strip_prefix(level.as_str())
                .and_then(|rest| rest.strip_prefix(' '))
                .map(|rest| (level, rest.trim_start()))
        })
        .unwrap_or((Level::INFO, line));

        let (target, message) = match rest.find(": ") {
            // A target never contains spaces
            Some(colon_pos) if !rest[..colon_pos].contains(' ') => {
                (&rest[..colon_pos], rest[colon_pos + 2..].trim())
            }
            _ => ("general", rest),
        };

        Self::new(level, target, message.to_string())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Thread-safe ring buffer for log entries
#[derive(Clone, Default)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = lock(&self.entries);
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = lock(&self.entries);
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer that feeds the ring buffer and, when available, a log file
#[derive(Clone)]
pub struct DualWriter {
    buffer: LogRingBuffer,
    log_file: Arc<Mutex<Option<File>>>,
}

impl DualWriter {
    pub fn new(buffer: LogRingBuffer, log_path: Option<&Path>) -> Self {
        let log_file = log_path.and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        Self {
            buffer,
            log_file: Arc::new(Mutex::new(log_file)),
        }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(message) = std::str::from_utf8(buf) {
            for line in message.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let entry = LogEntry::parse_compact(line);
                if let Some(file) = lock(&self.log_file).as_mut() {
                    writeln!(file, "{}", entry.format_for_display())?;
                }
                self.buffer.push(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = lock(&self.log_file).as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DualWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Global log buffer accessible throughout the application
static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Get the global log buffer
pub fn get_log_buffer() -> Option<LogRingBuffer> {
    LOG_BUFFER.get().cloned()
}

/// Path of the current log file, if file logging could be set up
pub fn log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

fn new_log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    log_dir.join(format!("frameview_{}.log", timestamp))
}

/// Initialize tracing with the ring buffer and a timestamped log file.
///
/// The filter defaults to `info` and honours `RUST_LOG`. Calling this more
/// than once returns the existing buffer.
pub fn init_tracing(log_dir: Option<&Path>) -> LogRingBuffer {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(existing) = get_log_buffer() {
        return existing;
    }

    let buffer = LogRingBuffer::new();
    LOG_BUFFER.set(buffer.clone()).ok();

    let log_path = log_dir.map(new_log_file_path);
    if let Some(path) = &log_path {
        LOG_PATH.set(path.clone()).ok();
    }

    let writer = DualWriter::new(buffer.clone(), log_path.as_deref());
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time() // LogEntry adds its own timestamps
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding hosts)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "frameview", "Logging system initialized");
    buffer
}
