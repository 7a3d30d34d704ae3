//! Word-completion capture.
//!
//! Two sources feed the shared rate estimator:
//! - the terminal, in raw mode (space completes a word, Esc stops)
//! - standard input (each space byte completes a word, EOF stops)
//!
//! Both run on dedicated OS threads and report why they stopped on an
//! unbounded channel that the driver selects on.

use std::fmt;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use wpm_monitor::SharedRateEstimator;

use crate::config::InputMode;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why monitoring ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Esc on the terminal
    EscapePressed,
    /// Standard input reached EOF
    InputClosed,
    /// Ctrl-C
    Interrupted,
    /// The input source failed
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EscapePressed => write!(f, "escape pressed"),
            StopReason::InputClosed => write!(f, "input closed"),
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::Failed(msg) => write!(f, "input failed: {}", msg),
        }
    }
}

/// What a key press means to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// A word was completed
    Word,
    /// Stop monitoring
    Stop,
    /// Ctrl-C while in raw mode
    Interrupt,
    /// Anything else
    Ignore,
}

/// Map a terminal key event to an action. Only presses count.
pub fn map_key(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Interrupt,
        KeyCode::Char(' ') => KeyAction::Word,
        KeyCode::Esc => KeyAction::Stop,
        _ => KeyAction::Ignore,
    }
}

/// Map a byte read from standard input to an action.
pub fn map_byte(byte: u8) -> KeyAction {
    match byte {
        b' ' => KeyAction::Word,
        _ => KeyAction::Ignore,
    }
}

/// Handle to a running input source.
#[derive(Debug)]
pub struct InputHandle {
    shutdown: Arc<AtomicBool>,
    // Only the terminal thread is joined: it must restore cooked mode. A
    // stdin thread blocked in `read` is left detached so it cannot hold up
    // process exit.
    terminal: Option<thread::JoinHandle<()>>,
}

impl InputHandle {
    /// Stop the source and wait for it to restore the terminal.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let Some(handle) = self.terminal else {
            return;
        };
        let joined = tokio::task::spawn_blocking(move || handle.join()).await;
        if !matches!(joined, Ok(Ok(()))) {
            warn!("Terminal listener did not exit cleanly");
        }
    }
}

/// Spawn the configured input source.
pub fn spawn(
    mode: InputMode,
    estimator: SharedRateEstimator,
    stop_tx: mpsc::UnboundedSender<StopReason>,
) -> io::Result<InputHandle> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let terminal = match mode {
        InputMode::Terminal => Some(
            thread::Builder::new()
                .name("wpm-terminal".into())
                .spawn(move || {
                    let reason = terminal_outcome(listen_terminal(&estimator, &flag));
                    if let Some(reason) = reason_if_active(reason, &flag) {
                        let _ = stop_tx.send(reason);
                    }
                })?,
        ),
        InputMode::Stdin => {
            thread::Builder::new()
                .name("wpm-stdin".into())
                .spawn(move || {
                    let reason = read_words(io::stdin().lock(), &estimator);
                    if let Some(reason) = reason_if_active(Some(reason), &flag) {
                        let _ = stop_tx.send(reason);
                    }
                })?;
            None
        }
    };
    Ok(InputHandle { shutdown, terminal })
}

/// Turn the terminal loop result into the reason reported to the driver.
fn terminal_outcome(result: io::Result<Option<StopReason>>) -> Option<StopReason> {
    match result {
        Ok(reason) => reason,
        Err(e) => {
            error!(error = %e, "Terminal capture failed");
            Some(StopReason::Failed(e.to_string()))
        }
    }
}

fn reason_if_active(reason: Option<StopReason>, shutdown: &AtomicBool) -> Option<StopReason> {
    reason.filter(|_| !shutdown.load(Ordering::SeqCst))
}

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!(error = %e, "Failed to restore terminal mode");
        }
    }
}

/// Blocking terminal loop. Returns `None` when asked to shut down.
fn listen_terminal(
    estimator: &SharedRateEstimator,
    shutdown: &AtomicBool,
) -> io::Result<Option<StopReason>> {
    let _raw = RawModeGuard::enable()?;

    while !shutdown.load(Ordering::SeqCst) {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match map_key(&key) {
                KeyAction::Word => {
                    estimator.record_word();
                    debug!(words = estimator.word_count(), "word completed");
                }
                KeyAction::Stop => return Ok(Some(StopReason::EscapePressed)),
                KeyAction::Interrupt => return Ok(Some(StopReason::Interrupted)),
                KeyAction::Ignore => {}
            }
        }
    }
    Ok(None)
}

/// Count words from a byte stream until it ends. Blocks the calling thread.
pub fn read_words<R: Read>(mut reader: R, estimator: &SharedRateEstimator) -> StopReason {
    let mut buf = [0u8; 1024];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return StopReason::InputClosed,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if map_byte(byte) == KeyAction::Word {
                        estimator.record_word();
                    }
                }
                debug!(words = estimator.word_count(), "input chunk processed");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "Reading standard input failed");
                return StopReason::Failed(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use wpm_monitor::{ManualClock, RateEstimator};

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn space_press_completes_a_word() {
        let k = key(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(map_key(&k), KeyAction::Word);
    }

    #[test]
    fn releases_are_ignored() {
        let k = key(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(map_key(&k), KeyAction::Ignore);
        let k = key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(map_key(&k), KeyAction::Ignore);
    }

    #[test]
    fn escape_stops_and_ctrl_c_interrupts() {
        let esc = key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(map_key(&esc), KeyAction::Stop);
        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(map_key(&ctrl_c), KeyAction::Interrupt);
        let plain_c = key(KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(map_key(&plain_c), KeyAction::Ignore);
    }

    #[test]
    fn only_space_bytes_count() {
        assert_eq!(map_byte(b' '), KeyAction::Word);
        assert_eq!(map_byte(b'\n'), KeyAction::Ignore);
        assert_eq!(map_byte(b'\t'), KeyAction::Ignore);
        assert_eq!(map_byte(b'a'), KeyAction::Ignore);
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::EscapePressed.to_string(), "escape pressed");
        assert_eq!(
            StopReason::Failed("tty gone".into()).to_string(),
            "input failed: tty gone"
        );
    }

    #[test]
    fn shutdown_suppresses_late_reason() {
        let flag = AtomicBool::new(true);
        assert_eq!(reason_if_active(Some(StopReason::EscapePressed), &flag), None);
        flag.store(false, Ordering::SeqCst);
        assert_eq!(
            reason_if_active(Some(StopReason::EscapePressed), &flag),
            Some(StopReason::EscapePressed)
        );
    }

    #[test]
    fn terminal_failure_is_reported() {
        let err = io::Error::new(ErrorKind::Other, "not a tty");
        assert_eq!(
            terminal_outcome(Err(err)),
            Some(StopReason::Failed("not a tty".into()))
        );
    }

    #[test]
    fn terminal_outcome_passes_stop_reasons_through() {
        assert_eq!(
            terminal_outcome(Ok(Some(StopReason::EscapePressed))),
            Some(StopReason::EscapePressed)
        );
        assert_eq!(terminal_outcome(Ok(None)), None);
    }

    #[test]
    fn read_words_counts_spaces_until_eof() {
        let estimator =
            SharedRateEstimator::new(RateEstimator::with_clock(15, ManualClock::new(1_000)));
        let input: &[u8] = b"the quick brown fox jumps ";
        let reason = read_words(input, &estimator);
        assert_eq!(reason, StopReason::InputClosed);
        assert_eq!(estimator.word_count(), 5);
    }

    #[test]
    fn read_words_on_empty_input() {
        let estimator = SharedRateEstimator::new(RateEstimator::new(15));
        let reason = read_words(io::empty(), &estimator);
        assert_eq!(reason, StopReason::InputClosed);
        assert_eq!(estimator.word_count(), 0);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn read_error_stops_with_failure() {
        let estimator = SharedRateEstimator::new(RateEstimator::new(15));
        let reason = read_words(FailingReader, &estimator);
        assert_eq!(reason, StopReason::Failed("pipe closed".into()));
    }

    #[tokio::test]
    async fn shutdown_without_terminal_thread_returns_immediately() {
        let flag = Arc::new(AtomicBool::new(false));
        let handle = InputHandle {
            shutdown: flag.clone(),
            terminal: None,
        };
        handle.shutdown().await;
        assert!(flag.load(Ordering::SeqCst));
    }
}
