//! Frame display and key input.
//!
//! The frame loop only needs three things from a display: show a frame, poll
//! for a key with a short timeout, and block until any key arrives. The
//! terminal implementation reads keys from stdin on a helper thread and hands
//! them to the control thread over a channel; Ctrl-C becomes a sticky quit key.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::frame::Frame;

pub const QUIT_KEY: char = 'q';
pub const PAUSE_KEY: char = 'p';

/// Key sent for an empty input line.
const ENTER_KEY: char = '\n';

pub trait Display {
    fn show(&mut self, frame: &Frame) -> Result<()>;

    /// Wait at most `timeout` for a key.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>>;

    /// Block until the next key, with no timeout.
    fn wait_key(&mut self) -> Result<char>;

    /// Release window and input resources.
    fn close(&mut self) {}
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        (**self).show(frame)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        (**self).poll_key(timeout)
    }

    fn wait_key(&mut self) -> Result<char> {
        (**self).wait_key()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Headless display driven from the terminal.
///
/// Each stdin line is one key event: its first character, or Enter for an
/// empty line. Frames are not drawn anywhere; showing one is logged at trace
/// level under the window title.
pub struct TerminalDisplay {
    title: String,
    keys: Receiver<char>,
    interrupted: Arc<AtomicBool>,
    shown: u64,
}

impl TerminalDisplay {
    /// Spawn the stdin reader and install the Ctrl-C handler. Call at most once
    /// per process.
    pub fn new(title: &str) -> Result<Self> {
        let (tx, rx) = unbounded();
        let interrupted = Arc::new(AtomicBool::new(false));

        let ctrlc_tx = tx.clone();
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = ctrlc_tx.send(QUIT_KEY);
        })
        .context("installing Ctrl-C handler")?;

        std::thread::Builder::new()
            .name("key-input".to_string())
            .spawn(move || read_keys(std::io::stdin().lock(), tx))
            .context("spawning key input thread")?;

        Ok(Self::from_parts(title, rx, interrupted))
    }

    fn from_parts(title: &str, keys: Receiver<char>, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            title: title.to_string(),
            keys,
            interrupted,
            shown: 0,
        }
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }

    fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

impl Display for TerminalDisplay {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.shown += 1;
        log::trace!(
            "[{}] frame {} ({}x{})",
            self.title,
            self.shown,
            frame.width(),
            frame.height()
        );
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        if self.interrupted() {
            return Ok(Some(QUIT_KEY));
        }
        match self.keys.recv_timeout(timeout) {
            Ok(key) => Ok(Some(key)),
            // stdin closed: no more keys will ever arrive, keep running
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn wait_key(&mut self) -> Result<char> {
        self.keys
            .recv()
            .map_err(|_| anyhow!("key input closed while waiting for a key"))
    }

    fn close(&mut self) {
        log::debug!("[{}] closed after {} frames", self.title, self.shown);
    }
}

fn read_keys<R: BufRead>(input: R, tx: Sender<char>) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        let key = line.trim().chars().next().unwrap_or(ENTER_KEY);
        if tx.send(key).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_become_keys() {
        let (tx, rx) = unbounded();
        read_keys(Cursor::new("p\n\nquit\n"), tx);
        let keys: Vec<char> = rx.try_iter().collect();
        assert_eq!(keys, vec!['p', ENTER_KEY, 'q']);
    }

    #[test]
    fn poll_times_out_without_input() -> Result<()> {
        let (_tx, rx) = unbounded();
        let mut display =
            TerminalDisplay::from_parts("test", rx, Arc::new(AtomicBool::new(false)));
        assert_eq!(display.poll_key(Duration::from_millis(1))?, None);
        Ok(())
    }

    #[test]
    fn interrupt_is_a_sticky_quit() -> Result<()> {
        let (tx, rx) = unbounded();
        let flag = Arc::new(AtomicBool::new(false));
        let mut display = TerminalDisplay::from_parts("test", rx, Arc::clone(&flag));

        flag.store(true, Ordering::SeqCst);
        tx.send(QUIT_KEY)?;
        // a paused loop resumes on the interrupt key, then sees quit on the next poll
        assert_eq!(display.wait_key()?, QUIT_KEY);
        assert_eq!(display.poll_key(Duration::from_millis(1))?, Some(QUIT_KEY));
        assert_eq!(display.poll_key(Duration::from_millis(1))?, Some(QUIT_KEY));
        Ok(())
    }

    #[test]
    fn wait_fails_once_input_is_gone() {
        let (tx, rx) = unbounded::<char>();
        drop(tx);
        let mut display =
            TerminalDisplay::from_parts("test", rx, Arc::new(AtomicBool::new(false)));
        assert!(display.wait_key().is_err());
    }
}
