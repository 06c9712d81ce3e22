use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// The spinner currently on screen; log lines are printed above it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active() -> std::sync::MutexGuard<'static, Option<ProgressBar>> {
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn start(msg: impl Into<Cow<'static, str>>) -> Self {
        let pb: ProgressBar = ProgressBar::new_spinner();
        let style: ProgressStyle = ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[
                "▁▁▁▁▁",
                "▁▂▂▂▁",
                "▁▄▂▄▁",
                "▂▄▆▄▂",
                "▄▆█▆▄",
                "▂▄▆▄▂",
                "▁▄▂▄▁",
                "▁▂▂▂▁",
            ]);
        pb.set_style(style);
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(100));

        *active() = Some(pb.clone());
        Self { pb }
    }

    pub fn set_message(&self, msg: impl Into<Cow<'static, str>>) {
        self.pb.set_message(msg);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        *active() = None;
        self.pb.finish_and_clear();
    }
}

/// Buffers one formatted event and prints it above the spinner, or straight
/// to stdout when no spinner is running.
#[derive(Default)]
pub struct SpinnerWriter {
    buf: Vec<u8>,
}

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text: String = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();

        match active().as_ref() {
            Some(pb) => pb.println(text.trim_end()),
            None => io::stdout().lock().write_all(text.as_bytes())?,
        }
        Ok(())
    }
}

impl Drop for SpinnerWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
