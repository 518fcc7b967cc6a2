//! Progress tracking and reporting for download operations
//!
//! Downloaders never render anything themselves. When a request asks for a
//! progress bar they call [`ProgressFactory::create`] once, feed the returned
//! [`ProgressIndicator`] with every chunk length and close it after the file
//! has been moved into place.

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Unit label used for byte transfers
pub const BYTES_UNIT: &str = "B";

/// Parameters a progress indicator is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSpec {
    pub unit: String,
    /// Expected number of units, `None` when the source did not say
    pub total: Option<u64>,
    pub description: String,
}

impl ProgressSpec {
    pub fn bytes<S: Into<String>>(total: Option<u64>, description: S) -> Self {
        Self {
            unit: BYTES_UNIT.to_string(),
            total,
            description: description.into(),
        }
    }
}

/// A live progress display scoped to one transfer
pub trait ProgressIndicator: Send {
    fn advance(&mut self, delta: u64);
    fn close(self: Box<Self>);
}

/// Builds progress indicators on demand
pub trait ProgressFactory: Send + Sync {
    fn create(&self, spec: &ProgressSpec) -> Box<dyn ProgressIndicator>;
}

const PB_STYLE: &str = "{prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.progress_chars(PB_CHARS))
});

static SPINNER_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(SPINNER_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// Terminal progress bars drawn on stderr
///
/// Known totals get a bar, unknown totals get a spinner with a byte counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgressFactory;

impl ProgressFactory for ConsoleProgressFactory {
    fn create(&self, spec: &ProgressSpec) -> Box<dyn ProgressIndicator> {
        let (pb, style) = match spec.total {
            Some(total) => (ProgressBar::new(total), PB_TEMPLATE.as_ref()),
            None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE.as_ref()),
        };
        let pb = match style {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(spec.description.clone());

        Box::new(ConsoleProgress { pb })
    }
}

struct ConsoleProgress {
    pb: ProgressBar,
}

impl ProgressIndicator for ConsoleProgress {
    fn advance(&mut self, delta: u64) {
        self.pb.inc(delta);
    }

    fn close(self: Box<Self>) {
        self.pb.finish();
    }
}

/// Progress callback for download operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted by [`CallbackProgressFactory`] indicators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        description: String,
        unit: String,
        total: Option<u64>,
    },
    Advanced {
        description: String,
        delta: u64,
        position: u64,
        total: Option<u64>,
    },
    Closed {
        description: String,
        position: u64,
    },
}

/// Forwards progress as [`ProgressEvent`]s to a callback
///
/// Useful for embedding the downloaders in a UI that draws its own progress,
/// or for recording what a transfer reported.
#[derive(Clone)]
pub struct CallbackProgressFactory {
    callback: ProgressCallback,
}

impl std::fmt::Debug for CallbackProgressFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackProgressFactory").finish_non_exhaustive()
    }
}

impl CallbackProgressFactory {
    pub fn new(callback: ProgressCallback) -> Self {
        Self { callback }
    }
}

impl ProgressFactory for CallbackProgressFactory {
    fn create(&self, spec: &ProgressSpec) -> Box<dyn ProgressIndicator> {
        (self.callback)(ProgressEvent::Started {
            description: spec.description.clone(),
            unit: spec.unit.clone(),
            total: spec.total,
        });

        Box::new(CallbackProgress {
            callback: self.callback.clone(),
            description: spec.description.clone(),
            total: spec.total,
            position: 0,
        })
    }
}

struct CallbackProgress {
    callback: ProgressCallback,
    description: String,
    total: Option<u64>,
    position: u64,
}

impl ProgressIndicator for CallbackProgress {
    fn advance(&mut self, delta: u64) {
        self.position += delta;
        (self.callback)(ProgressEvent::Advanced {
            description: self.description.clone(),
            delta,
            position: self.position,
            total: self.total,
        });
    }

    fn close(self: Box<Self>) {
        (self.callback)(ProgressEvent::Closed {
            description: self.description,
            position: self.position,
        });
    }
}
