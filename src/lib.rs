//! # glucoled
//!
//! Drives a single indicator light from the latest continuous glucose
//! monitor reading.
//!
//! The daemon polls a reading source, classifies the newest reading into a
//! risk band and shows that band as a light pattern:
//!
//! | Band          | Pattern                                        |
//! |---------------|------------------------------------------------|
//! | critical low  | fast on/off blink, 51 ms each way              |
//! | in range      | slow sine "breathing" fade                     |
//! | critical high | fast sine "breathing" fade                     |
//! | unavailable   | three quick blinks, then a two second pause    |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │ReadingSource │──▶│ classify │──▶│ PatternRunner │──▶│ SignalOutput │
//! └──────────────┘   └──────────┘   └───────────────┘   └──────────────┘
//!         ▲                                 ▲
//!         └────────── MonitorLoop ──────────┘
//! ```
//!
//! - **[`source`]**: the [`ReadingSource`] trait with LibreLinkUp, channel
//!   and scripted implementations
//! - **[`pattern`]**: [`PatternRunner`], which owns the one task allowed to
//!   write to the light
//! - **[`output`]**: the [`SignalOutput`] trait with GPIO, logging and
//!   recording implementations
//! - **[`monitor`]**: [`MonitorLoop`], the fetch/classify/sleep cycle and
//!   shutdown sequence
//!
//! Classification and the brightness curve live in `glucoled-types`; the
//! LibreLinkUp HTTP client lives in `glucoled-librelink`.
//!
//! ## Usage
//!
//! ```bash
//! GLUCOLED_EMAIL=follower@example.com GLUCOLED_PASSWORD=secret glucoled
//!
//! # Without GPIO hardware
//! glucoled --dry-run --log-level debug
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use glucoled::{MonitorLoop, PatternKind, RecordingOutput, ScriptedSource, SystemClock, Clock};
//! use glucoled_types::Reading;
//!
//! # tokio_test::block_on(async {
//! let now = SystemClock.now_ms();
//! let source = ScriptedSource::repeating(Ok(Reading::new(110.0, now)));
//! let output = Arc::new(RecordingOutput::new());
//!
//! let mut monitor = MonitorLoop::new(source, output.clone());
//! let outcome = monitor.step().await;
//! assert_eq!(outcome.pattern, PatternKind::InRange);
//! assert_eq!(outcome.delay, Duration::from_secs(300));
//!
//! monitor.shutdown().await;
//! assert!(output.is_released());
//! # });
//! ```

pub mod config;
pub mod logging;
pub mod monitor;
pub mod output;
pub mod pattern;
pub mod source;

// Re-export main types for convenience
pub use crate::config::{OutputKind, Settings, SettingsError};
pub use monitor::{
    Clock, CycleOutcome, ManualClock, MonitorLoop, MonitorState, MonitorTiming, SystemClock,
};
#[cfg(feature = "gpio")]
pub use output::GpioOutput;
pub use output::{LogOutput, OutputError, RecordedWrite, RecordingOutput, SignalOutput};
pub use pattern::{PatternKind, PatternRunner, PatternTiming, StartOutcome};
pub use source::{ChannelSource, LibreLinkSource, ReadingSource, ScriptedSource};

pub use glucoled_librelink::{FetchError, RetryClass};
pub use glucoled_types::{Classification, Reading, Thresholds, TrendArrow};
