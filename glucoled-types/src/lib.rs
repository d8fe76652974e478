//! # glucoled-types
//!
//! Core types shared by the glucoled daemon and its reading sources.
//!
//! This crate holds the pure, side-effect free parts of the system:
//!
//! - [`Reading`]: one glucose measurement as delivered by a reading source
//! - [`classify`]: maps a reading (or its absence) to a [`Classification`]
//! - [`brightness`]: the sine "breathing" curve used by the fading patterns
//!
//! ## Features
//!
//! - `serde`: serialization support for [`Reading`], [`TrendArrow`],
//!   [`Classification`] and [`Thresholds`]
//!
//! ## Example
//!
//! ```rust
//! use glucoled_types::{classify, Classification, Reading, Thresholds, TrendArrow};
//!
//! let now_ms = 1_700_000_000_000;
//! let reading = Reading::new(112.0, now_ms - 60_000).with_trend(TrendArrow::Flat);
//!
//! let band = classify(Some(&reading), now_ms, &Thresholds::default());
//! assert_eq!(band, Classification::InRange);
//!
//! // A missing reading is never fatal, it is just unavailable.
//! assert_eq!(classify(None, now_ms, &Thresholds::default()), Classification::Unavailable);
//! ```

mod brightness;
mod classify;
mod reading;

pub use brightness::*;
pub use classify::*;
pub use reading::*;
