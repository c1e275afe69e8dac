//! Reliability estimation from store signals.
//!
//! Three pure stages:
//! - `downloads`: rating counts -> genre-weighted install estimates, with
//!   Play install-tier clamping
//! - `growth`: review timestamps -> weekly log-count trend slope
//! - `reliability`: install total + slope -> final 1-10 score and grade
//!
//! Everything here is deterministic and never panics on degenerate input;
//! missing history propagates as `None`, not as zero.

pub mod downloads;
pub mod growth;
pub mod reliability;

pub use downloads::{estimate_downloads, PlatformSignals};
pub use growth::growth_slope;
pub use reliability::reliability_score;
