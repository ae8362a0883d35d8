//! Averaging of snips into an average TAD.
//!
//! - [`zoom`] resamples snips of any size onto a common square grid
//! - [`reduce`] stacks the rescaled snips and reduces them cell by cell
//! - [`evaluate`] combines two average matrices with a small arithmetic language

pub mod errors;
pub mod evaluate;
pub mod reduce;
pub mod zoom;

// re-exports
pub use errors::{RescaleError, Result};
pub use evaluate::Expression;
pub use reduce::{Reducer, average, reduce};
pub use zoom::{MAX_ORDER, RescaleParams, rescale};
