//! Encoder-side analysis core of a JPEG 2000 Part 1 codec.
//!
//! Turns tile-component pixel planes into decorrelated components, a wavelet
//! subband tree partitioned into code-blocks, and ROI masks aligned with that
//! tree. Entropy coding, rate allocation and codestream writing consume the
//! results and are not part of this crate.

pub mod constants;
pub mod error;
pub mod jpeg2000;

pub use error::{AnalysisError, Result};
pub use jpeg2000::analysis::ForwardAnalysis;
pub use jpeg2000::config::{EncoderConfig, EncoderOptions};
