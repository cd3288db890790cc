//! Limits and defaults from ISO/IEC 15444-1 used across the analysis core.

/// Largest number of wavelet decomposition levels a tile-component may use.
pub const MAX_DECOMPOSITION_LEVELS: u32 = 32;

/// Decomposition levels used when nothing else is configured.
pub const DEFAULT_DECOMPOSITION_LEVELS: u32 = 5;

/// Largest component bit depth the SIZ marker can signal.
pub const MAX_BIT_DEPTH: u32 = 38;

/// Smallest code-block dimension (exponent 2).
pub const MIN_CODE_BLOCK_DIM: u32 = 4;

/// Largest code-block dimension (exponent 10).
pub const MAX_CODE_BLOCK_DIM: u32 = 1024;

/// Largest code-block area in samples.
pub const MAX_CODE_BLOCK_AREA: u32 = 4096;

/// Nominal code-block dimension used when nothing else is configured.
pub const DEFAULT_CODE_BLOCK_DIM: u32 = 64;

/// Largest precinct exponent that fits the COD/COC marker nibble.
pub const MAX_PRECINCT_EXPONENT: u32 = 15;

/// Precinct exponent meaning "no precinct partition".
pub const DEFAULT_PRECINCT_EXPONENT: u32 = MAX_PRECINCT_EXPONENT;
