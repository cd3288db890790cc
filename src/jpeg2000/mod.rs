//! JPEG 2000 analysis (Part 1, ISO/IEC 15444-1)
//!
//! The encoder front end, from pixel planes to code-blocks:
//!
//! - `registry` / `config`: per tile-component parameters and their validation.
//! - `tiler` / `tile`: canvas tiling, the pixel source trait and per-tile state.
//! - `component_transform`: RCT and ICT decorrelation (Annex G).
//! - `dwt`: 1D lifting filters (5-3 and 9-7).
//! - `subband` / `forward_wt`: the subband tree, its code-block grid and the
//!   2D decomposition with its code-block enumerator.
//! - `roi`: region of interest masks.
//! - `analysis`: the pipeline tying the stages together.

pub mod analysis;
pub mod component_transform;
pub mod config;
pub mod dwt;
pub mod forward_wt;
pub mod image;
pub mod registry;
pub mod roi;
pub mod subband;
pub mod tile;
pub mod tiler;
