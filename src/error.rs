use thiserror::Error;

use crate::jpeg2000::component_transform::TransformMode;
use crate::jpeg2000::dwt::WaveletFilter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No default value set for {0}")]
    MissingDefault(&'static str),
    #[error("{parameter} cannot be specified per {scope}")]
    InvalidScope {
        parameter: &'static str,
        scope: &'static str,
    },
    #[error("Tile index {0} out of range ({1} tiles)")]
    TileOutOfRange(usize, usize),
    #[error("Component index {0} out of range ({1} components)")]
    ComponentOutOfRange(usize, usize),
    #[error("Bad tile/component index set '{0}'")]
    InvalidIndexSet(String),
    #[error("Invalid value '{value}' for {parameter}")]
    InvalidValue {
        parameter: &'static str,
        value: String,
    },
    #[error("Invalid code-block size {0}x{1}: dimensions must be powers of two in [4, 1024] with area <= 4096")]
    InvalidCodeBlockSize(u32, u32),
    #[error("Invalid precinct size {width}x{height} for resolution level {resolution}")]
    InvalidPrecinctSize {
        width: u32,
        height: u32,
        resolution: usize,
    },
    #[error("Invalid number of decomposition levels {0}, must be in [0, 32]")]
    InvalidDecompositionLevels(u32),
    #[error("Invalid code-block partition origin ({0}, {1}), each coordinate must be 0 or 1")]
    InvalidPartitionOrigin(u32, u32),
    #[error("Code-block partition origin ({0}, {1}) lies after subband origin ({2}, {3})")]
    PartitionOriginAfterSubband(u32, u32, u32, u32),
    #[error("Tile {tile}: component transform needs at least 3 components, image has {found}")]
    NotEnoughComponents { tile: usize, found: usize },
    #[error("Tile {tile}: cannot use {mode} with components of different dimensions")]
    ComponentDimensionMismatch { tile: usize, mode: TransformMode },
    #[error("Tile {tile}: the first three components do not use the same wavelet filter")]
    FilterMismatch { tile: usize },
    #[error("Cannot use {mode} with {filter} filter in tile {tile}")]
    IncompatibleTransform {
        tile: usize,
        mode: TransformMode,
        filter: WaveletFilter,
    },
    #[error("Lossless coding needs the w5x3 filter, tile {tile} component {component} uses {filter}")]
    LosslessNeedsReversibleFilter {
        tile: usize,
        component: usize,
        filter: WaveletFilter,
    },
    #[error("Configuration is for {expected} {parameter}, image has {found}")]
    ConfigMismatch {
        parameter: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Component {component} has bit depth {depth}, must be in [1, 38]")]
    InvalidBitDepth { component: usize, depth: u32 },
    #[error("Component {component} has {bits} fractional bits, at most 38 are supported")]
    InvalidFixedPoint { component: usize, bits: u32 },
    #[error("Invalid tiling: {0}")]
    InvalidTiling(&'static str),
    #[error("ROI mask for component {component} is {mask_width}x{mask_height}, component plane is {width}x{height}")]
    RoiMaskSizeMismatch {
        component: usize,
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
    #[error("Window {w}x{h} at ({x}, {y}) exceeds the tile-component")]
    WindowOutOfBounds { x: u32, y: u32, w: u32, h: u32 },
    #[error("Sample buffer has {found} samples, expected {expected}")]
    DataLengthMismatch { expected: usize, found: usize },
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
