//! Encoder parameters of the analysis stage.
//!
//! [`EncoderOptions`] carries the raw option strings (as a command line or an
//! embedding application would supply them). [`EncoderConfig`] is the parsed,
//! validated form: one [`TileCompValue`] per parameter plus the per-tile
//! component transform modes derived from the filters.

use std::str::FromStr;

use tracing::debug;

use super::component_transform::{TransformMode, TransformRequest, select_transform_modes};
use super::dwt::WaveletFilter;
use super::registry::{TileCompValue, ValueScope};
use super::roi::Roi;
use crate::constants::{
    DEFAULT_CODE_BLOCK_DIM, DEFAULT_DECOMPOSITION_LEVELS, DEFAULT_PRECINCT_EXPONENT,
    MAX_CODE_BLOCK_AREA, MAX_CODE_BLOCK_DIM, MAX_DECOMPOSITION_LEVELS, MAX_PRECINCT_EXPONENT,
    MIN_CODE_BLOCK_DIM,
};
use crate::error::{AnalysisError, Result};

/// Nominal code-block dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockSize {
    width: u32,
    height: u32,
}

impl CodeBlockSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let valid_dim = |d: u32| d.is_power_of_two() && (MIN_CODE_BLOCK_DIM..=MAX_CODE_BLOCK_DIM).contains(&d);
        if !valid_dim(width) || !valid_dim(height) || width * height > MAX_CODE_BLOCK_AREA {
            return Err(AnalysisError::InvalidCodeBlockSize(width, height));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width_exp(&self) -> u32 {
        self.width.trailing_zeros()
    }

    pub fn height_exp(&self) -> u32 {
        self.height.trailing_zeros()
    }
}

impl Default for CodeBlockSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_CODE_BLOCK_DIM,
            height: DEFAULT_CODE_BLOCK_DIM,
        }
    }
}

impl FromStr for CodeBlockSize {
    type Err = AnalysisError;

    /// Parses `WxH`, or a single number for square blocks.
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = parse_dims(s, "code-block size")?;
        Self::new(w, h)
    }
}

/// Precinct sizes per resolution level, as exponents of two.
///
/// Entries are listed from the highest resolution level down; the last entry
/// also applies to every lower level. An empty list means no precinct
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrecinctSizes {
    exponents: Vec<(u32, u32)>,
}

impl PrecinctSizes {
    pub fn unpartitioned() -> Self {
        Self::default()
    }

    /// Builds the list from sizes in samples, highest resolution first.
    pub fn from_sizes(sizes: &[(u32, u32)]) -> Result<Self> {
        let mut exponents = Vec::with_capacity(sizes.len());
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let bad = AnalysisError::InvalidPrecinctSize {
                width: w,
                height: h,
                resolution: i,
            };
            if !w.is_power_of_two() || !h.is_power_of_two() {
                return Err(bad);
            }
            let (ew, eh) = (w.trailing_zeros(), h.trailing_zeros());
            if ew > MAX_PRECINCT_EXPONENT || eh > MAX_PRECINCT_EXPONENT {
                return Err(bad);
            }
            exponents.push((ew, eh));
        }
        Ok(Self { exponents })
    }

    pub fn is_partitioned(&self) -> bool {
        !self.exponents.is_empty()
    }

    /// Precinct exponents at resolution level `resolution` of a tile-component
    /// whose highest resolution level is `max_resolution`.
    pub fn exponents(&self, resolution: u32, max_resolution: u32) -> (u32, u32) {
        let idx = max_resolution.saturating_sub(resolution) as usize;
        self.exponents
            .get(idx)
            .or(self.exponents.last())
            .copied()
            .unwrap_or((DEFAULT_PRECINCT_EXPONENT, DEFAULT_PRECINCT_EXPONENT))
    }

    /// Checks that no resolution level above 0 uses a one-sample precinct,
    /// which cannot be halved for its subbands.
    pub fn check_levels(&self, max_resolution: u32) -> Result<()> {
        for res in 1..=max_resolution {
            let (ew, eh) = self.exponents(res, max_resolution);
            if ew == 0 || eh == 0 {
                return Err(AnalysisError::InvalidPrecinctSize {
                    width: 1 << ew,
                    height: 1 << eh,
                    resolution: res as usize,
                });
            }
        }
        Ok(())
    }
}

impl FromStr for PrecinctSizes {
    type Err = AnalysisError;

    /// Parses `WxH[,WxH...]`, highest resolution level first.
    fn from_str(s: &str) -> Result<Self> {
        let sizes = s
            .split(',')
            .map(|part| parse_dims(part, "precinct size"))
            .collect::<Result<Vec<_>>>()?;
        Self::from_sizes(&sizes)
    }
}

/// Code-block partition origin on the reference grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionOrigin {
    x: u32,
    y: u32,
}

impl PartitionOrigin {
    pub fn new(x: u32, y: u32) -> Result<Self> {
        if x > 1 || y > 1 {
            return Err(AnalysisError::InvalidPartitionOrigin(x, y));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }
}

pub fn check_decomposition_levels(levels: u32) -> Result<u32> {
    if levels > MAX_DECOMPOSITION_LEVELS {
        return Err(AnalysisError::InvalidDecompositionLevels(levels));
    }
    Ok(levels)
}

fn parse_dims(s: &str, parameter: &'static str) -> Result<(u32, u32)> {
    let bad = || AnalysisError::InvalidValue {
        parameter,
        value: s.to_string(),
    };
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|_| bad());
    match s.split_once(['x', 'X']) {
        Some((w, h)) => Ok((parse(w)?, parse(h)?)),
        None => {
            let d = parse(s)?;
            Ok((d, d))
        }
    }
}

fn per_tile_component<T>(name: &'static str, num_tiles: usize, num_components: usize) -> TileCompValue<T> {
    TileCompValue::new(name, ValueScope::TileComponent, num_tiles, num_components)
}

fn parse_token<T: FromStr<Err = AnalysisError>>(token: &str) -> Result<T> {
    token.parse()
}

/// Option strings for every analysis parameter.
///
/// Each string uses the `[t<idx>] [c<idx>] value ...` syntax of
/// [`TileCompValue::parse_option`]. `None` keeps the built-in default.
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    /// Reversible (lossless) coding: forces the w5x3 filter default and RCT.
    pub lossless: bool,
    /// Decomposition levels, e.g. `"5 t1 3"`.
    pub levels: Option<String>,
    /// Code-block size, e.g. `"64x64 c0 32x32"`.
    pub code_block_size: Option<String>,
    /// Wavelet filter, `w5x3` or `w9x7`.
    pub filters: Option<String>,
    /// Component transform, `on`/`off` (or `rct`/`ict`) per tile.
    pub component_transform: Option<String>,
    /// Precinct sizes, e.g. `"128x128,64x64"`.
    pub precincts: Option<String>,
    /// Code-block partition origin, each coordinate 0 or 1.
    pub partition_origin: Option<(u32, u32)>,
    pub rois: Vec<Roi>,
}

/// Validated analysis parameters of an image.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    num_tiles: usize,
    num_components: usize,
    lossless: bool,
    levels: TileCompValue<u32>,
    code_block_size: TileCompValue<CodeBlockSize>,
    filters: TileCompValue<WaveletFilter>,
    precincts: TileCompValue<PrecinctSizes>,
    transform: TileCompValue<TransformMode>,
    partition_origin: PartitionOrigin,
    rois: Vec<Roi>,
}

impl EncoderConfig {
    pub fn builder(num_tiles: usize, num_components: usize) -> EncoderConfigBuilder {
        EncoderConfigBuilder::new(num_tiles, num_components)
    }

    /// Parses and validates option strings for an image with the given tile
    /// and component counts.
    pub fn from_options(options: &EncoderOptions, num_tiles: usize, num_components: usize) -> Result<Self> {
        let mut builder = EncoderConfigBuilder::new(num_tiles, num_components);
        builder.lossless(options.lossless);

        if let Some(text) = &options.levels {
            builder
                .levels()
                .parse_option(text, |t| {
                    let levels = t.parse::<u32>().map_err(|_| AnalysisError::InvalidValue {
                        parameter: "decomposition levels",
                        value: t.to_string(),
                    })?;
                    check_decomposition_levels(levels)
                })?;
        }
        if let Some(text) = &options.code_block_size {
            builder.code_block_size().parse_option(text, parse_token)?;
        }
        if let Some(text) = &options.filters {
            builder.filters().parse_option(text, parse_token)?;
        }
        if let Some(text) = &options.component_transform {
            builder.component_transform().parse_option(text, parse_token)?;
        }
        if let Some(text) = &options.precincts {
            builder.precincts().parse_option(text, parse_token)?;
        }
        if let Some((x, y)) = options.partition_origin {
            builder.partition_origin(PartitionOrigin::new(x, y)?);
        }
        for roi in &options.rois {
            builder.roi(roi.clone());
        }
        builder.build()
    }

    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn is_lossless(&self) -> bool {
        self.lossless
    }

    pub fn decomposition_levels(&self, tile: usize, component: usize) -> Result<u32> {
        self.levels.resolve(tile, component).copied()
    }

    pub fn code_block_size(&self, tile: usize, component: usize) -> Result<CodeBlockSize> {
        self.code_block_size.resolve(tile, component).copied()
    }

    pub fn filter(&self, tile: usize, component: usize) -> Result<WaveletFilter> {
        self.filters.resolve(tile, component).copied()
    }

    pub fn precincts(&self, tile: usize, component: usize) -> Result<&PrecinctSizes> {
        self.precincts.resolve(tile, component)
    }

    pub fn transform_mode(&self, tile: usize) -> Result<TransformMode> {
        self.transform.resolve_tile(tile).copied()
    }

    pub fn partition_origin(&self) -> PartitionOrigin {
        self.partition_origin
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    /// Registry of the per-tile component transform modes.
    pub fn transform_modes(&self) -> &TileCompValue<TransformMode> {
        &self.transform
    }

    pub fn levels_registry(&self) -> &TileCompValue<u32> {
        &self.levels
    }

    pub fn code_block_registry(&self) -> &TileCompValue<CodeBlockSize> {
        &self.code_block_size
    }

    pub fn filter_registry(&self) -> &TileCompValue<WaveletFilter> {
        &self.filters
    }

    pub fn precinct_registry(&self) -> &TileCompValue<PrecinctSizes> {
        &self.precincts
    }
}

/// Collects parameters for an [`EncoderConfig`].
///
/// Registries are exposed mutably so values can be set at any precedence
/// level; `build` fills in defaults and checks the combination.
#[derive(Debug, Clone)]
pub struct EncoderConfigBuilder {
    num_tiles: usize,
    num_components: usize,
    lossless: bool,
    levels: TileCompValue<u32>,
    code_block_size: TileCompValue<CodeBlockSize>,
    filters: TileCompValue<WaveletFilter>,
    precincts: TileCompValue<PrecinctSizes>,
    transform: TileCompValue<TransformRequest>,
    partition_origin: PartitionOrigin,
    rois: Vec<Roi>,
}

impl EncoderConfigBuilder {
    fn new(num_tiles: usize, num_components: usize) -> Self {
        Self {
            num_tiles,
            num_components,
            lossless: false,
            levels: per_tile_component("decomposition levels", num_tiles, num_components),
            code_block_size: per_tile_component("code-block size", num_tiles, num_components),
            filters: per_tile_component("wavelet filter", num_tiles, num_components),
            precincts: per_tile_component("precinct size", num_tiles, num_components),
            transform: TileCompValue::new("component transform", ValueScope::Tile, num_tiles, num_components),
            partition_origin: PartitionOrigin::default(),
            rois: Vec::new(),
        }
    }

    pub fn lossless(&mut self, lossless: bool) -> &mut Self {
        self.lossless = lossless;
        self
    }

    pub fn partition_origin(&mut self, origin: PartitionOrigin) -> &mut Self {
        self.partition_origin = origin;
        self
    }

    pub fn roi(&mut self, roi: Roi) -> &mut Self {
        self.rois.push(roi);
        self
    }

    pub fn levels(&mut self) -> &mut TileCompValue<u32> {
        &mut self.levels
    }

    pub fn code_block_size(&mut self) -> &mut TileCompValue<CodeBlockSize> {
        &mut self.code_block_size
    }

    pub fn filters(&mut self) -> &mut TileCompValue<WaveletFilter> {
        &mut self.filters
    }

    pub fn precincts(&mut self) -> &mut TileCompValue<PrecinctSizes> {
        &mut self.precincts
    }

    pub fn component_transform(&mut self) -> &mut TileCompValue<TransformRequest> {
        &mut self.transform
    }

    pub fn build(&self) -> Result<EncoderConfig> {
        if self.num_tiles == 0 || self.num_components == 0 {
            return Err(AnalysisError::InvalidTiling("image needs at least one tile and one component"));
        }

        let mut levels = self.levels.clone();
        if levels.default_value().is_none() {
            levels.set_default(DEFAULT_DECOMPOSITION_LEVELS);
        }
        let mut code_block_size = self.code_block_size.clone();
        if code_block_size.default_value().is_none() {
            code_block_size.set_default(CodeBlockSize::default());
        }
        let mut filters = self.filters.clone();
        if filters.default_value().is_none() {
            filters.set_default(if self.lossless {
                WaveletFilter::W5x3
            } else {
                WaveletFilter::W9x7
            });
        }
        let mut precincts = self.precincts.clone();
        if precincts.default_value().is_none() {
            precincts.set_default(PrecinctSizes::unpartitioned());
        }

        for t in 0..self.num_tiles {
            for c in 0..self.num_components {
                let l = check_decomposition_levels(*levels.resolve(t, c)?)?;
                precincts.resolve(t, c)?.check_levels(l)?;
                let filter = *filters.resolve(t, c)?;
                if self.lossless && !filter.is_reversible() {
                    return Err(AnalysisError::LosslessNeedsReversibleFilter {
                        tile: t,
                        component: c,
                        filter,
                    });
                }
            }
        }

        let transform = select_transform_modes(&self.transform, &filters, self.lossless)?;
        debug!(
            tiles = self.num_tiles,
            components = self.num_components,
            lossless = self.lossless,
            "encoder configuration validated"
        );

        Ok(EncoderConfig {
            num_tiles: self.num_tiles,
            num_components: self.num_components,
            lossless: self.lossless,
            levels,
            code_block_size,
            filters,
            precincts,
            transform,
            partition_origin: self.partition_origin,
            rois: self.rois.clone(),
        })
    }
}
