//! Multiple component transform (ISO/IEC 15444-1 Annex G).
//!
//! The first three components of a tile are decorrelated with either the
//! reversible integer transform (RCT) or the irreversible YCbCr transform
//! (ICT) before wavelet analysis. Any further components pass through.

use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::{debug, trace, warn};

use super::dwt::WaveletFilter;
use super::image::{DataBlk, Rect, Samples};
use super::registry::{TileCompValue, ValueScope};
use super::tile::TileContext;
use super::tiler::{ImageSource, TileGeometry, check_bit_depth, check_fixed_point};
use crate::error::{AnalysisError, Result};

/// Component transform applied to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TransformMode {
    #[default]
    None = 0,
    /// Reversible component transform (integer).
    Rct = 1,
    /// Irreversible component transform (floating point).
    Ict = 2,
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformMode::None => f.write_str("none"),
            TransformMode::Rct => f.write_str("RCT"),
            TransformMode::Ict => f.write_str("ICT"),
        }
    }
}

impl FromStr for TransformMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(TransformMode::None),
            "rct" => Ok(TransformMode::Rct),
            "ict" => Ok(TransformMode::Ict),
            _ => Err(AnalysisError::InvalidValue {
                parameter: "component transform",
                value: s.to_string(),
            }),
        }
    }
}

/// What the user asked for; resolved into a [`TransformMode`] per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformRequest {
    Off,
    /// Use the transform matching the tile's wavelet filter.
    On,
    Rct,
    Ict,
}

impl FromStr for TransformRequest {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(TransformRequest::Off),
            "on" => Ok(TransformRequest::On),
            "rct" => Ok(TransformRequest::Rct),
            "ict" => Ok(TransformRequest::Ict),
            _ => Err(AnalysisError::InvalidValue {
                parameter: "component transform",
                value: s.to_string(),
            }),
        }
    }
}

/// Derives the component transform of every tile.
///
/// Without a request the transform follows the filters of the first three
/// components (w5x3 gives RCT, w9x7 gives ICT, mixed families give none);
/// the lossless flag selects RCT. A request of `on` follows the filters too
/// but fails on mixed families, and an explicit `rct` or `ict` must match them.
pub fn select_transform_modes(
    requested: &TileCompValue<TransformRequest>,
    filters: &TileCompValue<WaveletFilter>,
    lossless: bool,
) -> Result<TileCompValue<TransformMode>> {
    let num_tiles = filters.num_tiles();
    let num_components = filters.num_components();
    let mut modes = TileCompValue::new("component transform", ValueScope::Tile, num_tiles, num_components);
    modes.set_default(TransformMode::None);

    for t in 0..num_tiles {
        let request = match requested.resolve_tile(t) {
            Ok(r) => Some(*r),
            Err(AnalysisError::MissingDefault(_)) => None,
            Err(e) => return Err(e),
        };

        let mode = match request {
            Some(TransformRequest::Off) => TransformMode::None,
            None if num_components < 3 => TransformMode::None,
            None if lossless => TransformMode::Rct,
            None => match common_filter(filters, t)? {
                Some(filter) => mode_for(filter),
                None => {
                    warn!(tile = t, "first three components use different filters, no component transform");
                    TransformMode::None
                }
            },
            Some(request) => {
                if num_components < 3 {
                    return Err(AnalysisError::NotEnoughComponents {
                        tile: t,
                        found: num_components,
                    });
                }
                let filter = common_filter(filters, t)?.ok_or(AnalysisError::FilterMismatch { tile: t })?;
                let wanted = match request {
                    TransformRequest::Rct => TransformMode::Rct,
                    TransformRequest::Ict => TransformMode::Ict,
                    _ => mode_for(filter),
                };
                if wanted != mode_for(filter) {
                    return Err(AnalysisError::IncompatibleTransform {
                        tile: t,
                        mode: wanted,
                        filter,
                    });
                }
                wanted
            }
        };
        modes.set_tile_default(t, mode)?;
    }
    Ok(modes)
}

fn mode_for(filter: WaveletFilter) -> TransformMode {
    match filter {
        WaveletFilter::W5x3 => TransformMode::Rct,
        WaveletFilter::W9x7 => TransformMode::Ict,
    }
}

/// Filter shared by the first three components of a tile, `None` if they differ.
fn common_filter(filters: &TileCompValue<WaveletFilter>, tile: usize) -> Result<Option<WaveletFilter>> {
    let first = *filters.resolve(tile, 0)?;
    for c in 1..3 {
        if *filters.resolve(tile, c)? != first {
            return Ok(None);
        }
    }
    Ok(Some(first))
}

fn floor_log2(x: u64) -> u32 {
    63 - x.max(1).leading_zeros()
}

/// Bit depths of the three RCT outputs for input depths `d`, each at most
/// [`MAX_BIT_DEPTH`](crate::constants::MAX_BIT_DEPTH).
pub fn rct_depths(d: [u32; 3]) -> [u32; 3] {
    let p = |b: u32| 1u64 << b;
    [
        floor_log2(p(d[0]) + 2 * p(d[1]) + p(d[2]) - 1) - 1,
        floor_log2(p(d[2]) + p(d[1]) - 1) + 1,
        floor_log2(p(d[0]) + p(d[1]) - 1) + 1,
    ]
}

/// Bit depths of the three ICT outputs for input depths `d`.
pub fn ict_depths(d: [u32; 3]) -> [u32; 3] {
    let p = |b: u32| (1u64 << b) as f64;
    let depth = |w: [f64; 3]| {
        let range = (p(d[0]) * w[0] + p(d[1]) * w[1] + p(d[2]) * w[2]).floor() as u64;
        floor_log2(range.saturating_sub(1)) + 1
    };
    [
        depth([0.299072, 0.586914, 0.114014]),
        depth([0.168701, 0.331299, 0.5]),
        depth([0.5, 0.418701, 0.081299]),
    ]
}

/// Output bit depths of every component under `mode`.
pub fn transformed_depths(mode: TransformMode, input: &[u32]) -> Vec<u32> {
    let mut out = input.to_vec();
    if input.len() >= 3 {
        let first = [input[0], input[1], input[2]];
        let mixed = match mode {
            TransformMode::None => first,
            TransformMode::Rct => rct_depths(first),
            TransformMode::Ict => ict_depths(first),
        };
        out[..3].copy_from_slice(&mixed);
    }
    out
}

pub fn forward_rct(r: &[i32], g: &[i32], b: &[i32], component: usize, out: &mut [i32]) {
    let samples = r.iter().zip(g).zip(b).zip(out.iter_mut());
    match component {
        0 => samples.for_each(|(((&r, &g), &b), o)| *o = (r + 2 * g + b) >> 2),
        1 => samples.for_each(|(((_, &g), &b), o)| *o = b - g),
        _ => samples.for_each(|(((&r, &g), _), o)| *o = r - g),
    }
}

/// Inverse RCT of one sample.
pub fn inverse_rct(y: i32, u: i32, v: i32) -> (i32, i32, i32) {
    let g = y - ((u + v) >> 2);
    (v + g, g, u + g)
}

pub fn forward_ict(r: &[f32], g: &[f32], b: &[f32], component: usize, out: &mut [f32]) {
    let samples = r.iter().zip(g).zip(b).zip(out.iter_mut());
    match component {
        0 => samples.for_each(|(((&r, &g), &b), o)| *o = 0.299 * r + 0.587 * g + 0.114 * b),
        1 => samples.for_each(|(((&r, &g), &b), o)| *o = -0.16875 * r - 0.33126 * g + 0.5 * b),
        _ => samples.for_each(|(((&r, &g), &b), o)| *o = 0.5 * r - 0.41869 * g - 0.08131 * b),
    }
}

/// Inverse ICT of one sample.
pub fn inverse_ict(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    (
        y + 1.402 * cr,
        y - 0.34413 * cb - 0.71414 * cr,
        y + 1.772 * cb,
    )
}

/// Pixel source adapter applying the tile's component transform.
#[derive(Debug, Clone)]
pub struct ComponentTransform<S> {
    source: S,
    modes: TileCompValue<TransformMode>,
}

impl<S: ImageSource> ComponentTransform<S> {
    pub fn new(source: S, modes: TileCompValue<TransformMode>) -> Self {
        Self { source, modes }
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Selects the transform of `ctx`'s tile and checks the tile can use it.
    pub fn prepare_tile(&self, ctx: &mut TileContext) -> Result<()> {
        let tile = ctx.index();
        let mode = *self.modes.resolve_tile(tile)?;
        if mode != TransformMode::None {
            check_components(ctx.geometry(), mode)?;
        }
        let input = (0..ctx.num_components())
            .map(|c| {
                let depth = self.source.nominal_range_bits(ctx, c);
                check_bit_depth(c, depth)?;
                check_fixed_point(c, self.source.fixed_point(ctx, c))?;
                Ok(depth)
            })
            .collect::<Result<Vec<u32>>>()?;
        let depths = transformed_depths(mode, &input);
        debug!(tile, %mode, ?input, ?depths, "component transform selected");
        ctx.set_transform(mode, depths);
        Ok(())
    }

    fn read_three(&mut self, ctx: &TileContext, window: Rect) -> Result<[Samples; 3]> {
        Ok([
            self.source.read_window(ctx, 0, window)?.data,
            self.source.read_window(ctx, 1, window)?.data,
            self.source.read_window(ctx, 2, window)?.data,
        ])
    }
}

fn check_components(geometry: &TileGeometry, mode: TransformMode) -> Result<()> {
    let tile = geometry.index;
    if geometry.components.len() < 3 {
        return Err(AnalysisError::NotEnoughComponents {
            tile,
            found: geometry.components.len(),
        });
    }
    let c0 = geometry.components[0];
    let same = geometry.components[1..3]
        .iter()
        .all(|r| r.width == c0.width && r.height == c0.height);
    if !same {
        return Err(AnalysisError::ComponentDimensionMismatch { tile, mode });
    }
    Ok(())
}

impl<S: ImageSource> ImageSource for ComponentTransform<S> {
    fn num_components(&self) -> usize {
        self.source.num_components()
    }

    fn num_tiles(&self) -> usize {
        self.source.num_tiles()
    }

    fn nominal_range_bits(&self, ctx: &TileContext, c: usize) -> u32 {
        ctx.transformed_depth(c)
            .unwrap_or_else(|| self.source.nominal_range_bits(ctx, c))
    }

    /// ICT outputs are real-valued and carry no fractional bits.
    fn fixed_point(&self, ctx: &TileContext, c: usize) -> u32 {
        if c < 3 && ctx.transform() == TransformMode::Ict {
            return 0;
        }
        self.source.fixed_point(ctx, c)
    }

    fn component_rect(&self, c: usize) -> Result<Rect> {
        self.source.component_rect(c)
    }

    fn tile_geometry(&self, tile: usize) -> Result<TileGeometry> {
        self.source.tile_geometry(tile)
    }

    fn read_window(&mut self, ctx: &TileContext, c: usize, window: Rect) -> Result<DataBlk> {
        let mode = ctx.transform();
        if c >= 3 || mode == TransformMode::None {
            return self.source.read_window(ctx, c, window);
        }
        trace!(tile = ctx.index(), c, ?window, %mode, "transforming window");

        let [r, g, b] = self.read_three(ctx, window)?;
        let data = match mode {
            TransformMode::Rct => {
                let (r, g, b) = (r.into_int(), g.into_int(), b.into_int());
                let mut out = vec![0; window.area()];
                forward_rct(&r, &g, &b, c, &mut out);
                Samples::Int(out)
            }
            _ => {
                let fp = |c| self.source.fixed_point(ctx, c);
                let (r, g, b) = (r.into_real(fp(0)), g.into_real(fp(1)), b.into_real(fp(2)));
                let mut out = vec![0.0; window.area()];
                forward_ict(&r, &g, &b, c, &mut out);
                Samples::Float(out)
            }
        };
        DataBlk::new(window, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::image::ComponentInfo;
    use crate::jpeg2000::tiler::{RasterImage, Tiler};
    use proptest::prelude::*;

    fn filters(values: &[WaveletFilter]) -> TileCompValue<WaveletFilter> {
        let mut f = TileCompValue::new("wavelet filter", ValueScope::TileComponent, 1, values.len());
        f.set_default(values[0]);
        for (c, v) in values.iter().enumerate() {
            f.set_component_default(c, *v).unwrap();
        }
        f
    }

    fn request(r: Option<TransformRequest>, comps: usize) -> TileCompValue<TransformRequest> {
        let mut v = TileCompValue::new("component transform", ValueScope::Tile, 1, comps);
        if let Some(r) = r {
            v.set_default(r);
        }
        v
    }

    use WaveletFilter::{W5x3, W9x7};

    #[test]
    fn test_rct_depths() {
        assert_eq!(rct_depths([8, 8, 8]), [8, 9, 9]);
        assert_eq!(rct_depths([16, 8, 4]), [15, 9, 17]);
        assert_eq!(transformed_depths(TransformMode::Rct, &[8, 8, 8, 12]), vec![8, 9, 9, 12]);
        assert_eq!(transformed_depths(TransformMode::None, &[8, 8, 8]), vec![8, 8, 8]);
    }

    #[test]
    fn test_ict_depths() {
        assert_eq!(ict_depths([8, 8, 8]), [8, 8, 8]);
        assert_eq!(ict_depths([16, 8, 4]), [15, 14, 16]);
    }

    #[test]
    fn test_rct_samples() {
        let (r, g, b) = ([100, -5], [20, 7], [-50, 3]);
        let mut out = [0; 2];
        forward_rct(&r, &g, &b, 0, &mut out);
        // (100 + 40 - 50) >> 2 = 22 ; (-5 + 14 + 3) >> 2 = 3
        assert_eq!(out, [22, 3]);
        forward_rct(&r, &g, &b, 1, &mut out);
        assert_eq!(out, [-70, -4]);
        forward_rct(&r, &g, &b, 2, &mut out);
        assert_eq!(out, [80, -12]);
        // Arithmetic shift floors toward negative infinity.
        forward_rct(&[-1], &[-1], &[-3], 0, &mut out[..1]);
        assert_eq!(out[0], -2);
    }

    #[test]
    fn test_ict_round_trip() {
        let (r, g, b) = ([120.0f32], [-30.0f32], [64.0f32]);
        let mut y = [0.0];
        let mut cb = [0.0];
        let mut cr = [0.0];
        forward_ict(&r, &g, &b, 0, &mut y);
        forward_ict(&r, &g, &b, 1, &mut cb);
        forward_ict(&r, &g, &b, 2, &mut cr);
        let (r2, g2, b2) = inverse_ict(y[0], cb[0], cr[0]);
        assert!((r2 - 120.0).abs() < 0.05);
        assert!((g2 + 30.0).abs() < 0.05);
        assert!((b2 - 64.0).abs() < 0.05);
    }

    #[test]
    fn test_selection_follows_filters() {
        let m = select_transform_modes(&request(None, 3), &filters(&[W5x3, W5x3, W5x3]), false).unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::Rct);
        let m = select_transform_modes(&request(None, 3), &filters(&[W9x7, W9x7, W9x7]), false).unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::Ict);
        let m = select_transform_modes(&request(None, 3), &filters(&[W9x7, W5x3, W9x7]), false).unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::None);
        let m = select_transform_modes(&request(None, 2), &filters(&[W5x3, W5x3]), true).unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::None);
        let m = select_transform_modes(&request(None, 3), &filters(&[W5x3, W5x3, W5x3]), true).unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::Rct);
        let m = select_transform_modes(
            &request(Some(TransformRequest::Off), 3),
            &filters(&[W5x3, W5x3, W5x3]),
            true,
        )
        .unwrap();
        assert_eq!(*m.resolve_tile(0).unwrap(), TransformMode::None);
    }

    #[test]
    fn test_forced_mode_errors() {
        let err = select_transform_modes(
            &request(Some(TransformRequest::Rct), 3),
            &filters(&[W9x7, W9x7, W9x7]),
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot use RCT with w9x7 filter in tile 0");

        assert!(matches!(
            select_transform_modes(
                &request(Some(TransformRequest::Ict), 3),
                &filters(&[W5x3, W5x3, W5x3]),
                false
            ),
            Err(AnalysisError::IncompatibleTransform { .. })
        ));
        assert!(matches!(
            select_transform_modes(
                &request(Some(TransformRequest::On), 3),
                &filters(&[W5x3, W9x7, W5x3]),
                false
            ),
            Err(AnalysisError::FilterMismatch { tile: 0 })
        ));
        assert!(matches!(
            select_transform_modes(&request(Some(TransformRequest::On), 1), &filters(&[W5x3]), false),
            Err(AnalysisError::NotEnoughComponents { tile: 0, found: 1 })
        ));
    }

    fn rgb_image(subsample_blue: bool) -> RasterImage {
        let tiler = Tiler::single_tile(Rect::new(0, 0, 4, 2)).unwrap();
        let mut infos = vec![ComponentInfo::default(); 3];
        if subsample_blue {
            infos[2].dx = 2;
        }
        let planes = infos
            .iter()
            .enumerate()
            .map(|(c, info)| {
                let n = tiler.component_rect(info).area();
                (0..n as i32).map(|i| i * (c as i32 + 1) - 4).collect()
            })
            .collect();
        RasterImage::new(tiler, infos, planes).unwrap()
    }

    #[test]
    fn test_adapter_applies_rct() {
        let mut modes = TileCompValue::new("component transform", ValueScope::Tile, 1, 3);
        modes.set_default(TransformMode::Rct);
        let mut ct = ComponentTransform::new(rgb_image(false), modes);
        let mut ctx = TileContext::new(ct.tile_geometry(0).unwrap());
        ct.prepare_tile(&mut ctx).unwrap();
        assert_eq!(ctx.transform(), TransformMode::Rct);
        assert_eq!(ct.nominal_range_bits(&ctx, 1), 9);

        let window = Rect::new(1, 1, 3, 1);
        let u = ct.read_window(&ctx, 1, window).unwrap();
        // Samples 5..8: r = i - 4, g = 2i - 4, b = 3i - 4, so U = b - g = i.
        assert_eq!(u.data, Samples::Int(vec![5, 6, 7]));
    }

    #[test]
    fn test_adapter_rejects_mismatched_dimensions() {
        let mut modes = TileCompValue::new("component transform", ValueScope::Tile, 1, 3);
        modes.set_default(TransformMode::Ict);
        let ct = ComponentTransform::new(rgb_image(true), modes);
        let mut ctx = TileContext::new(ct.tile_geometry(0).unwrap());
        assert_eq!(
            ct.prepare_tile(&mut ctx),
            Err(AnalysisError::ComponentDimensionMismatch {
                tile: 0,
                mode: TransformMode::Ict
            })
        );
    }

    /// Raster image reporting its own bit depth and fractional bits.
    #[derive(Debug, Clone)]
    struct ScaledImage {
        inner: RasterImage,
        depth: u32,
        fixed_point: u32,
    }

    impl ImageSource for ScaledImage {
        fn num_components(&self) -> usize {
            self.inner.num_components()
        }

        fn num_tiles(&self) -> usize {
            self.inner.num_tiles()
        }

        fn nominal_range_bits(&self, _ctx: &TileContext, _c: usize) -> u32 {
            self.depth
        }

        fn fixed_point(&self, _ctx: &TileContext, _c: usize) -> u32 {
            self.fixed_point
        }

        fn component_rect(&self, c: usize) -> Result<Rect> {
            self.inner.component_rect(c)
        }

        fn tile_geometry(&self, tile: usize) -> Result<TileGeometry> {
            self.inner.tile_geometry(tile)
        }

        fn read_window(&mut self, ctx: &TileContext, c: usize, window: Rect) -> Result<DataBlk> {
            self.inner.read_window(ctx, c, window)
        }
    }

    fn modes(mode: TransformMode) -> TileCompValue<TransformMode> {
        let mut modes = TileCompValue::new("component transform", ValueScope::Tile, 1, 3);
        modes.set_default(mode);
        modes
    }

    fn scaled(depth: u32, fixed_point: u32) -> ScaledImage {
        ScaledImage {
            inner: rgb_image(false),
            depth,
            fixed_point,
        }
    }

    #[test]
    fn test_prepare_tile_rejects_unsupported_depths() {
        let ct = ComponentTransform::new(scaled(64, 0), modes(TransformMode::Rct));
        let mut ctx = TileContext::new(ct.tile_geometry(0).unwrap());
        assert_eq!(
            ct.prepare_tile(&mut ctx),
            Err(AnalysisError::InvalidBitDepth { component: 0, depth: 64 })
        );

        let ct = ComponentTransform::new(scaled(12, 40), modes(TransformMode::Rct));
        assert_eq!(
            ct.prepare_tile(&mut ctx),
            Err(AnalysisError::InvalidFixedPoint { component: 0, bits: 40 })
        );

        let ct = ComponentTransform::new(scaled(38, 0), modes(TransformMode::Rct));
        ct.prepare_tile(&mut ctx).unwrap();
        assert_eq!(ct.nominal_range_bits(&ctx, 0), 38);
        assert_eq!(ct.nominal_range_bits(&ctx, 1), 39);
    }

    #[test]
    fn test_ict_removes_fractional_bits_once() {
        let mut plain = ComponentTransform::new(rgb_image(false), modes(TransformMode::Ict));
        let mut fixed = ComponentTransform::new(scaled(8, 2), modes(TransformMode::Ict));
        let mut plain_ctx = TileContext::new(plain.tile_geometry(0).unwrap());
        let mut fixed_ctx = TileContext::new(fixed.tile_geometry(0).unwrap());
        plain.prepare_tile(&mut plain_ctx).unwrap();
        fixed.prepare_tile(&mut fixed_ctx).unwrap();

        // Transformed samples are already real-valued.
        assert_eq!(fixed.fixed_point(&fixed_ctx, 0), 0);
        let window = Rect::new(0, 0, 4, 2);
        for c in 0..3 {
            let a = plain.read_window(&plain_ctx, c, window).unwrap().data.into_float();
            let b = fixed.read_window(&fixed_ctx, c, window).unwrap().data.into_float();
            for (x, y) in a.iter().zip(&b) {
                assert!((x / 4.0 - y).abs() < 1e-5, "component {c}: {x} / 4 != {y}");
            }
        }
    }

    #[test]
    fn test_rct_reversible_at_16_bit_extremes() {
        let extremes = [-32768, -1, 0, 32767];
        for &r in &extremes {
            for &g in &extremes {
                for &b in &extremes {
                    let (mut y, mut u, mut v) = ([0], [0], [0]);
                    forward_rct(&[r], &[g], &[b], 0, &mut y);
                    forward_rct(&[r], &[g], &[b], 1, &mut u);
                    forward_rct(&[r], &[g], &[b], 2, &mut v);
                    assert_eq!(inverse_rct(y[0], u[0], v[0]), (r, g, b));
                }
            }
        }
    }

    /// Signed samples of a random depth in 1..=16, all three from the same range.
    fn rct_samples() -> impl Strategy<Value = (i32, i32, i32)> {
        (1u32..=16).prop_flat_map(|depth| {
            let half = 1i32 << (depth - 1);
            (-half..half, -half..half, -half..half)
        })
    }

    proptest! {
        #[test]
        fn prop_rct_reversible((r, g, b) in rct_samples()) {
            let mut y = [0];
            let mut u = [0];
            let mut v = [0];
            forward_rct(&[r], &[g], &[b], 0, &mut y);
            forward_rct(&[r], &[g], &[b], 1, &mut u);
            forward_rct(&[r], &[g], &[b], 2, &mut v);
            prop_assert_eq!(inverse_rct(y[0], u[0], v[0]), (r, g, b));
        }
    }
}
