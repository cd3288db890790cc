//! Analysis pipeline of one image: component transform, wavelet
//! decomposition and ROI masks, driven tile by tile.

use std::sync::Arc;

use tracing::debug;

use super::component_transform::ComponentTransform;
use super::config::EncoderConfig;
use super::forward_wt::{CodeBlockEnumerator, ForwardWavelet};
use super::image::CodeBlock;
use super::roi::{RoiMaskBlock, RoiMaskEngine};
use super::subband::SubbandTree;
use super::tile::TileContext;
use super::tiler::ImageSource;
use crate::error::{AnalysisError, Result};

/// Encoder-side analysis of an image source.
///
/// All per-tile state lives in the [`TileContext`] returned by
/// [`set_tile`](Self::set_tile); the pipeline itself only keeps the
/// configuration, the source and reusable scratch space.
#[derive(Debug)]
pub struct ForwardAnalysis<S> {
    config: Arc<EncoderConfig>,
    source: ComponentTransform<S>,
    wavelet: ForwardWavelet,
    roi: Option<RoiMaskEngine>,
}

impl<S: ImageSource> ForwardAnalysis<S> {
    pub fn new(source: S, config: EncoderConfig) -> Result<Self> {
        if source.num_tiles() != config.num_tiles() {
            return Err(AnalysisError::ConfigMismatch {
                parameter: "tiles",
                expected: config.num_tiles(),
                found: source.num_tiles(),
            });
        }
        if source.num_components() != config.num_components() {
            return Err(AnalysisError::ConfigMismatch {
                parameter: "components",
                expected: config.num_components(),
                found: source.num_components(),
            });
        }

        let roi = if config.rois().is_empty() {
            None
        } else {
            let planes = (0..source.num_components())
                .map(|c| source.component_rect(c))
                .collect::<Result<Vec<_>>>()?;
            Some(RoiMaskEngine::new(config.rois().to_vec(), &planes)?)
        };

        let config = Arc::new(config);
        let source = ComponentTransform::new(source, config.transform_modes().clone());
        Ok(Self {
            wavelet: ForwardWavelet::new(Arc::clone(&config)),
            config,
            source,
            roi,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// The pixel source as seen by the wavelet stage, after the component transform.
    pub fn source(&self) -> &ComponentTransform<S> {
        &self.source
    }

    pub fn roi_engine(&self) -> Option<&RoiMaskEngine> {
        self.roi.as_ref()
    }

    pub fn num_tiles(&self) -> usize {
        self.config.num_tiles()
    }

    pub fn num_components(&self) -> usize {
        self.config.num_components()
    }

    /// Prepares tile `tile`: selects its component transform and builds the
    /// subband tree of every component, so configuration errors surface
    /// before any sample is read.
    pub fn set_tile(&self, tile: usize) -> Result<TileContext> {
        if tile >= self.num_tiles() {
            return Err(AnalysisError::TileOutOfRange(tile, self.num_tiles()));
        }
        let mut ctx = TileContext::new(self.source.tile_geometry(tile)?);
        self.source.prepare_tile(&mut ctx)?;
        for c in 0..ctx.num_components() {
            self.wavelet.subband_tree(&mut ctx, c)?;
        }
        debug!(tile, transform = %ctx.transform(), canvas = ?ctx.geometry().canvas, "tile ready");
        Ok(ctx)
    }

    /// Bit depth of component `c` entering the wavelet stage.
    pub fn nominal_range_bits(&self, ctx: &TileContext, c: usize) -> u32 {
        self.source.nominal_range_bits(ctx, c)
    }

    pub fn subband_tree(&self, ctx: &mut TileContext, c: usize) -> Result<Arc<SubbandTree>> {
        self.wavelet.subband_tree(ctx, c)
    }

    /// Decomposes component `c` of the tile and enumerates its code-blocks.
    pub fn code_blocks(&mut self, ctx: &mut TileContext, c: usize) -> Result<CodeBlockEnumerator> {
        self.wavelet.code_blocks(&mut self.source, ctx, c)
    }

    /// Fills `block` with the ROI mask of component `c`; see [`RoiMaskEngine::mask`].
    ///
    /// Always false when no ROI is configured.
    pub fn roi_mask(&self, ctx: &mut TileContext, block: &mut RoiMaskBlock, magbits: i32, c: usize) -> Result<bool> {
        let Some(engine) = &self.roi else {
            return Ok(false);
        };
        let tree = self.wavelet.subband_tree(ctx, c)?;
        engine.mask(ctx, &tree, block, magbits, c)
    }

    /// Computes the ROI mask of a code-block of component `c` and stores it
    /// in the block when an ROI reaches the tile.
    pub fn attach_roi_mask(&self, ctx: &mut TileContext, c: usize, block: &mut CodeBlock, magbits: i32) -> Result<bool> {
        let mut mask = RoiMaskBlock::new(block.rect());
        let filled = self.roi_mask(ctx, &mut mask, magbits, c)?;
        if filled {
            block.roi_mask = Some(mask.data);
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::component_transform::TransformMode;
    use crate::jpeg2000::config::EncoderOptions;
    use crate::jpeg2000::image::{Rect, SubbandOrientation};
    use crate::jpeg2000::tiler::{RasterImage, Tiler};
    use test_log::test;

    fn rgb(width: u32, height: u32, tile: (u32, u32)) -> RasterImage {
        let tiler = Tiler::new(Rect::new(0, 0, width, height), (0, 0), tile).unwrap();
        let pixels: Vec<u8> = (0..width * height * 3).map(|i| (i * 7 % 256) as u8).collect();
        RasterImage::from_interleaved_u8(tiler, 3, &pixels).unwrap()
    }

    #[test]
    fn test_count_mismatch() {
        let config = EncoderConfig::from_options(&EncoderOptions::default(), 2, 3).unwrap();
        assert_eq!(
            ForwardAnalysis::new(rgb(8, 8, (8, 8)), config).unwrap_err(),
            AnalysisError::ConfigMismatch {
                parameter: "tiles",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_tiles_are_prepared_independently() {
        let options = EncoderOptions {
            lossless: true,
            levels: Some("2".into()),
            component_transform: Some("on t1 off".into()),
            ..Default::default()
        };
        let config = EncoderConfig::from_options(&options, 2, 3).unwrap();
        let analysis = ForwardAnalysis::new(rgb(32, 16, (16, 16)), config).unwrap();

        let t0 = analysis.set_tile(0).unwrap();
        let t1 = analysis.set_tile(1).unwrap();
        assert_eq!(t0.transform(), TransformMode::Rct);
        assert_eq!(t1.transform(), TransformMode::None);
        assert_eq!(analysis.nominal_range_bits(&t0, 1), 9);
        assert_eq!(analysis.nominal_range_bits(&t1, 1), 8);
        assert_eq!(t1.subband_tree(0).unwrap().root().ulcx, 16);
        assert!(analysis.set_tile(2).is_err());
    }

    #[test]
    fn test_code_blocks_with_roi() {
        let options = EncoderOptions {
            lossless: true,
            levels: Some("1".into()),
            code_block_size: Some("8x8".into()),
            rois: vec!["R 0 0 0 4 4".parse().unwrap()],
            ..Default::default()
        };
        let config = EncoderConfig::from_options(&options, 1, 3).unwrap();
        let mut analysis = ForwardAnalysis::new(rgb(32, 32, (32, 32)), config).unwrap();
        assert!(analysis.roi_engine().unwrap().is_rect());
        let mut ctx = analysis.set_tile(0).unwrap();

        let blocks: Vec<_> = analysis.code_blocks(&mut ctx, 0).unwrap().collect();
        assert_eq!(blocks.len(), 16);
        let mut flagged = 0;
        for mut block in blocks {
            if analysis.attach_roi_mask(&mut ctx, 0, &mut block, 6).unwrap() {
                let mask = block.roi_mask.as_ref().unwrap();
                assert_eq!(mask.len(), block.rect().area());
                if mask.iter().any(|&v| v == 6) {
                    flagged += 1;
                }
            }
        }
        // The ROI sits in the top-left corner: the first block of each subband.
        assert_eq!(flagged, 4);

        let mut block = analysis.code_blocks(&mut ctx, 1).unwrap().next().unwrap();
        assert_eq!(block.orientation(), SubbandOrientation::HH);
        assert!(!analysis.attach_roi_mask(&mut ctx, 1, &mut block, 6).unwrap());
        assert!(block.roi_mask.is_none());
    }
}
