//! Region of interest masks.
//!
//! An ROI raises the importance of the coefficients whose synthesis support
//! touches it. For each code-block the engine produces a buffer holding the
//! number of extra magnitude bits per sample (0 outside every ROI).
//!
//! When every ROI is a rectangle the bounds are projected through the
//! subband tree directly ([`rect`]); otherwise the ROIs are rasterized and
//! the mask is decomposed with max-pooling over the filter supports
//! ([`arbitrary`]). Both give the same masks for rectangles.

pub mod arbitrary;
pub mod rect;

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, trace};

use self::arbitrary::{ArbRoiMaskGenerator, DenseMask};
use self::rect::{RectMaskTree, RectRoiMaskGenerator};
use super::image::Rect;
use super::subband::SubbandTree;
use super::tile::TileContext;
use crate::error::{AnalysisError, Result};

/// Binary mask covering a whole component plane; nonzero samples are inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiMaskImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RoiMaskImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(AnalysisError::DataLengthMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_inside(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[(y * self.width + x) as usize] != 0
    }
}

/// A region of interest in component coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roi {
    Rect {
        component: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Samples strictly closer than `radius` to the center.
    Circle {
        component: usize,
        cx: u32,
        cy: u32,
        radius: u32,
    },
    /// Shape given by a mask aligned with the component's image origin.
    Arbitrary {
        component: usize,
        mask: Arc<RoiMaskImage>,
    },
}

impl Roi {
    pub fn component(&self) -> usize {
        match self {
            Roi::Rect { component, .. } | Roi::Circle { component, .. } | Roi::Arbitrary { component, .. } => {
                *component
            }
        }
    }

    pub fn is_rect(&self) -> bool {
        matches!(self, Roi::Rect { .. })
    }
}

impl FromStr for Roi {
    type Err = AnalysisError;

    /// Parses `R <c> <x> <y> <w> <h>` or `C <c> <x> <y> <r>`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || AnalysisError::InvalidValue {
            parameter: "roi",
            value: s.to_string(),
        };
        let mut tokens = s.split_whitespace();
        let kind = tokens.next().ok_or_else(bad)?;
        let numbers = tokens
            .map(|t| t.parse::<u32>().map_err(|_| bad()))
            .collect::<Result<Vec<_>>>()?;
        match (kind, numbers.as_slice()) {
            ("R" | "r", &[c, x, y, width, height]) => Ok(Roi::Rect {
                component: c as usize,
                x,
                y,
                width,
                height,
            }),
            ("C" | "c", &[c, cx, cy, radius]) => Ok(Roi::Circle {
                component: c as usize,
                cx,
                cy,
                radius,
            }),
            _ => Err(bad()),
        }
    }
}

/// Mask window of one code-block, in tile-local coordinates of the
/// decomposed tile-component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiMaskBlock {
    pub rect: Rect,
    pub data: Vec<i32>,
}

impl RoiMaskBlock {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            data: vec![0; rect.area()],
        }
    }
}

/// Mask state of a tile-component, cached in its [`TileContext`].
#[derive(Debug, Clone)]
pub enum TileRoiMask {
    /// No ROI of the component reaches the tile.
    Outside,
    Rect(RectMaskTree),
    Dense(DenseMask),
}

/// ROI mask engine, chosen once from the configured ROIs.
#[derive(Debug, Clone)]
pub enum RoiMaskEngine {
    Rect(RectRoiMaskGenerator),
    Arbitrary(ArbRoiMaskGenerator),
}

impl RoiMaskEngine {
    /// Picks the rectangle engine when every ROI is a rectangle.
    ///
    /// `components` holds the whole-image bounds of every component; ROIs must
    /// name existing components and arbitrary masks must match their plane.
    pub fn new(rois: Vec<Roi>, components: &[Rect]) -> Result<Self> {
        validate(&rois, components)?;
        let engine = if rois.iter().all(Roi::is_rect) {
            RoiMaskEngine::Rect(RectRoiMaskGenerator::new(rois))
        } else {
            RoiMaskEngine::Arbitrary(ArbRoiMaskGenerator::new(rois, components.to_vec()))
        };
        debug!(rois = engine.rois().len(), rect = engine.is_rect(), "ROI mask engine selected");
        Ok(engine)
    }

    /// Forces the general engine, whatever the ROI shapes.
    pub fn arbitrary(rois: Vec<Roi>, components: &[Rect]) -> Result<Self> {
        validate(&rois, components)?;
        Ok(RoiMaskEngine::Arbitrary(ArbRoiMaskGenerator::new(rois, components.to_vec())))
    }

    pub fn rois(&self) -> &[Roi] {
        match self {
            RoiMaskEngine::Rect(g) => g.rois(),
            RoiMaskEngine::Arbitrary(g) => g.rois(),
        }
    }

    pub fn is_rect(&self) -> bool {
        matches!(self, RoiMaskEngine::Rect(_))
    }

    /// Fills `block` with `magbits` where ROI coefficients lie and 0 elsewhere.
    ///
    /// Returns false, leaving `block` untouched, when no ROI of component `c`
    /// reaches the tile. The per-component mask is built on the first call
    /// and cached in `ctx`.
    pub fn mask(
        &self,
        ctx: &mut TileContext,
        tree: &SubbandTree,
        block: &mut RoiMaskBlock,
        magbits: i32,
        c: usize,
    ) -> Result<bool> {
        ctx.component_rect(c)?;
        if ctx.roi_mask(c).is_none() {
            let built = match self {
                RoiMaskEngine::Rect(g) => g.build(tree, c),
                RoiMaskEngine::Arbitrary(g) => g.build(tree, c)?,
            };
            debug!(
                tile = ctx.index(),
                component = c,
                outside = matches!(built, TileRoiMask::Outside),
                "ROI mask built"
            );
            ctx.store_roi_mask(c, built);
        }

        let filled = match ctx.roi_mask(c) {
            None | Some(TileRoiMask::Outside) => false,
            Some(TileRoiMask::Rect(bounds)) => {
                bounds.fill(tree, block, magbits);
                true
            }
            Some(TileRoiMask::Dense(dense)) => {
                dense.fill(block, magbits);
                true
            }
        };
        trace!(component = c, rect = ?block.rect, filled, "ROI mask window");
        Ok(filled)
    }
}

fn validate(rois: &[Roi], components: &[Rect]) -> Result<()> {
    for roi in rois {
        let c = roi.component();
        let plane = components
            .get(c)
            .ok_or(AnalysisError::ComponentOutOfRange(c, components.len()))?;
        if let Roi::Arbitrary { mask, .. } = roi {
            if mask.width() != plane.width || mask.height() != plane.height {
                return Err(AnalysisError::RoiMaskSizeMismatch {
                    component: c,
                    mask_width: mask.width(),
                    mask_height: mask.height(),
                    width: plane.width,
                    height: plane.height,
                });
            }
        }
    }
    Ok(())
}

/// Tile-local part of `roi`, clipped to the tile-component `tile`.
pub(crate) fn clip_to_tile(roi: Rect, tile: Rect) -> Option<Rect> {
    roi.intersection(&tile)
        .map(|r| Rect::new(r.x - tile.x, r.y - tile.y, r.width, r.height))
}

/// Tile-component bounds in component coordinates.
pub(crate) fn tile_rect(tree: &SubbandTree) -> Rect {
    let root = tree.root();
    Rect::new(root.ulcx, root.ulcy, root.w, root.h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::config::{CodeBlockSize, PartitionOrigin, PrecinctSizes};
    use crate::jpeg2000::dwt::WaveletFilter;
    use crate::jpeg2000::tiler::TileGeometry;
    use test_log::test;

    fn context(component: Rect) -> TileContext {
        TileContext::new(TileGeometry {
            index: 0,
            canvas: component,
            components: vec![component],
        })
    }

    fn tree(component: Rect, levels: u32, filter: WaveletFilter) -> SubbandTree {
        let mut t = SubbandTree::new(component.width, component.height, component.x, component.y, levels, filter);
        t.init_code_blocks(CodeBlockSize::new(4, 4).unwrap(), &PrecinctSizes::unpartitioned(), PartitionOrigin::default())
            .unwrap();
        t
    }

    fn all_masks(engine: &RoiMaskEngine, component: Rect, tree: &SubbandTree) -> Vec<Option<Vec<i32>>> {
        let mut ctx = context(component);
        let mut out = Vec::new();
        for leaf in tree.leaves() {
            for info in tree.code_blocks(leaf) {
                let mut block = RoiMaskBlock::new(info.rect);
                let filled = engine.mask(&mut ctx, tree, &mut block, 5, 0).unwrap();
                out.push(filled.then_some(block.data));
            }
        }
        out
    }

    #[test]
    fn test_parse_roi() {
        assert_eq!(
            "R 0 10 20 30 40".parse::<Roi>().unwrap(),
            Roi::Rect {
                component: 0,
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
        assert_eq!(
            "C 2 5 6 7".parse::<Roi>().unwrap(),
            Roi::Circle {
                component: 2,
                cx: 5,
                cy: 6,
                radius: 7
            }
        );
        assert!("R 0 1 2 3".parse::<Roi>().is_err());
        assert!("X 0 1 2 3".parse::<Roi>().is_err());
    }

    #[test]
    fn test_engine_selection() {
        let planes = [Rect::new(0, 0, 8, 8)];
        let rect = "R 0 1 1 2 2".parse::<Roi>().unwrap();
        let circle = "C 0 4 4 2".parse::<Roi>().unwrap();
        assert!(RoiMaskEngine::new(vec![rect.clone()], &planes).unwrap().is_rect());
        assert!(!RoiMaskEngine::new(vec![rect, circle], &planes).unwrap().is_rect());
        assert_eq!(
            RoiMaskEngine::new(vec!["R 1 0 0 1 1".parse().unwrap()], &planes).unwrap_err(),
            AnalysisError::ComponentOutOfRange(1, 1)
        );
    }

    #[test]
    fn test_mask_size_mismatch() {
        let mask = Arc::new(RoiMaskImage::new(4, 4, vec![1; 16]).unwrap());
        let err = RoiMaskEngine::new(vec![Roi::Arbitrary { component: 0, mask }], &[Rect::new(0, 0, 8, 4)])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RoiMaskSizeMismatch { mask_width: 4, width: 8, .. }));
    }

    #[test]
    fn test_rect_and_general_paths_agree() {
        let rois: Vec<Roi> = ["R 0 5 4 9 6", "R 0 20 15 30 30", "R 0 3 30 1 1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        for filter in [WaveletFilter::W5x3, WaveletFilter::W9x7] {
            for component in [Rect::new(0, 0, 37, 29), Rect::new(3, 2, 37, 29)] {
                let planes = [Rect::new(0, 0, component.right(), component.bottom())];
                let t = tree(component, 3, filter);
                let fast = RoiMaskEngine::new(rois.clone(), &planes).unwrap();
                let general = RoiMaskEngine::arbitrary(rois.clone(), &planes).unwrap();
                assert!(fast.is_rect() && !general.is_rect());
                let a = all_masks(&fast, component, &t);
                let b = all_masks(&general, component, &t);
                assert_eq!(a, b, "{filter} at {component:?}");
                assert!(a.iter().flatten().any(|m| m.contains(&5)));
            }
        }
    }

    #[test]
    fn test_circle_without_decomposition() {
        let component = Rect::new(0, 0, 16, 16);
        let t = tree(component, 0, WaveletFilter::W5x3);
        let engine = RoiMaskEngine::new(vec!["C 0 8 8 3".parse().unwrap()], &[component]).unwrap();
        let mut ctx = context(component);

        let mut block = RoiMaskBlock::new(Rect::new(8, 8, 4, 4));
        assert!(engine.mask(&mut ctx, &t, &mut block, 7, 0).unwrap());
        let at = |x: usize, y: usize| block.data[(y - 8) * 4 + (x - 8)];
        assert_eq!(at(8, 8), 7);
        assert_eq!(at(10, 10), 7);
        // Distance exactly equal to the radius is outside.
        assert_eq!(at(11, 8), 0);
        assert_eq!(at(11, 11), 0);
    }

    #[test]
    fn test_roi_outside_tile() {
        let component = Rect::new(16, 0, 16, 16);
        let t = tree(component, 2, WaveletFilter::W5x3);
        let planes = [Rect::new(0, 0, 32, 16)];
        for engine in [
            RoiMaskEngine::new(vec!["R 0 0 0 8 8".parse().unwrap()], &planes).unwrap(),
            RoiMaskEngine::arbitrary(vec!["C 0 4 4 3".parse().unwrap()], &planes).unwrap(),
        ] {
            let mut ctx = context(component);
            let mut block = RoiMaskBlock::new(Rect::new(0, 0, 4, 4));
            block.data.fill(-1);
            assert!(!engine.mask(&mut ctx, &t, &mut block, 3, 0).unwrap());
            assert!(block.data.iter().all(|&v| v == -1));
        }
    }

    #[test]
    fn test_roi_of_other_component_is_ignored() {
        let component = Rect::new(0, 0, 8, 8);
        let t = tree(component, 1, WaveletFilter::W5x3);
        let planes = [component, component];
        let engine = RoiMaskEngine::new(vec!["R 1 0 0 8 8".parse().unwrap()], &planes).unwrap();
        let mut ctx = TileContext::new(TileGeometry {
            index: 0,
            canvas: component,
            components: vec![component, component],
        });
        let mut block = RoiMaskBlock::new(Rect::new(0, 0, 4, 4));
        assert!(!engine.mask(&mut ctx, &t, &mut block, 3, 0).unwrap());
        assert!(engine.mask(&mut ctx, &t, &mut block, 3, 1).unwrap());
        assert!(block.data.iter().all(|&v| v == 3));
    }

    #[test]
    fn test_partial_overlap_is_clipped() {
        let component = Rect::new(0, 0, 8, 8);
        let t = tree(component, 0, WaveletFilter::W5x3);
        let engine = RoiMaskEngine::new(vec!["R 0 6 6 10 10".parse().unwrap()], &[Rect::new(0, 0, 20, 20)]).unwrap();
        let mut ctx = context(component);
        let mut block = RoiMaskBlock::new(Rect::new(4, 4, 4, 4));
        assert!(engine.mask(&mut ctx, &t, &mut block, 1, 0).unwrap());
        assert_eq!(block.data, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1]);
    }
}
