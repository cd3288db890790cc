//! ROI masks for arbitrary shapes.
//!
//! The ROIs of a component are rasterized into a tile-size indicator plane,
//! which is then decomposed like the image data but with every filter replaced
//! by a maximum over its synthesis support. A coefficient is marked as soon as
//! one sample it reconstructs is inside an ROI.

use super::{Roi, RoiMaskBlock, TileRoiMask, clip_to_tile, tile_rect};
use crate::error::{AnalysisError, Result};
use crate::jpeg2000::dwt::{FilterSupports, low_count};
use crate::jpeg2000::image::Rect;
use crate::jpeg2000::subband::SubbandTree;

/// Decomposed indicator mask of a tile-component, laid out like its
/// decomposed samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DenseMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[(y * self.width + x) as usize] != 0
    }

    /// Copies the window of `block` out of the mask, scaled by `magbits`.
    pub fn fill(&self, block: &mut RoiMaskBlock, magbits: i32) {
        block.data.fill(0);
        let r = block.rect;
        let Some(inside) = r.intersection(&Rect::new(0, 0, self.width, self.height)) else {
            return;
        };
        let (stride, w) = (self.width as usize, r.width as usize);
        for y in inside.y..inside.bottom() {
            let src = y as usize * stride;
            let dst = (y - r.y) as usize * w;
            for x in inside.x..inside.right() {
                block.data[dst + (x - r.x) as usize] = i32::from(self.data[src + x as usize]) * magbits;
            }
        }
    }
}

/// Mask generator for ROI sets with circles or mask-image shapes.
#[derive(Debug, Clone)]
pub struct ArbRoiMaskGenerator {
    rois: Vec<Roi>,
    /// Whole-image bounds of every component.
    components: Vec<Rect>,
}

impl ArbRoiMaskGenerator {
    pub fn new(rois: Vec<Roi>, components: Vec<Rect>) -> Self {
        Self { rois, components }
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    /// Rasterizes the ROIs of component `c` over the tile and decomposes the result.
    pub fn build(&self, tree: &SubbandTree, c: usize) -> Result<TileRoiMask> {
        let tile = tile_rect(tree);
        let stride = tile.width as usize;
        let mut data = vec![0u8; tile.area()];
        let mut any = false;

        for roi in self.rois.iter().filter(|roi| roi.component() == c) {
            match roi {
                Roi::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => {
                    if let Some(r) = clip_to_tile(Rect::new(*x, *y, *width, *height), tile) {
                        for row in r.y..r.bottom() {
                            let start = row as usize * stride;
                            data[start + r.x as usize..start + r.right() as usize].fill(1);
                        }
                        any = true;
                    }
                }
                Roi::Circle { cx, cy, radius, .. } => {
                    let (cx, cy, radius) = (*cx, *cy, *radius);
                    let bbox = Rect::new(
                        cx.saturating_sub(radius),
                        cy.saturating_sub(radius),
                        cx + radius + 1 - cx.saturating_sub(radius),
                        cy + radius + 1 - cy.saturating_sub(radius),
                    );
                    let Some(r) = clip_to_tile(bbox, tile) else {
                        continue;
                    };
                    let r2 = i64::from(radius) * i64::from(radius);
                    for k in r.y..r.bottom() {
                        for j in r.x..r.right() {
                            let dx = i64::from(tile.x + j) - i64::from(cx);
                            let dy = i64::from(tile.y + k) - i64::from(cy);
                            if dx * dx + dy * dy < r2 {
                                data[k as usize * stride + j as usize] = 1;
                                any = true;
                            }
                        }
                    }
                }
                Roi::Arbitrary { mask, .. } => {
                    let plane = self
                        .components
                        .get(c)
                        .ok_or(AnalysisError::ComponentOutOfRange(c, self.components.len()))?;
                    // The mask is aligned with the component's image origin.
                    let (ox, oy) = (tile.x - plane.x.min(tile.x), tile.y - plane.y.min(tile.y));
                    for k in 0..tile.height {
                        for j in 0..tile.width {
                            if mask.is_inside(ox + j, oy + k) {
                                data[k as usize * stride + j as usize] = 1;
                                any = true;
                            }
                        }
                    }
                }
            }
        }
        if !any {
            return Ok(TileRoiMask::Outside);
        }

        decompose(tree, &mut data, stride);
        Ok(TileRoiMask::Dense(DenseMask {
            width: tile.width,
            height: tile.height,
            data,
        }))
    }
}

/// Max-pooling counterpart of the forward wavelet decomposition.
fn decompose(tree: &SubbandTree, data: &mut [u8], stride: usize) {
    let mut line = Vec::new();
    let mut pooled = Vec::new();
    let mut idx = SubbandTree::ROOT;
    while let Some(children) = tree.children(idx) {
        let sb = tree.node(idx);
        if let Some(filter) = sb.filter.filter(|_| sb.w > 0 && sb.h > 0) {
            let s = filter.synthesis_supports();
            let (x0, y0, w, h) = (sb.ulx as usize, sb.uly as usize, sb.w as usize, sb.h as usize);

            for y in y0..y0 + h {
                let row = &mut data[y * stride + x0..y * stride + x0 + w];
                line.clear();
                line.extend_from_slice(row);
                pool(&line, &mut pooled, sb.ulcx, s);
                row.copy_from_slice(&pooled);
            }
            for x in x0..x0 + w {
                line.clear();
                line.extend((y0..y0 + h).map(|y| data[y * stride + x]));
                pool(&line, &mut pooled, sb.ulcy, s);
                for (j, &v) in pooled.iter().enumerate() {
                    data[(y0 + j) * stride + x] = v;
                }
            }
        }
        idx = children[0];
    }
}

/// Splits `line` into low then high coefficients, each the maximum over the
/// samples its synthesis filter reaches.
fn pool(line: &[u8], out: &mut Vec<u8>, ulc: u32, s: FilterSupports) {
    let n = line.len();
    let parity = (ulc % 2) as usize;
    let lows = low_count(ulc, n as u32) as usize;
    let window = |p: usize, neg: u32, pos: u32| {
        let a = p.saturating_sub(neg as usize);
        let b = (p + pos as usize).min(n - 1);
        line[a..=b].iter().copied().max().unwrap_or(0)
    };
    out.clear();
    out.extend((0..lows).map(|k| window(2 * k + parity, s.low_neg, s.low_pos)));
    out.extend((0..n - lows).map(|k| window(2 * k + 1 - parity, s.high_neg, s.high_pos)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::config::{CodeBlockSize, PartitionOrigin, PrecinctSizes};
    use crate::jpeg2000::dwt::WaveletFilter;
    use crate::jpeg2000::roi::RoiMaskImage;
    use std::sync::Arc;

    #[test]
    fn test_pool_even_and_odd_phase() {
        let s = WaveletFilter::W5x3.synthesis_supports();
        let line = [0, 0, 0, 0, 1, 0, 0, 0];
        let mut out = Vec::new();
        pool(&line, &mut out, 0, s);
        // lows at 0,2,4,6 reach +-1, highs at 1,3,5,7 reach +-2
        assert_eq!(out, vec![0, 0, 1, 0, 0, 1, 1, 0]);
        pool(&line, &mut out, 1, s);
        // lows at 1,3,5,7, highs at 0,2,4,6
        assert_eq!(out, vec![0, 1, 1, 0, 0, 1, 1, 1]);
        pool(&[1], &mut out, 1, s);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn test_mask_image_is_aligned_at_image_origin() {
        // Tile-component starting at (4, 2) of an 8x4 component plane.
        let mut tree = SubbandTree::new(4, 2, 4, 2, 0, WaveletFilter::W5x3);
        tree.init_code_blocks(CodeBlockSize::new(4, 4).unwrap(), &PrecinctSizes::unpartitioned(), PartitionOrigin::default())
            .unwrap();
        let mut pixels = vec![0u8; 32];
        pixels[3 * 8 + 5] = 9;
        let mask = Arc::new(RoiMaskImage::new(8, 4, pixels).unwrap());
        let generator = ArbRoiMaskGenerator::new(vec![Roi::Arbitrary { component: 0, mask }], vec![Rect::new(0, 0, 8, 4)]);

        let TileRoiMask::Dense(dense) = generator.build(&tree, 0).unwrap() else {
            panic!("expected dense mask");
        };
        assert!(dense.is_set(1, 1));
        assert!(!dense.is_set(0, 0));

        let mut block = RoiMaskBlock::new(Rect::new(0, 0, 4, 2));
        dense.fill(&mut block, 4);
        assert_eq!(block.data, vec![0, 0, 0, 0, 0, 4, 0, 0]);
    }

    #[test]
    fn test_empty_circle() {
        let tree = SubbandTree::new(8, 8, 0, 0, 1, WaveletFilter::W9x7);
        let generator = ArbRoiMaskGenerator::new(
            vec![Roi::Circle {
                component: 0,
                cx: 3,
                cy: 3,
                radius: 0,
            }],
            vec![Rect::new(0, 0, 8, 8)],
        );
        assert!(matches!(generator.build(&tree, 0).unwrap(), TileRoiMask::Outside));
    }
}
