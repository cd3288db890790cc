//! Rectangular ROI masks.
//!
//! Each rectangle is carried down the subband tree as a pair of index ranges:
//! a coefficient belongs to the ROI when its synthesis support intersects the
//! rectangle at the level above. No mask plane is materialized.

use super::{Roi, RoiMaskBlock, TileRoiMask, clip_to_tile, tile_rect};
use crate::jpeg2000::dwt::{FilterSupports, low_count};
use crate::jpeg2000::image::Rect;
use crate::jpeg2000::subband::SubbandTree;

/// Inclusive bounds in the local coordinates of one subband.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

/// ROI bounds of every node of a subband tree, indexed like its arena.
#[derive(Debug, Clone, Default)]
pub struct RectMaskTree {
    bounds: Vec<Vec<Bounds>>,
}

impl RectMaskTree {
    /// ROI bounds of subband `idx`.
    pub fn bounds(&self, idx: usize) -> &[Bounds] {
        self.bounds.get(idx).map_or(&[], Vec::as_slice)
    }

    /// Zeroes `block` and sets the samples inside any ROI to `magbits`.
    pub fn fill(&self, tree: &SubbandTree, block: &mut RoiMaskBlock, magbits: i32) {
        block.data.fill(0);
        let r = block.rect;
        let Some(leaf) = tree.leaf_at(r.x, r.y) else {
            return;
        };
        let sb = tree.node(leaf);
        let (bx0, by0) = (r.x as i64, r.y as i64);
        let (bx1, by1) = (r.right() as i64 - 1, r.bottom() as i64 - 1);
        let w = r.width as usize;

        for b in self.bounds(leaf) {
            let x0 = (b.x0 + sb.ulx as i64).max(bx0);
            let x1 = (b.x1 + sb.ulx as i64).min(bx1);
            let y0 = (b.y0 + sb.uly as i64).max(by0);
            let y1 = (b.y1 + sb.uly as i64).min(by1);
            if x0 > x1 || y0 > y1 {
                continue;
            }
            for y in y0..=y1 {
                let row = (y - by0) as usize * w;
                block.data[row + (x0 - bx0) as usize..=row + (x1 - bx0) as usize].fill(magbits);
            }
        }
    }
}

/// Mask generator for ROI sets made only of rectangles.
#[derive(Debug, Clone)]
pub struct RectRoiMaskGenerator {
    rois: Vec<Roi>,
}

impl RectRoiMaskGenerator {
    pub fn new(rois: Vec<Roi>) -> Self {
        Self { rois }
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    /// Projects the rectangles of component `c` through `tree`.
    pub fn build(&self, tree: &SubbandTree, c: usize) -> TileRoiMask {
        let tile = tile_rect(tree);
        let root: Vec<Bounds> = self
            .rois
            .iter()
            .filter_map(|roi| match *roi {
                Roi::Rect {
                    component,
                    x,
                    y,
                    width,
                    height,
                } if component == c => clip_to_tile(Rect::new(x, y, width, height), tile),
                _ => None,
            })
            .map(|r| Bounds {
                x0: r.x as i64,
                y0: r.y as i64,
                x1: r.right() as i64 - 1,
                y1: r.bottom() as i64 - 1,
            })
            .collect();
        if root.is_empty() {
            return TileRoiMask::Outside;
        }

        let mut bounds = vec![Vec::new(); tree.len()];
        bounds[SubbandTree::ROOT] = root;
        let mut idx = SubbandTree::ROOT;
        while let Some(children) = tree.children(idx) {
            let sb = tree.node(idx);
            let Some(filter) = sb.filter else { break };
            let s = filter.synthesis_supports();
            let (hf, vf) = (i64::from(sb.ulcx % 2), i64::from(sb.ulcy % 2));
            let (lw, lh) = (low_count(sb.ulcx, sb.w) as i64, low_count(sb.ulcy, sb.h) as i64);
            let (hw, hh) = (sb.w as i64 - lw, sb.h as i64 - lh);

            for b in std::mem::take(&mut bounds[idx]) {
                let (lx, hx) = project(b.x0, b.x1, hf, s, lw, hw);
                let (ly, hy) = project(b.y0, b.y1, vf, s, lh, hh);
                for (child, xs, ys) in [(0, lx, ly), (1, hx, ly), (2, lx, hy), (3, hx, hy)] {
                    if let (Some((x0, x1)), Some((y0, y1))) = (xs, ys) {
                        bounds[children[child]].push(Bounds { x0, y0, x1, y1 });
                    }
                }
            }
            idx = children[0];
        }
        TileRoiMask::Rect(RectMaskTree { bounds })
    }
}

type Range = Option<(i64, i64)>;

/// Low and high coefficient ranges reached by samples `lo..=hi` of a line
/// whose first sample has reference-grid parity `parity`.
fn project(lo: i64, hi: i64, parity: i64, s: FilterSupports, lows: i64, highs: i64) -> (Range, Range) {
    let (lneg, lpos) = (i64::from(s.low_neg), i64::from(s.low_pos));
    let (hneg, hpos) = (i64::from(s.high_neg), i64::from(s.high_pos));
    // Low coefficient k sits at 2k + parity, high coefficient k at 2k + 1 - parity.
    let low = clamp(
        ceil_half(lo - parity - lpos),
        (hi - parity + lneg).div_euclid(2),
        lows,
    );
    let high = clamp(
        ceil_half(lo - 1 + parity - hpos),
        (hi - 1 + parity + hneg).div_euclid(2),
        highs,
    );
    (low, high)
}

fn ceil_half(v: i64) -> i64 {
    (v + 1).div_euclid(2)
}

fn clamp(a: i64, b: i64, n: i64) -> Range {
    let (a, b) = (a.max(0), b.min(n - 1));
    (a <= b).then_some((a, b))
}
