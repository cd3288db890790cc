//! Subband tree of a tile-component.
//!
//! The dyadic decomposition is stored as an arena: node 0 is the full
//! tile-component, and every decomposed node owns four children (LL, HL, LH,
//! HH) of which only LL is split further. Nodes keep the index of their
//! parent so the code-block enumeration can walk back up the tree.

use tracing::debug;

use super::config::{CodeBlockSize, PartitionOrigin, PrecinctSizes};
use super::dwt::WaveletFilter;
use super::image::{CodeBlockInfo, Rect, SubbandOrientation};
use crate::error::{AnalysisError, Result};

/// A node of the subband tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subband {
    pub orientation: SubbandOrientation,
    /// Number of decompositions that produced this subband (0 for the root).
    pub level: u32,
    /// Resolution level the subband contributes to on reconstruction.
    pub resolution: u32,
    /// Tile-local position of the subband's samples in the decomposed buffer.
    pub ulx: u32,
    pub uly: u32,
    pub w: u32,
    pub h: u32,
    /// Position on the subband's own reference grid (canvas coordinates
    /// divided by the subsampling of its decomposition level).
    pub ulcx: u32,
    pub ulcy: u32,
    /// log2 of the analysis gain: 0 for LL, 1 for HL and LH, 2 for HH.
    pub gain_exp: u32,
    /// Filter used to split this node, `None` for leaves.
    pub filter: Option<WaveletFilter>,
    /// Nominal code-block dimensions, set for leaves.
    pub nominal_cblk_w: u32,
    pub nominal_cblk_h: u32,
    /// Code-block grid dimensions.
    pub num_cb_x: u32,
    pub num_cb_y: u32,
    /// Partition origin projected onto this subband.
    pub cb_origin_x: u32,
    pub cb_origin_y: u32,
    parent: Option<usize>,
    children: Option<[usize; 4]>,
}

impl Subband {
    fn new(orientation: SubbandOrientation) -> Self {
        Self {
            orientation,
            level: 0,
            resolution: 0,
            ulx: 0,
            uly: 0,
            w: 0,
            h: 0,
            ulcx: 0,
            ulcy: 0,
            gain_exp: 0,
            filter: None,
            nominal_cblk_w: 0,
            nominal_cblk_h: 0,
            num_cb_x: 0,
            num_cb_y: 0,
            cb_origin_x: 0,
            cb_origin_y: 0,
            parent: None,
            children: None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.children.is_some()
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.ulx, self.uly, self.w, self.h)
    }

    pub fn num_samples(&self) -> usize {
        self.w as usize * self.h as usize
    }

    pub fn num_code_blocks(&self) -> usize {
        self.num_cb_x as usize * self.num_cb_y as usize
    }
}

/// Arena holding the subband tree of one tile-component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubbandTree {
    nodes: Vec<Subband>,
    levels: u32,
}

impl SubbandTree {
    pub const ROOT: usize = 0;

    /// Builds the tree of a `w x h` tile-component whose origin sits at
    /// `(ulcx, ulcy)` on the reference grid, decomposed `levels` times.
    pub fn new(w: u32, h: u32, ulcx: u32, ulcy: u32, levels: u32, filter: WaveletFilter) -> Self {
        let mut root = Subband::new(SubbandOrientation::LL);
        root.w = w;
        root.h = h;
        root.ulcx = ulcx;
        root.ulcy = ulcy;
        root.resolution = levels;

        let mut tree = Self {
            nodes: vec![root],
            levels,
        };
        let mut idx = Self::ROOT;
        for _ in 0..levels {
            idx = tree.split(idx, filter);
        }
        tree
    }

    /// Splits node `idx` into four children and returns the index of its LL child.
    fn split(&mut self, idx: usize, filter: WaveletFilter) -> usize {
        let p = self.nodes[idx].clone();
        let base = self.nodes.len();

        let mut ll = Subband::new(SubbandOrientation::LL);
        ll.ulcx = (p.ulcx + 1) >> 1;
        ll.ulcy = (p.ulcy + 1) >> 1;
        ll.ulx = p.ulx;
        ll.uly = p.uly;
        ll.w = ((p.ulcx + p.w + 1) >> 1) - ll.ulcx;
        ll.h = ((p.ulcy + p.h + 1) >> 1) - ll.ulcy;
        ll.resolution = p.resolution - 1;
        ll.gain_exp = p.gain_exp;

        let mut hl = Subband::new(SubbandOrientation::HL);
        hl.ulcx = p.ulcx >> 1;
        hl.ulcy = ll.ulcy;
        hl.ulx = p.ulx + ll.w;
        hl.uly = p.uly;
        hl.w = ((p.ulcx + p.w) >> 1) - hl.ulcx;
        hl.h = ll.h;
        hl.resolution = p.resolution;
        hl.gain_exp = p.gain_exp + 1;

        let mut lh = Subband::new(SubbandOrientation::LH);
        lh.ulcx = ll.ulcx;
        lh.ulcy = p.ulcy >> 1;
        lh.ulx = p.ulx;
        lh.uly = p.uly + ll.h;
        lh.w = ll.w;
        lh.h = ((p.ulcy + p.h) >> 1) - lh.ulcy;
        lh.resolution = p.resolution;
        lh.gain_exp = p.gain_exp + 1;

        let mut hh = Subband::new(SubbandOrientation::HH);
        hh.ulcx = hl.ulcx;
        hh.ulcy = lh.ulcy;
        hh.ulx = hl.ulx;
        hh.uly = lh.uly;
        hh.w = hl.w;
        hh.h = lh.h;
        hh.resolution = p.resolution;
        hh.gain_exp = p.gain_exp + 2;

        for mut child in [ll, hl, lh, hh] {
            child.level = p.level + 1;
            child.parent = Some(idx);
            self.nodes.push(child);
        }
        let node = &mut self.nodes[idx];
        node.children = Some([base, base + 1, base + 2, base + 3]);
        node.filter = Some(filter);
        base
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Subband {
        &self.nodes[Self::ROOT]
    }

    /// Panics if `idx` was not handed out by this tree.
    pub fn node(&self, idx: usize) -> &Subband {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Subband] {
        &self.nodes
    }

    pub fn children(&self, idx: usize) -> Option<[usize; 4]> {
        self.nodes[idx].children
    }

    pub fn child(&self, idx: usize, orientation: SubbandOrientation) -> Option<usize> {
        self.children(idx).map(|ch| ch[u8::from(orientation) as usize])
    }

    /// The leaf following `current` in code-block order, or the first leaf
    /// when `current` is `None`.
    ///
    /// Leaves come finest level first, HH then LH then HL within a level, with
    /// the coarsest LL last.
    pub fn next_leaf(&self, current: Option<usize>) -> Option<usize> {
        let mut idx = match current {
            None => return Some(self.descend(Self::ROOT)),
            Some(idx) => idx,
        };
        loop {
            let parent = self.nodes[idx].parent?;
            let siblings = self.nodes[parent].children?;
            let next = match self.nodes[idx].orientation {
                SubbandOrientation::HH => siblings[2],
                SubbandOrientation::LH => siblings[1],
                SubbandOrientation::HL => siblings[0],
                SubbandOrientation::LL => {
                    idx = parent;
                    continue;
                }
            };
            return Some(self.descend(next));
        }
    }

    /// Follows HH children down to a leaf.
    fn descend(&self, mut idx: usize) -> usize {
        while let Some(children) = self.nodes[idx].children {
            idx = children[3];
        }
        idx
    }

    /// All leaves in code-block order.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.next_leaf(None), move |&idx| self.next_leaf(Some(idx)))
    }

    /// The leaf containing the tile-local position `(x, y)` of the decomposed buffer.
    pub fn leaf_at(&self, x: u32, y: u32) -> Option<usize> {
        if !self.root().rect().contains(x, y) {
            return None;
        }
        let mut idx = Self::ROOT;
        while let Some(children) = self.nodes[idx].children {
            idx = children
                .into_iter()
                .find(|&c| self.nodes[c].rect().contains(x, y))?;
        }
        Some(idx)
    }

    /// Computes the code-block grid of every leaf.
    ///
    /// The nominal size is the configured code-block size limited by the
    /// precinct size of the leaf's resolution level, halved for levels above 0.
    pub fn init_code_blocks(
        &mut self,
        cblk: CodeBlockSize,
        precincts: &PrecinctSizes,
        origin: PartitionOrigin,
    ) -> Result<()> {
        let max_resolution = self.levels;
        for sb in self.nodes.iter_mut().filter(|sb| sb.children.is_none()) {
            let (ppx, ppy) = precincts.exponents(sb.resolution, max_resolution);
            let (ppx, ppy) = if sb.resolution == 0 {
                (ppx, ppy)
            } else {
                (ppx.saturating_sub(1), ppy.saturating_sub(1))
            };
            sb.nominal_cblk_w = 1 << cblk.width_exp().min(ppx);
            sb.nominal_cblk_h = 1 << cblk.height_exp().min(ppy);

            // The origin is 0 or 1: it projects onto itself on the low-pass
            // side and onto 0 on the high-pass side.
            sb.cb_origin_x = if sb.orientation.is_horizontal_high() { 0 } else { origin.x() };
            sb.cb_origin_y = if sb.orientation.is_vertical_high() { 0 } else { origin.y() };

            if sb.w == 0 || sb.h == 0 {
                sb.num_cb_x = 0;
                sb.num_cb_y = 0;
                continue;
            }
            if sb.ulcx < sb.cb_origin_x || sb.ulcy < sb.cb_origin_y {
                return Err(AnalysisError::PartitionOriginAfterSubband(
                    sb.cb_origin_x,
                    sb.cb_origin_y,
                    sb.ulcx,
                    sb.ulcy,
                ));
            }
            sb.num_cb_x = grid_count(sb.ulcx - sb.cb_origin_x, sb.w, sb.nominal_cblk_w);
            sb.num_cb_y = grid_count(sb.ulcy - sb.cb_origin_y, sb.h, sb.nominal_cblk_h);
        }
        debug!(
            levels = self.levels,
            nodes = self.nodes.len(),
            code_blocks = self.nodes.iter().map(Subband::num_code_blocks).sum::<usize>(),
            "subband tree initialized"
        );
        Ok(())
    }

    /// Tile-local bounds of code-block `(n, m)` of leaf `idx`.
    ///
    /// The first and last blocks along each axis are clipped to the subband.
    pub fn code_block_rect(&self, idx: usize, n: u32, m: u32) -> Rect {
        let sb = &self.nodes[idx];
        let (x, w) = block_span(sb.ulx, sb.w, sb.ulcx - sb.cb_origin_x, sb.nominal_cblk_w, n, sb.num_cb_x);
        let (y, h) = block_span(sb.uly, sb.h, sb.ulcy - sb.cb_origin_y, sb.nominal_cblk_h, m, sb.num_cb_y);
        Rect::new(x, y, w, h)
    }

    pub fn code_block_info(&self, idx: usize, n: u32, m: u32) -> CodeBlockInfo {
        let sb = &self.nodes[idx];
        CodeBlockInfo {
            subband: idx,
            orientation: sb.orientation,
            level: sb.level,
            resolution: sb.resolution,
            n,
            m,
            rect: self.code_block_rect(idx, n, m),
        }
    }

    /// Code-blocks of leaf `idx` in row-major order.
    pub fn code_blocks(&self, idx: usize) -> impl Iterator<Item = CodeBlockInfo> + '_ {
        let sb = &self.nodes[idx];
        (0..sb.num_cb_y).flat_map(move |m| (0..sb.num_cb_x).map(move |n| self.code_block_info(idx, n, m)))
    }
}

/// Number of partition cells of size `nom` touched by `[off, off + len)`.
///
/// The divisor is added to the dividend before dividing so no operand goes
/// negative.
fn grid_count(off: u32, len: u32, nom: u32) -> u32 {
    let tmp = off + nom;
    (tmp + len - 1) / nom - (tmp / nom - 1)
}

/// Start and length of block `k` along one axis.
fn block_span(ul: u32, len: u32, off: u32, nom: u32, k: u32, count: u32) -> (u32, u32) {
    let first = (off + nom) / nom - 1;
    let start = if k == 0 { ul } else { (first + k) * nom + ul - off };
    let end = if k + 1 < count { (first + k + 1) * nom + ul - off } else { ul + len };
    (start, end - start)
}
