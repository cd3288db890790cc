//! Forward wavelet analysis of a tile-component.
//!
//! The tile-component plane is loaded row by row from the pixel source into
//! one buffer and decomposed in place: each decomposed node is filtered
//! vertically then horizontally, and the low and high outputs of each line are
//! regrouped so the four children land at their subband offsets. The filter
//! phase of every line comes from the parity of the node's reference-grid
//! origin, never from its position in the tile.

use std::sync::Arc;

use tracing::{debug, trace};

use super::config::EncoderConfig;
use super::dwt::{Dwt53, Dwt97, low_count};
use super::image::{CodeBlock, CodeBlockInfo, CodeBlockView, Rect, Samples};
use super::subband::{Subband, SubbandTree};
use super::tile::TileContext;
use super::tiler::{ImageSource, check_fixed_point};
use crate::error::Result;

/// A fully decomposed tile-component.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub tree: Arc<SubbandTree>,
    /// Coefficients laid out like the tile-component, stride equal to its width.
    pub data: Samples,
}

impl Decomposition {
    pub fn stride(&self) -> usize {
        self.tree.root().w as usize
    }
}

/// Wavelet analysis engine.
///
/// Holds the line buffers used by the 1D passes so they are reused from one
/// tile-component to the next.
#[derive(Debug)]
pub struct ForwardWavelet {
    config: Arc<EncoderConfig>,
    int_line: Vec<i32>,
    int_tmp: Vec<i32>,
    float_line: Vec<f32>,
    float_tmp: Vec<f32>,
}

impl ForwardWavelet {
    pub fn new(config: Arc<EncoderConfig>) -> Self {
        Self {
            config,
            int_line: Vec::new(),
            int_tmp: Vec::new(),
            float_line: Vec::new(),
            float_tmp: Vec::new(),
        }
    }

    pub fn config(&self) -> &Arc<EncoderConfig> {
        &self.config
    }

    /// Subband tree of component `c` in the tile of `ctx`, built with its
    /// code-block grid on first use and cached in the context.
    pub fn subband_tree(&self, ctx: &mut TileContext, c: usize) -> Result<Arc<SubbandTree>> {
        if let Some(tree) = ctx.subband_tree(c) {
            return Ok(Arc::clone(tree));
        }
        let tile = ctx.index();
        let rect = ctx.component_rect(c)?;
        let levels = self.config.decomposition_levels(tile, c)?;
        let filter = self.config.filter(tile, c)?;

        let mut tree = SubbandTree::new(rect.width, rect.height, rect.x, rect.y, levels, filter);
        tree.init_code_blocks(
            self.config.code_block_size(tile, c)?,
            self.config.precincts(tile, c)?,
            self.config.partition_origin(),
        )?;
        debug!(tile, component = c, levels, %filter, ?rect, "subband tree built");

        let tree = Arc::new(tree);
        ctx.store_subband_tree(c, Arc::clone(&tree));
        Ok(tree)
    }

    /// Loads component `c` of the current tile and decomposes it.
    ///
    /// The buffer holds integers for the w5x3 filter and floats for w9x7;
    /// samples are converted on load when the source supplies the other kind.
    pub fn decompose<S: ImageSource>(
        &mut self,
        source: &mut S,
        ctx: &mut TileContext,
        c: usize,
    ) -> Result<Decomposition> {
        let tree = self.subband_tree(ctx, c)?;
        let filter = self.config.filter(ctx.index(), c)?;
        let (w, h) = (tree.root().w, tree.root().h);
        let area = w as usize * h as usize;

        let mut data = if filter.is_reversible() {
            Samples::Int(Vec::with_capacity(area))
        } else {
            Samples::Float(Vec::with_capacity(area))
        };
        let fixed_point = source.fixed_point(ctx, c);
        check_fixed_point(c, fixed_point)?;
        for row in 0..h {
            let line = source.read_window(ctx, c, Rect::new(0, row, w, 1))?.data;
            match &mut data {
                Samples::Int(dst) => dst.extend(line.into_int()),
                Samples::Float(dst) => dst.extend(line.into_real(fixed_point)),
            }
        }

        let stride = w as usize;
        match &mut data {
            Samples::Int(buf) => {
                analyze(&tree, buf, stride, &mut self.int_line, &mut self.int_tmp, Dwt53::forward)
            }
            Samples::Float(buf) => {
                analyze(&tree, buf, stride, &mut self.float_line, &mut self.float_tmp, Dwt97::forward)
            }
        }
        trace!(tile = ctx.index(), component = c, samples = area, "tile-component decomposed");

        Ok(Decomposition { tree, data })
    }

    /// Decomposes component `c` and returns an enumerator over its code-blocks.
    pub fn code_blocks<S: ImageSource>(
        &mut self,
        source: &mut S,
        ctx: &mut TileContext,
        c: usize,
    ) -> Result<CodeBlockEnumerator> {
        let decomposition = self.decompose(source, ctx, c)?;
        Ok(CodeBlockEnumerator::new(decomposition))
    }
}

/// Runs the forward transform down the LL chain of `tree`.
fn analyze<T: Copy + Default>(
    tree: &SubbandTree,
    buf: &mut [T],
    stride: usize,
    line: &mut Vec<T>,
    tmp: &mut Vec<T>,
    forward: fn(&mut [T], bool),
) {
    let mut idx = SubbandTree::ROOT;
    while let Some(children) = tree.children(idx) {
        let sb = tree.node(idx);
        if sb.w > 0 && sb.h > 0 {
            let (x0, y0, w, h) = (sb.ulx as usize, sb.uly as usize, sb.w as usize, sb.h as usize);

            let high_first = sb.ulcy % 2 == 1;
            let lows = low_count(sb.ulcy, sb.h) as usize;
            for x in x0..x0 + w {
                line.clear();
                line.extend((y0..y0 + h).map(|y| buf[y * stride + x]));
                forward(line.as_mut_slice(), high_first);
                deinterleave(line, tmp, lows, high_first);
                for (j, &v) in tmp.iter().enumerate() {
                    buf[(y0 + j) * stride + x] = v;
                }
            }

            let high_first = sb.ulcx % 2 == 1;
            let lows = low_count(sb.ulcx, sb.w) as usize;
            for y in y0..y0 + h {
                let row = &mut buf[y * stride + x0..y * stride + x0 + w];
                line.clear();
                line.extend_from_slice(row);
                forward(line.as_mut_slice(), high_first);
                deinterleave(line, tmp, lows, high_first);
                row.copy_from_slice(tmp);
            }
        }
        idx = children[0];
    }
}

/// Inverts [`Decomposition`]'s transform in place, restoring the tile-component.
pub fn synthesize(decomposition: &mut Decomposition) {
    let stride = decomposition.stride();
    let tree = Arc::clone(&decomposition.tree);
    match &mut decomposition.data {
        Samples::Int(buf) => synthesize_lines(&tree, buf, stride, Dwt53::inverse),
        Samples::Float(buf) => synthesize_lines(&tree, buf, stride, Dwt97::inverse),
    }
}

fn synthesize_lines<T: Copy + Default>(tree: &SubbandTree, buf: &mut [T], stride: usize, inverse: fn(&mut [T], bool)) {
    let mut chain = Vec::new();
    let mut idx = SubbandTree::ROOT;
    while let Some(children) = tree.children(idx) {
        chain.push(idx);
        idx = children[0];
    }

    let mut line = Vec::new();
    let mut packed = Vec::new();
    for &idx in chain.iter().rev() {
        let sb: &Subband = tree.node(idx);
        if sb.w == 0 || sb.h == 0 {
            continue;
        }
        let (x0, y0, w, h) = (sb.ulx as usize, sb.uly as usize, sb.w as usize, sb.h as usize);

        let high_first = sb.ulcx % 2 == 1;
        let lows = low_count(sb.ulcx, sb.w) as usize;
        for y in y0..y0 + h {
            let row = &mut buf[y * stride + x0..y * stride + x0 + w];
            packed.clear();
            packed.extend_from_slice(row);
            interleave(&packed, &mut line, lows, high_first);
            inverse(line.as_mut_slice(), high_first);
            row.copy_from_slice(&line);
        }

        let high_first = sb.ulcy % 2 == 1;
        let lows = low_count(sb.ulcy, sb.h) as usize;
        for x in x0..x0 + w {
            packed.clear();
            packed.extend((y0..y0 + h).map(|y| buf[y * stride + x]));
            interleave(&packed, &mut line, lows, high_first);
            inverse(line.as_mut_slice(), high_first);
            for (j, &v) in line.iter().enumerate() {
                buf[(y0 + j) * stride + x] = v;
            }
        }
    }
}

/// Whether interleaved position `i` holds a high-pass sample.
fn is_high(i: usize, high_first: bool) -> bool {
    (i % 2 == 1) != high_first
}

/// Moves low-pass samples to the front of `out` and high-pass samples after them.
fn deinterleave<T: Copy + Default>(line: &[T], out: &mut Vec<T>, lows: usize, high_first: bool) {
    out.clear();
    out.resize(line.len(), T::default());
    for (i, &v) in line.iter().enumerate() {
        let k = i / 2;
        out[if is_high(i, high_first) { lows + k } else { k }] = v;
    }
}

fn interleave<T: Copy + Default>(packed: &[T], out: &mut Vec<T>, lows: usize, high_first: bool) {
    out.clear();
    out.extend((0..packed.len()).map(|i| {
        let k = i / 2;
        packed[if is_high(i, high_first) { lows + k } else { k }]
    }));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    leaf: usize,
    n: u32,
    m: u32,
}

/// Pull-based enumerator over the code-blocks of a decomposed tile-component.
///
/// Code-blocks come leaf by leaf in [`SubbandTree::next_leaf`] order and
/// row-major inside a leaf. The decomposed buffer is owned by the enumerator:
/// [`next_block`](Self::next_block) releases it as soon as the last block has
/// been copied out, [`next_view`](Self::next_view) on the call after the last
/// block since the final view still borrows it.
#[derive(Debug)]
pub struct CodeBlockEnumerator {
    tree: Arc<SubbandTree>,
    buffer: Option<Samples>,
    stride: usize,
    cursor: Option<Cursor>,
}

impl CodeBlockEnumerator {
    pub fn new(decomposition: Decomposition) -> Self {
        let stride = decomposition.stride();
        let tree = decomposition.tree;
        let cursor = next_filled_leaf(&tree, None).map(|leaf| Cursor { leaf, n: 0, m: 0 });
        Self {
            buffer: cursor.is_some().then_some(decomposition.data),
            tree,
            stride,
            cursor,
        }
    }

    pub fn tree(&self) -> &Arc<SubbandTree> {
        &self.tree
    }

    /// Whether the decomposed buffer is still held.
    pub fn holds_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// Next code-block as a window into the shared buffer.
    pub fn next_view(&mut self) -> Option<CodeBlockView<'_>> {
        let Some(cursor) = self.cursor else {
            self.buffer = None;
            return None;
        };
        self.cursor = self.advance(cursor);
        let info = self.tree.code_block_info(cursor.leaf, cursor.n, cursor.m);
        self.view(info)
    }

    /// Next code-block as an owned copy with stride equal to its width.
    pub fn next_block(&mut self) -> Option<CodeBlock> {
        let Some(cursor) = self.cursor else {
            self.buffer = None;
            return None;
        };
        self.cursor = self.advance(cursor);
        let info = self.tree.code_block_info(cursor.leaf, cursor.n, cursor.m);
        let block = self.view(info)?.to_owned_block();
        trace!(subband = info.subband, n = info.n, m = info.m, rect = ?info.rect, "code-block");
        if self.cursor.is_none() {
            self.buffer = None;
            trace!("last code-block produced, buffer released");
        }
        Some(block)
    }

    fn view(&self, info: CodeBlockInfo) -> Option<CodeBlockView<'_>> {
        let buffer = self.buffer.as_ref()?;
        Some(CodeBlockView {
            info,
            offset: info.rect.y as usize * self.stride + info.rect.x as usize,
            scanw: self.stride,
            data: buffer.as_slice(),
        })
    }

    fn advance(&self, cursor: Cursor) -> Option<Cursor> {
        let sb = self.tree.node(cursor.leaf);
        let Cursor { leaf, mut n, mut m } = cursor;
        n += 1;
        if n == sb.num_cb_x {
            n = 0;
            m += 1;
        }
        if m < sb.num_cb_y {
            return Some(Cursor { leaf, n, m });
        }
        next_filled_leaf(&self.tree, Some(leaf)).map(|leaf| Cursor { leaf, n: 0, m: 0 })
    }
}

impl Iterator for CodeBlockEnumerator {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<CodeBlock> {
        self.next_block()
    }
}

/// First leaf after `from` that has at least one code-block.
fn next_filled_leaf(tree: &SubbandTree, from: Option<usize>) -> Option<usize> {
    let mut idx = tree.next_leaf(from);
    while let Some(leaf) = idx {
        if tree.node(leaf).num_code_blocks() > 0 {
            return Some(leaf);
        }
        idx = tree.next_leaf(Some(leaf));
    }
    None
}
