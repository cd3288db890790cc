//! Per-tile analysis state: [`TileContext`] and the subband trees and ROI
//! masks cached for the tile.

use std::sync::Arc;

use super::component_transform::TransformMode;
use super::image::Rect;
use super::roi::TileRoiMask;
use super::subband::SubbandTree;
use super::tiler::TileGeometry;
use crate::error::{AnalysisError, Result};

/// State scoped to the tile being analyzed.
///
/// Everything derived from a tile lives here: the selected component
/// transform, the bit depths it produces, the subband trees and the ROI mask
/// caches. Moving to another tile means building a new context, which drops
/// all of it. Independent contexts can be processed on different threads.
#[derive(Debug, Clone)]
pub struct TileContext {
    geometry: TileGeometry,
    transform: TransformMode,
    /// Bit depths after the component transform, empty until prepared.
    transformed_depths: Vec<u32>,
    trees: Vec<Option<Arc<SubbandTree>>>,
    roi_masks: Vec<Option<TileRoiMask>>,
}

impl TileContext {
    pub fn new(geometry: TileGeometry) -> Self {
        let n = geometry.components.len();
        Self {
            geometry,
            transform: TransformMode::None,
            transformed_depths: Vec::new(),
            trees: vec![None; n],
            roi_masks: vec![None; n],
        }
    }

    pub fn index(&self) -> usize {
        self.geometry.index
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn num_components(&self) -> usize {
        self.geometry.components.len()
    }

    /// Tile-component bounds in component coordinates.
    pub fn component_rect(&self, c: usize) -> Result<Rect> {
        self.geometry
            .components
            .get(c)
            .copied()
            .ok_or(AnalysisError::ComponentOutOfRange(c, self.num_components()))
    }

    pub fn transform(&self) -> TransformMode {
        self.transform
    }

    /// Bit depth of component `c` after the component transform, once the
    /// tile has been prepared.
    pub fn transformed_depth(&self, c: usize) -> Option<u32> {
        self.transformed_depths.get(c).copied()
    }

    pub(crate) fn set_transform(&mut self, mode: TransformMode, depths: Vec<u32>) {
        self.transform = mode;
        self.transformed_depths = depths;
    }

    /// Subband tree of component `c`, if it has been built for this tile.
    pub fn subband_tree(&self, c: usize) -> Option<&Arc<SubbandTree>> {
        self.trees.get(c).and_then(Option::as_ref)
    }

    pub(crate) fn store_subband_tree(&mut self, c: usize, tree: Arc<SubbandTree>) {
        if let Some(slot) = self.trees.get_mut(c) {
            *slot = Some(tree);
        }
    }

    pub(crate) fn roi_mask(&self, c: usize) -> Option<&TileRoiMask> {
        self.roi_masks.get(c).and_then(Option::as_ref)
    }

    pub(crate) fn store_roi_mask(&mut self, c: usize, mask: TileRoiMask) {
        if let Some(slot) = self.roi_masks.get_mut(c) {
            *slot = Some(mask);
        }
    }
}
