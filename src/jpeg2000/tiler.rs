//! Canvas tiling and the pixel source interface.
//!
//! The image area and the tile partition both live on the reference grid.
//! Component `c` with subsampling `(dx, dy)` sees the canvas point `(x, y)` at
//! `(ceil(x / dx), ceil(y / dy))`; every rectangle handed out here is in those
//! per-component coordinates.

use super::image::{ComponentInfo, DataBlk, Rect, Samples};
use super::tile::TileContext;
use crate::constants::MAX_BIT_DEPTH;
use crate::error::{AnalysisError, Result};

/// Geometry of one tile: its canvas rectangle and one rectangle per component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGeometry {
    pub index: usize,
    /// Tile bounds on the reference grid.
    pub canvas: Rect,
    /// Tile-component bounds in component coordinates.
    pub components: Vec<Rect>,
}

/// Tile partition of an image area on the reference grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiler {
    image: Rect,
    tile_origin: (u32, u32),
    tile_size: (u32, u32),
    tiles_x: u32,
    tiles_y: u32,
}

impl Tiler {
    /// Creates a tiling. The first tile must contain the image origin.
    pub fn new(image: Rect, tile_origin: (u32, u32), tile_size: (u32, u32)) -> Result<Self> {
        let (px, py) = tile_origin;
        let (tw, th) = tile_size;
        if image.is_empty() {
            return Err(AnalysisError::InvalidTiling("image area is empty"));
        }
        if tw == 0 || th == 0 {
            return Err(AnalysisError::InvalidTiling("tile size is zero"));
        }
        if px > image.x || py > image.y {
            return Err(AnalysisError::InvalidTiling("tile origin lies right of or below the image origin"));
        }
        if px + tw <= image.x || py + th <= image.y {
            return Err(AnalysisError::InvalidTiling("first tile does not intersect the image"));
        }
        Ok(Self {
            image,
            tile_origin,
            tile_size,
            tiles_x: (image.right() - px).div_ceil(tw),
            tiles_y: (image.bottom() - py).div_ceil(th),
        })
    }

    /// A single tile covering the whole image.
    pub fn single_tile(image: Rect) -> Result<Self> {
        Self::new(image, (image.x, image.y), (image.width, image.height))
    }

    pub fn image(&self) -> Rect {
        self.image
    }

    pub fn num_tiles(&self) -> usize {
        (self.tiles_x * self.tiles_y) as usize
    }

    /// Tiles per row and per column.
    pub fn grid(&self) -> (u32, u32) {
        (self.tiles_x, self.tiles_y)
    }

    pub fn tile_rect(&self, tile: usize) -> Result<Rect> {
        if tile >= self.num_tiles() {
            return Err(AnalysisError::TileOutOfRange(tile, self.num_tiles()));
        }
        let p = tile as u32 % self.tiles_x;
        let q = tile as u32 / self.tiles_x;
        let (px, py) = self.tile_origin;
        let (tw, th) = self.tile_size;
        let x0 = (px + p * tw).max(self.image.x);
        let y0 = (py + q * th).max(self.image.y);
        let x1 = (px + (p + 1) * tw).min(self.image.right());
        let y1 = (py + (q + 1) * th).min(self.image.bottom());
        Ok(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn tile_geometry(&self, tile: usize, components: &[ComponentInfo]) -> Result<TileGeometry> {
        let canvas = self.tile_rect(tile)?;
        Ok(TileGeometry {
            index: tile,
            canvas,
            components: components.iter().map(|info| project(canvas, info)).collect(),
        })
    }

    /// Whole-image bounds of a component in its own coordinates.
    pub fn component_rect(&self, info: &ComponentInfo) -> Rect {
        project(self.image, info)
    }
}

fn project(r: Rect, info: &ComponentInfo) -> Rect {
    let (dx, dy) = (info.dx.max(1) as u32, info.dy.max(1) as u32);
    let x0 = r.x.div_ceil(dx);
    let y0 = r.y.div_ceil(dy);
    Rect::new(x0, y0, r.right().div_ceil(dx) - x0, r.bottom().div_ceil(dy) - y0)
}

/// Checks that component `component` has a bit depth JPEG 2000 can carry.
pub fn check_bit_depth(component: usize, depth: u32) -> Result<()> {
    if depth == 0 || depth > MAX_BIT_DEPTH {
        return Err(AnalysisError::InvalidBitDepth { component, depth });
    }
    Ok(())
}

/// Checks the fractional bit count reported for component `component`.
pub fn check_fixed_point(component: usize, bits: u32) -> Result<()> {
    if bits > MAX_BIT_DEPTH {
        return Err(AnalysisError::InvalidFixedPoint { component, bits });
    }
    Ok(())
}

/// Supplier of tile-component samples.
///
/// Windows are requested in tile-local coordinates of the tile described by
/// `ctx` and may be as small as a single row.
pub trait ImageSource {
    fn num_components(&self) -> usize;

    fn num_tiles(&self) -> usize;

    /// Nominal bit depth of component `c` in the given tile.
    fn nominal_range_bits(&self, ctx: &TileContext, c: usize) -> u32;

    /// Number of fractional bits of fixed-point samples; 0 for plain integers.
    fn fixed_point(&self, _ctx: &TileContext, _c: usize) -> u32 {
        0
    }

    /// Whole-image bounds of component `c` in its own coordinates.
    fn component_rect(&self, c: usize) -> Result<Rect>;

    fn tile_geometry(&self, tile: usize) -> Result<TileGeometry>;

    fn read_window(&mut self, ctx: &TileContext, c: usize, window: Rect) -> Result<DataBlk>;
}

/// Fully buffered image with signed integer planes.
#[derive(Debug, Clone)]
pub struct RasterImage {
    tiler: Tiler,
    components: Vec<ComponentInfo>,
    planes: Vec<Vec<i32>>,
}

impl RasterImage {
    /// Wraps one plane per component, each covering the component's whole image area.
    pub fn new(tiler: Tiler, components: Vec<ComponentInfo>, planes: Vec<Vec<i32>>) -> Result<Self> {
        if components.len() != planes.len() || components.is_empty() {
            return Err(AnalysisError::DataLengthMismatch {
                expected: components.len(),
                found: planes.len(),
            });
        }
        for (c, (info, plane)) in components.iter().zip(&planes).enumerate() {
            check_bit_depth(c, info.depth.into())?;
            let expected = tiler.component_rect(info).area();
            if plane.len() != expected {
                return Err(AnalysisError::DataLengthMismatch {
                    expected,
                    found: plane.len(),
                });
            }
        }
        Ok(Self {
            tiler,
            components,
            planes,
        })
    }

    /// Builds an image from interleaved unsigned 8-bit samples, removing the
    /// DC offset so samples are centered on zero.
    pub fn from_interleaved_u8(tiler: Tiler, component_count: usize, pixels: &[u8]) -> Result<Self> {
        let area = tiler.image().area();
        if component_count == 0 || pixels.len() != area * component_count {
            return Err(AnalysisError::DataLengthMismatch {
                expected: area * component_count,
                found: pixels.len(),
            });
        }
        let planes = (0..component_count)
            .map(|c| {
                pixels
                    .iter()
                    .skip(c)
                    .step_by(component_count)
                    .map(|&v| v as i32 - 128)
                    .collect()
            })
            .collect();
        Self::new(tiler, vec![ComponentInfo::default(); component_count], planes)
    }

    pub fn tiler(&self) -> &Tiler {
        &self.tiler
    }

    pub fn component_info(&self, c: usize) -> Option<&ComponentInfo> {
        self.components.get(c)
    }
}

impl ImageSource for RasterImage {
    fn num_components(&self) -> usize {
        self.components.len()
    }

    fn num_tiles(&self) -> usize {
        self.tiler.num_tiles()
    }

    fn nominal_range_bits(&self, _ctx: &TileContext, c: usize) -> u32 {
        self.components.get(c).map_or(0, |info| info.depth as u32)
    }

    fn component_rect(&self, c: usize) -> Result<Rect> {
        self.components
            .get(c)
            .map(|info| self.tiler.component_rect(info))
            .ok_or(AnalysisError::ComponentOutOfRange(c, self.components.len()))
    }

    fn tile_geometry(&self, tile: usize) -> Result<TileGeometry> {
        self.tiler.tile_geometry(tile, &self.components)
    }

    fn read_window(&mut self, ctx: &TileContext, c: usize, window: Rect) -> Result<DataBlk> {
        let tile = ctx.component_rect(c)?;
        let image = self.component_rect(c)?;
        if window.right() > tile.width || window.bottom() > tile.height {
            return Err(AnalysisError::WindowOutOfBounds {
                x: window.x,
                y: window.y,
                w: window.width,
                h: window.height,
            });
        }

        let plane = &self.planes[c];
        let stride = image.width as usize;
        let x0 = (tile.x - image.x + window.x) as usize;
        let y0 = (tile.y - image.y + window.y) as usize;
        let mut data = Vec::with_capacity(window.area());
        for row in y0..y0 + window.height as usize {
            let start = row * stride + x0;
            data.extend_from_slice(&plane[start..start + window.width as usize]);
        }
        DataBlk::new(window, Samples::Int(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_partition() {
        let tiler = Tiler::new(Rect::new(10, 5, 100, 60), (0, 0), (64, 32)).unwrap();
        assert_eq!(tiler.grid(), (2, 3));
        assert_eq!(tiler.num_tiles(), 6);
        assert_eq!(tiler.tile_rect(0).unwrap(), Rect::new(10, 5, 54, 27));
        assert_eq!(tiler.tile_rect(1).unwrap(), Rect::new(64, 5, 46, 27));
        assert_eq!(tiler.tile_rect(3).unwrap(), Rect::new(64, 32, 46, 32));
        assert_eq!(tiler.tile_rect(5).unwrap(), Rect::new(64, 64, 46, 1));
        assert!(tiler.tile_rect(6).is_err());
    }

    #[test]
    fn test_invalid_tiling() {
        assert!(Tiler::new(Rect::new(0, 0, 10, 10), (1, 0), (4, 4)).is_err());
        assert!(Tiler::new(Rect::new(8, 0, 10, 10), (0, 0), (4, 4)).is_err());
        assert!(Tiler::new(Rect::new(0, 0, 0, 10), (0, 0), (4, 4)).is_err());
    }

    #[test]
    fn test_subsampled_component_rect() {
        let tiler = Tiler::single_tile(Rect::new(1, 0, 9, 4)).unwrap();
        let info = ComponentInfo {
            dx: 2,
            dy: 2,
            ..Default::default()
        };
        // ceil(1/2) = 1, ceil(10/2) = 5
        assert_eq!(tiler.component_rect(&info), Rect::new(1, 0, 4, 2));
    }

    #[test]
    fn test_read_window_per_tile() {
        let tiler = Tiler::new(Rect::new(0, 0, 4, 4), (0, 0), (2, 2)).unwrap();
        let plane: Vec<i32> = (0..16).collect();
        let mut image = RasterImage::new(tiler, vec![ComponentInfo::default()], vec![plane]).unwrap();

        let ctx = TileContext::new(image.tile_geometry(3).unwrap());
        let blk = image.read_window(&ctx, 0, Rect::new(0, 1, 2, 1)).unwrap();
        assert_eq!(blk.data, Samples::Int(vec![14, 15]));
        assert!(image.read_window(&ctx, 0, Rect::new(1, 1, 2, 1)).is_err());
    }

    #[test]
    fn test_unsupported_bit_depth_is_rejected() {
        let tiler = Tiler::single_tile(Rect::new(0, 0, 2, 2)).unwrap();
        let planes = || vec![vec![0; 4]; 3];
        let with_depth = |depth| {
            let mut infos = vec![ComponentInfo::default(); 3];
            infos[1].depth = depth;
            infos
        };

        assert_eq!(
            RasterImage::new(tiler.clone(), with_depth(64), planes()).unwrap_err(),
            AnalysisError::InvalidBitDepth { component: 1, depth: 64 }
        );
        assert_eq!(
            RasterImage::new(tiler.clone(), with_depth(0), planes()).unwrap_err(),
            AnalysisError::InvalidBitDepth { component: 1, depth: 0 }
        );
        assert!(RasterImage::new(tiler, with_depth(38), planes()).is_ok());
        assert!(check_fixed_point(0, 38).is_ok());
        assert!(check_fixed_point(0, 39).is_err());
    }

    #[test]
    fn test_interleaved_level_shift() {
        let tiler = Tiler::single_tile(Rect::new(0, 0, 2, 1)).unwrap();
        let mut image = RasterImage::from_interleaved_u8(tiler, 3, &[0, 128, 255, 10, 20, 30]).unwrap();
        let ctx = TileContext::new(image.tile_geometry(0).unwrap());
        let g = image.read_window(&ctx, 1, Rect::new(0, 0, 2, 1)).unwrap();
        assert_eq!(g.data, Samples::Int(vec![0, -108]));
        assert_eq!(image.nominal_range_bits(&ctx, 2), 8);
    }
}
