use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::constants::MAX_BIT_DEPTH;
use crate::error::{AnalysisError, Result};

/// Orientation of a wavelet subband.
///
/// The discriminants are the orientation codes used for subband indexing
/// within a resolution level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SubbandOrientation {
    #[default]
    /// Low-Low (base image)
    LL = 0,
    /// High-Low (horizontal high-pass, vertical low-pass)
    HL = 1,
    /// Low-High (horizontal low-pass, vertical high-pass)
    LH = 2,
    /// High-High (diagonal details)
    HH = 3,
}

impl SubbandOrientation {
    /// True when the horizontal filtering that produced this band was high-pass.
    pub fn is_horizontal_high(self) -> bool {
        matches!(self, SubbandOrientation::HL | SubbandOrientation::HH)
    }

    /// True when the vertical filtering that produced this band was high-pass.
    pub fn is_vertical_high(self) -> bool {
        matches!(self, SubbandOrientation::LH | SubbandOrientation::HH)
    }
}

/// An axis-aligned rectangle of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True if `other` lies completely inside `self`.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x0 < x1 && y0 < y1).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Sample storage. Reversible paths carry integers, irreversible paths floats.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Int(v) => v.len(),
            Samples::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Samples::Float(_))
    }

    pub fn as_slice(&self) -> SampleSlice<'_> {
        match self {
            Samples::Int(v) => SampleSlice::Int(v),
            Samples::Float(v) => SampleSlice::Float(v),
        }
    }

    /// Converts to integers, rounding floats to the nearest value.
    pub fn into_int(self) -> Vec<i32> {
        match self {
            Samples::Int(v) => v,
            Samples::Float(v) => v.into_iter().map(|x| x.round() as i32).collect(),
        }
    }

    pub fn into_float(self) -> Vec<f32> {
        match self {
            Samples::Int(v) => v.into_iter().map(|x| x as f32).collect(),
            Samples::Float(v) => v,
        }
    }

    /// Converts to floats carrying real sample values, removing `fixed_point`
    /// fractional bits.
    pub fn into_real(self, fixed_point: u32) -> Vec<f32> {
        if fixed_point == 0 {
            return self.into_float();
        }
        let scale = 0.5f32.powi(fixed_point.min(MAX_BIT_DEPTH) as i32);
        match self {
            Samples::Int(v) => v.into_iter().map(|x| x as f32 * scale).collect(),
            Samples::Float(v) => v.into_iter().map(|x| x * scale).collect(),
        }
    }
}

/// Borrowed view of [`Samples`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleSlice<'a> {
    Int(&'a [i32]),
    Float(&'a [f32]),
}

/// A rectangular block of samples in tile-local coordinates, packed with
/// stride equal to its width.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlk {
    pub rect: Rect,
    pub data: Samples,
}

impl DataBlk {
    pub fn new(rect: Rect, data: Samples) -> Result<Self> {
        if data.len() != rect.area() {
            return Err(AnalysisError::DataLengthMismatch {
                expected: rect.area(),
                found: data.len(),
            });
        }
        Ok(Self { rect, data })
    }
}

/// Position of a code-block inside the subband tree of a tile-component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockInfo {
    /// Arena index of the owning subband in its [`SubbandTree`](super::subband::SubbandTree).
    pub subband: usize,
    pub orientation: SubbandOrientation,
    pub level: u32,
    pub resolution: u32,
    /// Column index in the subband's code-block grid.
    pub n: u32,
    /// Row index in the subband's code-block grid.
    pub m: u32,
    /// Tile-local bounds of the code-block.
    pub rect: Rect,
}

/// A code-block with an owned copy of its samples (stride equal to width).
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub info: CodeBlockInfo,
    pub data: Samples,
    /// Per-sample ROI magnitude bits, present when an ROI overlaps the block.
    pub roi_mask: Option<Vec<i32>>,
}

impl CodeBlock {
    pub fn rect(&self) -> Rect {
        self.info.rect
    }

    pub fn orientation(&self) -> SubbandOrientation {
        self.info.orientation
    }

    pub fn resolution(&self) -> u32 {
        self.info.resolution
    }
}

/// A code-block borrowing its samples from the decomposed tile-component buffer.
///
/// Sample `(i, j)` of the block is `data[offset + j * scanw + i]`.
#[derive(Debug, Clone, Copy)]
pub struct CodeBlockView<'a> {
    pub info: CodeBlockInfo,
    pub offset: usize,
    pub scanw: usize,
    pub data: SampleSlice<'a>,
}

impl CodeBlockView<'_> {
    /// Copies the window out into a [`CodeBlock`].
    pub fn to_owned_block(&self) -> CodeBlock {
        let w = self.info.rect.width as usize;
        let h = self.info.rect.height as usize;
        let data = match self.data {
            SampleSlice::Int(src) => Samples::Int(copy_window(src, self.offset, self.scanw, w, h)),
            SampleSlice::Float(src) => {
                Samples::Float(copy_window(src, self.offset, self.scanw, w, h))
            }
        };
        CodeBlock {
            info: self.info,
            data,
            roi_mask: None,
        }
    }
}

pub(crate) fn copy_window<T: Copy>(src: &[T], offset: usize, scanw: usize, w: usize, h: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(w * h);
    for row in 0..h {
        let start = offset + row * scanw;
        out.extend_from_slice(&src[start..start + w]);
    }
    out
}

/// Metadata for a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// bit depth (e.g. 8, 12, 16)
    pub depth: u8,
    /// true if signed, false if unsigned
    pub is_signed: bool,
    /// Horizontal subsampling factor
    pub dx: u8,
    /// Vertical subsampling factor
    pub dy: u8,
}

impl Default for ComponentInfo {
    fn default() -> Self {
        Self {
            depth: 8,
            is_signed: false,
            dx: 1,
            dy: 1,
        }
    }
}
