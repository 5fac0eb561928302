use rand::Rng;
use thiserror::Error;

use super::layer::{Layer, Mode, ParamGrad, Shape};
use super::param::Param;
use crate::error::Result;
use crate::math::Matrix;

/// Padding scheme for [`Conv2d`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Padding {
    /// No padding; the output shrinks by `kernel - 1`.
    Valid,
    /// Zero padding so that `out = ceil(in / stride)`. For even kernels the
    /// extra row/column goes after the input (bottom/right).
    Same,
}

impl Padding {
    /// Returns `(pad_before, output_size)` for one spatial axis.
    fn resolve(self, input: usize, kernel: usize, stride: usize) -> Option<(usize, usize)> {
        match self {
            Padding::Valid => {
                if input < kernel {
                    return None;
                }
                Some((0, (input - kernel) / stride + 1))
            }
            Padding::Same => {
                let out = input.div_ceil(stride);
                let total = (out.saturating_sub(1) * stride + kernel).saturating_sub(input);
                Some((total / 2, out))
            }
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConvError {
    #[error("Input feature count {features} is not divisible by in_channels {in_channels}")]
    ChannelMismatch { features: usize, in_channels: usize },
    #[error("Input spatial size {size} is not a perfect square")]
    NonSquareInput { size: usize },
    #[error("Input side {side} is smaller than kernel {kernel}")]
    KernelTooLarge { side: usize, kernel: usize },
}

/// 2D convolution layer using im2col and a dense weight matrix.
///
/// Inputs are square feature maps with shape
/// `(batch, in_channels * height * width)`, channel-major. The weight matrix
/// has shape `(in_channels * kernel * kernel, out_channels)` so a convolution
/// is one matrix product over the unfolded patches.
pub struct Conv2d {
    pub w: Param,
    pub b: Param,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: Padding,
    // Cached from the last forward pass for backward.
    last_cols: Matrix,
    last_geometry: Geometry,
}

#[derive(Clone, Copy, Debug, Default)]
struct Geometry {
    batch: usize,
    in_side: usize,
    out_side: usize,
    pad: usize,
}

impl Conv2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: Padding,
        rng: &mut impl Rng,
    ) -> Self {
        let patch = in_channels * kernel_size * kernel_size;
        let fan_out = out_channels * kernel_size * kernel_size;
        Self {
            w: Param::glorot(patch, out_channels, patch, fan_out, rng),
            b: Param::zeros(1, out_channels),
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            last_cols: Matrix::zeros(0, 0),
            last_geometry: Geometry::default(),
        }
    }

    fn geometry(&self, x: &Matrix) -> std::result::Result<Geometry, ConvError> {
        if x.cols % self.in_channels != 0 {
            return Err(ConvError::ChannelMismatch {
                features: x.cols,
                in_channels: self.in_channels,
            });
        }
        let in_hw = x.cols / self.in_channels;
        let side = (in_hw as f64).sqrt().round() as usize;
        if side * side != in_hw {
            return Err(ConvError::NonSquareInput { size: in_hw });
        }
        let (pad, out_side) = self
            .padding
            .resolve(side, self.kernel_size, self.stride)
            .ok_or(ConvError::KernelTooLarge {
                side,
                kernel: self.kernel_size,
            })?;
        Ok(Geometry {
            batch: x.rows,
            in_side: side,
            out_side,
            pad,
        })
    }

    /// Visit every (patch row, patch column, input index) triple that lies
    /// inside the input. Padding positions are skipped.
    fn for_each_tap(&self, g: Geometry, mut f: impl FnMut(usize, usize, usize)) {
        let k = self.kernel_size;
        let in_plane = g.in_side * g.in_side;
        let in_len = self.in_channels * in_plane;
        let mut row = 0;
        for b in 0..g.batch {
            for oh in 0..g.out_side {
                for ow in 0..g.out_side {
                    let mut col = 0;
                    for ic in 0..self.in_channels {
                        for kh in 0..k {
                            for kw in 0..k {
                                let ih = (oh * self.stride + kh) as isize - g.pad as isize;
                                let iw = (ow * self.stride + kw) as isize - g.pad as isize;
                                if ih >= 0
                                    && iw >= 0
                                    && (ih as usize) < g.in_side
                                    && (iw as usize) < g.in_side
                                {
                                    let idx = b * in_len
                                        + ic * in_plane
                                        + ih as usize * g.in_side
                                        + iw as usize;
                                    f(row, col, idx);
                                }
                                col += 1;
                            }
                        }
                    }
                    row += 1;
                }
            }
        }
    }

    fn im2col(&self, x: &Matrix, g: Geometry) -> Matrix {
        let patch = self.in_channels * self.kernel_size * self.kernel_size;
        let mut cols = Matrix::zeros(g.batch * g.out_side * g.out_side, patch);
        self.for_each_tap(g, |row, col, idx| {
            cols.data[row * patch + col] = x.data[idx];
        });
        cols
    }

    fn col2im(&self, cols: &Matrix, g: Geometry) -> Matrix {
        let patch = cols.cols;
        let mut img = Matrix::zeros(g.batch, self.in_channels * g.in_side * g.in_side);
        self.for_each_tap(g, |row, col, idx| {
            img.data[idx] += cols.data[row * patch + col];
        });
        img
    }

    /// `(batch * out_h * out_w, out_channels)` -> `(batch, out_channels * out_h * out_w)`.
    fn fold_output(&self, out_cols: &Matrix, g: Geometry) -> Matrix {
        let plane = g.out_side * g.out_side;
        let mut out = Matrix::zeros(g.batch, self.out_channels * plane);
        for b in 0..g.batch {
            for p in 0..plane {
                let src = out_cols.row(b * plane + p);
                for (oc, &v) in src.iter().enumerate() {
                    out.data[b * out.cols + oc * plane + p] = v;
                }
            }
        }
        out
    }

    fn unfold_grad(&self, grad_out: &Matrix, g: Geometry) -> Matrix {
        let plane = g.out_side * g.out_side;
        let mut grad_cols = Matrix::zeros(g.batch * plane, self.out_channels);
        for b in 0..g.batch {
            for p in 0..plane {
                for oc in 0..self.out_channels {
                    grad_cols.data[(b * plane + p) * self.out_channels + oc] =
                        grad_out.data[b * grad_out.cols + oc * plane + p];
                }
            }
        }
        grad_cols
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }
}

impl Layer for Conv2d {
    fn name(&self) -> &'static str {
        "Conv2D"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        if input.channels != self.in_channels {
            return Err(ConvError::ChannelMismatch {
                features: input.len(),
                in_channels: self.in_channels,
            }
            .into());
        }
        if input.height != input.width {
            return Err(ConvError::NonSquareInput {
                size: input.height * input.width,
            }
            .into());
        }
        let (_, out) = self
            .padding
            .resolve(input.height, self.kernel_size, self.stride)
            .ok_or(ConvError::KernelTooLarge {
                side: input.height,
                kernel: self.kernel_size,
            })?;
        Ok(Shape::new(self.out_channels, out, out))
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        let g = self.geometry(x)?;
        let cols = self.im2col(x, g);
        let mut out_cols = Matrix::matmul(&cols, &self.w.value);
        out_cols.add_row(&self.b.value);
        self.last_cols = cols;
        self.last_geometry = g;
        Ok(self.fold_output(&out_cols, g))
    }

    fn backward(&mut self, grad_out: &Matrix, param_grad: ParamGrad) -> Matrix {
        let g = self.last_geometry;
        let grad_cols = self.unfold_grad(grad_out, g);
        if param_grad == ParamGrad::Accumulate {
            let grad_w = Matrix::matmul(&self.last_cols.transpose(), &grad_cols);
            self.w.accumulate(&grad_w);
            self.b.accumulate(&grad_cols.sum_rows());
        }
        let grad_in_cols = Matrix::matmul(&grad_cols, &self.w.value.transpose());
        self.col2im(&grad_in_cols, g)
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.w, &mut self.b]
    }

    fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }
}
