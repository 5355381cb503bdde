// Copyright (c) Radzivon Bartoshyk. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
// 1.  Redistributions of source code must retain the above copyright notice, this
// list of conditions and the following disclaimer.
//
// 2.  Redistributions in binary form must reproduce the above copyright notice,
// this list of conditions and the following disclaimer in the documentation
// and/or other materials provided with the distribution.
//
// 3.  Neither the name of the copyright holder nor the names of its
// contributors may be used to endorse or promote products derived from
// this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::recursive_gaussian::coefficients::{RecursiveGaussian, MAX_UNROLL};
use crate::recursive_gaussian::ring_buffer::{RecursionRing, RING_BRANCHES};
use crate::recursive_gaussian::vector::IirVector;
use crate::unsafe_slice::UnsafeSlice;
use std::ops::Range;

/// Floats in one 64 byte cache line.
const CACHE_LINE_LANES: usize = 64 / size_of::<f32>();

/// Rows between a read and its prefetch in the interior.
const PREFETCH_ROWS: usize = 8;

/// Source and destination of a vertical pass, both single channel planes.
pub(crate) struct VerticalPlanes<'a> {
    pub(crate) src: &'a [f32],
    pub(crate) src_stride: usize,
    pub(crate) dst: UnsafeSlice<'a, f32>,
    pub(crate) dst_stride: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

/// Vectors per strip, a whole cache line but never less than four.
#[inline]
pub(crate) const fn vertical_unroll(lanes: usize) -> usize {
    let unroll = CACHE_LINE_LANES / lanes;
    if unroll > 4 {
        unroll
    } else {
        4
    }
}

/// Columns one full strip covers for a vector of `lanes`.
#[inline]
pub(crate) const fn vertical_group_width(lanes: usize) -> usize {
    vertical_unroll(lanes) * lanes
}

/// Scratch one worker needs: a zero row of group width and the ring buffer.
#[inline]
pub(crate) const fn vertical_scratch_len(lanes: usize) -> usize {
    let group = vertical_group_width(lanes);
    group + RecursionRing::required_len(group)
}

trait BlockInput {
    unsafe fn load<V: IirVector>(&self, offset: usize) -> V;
}

/// At the top and bottom only one neighbour exists, the pointer may be
/// the zero row.
struct SingleInput(*const f32);

impl BlockInput for SingleInput {
    #[inline(always)]
    unsafe fn load<V: IirVector>(&self, offset: usize) -> V {
        V::load(self.0.add(offset))
    }
}

/// Sum of the rows `N + 1` above and `N - 1` below.
struct TwoInputs(*const f32, *const f32);

impl BlockInput for TwoInputs {
    #[inline(always)]
    unsafe fn load<V: IirVector>(&self, offset: usize) -> V {
        V::add(V::load(self.0.add(offset)), V::load(self.1.add(offset)))
    }
}

trait BlockOutput {
    unsafe fn store<V: IirVector>(&self, value: V, offset: usize);
}

/// Warm-up rows only advance the recursion.
struct OutputNone;

impl BlockOutput for OutputNone {
    #[inline(always)]
    unsafe fn store<V: IirVector>(&self, _: V, _: usize) {}
}

struct OutputStore(*mut f32);

impl BlockOutput for OutputStore {
    #[inline(always)]
    unsafe fn store<V: IirVector>(&self, value: V, offset: usize) {
        value.store(self.0.add(offset));
    }
}

#[derive(Copy, Clone)]
struct StripCoefficients<V: IirVector> {
    n2: [V; RING_BRANCHES],
    d1: [V; RING_BRANCHES],
}

impl<V: IirVector> StripCoefficients<V> {
    #[inline(always)]
    unsafe fn new(rg: &RecursiveGaussian) -> Self {
        StripCoefficients {
            n2: [
                V::splat(rg.n2[0]),
                V::splat(rg.n2[MAX_UNROLL]),
                V::splat(rg.n2[2 * MAX_UNROLL]),
            ],
            d1: [
                V::splat(rg.d1[0]),
                V::splat(rg.d1[MAX_UNROLL]),
                V::splat(rg.d1[2 * MAX_UNROLL]),
            ],
        }
    }
}

/// Advances one row of `VECTORS` consecutive vectors.
#[inline(always)]
unsafe fn vertical_block<V: IirVector, const VECTORS: usize>(
    coeffs: &StripCoefficients<V>,
    input: impl BlockInput,
    ring: &mut RecursionRing,
    output: impl BlockOutput,
) {
    let current = [ring.offset(0, 0), ring.offset(1, 0), ring.offset(2, 0)];
    let back1 = [ring.offset(0, 1), ring.offset(1, 1), ring.offset(2, 1)];
    let back2 = [ring.offset(0, 2), ring.offset(1, 2), ring.offset(2, 2)];
    let storage = ring.as_mut_ptr();

    for idx in (0..VECTORS * V::LANES).step_by(V::LANES) {
        let sum = input.load::<V>(idx);
        let mut y = [V::zero(); RING_BRANCHES];
        for k in 0..RING_BRANCHES {
            let y_n1 = V::load(storage.add(back1[k] + idx));
            let y_n2 = V::load(storage.add(back2[k] + idx));
            y[k] = V::mul_add(coeffs.n2[k], sum, V::neg_mul_sub(coeffs.d1[k], y_n1, y_n2));
            y[k].store(storage.add(current[k] + idx));
        }
        output.store(V::add(y[0], V::add(y[1], y[2])), idx);
    }

    ring.advance();
}

/// Full top to bottom sweep over `VECTORS * V::LANES` columns starting at `x`.
#[inline(always)]
unsafe fn vertical_strip<V: IirVector, const VECTORS: usize>(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    x: usize,
    ring_storage: &mut [f32],
    zero: *const f32,
) {
    let coeffs = StripCoefficients::<V>::new(rg);
    let mut ring = RecursionRing::new(ring_storage, VECTORS * V::LANES);

    let radius = rg.radius;
    let height = planes.height;
    let src = planes.src.as_ptr();
    let dst = planes.dst.as_mut_ptr();
    let in_row = |y: usize| src.add(y * planes.src_stride + x);
    let out_row = |y: usize| dst.add(y * planes.dst_stride + x);
    let in_or_zero = |y: usize| if y < height { in_row(y) } else { zero };

    // Warm-up: top is out of bounds, bottom is usually in bounds
    for bottom in 0..radius.saturating_sub(1) {
        vertical_block::<V, VECTORS>(
            &coeffs,
            SingleInput(in_or_zero(bottom)),
            &mut ring,
            OutputNone,
        );
    }

    // Producing output, top is still out of bounds
    let mut n = 0usize;
    while n < (radius + 1).min(height) {
        let bottom = n + radius - 1;
        vertical_block::<V, VECTORS>(
            &coeffs,
            SingleInput(in_or_zero(bottom)),
            &mut ring,
            OutputStore(out_row(n)),
        );
        n += 1;
    }

    let interior_end = height as isize - radius as isize + 1 - PREFETCH_ROWS as isize;
    while (n as isize) < interior_end {
        let top = n - radius - 1;
        let bottom = n + radius - 1;
        vertical_block::<V, VECTORS>(
            &coeffs,
            TwoInputs(in_row(top), in_row(bottom)),
            &mut ring,
            OutputStore(out_row(n)),
        );
        V::prefetch(in_row(top + PREFETCH_ROWS));
        V::prefetch(in_row(bottom + PREFETCH_ROWS));
        n += 1;
    }

    // Bottom border with bounds checks
    while n < height {
        let top = n - radius - 1;
        let bottom = n + radius - 1;
        vertical_block::<V, VECTORS>(
            &coeffs,
            TwoInputs(in_row(top), in_or_zero(bottom)),
            &mut ring,
            OutputStore(out_row(n)),
        );
        n += 1;
    }
}

/// Blurs columns `columns` of `planes` vertically, outside rows are zero.
///
/// Full strips of [vertical_group_width] columns come first, then single
/// vectors, and the last few columns run one lane at a time so reads never
/// pass the row width.
///
/// # Safety
/// `V` must be supported by the running CPU and the caller must be compiled
/// with its target features. `planes` must describe valid planes, columns
/// must be within the width and no other thread may write the same columns.
/// `scratch` holds at least [vertical_scratch_len] items for `V::LANES`.
#[inline(always)]
pub(crate) unsafe fn filter_columns<V: IirVector>(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    debug_assert!(rg.radius >= 1);
    debug_assert!(columns.end <= planes.width);
    debug_assert!(
        planes.height == 0
            || planes.dst.len() >= (planes.height - 1) * planes.dst_stride + planes.width
    );
    let unroll = vertical_unroll(V::LANES);
    let fast_pace = unroll * V::LANES;
    let (zero, ring_storage) = scratch[..vertical_scratch_len(V::LANES)].split_at_mut(fast_pace);
    zero.fill(0.);
    let zero = zero.as_ptr();

    let mut x = columns.start;
    match unroll {
        4 => {
            while x + fast_pace <= columns.end {
                vertical_strip::<V, 4>(rg, planes, x, ring_storage, zero);
                x += fast_pace;
            }
        }
        8 => {
            while x + fast_pace <= columns.end {
                vertical_strip::<V, 8>(rg, planes, x, ring_storage, zero);
                x += fast_pace;
            }
        }
        16 => {
            while x + fast_pace <= columns.end {
                vertical_strip::<V, 16>(rg, planes, x, ring_storage, zero);
                x += fast_pace;
            }
        }
        _ => unreachable!("Unexpected vertical unroll {unroll}"),
    }
    while x + V::LANES <= columns.end {
        vertical_strip::<V, 1>(rg, planes, x, ring_storage, zero);
        x += V::LANES;
    }
    while x < columns.end {
        vertical_strip::<f32, 1>(rg, planes, x, ring_storage, zero);
        x += 1;
    }
}

/// Single lane rendition of [filter_columns], available on every target.
pub(crate) fn filter_columns_scalar(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    unsafe {
        filter_columns::<f32>(rg, planes, columns, scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recursive_gaussian::horizontal::tests::reference_row;

    fn blur_columns(sigma: f64, src: &[f32], width: usize, height: usize) -> Vec<f32> {
        let rg = RecursiveGaussian::new(sigma);
        let mut dst = vec![f32::NAN; width * height];
        let mut scratch = vec![0f32; vertical_scratch_len(1)];
        {
            let planes = VerticalPlanes {
                src,
                src_stride: width,
                dst: UnsafeSlice::new(&mut dst),
                dst_stride: width,
                width,
                height,
            };
            filter_columns_scalar(&rg, &planes, 0..width, &mut scratch);
        }
        dst
    }

    #[test]
    fn test_unroll_classes() {
        assert_eq!(vertical_unroll(1), 16);
        assert_eq!(vertical_unroll(4), 4);
        assert_eq!(vertical_unroll(8), 4);
        assert_eq!(vertical_group_width(8), 32);
        assert_eq!(vertical_scratch_len(4), 16 + 3 * 4 * 16);
    }

    #[test]
    fn test_columns_match_row_recursion() {
        for &sigma in &[0.6f64, 1.5, 3.0] {
            for &(width, height) in &[(1usize, 1usize), (3, 2), (17, 9), (33, 40), (5, 71)] {
                let src = (0..width * height)
                    .map(|i| ((i * 37 + 11) % 97) as f32 / 97.)
                    .collect::<Vec<f32>>();
                let dst = blur_columns(sigma, &src, width, height);
                for x in 0..width {
                    let column = (0..height).map(|y| src[y * width + x]).collect::<Vec<f32>>();
                    let expected = reference_row(sigma, &column);
                    for y in 0..height {
                        let value = dst[y * width + x];
                        assert!(
                            (value as f64 - expected[y]).abs() < 1e-4,
                            "Sigma {sigma}, {width}x{height} at ({x}, {y}): expected {} but it was {value}",
                            expected[y]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_columns_outside_range_are_untouched() {
        let rg = RecursiveGaussian::new(1.0);
        let (width, height) = (40usize, 12usize);
        let src = vec![1f32; width * height];
        let mut dst = vec![-1f32; width * height];
        let mut scratch = vec![0f32; vertical_scratch_len(1)];
        {
            let planes = VerticalPlanes {
                src: &src,
                src_stride: width,
                dst: UnsafeSlice::new(&mut dst),
                dst_stride: width,
                width,
                height,
            };
            filter_columns_scalar(&rg, &planes, 16..35, &mut scratch);
        }
        for y in 0..height {
            for x in 0..width {
                let value = dst[y * width + x];
                if (16..35).contains(&x) {
                    assert!(value >= 0., "Column {x} row {y} was not written");
                } else {
                    assert_eq!(value, -1., "Column {x} row {y} was written");
                }
            }
        }
    }
}
