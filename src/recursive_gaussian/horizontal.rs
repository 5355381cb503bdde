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
use crate::recursive_gaussian::vector::IirQuad;

/// Per branch state of the three second order recursions.
#[derive(Copy, Clone)]
struct RowRecursion<V: IirQuad> {
    mul_in: [V; 3],
    mul_prev: [V; 3],
    mul_prev2: [V; 3],
    prev: [V; 3],
    prev2: [V; 3],
}

impl<V: IirQuad> RowRecursion<V> {
    #[inline(always)]
    unsafe fn new(rg: &RecursiveGaussian) -> Self {
        let load = |table: &[f32; 3 * MAX_UNROLL]| {
            [
                V::load(table.as_ptr()),
                V::load(table.as_ptr().add(MAX_UNROLL)),
                V::load(table.as_ptr().add(2 * MAX_UNROLL)),
            ]
        };
        RowRecursion {
            mul_in: load(&rg.mul_in),
            mul_prev: load(&rg.mul_prev),
            mul_prev2: load(&rg.mul_prev2),
            prev: [V::zero(); 3],
            prev2: [V::zero(); 3],
        }
    }

    /// Advances a single output, only lane 0 is meaningful.
    #[inline(always)]
    unsafe fn step(&mut self, sum: f32) -> f32 {
        let sum = V::splat(sum);
        let mut out = [V::zero(); 3];
        for k in 0..3 {
            let mut y = V::mul(sum, self.mul_in[k]);
            y = V::mul_add(self.mul_prev2[k], self.prev2[k], y);
            self.prev2[k] = self.prev[k];
            y = V::mul_add(self.mul_prev[k], self.prev[k], y);
            self.prev[k] = y;
            out[k] = y;
        }
        V::add(out[0], V::add(out[1], out[2])).first_lane()
    }

    /// Advances [IirQuad::LANES] outputs at once from `sum` of their inputs.
    #[inline(always)]
    unsafe fn step_lanes(&mut self, sum: V) -> V {
        let mut out = [V::zero(); 3];
        if V::LANES == 1 {
            for k in 0..3 {
                let mut y = V::mul(sum, self.mul_in[k]);
                y = V::mul_add(self.mul_prev2[k], self.prev2[k], y);
                y = V::mul_add(self.mul_prev[k], self.prev[k], y);
                self.prev2[k] = self.prev[k];
                self.prev[k] = y;
                out[k] = y;
            }
        } else {
            let in0 = sum.broadcast::<0>();
            let in1 = sum.broadcast::<1>();
            let in2 = sum.broadcast::<2>();
            let in3 = sum.broadcast::<3>();
            for k in 0..3 {
                let mul_in = self.mul_in[k];
                let mut y = V::mul(in0, mul_in);
                y = V::mul_add(mul_in.shift_lanes_up::<1>(), in1, y);
                y = V::mul_add(mul_in.shift_lanes_up::<2>(), in2, y);
                y = V::mul_add(mul_in.shift_lanes_up::<3>(), in3, y);
                y = V::mul_add(self.mul_prev2[k], self.prev2[k], y);
                y = V::mul_add(self.mul_prev[k], self.prev[k], y);
                self.prev2[k] = y.broadcast::<2>();
                self.prev[k] = y.broadcast::<3>();
                out[k] = y;
            }
        }
        V::add(out[0], V::add(out[1], out[2]))
    }

    #[inline(always)]
    unsafe fn broadcast_state(&mut self) {
        if V::LANES > 1 {
            for k in 0..3 {
                self.prev[k] = self.prev[k].broadcast::<0>();
                self.prev2[k] = self.prev2[k].broadcast::<0>();
            }
        }
    }
}

#[inline(always)]
fn zero_padded(src: &[f32], n: isize, radius: isize) -> f32 {
    let left = n - radius - 1;
    let right = n + radius - 1;
    let left_val = if left >= 0 { src[left as usize] } else { 0. };
    let right_val = if right < src.len() as isize {
        src[right as usize]
    } else {
        0.
    };
    left_val + right_val
}

/// Blurs one row, samples outside of `src` are zero.
///
/// Output `n` is the sum over the three branches of
/// `y[n] = n2 * (in[n - N - 1] + in[n + N - 1]) - d1 * y[n - 1] - y[n - 2]`.
/// The recursion starts at `n = -N + 1`, earlier inputs are all outside of
/// the row so the state there is exactly zero.
///
/// # Safety
/// `V` must be supported by the running CPU and the caller must be compiled
/// with its target features. `V::LANES` must be 1 or [MAX_UNROLL].
#[inline(always)]
pub(crate) unsafe fn filter_row<V: IirQuad>(rg: &RecursiveGaussian, src: &[f32], dst: &mut [f32]) {
    debug_assert!(V::LANES == 1 || V::LANES == MAX_UNROLL);
    let width = src.len().min(dst.len());
    let src = &src[..width];
    let dst = &mut dst[..width];
    let xsize = width as isize;
    let radius = rg.radius as isize;

    let mut recursion = RowRecursion::<V>::new(rg);

    let mut n = -radius + 1;
    // Left side with bounds checks, outputs before 0 only warm up the state
    let lanes = V::LANES as isize;
    let first_aligned = (radius + 1 + lanes - 1) / lanes * lanes;
    while n < first_aligned.min(xsize) {
        let value = recursion.step(zero_padded(src, n, radius));
        if n >= 0 {
            dst[n as usize] = value;
        }
        n += 1;
    }

    recursion.broadcast_state();

    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();
    while n < xsize - radius + 1 - (MAX_UNROLL as isize - 1) {
        let left = V::load(src_ptr.offset(n - radius - 1));
        let right = V::load(src_ptr.offset(n + radius - 1));
        let out = recursion.step_lanes(V::add(left, right));
        out.store(dst_ptr.offset(n));
        n += lanes;
    }

    while n < xsize {
        dst[n as usize] = recursion.step(zero_padded(src, n, radius));
        n += 1;
    }
}

/// Single lane rendition of [filter_row], available on every target.
pub(crate) fn filter_row_scalar(rg: &RecursiveGaussian, src: &[f32], dst: &mut [f32]) {
    unsafe {
        filter_row::<f32>(rg, src, dst);
    }
}
