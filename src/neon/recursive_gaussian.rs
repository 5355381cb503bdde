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

use crate::recursive_gaussian::{
    filter_columns, filter_row, IirQuad, IirVector, RecursiveGaussian, VerticalPlanes,
};
use std::arch::aarch64::*;
use std::ops::Range;

#[derive(Copy, Clone)]
struct NeonF32(float32x4_t);

impl IirVector for NeonF32 {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        NeonF32(vdupq_n_f32(0.))
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        NeonF32(vdupq_n_f32(value))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        NeonF32(vld1q_f32(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        vst1q_f32(ptr, self.0);
    }

    #[inline(always)]
    unsafe fn add(a: Self, b: Self) -> Self {
        NeonF32(vaddq_f32(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul(a: Self, b: Self) -> Self {
        NeonF32(vmulq_f32(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul_add(a: Self, b: Self, c: Self) -> Self {
        NeonF32(vfmaq_f32(c.0, a.0, b.0))
    }

    #[inline(always)]
    unsafe fn neg_mul_sub(a: Self, b: Self, c: Self) -> Self {
        NeonF32(vfmsq_f32(vnegq_f32(c.0), a.0, b.0))
    }
}

impl IirQuad for NeonF32 {
    #[inline(always)]
    unsafe fn broadcast<const LANE: usize>(self) -> Self {
        NeonF32(match LANE {
            0 => vdupq_laneq_f32::<0>(self.0),
            1 => vdupq_laneq_f32::<1>(self.0),
            2 => vdupq_laneq_f32::<2>(self.0),
            _ => vdupq_laneq_f32::<3>(self.0),
        })
    }

    #[inline(always)]
    unsafe fn shift_lanes_up<const COUNT: usize>(self) -> Self {
        let zeros = vdupq_n_f32(0.);
        NeonF32(match COUNT {
            0 => self.0,
            1 => vextq_f32::<3>(zeros, self.0),
            2 => vextq_f32::<2>(zeros, self.0),
            3 => vextq_f32::<1>(zeros, self.0),
            _ => zeros,
        })
    }

    #[inline(always)]
    unsafe fn first_lane(self) -> f32 {
        vgetq_lane_f32::<0>(self.0)
    }
}

pub(crate) fn recursive_gaussian_row_neon(rg: &RecursiveGaussian, src: &[f32], dst: &mut [f32]) {
    unsafe {
        filter_row::<NeonF32>(rg, src, dst);
    }
}

pub(crate) fn recursive_gaussian_columns_neon(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    unsafe {
        filter_columns::<NeonF32>(rg, planes, columns, scratch);
    }
}
