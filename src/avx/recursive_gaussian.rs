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

use crate::recursive_gaussian::{filter_columns, IirVector, RecursiveGaussian, VerticalPlanes};
use std::arch::x86_64::*;
use std::ops::Range;

/// Eight `f32` lanes with fused multiply-adds.
///
/// Only the vertical pass uses it, rows are capped at four lanes.
#[derive(Copy, Clone)]
struct AvxF32(__m256);

impl IirVector for AvxF32 {
    const LANES: usize = 8;

    #[inline(always)]
    unsafe fn zero() -> Self {
        AvxF32(_mm256_setzero_ps())
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        AvxF32(_mm256_set1_ps(value))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        AvxF32(_mm256_loadu_ps(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        _mm256_storeu_ps(ptr, self.0);
    }

    #[inline(always)]
    unsafe fn add(a: Self, b: Self) -> Self {
        AvxF32(_mm256_add_ps(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul(a: Self, b: Self) -> Self {
        AvxF32(_mm256_mul_ps(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul_add(a: Self, b: Self, c: Self) -> Self {
        AvxF32(_mm256_fmadd_ps(a.0, b.0, c.0))
    }

    #[inline(always)]
    unsafe fn neg_mul_sub(a: Self, b: Self, c: Self) -> Self {
        AvxF32(_mm256_fnmsub_ps(a.0, b.0, c.0))
    }

    #[inline(always)]
    unsafe fn prefetch(ptr: *const f32) {
        _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8);
    }
}

pub(crate) fn recursive_gaussian_columns_avx_fma(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    unsafe {
        recursive_gaussian_columns_avx_fma_impl(rg, planes, columns, scratch);
    }
}

#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn recursive_gaussian_columns_avx_fma_impl(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    filter_columns::<AvxF32>(rg, planes, columns, scratch);
}
