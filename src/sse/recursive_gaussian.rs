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

use crate::recursive_gaussian::{filter_columns, filter_row, RecursiveGaussian, VerticalPlanes};
use crate::sse::vector::SseF32;
use std::ops::Range;

pub(crate) fn recursive_gaussian_row_sse(rg: &RecursiveGaussian, src: &[f32], dst: &mut [f32]) {
    unsafe {
        recursive_gaussian_row_sse_def(rg, src, dst);
    }
}

pub(crate) fn recursive_gaussian_row_sse_fma(
    rg: &RecursiveGaussian,
    src: &[f32],
    dst: &mut [f32],
) {
    unsafe {
        recursive_gaussian_row_sse_fma_impl(rg, src, dst);
    }
}

#[target_feature(enable = "sse4.1")]
unsafe fn recursive_gaussian_row_sse_def(rg: &RecursiveGaussian, src: &[f32], dst: &mut [f32]) {
    filter_row::<SseF32<false>>(rg, src, dst);
}

#[target_feature(enable = "sse4.1", enable = "fma")]
unsafe fn recursive_gaussian_row_sse_fma_impl(
    rg: &RecursiveGaussian,
    src: &[f32],
    dst: &mut [f32],
) {
    filter_row::<SseF32<true>>(rg, src, dst);
}

pub(crate) fn recursive_gaussian_columns_sse(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    unsafe {
        recursive_gaussian_columns_sse_def(rg, planes, columns, scratch);
    }
}

pub(crate) fn recursive_gaussian_columns_sse_fma(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    unsafe {
        recursive_gaussian_columns_sse_fma_impl(rg, planes, columns, scratch);
    }
}

#[target_feature(enable = "sse4.1")]
unsafe fn recursive_gaussian_columns_sse_def(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    filter_columns::<SseF32<false>>(rg, planes, columns, scratch);
}

#[target_feature(enable = "sse4.1", enable = "fma")]
unsafe fn recursive_gaussian_columns_sse_fma_impl(
    rg: &RecursiveGaussian,
    planes: &VerticalPlanes,
    columns: Range<usize>,
    scratch: &mut [f32],
) {
    filter_columns::<SseF32<true>>(rg, planes, columns, scratch);
}
