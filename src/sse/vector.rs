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

use crate::recursive_gaussian::{IirQuad, IirVector};
#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Four `f32` lanes, `FMA` selects fused multiply-adds.
#[derive(Copy, Clone)]
pub(crate) struct SseF32<const FMA: bool>(pub(crate) __m128);

impl<const FMA: bool> IirVector for SseF32<FMA> {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        SseF32(_mm_setzero_ps())
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        SseF32(_mm_set1_ps(value))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        SseF32(_mm_loadu_ps(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        _mm_storeu_ps(ptr, self.0);
    }

    #[inline(always)]
    unsafe fn add(a: Self, b: Self) -> Self {
        SseF32(_mm_add_ps(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul(a: Self, b: Self) -> Self {
        SseF32(_mm_mul_ps(a.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul_add(a: Self, b: Self, c: Self) -> Self {
        if FMA {
            SseF32(_mm_fmadd_ps(a.0, b.0, c.0))
        } else {
            SseF32(_mm_add_ps(_mm_mul_ps(a.0, b.0), c.0))
        }
    }

    #[inline(always)]
    unsafe fn neg_mul_sub(a: Self, b: Self, c: Self) -> Self {
        if FMA {
            SseF32(_mm_fnmsub_ps(a.0, b.0, c.0))
        } else {
            let product = _mm_mul_ps(a.0, b.0);
            SseF32(_mm_sub_ps(_mm_sub_ps(_mm_setzero_ps(), product), c.0))
        }
    }

    #[inline(always)]
    unsafe fn prefetch(ptr: *const f32) {
        _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8);
    }
}

impl<const FMA: bool> IirQuad for SseF32<FMA> {
    #[inline(always)]
    unsafe fn broadcast<const LANE: usize>(self) -> Self {
        SseF32(match LANE {
            0 => _mm_shuffle_ps::<0x00>(self.0, self.0),
            1 => _mm_shuffle_ps::<0x55>(self.0, self.0),
            2 => _mm_shuffle_ps::<0xAA>(self.0, self.0),
            _ => _mm_shuffle_ps::<0xFF>(self.0, self.0),
        })
    }

    #[inline(always)]
    unsafe fn shift_lanes_up<const COUNT: usize>(self) -> Self {
        let bits = _mm_castps_si128(self.0);
        SseF32(_mm_castsi128_ps(match COUNT {
            0 => bits,
            1 => _mm_slli_si128::<4>(bits),
            2 => _mm_slli_si128::<8>(bits),
            3 => _mm_slli_si128::<12>(bits),
            _ => _mm_setzero_si128(),
        }))
    }

    #[inline(always)]
    unsafe fn first_lane(self) -> f32 {
        _mm_cvtss_f32(self.0)
    }
}
