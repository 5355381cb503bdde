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

/// Lane abstraction the recursive passes are written against.
///
/// Every architecture back end provides one implementation per vector width,
/// `f32` itself is the single lane fallback. All functions are `unsafe`
/// because implementations are only valid inside functions compiled with
/// the matching target features, and because loads and stores are raw.
pub(crate) trait IirVector: Copy {
    const LANES: usize;

    unsafe fn zero() -> Self;

    unsafe fn splat(value: f32) -> Self;

    /// Unaligned load of [IirVector::LANES] items.
    unsafe fn load(ptr: *const f32) -> Self;

    /// Unaligned store of [IirVector::LANES] items.
    unsafe fn store(self, ptr: *mut f32);

    unsafe fn add(a: Self, b: Self) -> Self;

    unsafe fn mul(a: Self, b: Self) -> Self;

    /// `a * b + c`
    unsafe fn mul_add(a: Self, b: Self, c: Self) -> Self;

    /// `-(a * b) - c`
    unsafe fn neg_mul_sub(a: Self, b: Self, c: Self) -> Self;

    /// Cache hint, a no-op where no stable intrinsic exists.
    #[inline(always)]
    unsafe fn prefetch(_ptr: *const f32) {}
}

/// Vector capped at four lanes, used by the unrolled horizontal recursion.
pub(crate) trait IirQuad: IirVector {
    /// Copies lane `LANE` into every lane.
    unsafe fn broadcast<const LANE: usize>(self) -> Self;

    /// Moves lane `i` to lane `i + COUNT`, lowest lanes become zero.
    unsafe fn shift_lanes_up<const COUNT: usize>(self) -> Self;

    unsafe fn first_lane(self) -> f32;
}

impl IirVector for f32 {
    const LANES: usize = 1;

    #[inline(always)]
    unsafe fn zero() -> Self {
        0.
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        ptr.read_unaligned()
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        ptr.write_unaligned(self);
    }

    #[inline(always)]
    unsafe fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline(always)]
    unsafe fn mul(a: Self, b: Self) -> Self {
        a * b
    }

    #[inline(always)]
    unsafe fn mul_add(a: Self, b: Self, c: Self) -> Self {
        a * b + c
    }

    #[inline(always)]
    unsafe fn neg_mul_sub(a: Self, b: Self, c: Self) -> Self {
        -(a * b) - c
    }
}

impl IirQuad for f32 {
    #[inline(always)]
    unsafe fn broadcast<const LANE: usize>(self) -> Self {
        self
    }

    #[inline(always)]
    unsafe fn shift_lanes_up<const COUNT: usize>(self) -> Self {
        if COUNT == 0 {
            self
        } else {
            0.
        }
    }

    #[inline(always)]
    unsafe fn first_lane(self) -> f32 {
        self
    }
}
