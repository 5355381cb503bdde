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

use crate::BlurError;

/// Scratch slices start on this boundary, one cache line.
pub(crate) const SCRATCH_ALIGNMENT: usize = 64;

/// Allocates `length` default items, reporting failure instead of aborting.
pub(crate) fn try_zeroed_vec<T: Default + Clone>(length: usize) -> Result<Vec<T>, BlurError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(length).map_err(|_| {
        BlurError::AllocationFailed(length.saturating_mul(std::mem::size_of::<T>()))
    })?;
    vec.resize(length, T::default());
    Ok(vec)
}

/// Zero initialized `f32` scratch whose visible part is cache line aligned.
pub(crate) struct AlignedScratch {
    storage: Vec<f32>,
    offset: usize,
    length: usize,
}

impl AlignedScratch {
    pub(crate) fn try_new(length: usize) -> Result<AlignedScratch, BlurError> {
        let padding = SCRATCH_ALIGNMENT / size_of::<f32>();
        let total = length
            .checked_add(padding)
            .ok_or(BlurError::ExceedingPointerSize)?;
        let storage = try_zeroed_vec::<f32>(total)?;
        let offset = storage.as_ptr().align_offset(SCRATCH_ALIGNMENT);
        // align_offset is allowed to fail with usize::MAX, start unaligned in that case
        let offset = if offset > padding { 0 } else { offset };
        Ok(AlignedScratch {
            storage,
            offset,
            length,
        })
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.storage[self.offset..self.offset + self.length]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_scratch() {
        for length in [1usize, 7, 64, 1000] {
            let mut scratch = AlignedScratch::try_new(length).unwrap();
            let slice = scratch.as_mut_slice();
            assert_eq!(slice.len(), length);
            assert_eq!(slice.as_ptr() as usize % SCRATCH_ALIGNMENT, 0);
            assert!(slice.iter().all(|&x| x == 0.));
        }
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let result = try_zeroed_vec::<f32>(usize::MAX / 2);
        assert!(matches!(result, Err(BlurError::AllocationFailed(_))));
    }
}
