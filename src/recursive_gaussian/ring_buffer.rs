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

/// Slots per branch: rows n, n - 1 and n - 2, rounded up to a power of two.
pub(crate) const RING_BUFFER_LEN: usize = 1 << 2;
const RING_BUFFER_MASK: usize = RING_BUFFER_LEN - 1;
/// One history per recursion branch `k = 1, 3, 5`.
pub(crate) const RING_BRANCHES: usize = 3;

/// Recent recursion outputs of every branch for one strip of columns.
///
/// Layout is `[branch][slot][lane]`. The slot of the row being computed is
/// `at(branch, 0)`, `at(branch, 1)` and `at(branch, 2)` are the two rows
/// above it. [RecursionRing::advance] moves to the next row.
pub(crate) struct RecursionRing<'a> {
    storage: &'a mut [f32],
    lanes: usize,
    head: usize,
}

impl<'a> RecursionRing<'a> {
    #[inline]
    pub(crate) const fn required_len(lanes: usize) -> usize {
        RING_BRANCHES * RING_BUFFER_LEN * lanes
    }

    /// Wraps `storage`, which must hold at least [RecursionRing::required_len] items.
    pub(crate) fn new(storage: &'a mut [f32], lanes: usize) -> RecursionRing<'a> {
        let storage = &mut storage[..Self::required_len(lanes)];
        storage.fill(0.);
        RecursionRing {
            storage,
            lanes,
            head: 0,
        }
    }

    #[inline(always)]
    fn slot(&self, back: usize) -> usize {
        debug_assert!(back < RING_BUFFER_LEN);
        self.head.wrapping_sub(back) & RING_BUFFER_MASK
    }

    /// Position in the storage of the outputs `back` rows above the current one.
    #[inline(always)]
    pub(crate) fn offset(&self, branch: usize, back: usize) -> usize {
        (branch * RING_BUFFER_LEN + self.slot(back)) * self.lanes
    }

    #[cfg(test)]
    pub(crate) fn at(&self, branch: usize, back: usize) -> &[f32] {
        let offset = self.offset(branch, back);
        &self.storage[offset..offset + self.lanes]
    }

    #[cfg(test)]
    pub(crate) fn current_mut(&mut self, branch: usize) -> &mut [f32] {
        let offset = self.offset(branch, 0);
        &mut self.storage[offset..offset + self.lanes]
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut f32 {
        self.storage.as_mut_ptr()
    }

    #[inline(always)]
    pub(crate) fn advance(&mut self) {
        self.head = (self.head + 1) & RING_BUFFER_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_follows_rows() {
        let lanes = 3;
        let mut storage = vec![f32::NAN; RecursionRing::required_len(lanes) + 5];
        let mut ring = RecursionRing::new(&mut storage, lanes);
        for branch in 0..RING_BRANCHES {
            assert!(ring.at(branch, 1).iter().all(|&x| x == 0.));
            assert!(ring.at(branch, 2).iter().all(|&x| x == 0.));
        }
        for row in 0..11usize {
            for branch in 0..RING_BRANCHES {
                let value = (row * 10 + branch) as f32;
                ring.current_mut(branch).fill(value);
                if row >= 1 {
                    let expected = ((row - 1) * 10 + branch) as f32;
                    assert!(ring.at(branch, 1).iter().all(|&x| x == expected));
                }
                if row >= 2 {
                    let expected = ((row - 2) * 10 + branch) as f32;
                    assert!(ring.at(branch, 2).iter().all(|&x| x == expected));
                }
            }
            ring.advance();
            for branch in 0..RING_BRANCHES {
                let expected = (row * 10 + branch) as f32;
                assert!(
                    ring.at(branch, 1).iter().all(|&x| x == expected),
                    "Row {row} must be the previous one after advancing"
                );
            }
        }
    }

    #[test]
    fn test_slots_never_alias() {
        let lanes = 4;
        let mut storage = vec![0f32; RecursionRing::required_len(lanes)];
        let mut ring = RecursionRing::new(&mut storage, lanes);
        for _ in 0..9 {
            let mut offsets = Vec::new();
            for branch in 0..RING_BRANCHES {
                for back in 0..3 {
                    offsets.push(ring.offset(branch, back));
                }
            }
            offsets.sort_unstable();
            offsets.dedup();
            assert_eq!(offsets.len(), RING_BRANCHES * 3);
            assert!(offsets
                .iter()
                .all(|&x| x + lanes <= RecursionRing::required_len(lanes)));
            ring.advance();
        }
    }
}
