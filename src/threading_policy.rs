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

use std::{num::NonZeroUsize, thread::available_parallelism};

/// Amount of workers the horizontal rows and vertical strips are spread over.
///
/// Output never depends on the policy, every row and every strip is
/// computed by exactly one worker in the same arithmetic order.
#[repr(C)]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Default, Hash)]
pub enum ThreadingPolicy {
    /// Use only one thread, current is preferred.
    Single,
    /// Compute adaptive thread count between 1..available CPUs.
    #[default]
    Adaptive,
    /// Like `Adaptive`, but reserve given amount of threads (i.e. those will not be
    /// used).
    AdaptiveReserve(NonZeroUsize),
    /// Use specified number of threads.
    Fixed(NonZeroUsize),
}

/// Pixels per worker below which spawning another thread does not pay off.
const PIXELS_PER_THREAD: usize = 256 * 256;

impl ThreadingPolicy {
    /// Returns the number of threads to use for the given image dimensions under the
    /// selected policy variant.
    ///
    /// Must return at least 1.
    pub fn thread_count(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            ThreadingPolicy::Single => 1,
            ThreadingPolicy::Adaptive => {
                (pixels / PIXELS_PER_THREAD).clamp(1, Self::available_parallelism(2))
            }
            ThreadingPolicy::AdaptiveReserve(reserve) => {
                let reserve = reserve.get();
                let max_threads = Self::available_parallelism(1);
                let usable = max_threads.saturating_sub(reserve).max(1);
                (pixels / PIXELS_PER_THREAD).clamp(1, usable)
            }
            ThreadingPolicy::Fixed(fixed) => fixed.get(),
        }
    }

    /// Workers for an image split into `max_tasks` independent parts, at least 1.
    pub(crate) fn workers(&self, width: u32, height: u32, max_tasks: usize) -> usize {
        self.thread_count(width, height).min(max_tasks).max(1)
    }

    // Make always return at least some minimal amount of threads, if multi-threading were requested
    // At least on single core CPU have 2 threads is beneficial
    fn available_parallelism(min: usize) -> usize {
        available_parallelism()
            .map(|x| x.get())
            .unwrap_or(1)
            .max(min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_count_is_never_zero() {
        assert_eq!(ThreadingPolicy::Single.thread_count(4096, 4096), 1);
        assert_eq!(ThreadingPolicy::Adaptive.thread_count(1, 1), 1);
        let reserve = NonZeroUsize::new(usize::MAX).unwrap();
        assert_eq!(
            ThreadingPolicy::AdaptiveReserve(reserve).thread_count(8192, 8192),
            1
        );
        let fixed = NonZeroUsize::new(3).unwrap();
        assert_eq!(ThreadingPolicy::Fixed(fixed).thread_count(1, 1), 3);
        assert_eq!(ThreadingPolicy::Fixed(fixed).workers(1, 1, 2), 2);
        assert_eq!(ThreadingPolicy::Fixed(fixed).workers(1, 1, 0), 1);
    }
}
