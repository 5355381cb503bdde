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

#![allow(clippy::too_many_arguments)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Separable gaussian blur through a recursive (IIR) approximation.
//!
//! Three second order recursions whose impulse responses are truncated
//! cosines are fitted to the gaussian, see
//! "Recursive Implementation of the Gaussian Filter Using Truncated Cosine
//! Functions" by Charalampidis. The cost per pixel does not depend on sigma.
//!
//! Rows and column strips are spread over workers, SSE 4.1, AVX2 and NEON
//! back ends are picked at runtime once per process.

#[cfg(all(target_arch = "x86_64", feature = "avx"))]
mod avx;
mod channels_configuration;
mod image;
#[cfg(all(target_arch = "aarch64", feature = "neon"))]
mod neon;
mod recursive_gaussian;
#[cfg(feature = "image")]
#[cfg_attr(docsrs, doc(cfg(feature = "image")))]
mod recursive_gaussian_image;
mod scratch;
#[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"))]
mod sse;
mod threading_policy;
mod unsafe_slice;
mod util;

pub use channels_configuration::FastBlurChannels;
pub use image::{BlurImage, BlurImageMut, BufferStore};
pub use recursive_gaussian::{
    recursive_gaussian, recursive_gaussian_blur_f16, recursive_gaussian_blur_f32,
    recursive_gaussian_blur_u16, recursive_gaussian_blur_u8, recursive_gaussian_horizontal,
    recursive_gaussian_radius, recursive_gaussian_row, recursive_gaussian_vertical,
    RecursiveGaussian, RecursiveGaussianParams, VectorWidth,
};
#[cfg(feature = "image")]
#[cfg_attr(docsrs, doc(cfg(feature = "image")))]
pub use recursive_gaussian_image::recursive_gaussian_blur_image;
pub use threading_policy::ThreadingPolicy;
pub use util::{BlurError, MismatchedSize};
