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

mod coefficients;
mod dispatch;
mod horizontal;
mod matrix;
mod ring_buffer;
mod vector;
mod vertical;

use crate::scratch::AlignedScratch;
use crate::unsafe_slice::UnsafeSlice;
use crate::{BlurError, BlurImage, BlurImageMut, FastBlurChannels, ThreadingPolicy};
pub use coefficients::{recursive_gaussian_radius, RecursiveGaussian};
use dispatch::RecursiveGaussianKernels;
pub use dispatch::VectorWidth;
#[cfg(any(
    all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"),
    all(target_arch = "aarch64", feature = "neon")
))]
pub(crate) use horizontal::filter_row;
use novtb::{ParallelZonedIterator, TbSliceMut};
use num_traits::AsPrimitive;
use std::fmt::Debug;
#[cfg(any(
    all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"),
    all(target_arch = "aarch64", feature = "neon")
))]
pub(crate) use vector::IirQuad;
#[cfg(any(
    all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"),
    all(target_arch = "x86_64", feature = "avx"),
    all(target_arch = "aarch64", feature = "neon")
))]
pub(crate) use {vector::IirVector, vertical::filter_columns};
pub(crate) use vertical::VerticalPlanes;
use vertical::{vertical_group_width, vertical_scratch_len};

/// Smallest radius the coefficient system is solvable for.
const MIN_RADIUS: usize = 2;

/// Parameters of [recursive_gaussian_blur_f32] and its typed siblings.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct RecursiveGaussianParams {
    /// Standard deviation of the approximated gaussian, in pixels.
    pub sigma: f64,
}

impl RecursiveGaussianParams {
    /// Largest accepted sigma.
    ///
    /// The recursion runs in `f32` and its poles approach the unit circle as
    /// sigma grows, so the flat field gain error grows with `sigma²`. It stays
    /// within `1e-4` up to sigma 8 and within `5e-6 * sigma²` up to this limit.
    pub const MAX_SIGMA: f64 = 64.;

    pub fn new(sigma: f64) -> RecursiveGaussianParams {
        RecursiveGaussianParams { sigma }
    }

    /// Sigma must be finite, positive, large enough for a radius of 2,
    /// which is about 0.53, and at most [RecursiveGaussianParams::MAX_SIGMA].
    pub fn validate(&self) -> Result<(), BlurError> {
        if !self.sigma.is_finite() || self.sigma <= 0. {
            return Err(BlurError::NegativeOrZeroSigma);
        }
        let radius = recursive_gaussian_radius(self.sigma);
        if radius < MIN_RADIUS || self.sigma > Self::MAX_SIGMA {
            return Err(BlurError::SigmaOutOfRange(self.sigma));
        }
        Ok(())
    }

    /// Validates and derives the recursion coefficients.
    pub fn coefficients(&self) -> Result<RecursiveGaussian, BlurError> {
        self.validate()?;
        Ok(RecursiveGaussian::new(self.sigma))
    }
}

fn check_coefficients(rg: &RecursiveGaussian) -> Result<(), BlurError> {
    RecursiveGaussianParams::new(rg.sigma).validate()
}

fn check_planes(src: &BlurImage<f32>, dst: &mut BlurImageMut<f32>) -> Result<(), BlurError> {
    if src.channels != FastBlurChannels::Plane {
        return Err(BlurError::UnsupportedChannels(src.channels.channels()));
    }
    src.check_layout()?;
    dst.check_layout(Some(src))?;
    src.size_matches_mut(dst)
}

/// Kernels, workers, thread pool and vertical scratch of one call.
///
/// Everything fallible is reserved here, the passes themselves never fail.
struct PassResources {
    kernels: RecursiveGaussianKernels,
    row_workers: usize,
    column_workers: usize,
    pool: Option<novtb::ThreadPool>,
    scratch: AlignedScratch,
    scratch_length: usize,
}

impl PassResources {
    fn try_new(
        kernels: RecursiveGaussianKernels,
        width: u32,
        height: u32,
        threading_policy: ThreadingPolicy,
    ) -> Result<PassResources, BlurError> {
        let groups = (width as usize).div_ceil(vertical_group_width(kernels.width.lanes()));
        let row_workers = threading_policy.workers(width, height, height as usize);
        let column_workers = threading_policy.workers(width, height, groups);
        PassResources::with_workers(kernels, row_workers, column_workers)
    }

    fn with_workers(
        kernels: RecursiveGaussianKernels,
        row_workers: usize,
        column_workers: usize,
    ) -> Result<PassResources, BlurError> {
        let scratch_length = vertical_scratch_len(kernels.width.lanes());
        let scratch = AlignedScratch::try_new(
            scratch_length
                .checked_mul(column_workers)
                .ok_or(BlurError::ExceedingPointerSize)?,
        )?;
        let workers = row_workers.max(column_workers);
        let pool = if workers > 1 {
            Some(novtb::ThreadPool::new(workers))
        } else {
            None
        };
        Ok(PassResources {
            kernels,
            row_workers,
            column_workers,
            pool,
            scratch,
            scratch_length,
        })
    }
}

/// Layouts must be checked.
fn horizontal_pass(
    rg: &RecursiveGaussian,
    resources: &PassResources,
    src: &BlurImage<f32>,
    dst: &mut BlurImageMut<f32>,
) {
    let width = src.width as usize;
    let height = src.height as usize;
    let dst_stride = dst.row_stride() as usize;
    let length = dst_stride * (height - 1) + width;
    let target = &mut dst.data.borrow_mut()[..length];
    let row = resources.kernels.row;

    match resources.pool.as_ref() {
        Some(pool) if resources.row_workers > 1 => {
            target
                .tb_par_chunks_mut(dst_stride)
                .for_each_enumerated(pool, |y, dst_row| {
                    row(rg, src.row(y), &mut dst_row[..width]);
                });
        }
        _ => {
            for (y, dst_row) in target.chunks_mut(dst_stride).enumerate() {
                row(rg, src.row(y), &mut dst_row[..width]);
            }
        }
    }
}

/// Layouts must be checked and `src` must be as wide as the image
/// `resources` were reserved for. Every worker owns a contiguous run of
/// whole strips, the last one also takes the leftover columns, so the strip
/// decomposition and the result never depend on the worker count.
fn vertical_pass(
    rg: &RecursiveGaussian,
    resources: &mut PassResources,
    src: &BlurImage<f32>,
    dst: &mut BlurImageMut<f32>,
) {
    let width = src.width as usize;
    let height = src.height as usize;
    let group = vertical_group_width(resources.kernels.width.lanes());
    let groups = width.div_ceil(group);
    let columns = resources.kernels.columns;
    let column_workers = resources.column_workers;
    let scratch_length = resources.scratch_length;

    let dst_stride = dst.row_stride() as usize;
    let planes = VerticalPlanes {
        src: src.data.as_ref(),
        src_stride: src.row_stride() as usize,
        dst: UnsafeSlice::new(dst.data.borrow_mut()),
        dst_stride,
        width,
        height,
    };

    let scratch = resources.scratch.as_mut_slice();
    match resources.pool.as_ref() {
        Some(pool) if column_workers > 1 => {
            let columns_per_worker = groups.div_ceil(column_workers) * group;
            scratch
                .tb_par_chunks_exact_mut(scratch_length)
                .for_each_enumerated(pool, |worker, worker_scratch| {
                    let start = (worker * columns_per_worker).min(width);
                    let end = ((worker + 1) * columns_per_worker).min(width);
                    if start < end {
                        columns(rg, &planes, start..end, worker_scratch);
                    }
                });
        }
        _ => columns(rg, &planes, 0..width, &mut scratch[..scratch_length]),
    }
}

/// Blurs a single row, samples outside of it are zero.
///
/// `src` and `dst` must have the same non zero length.
pub fn recursive_gaussian_row(
    rg: &RecursiveGaussian,
    src: &[f32],
    dst: &mut [f32],
) -> Result<(), BlurError> {
    check_coefficients(rg)?;
    if src.is_empty() {
        return Err(BlurError::ZeroBaseSize);
    }
    if src.len() != dst.len() {
        return Err(BlurError::ImagesMustMatch);
    }
    (RecursiveGaussianKernels::detected().row)(rg, src, dst);
    Ok(())
}

/// Runs the recursion along every row of a single channel plane.
///
/// Rows are independent and spread over workers according to `threading_policy`.
pub fn recursive_gaussian_horizontal(
    rg: &RecursiveGaussian,
    src: &BlurImage<f32>,
    dst: &mut BlurImageMut<f32>,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    check_coefficients(rg)?;
    check_planes(src, dst)?;
    let resources = PassResources::try_new(
        *RecursiveGaussianKernels::detected(),
        src.width,
        src.height,
        threading_policy,
    )?;
    horizontal_pass(rg, &resources, src, dst);
    Ok(())
}

/// Runs the recursion down every column of a single channel plane.
///
/// Columns are processed in cache line wide strips, each strip keeps its
/// own recursion history, so strips are spread over workers as well.
pub fn recursive_gaussian_vertical(
    rg: &RecursiveGaussian,
    src: &BlurImage<f32>,
    dst: &mut BlurImageMut<f32>,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    check_coefficients(rg)?;
    check_planes(src, dst)?;
    let mut resources = PassResources::try_new(
        *RecursiveGaussianKernels::detected(),
        src.width,
        src.height,
        threading_policy,
    )?;
    vertical_pass(rg, &mut resources, src, dst);
    Ok(())
}

/// Separable recursive gaussian blur of a single channel plane.
///
/// Rows of `src` are blurred into `temp`, then columns of `temp` into `dst`.
/// Owned `temp` and `dst` are resized to `src`, borrowed ones must match it.
/// The cost per pixel does not depend on sigma.
///
/// # Arguments
///
/// * `rg`: Coefficients, see [RecursiveGaussianParams::coefficients].
/// * `src`: Source plane.
/// * `temp`: Scratch plane, overwritten.
/// * `dst`: Destination plane.
/// * `threading_policy`: Threads usage policy, does not change the result.
pub fn recursive_gaussian(
    rg: &RecursiveGaussian,
    src: &BlurImage<f32>,
    temp: &mut BlurImageMut<f32>,
    dst: &mut BlurImageMut<f32>,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    check_coefficients(rg)?;
    check_planes(src, temp)?;
    check_planes(src, dst)?;
    let mut resources = PassResources::try_new(
        *RecursiveGaussianKernels::detected(),
        src.width,
        src.height,
        threading_policy,
    )?;
    horizontal_pass(rg, &resources, src, temp);
    vertical_pass(rg, &mut resources, &temp.to_immutable_ref(), dst);
    Ok(())
}

fn recursive_gaussian_blur_impl<T>(
    src: &BlurImage<T>,
    dst: &mut BlurImageMut<T>,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
    store: fn(f32) -> T,
) -> Result<(), BlurError>
where
    T: Copy + Clone + Default + Debug + AsPrimitive<f32>,
{
    blur_channels_with(src, dst, params, store, |width, height| {
        PassResources::try_new(
            *RecursiveGaussianKernels::detected(),
            width,
            height,
            threading_policy,
        )
    })
}

/// Reserves everything through `resources` and the plane allocations first,
/// `dst` is only written once nothing can fail anymore.
fn blur_channels_with<T>(
    src: &BlurImage<T>,
    dst: &mut BlurImageMut<T>,
    params: RecursiveGaussianParams,
    store: fn(f32) -> T,
    resources: impl FnOnce(u32, u32) -> Result<PassResources, BlurError>,
) -> Result<(), BlurError>
where
    T: Copy + Clone + Default + Debug + AsPrimitive<f32>,
{
    src.check_layout()?;
    dst.check_layout(Some(src))?;
    src.size_matches_mut(dst)?;
    let rg = params.coefficients()?;
    let mut resources = resources(src.width, src.height)?;

    let height = src.height as usize;
    let cn = src.channels.channels();

    let mut plane = BlurImageMut::<f32>::try_alloc(src.width, src.height, FastBlurChannels::Plane)?;
    let mut temp = BlurImageMut::<f32>::try_alloc(src.width, src.height, FastBlurChannels::Plane)?;
    let mut blurred =
        BlurImageMut::<f32>::try_alloc(src.width, src.height, FastBlurChannels::Plane)?;

    for channel in 0..cn {
        for y in 0..height {
            for (dst, src) in plane
                .row_mut(y)
                .iter_mut()
                .zip(src.row(y).chunks_exact(cn))
            {
                *dst = src[channel].as_();
            }
        }

        horizontal_pass(&rg, &resources, &plane.to_immutable_ref(), &mut temp);
        vertical_pass(&rg, &mut resources, &temp.to_immutable_ref(), &mut blurred);

        let blurred_ref = blurred.to_immutable_ref();
        for y in 0..height {
            for (dst, &src) in dst
                .row_mut(y)
                .chunks_exact_mut(cn)
                .zip(blurred_ref.row(y).iter())
            {
                dst[channel] = store(src);
            }
        }
    }
    Ok(())
}

/// Recursive gaussian blur of an `f32` image with 1, 3 or 4 interleaved channels.
///
/// Every channel is blurred on its own, alpha must be associated beforehand.
/// Samples outside of the image are zero, so borders darken towards the edge.
pub fn recursive_gaussian_blur_f32(
    src: &BlurImage<f32>,
    dst: &mut BlurImageMut<f32>,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    recursive_gaussian_blur_impl(src, dst, params, threading_policy, |x| x)
}

/// Recursive gaussian blur of an 8 bit image, results are rounded and saturated.
///
/// See [recursive_gaussian_blur_f32] for details.
pub fn recursive_gaussian_blur_u8(
    src: &BlurImage<u8>,
    dst: &mut BlurImageMut<u8>,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    recursive_gaussian_blur_impl(src, dst, params, threading_policy, |x| {
        x.round().clamp(0., u8::MAX as f32) as u8
    })
}

/// Recursive gaussian blur of a 16 bit image, results are rounded and saturated.
///
/// See [recursive_gaussian_blur_f32] for details.
pub fn recursive_gaussian_blur_u16(
    src: &BlurImage<u16>,
    dst: &mut BlurImageMut<u16>,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    recursive_gaussian_blur_impl(src, dst, params, threading_policy, |x| {
        x.round().clamp(0., u16::MAX as f32) as u16
    })
}

/// Recursive gaussian blur of a half precision image.
///
/// See [recursive_gaussian_blur_f32] for details.
pub fn recursive_gaussian_blur_f16(
    src: &BlurImage<half::f16>,
    dst: &mut BlurImageMut<half::f16>,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
) -> Result<(), BlurError> {
    recursive_gaussian_blur_impl(src, dst, params, threading_policy, half::f16::from_f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recursive_gaussian::horizontal::tests::reference_row;
    use std::num::NonZeroUsize;

    fn pseudo_random(length: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..length)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 8) as f32 / (1u32 << 24) as f32
            })
            .collect()
    }

    fn blur_plane(
        sigma: f64,
        src: &[f32],
        width: u32,
        height: u32,
        policy: ThreadingPolicy,
    ) -> Vec<f32> {
        let rg = RecursiveGaussian::new(sigma);
        let src = BlurImage::borrow(src, width, height, FastBlurChannels::Plane);
        let mut temp = BlurImageMut::default();
        let mut dst = BlurImageMut::default();
        recursive_gaussian(&rg, &src, &mut temp, &mut dst, policy).unwrap();
        dst.data.borrow().to_vec()
    }

    #[test]
    fn test_flat_field_is_preserved() {
        let (width, height) = (64u32, 48u32);
        let src = vec![0.7f32; (width * height) as usize];
        for &sigma in &[1f64, 2.5, 4.] {
            let radius = recursive_gaussian_radius(sigma);
            let dst = blur_plane(sigma, &src, width, height, ThreadingPolicy::Single);
            for y in radius..height as usize - radius {
                for x in radius..width as usize - radius {
                    let value = dst[y * width as usize + x];
                    assert!(
                        (value - 0.7).abs() < 0.7 * 1e-4,
                        "Sigma {sigma} at ({x}, {y}): {value}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_passes_commute() {
        let (width, height) = (57u32, 43u32);
        let data = pseudo_random((width * height) as usize, 17);
        let rg = RecursiveGaussian::new(1.8);
        let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Plane);

        let mut temp = BlurImageMut::default();
        let mut rows_first = BlurImageMut::default();
        recursive_gaussian(&rg, &src, &mut temp, &mut rows_first, ThreadingPolicy::Single).unwrap();

        let mut columns = BlurImageMut::default();
        let mut columns_first = BlurImageMut::default();
        recursive_gaussian_vertical(&rg, &src, &mut columns, ThreadingPolicy::Single).unwrap();
        recursive_gaussian_horizontal(
            &rg,
            &columns.to_immutable_ref(),
            &mut columns_first,
            ThreadingPolicy::Single,
        )
        .unwrap();

        for (i, (&a, &b)) in rows_first
            .data
            .borrow()
            .iter()
            .zip(columns_first.data.borrow().iter())
            .enumerate()
        {
            assert!((a - b).abs() < 1e-4, "At {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_impulse_is_symmetric_bell() {
        let size = 41usize;
        let center = 20usize;
        let mut src = vec![0f32; size * size];
        src[center * size + center] = 1.;
        let dst = blur_plane(2.5, &src, size as u32, size as u32, ThreadingPolicy::Single);
        let at = |x: usize, y: usize| dst[y * size + x];
        for y in 0..size {
            for x in 0..size {
                assert!((at(x, y) - at(y, x)).abs() < 1e-6);
                assert!((at(x, y) - at(size - 1 - x, y)).abs() < 1e-6);
                assert!((at(x, y) - at(x, size - 1 - y)).abs() < 1e-6);
            }
        }
        for d in 1..center {
            assert!(at(center + d, center) <= at(center + d - 1, center) + 1e-7);
        }
        assert!(at(center, center) > at(center + 1, center));
    }

    #[test]
    fn test_result_does_not_depend_on_workers() {
        let (width, height) = (300u32, 211u32);
        let data = pseudo_random((width * height) as usize, 3);
        let single = blur_plane(3.1, &data, width, height, ThreadingPolicy::Single);
        for workers in [2usize, 3, 4, 7] {
            let policy = ThreadingPolicy::Fixed(NonZeroUsize::new(workers).unwrap());
            let parallel = blur_plane(3.1, &data, width, height, policy);
            assert_eq!(single, parallel, "{workers} workers changed the result");
        }
    }

    #[test]
    fn test_impulse_16x16_end_to_end() {
        let size = 16usize;
        let mut src = vec![0f32; size * size];
        src[8 * size + 8] = 255.;
        let radius = recursive_gaussian_radius(2.0) as f32;
        let dst = blur_plane(2.0, &src, size as u32, size as u32, ThreadingPolicy::Single);

        let peak = dst[8 * size + 8];
        assert!(dst.iter().all(|&x| x <= peak));
        let sum: f32 = dst.iter().sum();
        assert!((sum - 255.).abs() < 0.5, "Energy must be kept, {sum}");
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - 8.;
                let dy = y as f32 - 8.;
                if (dx * dx + dy * dy).sqrt() > radius + 2. {
                    assert!(dst[y * size + x].abs() < 1e-3, "({x}, {y}) is not zero");
                }
            }
        }

        let src_u8 = src.iter().map(|&x| x as u8).collect::<Vec<u8>>();
        let image = BlurImage::borrow(&src_u8, 16, 16, FastBlurChannels::Plane);
        let mut dst_u8 = BlurImageMut::default();
        recursive_gaussian_blur_u8(
            &image,
            &mut dst_u8,
            RecursiveGaussianParams::new(2.0),
            ThreadingPolicy::Single,
        )
        .unwrap();
        let dst_u8 = dst_u8.data.borrow();
        let peak_u8 = dst_u8[8 * size + 8];
        assert!(peak_u8 > 0 && dst_u8.iter().all(|&x| x <= peak_u8));
        assert_eq!(dst_u8[0], 0);
    }

    #[test]
    fn test_single_row_and_single_column() {
        for &sigma in &[0.6f64, 3.] {
            let center = reference_row(sigma, &[1.])[0];
            let data = pseudo_random(37, 5);
            let expected = reference_row(sigma, &data);

            let row = blur_plane(sigma, &data, 37, 1, ThreadingPolicy::Single);
            let column = blur_plane(sigma, &data, 1, 37, ThreadingPolicy::Single);
            for i in 0..37 {
                let value = expected[i] * center;
                assert!((row[i] as f64 - value).abs() < 1e-4, "Row at {i}");
                assert!((column[i] as f64 - value).abs() < 1e-4, "Column at {i}");
            }

            let single = blur_plane(sigma, &[2.], 1, 1, ThreadingPolicy::Single);
            assert!((single[0] as f64 - 2. * center * center).abs() < 1e-5);
        }
    }

    #[test]
    fn test_strided_images() {
        let (width, height, stride) = (23u32, 19u32, 29u32);
        let tight = pseudo_random((width * height) as usize, 11);
        let mut padded = vec![f32::NAN; (stride * height) as usize];
        for y in 0..height as usize {
            padded[y * stride as usize..y * stride as usize + width as usize]
                .copy_from_slice(&tight[y * width as usize..(y + 1) * width as usize]);
        }
        let expected = blur_plane(1.3, &tight, width, height, ThreadingPolicy::Single);

        let rg = RecursiveGaussian::new(1.3);
        let src =
            BlurImage::borrow_strided(&padded, width, height, stride, FastBlurChannels::Plane);
        let mut temp_storage = vec![-1f32; (stride * height) as usize];
        let mut dst_storage = vec![-1f32; (stride * height) as usize];
        {
            let mut temp = BlurImageMut::borrow_strided(
                &mut temp_storage,
                width,
                height,
                stride,
                FastBlurChannels::Plane,
            );
            let mut dst = BlurImageMut::borrow_strided(
                &mut dst_storage,
                width,
                height,
                stride,
                FastBlurChannels::Plane,
            );
            recursive_gaussian(&rg, &src, &mut temp, &mut dst, ThreadingPolicy::Single).unwrap();
        }

        for y in 0..height as usize {
            for x in 0..stride as usize {
                let value = dst_storage[y * stride as usize + x];
                if x < width as usize {
                    assert_eq!(value, expected[y * width as usize + x]);
                } else {
                    assert_eq!(value, -1., "Padding at ({x}, {y}) was written");
                }
            }
        }
    }

    #[test]
    fn test_every_width_filters_columns_like_scalar() {
        let rg = RecursiveGaussian::new(2.2);
        let scalar = RecursiveGaussianKernels::for_width(VectorWidth::Scalar).unwrap();
        for &(width, height) in &[(67u32, 70u32), (5, 13), (32, 3), (129, 9)] {
            let data = pseudo_random((width * height) as usize, width + height);
            let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Plane);
            let mut expected = BlurImageMut::alloc(width, height, FastBlurChannels::Plane);
            let mut resources =
                PassResources::try_new(scalar, width, height, ThreadingPolicy::Single).unwrap();
            vertical_pass(&rg, &mut resources, &src, &mut expected);
            for vector_width in [
                VectorWidth::Sse,
                VectorWidth::SseFma,
                VectorWidth::Avx2Fma,
                VectorWidth::Neon,
            ] {
                let Some(kernels) = RecursiveGaussianKernels::for_width(vector_width) else {
                    continue;
                };
                let mut received = BlurImageMut::alloc(width, height, FastBlurChannels::Plane);
                let policy = ThreadingPolicy::Fixed(NonZeroUsize::new(3).unwrap());
                let mut resources = PassResources::try_new(kernels, width, height, policy).unwrap();
                vertical_pass(&rg, &mut resources, &src, &mut received);
                for (i, (&a, &b)) in expected
                    .data
                    .borrow()
                    .iter()
                    .zip(received.data.borrow().iter())
                    .enumerate()
                {
                    assert!(
                        (a - b).abs() <= 2e-5 * a.abs().max(1.),
                        "{vector_width:?} {width}x{height} at {i}: {a} vs {b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_interleaved_channels() {
        let (width, height) = (24u32, 20u32);
        let pixel = [10u8, 100, 200];
        let data = pixel.repeat((width * height) as usize);
        let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Channels3);
        let mut dst = BlurImageMut::default();
        recursive_gaussian_blur_u8(
            &src,
            &mut dst,
            RecursiveGaussianParams::new(1.0),
            ThreadingPolicy::Single,
        )
        .unwrap();
        let radius = recursive_gaussian_radius(1.0);
        for y in radius..height as usize - radius {
            let row = dst.row_mut(y);
            for x in radius..width as usize - radius {
                assert_eq!(&row[x * 3..x * 3 + 3], &pixel);
            }
        }

        let pixel = [1000u16, 40000, 7, 65535];
        let data = pixel.repeat((width * height) as usize);
        let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Channels4);
        let mut dst = BlurImageMut::default();
        recursive_gaussian_blur_u16(
            &src,
            &mut dst,
            RecursiveGaussianParams::new(1.0),
            ThreadingPolicy::Single,
        )
        .unwrap();
        let center = dst.row_mut(10)[12 * 4..12 * 4 + 4].to_vec();
        for (&a, &b) in center.iter().zip(pixel.iter()) {
            assert!((a as i32 - b as i32).abs() <= 1, "{a} vs {b}");
        }

        let data = vec![half::f16::from_f32(0.25); (width * height) as usize];
        let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Plane);
        let mut dst = BlurImageMut::default();
        recursive_gaussian_blur_f16(
            &src,
            &mut dst,
            RecursiveGaussianParams::new(2.0),
            ThreadingPolicy::Adaptive,
        )
        .unwrap();
        assert!((dst.row_mut(10)[12].to_f32() - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_requests() {
        assert_eq!(
            RecursiveGaussianParams::new(0.).validate(),
            Err(BlurError::NegativeOrZeroSigma)
        );
        assert_eq!(
            RecursiveGaussianParams::new(f64::NAN).validate(),
            Err(BlurError::NegativeOrZeroSigma)
        );
        assert_eq!(
            RecursiveGaussianParams::new(0.3).validate(),
            Err(BlurError::SigmaOutOfRange(0.3))
        );
        assert!(RecursiveGaussianParams::new(0.6).validate().is_ok());
        assert!(RecursiveGaussianParams::new(RecursiveGaussianParams::MAX_SIGMA)
            .validate()
            .is_ok());
        assert_eq!(
            RecursiveGaussianParams::new(64.5).validate(),
            Err(BlurError::SigmaOutOfRange(64.5))
        );
        assert_eq!(
            recursive_gaussian_row(&RecursiveGaussian::new(100.), &[1.; 8], &mut [0.; 8]),
            Err(BlurError::SigmaOutOfRange(100.))
        );

        let rg = RecursiveGaussian::new(1.);
        let mut dst = [0f32; 3];
        assert_eq!(
            recursive_gaussian_row(&rg, &[1., 2.], &mut dst),
            Err(BlurError::ImagesMustMatch)
        );
        assert_eq!(
            recursive_gaussian_row(&rg, &[], &mut []),
            Err(BlurError::ZeroBaseSize)
        );

        let data = vec![0f32; 4 * 4 * 3];
        let src = BlurImage::borrow(&data, 4, 4, FastBlurChannels::Channels3);
        let mut dst = BlurImageMut::default();
        assert_eq!(
            recursive_gaussian_horizontal(&rg, &src, &mut dst, ThreadingPolicy::Single),
            Err(BlurError::UnsupportedChannels(3))
        );

        let data = vec![0f32; 16];
        let src = BlurImage::borrow(&data, 4, 4, FastBlurChannels::Plane);
        let mut storage = vec![0f32; 20];
        let mut dst = BlurImageMut::borrow(&mut storage, 5, 4, FastBlurChannels::Plane);
        assert_eq!(
            recursive_gaussian_vertical(&rg, &src, &mut dst, ThreadingPolicy::Single),
            Err(BlurError::ImagesMustMatch)
        );
    }

    #[test]
    fn test_row_entry_matches_reference() {
        let rg = RecursiveGaussian::new(1.4);
        let data = pseudo_random(90, 23);
        let mut dst = vec![0f32; 90];
        recursive_gaussian_row(&rg, &data, &mut dst).unwrap();
        let expected = reference_row(1.4, &data);
        for (&a, &b) in dst.iter().zip(expected.iter()) {
            assert!((a as f64 - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_failed_reservation_leaves_destination_untouched() {
        let (width, height) = (40u32, 30u32);
        let data = pseudo_random((width * height * 4) as usize, 9)
            .iter()
            .map(|&x| (x * 255.) as u8)
            .collect::<Vec<u8>>();
        let src = BlurImage::borrow(&data, width, height, FastBlurChannels::Channels4);
        let scalar = RecursiveGaussianKernels::for_width(VectorWidth::Scalar).unwrap();
        let mut storage = vec![77u8; data.len()];
        {
            let mut dst =
                BlurImageMut::borrow(&mut storage, width, height, FastBlurChannels::Channels4);
            let result = blur_channels_with(
                &src,
                &mut dst,
                RecursiveGaussianParams::new(1.5),
                |x| x.round().clamp(0., 255.) as u8,
                |_, _| PassResources::with_workers(scalar, 1, usize::MAX / 1024),
            );
            assert!(matches!(result, Err(BlurError::AllocationFailed(_))));
        }
        assert!(storage.iter().all(|&x| x == 77));

        assert!(matches!(
            PassResources::with_workers(scalar, 1, usize::MAX),
            Err(BlurError::ExceedingPointerSize)
        ));
    }

    #[test]
    fn test_resources_follow_the_policy() {
        let scalar = RecursiveGaussianKernels::for_width(VectorWidth::Scalar).unwrap();
        let fixed = ThreadingPolicy::Fixed(NonZeroUsize::new(8).unwrap());
        let resources = PassResources::try_new(scalar, 40, 5, fixed).unwrap();
        assert_eq!(resources.row_workers, 5);
        assert_eq!(resources.column_workers, 3);
        assert!(resources.pool.is_some());
        assert_eq!(
            resources.scratch_length,
            vertical_scratch_len(VectorWidth::Scalar.lanes())
        );

        let single = PassResources::try_new(scalar, 40, 5, ThreadingPolicy::Single).unwrap();
        assert_eq!((single.row_workers, single.column_workers), (1, 1));
        assert!(single.pool.is_none());
    }

    #[test]
    fn test_flat_field_gain_over_sigma_range() {
        let max_sigma = RecursiveGaussianParams::MAX_SIGMA;
        for &sigma in &[0.6f64, 1., 2., 3.3, 5., 8., 12., 20., 32., 48., max_sigma] {
            let tolerance = if sigma <= 8. { 1e-4 } else { 5e-6 * sigma * sigma };
            let rg = RecursiveGaussianParams::new(sigma).coefficients().unwrap();
            let radius = rg.radius();
            let length = 8 * radius + 13;

            let ones = vec![1f32; length];
            let mut row = vec![0f32; length];
            recursive_gaussian_row(&rg, &ones, &mut row).unwrap();

            let width = 3u32;
            let plane = vec![1f32; length * width as usize];
            let src = BlurImage::borrow(&plane, width, length as u32, FastBlurChannels::Plane);
            let mut columns = BlurImageMut::default();
            recursive_gaussian_vertical(&rg, &src, &mut columns, ThreadingPolicy::Single).unwrap();
            let columns = columns.data.borrow();

            for n in radius..length - radius {
                let value = row[n];
                assert!(
                    (value - 1.).abs() <= tolerance as f32,
                    "Sigma {sigma}: row gain at {n} is {value}"
                );
                for x in 0..width as usize {
                    let value = columns[n * width as usize + x];
                    assert!(
                        (value - 1.).abs() <= tolerance as f32,
                        "Sigma {sigma}: column gain at ({x}, {n}) is {value}"
                    );
                }
            }
        }
    }
}
