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

use crate::{
    recursive_gaussian_blur_f32, recursive_gaussian_blur_u16, recursive_gaussian_blur_u8,
    BlurError, BlurImage, BlurImageMut, FastBlurChannels, RecursiveGaussianParams,
    ThreadingPolicy,
};
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, Luma, LumaA, Rgb, Rgb32FImage, RgbImage,
    Rgba, Rgba32FImage, RgbaImage,
};
use std::fmt::Debug;

type TypedBlur<T> = fn(
    &BlurImage<T>,
    &mut BlurImageMut<T>,
    RecursiveGaussianParams,
    ThreadingPolicy,
) -> Result<(), BlurError>;

fn blur_interleaved<T: Copy + Clone + Default + Debug>(
    raw: &[T],
    width: u32,
    height: u32,
    channels: FastBlurChannels,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
    blur: TypedBlur<T>,
) -> Result<Vec<T>, BlurError> {
    let src = BlurImage::borrow(raw, width, height, channels);
    let mut dst = BlurImageMut::default();
    blur(&src, &mut dst, params, threading_policy)?;
    Ok(dst.data.borrow().to_vec())
}

/// Intensity and alpha are split into two planes and blurred apart.
fn blur_gray_alpha<T: Copy + Clone + Default + Debug>(
    raw: &[T],
    width: u32,
    height: u32,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
    blur: TypedBlur<T>,
) -> Result<Vec<T>, BlurError> {
    let intensity = raw.iter().step_by(2).copied().collect::<Vec<T>>();
    let alpha = raw.iter().skip(1).step_by(2).copied().collect::<Vec<T>>();
    let plane = FastBlurChannels::Plane;
    let intensity = blur_interleaved(
        &intensity,
        width,
        height,
        plane,
        params,
        threading_policy,
        blur,
    )?;
    let alpha = blur_interleaved(&alpha, width, height, plane, params, threading_policy, blur)?;

    let mut new_raw = vec![T::default(); raw.len()];
    for ((dst, &intensity), &alpha) in new_raw
        .chunks_exact_mut(2)
        .zip(intensity.iter())
        .zip(alpha.iter())
    {
        dst[0] = intensity;
        dst[1] = alpha;
    }
    Ok(new_raw)
}

/// Recursive gaussian blur of an image provided by the image crate.
///
/// NOTE: Alpha must be associated if this image has alpha.
///
/// # Arguments
///
/// * `image`: Dynamic image provided by image crate.
/// * `params`: See [RecursiveGaussianParams] for more info.
/// * `threading_policy` - Threads usage policy.
///
/// Returns [BlurError::UnsupportedChannels] for pixel formats without a typed blur.
pub fn recursive_gaussian_blur_image(
    image: DynamicImage,
    params: RecursiveGaussianParams,
    threading_policy: ThreadingPolicy,
) -> Result<DynamicImage, BlurError> {
    let (width, height) = (image.width(), image.height());
    let mismatch = || BlurError::ImagesMustMatch;
    match image {
        DynamicImage::ImageLuma8(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Plane,
                params,
                threading_policy,
                recursive_gaussian_blur_u8,
            )?;
            Ok(DynamicImage::ImageLuma8(
                GrayImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        DynamicImage::ImageLumaA8(img) => {
            let raw = blur_gray_alpha(
                &img,
                width,
                height,
                params,
                threading_policy,
                recursive_gaussian_blur_u8,
            )?;
            Ok(DynamicImage::ImageLumaA8(
                GrayAlphaImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        DynamicImage::ImageRgb8(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels3,
                params,
                threading_policy,
                recursive_gaussian_blur_u8,
            )?;
            Ok(DynamicImage::ImageRgb8(
                RgbImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        DynamicImage::ImageRgba8(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels4,
                params,
                threading_policy,
                recursive_gaussian_blur_u8,
            )?;
            Ok(DynamicImage::ImageRgba8(
                RgbaImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        DynamicImage::ImageLuma16(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Plane,
                params,
                threading_policy,
                recursive_gaussian_blur_u16,
            )?;
            let new_image: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(width, height, raw).ok_or_else(mismatch)?;
            Ok(DynamicImage::ImageLuma16(new_image))
        }
        DynamicImage::ImageLumaA16(img) => {
            let raw = blur_gray_alpha(
                &img,
                width,
                height,
                params,
                threading_policy,
                recursive_gaussian_blur_u16,
            )?;
            let new_image: ImageBuffer<LumaA<u16>, Vec<u16>> =
                ImageBuffer::from_raw(width, height, raw).ok_or_else(mismatch)?;
            Ok(DynamicImage::ImageLumaA16(new_image))
        }
        DynamicImage::ImageRgb16(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels3,
                params,
                threading_policy,
                recursive_gaussian_blur_u16,
            )?;
            let new_image: ImageBuffer<Rgb<u16>, Vec<u16>> =
                ImageBuffer::from_raw(width, height, raw).ok_or_else(mismatch)?;
            Ok(DynamicImage::ImageRgb16(new_image))
        }
        DynamicImage::ImageRgba16(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels4,
                params,
                threading_policy,
                recursive_gaussian_blur_u16,
            )?;
            let new_image: ImageBuffer<Rgba<u16>, Vec<u16>> =
                ImageBuffer::from_raw(width, height, raw).ok_or_else(mismatch)?;
            Ok(DynamicImage::ImageRgba16(new_image))
        }
        DynamicImage::ImageRgb32F(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels3,
                params,
                threading_policy,
                recursive_gaussian_blur_f32,
            )?;
            Ok(DynamicImage::ImageRgb32F(
                Rgb32FImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        DynamicImage::ImageRgba32F(img) => {
            let raw = blur_interleaved(
                &img,
                width,
                height,
                FastBlurChannels::Channels4,
                params,
                threading_policy,
                recursive_gaussian_blur_f32,
            )?;
            Ok(DynamicImage::ImageRgba32F(
                Rgba32FImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
            ))
        }
        other => Err(BlurError::UnsupportedChannels(
            other.color().channel_count() as usize,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_image_keeps_flat_interior() {
        let img = RgbImage::from_pixel(32, 24, Rgb([30, 60, 90]));
        let blurred = recursive_gaussian_blur_image(
            DynamicImage::ImageRgb8(img),
            RecursiveGaussianParams::new(1.5),
            ThreadingPolicy::Single,
        )
        .unwrap();
        let rgb = blurred.to_rgb8();
        assert_eq!(rgb.dimensions(), (32, 24));
        assert_eq!(rgb.get_pixel(16, 12), &Rgb([30, 60, 90]));
    }

    #[test]
    fn test_gray_alpha_planes_stay_apart() {
        let img = GrayAlphaImage::from_pixel(20, 20, LumaA([200, 50]));
        let blurred = recursive_gaussian_blur_image(
            DynamicImage::ImageLumaA8(img),
            RecursiveGaussianParams::new(1.0),
            ThreadingPolicy::Single,
        )
        .unwrap();
        assert_eq!(blurred.to_luma_alpha8().get_pixel(10, 10), &LumaA([200, 50]));
    }
}
