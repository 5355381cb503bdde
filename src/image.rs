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

use crate::scratch::try_zeroed_vec;
use crate::util::check_slice_size;
use crate::{BlurError, FastBlurChannels};
use std::fmt::Debug;

#[derive(Debug)]
pub enum BufferStore<'a, T: Copy + Debug> {
    Borrowed(&'a mut [T]),
    Owned(Vec<T>),
}

impl<T: Copy + Debug> BufferStore<'_, T> {
    #[allow(clippy::should_implement_trait)]
    pub fn borrow(&self) -> &[T] {
        match self {
            Self::Borrowed(p_ref) => p_ref,
            Self::Owned(vec) => vec,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn borrow_mut(&mut self) -> &mut [T] {
        match self {
            Self::Borrowed(p_ref) => p_ref,
            Self::Owned(vec) => vec,
        }
    }

    pub(crate) fn resize(&mut self, new_size: usize, value: T) {
        match self {
            Self::Borrowed(_) => {}
            Self::Owned(vec) => vec.resize(new_size, value),
        }
    }
}

/// Immutable image view.
///
/// [BlurImage::row] is the read accessor the recursive passes consume, the
/// image storage itself always belongs to the caller.
pub struct BlurImage<'a, T: Clone + Copy + Default + Debug> {
    pub data: std::borrow::Cow<'a, [T]>,
    pub width: u32,
    pub height: u32,
    /// Image stride, items per row, might be 0
    pub stride: u32,
    pub channels: FastBlurChannels,
}

/// Mutable image view, either borrowed or owned.
pub struct BlurImageMut<'a, T: Clone + Copy + Default + Debug> {
    pub data: BufferStore<'a, T>,
    pub width: u32,
    pub height: u32,
    /// Image stride, items per row, might be 0
    pub stride: u32,
    pub channels: FastBlurChannels,
}

impl<T: Clone + Copy + Default + Debug> Default for BlurImageMut<'_, T> {
    fn default() -> Self {
        BlurImageMut {
            data: BufferStore::Owned(Vec::new()),
            width: 0,
            height: 0,
            stride: 0,
            channels: FastBlurChannels::Plane,
        }
    }
}

impl<'a, T: Clone + Copy + Default + Debug> BlurImage<'a, T> {
    /// Allocates default image layout for given [FastBlurChannels]
    pub fn alloc(width: u32, height: u32, channels: FastBlurChannels) -> Self {
        Self {
            data: std::borrow::Cow::Owned(vec![
                T::default();
                width as usize
                    * height as usize
                    * channels.channels()
            ]),
            width,
            height,
            stride: width * channels.channels() as u32,
            channels,
        }
    }

    /// Borrows existing data
    /// Stride will be default `width * channels.channels()`
    pub fn borrow(arr: &'a [T], width: u32, height: u32, channels: FastBlurChannels) -> Self {
        Self {
            data: std::borrow::Cow::Borrowed(arr),
            width,
            height,
            stride: width * channels.channels() as u32,
            channels,
        }
    }

    /// Borrows existing data with an explicit row stride in items.
    pub fn borrow_strided(
        arr: &'a [T],
        width: u32,
        height: u32,
        stride: u32,
        channels: FastBlurChannels,
    ) -> Self {
        Self {
            data: std::borrow::Cow::Borrowed(arr),
            width,
            height,
            stride,
            channels,
        }
    }

    /// Returns row stride
    #[inline]
    pub fn row_stride(&self) -> u32 {
        if self.stride == 0 {
            self.width * self.channels.channels() as u32
        } else {
            self.stride
        }
    }

    /// Returns the `y`-th row, exactly `width * channels` items long.
    ///
    /// # Panics
    /// When `y` is outside of the image or the layout was not checked.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.row_stride() as usize;
        &self.data.as_ref()[start..start + self.width as usize * self.channels.channels()]
    }

    #[inline]
    pub fn check_layout(&self) -> Result<(), BlurError> {
        check_slice_size(
            self.data.as_ref(),
            self.row_stride() as usize,
            self.width as usize,
            self.height as usize,
            self.channels.channels(),
        )
    }

    /// Checks if it is matches the size of the other image
    #[inline]
    pub fn size_matches_mut(&self, other: &BlurImageMut<'_, T>) -> Result<(), BlurError> {
        if self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
        {
            return Ok(());
        }
        Err(BlurError::ImagesMustMatch)
    }

    /// Deep clone as mutable image
    pub fn clone_as_mut<'f>(&self) -> BlurImageMut<'f, T> {
        BlurImageMut {
            data: BufferStore::Owned(self.data.to_vec()),
            width: self.width,
            height: self.height,
            stride: self.stride,
            channels: self.channels,
        }
    }
}

impl<'a, T: Clone + Copy + Default + Debug> BlurImageMut<'a, T> {
    /// Allocates default image layout for given [FastBlurChannels]
    pub fn alloc(width: u32, height: u32, channels: FastBlurChannels) -> Self {
        Self {
            data: BufferStore::Owned(vec![
                T::default();
                width as usize * height as usize * channels.channels()
            ]),
            width,
            height,
            stride: width * channels.channels() as u32,
            channels,
        }
    }

    /// Same as [BlurImageMut::alloc] but reports allocation failure instead of aborting.
    pub fn try_alloc(
        width: u32,
        height: u32,
        channels: FastBlurChannels,
    ) -> Result<BlurImageMut<'static, T>, BlurError> {
        let length = (width as usize)
            .checked_mul(height as usize)
            .and_then(|x| x.checked_mul(channels.channels()))
            .ok_or(BlurError::ExceedingPointerSize)?;
        Ok(BlurImageMut {
            data: BufferStore::Owned(try_zeroed_vec(length)?),
            width,
            height,
            stride: width * channels.channels() as u32,
            channels,
        })
    }

    /// Mutable borrows existing data
    /// Stride will be default `width * channels.channels()`
    pub fn borrow(arr: &'a mut [T], width: u32, height: u32, channels: FastBlurChannels) -> Self {
        Self {
            data: BufferStore::Borrowed(arr),
            width,
            height,
            stride: width * channels.channels() as u32,
            channels,
        }
    }

    /// Mutable borrows existing data with an explicit row stride in items.
    pub fn borrow_strided(
        arr: &'a mut [T],
        width: u32,
        height: u32,
        stride: u32,
        channels: FastBlurChannels,
    ) -> Self {
        Self {
            data: BufferStore::Borrowed(arr),
            width,
            height,
            stride,
            channels,
        }
    }

    /// Returns row stride
    #[inline]
    pub fn row_stride(&self) -> u32 {
        if self.stride == 0 {
            self.width * self.channels.channels() as u32
        } else {
            self.stride
        }
    }

    /// Returns the `y`-th row for writing, exactly `width * channels` items long.
    ///
    /// # Panics
    /// When `y` is outside of the image or the layout was not checked.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.row_stride() as usize;
        let length = self.width as usize * self.channels.channels();
        &mut self.data.borrow_mut()[start..start + length]
    }

    /// Checks if layout matches necessary requirements.
    ///
    /// Owned storage is resized to the shape of `other` when it is provided.
    #[inline]
    pub fn check_layout(&mut self, other: Option<&BlurImage<'_, T>>) -> Result<(), BlurError> {
        if let Some(other) = other {
            if matches!(self.data, BufferStore::Owned(_)) {
                self.resize(other.width, other.height, other.channels);
                return Ok(());
            }
        }
        check_slice_size(
            self.data.borrow(),
            self.row_stride() as usize,
            self.width as usize,
            self.height as usize,
            self.channels.channels(),
        )
    }

    /// Checks if it is matches the size of the other image
    #[inline]
    pub fn size_matches(&self, other: &BlurImage<'_, T>) -> Result<(), BlurError> {
        if self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
        {
            return Ok(());
        }
        Err(BlurError::ImagesMustMatch)
    }

    #[inline]
    pub fn to_immutable_ref(&self) -> BlurImage<'_, T> {
        BlurImage {
            data: std::borrow::Cow::Borrowed(self.data.borrow()),
            stride: self.row_stride(),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    #[inline]
    pub(crate) fn resize(&mut self, width: u32, height: u32, channels: FastBlurChannels) {
        self.height = height;
        self.width = width;
        self.channels = channels;
        self.stride = self.width * self.channels.channels() as u32;
        self.data.resize(
            self.row_stride() as usize * self.height as usize,
            T::default(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_honour_stride() {
        let data = (0..12).map(|x| x as f32).collect::<Vec<f32>>();
        let image = BlurImage::borrow_strided(&data, 3, 3, 4, FastBlurChannels::Plane);
        image.check_layout().unwrap();
        assert_eq!(image.row(0), &[0., 1., 2.]);
        assert_eq!(image.row(2), &[8., 9., 10.]);
    }

    #[test]
    fn test_owned_destination_is_resized() {
        let data = vec![1u8; 5 * 2 * 3];
        let image = BlurImage::borrow(&data, 5, 2, FastBlurChannels::Channels3);
        let mut dst = BlurImageMut::default();
        dst.check_layout(Some(&image)).unwrap();
        image.size_matches_mut(&dst).unwrap();
        assert_eq!(dst.data.borrow().len(), 30);
        assert_eq!(dst.row_mut(1).len(), 15);
    }

    #[test]
    fn test_borrowed_destination_is_validated() {
        let data = vec![1u8; 10];
        let image = BlurImage::borrow(&data, 5, 2, FastBlurChannels::Plane);
        let mut storage = vec![0u8; 6];
        let mut dst = BlurImageMut::borrow(&mut storage, 5, 2, FastBlurChannels::Plane);
        assert!(dst.check_layout(Some(&image)).is_err());
    }
}
