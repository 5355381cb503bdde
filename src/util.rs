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

use std::error::Error;

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct MismatchedSize {
    pub expected: usize,
    pub received: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BlurError {
    ZeroBaseSize,
    MinimumSliceSizeMismatch(MismatchedSize),
    MinimumStrideSizeMismatch(MismatchedSize),
    ImagesMustMatch,
    ExceedingPointerSize,
    NegativeOrZeroSigma,
    /// Sigma is finite and positive but its support radius is below 2 or it
    /// exceeds [crate::RecursiveGaussianParams::MAX_SIGMA].
    SigmaOutOfRange(f64),
    /// Scratch memory of the given amount of bytes could not be reserved.
    AllocationFailed(usize),
    /// Channel count the operation does not accept, plane passes need exactly 1.
    UnsupportedChannels(usize),
}

impl Error for BlurError {}

impl std::fmt::Display for BlurError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BlurError::MinimumSliceSizeMismatch(size) => f.write_fmt(format_args!(
                "Minimum image slice size mismatch: expected={}, received={}",
                size.expected, size.received
            )),
            BlurError::MinimumStrideSizeMismatch(size) => f.write_fmt(format_args!(
                "Minimum stride must have size at least {} but it is {}",
                size.expected, size.received
            )),
            BlurError::ZeroBaseSize => f.write_str("Image size must not be zero"),
            BlurError::ImagesMustMatch => {
                f.write_str("Source and destination images must match in their dimensions")
            }
            BlurError::ExceedingPointerSize => {
                f.write_str("Image bounds exceed pointer capacity")
            }
            BlurError::NegativeOrZeroSigma => {
                f.write_str("Negative, zero or non finite sigma is not supported")
            }
            BlurError::SigmaOutOfRange(sigma) => f.write_fmt(format_args!(
                "Sigma {sigma} is out of range, recursive gaussian needs sigma in 0.53..=64"
            )),
            BlurError::AllocationFailed(bytes) => f.write_fmt(format_args!(
                "Failed to allocate {bytes} bytes of scratch memory"
            )),
            BlurError::UnsupportedChannels(channels) => f.write_fmt(format_args!(
                "Images with {channels} channels are not supported here"
            )),
        }
    }
}

/// Validates a strided plane of `width * cn` items per row.
pub(crate) fn check_slice_size<T>(
    arr: &[T],
    stride: usize,
    width: usize,
    height: usize,
    cn: usize,
) -> Result<(), BlurError> {
    if width == 0 || height == 0 {
        return Err(BlurError::ZeroBaseSize);
    }
    let row_length = width.checked_mul(cn).ok_or(BlurError::ExceedingPointerSize)?;
    if stride < row_length {
        return Err(BlurError::MinimumStrideSizeMismatch(MismatchedSize {
            expected: row_length,
            received: stride,
        }));
    }
    let required = stride
        .checked_mul(height - 1)
        .and_then(|x| x.checked_add(row_length))
        .ok_or(BlurError::ExceedingPointerSize)?;
    if arr.len() < required {
        return Err(BlurError::MinimumSliceSizeMismatch(MismatchedSize {
            expected: required,
            received: arr.len(),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_slice_size_accepts_short_last_row() {
        let data = vec![0f32; 10 * 2 + 7];
        assert!(check_slice_size(&data, 10, 7, 3, 1).is_ok());
    }

    #[test]
    fn test_check_slice_size_rejects() {
        let data = vec![0f32; 20];
        assert_eq!(
            check_slice_size(&data, 10, 0, 2, 1),
            Err(BlurError::ZeroBaseSize)
        );
        assert_eq!(
            check_slice_size(&data, 4, 5, 2, 1),
            Err(BlurError::MinimumStrideSizeMismatch(MismatchedSize {
                expected: 5,
                received: 4,
            }))
        );
        assert_eq!(
            check_slice_size(&data, 10, 10, 3, 1),
            Err(BlurError::MinimumSliceSizeMismatch(MismatchedSize {
                expected: 30,
                received: 20,
            }))
        );
    }
}
