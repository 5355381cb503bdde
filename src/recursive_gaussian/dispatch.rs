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

use crate::recursive_gaussian::coefficients::RecursiveGaussian;
use crate::recursive_gaussian::horizontal::filter_row_scalar;
use crate::recursive_gaussian::vertical::{filter_columns_scalar, VerticalPlanes};
use std::ops::Range;
use std::sync::OnceLock;

/// Vector width the recursive passes are compiled for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VectorWidth {
    /// One lane, available everywhere.
    Scalar,
    /// SSE 4.1, four lanes.
    Sse,
    /// SSE 4.1 with FMA, four lanes.
    SseFma,
    /// AVX2 with FMA, eight lanes in columns and four in rows.
    Avx2Fma,
    /// NEON, four lanes.
    Neon,
}

impl VectorWidth {
    /// Lanes of one vector in the vertical pass.
    pub const fn lanes(self) -> usize {
        match self {
            VectorWidth::Scalar => 1,
            VectorWidth::Sse | VectorWidth::SseFma | VectorWidth::Neon => 4,
            VectorWidth::Avx2Fma => 8,
        }
    }

    /// Whether this build carries the width and the running CPU supports it.
    pub fn is_available(self) -> bool {
        RecursiveGaussianKernels::for_width(self).is_some()
    }

    /// The widest width available on the running CPU.
    pub fn detect() -> VectorWidth {
        [
            VectorWidth::Avx2Fma,
            VectorWidth::SseFma,
            VectorWidth::Sse,
            VectorWidth::Neon,
        ]
        .into_iter()
        .find(|x| x.is_available())
        .unwrap_or(VectorWidth::Scalar)
    }
}

pub(crate) type RowKernel = fn(&RecursiveGaussian, &[f32], &mut [f32]);

pub(crate) type ColumnsKernel = fn(&RecursiveGaussian, &VerticalPlanes, Range<usize>, &mut [f32]);

/// Row and column filters of one [VectorWidth].
#[derive(Copy, Clone)]
pub(crate) struct RecursiveGaussianKernels {
    pub(crate) width: VectorWidth,
    pub(crate) row: RowKernel,
    pub(crate) columns: ColumnsKernel,
}

impl RecursiveGaussianKernels {
    /// Kernels of `width`, `None` when the build or the CPU lacks it.
    pub(crate) fn for_width(width: VectorWidth) -> Option<RecursiveGaussianKernels> {
        match width {
            VectorWidth::Scalar => Some(RecursiveGaussianKernels {
                width,
                row: filter_row_scalar,
                columns: filter_columns_scalar,
            }),
            VectorWidth::Sse => {
                #[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"))]
                {
                    if std::arch::is_x86_feature_detected!("sse4.1") {
                        use crate::sse::{recursive_gaussian_columns_sse, recursive_gaussian_row_sse};
                        return Some(RecursiveGaussianKernels {
                            width,
                            row: recursive_gaussian_row_sse,
                            columns: recursive_gaussian_columns_sse,
                        });
                    }
                }
                None
            }
            VectorWidth::SseFma => {
                #[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), feature = "sse"))]
                {
                    if std::arch::is_x86_feature_detected!("sse4.1")
                        && std::arch::is_x86_feature_detected!("fma")
                    {
                        use crate::sse::{
                            recursive_gaussian_columns_sse_fma, recursive_gaussian_row_sse_fma,
                        };
                        return Some(RecursiveGaussianKernels {
                            width,
                            row: recursive_gaussian_row_sse_fma,
                            columns: recursive_gaussian_columns_sse_fma,
                        });
                    }
                }
                None
            }
            VectorWidth::Avx2Fma => {
                #[cfg(all(target_arch = "x86_64", feature = "avx", feature = "sse"))]
                {
                    if std::arch::is_x86_feature_detected!("avx2")
                        && std::arch::is_x86_feature_detected!("fma")
                        && std::arch::is_x86_feature_detected!("sse4.1")
                    {
                        use crate::avx::recursive_gaussian_columns_avx_fma;
                        use crate::sse::recursive_gaussian_row_sse_fma;
                        return Some(RecursiveGaussianKernels {
                            width,
                            row: recursive_gaussian_row_sse_fma,
                            columns: recursive_gaussian_columns_avx_fma,
                        });
                    }
                }
                None
            }
            VectorWidth::Neon => {
                #[cfg(all(target_arch = "aarch64", feature = "neon"))]
                {
                    if std::arch::is_aarch64_feature_detected!("neon") {
                        use crate::neon::{
                            recursive_gaussian_columns_neon, recursive_gaussian_row_neon,
                        };
                        return Some(RecursiveGaussianKernels {
                            width,
                            row: recursive_gaussian_row_neon,
                            columns: recursive_gaussian_columns_neon,
                        });
                    }
                }
                None
            }
        }
    }

    /// Kernels of the widest available width, probed once per process.
    pub(crate) fn detected() -> &'static RecursiveGaussianKernels {
        static KERNELS: OnceLock<RecursiveGaussianKernels> = OnceLock::new();
        KERNELS.get_or_init(|| {
            let width = VectorWidth::detect();
            log::debug!(
                "Recursive gaussian selected {:?}, {} lanes per column vector",
                width,
                width.lanes()
            );
            RecursiveGaussianKernels::for_width(width).unwrap_or(RecursiveGaussianKernels {
                width: VectorWidth::Scalar,
                row: filter_row_scalar,
                columns: filter_columns_scalar,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_is_always_available() {
        assert!(VectorWidth::Scalar.is_available());
        let detected = RecursiveGaussianKernels::detected();
        assert!(detected.width.is_available());
        assert_eq!(detected.width, VectorWidth::detect());
    }

    #[test]
    fn test_every_width_filters_rows_like_scalar() {
        let rg = RecursiveGaussian::new(2.7);
        let scalar = RecursiveGaussianKernels::for_width(VectorWidth::Scalar).unwrap();
        for width in [
            VectorWidth::Sse,
            VectorWidth::SseFma,
            VectorWidth::Avx2Fma,
            VectorWidth::Neon,
        ] {
            let Some(kernels) = RecursiveGaussianKernels::for_width(width) else {
                continue;
            };
            for length in [1usize, 3, 9, 10, 11, 12, 13, 31, 64, 257] {
                let src = (0..length)
                    .map(|i| ((i * 13 + 5) % 29) as f32 / 29.)
                    .collect::<Vec<f32>>();
                let mut expected = vec![0f32; length];
                let mut received = vec![0f32; length];
                (scalar.row)(&rg, &src, &mut expected);
                (kernels.row)(&rg, &src, &mut received);
                for (i, (&a, &b)) in expected.iter().zip(received.iter()).enumerate() {
                    assert!(
                        (a - b).abs() <= 2e-5 * a.abs().max(1.),
                        "{width:?}, length {length}: at {i} expected {a} but it was {b}"
                    );
                }
            }
        }
    }
}
