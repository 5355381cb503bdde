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

pub(crate) type Matrix3x3 = [[f64; 3]; 3];
pub(crate) type Vector3 = [f64; 3];

/// Inverts `matrix` in place using the adjugate.
///
/// Returns `false` and leaves the matrix untouched when it is singular.
pub(crate) fn invert_3x3(matrix: &mut Matrix3x3) -> bool {
    let m = *matrix;
    let mut adjugate = [[0f64; 3]; 3];
    adjugate[0][0] = m[1][1] * m[2][2] - m[1][2] * m[2][1];
    adjugate[0][1] = m[0][2] * m[2][1] - m[0][1] * m[2][2];
    adjugate[0][2] = m[0][1] * m[1][2] - m[0][2] * m[1][1];
    adjugate[1][0] = m[1][2] * m[2][0] - m[1][0] * m[2][2];
    adjugate[1][1] = m[0][0] * m[2][2] - m[0][2] * m[2][0];
    adjugate[1][2] = m[0][2] * m[1][0] - m[0][0] * m[1][2];
    adjugate[2][0] = m[1][0] * m[2][1] - m[1][1] * m[2][0];
    adjugate[2][1] = m[0][1] * m[2][0] - m[0][0] * m[2][1];
    adjugate[2][2] = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let determinant =
        m[0][0] * adjugate[0][0] + m[0][1] * adjugate[1][0] + m[0][2] * adjugate[2][0];
    if determinant.abs() < 1e-10 {
        return false;
    }
    let recip = 1. / determinant;
    for (dst, src) in matrix.iter_mut().zip(adjugate.iter()) {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = s * recip;
        }
    }
    true
}

#[inline]
pub(crate) fn mul_3x3_vector(matrix: &Matrix3x3, vector: &Vector3) -> Vector3 {
    let mut product = [0f64; 3];
    for (dst, row) in product.iter_mut().zip(matrix.iter()) {
        *dst = row[0] * vector[0] + row[1] * vector[1] + row[2] * vector[2];
    }
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let source: Matrix3x3 = [[2., -1., 0.5], [1.5, 3., -2.], [0.25, 4., 1.]];
        let mut inverse = source;
        assert!(invert_3x3(&mut inverse));
        for i in 0..3 {
            for j in 0..3 {
                let value: f64 = (0..3).map(|k| inverse[i][k] * source[k][j]).sum();
                let expected = if i == j { 1. } else { 0. };
                assert!(
                    (value - expected).abs() < 1e-12,
                    "Expected {expected} at ({i}, {j}) but it was {value}"
                );
            }
        }
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let mut singular: Matrix3x3 = [[1., 2., 3.], [2., 4., 6.], [0., 1., 1.]];
        let copy = singular;
        assert!(!invert_3x3(&mut singular));
        assert_eq!(singular, copy);
    }

    #[test]
    fn test_mul_vector() {
        let matrix: Matrix3x3 = [[1., 0., 0.], [0., 2., 0.], [1., 1., 1.]];
        assert_eq!(mul_3x3_vector(&matrix, &[1., 2., 3.]), [1., 4., 6.]);
    }
}
