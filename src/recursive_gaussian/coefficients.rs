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

use crate::recursive_gaussian::matrix::{invert_3x3, mul_3x3_vector, Matrix3x3};

/// Amount of consecutive outputs the horizontal recursion advances at once.
///
/// Powers of the feedback constants grow quickly, going past four
/// outputs per step costs too much f32 precision.
pub(crate) const MAX_UNROLL: usize = 4;

/// Coefficients of the recursive gaussian approximation for a single sigma.
///
/// Implements "Recursive Implementation of the Gaussian Filter Using Truncated
/// Cosine Functions" by Charalampidis (2016): three second order recursions,
/// one per odd harmonic `k = 1, 3, 5`, whose sum approximates the gaussian kernel.
/// Each per branch table holds [MAX_UNROLL] lanes, branch `i` occupies
/// `[4 * i..4 * i + 4]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursiveGaussian {
    pub(crate) sigma: f64,
    pub(crate) radius: usize,
    /// Weight of the input sample for output `j` of an unrolled block.
    pub(crate) mul_in: [f32; 3 * MAX_UNROLL],
    /// Weight of the last output preceding an unrolled block.
    pub(crate) mul_prev: [f32; 3 * MAX_UNROLL],
    /// Weight of the output two steps before an unrolled block.
    pub(crate) mul_prev2: [f32; 3 * MAX_UNROLL],
    /// Forward constant, replicated to all lanes.
    pub(crate) n2: [f32; 3 * MAX_UNROLL],
    /// Feedback constant, replicated to all lanes.
    pub(crate) d1: [f32; 3 * MAX_UNROLL],
}

/// Linear form of one recursion output over the block inputs and the
/// two outputs that precede the block.
#[derive(Debug, Clone, Copy, Default)]
struct LinearForm {
    prev: f64,
    prev2: f64,
    input: [f64; MAX_UNROLL],
}

impl LinearForm {
    #[inline]
    fn scaled_sub(self, scale: f64, other: LinearForm) -> LinearForm {
        let mut input = self.input;
        for (dst, &src) in input.iter_mut().zip(other.input.iter()) {
            *dst -= scale * src;
        }
        LinearForm {
            prev: self.prev - scale * other.prev,
            prev2: self.prev2 - scale * other.prev2,
            input,
        }
    }
}

/// Multipliers for up to [MAX_UNROLL] consecutive outputs of a single branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UnrolledRecursion {
    pub(crate) mul_in: [f64; MAX_UNROLL],
    pub(crate) mul_prev: [f64; MAX_UNROLL],
    pub(crate) mul_prev2: [f64; MAX_UNROLL],
}

/// Composes `y[k] = n2 * x[k] - d1 * y[k - 1] - y[k - 2]` with itself.
///
/// Output `j` of a block equals
/// `sum(mul_in[j - i] * x[i], i <= j) + mul_prev[j] * y[-1] + mul_prev2[j] * y[-2]`.
pub(crate) fn expand_recursion(n2: f64, d1: f64) -> UnrolledRecursion {
    let mut outputs = [LinearForm::default(); MAX_UNROLL];
    let mut before_last = LinearForm {
        prev2: 1.,
        ..LinearForm::default()
    };
    let mut last = LinearForm {
        prev: 1.,
        ..LinearForm::default()
    };
    for (j, output) in outputs.iter_mut().enumerate() {
        let mut current = LinearForm::default();
        current.input[j] = n2;
        let current = current.scaled_sub(d1, last).scaled_sub(1., before_last);
        *output = current;
        before_last = last;
        last = current;
    }

    let mut unrolled = UnrolledRecursion {
        mul_in: [0.; MAX_UNROLL],
        mul_prev: [0.; MAX_UNROLL],
        mul_prev2: [0.; MAX_UNROLL],
    };
    for (j, output) in outputs.iter().enumerate() {
        unrolled.mul_prev[j] = output.prev;
        unrolled.mul_prev2[j] = output.prev2;
        // Toeplitz: the weight of x[0] in output j is the weight of x[i] in output i + j
        unrolled.mul_in[j] = output.input[0];
    }
    unrolled
}

impl RecursiveGaussian {
    /// Derives the recursion for `sigma`.
    ///
    /// Sigma must be finite and large enough for a radius of at least 2,
    /// see [crate::RecursiveGaussianParams::validate]. Out of range values
    /// are a caller bug and produce meaningless coefficients.
    pub fn new(sigma: f64) -> RecursiveGaussian {
        debug_assert!(sigma.is_finite() && sigma > 0., "Sigma must be positive");

        let radius = (3.2795 * sigma + 0.2546).round();

        let pi_div_2r = std::f64::consts::PI / (2.0 * radius);
        let omega = [pi_div_2r, 3.0 * pi_div_2r, 5.0 * pi_div_2r];

        let p_1 = 1.0 / (0.5 * omega[0]).tan();
        let p_3 = -1.0 / (0.5 * omega[1]).tan();
        let p_5 = 1.0 / (0.5 * omega[2]).tan();

        let r_1 = p_1 * p_1 / omega[0].sin();
        let r_3 = -p_3 * p_3 / omega[1].sin();
        let r_5 = p_5 * p_5 / omega[2].sin();

        let neg_half_sigma2 = -0.5 * sigma * sigma;
        let recip_radius = 1.0 / radius;
        let rho = omega.map(|w| (neg_half_sigma2 * w * w).exp() * recip_radius);

        let d_13 = p_1 * r_3 - r_1 * p_3;
        let d_35 = p_3 * r_5 - r_3 * p_5;
        let d_51 = p_5 * r_1 - r_5 * p_1;

        let recip_d13 = 1.0 / d_13;
        let zeta_15 = d_35 * recip_d13;
        let zeta_35 = d_51 * recip_d13;

        let mut a: Matrix3x3 = [[p_1, p_3, p_5], [r_1, r_3, r_5], [zeta_15, zeta_35, 1.]];
        let inverted = invert_3x3(&mut a);
        debug_assert!(inverted, "Recursive gaussian system is singular for sigma {sigma}");
        let gamma = [
            1.,
            radius * radius - sigma * sigma,
            zeta_15 * rho[0] + zeta_35 * rho[1] + rho[2],
        ];
        let beta = mul_3x3_vector(&a, &gamma);

        // IIR weights must be normalized
        let sum = beta[0] * p_1 + beta[1] * p_3 + beta[2] * p_5;
        debug_assert!(
            (sum - 1.).abs() < 1e-12,
            "Recursive gaussian weights are not normalized: {sum}"
        );

        let mut rg = RecursiveGaussian {
            sigma,
            radius: radius as usize,
            mul_in: [0.; 3 * MAX_UNROLL],
            mul_prev: [0.; 3 * MAX_UNROLL],
            mul_prev2: [0.; 3 * MAX_UNROLL],
            n2: [0.; 3 * MAX_UNROLL],
            d1: [0.; 3 * MAX_UNROLL],
        };

        // Poles approach the unit circle as sigma grows, so the flat field gain
        // 2 * n2 / (2 + d1) is evaluated with the f32 feedback actually used.
        let d1 = omega.map(|w| (-2.0 * w.cos()) as f32 as f64);
        let mut n2 = [0f64; 3];
        for (i, (&w, &b)) in omega.iter().zip(beta.iter()).enumerate() {
            n2[i] = -b * (w * (radius + 1.0)).cos();
        }
        let gain: f64 = n2.iter().zip(d1.iter()).map(|(&n2, &d1)| 2. * n2 / (2. + d1)).sum();
        let n2 = n2.map(|v| v / gain);

        for (i, (&n2, &d1)) in n2.iter().zip(d1.iter()).enumerate() {
            let unrolled = expand_recursion(n2, d1);
            let lanes = 4 * i..4 * i + MAX_UNROLL;
            rg.n2[lanes.clone()].fill(n2 as f32);
            rg.d1[lanes.clone()].fill(d1 as f32);
            for (dst, &src) in rg.mul_in[lanes.clone()].iter_mut().zip(unrolled.mul_in.iter()) {
                *dst = src as f32;
            }
            for (dst, &src) in rg.mul_prev[lanes.clone()]
                .iter_mut()
                .zip(unrolled.mul_prev.iter())
            {
                *dst = src as f32;
            }
            for (dst, &src) in rg.mul_prev2[lanes].iter_mut().zip(unrolled.mul_prev2.iter()) {
                *dst = src as f32;
            }
        }
        rg
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Support radius `N`, inputs further than `N` away do not contribute.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Forward constants `n2` of branches `k = 1, 3, 5`.
    pub fn n2(&self) -> [f32; 3] {
        [self.n2[0], self.n2[4], self.n2[8]]
    }

    /// Feedback constants `d1` of branches `k = 1, 3, 5`.
    pub fn d1(&self) -> [f32; 3] {
        [self.d1[0], self.d1[4], self.d1[8]]
    }
}

/// Support radius the recursion derives from `sigma`.
#[inline]
pub fn recursive_gaussian_radius(sigma: f64) -> usize {
    (3.2795 * sigma + 0.2546).round().max(0.) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(value: f64, expected: f64, tolerance: f64, what: &str) {
        assert!(
            (value - expected).abs() <= tolerance * expected.abs().max(1.),
            "{what}: expected {expected} but it was {value}"
        );
    }

    #[test]
    fn test_radius_of_unit_sigma() {
        assert_eq!(RecursiveGaussian::new(1.0).radius(), 4);
        assert_eq!(recursive_gaussian_radius(1.0), 4);
        assert_eq!(RecursiveGaussian::new(2.0).radius(), 7);
    }

    #[test]
    fn test_radius_is_monotonic() {
        let mut last = 0;
        for i in 0..2000 {
            let sigma = 0.4 + i as f64 * 0.05;
            let radius = recursive_gaussian_radius(sigma);
            assert!(radius >= last, "Radius decreased at sigma {sigma}");
            last = radius;
        }
    }

    #[test]
    fn test_expansion_matches_closed_forms() {
        for &(n, d) in &[(0.0885f64, -1.8477f64), (-0.1159, -0.7653), (0.5, 0.25)] {
            let d_2 = d * d;
            let unrolled = expand_recursion(n, d);
            let mul_prev = [-d, d_2 - 1., -d_2 * d + 2. * d, d_2 * d_2 - 3. * d_2 + 1.];
            let mul_prev2 = [-1., d, -d_2 + 1., d_2 * d - 2. * d];
            let mul_in = [n, -d * n, d_2 * n - n, -d_2 * d * n + 2. * d * n];
            for j in 0..MAX_UNROLL {
                assert_close(unrolled.mul_prev[j], mul_prev[j], 1e-14, "mul_prev");
                assert_close(unrolled.mul_prev2[j], mul_prev2[j], 1e-14, "mul_prev2");
                assert_close(unrolled.mul_in[j], mul_in[j], 1e-14, "mul_in");
            }
        }
    }

    #[test]
    fn test_expansion_reproduces_recursion() {
        let (n, d) = (0.12f64, -1.6f64);
        let unrolled = expand_recursion(n, d);
        let inputs = [0.3f64, -1.2, 2.5, 0.75];
        let (prev, prev2) = (0.4f64, -0.9f64);

        let mut y = [prev2, prev, 0., 0., 0., 0.];
        for j in 0..4 {
            y[j + 2] = n * inputs[j] - d * y[j + 1] - y[j];
        }
        for j in 0..4 {
            let mut value = unrolled.mul_prev[j] * prev + unrolled.mul_prev2[j] * prev2;
            for i in 0..=j {
                value += unrolled.mul_in[j - i] * inputs[i];
            }
            assert_close(value, y[j + 2], 1e-12, "unrolled output");
        }
    }

    #[test]
    fn test_forward_constants_are_normalized() {
        // A constant input c is seen twice per step, the steady state of branch k
        // is 2 * c * n2 / (2 + d1), which must sum to c over the branches.
        for &sigma in &[0.6f64, 1., 1.5, 2., 3.3, 7., 12., 25., 40., 64.] {
            let rg = RecursiveGaussian::new(sigma);
            let gain: f64 = rg
                .n2()
                .iter()
                .zip(rg.d1().iter())
                .map(|(&n2, &d1)| 2. * n2 as f64 / (2. + d1 as f64))
                .sum();
            assert_close(gain, 1., 1e-6, "flat field gain");
        }
    }

    #[test]
    fn test_unit_sigma_constants() {
        let rg = RecursiveGaussian::new(1.0);
        let expected_n2 = [0.08857611567198971f32, -0.11590442129006143, 0.03335655303266752];
        let expected_d1 = [-1.8477590650225735f32, -0.7653668647301797, 0.7653668647301795];
        for i in 0..3 {
            assert!((rg.n2()[i] - expected_n2[i]).abs() < 1e-6);
            assert!((rg.d1()[i] - expected_d1[i]).abs() < 1e-6);
            for lane in 0..4 {
                assert_eq!(rg.n2[4 * i + lane], rg.n2()[i]);
                assert_eq!(rg.d1[4 * i + lane], rg.d1()[i]);
            }
            assert_eq!(rg.mul_in[4 * i], rg.n2()[i]);
            assert_eq!(rg.mul_prev[4 * i], -rg.d1()[i]);
            assert_eq!(rg.mul_prev2[4 * i], -1.);
        }
    }
}
