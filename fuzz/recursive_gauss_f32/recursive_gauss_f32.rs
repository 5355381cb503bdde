#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use recursive_gauss::{
    recursive_gaussian, BlurImage, BlurImageMut, FastBlurChannels, RecursiveGaussianParams,
    ThreadingPolicy,
};

#[derive(Clone, Debug, Arbitrary)]
pub struct SrcImage {
    pub src_width: u8,
    pub src_height: u8,
    pub stride_padding: u8,
    pub sigma: u16,
    pub threads: u8,
    pub value: f32,
}

fuzz_target!(|data: SrcImage| {
    let width = data.src_width as usize;
    let height = data.src_height as usize;
    let stride = width + data.stride_padding as usize % 8;
    // sigma in 0.0..65.535, values out of range must be rejected, not crash
    let params = RecursiveGaussianParams::new(data.sigma as f64 / 1000.);
    let rg = match params.coefficients() {
        Ok(rg) => rg,
        Err(_) => return,
    };
    if width == 0 || height == 0 || !data.value.is_finite() || data.value.abs() > 1e30 {
        return;
    }
    let policy = match data.threads % 3 {
        0 => ThreadingPolicy::Single,
        1 => ThreadingPolicy::Adaptive,
        _ => ThreadingPolicy::Fixed(std::num::NonZeroUsize::new(3).unwrap()),
    };

    let src = vec![data.value; stride * height];
    let image = BlurImage::borrow_strided(
        &src,
        width as u32,
        height as u32,
        stride as u32,
        FastBlurChannels::Plane,
    );
    let mut temp = BlurImageMut::default();
    let mut dst = BlurImageMut::default();
    recursive_gaussian(&rg, &image, &mut temp, &mut dst, policy).unwrap();
    assert!(dst.data.borrow().iter().all(|x| x.is_finite()));
});
