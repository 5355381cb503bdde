#![no_main]

use libfuzzer_sys::fuzz_target;
use recursive_gauss::{
    recursive_gaussian_blur_u8, BlurImage, BlurImageMut, FastBlurChannels,
    RecursiveGaussianParams, ThreadingPolicy,
};

fuzz_target!(|data: (u8, u8, u8, u8)| {
    fuzz_u8(
        data.0 as usize,
        data.1 as usize,
        data.2 as f64 / 8.,
        data.3,
        FastBlurChannels::Channels4,
    );
    fuzz_u8(
        data.0 as usize,
        data.1 as usize,
        data.2 as f64 / 8.,
        data.3,
        FastBlurChannels::Channels3,
    );
    fuzz_u8(
        data.0 as usize,
        data.1 as usize,
        data.2 as f64 / 8.,
        data.3,
        FastBlurChannels::Plane,
    );
});

fn fuzz_u8(width: usize, height: usize, sigma: f64, value: u8, channels: FastBlurChannels) {
    if width == 0 || height == 0 {
        return;
    }
    let src = vec![value; width * height * channels.channels()];
    let image = BlurImage::borrow(&src, width as u32, height as u32, channels);
    let mut dst = BlurImageMut::default();
    let params = RecursiveGaussianParams::new(sigma);
    let result = recursive_gaussian_blur_u8(&image, &mut dst, params, ThreadingPolicy::Single);
    if params.validate().is_ok() {
        result.unwrap();
        assert_eq!(dst.data.borrow().len(), src.len());
    } else {
        assert!(result.is_err());
    }
}
