use criterion::{criterion_group, criterion_main, Criterion};
use recursive_gauss::{
    recursive_gaussian, recursive_gaussian_blur_u8, BlurImage, BlurImageMut, FastBlurChannels,
    RecursiveGaussianParams, ThreadingPolicy,
};

fn synthetic_image(width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..width * height * channels)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let width = 1920usize;
    let height = 1080usize;
    let rgba = synthetic_image(width, height, 4);
    let plane = rgba
        .iter()
        .step_by(4)
        .map(|&x| x as f32 * (1. / 255.))
        .collect::<Vec<f32>>();

    for sigma in [1.5f64, 7.5, 35.] {
        let params = RecursiveGaussianParams::new(sigma);
        let rg = params.coefficients().unwrap();
        c.bench_function(format!("Plane f32 recursive gauss: {sigma}").as_str(), |b| {
            let src = BlurImage::borrow(&plane, width as u32, height as u32, FastBlurChannels::Plane);
            let mut temp = BlurImageMut::alloc(width as u32, height as u32, FastBlurChannels::Plane);
            let mut dst = BlurImageMut::alloc(width as u32, height as u32, FastBlurChannels::Plane);
            b.iter(|| {
                recursive_gaussian(&rg, &src, &mut temp, &mut dst, ThreadingPolicy::Adaptive)
                    .unwrap();
            })
        });

        c.bench_function(
            format!("Plane f32 recursive gauss single thread: {sigma}").as_str(),
            |b| {
                let src =
                    BlurImage::borrow(&plane, width as u32, height as u32, FastBlurChannels::Plane);
                let mut temp =
                    BlurImageMut::alloc(width as u32, height as u32, FastBlurChannels::Plane);
                let mut dst =
                    BlurImageMut::alloc(width as u32, height as u32, FastBlurChannels::Plane);
                b.iter(|| {
                    recursive_gaussian(&rg, &src, &mut temp, &mut dst, ThreadingPolicy::Single)
                        .unwrap();
                })
            },
        );

        c.bench_function(format!("RGBA u8 recursive gauss: {sigma}").as_str(), |b| {
            let src = BlurImage::borrow(
                &rgba,
                width as u32,
                height as u32,
                FastBlurChannels::Channels4,
            );
            let mut dst =
                BlurImageMut::alloc(width as u32, height as u32, FastBlurChannels::Channels4);
            b.iter(|| {
                recursive_gaussian_blur_u8(&src, &mut dst, params, ThreadingPolicy::Adaptive)
                    .unwrap();
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
