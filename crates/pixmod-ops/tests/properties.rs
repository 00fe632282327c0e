use pixmod_core::{PixelBuffer, Rgba};
use pixmod_ops::color::{hsv_to_rgb, rgb_to_hsv, to_greyscale};
use pixmod_ops::convolve::convolve;
use pixmod_ops::{
    apply, ConvolveOptions, EdgeMode, EmbossMode, FilterPipeline, Kernel, OpsError, Operation,
    PipelineConfig,
};

fn photo(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(width, height).expect("buffer");
    for y in 0..height {
        for x in 0..width {
            let px = Rgba::new(
                ((x * 255) / width) as u8,
                ((y * 255) / height) as u8,
                ((x * 7 + y * 13) % 256) as u8,
                255,
            );
            buf.set(x, y, px).expect("in bounds");
        }
    }
    buf
}

#[test]
fn greyscale_is_idempotent() {
    let once = to_greyscale(&photo(64, 48));
    assert_eq!(to_greyscale(&once), once);
}

#[test]
fn every_rgb_triple_survives_hsv() {
    for r in 0..=255u8 {
        for g in (0..=255u8).step_by(3) {
            for b in (0..=255u8).step_by(17) {
                assert_eq!(hsv_to_rgb(rgb_to_hsv(r, g, b)), [r, g, b]);
            }
        }
    }
}

#[test]
fn identity_kernel_is_noop_for_all_edges() {
    let src = photo(33, 21);
    for edge in [EdgeMode::Clamp, EdgeMode::Wrap, EdgeMode::Mirror] {
        let out = convolve(&src, &Kernel::identity(), ConvolveOptions::default().with_edge(edge));
        assert_eq!(out, src);
    }
}

#[test]
fn operations_do_not_touch_input() {
    let src = photo(40, 30);
    let before = src.clone();
    for op in Operation::ALL {
        let out = apply(op.name(), &src).expect("operation");
        assert_eq!(out.dimensions(), src.dimensions());
    }
    assert_eq!(src, before);
    assert!(matches!(
        apply("sepia", &src),
        Err(OpsError::UnsupportedOperation(name)) if name == "sepia"
    ));
    assert_eq!(src, before);
}

#[test]
fn emboss_modes_agree_on_grey_input() {
    let grey = to_greyscale(&photo(20, 20));
    let a = FilterPipeline::new(PipelineConfig::default().with_emboss_mode(EmbossMode::Greyscale))
        .expect("config")
        .run(Operation::Emboss, &grey)
        .expect("emboss");
    let b = FilterPipeline::new(PipelineConfig::default().with_emboss_mode(EmbossMode::PerChannel))
        .expect("config")
        .run(Operation::Emboss, &grey)
        .expect("emboss");
    assert_eq!(a, b);
}

#[test]
fn wider_sigma_blurs_more() {
    let mut src = PixelBuffer::filled(41, 1, Rgba::BLACK).expect("buffer");
    src.set(20, 0, Rgba::WHITE).expect("in bounds");

    let narrow = FilterPipeline::new(PipelineConfig::default().with_sigma(1.0))
        .expect("config")
        .run(Operation::Blur, &src)
        .expect("blur");
    let wide = FilterPipeline::new(PipelineConfig::default().with_sigma(3.0))
        .expect("config")
        .run(Operation::Blur, &src)
        .expect("blur");

    let peak = |b: &PixelBuffer| b.get(20, 0).expect("in bounds").r;
    assert!(peak(&wide) < peak(&narrow));
    assert!(wide.get(25, 0).expect("in bounds").r > narrow.get(25, 0).expect("in bounds").r);
}

#[test]
fn cancelled_pipeline_runs_on_worker_thread() {
    let src = photo(512, 512);
    let pipeline = FilterPipeline::new(PipelineConfig::default().with_sigma(8.0)).expect("config");
    let token = pipeline.cancel_token().clone();
    token.cancel();

    let handle = std::thread::spawn(move || pipeline.run(Operation::Blur, &src));
    let result = handle.join().expect("thread");
    assert_eq!(result, Err(OpsError::Cancelled));
}
