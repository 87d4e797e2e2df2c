//! Accelerator tests. Each one is skipped when no adapter is available.

use mandelbench::{
    gpu::{Accelerated, DeviceBuffer, GpuContext},
    pixel::PixelBuffer,
    render::{Naive, Renderer},
    screen,
    view::View,
};

fn context() -> Option<GpuContext> {
    match GpuContext::init() {
        Ok(context) => Some(context),
        Err(error) => {
            println!("Skipping test: {error}");
            None
        }
    }
}

#[test]
fn allocate_and_release_twice() {
    let Some(context) = context() else { return };
    let size = screen::Size::new(64, 48);

    let first = DeviceBuffer::allocate(&context, size).unwrap();
    assert_eq!(first.word_count(), 64 * 48 / 4);
    first.release();

    let second = DeviceBuffer::allocate(&context, size).unwrap();
    second.release();
}

#[test]
fn oversized_allocation_is_refused() {
    let Some(context) = context() else { return };
    let size = screen::Size::new(u32::MAX, u32::MAX);
    assert!(DeviceBuffer::allocate(&context, size).is_err());
}

#[test]
fn accelerated_resembles_naive() {
    let Some(context) = context() else { return };
    // width not a multiple of four, so words straddle rows
    let size = screen::Size::new(122, 70);
    let view = View::new(-0.5, 0.0, 3.5);

    let mut gpu = Accelerated::new(context, size, 256).unwrap();
    let mut from_gpu = PixelBuffer::new(size);
    gpu.render(&view, &mut from_gpu).unwrap();

    let mut from_cpu = PixelBuffer::new(size);
    Naive::new(256).render(&view, &mut from_cpu).unwrap();

    let matching = from_gpu
        .as_slice()
        .iter()
        .zip(from_cpu.as_slice())
        .filter(|(a, b)| a == b)
        .count();
    assert!(
        matching * 100 >= size.pixel_count() * 95,
        "only {matching} of {} pixels match",
        size.pixel_count()
    );
}

#[test]
fn small_iteration_budget_matches_naive() {
    let size = screen::Size::new(64, 36);
    let view = View::new(-0.5, 0.0, 3.5);

    for max_iterations in [1, 2] {
        let Some(context) = context() else { return };
        let mut gpu = Accelerated::new(context, size, max_iterations).unwrap();
        let mut from_gpu = PixelBuffer::new(size);
        gpu.render(&view, &mut from_gpu).unwrap();

        let mut from_cpu = PixelBuffer::new(size);
        Naive::new(max_iterations).render(&view, &mut from_cpu).unwrap();

        let matching = from_gpu
            .as_slice()
            .iter()
            .zip(from_cpu.as_slice())
            .filter(|(a, b)| a == b)
            .count();
        assert!(
            matching * 100 >= size.pixel_count() * 95,
            "budget {max_iterations}: only {matching} of {} pixels match",
            size.pixel_count()
        );
    }
}

#[test]
fn frames_are_reproducible_across_buffer_reuse() {
    let Some(context) = context() else { return };
    let size = screen::Size::new(40, 30);
    let mut gpu = Accelerated::new(context, size, 128).unwrap();

    let first_view = View::new(-0.5, 0.0, 3.5);
    let mut first = PixelBuffer::new(size);
    gpu.render(&first_view, &mut first).unwrap();

    let mut other = PixelBuffer::new(size);
    gpu.render(&View::new(-1.2, 0.3, 0.1), &mut other).unwrap();

    let mut again = PixelBuffer::new(size);
    gpu.render(&first_view, &mut again).unwrap();
    assert_eq!(first, again);
}

#[test]
fn copy_back_rejects_mismatched_host_buffer() {
    let Some(context) = context() else { return };
    let buffer = DeviceBuffer::allocate(&context, screen::Size::new(8, 8)).unwrap();
    let mut pixels = PixelBuffer::new(screen::Size::new(4, 4));
    assert!(buffer.copy_back(&context, &mut pixels).is_err());
}
