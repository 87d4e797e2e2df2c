/// Workgroup size for `mandelbrot.wgsl#mandelbrot`.
pub const MANDELBROT_WORKGROUP_SIZE_Y: u32 = 64;

/// Corresponds to the `65536u` row stride in `mandelbrot.wgsl#mandelbrot`.
pub const MANDELBROT_DISPATCH_SIZE_Y: u32 = 1024;

/// Pixels handled by one invocation; they share one `u32` of output.
pub const PIXELS_PER_INVOCATION: usize = 4;

/**
Dispatch size for `mandelbrot.wgsl#mandelbrot`.

[WGSL compute shader workgroups reference](https://www.w3.org/TR/WGSL/#compute-shader-workgroups)

With `@workgroup_size(w_x, w_y, w_z)`, `dispatch_workgroups(x, y, z)` runs the
entry point `x * y * z * w_x * w_y * w_z` times. The kernel needs one
invocation per output word (four pixels), `total_work` in all, and uses
`global_invocation_id` to find its word.

A 1280×720 frame is 230400 words. A single dispatch dimension is capped at
[maxComputeWorkgroupsPerDimension](https://www.w3.org/TR/webgpu/#dom-supported-limits-maxcomputeworkgroupsperdimension)
(65535), so larger frames would overflow it; the work is spread over two
dimensions instead.

The workgroup is `(1, 64, 1)`, 64 invocations, which keeps a typical
streaming multiprocessor busy. The `y` dispatch size is fixed at 1024, so
every `x` slice covers `1024 * 64 = 65536` words, and the word index is
`global_invocation_id.x * 65536 + global_invocation_id.y`. The `x` size is
`total_work / 65536 + 1`, which over-dispatches by at most one slice; the
kernel discards invocations past the end of the buffer.
*/
pub fn mandelbrot_dispatch_size(total_work: u64) -> (u32, u32, u32) {
    let slice = (MANDELBROT_DISPATCH_SIZE_Y * MANDELBROT_WORKGROUP_SIZE_Y) as u64;
    let x = (total_work / slice + 1) as u32;
    (x, MANDELBROT_DISPATCH_SIZE_Y, 1)
}

/// Words needed to hold `pixel_count` packed palette indices.
pub fn word_count(pixel_count: usize) -> u64 {
    ((pixel_count + PIXELS_PER_INVOCATION - 1) / PIXELS_PER_INVOCATION) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_all_work() {
        for total_work in [0, 1, 65535, 65536, 65537, 230400, 2_073_600] {
            let (x, y, z) = mandelbrot_dispatch_size(total_work);
            let invocations = x as u64 * y as u64 * z as u64 * MANDELBROT_WORKGROUP_SIZE_Y as u64;
            assert!(invocations >= total_work);
            assert!(invocations - total_work <= 65536);
        }
    }

    #[test]
    fn words_round_up() {
        assert_eq!(word_count(0), 0);
        assert_eq!(word_count(1), 1);
        assert_eq!(word_count(4), 1);
        assert_eq!(word_count(5), 2);
        assert_eq!(word_count(1280 * 720), 230400);
    }
}
