/*
Vertex counts reported to the depth heuristic for each draw family.  Indirect draws keep their
parameters in GPU memory, so they count as one draw with no vertices.
 */
use shared_gl::defs_gl::GLsizei;

pub fn vertices(count: GLsizei) -> u64 {
    count.max(0) as u64
}

pub fn instanced(count: GLsizei, primcount: GLsizei) -> u64 {
    vertices(count) * vertices(primcount)
}

/// Sum of the per-draw counts of a multi-draw, which is reported as one logical draw.
///
/// # Safety
/// `counts` must point at `drawcount` values, or be null.
pub unsafe fn multi_draw_total(counts: *const GLsizei, drawcount: GLsizei) -> u64 {
    if counts.is_null() || drawcount <= 0 {
        return 0;
    }
    std::slice::from_raw_parts(counts, drawcount as usize)
        .iter()
        .map(|c| vertices(*c))
        .sum()
}
