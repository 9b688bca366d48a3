//! Hardware-agnostic analyzers: simulate a FIFO vertex cache, a
//! direct-mapped vertex fetch cache, and a software rasterizer, and report
//! the resulting cache/overdraw statistics without touching any buffer.

use crate::vecmath::{self, Vec3};
use crate::{DecodePosition, Index, VertexDataAdapter};
use std::collections::VecDeque;

/// Default FIFO cache size used by [`analyze_vertex_cache`] when the caller
/// does not have a particular GPU cache in mind.
pub const DEFAULT_ANALYZE_CACHE_SIZE: u32 = 32;

/// Result of simulating a FIFO vertex transform cache over an index buffer.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct VertexCacheStatistics {
    pub vertices_transformed: u32,
    /// Average Cache Miss Ratio: transformed vertices per triangle.
    pub acmr: f32,
    /// Average Transform-to-Vertex Ratio: transformed vertices per unique vertex.
    pub atvr: f32,
}

/// Simulates a FIFO vertex cache of `cache_size` entries over `indices`.
///
/// For every index: a hit if it is already resident in the FIFO, otherwise
/// the oldest entry is evicted, the index is inserted, and
/// `vertices_transformed` is incremented.
pub fn analyze_vertex_cache<I: Index>(
    indices: &[I],
    vertex_count: usize,
    cache_size: u32,
) -> VertexCacheStatistics {
    tracing::trace!(index_count = indices.len(), vertex_count, cache_size, "analyze_vertex_cache");

    let triangle_count = indices.len() / 3;
    if triangle_count == 0 {
        return VertexCacheStatistics::default();
    }

    let cache_size = cache_size.max(1) as usize;
    let mut fifo: VecDeque<usize> = VecDeque::with_capacity(cache_size);
    let mut vertices_transformed: u64 = 0;

    for idx in indices {
        let v = idx.as_usize();
        if fifo.contains(&v) {
            continue;
        }
        if fifo.len() >= cache_size {
            fifo.pop_front();
        }
        fifo.push_back(v);
        vertices_transformed += 1;
    }

    let vertices_transformed = vertices_transformed as u32;
    VertexCacheStatistics {
        vertices_transformed,
        acmr: vertices_transformed as f32 / triangle_count as f32,
        atvr: if vertex_count > 0 {
            vertices_transformed as f32 / vertex_count as f32
        } else {
            0.0
        },
    }
}

/// Result of simulating a direct-mapped vertex fetch cache over an index buffer.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct VertexFetchStatistics {
    pub bytes_fetched: u32,
    pub overfetch: f32,
}

const FETCH_CACHE_LINE: usize = 64;
const FETCH_CACHE_LINES: usize = 16;

/// Simulates a direct-mapped cache of `FETCH_CACHE_LINES` 64-byte lines over
/// the vertex fetches implied by `indices`.
pub fn analyze_vertex_fetch<I: Index>(
    indices: &[I],
    vertex_count: usize,
    vertex_size: usize,
) -> VertexFetchStatistics {
    tracing::trace!(index_count = indices.len(), vertex_count, vertex_size, "analyze_vertex_fetch");

    // tags[slot] holds the cache line address currently resident at that slot.
    let mut tags = [u64::MAX; FETCH_CACHE_LINES];
    let mut bytes_fetched: u64 = 0;

    for idx in indices {
        let v = idx.as_usize();
        let start = v * vertex_size;
        let end = start + vertex_size;
        let first_line = start / FETCH_CACHE_LINE;
        let last_line = if end == 0 { 0 } else { (end - 1) / FETCH_CACHE_LINE };

        for line in first_line..=last_line {
            let slot = line % FETCH_CACHE_LINES;
            let line = line as u64;
            if tags[slot] != line {
                tags[slot] = line;
                bytes_fetched += FETCH_CACHE_LINE as u64;
            }
        }
    }

    let denom = (vertex_count * vertex_size) as f32;
    VertexFetchStatistics {
        bytes_fetched: bytes_fetched as u32,
        overfetch: if denom > 0.0 {
            bytes_fetched as f32 / denom
        } else {
            0.0
        },
    }
}

/// Result of rasterizing a mesh from the six canonical view directions and
/// counting shaded vs. covered pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct OverdrawStatistics {
    pub pixels_covered: u32,
    pub pixels_shaded: u32,
    pub overdraw: f32,
}

/// Resolution (in pixels, per axis) of the software rasterizer's depth buffer.
const RASTER_RESOLUTION: usize = 256;

struct View {
    direction: Vec3,
    /// indices into a position's [x, y, z] components used as (screen_u, screen_v, depth)
    u_axis: usize,
    v_axis: usize,
    depth_axis: usize,
    depth_sign: f32,
}

fn canonical_raster_views() -> [View; 6] {
    [
        View { direction: [1.0, 0.0, 0.0], u_axis: 1, v_axis: 2, depth_axis: 0, depth_sign: 1.0 },
        View { direction: [-1.0, 0.0, 0.0], u_axis: 1, v_axis: 2, depth_axis: 0, depth_sign: -1.0 },
        View { direction: [0.0, 1.0, 0.0], u_axis: 2, v_axis: 0, depth_axis: 1, depth_sign: 1.0 },
        View { direction: [0.0, -1.0, 0.0], u_axis: 2, v_axis: 0, depth_axis: 1, depth_sign: -1.0 },
        View { direction: [0.0, 0.0, 1.0], u_axis: 0, v_axis: 1, depth_axis: 2, depth_sign: 1.0 },
        View { direction: [0.0, 0.0, -1.0], u_axis: 0, v_axis: 1, depth_axis: 2, depth_sign: -1.0 },
    ]
}

/// Edge function for the half-plane test, evaluated at point `p`.
#[inline(always)]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

#[inline(always)]
fn is_top_left(a: [f32; 2], b: [f32; 2]) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

/// Rasterizes one triangle, updating `depth`/`touched` and the per-view
/// shaded/covered counters. `screen` are (x, y) pixel-space positions,
/// `depth` values are comparable (smaller = nearer the camera).
#[allow(clippy::too_many_arguments)]
fn rasterize_triangle(
    screen: [[f32; 2]; 3],
    tri_depth: [f32; 3],
    depth_buf: &mut [f32],
    touched: &mut [bool],
    shaded: &mut u32,
    covered: &mut u32,
) {
    let area = edge(screen[0], screen[1], screen[2]);
    if area == 0.0 {
        return; // degenerate in screen space
    }

    // Normalize winding so inside-tests use a consistent sign.
    let (a, b, c, da, db, dc, area) = if area > 0.0 {
        (screen[0], screen[1], screen[2], tri_depth[0], tri_depth[1], tri_depth[2], area)
    } else {
        (screen[0], screen[2], screen[1], tri_depth[0], tri_depth[2], tri_depth[1], -area)
    };

    let min_x = a[0].min(b[0]).min(c[0]).floor().max(0.0) as usize;
    let max_x = (a[0].max(b[0]).max(c[0]).ceil() as isize).min(RASTER_RESOLUTION as isize - 1);
    let min_y = a[1].min(b[1]).min(c[1]).floor().max(0.0) as usize;
    let max_y = (a[1].max(b[1]).max(c[1]).ceil() as isize).min(RASTER_RESOLUTION as isize - 1);
    if max_x < 0 || max_y < 0 {
        return;
    }
    let max_x = max_x as usize;
    let max_y = max_y as usize;

    let bias0 = if is_top_left(b, c) { 0.0 } else { -f32::EPSILON };
    let bias1 = if is_top_left(c, a) { 0.0 } else { -f32::EPSILON };
    let bias2 = if is_top_left(a, b) { 0.0 } else { -f32::EPSILON };

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let p = [px as f32 + 0.5, py as f32 + 0.5];
            let w0 = edge(b, c, p);
            let w1 = edge(c, a, p);
            let w2 = edge(a, b, p);
            if w0 + bias0 < 0.0 || w1 + bias1 < 0.0 || w2 + bias2 < 0.0 {
                continue;
            }

            let inv_area = 1.0 / area;
            let depth = (w0 * da + w1 * db + w2 * dc) * inv_area;

            let pix = py * RASTER_RESOLUTION + px;
            if !touched[pix] {
                touched[pix] = true;
                *covered += 1;
            }
            if depth_buf[pix] > depth {
                depth_buf[pix] = depth;
                *shaded += 1;
            }
        }
    }
}

fn analyze_overdraw_positions<I: Index>(indices: &[I], positions: &[Vec3]) -> OverdrawStatistics {
    tracing::trace!(index_count = indices.len(), vertex_count = positions.len(), "analyze_overdraw");

    let mut total_covered: u64 = 0;
    let mut total_shaded: u64 = 0;

    if indices.is_empty() || positions.is_empty() {
        return OverdrawStatistics { overdraw: 1.0, ..Default::default() };
    }

    for view in canonical_raster_views() {
        let mut min_u = f32::INFINITY;
        let mut max_u = f32::NEG_INFINITY;
        let mut min_v = f32::INFINITY;
        let mut max_v = f32::NEG_INFINITY;
        for idx in indices {
            let p = positions[idx.as_usize()];
            min_u = min_u.min(p[view.u_axis]);
            max_u = max_u.max(p[view.u_axis]);
            min_v = min_v.min(p[view.v_axis]);
            max_v = max_v.max(p[view.v_axis]);
        }

        let scale_u = crate::rcp_safe(max_u - min_u) * RASTER_RESOLUTION as f32;
        let scale_v = crate::rcp_safe(max_v - min_v) * RASTER_RESOLUTION as f32;

        let mut depth_buf = vec![f32::INFINITY; RASTER_RESOLUTION * RASTER_RESOLUTION];
        let mut touched = vec![false; RASTER_RESOLUTION * RASTER_RESOLUTION];
        let mut shaded = 0u32;
        let mut covered = 0u32;

        for tri in indices.chunks_exact(3) {
            let mut screen = [[0.0f32; 2]; 3];
            let mut depth = [0.0f32; 3];
            for k in 0..3 {
                let p = positions[tri[k].as_usize()];
                screen[k] = [
                    (p[view.u_axis] - min_u) * scale_u,
                    (p[view.v_axis] - min_v) * scale_v,
                ];
                depth[k] = p[view.depth_axis] * view.depth_sign;
            }
            rasterize_triangle(screen, depth, &mut depth_buf, &mut touched, &mut shaded, &mut covered);
        }

        total_covered += covered as u64;
        total_shaded += shaded as u64;
    }

    OverdrawStatistics {
        pixels_covered: total_covered as u32,
        pixels_shaded: total_shaded as u32,
        overdraw: if total_covered > 0 {
            total_shaded as f32 / total_covered as f32
        } else {
            1.0
        },
    }
}

/// Analyzes overdraw using a [`VertexDataAdapter`] view over the vertex buffer.
pub fn analyze_overdraw<I: Index>(indices: &[I], vertices: &mut VertexDataAdapter<'_>) -> OverdrawStatistics {
    let positions: Vec<Vec3> = (0..vertices.vertex_count)
        .map(|v| vertices.xyz_f32_at(v).expect("index within vertex_count"))
        .collect();
    analyze_overdraw_positions(indices, &positions)
}

/// Analyzes overdraw for a caller vertex type implementing [`DecodePosition`].
pub fn analyze_overdraw_decoder<I: Index, T: DecodePosition>(indices: &[I], vertices: &[T]) -> OverdrawStatistics {
    let positions: Vec<Vec3> = vertices.iter().map(DecodePosition::decode_position).collect();
    analyze_overdraw_positions(indices, &positions)
}
