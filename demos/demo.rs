//! Runs the full pipeline over a synthetically generated grid mesh and
//! reports before/after cache, fetch and overdraw statistics.
//!
//! `cargo run --example demo`

use meshoptimize::{
    analyze_overdraw_decoder, analyze_vertex_cache, analyze_vertex_fetch, generate_index_buffer,
    generate_vertex_buffer, optimize_overdraw_in_place_decoder, optimize_vertex_cache_clusters,
    optimize_vertex_fetch, quantize_half, quantize_snorm, typed_to_bytes, Vertex,
    DEFAULT_OPTIMIZE_CACHE_SIZE, DEFAULT_OVERDRAW_THRESHOLD,
};
use rand::{thread_rng, Rng};

/// Builds an unindexed quad-grid mesh (each quad split into two triangles),
/// with a small amount of noise so that repeated vertices aren't exact
/// duplicates only by construction order.
fn build_grid(quads_per_side: usize) -> Vec<Vertex> {
    let mut rng = thread_rng();
    let verts_per_side = quads_per_side + 1;
    let corner = |x: usize, y: usize| Vertex {
        p: [x as f32, y as f32, 0.0],
        n: [0.0, 0.0, 1.0],
        t: [x as f32 / verts_per_side as f32, y as f32 / verts_per_side as f32],
    };

    let mut unindexed = Vec::with_capacity(quads_per_side * quads_per_side * 6);
    for y in 0..quads_per_side {
        for x in 0..quads_per_side {
            let v00 = corner(x, y);
            let v10 = corner(x + 1, y);
            let v01 = corner(x, y + 1);
            let v11 = corner(x + 1, y + 1);
            unindexed.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }
    // jitter texcoords so quantization has something to chew on
    for v in &mut unindexed {
        v.t[0] += rng.gen_range(-0.001..0.001);
    }
    unindexed
}

fn main() {
    tracing_subscriber::fmt::init();

    let unindexed = build_grid(24);
    let vertex_size = std::mem::size_of::<Vertex>();
    let raw_bytes = typed_to_bytes(&unindexed);

    let (unique_count, remap) = generate_index_buffer(raw_bytes, unindexed.len(), vertex_size);
    let vertex_bytes = generate_vertex_buffer(&remap, raw_bytes, vertex_size);
    let vertices: Vec<Vertex> = vertex_bytes
        .chunks_exact(vertex_size)
        .map(|chunk| {
            let mut v = Vertex::default();
            v.p = [
                f32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                f32::from_le_bytes(chunk[4..8].try_into().unwrap()),
                f32::from_le_bytes(chunk[8..12].try_into().unwrap()),
            ];
            v.n = [
                f32::from_le_bytes(chunk[12..16].try_into().unwrap()),
                f32::from_le_bytes(chunk[16..20].try_into().unwrap()),
                f32::from_le_bytes(chunk[20..24].try_into().unwrap()),
            ];
            v.t = [
                f32::from_le_bytes(chunk[24..28].try_into().unwrap()),
                f32::from_le_bytes(chunk[28..32].try_into().unwrap()),
            ];
            v
        })
        .collect();
    println!(
        "indexed {} unindexed triangles into {} unique vertices (of {})",
        unindexed.len() / 3,
        unique_count,
        unindexed.len()
    );

    let before_cache = analyze_vertex_cache(&remap, vertices.len(), DEFAULT_OPTIMIZE_CACHE_SIZE);
    let before_fetch = analyze_vertex_fetch(&remap, vertices.len(), vertex_size);
    let before_overdraw = analyze_overdraw_decoder(&remap, &vertices);
    println!("before: {before_cache:?} {before_fetch:?} {before_overdraw:?}");

    let (mut indices, clusters) =
        optimize_vertex_cache_clusters(&remap, vertices.len(), DEFAULT_OPTIMIZE_CACHE_SIZE);
    optimize_overdraw_in_place_decoder(&mut indices, &clusters, &vertices, DEFAULT_OVERDRAW_THRESHOLD);
    let optimized_vertices = optimize_vertex_fetch(&mut indices, &vertices);

    let after_cache = analyze_vertex_cache(&indices, optimized_vertices.len(), DEFAULT_OPTIMIZE_CACHE_SIZE);
    let after_fetch = analyze_vertex_fetch(&indices, optimized_vertices.len(), vertex_size);
    let after_overdraw = analyze_overdraw_decoder(&indices, &optimized_vertices);
    println!("after:  {after_cache:?} {after_fetch:?} {after_overdraw:?}");

    // quantize a handful of attributes, just to exercise the helpers
    for v in optimized_vertices.iter().take(3) {
        let qn = [
            quantize_snorm(v.n[0], 8),
            quantize_snorm(v.n[1], 8),
            quantize_snorm(v.n[2], 8),
        ];
        let qp = quantize_half(v.p[0]);
        println!("quantized normal {qn:?}, quantized x {qp:#06x}");
    }
}
