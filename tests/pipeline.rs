//! End-to-end coverage of the universal invariants and concrete scenarios
//! that cut across more than one module.

use meshoptimize::{
    analyze_overdraw_decoder, analyze_vertex_cache, analyze_vertex_fetch, generate_index_buffer,
    generate_vertex_buffer, optimize_overdraw_in_place_decoder, optimize_vertex_cache,
    optimize_vertex_cache_clusters, optimize_vertex_fetch, quantize_half, quantize_snorm,
    quantize_unorm, typed_to_bytes, Vertex, DEFAULT_OPTIMIZE_CACHE_SIZE, DEFAULT_OVERDRAW_THRESHOLD,
};

fn multiset(indices: &[u32]) -> Vec<[u32; 3]> {
    let mut tris: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            let mut t = [t[0], t[1], t[2]];
            t.sort_unstable();
            t
        })
        .collect();
    tris.sort_unstable();
    tris
}

fn strip(n: usize) -> (Vec<u32>, usize) {
    // a triangle strip sharing edges, as in spec scenario "strip of N triangles"
    let mut indices = Vec::with_capacity(n * 3);
    for i in 0..n {
        if i % 2 == 0 {
            indices.extend_from_slice(&[i as u32, i as u32 + 1, i as u32 + 2]);
        } else {
            indices.extend_from_slice(&[i as u32 + 1, i as u32, i as u32 + 2]);
        }
    }
    (indices, n + 2)
}

#[test]
fn single_triangle_matches_spec_scenario() {
    let indices: [u32; 3] = [0, 1, 2];
    let stats = analyze_vertex_cache(&indices, 3, 16);
    assert_eq!(stats.vertices_transformed, 3);
    assert_eq!(stats.acmr, 3.0);
    assert_eq!(stats.atvr, 1.0);

    let optimized = optimize_vertex_cache(&indices, 3);
    assert_eq!(optimized, indices);
}

#[test]
fn quad_matches_spec_scenario() {
    let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];
    let stats = analyze_vertex_cache(&indices, 4, 16);
    assert_eq!(stats.vertices_transformed, 4);
    assert_eq!(stats.acmr, 2.0);
}

#[test]
fn long_strip_converges_to_acmr_near_one() {
    let (indices, vertex_count) = strip(500);
    let optimized = optimize_vertex_cache(&indices, vertex_count);
    let stats = analyze_vertex_cache(&optimized, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    assert!((stats.acmr - 1.0).abs() < 0.05, "acmr={}", stats.acmr);
}

#[test]
fn post_transform_never_regresses_acmr_on_large_mesh() {
    // a 16x16 quad grid, 512 triangles, 289 vertices (>= 128 per property 4)
    let quads = 16u32;
    let verts_per_side = quads + 1;
    let mut indices = Vec::new();
    for y in 0..quads {
        for x in 0..quads {
            let v00 = y * verts_per_side + x;
            let v10 = v00 + 1;
            let v01 = v00 + verts_per_side;
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }
    let vertex_count = (verts_per_side * verts_per_side) as usize;
    assert!(vertex_count >= 128);

    let before = analyze_vertex_cache(&indices, vertex_count, 32);
    let optimized = optimize_vertex_cache(&indices, vertex_count);
    let after = analyze_vertex_cache(&optimized, vertex_count, 32);
    assert!(after.acmr <= before.acmr);
    assert_eq!(multiset(&indices), multiset(&optimized));
}

#[test]
fn disconnected_meshes_yield_at_least_two_clusters() {
    // two independent quads, no shared vertices
    let indices: [u32; 12] = [0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
    let (_, clusters) = optimize_vertex_cache_clusters(&indices, 8, DEFAULT_OPTIMIZE_CACHE_SIZE);
    assert!(clusters.len() >= 2);
    assert_eq!(clusters[0], 0);
}

#[test]
fn fetch_round_trip_reverse_order_mesh() {
    // indices reference vertices in reverse order
    let mut indices: Vec<u32> = vec![4, 3, 2, 2, 3, 1, 2, 1, 0];
    let vertices: Vec<[f32; 3]> = (0..5).map(|i| [i as f32, 0.0, 0.0]).collect();
    let reordered = optimize_vertex_fetch(&mut indices, &vertices);

    // first reference order is 4, 3, 2, 1, 0 -> remapped to 0, 1, 2, 3, 4
    assert_eq!(indices, vec![0, 1, 2, 2, 1, 3, 2, 3, 4]);
    assert_eq!(reordered, vec![[4.0, 0.0, 0.0], [3.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
}

#[test]
fn overdraw_identity_scenario() {
    let vertices = vec![
        Vertex { p: [0.0, 0.0, 0.0], n: [0.0, 0.0, 1.0], t: [0.0, 0.0] },
        Vertex { p: [1.0, 0.0, 0.0], n: [0.0, 0.0, 1.0], t: [0.0, 0.0] },
        Vertex { p: [0.0, 1.0, 0.0], n: [0.0, 0.0, 1.0], t: [0.0, 0.0] },
    ];
    // the same triangle drawn twice: fully overlapping from +Z/-Z
    let indices: [u32; 6] = [0, 1, 2, 0, 1, 2];
    let stats = analyze_overdraw_decoder(&indices, &vertices);
    assert!(stats.pixels_shaded >= 2 * stats.pixels_covered);
}

#[test]
fn overdraw_optimizer_preserves_triangle_multiset_and_acmr_guard() {
    let quads = 10u32;
    let verts_per_side = quads + 1;
    let mut indices = Vec::new();
    for y in 0..quads {
        for x in 0..quads {
            let v00 = y * verts_per_side + x;
            let v10 = v00 + 1;
            let v01 = v00 + verts_per_side;
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }
    let vertex_count = (verts_per_side * verts_per_side) as usize;
    let vertices: Vec<[f32; 3]> = (0..vertex_count)
        .map(|i| [(i as u32 % verts_per_side) as f32, (i as u32 / verts_per_side) as f32, 0.0])
        .collect();

    let (mut reordered, clusters) =
        optimize_vertex_cache_clusters(&indices, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    let before = analyze_vertex_cache(&reordered, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    optimize_overdraw_in_place_decoder(&mut reordered, &clusters, &vertices, DEFAULT_OVERDRAW_THRESHOLD);
    let after = analyze_vertex_cache(&reordered, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);

    assert!(after.acmr <= before.acmr * DEFAULT_OVERDRAW_THRESHOLD + f32::EPSILON);
    assert_eq!(multiset(&indices), multiset(&reordered));
}

#[test]
fn overdraw_optimizer_reorders_disconnected_clusters() {
    // A single connected grid collapses to one Tipsify cluster, which makes
    // the cluster-reordering step a no-op by construction. Use two disjoint
    // quads instead (as in `disconnected_meshes_yield_at_least_two_clusters`)
    // so the optimizer actually has more than one cluster to reorder, and
    // give them distinct overdraw penalties (an axis-aligned quad vs. a
    // tilted one) so the expected order is unambiguous.
    let indices: [u32; 12] = [4, 5, 6, 4, 6, 7, 0, 1, 2, 0, 2, 3];
    let vertices: Vec<[f32; 3]> = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [10.0, 10.0, 10.0],
        [11.0, 9.0, 10.0],
        [11.0, 11.0, 8.0],
        [10.0, 11.0, 9.0],
    ];
    let vertex_count = vertices.len();

    let (mut reordered, clusters) =
        optimize_vertex_cache_clusters(&indices, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    assert!(clusters.len() >= 2);

    let before = reordered.clone();
    let before_stats = analyze_vertex_cache(&reordered, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    optimize_overdraw_in_place_decoder(&mut reordered, &clusters, &vertices, DEFAULT_OVERDRAW_THRESHOLD);
    let after_stats = analyze_vertex_cache(&reordered, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);

    assert_ne!(reordered, before, "the tilted-quad cluster should be moved after the axis-aligned one");
    assert_eq!(multiset(&reordered), multiset(&before));
    assert!(after_stats.acmr <= before_stats.acmr * DEFAULT_OVERDRAW_THRESHOLD + f32::EPSILON);
}

#[test]
fn pre_transform_never_increases_bytes_fetched() {
    let mut indices: Vec<u32> = vec![3, 1, 0, 0, 1, 2, 2, 1, 3];
    let vertices: Vec<[f32; 3]> = (0..4).map(|i| [i as f32, 0.0, 0.0]).collect();
    let vertex_size = std::mem::size_of::<[f32; 3]>();

    let before = analyze_vertex_fetch(&indices, vertices.len(), vertex_size);
    let reordered = optimize_vertex_fetch(&mut indices, &vertices);
    let after = analyze_vertex_fetch(&indices, reordered.len(), vertex_size);
    assert!(after.bytes_fetched <= before.bytes_fetched);
}

#[test]
fn analyzer_trivial_bounds_hold() {
    let quads = 6u32;
    let verts_per_side = quads + 1;
    let mut indices = Vec::new();
    for y in 0..quads {
        for x in 0..quads {
            let v00 = y * verts_per_side + x;
            let v10 = v00 + 1;
            let v01 = v00 + verts_per_side;
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }
    let vertex_count = (verts_per_side * verts_per_side) as usize;
    let vertex_size = 32usize;

    let cache_stats = analyze_vertex_cache(&indices, vertex_count, 32);
    assert!(cache_stats.vertices_transformed as usize <= indices.len());

    let fetch_stats = analyze_vertex_fetch(&indices, vertex_count, vertex_size);
    let bound = indices.len() as u32 * (vertex_size as u32).div_ceil(64) * 64;
    assert!(fetch_stats.bytes_fetched <= bound);

    let vertices: Vec<[f32; 3]> = (0..vertex_count)
        .map(|i| [(i as u32 % verts_per_side) as f32, (i as u32 / verts_per_side) as f32, 0.0])
        .collect();
    let overdraw_stats = analyze_overdraw_decoder(&indices, &vertices);
    assert!(overdraw_stats.pixels_shaded >= overdraw_stats.pixels_covered);
}

#[test]
fn indexing_round_trip_reproduces_unique_prefix() {
    fn bytes_of(vals: &[[f32; 3]]) -> Vec<u8> {
        vals.iter().flat_map(|v| v.iter().flat_map(|f| f.to_le_bytes())).collect()
    }
    let stream = [
        [1.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [3.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
    ];
    let raw = bytes_of(&stream);
    let vertex_size = std::mem::size_of::<[f32; 3]>();
    let (unique, remap) = generate_index_buffer(&raw, stream.len(), vertex_size);
    assert_eq!(unique, 3);
    let rebuilt = generate_vertex_buffer(&remap, &raw, vertex_size);
    assert_eq!(rebuilt, bytes_of(&[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]]));
}

#[test]
fn quantization_matches_spec_table() {
    assert_eq!(quantize_unorm(0.0, 8), 0);
    assert_eq!(quantize_unorm(1.0, 8), 255);
    assert_eq!(quantize_unorm(0.5, 8), 128);

    assert_eq!(quantize_snorm(0.0, 8), 0);
    assert_eq!(quantize_snorm(1.0, 8), 127);
    assert_eq!(quantize_snorm(-1.0, 8), -127);

    assert_eq!(quantize_half(0.0), 0x0000);
    assert_eq!(quantize_half(1.0), 0x3C00);
    assert_eq!(quantize_half(-2.0), 0xC000);
    assert_eq!(quantize_half(65504.0), 0x7BFF);
    assert_eq!(quantize_half(1e-10), 0x0000);
    assert_eq!(quantize_half(1e20), 0x7C00);
    assert_eq!(quantize_half(f32::NAN), 0x7E00);
}

#[test]
fn full_pipeline_roundtrips_unindexed_grid() {
    let verts_per_side = 9u32;
    let quads = verts_per_side - 1;
    let corner = |x: u32, y: u32| Vertex {
        p: [x as f32, y as f32, 0.0],
        n: [0.0, 0.0, 1.0],
        t: [x as f32, y as f32],
    };
    let mut unindexed = Vec::new();
    for y in 0..quads {
        for x in 0..quads {
            let v00 = corner(x, y);
            let v10 = corner(x + 1, y);
            let v01 = corner(x, y + 1);
            let v11 = corner(x + 1, y + 1);
            unindexed.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }

    let vertex_size = std::mem::size_of::<Vertex>();
    let raw = typed_to_bytes(&unindexed);
    let (unique_count, indices) = generate_index_buffer(raw, unindexed.len(), vertex_size);
    assert_eq!(unique_count, (verts_per_side * verts_per_side) as usize);

    let vertex_bytes = generate_vertex_buffer(&indices, raw, vertex_size);
    assert_eq!(vertex_bytes.len(), unique_count * vertex_size);

    let vertices: Vec<[f32; 3]> = vertex_bytes
        .chunks_exact(vertex_size)
        .map(|c| [
            f32::from_le_bytes(c[0..4].try_into().unwrap()),
            f32::from_le_bytes(c[4..8].try_into().unwrap()),
            f32::from_le_bytes(c[8..12].try_into().unwrap()),
        ])
        .collect();

    let before_multiset = multiset(&indices);
    let (mut reordered, clusters) =
        optimize_vertex_cache_clusters(&indices, unique_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    optimize_overdraw_in_place_decoder(&mut reordered, &clusters, &vertices, DEFAULT_OVERDRAW_THRESHOLD);
    let final_vertices = optimize_vertex_fetch(&mut reordered, &vertices);

    assert_eq!(multiset(&reordered), before_multiset);
    assert_eq!(final_vertices.len(), unique_count);
}

#[test]
fn pipeline_works_over_u16_indices() {
    // Every other integration test here drives the generic `Index` path
    // with u32 buffers; this one proves the same public API monomorphizes
    // correctly over u16, which is the other width it's sealed over.
    let (indices32, vertex_count) = strip(50);
    let indices16: Vec<u16> = indices32.iter().map(|&i| i as u16).collect();

    let before = analyze_vertex_cache(&indices16, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    let optimized = optimize_vertex_cache(&indices16, vertex_count);
    let after = analyze_vertex_cache(&optimized, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);

    assert!(after.acmr <= before.acmr);
    assert_eq!(multiset_u16(&indices16), multiset_u16(&optimized));
}

fn multiset_u16(indices: &[u16]) -> Vec<[u16; 3]> {
    let mut tris: Vec<[u16; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            let mut t = [t[0], t[1], t[2]];
            t.sort_unstable();
            t
        })
        .collect();
    tris.sort_unstable();
    tris
}
