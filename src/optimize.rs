//! The three reordering optimizers: post-transform vertex cache (Tipsify),
//! pixel overdraw, and pre-transform vertex fetch.

use crate::analyze::analyze_vertex_cache;
use crate::vecmath::{self, Vec3};
use crate::{DecodePosition, Index, VertexDataAdapter};
use std::collections::VecDeque;

/// Default FIFO cache size assumed by [`optimize_vertex_cache`] (a typical
/// GPU post-transform cache).
pub const DEFAULT_OPTIMIZE_CACHE_SIZE: u32 = 16;

/// Default ACMR regression budget for [`optimize_overdraw_in_place`]: the
/// output's ACMR must not exceed the input's.
pub const DEFAULT_OVERDRAW_THRESHOLD: f32 = 1.0;

/// Distance, in already-emitted vertices, that the just-emitted triangle's
/// own vertices count against the cache window (Tipsify convention).
const CACHE_TIMESTAMP_BIAS: i32 = 3;

struct Adjacency {
    offsets: Vec<u32>,
    entries: Vec<u32>,
}

fn build_adjacency<I: Index>(indices: &[I], vertex_count: usize) -> Adjacency {
    let mut counts = vec![0u32; vertex_count];
    for idx in indices {
        counts[idx.as_usize()] += 1;
    }
    let mut offsets = vec![0u32; vertex_count + 1];
    for v in 0..vertex_count {
        offsets[v + 1] = offsets[v] + counts[v];
    }
    let mut entries = vec![0u32; indices.len()];
    let mut cursor = offsets.clone();
    for (face, tri) in indices.chunks_exact(3).enumerate() {
        for idx in tri {
            let v = idx.as_usize();
            entries[cursor[v] as usize] = face as u32;
            cursor[v] += 1;
        }
    }
    Adjacency { offsets, entries }
}

/// Greedy Tipsify walk. Returns the reordered indices and, when
/// `collect_clusters` is set, the cluster boundary list (triangle offsets,
/// first entry always 0).
fn tipsify<I: Index>(
    indices: &[I],
    vertex_count: usize,
    cache_size: u32,
    collect_clusters: bool,
) -> (Vec<I>, Option<Vec<u32>>) {
    let face_count = indices.len() / 3;
    let mut clusters = collect_clusters.then(Vec::new);
    if face_count == 0 {
        return (Vec::new(), clusters);
    }

    let adjacency = build_adjacency(indices, vertex_count);
    let mut live_triangles: Vec<i32> = (0..vertex_count)
        .map(|v| (adjacency.offsets[v + 1] - adjacency.offsets[v]) as i32)
        .collect();

    let cache_size_i = cache_size.max(1) as i32;
    let mut cache_time = vec![i32::MIN; vertex_count];
    let mut emitted = vec![false; face_count];
    let mut timestamp: i32 = 0;

    let mut out = Vec::with_capacity(indices.len());
    // History of recently touched vertices, newest at the back; bounds how
    // far back we need to look for a cache-resident candidate.
    let mut history: VecDeque<u32> = VecDeque::with_capacity(indices.len());

    let mut input_cursor = 0usize;
    let mut current_vertex: Option<usize> = None;

    loop {
        let cv = match current_vertex {
            Some(v) if live_triangles[v] > 0 => v,
            _ => {
                let mut found = None;
                while input_cursor < indices.len() {
                    let v = indices[input_cursor].as_usize();
                    input_cursor += 1;
                    if live_triangles[v] > 0 {
                        found = Some(v);
                        break;
                    }
                }
                match found {
                    Some(v) => {
                        if let Some(c) = clusters.as_mut() {
                            c.push((out.len() / 3) as u32);
                        }
                        v
                    }
                    None => break,
                }
            }
        };

        let start = adjacency.offsets[cv] as usize;
        let end = adjacency.offsets[cv + 1] as usize;
        for &face in &adjacency.entries[start..end] {
            let face = face as usize;
            if emitted[face] {
                continue;
            }
            emitted[face] = true;

            for &vi in &indices[face * 3..face * 3 + 3] {
                out.push(vi);
                let v = vi.as_usize();
                live_triangles[v] -= 1;
                cache_time[v] = timestamp;
                history.push_back(v as u32);
                timestamp += 1;
            }
        }

        // Pick the best vertex still resident in the FIFO window, i.e.
        // (timestamp - cache_time[v]) + bias < cache_size. Priority rewards
        // proximity to the cache front and remaining live triangle count;
        // ties favor the lowest vertex index.
        let mut best: Option<(f32, usize)> = None;
        for &hv in history.iter().rev() {
            let v = hv as usize;
            let age = timestamp - cache_time[v];
            if age + CACHE_TIMESTAMP_BIAS >= cache_size_i {
                break; // history is ordered by recency; older entries are also stale
            }
            if live_triangles[v] == 0 {
                continue;
            }
            let cache_position_score = (cache_size_i - age) as f32;
            let priority = cache_position_score - 2.0 * live_triangles[v] as f32;
            best = Some(match best {
                Some((bp, bv)) if bp > priority || (bp == priority && bv <= v) => (bp, bv),
                _ => (priority, v),
            });
        }

        current_vertex = best.map(|(_, v)| v);
    }

    (out, clusters)
}

/// Reorders indices to reduce the number of GPU vertex shader invocations,
/// using the default cache size ([`DEFAULT_OPTIMIZE_CACHE_SIZE`]).
pub fn optimize_vertex_cache<I: Index>(indices: &[I], vertex_count: usize) -> Vec<I> {
    optimize_vertex_cache_with_size(indices, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE)
}

/// As [`optimize_vertex_cache`], with an explicit FIFO cache size.
pub fn optimize_vertex_cache_with_size<I: Index>(indices: &[I], vertex_count: usize, cache_size: u32) -> Vec<I> {
    tracing::debug!(index_count = indices.len(), vertex_count, cache_size, "optimize_vertex_cache");
    tipsify(indices, vertex_count, cache_size, false).0
}

/// As [`optimize_vertex_cache_with_size`], additionally returning the
/// cluster partition consumed by [`optimize_overdraw_in_place`]: a
/// strictly increasing list of triangle offsets, first entry always 0.
pub fn optimize_vertex_cache_clusters<I: Index>(
    indices: &[I],
    vertex_count: usize,
    cache_size: u32,
) -> (Vec<I>, Vec<u32>) {
    tracing::debug!(index_count = indices.len(), vertex_count, cache_size, "optimize_vertex_cache_clusters");
    let (out, clusters) = tipsify(indices, vertex_count, cache_size, true);
    (out, clusters.unwrap_or_default())
}

/// Reorders vertices and rewrites `indices` in place so that vertices appear
/// in first-reference order. Vertices never referenced by `indices` are
/// appended at the end, in their original relative order.
///
/// Returns the reordered vertex buffer; `indices` is rewritten to refer into
/// it.
pub fn optimize_vertex_fetch<I: Index, T: Clone + Default>(indices: &mut [I], vertices: &[T]) -> Vec<T> {
    tracing::debug!(index_count = indices.len(), vertex_count = vertices.len(), "optimize_vertex_fetch");

    let vertex_count = vertices.len();
    let mut remap: Vec<Option<u32>> = vec![None; vertex_count];
    let mut result = Vec::with_capacity(vertex_count);

    for idx in indices.iter() {
        let v = idx.as_usize();
        if remap[v].is_none() {
            remap[v] = Some(result.len() as u32);
            result.push(vertices[v].clone());
        }
    }
    for (v, slot) in remap.iter_mut().enumerate() {
        if slot.is_none() {
            *slot = Some(result.len() as u32);
            result.push(vertices[v].clone());
        }
    }

    for idx in indices.iter_mut() {
        let v = idx.as_usize();
        *idx = I::from_usize(remap[v].unwrap() as usize);
    }

    result
}

fn cluster_bounds(clusters: &[u32], triangle_count: u32) -> Vec<(u32, u32)> {
    if clusters.is_empty() {
        return vec![(0, triangle_count)];
    }
    let mut bounds = Vec::with_capacity(clusters.len());
    for i in 0..clusters.len() {
        let start = clusters[i];
        let end = if i + 1 < clusters.len() { clusters[i + 1] } else { triangle_count };
        bounds.push((start, end));
    }
    bounds
}

struct ClusterInfo {
    start: u32,
    end: u32,
    penalty: f32,
}

fn compute_cluster_info<I: Index>(indices: &[I], clusters: &[u32], positions: &[Vec3]) -> Vec<ClusterInfo> {
    let triangle_count = (indices.len() / 3) as u32;
    cluster_bounds(clusters, triangle_count)
        .into_iter()
        .map(|(start, end)| {
            let mut normal_sum = [0.0f32; 3];
            for tri in start..end {
                let base = tri as usize * 3;
                let p0 = positions[indices[base].as_usize()];
                let p1 = positions[indices[base + 1].as_usize()];
                let p2 = positions[indices[base + 2].as_usize()];
                let n = vecmath::cross(vecmath::sub(p1, p0), vecmath::sub(p2, p0));
                normal_sum = vecmath::add(normal_sum, n);
            }
            let normal = vecmath::normalize(normal_sum);
            let penalty = vecmath::CANONICAL_VIEWS
                .iter()
                .map(|&view| vecmath::dot(view, normal).max(0.0))
                .sum();
            ClusterInfo { start, end, penalty }
        })
        .collect()
}

fn reorder_by_clusters<I: Index>(indices: &[I], order: &[(u32, u32)]) -> Vec<I> {
    let mut out = Vec::with_capacity(indices.len());
    for &(start, end) in order {
        out.extend_from_slice(&indices[start as usize * 3..end as usize * 3]);
    }
    out
}

/// A FIFO vertex cache simulation that can be tentatively extended
/// (`simulate`, non-mutating) before being committed to for real, so the
/// overdraw optimizer can evaluate a candidate cluster's cache cost without
/// disturbing the state used to evaluate sibling candidates.
#[derive(Clone)]
struct FifoSim {
    queue: VecDeque<usize>,
    cache_size: usize,
}

impl FifoSim {
    fn new(cache_size: usize) -> Self {
        Self { queue: VecDeque::with_capacity(cache_size), cache_size }
    }

    /// Returns the miss count and resulting state from appending the
    /// triangle range `[start, end)`, without mutating `self`.
    fn simulate<I: Index>(&self, indices: &[I], start: u32, end: u32) -> (u32, FifoSim) {
        let mut queue = self.queue.clone();
        let mut misses = 0u32;
        for tri in start..end {
            let base = tri as usize * 3;
            for idx in &indices[base..base + 3] {
                let v = idx.as_usize();
                if queue.contains(&v) {
                    continue;
                }
                if queue.len() >= self.cache_size {
                    queue.pop_front();
                }
                queue.push_back(v);
                misses += 1;
            }
        }
        (misses, FifoSim { queue, cache_size: self.cache_size })
    }
}

/// Reorders the triangle clusters produced by
/// [`optimize_vertex_cache_clusters`] to reduce pixel overdraw. `indices` is
/// rewritten in place.
///
/// An incremental greedy walk: clusters are considered in ascending
/// overdraw-penalty order (sum over the six canonical view directions of
/// `max(0, dot(view, cluster_normal))`, ties broken by original cluster
/// index). At each step, the walk tries to append the best remaining
/// candidate whose addition keeps the running ACMR (simulated over a FIFO
/// vertex cache of [`DEFAULT_OPTIMIZE_CACHE_SIZE`]) within
/// `threshold * input_acmr`; if it would violate the guard, the next-best
/// candidate is tried instead. If every remaining candidate would violate
/// it, the least-violating one is taken so the walk still makes progress.
pub fn optimize_overdraw_in_place<I: Index>(
    indices: &mut [I],
    clusters: &[u32],
    vertices: &mut VertexDataAdapter<'_>,
    threshold: f32,
) {
    let positions: Vec<Vec3> = (0..vertices.vertex_count)
        .map(|v| vertices.xyz_f32_at(v).expect("index within vertex_count"))
        .collect();
    optimize_overdraw_positions_in_place(indices, clusters, &positions, vertices.vertex_count, threshold);
}

/// As [`optimize_overdraw_in_place`], for a caller vertex type implementing
/// [`DecodePosition`].
pub fn optimize_overdraw_in_place_decoder<I: Index, T: DecodePosition>(
    indices: &mut [I],
    clusters: &[u32],
    vertices: &[T],
    threshold: f32,
) {
    let positions: Vec<Vec3> = vertices.iter().map(DecodePosition::decode_position).collect();
    optimize_overdraw_positions_in_place(indices, clusters, &positions, vertices.len(), threshold);
}

fn optimize_overdraw_positions_in_place<I: Index>(
    indices: &mut [I],
    clusters: &[u32],
    positions: &[Vec3],
    vertex_count: usize,
    threshold: f32,
) {
    tracing::debug!(index_count = indices.len(), cluster_count = clusters.len(), threshold, "optimize_overdraw_in_place");

    if indices.len() < 6 {
        return; // fewer than two triangles: nothing to reorder
    }

    let original_stats = analyze_vertex_cache(indices, vertex_count, DEFAULT_OPTIMIZE_CACHE_SIZE);
    if original_stats.acmr == 0.0 {
        return;
    }
    let target_acmr = threshold * original_stats.acmr + f32::EPSILON;

    let mut infos = compute_cluster_info(indices, clusters, positions);
    infos.sort_by(|a, b| a.penalty.partial_cmp(&b.penalty).unwrap().then(a.start.cmp(&b.start)));

    let mut unplaced: Vec<usize> = (0..infos.len()).collect();
    let mut committed_order: Vec<(u32, u32)> = Vec::with_capacity(infos.len());
    let mut fifo = FifoSim::new(DEFAULT_OPTIMIZE_CACHE_SIZE as usize);
    let mut misses_so_far: u64 = 0;
    let mut tris_so_far: u64 = 0;

    while !unplaced.is_empty() {
        let mut chosen: Option<(usize, u32, FifoSim)> = None;
        let mut least_violating: Option<(f32, usize, u32, FifoSim)> = None;

        for (slot, &info_idx) in unplaced.iter().enumerate() {
            let c = &infos[info_idx];
            let (misses, next_fifo) = fifo.simulate(indices, c.start, c.end);
            let new_misses = misses_so_far + misses as u64;
            let new_tris = tris_so_far + (c.end - c.start) as u64;
            let resulting_acmr = new_misses as f32 / new_tris as f32;

            if resulting_acmr <= target_acmr {
                chosen = Some((slot, misses, next_fifo));
                break; // best (lowest-penalty) candidate that satisfies the guard
            }
            let better = match &least_violating {
                Some((best, ..)) => resulting_acmr < *best,
                None => true,
            };
            if better {
                least_violating = Some((resulting_acmr, slot, misses, next_fifo));
            }
        }

        let (slot, misses, next_fifo) = match chosen {
            Some(c) => c,
            None => {
                let (_, slot, misses, next_fifo) = least_violating.expect("unplaced is non-empty");
                tracing::trace!("optimize_overdraw_in_place: relaxing ACMR guard, all candidates violate");
                (slot, misses, next_fifo)
            }
        };

        let info_idx = unplaced.remove(slot);
        let c = &infos[info_idx];
        misses_so_far += misses as u64;
        tris_so_far += (c.end - c.start) as u64;
        fifo = next_fifo;
        committed_order.push((c.start, c.end));
    }

    let candidate = reorder_by_clusters(indices, &committed_order);
    indices.copy_from_slice(&candidate);
}
