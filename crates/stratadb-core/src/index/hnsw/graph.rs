//! HNSW graph structure.
//!
//! Hierarchical navigable small world graph as described by Malkov &
//! Yashunin. Nodes are addressed directly by the segment's internal
//! offsets: offsets are dense and never reused, which is exactly the
//! arena discipline the adjacency lists want.
//!
//! All distances inside the graph are uniform "lower is better" values
//! (see [`crate::distance::DistanceMetric::distance`]); conversion back to
//! metric scores happens at the index boundary.
//!
//! Removal is deferred: a removed offset stays in the adjacency lists and
//! is traversed through, but never surfaces in results. Re-inserting an
//! offset (vector update) clears its outgoing links and re-runs the
//! insertion procedure; stale inbound links are tolerated, the traversal
//! just scores the node at its new position.

use super::layer::Layer;
use super::ordered_float::OrderedFloat;
use crate::config::HnswParams;
use crate::distance::DistanceMetric;
use crate::point::PointOffset;
use roaring::RoaringBitmap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Hard cap on the layer hierarchy.
const MAX_LAYERS: usize = 16;

#[derive(Serialize, Deserialize)]
pub(super) struct HnswGraph {
    metric: DistanceMetric,
    m: usize,
    m0: usize,
    ef_construction: usize,
    level_mult: f64,
    rng_state: u64,
    /// Vector per offset. A slot stays filled after removal so traversal
    /// through removed nodes keeps working.
    vectors: Vec<Option<Vec<f32>>>,
    /// Layer 0 is the bottom, densely connected layer.
    layers: Vec<Layer>,
    entry_point: Option<PointOffset>,
    max_layer: usize,
    /// Offsets marked unsearchable.
    removed: RoaringBitmap,
    live: usize,
}

impl HnswGraph {
    pub(super) fn new(metric: DistanceMetric, params: &HnswParams) -> Self {
        Self {
            metric,
            m: params.m,
            m0: params.m * 2,
            ef_construction: params.ef_construction,
            level_mult: 1.0 / (params.m as f64).ln(),
            rng_state: 0x5DEE_CE66_D1A4_B5B5,
            vectors: Vec::new(),
            layers: vec![Layer::default()],
            entry_point: None,
            max_layer: 0,
            removed: RoaringBitmap::new(),
            live: 0,
        }
    }

    pub(super) fn live_count(&self) -> usize {
        self.live
    }

    fn is_live(&self, offset: PointOffset) -> bool {
        !self.removed.contains(offset)
            && self
                .vectors
                .get(offset as usize)
                .is_some_and(Option::is_some)
    }

    fn distance_to(&self, query: &[f32], offset: PointOffset) -> f32 {
        self.vectors
            .get(offset as usize)
            .and_then(Option::as_deref)
            .map_or(f32::INFINITY, |v| self.metric.distance(query, v))
    }

    /// Inserts or re-links the vector at `offset`.
    pub(super) fn insert(&mut self, offset: PointOffset, vector: &[f32]) {
        let slot = offset as usize;
        if self.vectors.len() <= slot {
            self.vectors.resize(slot + 1, None);
        }
        let was_present = self.vectors[slot].is_some();
        let was_removed = self.removed.remove(offset);
        self.vectors[slot] = Some(vector.to_vec());
        if !was_present || was_removed {
            self.live += 1;
        }
        if was_present {
            // Vector update: drop the node's outgoing links, then re-link
            // it from scratch below.
            for layer in &mut self.layers {
                layer.clear(offset);
            }
        }

        let node_layer = self.random_layer();
        while self.layers.len() <= node_layer {
            self.layers.push(Layer::default());
        }
        for layer in &mut self.layers {
            layer.ensure_capacity(offset);
        }

        // Re-inserting the entry point itself needs a different node to
        // link from; any other stored vector will do.
        let entry = match self.entry_point {
            Some(ep) if ep != offset => Some(ep),
            Some(_) => self.any_other_node(offset),
            None => None,
        };

        match entry {
            Some(ep) => {
                // Greedy descent from the top layer to just above the
                // node's own layer.
                let mut current_ep = ep;
                for layer_idx in (node_layer + 1..=self.max_layer).rev() {
                    current_ep = self.search_layer_single(vector, current_ep, layer_idx);
                }

                for layer_idx in (0..=node_layer).rev() {
                    let mut neighbors =
                        self.search_layer(vector, &[current_ep], self.ef_construction, layer_idx);
                    neighbors.retain(|&(n, _)| n != offset);

                    let max_conn = if layer_idx == 0 { self.m0 } else { self.m };
                    let selected = self.select_neighbors(&neighbors, max_conn);
                    self.layers[layer_idx].set(offset, selected.clone());
                    for &neighbor in &selected {
                        self.link_back(offset, neighbor, layer_idx, max_conn);
                    }

                    if let Some(&(best, _)) = neighbors.first() {
                        current_ep = best;
                    }
                }
            }
            None => self.entry_point = Some(offset),
        }

        if node_layer > self.max_layer {
            self.max_layer = node_layer;
            self.entry_point = Some(offset);
        }
    }

    /// Marks `offset` unsearchable. The node stays in the adjacency lists
    /// (deferred unlinking) but never appears in results again.
    pub(super) fn remove(&mut self, offset: PointOffset) -> bool {
        if !self.is_live(offset) {
            return false;
        }
        self.removed.insert(offset);
        self.live -= 1;
        true
    }

    /// Searches for the `k` nearest live offsets.
    ///
    /// Returns `(offset, distance)` pairs sorted ascending by distance,
    /// ties broken by ascending offset. When `predicate` is present, only
    /// offsets it accepts are returned (post-filtering; callers widen `ef`
    /// to compensate).
    pub(super) fn search(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        predicate: Option<&dyn Fn(PointOffset) -> bool>,
    ) -> Vec<(PointOffset, f32)> {
        let Some(ep) = self.entry_point else {
            return Vec::new();
        };
        if self.live == 0 || k == 0 {
            return Vec::new();
        }

        let mut current_ep = ep;
        for layer_idx in (1..=self.max_layer).rev() {
            current_ep = self.search_layer_single(query, current_ep, layer_idx);
        }

        let candidates = self.search_layer(query, &[current_ep], ef.max(k), 0);
        candidates
            .into_iter()
            .filter(|&(offset, _)| self.is_live(offset))
            .filter(|&(offset, _)| predicate.is_none_or(|p| p(offset)))
            .take(k)
            .collect()
    }

    fn any_other_node(&self, excluded: PointOffset) -> Option<PointOffset> {
        self.vectors
            .iter()
            .enumerate()
            .find(|&(slot, vector)| slot != excluded as usize && vector.is_some())
            .map(|(slot, _)| slot as PointOffset)
    }

    fn random_layer(&mut self) -> usize {
        // xorshift64 is plenty for the exponential layer draw.
        let mut state = self.rng_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state = state;

        let uniform = (state as f64) / (u64::MAX as f64);
        let level = (-uniform.ln() * self.level_mult).floor() as usize;
        level.min(MAX_LAYERS - 1)
    }

    fn search_layer_single(
        &self,
        query: &[f32],
        entry: PointOffset,
        layer_idx: usize,
    ) -> PointOffset {
        let mut best = entry;
        let mut best_dist = self.distance_to(query, entry);

        loop {
            let mut improved = false;
            for &neighbor in self.layers[layer_idx].get(best) {
                let dist = self.distance_to(query, neighbor);
                if dist < best_dist {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }
            if !improved {
                return best;
            }
        }
    }

    /// Searches one layer with an `ef`-bounded candidate pool.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[PointOffset],
        ef: usize,
        layer_idx: usize,
    ) -> Vec<(PointOffset, f32)> {
        let mut visited: FxHashSet<PointOffset> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, PointOffset)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, PointOffset)> = BinaryHeap::new();

        for &ep in entry_points {
            let dist = self.distance_to(query, ep);
            candidates.push(Reverse((OrderedFloat(dist), ep)));
            results.push((OrderedFloat(dist), ep));
            visited.insert(ep);
        }

        while let Some(Reverse((OrderedFloat(c_dist), c_node))) = candidates.pop() {
            let furthest = results.peek().map_or(f32::MAX, |r| r.0 .0);
            if c_dist > furthest && results.len() >= ef {
                break;
            }

            for &neighbor in self.layers[layer_idx].get(c_node) {
                if visited.insert(neighbor) {
                    let dist = self.distance_to(query, neighbor);
                    let furthest = results.peek().map_or(f32::MAX, |r| r.0 .0);
                    if dist < furthest || results.len() < ef {
                        candidates.push(Reverse((OrderedFloat(dist), neighbor)));
                        results.push((OrderedFloat(dist), neighbor));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        let mut sorted: Vec<(PointOffset, f32)> =
            results.into_iter().map(|(d, n)| (n, d.0)).collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        sorted
    }

    /// Heuristic neighbor selection: prefer candidates closer to the query
    /// than to any already-selected neighbor, then fill the quota with the
    /// nearest remainder.
    fn select_neighbors(
        &self,
        candidates: &[(PointOffset, f32)],
        max_neighbors: usize,
    ) -> Vec<PointOffset> {
        if candidates.len() <= max_neighbors {
            return candidates.iter().map(|&(n, _)| n).collect();
        }

        let mut selected: Vec<PointOffset> = Vec::with_capacity(max_neighbors);
        let mut selected_vecs: Vec<Vec<f32>> = Vec::with_capacity(max_neighbors);

        for &(candidate, candidate_dist) in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            let Some(candidate_vec) = self
                .vectors
                .get(candidate as usize)
                .and_then(Option::as_deref)
            else {
                continue;
            };
            let is_diverse = selected_vecs.iter().all(|sel| {
                candidate_dist <= self.metric.distance(candidate_vec, sel)
            });
            if is_diverse || selected.is_empty() {
                selected.push(candidate);
                selected_vecs.push(candidate_vec.to_vec());
            }
        }

        if selected.len() < max_neighbors {
            for &(candidate, _) in candidates {
                if selected.len() >= max_neighbors {
                    break;
                }
                if !selected.contains(&candidate) {
                    selected.push(candidate);
                }
            }
        }

        selected
    }

    /// Adds the reverse edge `neighbor -> new_node`, pruning the
    /// neighbor's list back to `max_conn` if it overflows.
    fn link_back(
        &mut self,
        new_node: PointOffset,
        neighbor: PointOffset,
        layer_idx: usize,
        max_conn: usize,
    ) {
        let mut links = self.layers[layer_idx].get(neighbor).to_vec();
        if links.contains(&new_node) {
            return;
        }
        links.push(new_node);

        if links.len() > max_conn {
            let Some(neighbor_vec) = self
                .vectors
                .get(neighbor as usize)
                .and_then(Option::as_deref)
                .map(<[f32]>::to_vec)
            else {
                return;
            };
            let mut with_dist: Vec<(PointOffset, f32)> = links
                .into_iter()
                .map(|n| (n, self.distance_to(&neighbor_vec, n)))
                .collect();
            with_dist.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            links = with_dist
                .into_iter()
                .take(max_conn)
                .map(|(n, _)| n)
                .collect();
        }

        self.layers[layer_idx].set(neighbor, links);
    }
}
