//! Shortest-path queries over the street graph.
//!
//! Town-scale graphs hold a few dozen nodes, so Dijkstra scans the frontier
//! linearly instead of maintaining a heap. Disconnected pairs are reported
//! through the [`UNREACHABLE`] sentinel or `None`; they are never errors.

use std::collections::VecDeque;

use crate::planar::RoadGraph;

/// Travel time reported for a destination that cannot be reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// One directed adjacency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Neighbouring node.
    pub to: usize,
    /// Travel time in minutes.
    pub minutes: u32,
    /// Index of the undirected segment this entry belongs to.
    pub segment: usize,
}

/// A resolved route between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    /// Visited nodes, origin first.
    pub nodes: Vec<usize>,
    /// Segments walked, one fewer than `nodes`.
    pub segments: Vec<usize>,
    /// Total travel time.
    pub minutes: u32,
}

/// Adjacency lists with shortest-path queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteIndex {
    adjacency: Vec<Vec<Edge>>,
    segment_count: usize,
}

impl RouteIndex {
    /// An index over `node_count` nodes with no streets.
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            segment_count: 0,
        }
    }

    /// Index every segment of a road graph, keeping segment numbering.
    pub fn from_graph(graph: &RoadGraph) -> Self {
        let mut index = Self::new(graph.node_count());
        for segment in graph.segments() {
            index.add_street(segment.a, segment.b, segment.minutes);
        }
        index
    }

    /// Add an undirected street and return its segment index.
    ///
    /// Endpoints outside the index are ignored but still consume an index,
    /// so numbering stays aligned with the caller's segment list.
    pub fn add_street(&mut self, a: usize, b: usize, minutes: u32) -> usize {
        let segment = self.segment_count;
        self.segment_count = self.segment_count.saturating_add(1);
        if a < self.adjacency.len() && b < self.adjacency.len() {
            if let Some(list) = self.adjacency.get_mut(a) {
                list.push(Edge { to: b, minutes, segment });
            }
            if let Some(list) = self.adjacency.get_mut(b) {
                list.push(Edge { to: a, minutes, segment });
            }
        }
        segment
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Adjacency entries of `node`.
    pub fn edges(&self, node: usize) -> &[Edge] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Shortest travel time from `from` to every node.
    pub fn distances_from(&self, from: usize) -> Vec<u32> {
        self.dijkstra(from, None).0
    }

    /// Shortest travel time between two nodes, or [`UNREACHABLE`].
    pub fn travel_minutes(&self, from: usize, to: usize) -> u32 {
        if from == to && from < self.node_count() {
            return 0;
        }
        self.dijkstra(from, Some(to))
            .0
            .get(to)
            .copied()
            .unwrap_or(UNREACHABLE)
    }

    /// The route behind [`Self::travel_minutes`], or `None` if unreachable.
    pub fn travel_path(&self, from: usize, to: usize) -> Option<ShortestPath> {
        if from >= self.node_count() || to >= self.node_count() {
            return None;
        }
        let (dist, prev) = self.dijkstra(from, Some(to));
        let minutes = dist.get(to).copied().unwrap_or(UNREACHABLE);
        if minutes == UNREACHABLE {
            return None;
        }

        let mut nodes = vec![to];
        let mut segments = Vec::new();
        let mut current = to;
        while current != from {
            let (before, segment) = prev.get(current).copied().flatten()?;
            nodes.push(before);
            segments.push(segment);
            current = before;
        }
        nodes.reverse();
        segments.reverse();
        Some(ShortestPath {
            nodes,
            segments,
            minutes,
        })
    }

    /// Breadth-first hop counts from `from`; unreachable nodes get [`UNREACHABLE`].
    pub fn hop_distances(&self, from: usize) -> Vec<u32> {
        let mut hops = vec![UNREACHABLE; self.node_count()];
        let Some(start) = hops.get_mut(from) else {
            return hops;
        };
        *start = 0;
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            let next_hop = hops.get(node).copied().unwrap_or(UNREACHABLE).saturating_add(1);
            for edge in self.edges(node) {
                if let Some(slot) = hops.get_mut(edge.to) {
                    if *slot == UNREACHABLE {
                        *slot = next_hop;
                        queue.push_back(edge.to);
                    }
                }
            }
        }
        hops
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        self.node_count() == 0 || !self.hop_distances(0).contains(&UNREACHABLE)
    }

    /// Single-source Dijkstra with a linear frontier scan.
    ///
    /// Stops early once `target` is settled.
    fn dijkstra(
        &self,
        from: usize,
        target: Option<usize>,
    ) -> (Vec<u32>, Vec<Option<(usize, usize)>>) {
        let n = self.node_count();
        let mut dist = vec![UNREACHABLE; n];
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut settled = vec![false; n];
        let Some(start) = dist.get_mut(from) else {
            return (dist, prev);
        };
        *start = 0;

        loop {
            let next = dist
                .iter()
                .zip(&settled)
                .enumerate()
                .filter(|(_, (d, done))| !**done && **d != UNREACHABLE)
                .min_by_key(|(_, (d, _))| **d)
                .map(|(i, (d, _))| (i, *d));
            let Some((node, base)) = next else {
                break;
            };
            if let Some(flag) = settled.get_mut(node) {
                *flag = true;
            }
            if target == Some(node) {
                break;
            }
            for edge in self.edges(node) {
                let candidate = base.saturating_add(edge.minutes);
                if let Some(slot) = dist.get_mut(edge.to) {
                    if candidate < *slot {
                        *slot = candidate;
                        if let Some(p) = prev.get_mut(edge.to) {
                            *p = Some((node, edge.segment));
                        }
                    }
                }
            }
        }
        (dist, prev)
    }
}
