//! Distributed occupancy grid shared by every trajectory hypothesis.
//!
//! Instead of one map per particle, each cell keeps a short list of
//! evidence entries, one per hypothesis that wrote it, plus an optional
//! entry in the committed layer. A hypothesis reads a cell through its
//! [`Lineage`]: the entry written by the closest ancestor wins, falling back
//! to the committed layer, falling back to "unobserved".
//!
//! ```text
//!   cell 4711 ──▶ [(path 9, node a), (path 3, node b)]    committed: node c
//!
//!   lineage [12, 9, 5]  → node a   (9 is an ancestor)
//!   lineage [14, 7, 5]  → node c   (no ancestor wrote the cell)
//! ```
//!
//! Nodes live in a generational [`Arena`]. Every node is owned by exactly one
//! slot (a history entry or the committed layer); parent links are weak
//! handles used only for diagnostics, so pruning a path frees its nodes in
//! O(cells written).

use std::collections::HashMap;

use log::{debug, warn};

use crate::core::{
    Arena, GridCoord, Handle, Lineage, PathId, WorldPoint, create_gaussian_lookup,
    log_odds_to_probability, logit,
};
use crate::sensor::EvidenceRay;

use super::MapConfig;
use super::raycaster::{BresenhamLine, VoxelTraversal};

/// Occupancy probability of a wall segment inserted with [`DistributedGrid::insert_wall`].
pub const WALL_PROBABILITY: f32 = 0.95;

/// Evidence colour recorded for wall segments.
pub const WALL_COLOUR: [u8; 3] = [160, 120, 90];

/// One immutable evidence record for a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct AncestryNode {
    /// Linear cell index
    pub cell: u32,
    /// Log-odds contributed by the observation that created this node
    pub delta_log_odds: f32,
    /// Accumulated (clamped) log-odds including all prior evidence
    pub log_odds: f32,
    /// Evidence colour
    pub colour: [u8; 3],
    /// Hypothesis that wrote the node (`None` for direct committed writes)
    pub author: Option<PathId>,
    /// Node this one was fused onto (weak, may be stale)
    pub parent: Option<Handle>,
}

impl AncestryNode {
    /// Occupancy probability of this node.
    #[inline]
    pub fn probability(&self) -> f32 {
        log_odds_to_probability(self.log_odds)
    }
}

/// Summary of grid memory use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Nodes currently allocated
    pub live_nodes: usize,
    /// Cells with a committed entry
    pub committed_cells: usize,
    /// Cells with any evidence (committed or per-hypothesis)
    pub observed_cells: usize,
    /// Hypotheses that still own entries
    pub authors: usize,
}

/// Versioned 3D occupancy grid.
#[derive(Clone, Debug)]
pub struct DistributedGrid {
    config: MapConfig,
    nodes: Arena<AncestryNode>,
    history: HashMap<u32, Vec<(PathId, Handle)>>,
    committed: HashMap<u32, Handle>,
    authored: HashMap<PathId, Vec<u32>>,
    /// Range uncertainty weights, peak normalized to 1
    uncertainty: Vec<f32>,
}

impl DistributedGrid {
    /// Create an empty grid.
    pub fn new(config: MapConfig) -> Self {
        if !config.is_indexable() {
            warn!(
                "[DistributedGrid] {} cells exceed the u32 index range, outer cells are unmappable",
                config.total_cells()
            );
        }
        let mut uncertainty = create_gaussian_lookup(config.uncertainty_table_size.max(2));
        let peak = uncertainty.iter().copied().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for w in uncertainty.iter_mut() {
                *w /= peak;
            }
        }

        Self {
            config,
            nodes: Arena::new(),
            history: HashMap::new(),
            committed: HashMap::new(),
            authored: HashMap::new(),
            uncertainty,
        }
    }

    /// Map configuration.
    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Node visible to `lineage` for a cell index.
    pub fn resolve(&self, cell: u32, lineage: &Lineage) -> Option<&AncestryNode> {
        self.resolve_handle(cell, lineage)
            .and_then(|h| self.nodes.get(h))
    }

    fn resolve_handle(&self, cell: u32, lineage: &Lineage) -> Option<Handle> {
        if !lineage.is_empty()
            && let Some(entries) = self.history.get(&cell)
        {
            let nearest = entries
                .iter()
                .filter_map(|(author, handle)| lineage.rank(*author).map(|r| (r, *handle)))
                .min_by_key(|(rank, _)| *rank);
            if let Some((_, handle)) = nearest {
                return Some(handle);
            }
        }
        self.committed.get(&cell).copied()
    }

    /// Occupancy probability of a cell as seen by `lineage`.
    ///
    /// Returns `None` for unobserved or out-of-bounds cells.
    pub fn probability(&self, coord: &GridCoord, lineage: &Lineage) -> Option<f32> {
        let cell = self.config.cell_index(coord)?;
        self.resolve(cell, lineage).map(AncestryNode::probability)
    }

    /// Accumulated log-odds of a cell as seen by `lineage`.
    pub fn log_odds(&self, coord: &GridCoord, lineage: &Lineage) -> Option<f32> {
        let cell = self.config.cell_index(coord)?;
        self.resolve(cell, lineage).map(|n| n.log_odds)
    }

    /// Occupancy probability at a world point.
    pub fn probability_at(&self, point: &WorldPoint, lineage: &Lineage) -> Option<f32> {
        self.probability(&self.config.world_to_grid(point), lineage)
    }

    /// Chain of evidence for a cell, newest first, following live parent links.
    pub fn cell_history(&self, coord: &GridCoord, lineage: &Lineage) -> Vec<&AncestryNode> {
        let mut chain = Vec::new();
        let Some(cell) = self.config.cell_index(coord) else {
            return chain;
        };
        let mut next = self.resolve_handle(cell, lineage);
        while let Some(handle) = next {
            let Some(node) = self.nodes.get(handle) else {
                break;
            };
            chain.push(node);
            next = node.parent;
        }
        chain
    }

    /// Cells written by a hypothesis that are not yet committed or pruned.
    pub fn authored_cells(&self, path: PathId) -> &[u32] {
        self.authored.get(&path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Visit every cell with evidence visible to `lineage`.
    pub fn for_each_observed<F>(&self, lineage: &Lineage, mut f: F)
    where
        F: FnMut(GridCoord, &AncestryNode),
    {
        for &cell in self.committed.keys() {
            if self.history.contains_key(&cell) {
                continue;
            }
            if let Some(node) = self.resolve(cell, lineage) {
                f(self.config.index_to_coord(cell), node);
            }
        }
        for &cell in self.history.keys() {
            if let Some(node) = self.resolve(cell, lineage) {
                f(self.config.index_to_coord(cell), node);
            }
        }
    }

    /// Memory summary.
    pub fn stats(&self) -> GridStats {
        let history_only = self
            .history
            .keys()
            .filter(|cell| !self.committed.contains_key(cell))
            .count();
        GridStats {
            live_nodes: self.nodes.len(),
            committed_cells: self.committed.len(),
            observed_cells: self.committed.len() + history_only,
            authors: self.authored.len(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Fuse `delta` onto the cell as seen by `lineage`, authored by its leaf.
    ///
    /// With a committed-only lineage the write goes straight to the
    /// committed layer. Returns false if the result would be non-finite.
    fn write(&mut self, cell: u32, delta: f32, colour: Option<[u8; 3]>, lineage: &Lineage) -> bool {
        let author = lineage.leaf();
        let prior = self.resolve_handle(cell, lineage);
        let prior_node = prior.and_then(|h| self.nodes.get(h));

        let prior_log_odds = prior_node.map(|n| n.log_odds).unwrap_or(0.0);
        let log_odds = self.config.clamp_log_odds(prior_log_odds + delta);
        if !log_odds.is_finite() {
            return false;
        }

        let colour = match (colour, prior_node) {
            (Some(new), Some(old)) if old.log_odds > 0.0 => blend(old.colour, new),
            (Some(new), _) => new,
            (None, Some(old)) => old.colour,
            (None, None) => [0, 0, 0],
        };

        // The author's own previous entry is replaced, so link past it
        let own_previous = match author {
            Some(a) => self
                .history
                .get(&cell)
                .and_then(|entries| entries.iter().find(|(p, _)| *p == a))
                .map(|(_, h)| *h),
            None => self.committed.get(&cell).copied(),
        };
        let parent = match (prior, own_previous) {
            (Some(p), Some(own)) if p == own => self.nodes.get(own).and_then(|n| n.parent),
            _ => prior,
        };

        let handle = self.nodes.insert(AncestryNode {
            cell,
            delta_log_odds: delta,
            log_odds,
            colour,
            author,
            parent,
        });

        match author {
            Some(a) => {
                let entries = self.history.entry(cell).or_default();
                if let Some(slot) = entries.iter_mut().find(|(p, _)| *p == a) {
                    let old = std::mem::replace(&mut slot.1, handle);
                    self.nodes.remove(old);
                } else {
                    entries.push((a, handle));
                    self.authored.entry(a).or_default().push(cell);
                }
            }
            None => {
                if let Some(old) = self.committed.insert(cell, handle) {
                    self.nodes.remove(old);
                }
            }
        }
        true
    }

    /// Insert one evidence ray.
    ///
    /// Cells before the uncertainty band around the ray end receive vacancy
    /// evidence; cells inside it receive occupancy evidence weighted by the
    /// Gaussian uncertainty table. Rays that are degenerate, carry no
    /// occupancy evidence (probability ≤ 0.5) or exceed the mapping range are
    /// skipped. Returns the number of cells updated.
    pub fn insert_ray(&mut self, ray: &EvidenceRay, lineage: &Lineage) -> usize {
        if !ray.start.is_finite()
            || !ray.end.is_finite()
            || !ray.probability.is_finite()
            || ray.probability <= 0.5
        {
            return 0;
        }

        let offset = ray.end - ray.start;
        let range = offset.length();
        if range > self.config.max_mapping_range_mm {
            return 0;
        }
        let Some(direction) = offset.normalize() else {
            return 0;
        };

        let probability = ray.probability.min(1.0);
        let band = if ray.uncertainty_mm.is_finite() {
            ray.uncertainty_mm.max(self.config.cell_size_mm * 0.5)
        } else {
            self.config.cell_size_mm * 0.5
        };
        let occupied_from = (range - band).max(0.0);
        let occupied_to = range + band;
        let vacancy = self.config.vacancy_delta(probability);

        let steps: Vec<_> =
            VoxelTraversal::new(&self.config, &ray.start, &direction, occupied_to).collect();

        let mut updated = 0;
        for step in steps {
            let Some(cell) = self.config.cell_index(&step.coord) else {
                continue;
            };
            let t = step.t_mid();
            let written = if t < occupied_from {
                self.write(cell, vacancy, None, lineage)
            } else {
                let weight = self.uncertainty_weight(t, occupied_from, occupied_to);
                let delta = self.config.occupancy_delta(probability, weight);
                self.write(cell, delta, Some(ray.colour), lineage)
            };
            if written {
                updated += 1;
            }
        }
        updated
    }

    fn uncertainty_weight(&self, t: f32, from: f32, to: f32) -> f32 {
        let n = self.uncertainty.len();
        let span = to - from;
        if n == 0 || span <= 0.0 {
            return 1.0;
        }
        let idx = (((t - from) / span) * n as f32).floor() as usize;
        self.uncertainty[idx.min(n - 1)]
    }

    /// Insert a vertical wall segment from the ground up to `height_mm`.
    ///
    /// Each layer is rasterized with a 2D Bresenham line between the
    /// endpoints. Returns the number of cells updated.
    pub fn insert_wall(
        &mut self,
        start: &WorldPoint,
        end: &WorldPoint,
        height_mm: f32,
        lineage: &Lineage,
    ) -> usize {
        if !start.is_finite() || !end.is_finite() || !height_mm.is_finite() || height_mm <= 0.0 {
            return 0;
        }

        let layers = ((height_mm / self.config.cell_size_mm).ceil() as i32)
            .min(self.config.dimension_cells_vertical as i32);
        let delta = logit(WALL_PROBABILITY);
        let a = self.config.world_to_grid(&WorldPoint::new(start.x, start.y, 0.0));
        let b = self.config.world_to_grid(&WorldPoint::new(end.x, end.y, 0.0));

        let mut updated = 0;
        for z in 0..layers {
            let from = GridCoord::new(a.x, a.y, z);
            let to = GridCoord::new(b.x, b.y, z);
            let cells: Vec<u32> = BresenhamLine::new(from, to)
                .filter_map(|c| self.config.cell_index(&c))
                .collect();
            for cell in cells {
                if self.write(cell, delta, Some(WALL_COLOUR), lineage) {
                    updated += 1;
                }
            }
        }
        updated
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Free every entry written by a pruned hypothesis.
    ///
    /// Returns the number of nodes reclaimed.
    pub fn prune_author(&mut self, path: PathId) -> usize {
        let Some(cells) = self.authored.remove(&path) else {
            return 0;
        };

        let mut freed = 0;
        for cell in cells {
            let Some(entries) = self.history.get_mut(&cell) else {
                continue;
            };
            if let Some(pos) = entries.iter().position(|(p, _)| *p == path) {
                let (_, handle) = entries.swap_remove(pos);
                if self.nodes.remove(handle).is_some() {
                    freed += 1;
                }
            }
            if entries.is_empty() {
                self.history.remove(&cell);
            }
        }
        debug!("[DistributedGrid] pruned {:?}: {} nodes freed", path, freed);
        freed
    }

    /// Move a hypothesis's entries into the committed layer.
    ///
    /// Only valid for the oldest uncommitted ancestor shared by every living
    /// hypothesis: its entries are then what every lineage would fall back
    /// to anyway. Returns the number of cells committed.
    pub fn commit_author(&mut self, path: PathId) -> usize {
        let Some(cells) = self.authored.remove(&path) else {
            return 0;
        };

        let mut committed = 0;
        for cell in cells {
            let Some(entries) = self.history.get_mut(&cell) else {
                continue;
            };
            let Some(pos) = entries.iter().position(|(p, _)| *p == path) else {
                continue;
            };
            let (_, handle) = entries.swap_remove(pos);
            if entries.is_empty() {
                self.history.remove(&cell);
            }
            if let Some(old) = self.committed.insert(cell, handle) {
                self.nodes.remove(old);
            }
            committed += 1;
        }
        debug!("[DistributedGrid] committed {:?}: {} cells", path, committed);
        committed
    }
}

fn blend(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    [
        ((a[0] as u16 + b[0] as u16) / 2) as u8,
        ((a[1] as u16 + b[1] as u16) / 2) as u8,
        ((a[2] as u16 + b[2] as u16) / 2) as u8,
    ]
}
