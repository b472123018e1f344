//! Trajectory hypothesis tree.
//!
//! Every prediction step gives each particle a new path node whose parent
//! is the particle's previous node. Particles that share history share
//! nodes; the tree branches where their histories diverge.
//!
//! ```text
//!   committed poses ── root ─┬─ a ── c      (particle 0)
//!                            │      └─ d    (particle 1)
//!                            └─ b ── e      (particle 2)
//! ```
//!
//! Nodes are reference counted by particles. A node with no particles and
//! no children is dead and removed, cascading toward the root. While the
//! root has a single child and no particle, it is folded into the committed
//! trajectory.

use crate::core::{Arena, Lineage, PathId, Pose3D};

/// One step of a trajectory hypothesis.
#[derive(Clone, Debug)]
pub struct PathNode {
    /// Pose at this step
    pub pose: Pose3D,
    /// Previous step (`None` for the root)
    pub parent: Option<PathId>,
    /// Steps since the start of the run
    pub depth: usize,
    /// Cells this node wrote into the map
    pub cells_written: usize,
    children: usize,
    particles: usize,
}

impl PathNode {
    /// Number of child nodes.
    pub fn children(&self) -> usize {
        self.children
    }

    /// Number of particles whose current node this is.
    pub fn particles(&self) -> usize {
        self.particles
    }
}

/// Arena-backed tree of path nodes.
#[derive(Clone, Debug, Default)]
pub struct PathTree {
    nodes: Arena<PathNode>,
    root: Option<PathId>,
    committed: Vec<Pose3D>,
}

impl PathTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the tree at `pose`. Replaces any existing tree.
    pub fn add_root(&mut self, pose: Pose3D) -> PathId {
        self.nodes.clear();
        self.committed.clear();
        let id = PathId::new(self.nodes.insert(PathNode {
            pose,
            parent: None,
            depth: 0,
            cells_written: 0,
            children: 0,
            particles: 0,
        }));
        self.root = Some(id);
        id
    }

    /// Add a child of `parent` at `pose`.
    ///
    /// Returns `None` if `parent` is no longer in the tree.
    pub fn spawn(&mut self, parent: PathId, pose: Pose3D) -> Option<PathId> {
        let node = self.nodes.get_mut(parent.handle())?;
        node.children += 1;
        let depth = node.depth + 1;
        let id = PathId::new(self.nodes.insert(PathNode {
            pose,
            parent: Some(parent),
            depth,
            cells_written: 0,
            children: 0,
            particles: 0,
        }));
        Some(id)
    }

    /// Node by id.
    pub fn get(&self, id: PathId) -> Option<&PathNode> {
        self.nodes.get(id.handle())
    }

    /// Mutable node by id.
    pub fn get_mut(&mut self, id: PathId) -> Option<&mut PathNode> {
        self.nodes.get_mut(id.handle())
    }

    /// Live node count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Oldest uncommitted node.
    pub fn root(&self) -> Option<PathId> {
        self.root
    }

    /// Number of poses folded into the committed trajectory.
    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }

    /// A particle now points at `id`.
    pub fn retain(&mut self, id: PathId) {
        if let Some(node) = self.nodes.get_mut(id.handle()) {
            node.particles += 1;
        }
    }

    /// A particle no longer points at `id`.
    ///
    /// Removes nodes that became dead, cascading toward the root, and
    /// returns their ids (leaf first) so their map writes can be reclaimed.
    pub fn release(&mut self, id: PathId) -> Vec<PathId> {
        let mut removed = Vec::new();
        let Some(node) = self.nodes.get_mut(id.handle()) else {
            return removed;
        };
        node.particles = node.particles.saturating_sub(1);

        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.nodes.get(c.handle()) else {
                break;
            };
            if node.particles > 0 || node.children > 0 {
                break;
            }
            let parent = node.parent;
            self.nodes.remove(c.handle());
            removed.push(c);

            match parent {
                Some(p) => {
                    if let Some(parent_node) = self.nodes.get_mut(p.handle()) {
                        parent_node.children = parent_node.children.saturating_sub(1);
                    }
                    current = Some(p);
                }
                None => {
                    self.root = None;
                    current = None;
                }
            }
        }
        removed
    }

    /// Fold the single-child, particle-free trunk into the committed
    /// trajectory.
    ///
    /// Returns the committed ids oldest first. Their map writes must be
    /// committed in that order.
    pub fn commit_trunk(&mut self) -> Vec<PathId> {
        let mut committed = Vec::new();
        while let Some(root) = self.root {
            let Some(node) = self.nodes.get(root.handle()) else {
                break;
            };
            if node.children != 1 || node.particles > 0 {
                break;
            }

            // Find the only child
            let child = self
                .nodes
                .iter()
                .find(|(_, n)| n.parent == Some(root))
                .map(|(h, _)| PathId::new(h));
            let Some(child) = child else {
                break;
            };

            if let Some(old) = self.nodes.remove(root.handle()) {
                self.committed.push(old.pose);
            }
            if let Some(child_node) = self.nodes.get_mut(child.handle()) {
                child_node.parent = None;
            }
            self.root = Some(child);
            committed.push(root);
        }
        committed
    }

    /// Map view of a hypothesis: `leaf` and its uncommitted ancestors.
    pub fn lineage(&self, leaf: PathId) -> Lineage {
        let mut ids = Vec::new();
        let mut current = Some(leaf);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.handle()) else {
                break;
            };
            ids.push(id);
            current = node.parent;
        }
        Lineage::new(ids)
    }

    /// Full trajectory ending at `leaf`, oldest pose first.
    pub fn trajectory(&self, leaf: PathId) -> Vec<Pose3D> {
        let mut tail = Vec::new();
        let mut current = Some(leaf);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.handle()) else {
                break;
            };
            tail.push(node.pose);
            current = node.parent;
        }
        tail.reverse();

        let mut poses = self.committed.clone();
        poses.extend(tail);
        poses
    }
}
