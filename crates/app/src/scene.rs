//! Tiny node hierarchy walked with a [`TransformStack`].

use anyhow::{Context, Result, bail};
use matstack::{LocalTransform, Mat4, Quat, TransformStack, Vec3};

/// Node id (dense, index into the node arrays).
pub type NodeId = u32;

/// Upper bound on nodes a generated scene may hold.
pub const MAX_NODES: usize = 1 << 16;

/// Nodes in a full tree of `depth` levels with `fanout` children per node.
/// Fails on overflow or when the tree would exceed [`MAX_NODES`].
pub fn node_count(depth: usize, fanout: usize) -> Result<usize> {
    let mut total: usize = 0;
    let mut level_width: usize = 1;
    for level in 0..depth {
        if level > 0 {
            level_width = match level_width.checked_mul(fanout) {
                Some(w) => w,
                None => bail!("scene with depth {} and fanout {} overflows", depth, fanout),
            };
        }
        total = total.saturating_add(level_width);
        if total > MAX_NODES {
            bail!(
                "scene with depth {} and fanout {} exceeds {} nodes",
                depth,
                fanout,
                MAX_NODES
            );
        }
        if level_width == 0 {
            break;
        }
    }
    Ok(total)
}

/// Node hierarchy stored as dense parallel arrays.
#[derive(Default)]
pub struct Scene {
    locals: Vec<LocalTransform>,
    children: Vec<Vec<NodeId>>,
    roots: Vec<NodeId>,
}

/// World matrix of one node, in visit order.
#[derive(Clone, Copy, Debug)]
pub struct Visit {
    pub node: NodeId,
    pub depth: usize,
    pub world: Mat4,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a node under `parent`, or as a root when `parent` is `None`.
    pub fn spawn(&mut self, local: LocalTransform, parent: Option<NodeId>) -> Result<NodeId> {
        let id = NodeId::try_from(self.locals.len()).context("too many scene nodes")?;
        match parent {
            Some(p) => self
                .children
                .get_mut(p as usize)
                .with_context(|| format!("unknown parent node {}", p))?
                .push(id),
            None => self.roots.push(id),
        }
        self.locals.push(local);
        self.children.push(Vec::new());
        Ok(id)
    }

    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    /// Builds a full tree: every node below `depth` gets `fanout` children,
    /// each offset along X and slightly rotated relative to its parent.
    pub fn generate(depth: usize, fanout: usize) -> Result<Self> {
        node_count(depth, fanout)?;
        let mut scene = Self::new();
        let root = scene.spawn(LocalTransform::IDENTITY, None)?;
        let mut frontier = vec![root];
        for level in 1..depth {
            let mut next = Vec::with_capacity(frontier.len() * fanout);
            for &parent in &frontier {
                for k in 0..fanout {
                    let local = LocalTransform::from_trs(
                        Vec3::new(1.0 + k as f32, level as f32 * 0.5, 0.0),
                        Quat::from_rotation_y(0.25 * (k as f32 + 1.0)),
                        Vec3::splat(0.9),
                    );
                    next.push(scene.spawn(local, Some(parent))?);
                }
            }
            frontier = next;
        }
        Ok(scene)
    }

    /// Depth-first walk: enter a node by pushing its local factor, leave it
    /// by cutting the stack back. Returns every node's world matrix in visit order.
    pub fn walk(&self, stack: &mut TransformStack) -> Result<Vec<Visit>> {
        let base = stack.len();
        let mut visits = Vec::with_capacity(self.len());
        for &root in &self.roots {
            self.visit(root, stack, &mut visits)?;
        }
        debug_assert_eq!(stack.len(), base);
        Ok(visits)
    }

    fn visit(&self, node: NodeId, stack: &mut TransformStack, out: &mut Vec<Visit>) -> Result<()> {
        let i = node as usize;
        stack.with_pushed(self.locals[i].matrix(), |stack| -> Result<()> {
            out.push(Visit {
                node,
                depth: stack.depth(),
                world: stack.peek(),
            });
            for &child in &self.children[i] {
                self.visit(child, stack, out)?;
            }
            Ok(())
        })
    }

    /// Local factors along the first-child chain from the first root down
    /// to a leaf.
    pub fn first_path(&self) -> Vec<LocalTransform> {
        let mut path = Vec::new();
        let mut cursor = self.roots.first().copied();
        while let Some(node) = cursor {
            let i = node as usize;
            path.push(self.locals[i]);
            cursor = self.children[i].first().copied();
        }
        path
    }
}
