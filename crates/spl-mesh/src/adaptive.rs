//! Crack-free adaptive tessellation of parametric surfaces.
//!
//! A quadtree over the UV domain refines wherever the surface fails a
//! two-diagonal flatness test. Adjacent cells may subdivide to different
//! depths; leaves reconcile the mismatch by collecting the boundary points
//! their finer neighbors own and fan-triangulating the resulting polygon, so
//! the output mesh is watertight with no T-junction cracks.
//!
//! Nodes live in an arena and refer to children and neighbors by index.
//! Evaluated surface points live in their own arena and are shared between
//! the nodes that touch them; each point is emitted into the mesh at most
//! once, by caching the mesh vertex id on the point.

use spl_core::Tolerance;
use spl_geometry::Surface;
use spl_math::{three_points_are_flat, Point2, Point3, Vector3};

use crate::TriangleMesh;

/// Recursion bound applied regardless of configuration, so pathological
/// geometry cannot subdivide forever.
const HARD_MAX_DEPTH: u32 = 8;

/// Margin for the open-interval test that excludes a neighbor's boundary
/// points coinciding with this node's own corners.
const UV_EPSILON: f64 = 1e-10;

/// Configuration for [`tessellate_surface_adaptive`].
#[derive(Debug, Clone)]
pub struct AdaptiveTessellationOptions {
    /// Flatness tolerance: twice the squared area of the diagonal triangles
    /// a cell may span while still counting as flat.
    pub tol: f64,
    /// Subdivide unconditionally below this depth.
    pub min_depth: u32,
    /// Never subdivide at or above this depth.
    pub max_depth: Option<u32>,
    /// Initial grid resolution in the u direction (minimum 1).
    pub min_divs_u: usize,
    /// Initial grid resolution in the v direction (minimum 1).
    pub min_divs_v: usize,
}

impl Default for AdaptiveTessellationOptions {
    fn default() -> Self {
        Self {
            tol: Tolerance::DEFAULT_TESSELLATION,
            min_depth: 0,
            max_depth: None,
            min_divs_u: 1,
            min_divs_v: 1,
        }
    }
}

type NodeId = usize;
type PointId = usize;

/// An evaluated surface sample, shared between every node that touches it.
struct SurfacePoint {
    uv: Point2,
    point: Point3,
    normal: Vector3,
    /// Mesh vertex index, assigned when first emitted and reused afterwards.
    id: Option<u32>,
}

/// One quadtree cell over a rectangular UV sub-domain.
///
/// Corner order is counter-clockwise from the UV minimum:
/// corner 0 = (u0,v0), 1 = (u1,v0), 2 = (u1,v1), 3 = (u0,v1).
/// Edge `i` joins corner `i` to corner `(i+1) % 4`, `neighbors[i]` lies
/// across edge `i`, `midpoints[i]` sits on edge `i`, and child `i` is the
/// quadrant sharing corner `i`.
struct Node {
    corners: [PointId; 4],
    center: Option<PointId>,
    midpoints: [Option<PointId>; 4],
    children: Option<[NodeId; 4]>,
    neighbors: [Option<NodeId>; 4],
}

struct RefinementTree<'a> {
    surface: &'a dyn Surface,
    options: AdaptiveTessellationOptions,
    nodes: Vec<Node>,
    points: Vec<SurfacePoint>,
}

impl<'a> RefinementTree<'a> {
    fn new(surface: &'a dyn Surface, options: AdaptiveTessellationOptions) -> Self {
        Self {
            surface,
            options,
            nodes: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Evaluate the surface once and store the sample.
    fn eval_point(&mut self, u: f64, v: f64) -> PointId {
        let (point, normal) = self.surface.point_and_normal_at(u, v);
        self.points.push(SurfacePoint {
            uv: Point2::new(u, v),
            point,
            normal,
            id: None,
        });
        self.points.len() - 1
    }

    fn new_node(&mut self, corners: [PointId; 4]) -> NodeId {
        self.nodes.push(Node {
            corners,
            center: None,
            midpoints: [None; 4],
            children: None,
            neighbors: [None; 4],
        });
        self.nodes.len() - 1
    }

    fn corner_uv(&self, node: NodeId, corner: usize) -> Point2 {
        self.points[self.nodes[node].corners[corner]].uv
    }

    fn u_range(&self, node: NodeId) -> (f64, f64) {
        (self.corner_uv(node, 0).x, self.corner_uv(node, 2).x)
    }

    fn v_range(&self, node: NodeId) -> (f64, f64) {
        (self.corner_uv(node, 0).y, self.corner_uv(node, 2).y)
    }

    /// Evaluate (or reuse) the center sample of a node.
    fn eval_center(&mut self, node: NodeId) -> PointId {
        if let Some(center) = self.nodes[node].center {
            return center;
        }
        let c0 = self.corner_uv(node, 0);
        let c2 = self.corner_uv(node, 2);
        let center = self.eval_point((c0.x + c2.x) * 0.5, (c0.y + c2.y) * 0.5);
        self.nodes[node].center = Some(center);
        center
    }

    /// Evaluate (or reuse) the four edge-midpoint samples of a node.
    fn eval_midpoints(&mut self, node: NodeId) -> [PointId; 4] {
        if let [Some(m0), Some(m1), Some(m2), Some(m3)] = self.nodes[node].midpoints {
            return [m0, m1, m2, m3];
        }
        let (u0, u1) = self.u_range(node);
        let (v0, v1) = self.v_range(node);
        let u05 = (u0 + u1) * 0.5;
        let v05 = (v0 + v1) * 0.5;

        let mids = [
            self.eval_point(u05, v0),
            self.eval_point(u1, v05),
            self.eval_point(u05, v1),
            self.eval_point(u0, v05),
        ];
        self.nodes[node].midpoints = [Some(mids[0]), Some(mids[1]), Some(mids[2]), Some(mids[3])];
        mids
    }

    /// Both corner diagonals must pass the three-point colinearity test
    /// through the center for the cell to count as flat.
    fn is_flat(&self, node: NodeId, center: PointId) -> bool {
        let corners = self.nodes[node].corners;
        let p = |id: PointId| self.points[id].point;
        let c = p(center);
        let tol = self.options.tol;

        three_points_are_flat(p(corners[0]), c, p(corners[2]), tol)
            && three_points_are_flat(p(corners[1]), c, p(corners[3]), tol)
    }

    fn should_divide(&self, node: NodeId, depth: u32, center: PointId) -> bool {
        if depth >= HARD_MAX_DEPTH {
            return false;
        }
        if depth < self.options.min_depth {
            return true;
        }
        if let Some(max_depth) = self.options.max_depth {
            if depth >= max_depth {
                return false;
            }
        }
        !self.is_flat(node, center)
    }

    /// Recursively refine a node until it is flat enough or depth-limited.
    fn divide(&mut self, node: NodeId, depth: u32) {
        let center = self.eval_center(node);
        if !self.should_divide(node, depth, center) {
            return;
        }

        let mids = self.eval_midpoints(node);
        let corners = self.nodes[node].corners;

        // children share the center and the edge midpoints as corners
        let ch0 = self.new_node([corners[0], mids[0], center, mids[3]]);
        let ch1 = self.new_node([mids[0], corners[1], mids[1], center]);
        let ch2 = self.new_node([center, mids[1], corners[2], mids[2]]);
        let ch3 = self.new_node([mids[3], center, mids[2], corners[3]]);

        // wire neighbors before recursing: siblings across interior edges,
        // the parent's neighbors across exterior edges
        let pn = self.nodes[node].neighbors;
        self.nodes[ch0].neighbors = [pn[0], Some(ch1), Some(ch3), pn[3]];
        self.nodes[ch1].neighbors = [pn[0], pn[1], Some(ch2), Some(ch0)];
        self.nodes[ch2].neighbors = [Some(ch1), pn[1], pn[2], Some(ch3)];
        self.nodes[ch3].neighbors = [Some(ch0), Some(ch2), pn[2], pn[3]];

        self.nodes[node].children = Some([ch0, ch1, ch2, ch3]);

        for child in [ch0, ch1, ch2, ch3] {
            self.divide(child, depth + 1);
        }
    }

    /// Collect the points this subtree owns along one of its edges, in edge
    /// order. A leaf owns just its leading corner.
    fn edge_points(&self, node: NodeId, edge: usize) -> Vec<PointId> {
        match self.nodes[node].children {
            None => vec![self.nodes[node].corners[edge]],
            Some(children) => {
                let mut pts = self.edge_points(children[edge], edge);
                pts.extend(self.edge_points(children[(edge + 1) % 4], edge));
                pts
            }
        }
    }

    /// The boundary of a leaf along one edge: its own corner plus whatever
    /// points a finer neighbor contributes strictly inside the edge span,
    /// reversed into this node's winding order.
    fn boundary_points(&self, node: NodeId, edge: usize) -> Vec<PointId> {
        let mut pts = vec![self.nodes[node].corners[edge]];

        let Some(neighbor) = self.nodes[node].neighbors[edge] else {
            return pts;
        };

        let opposite = self.edge_points(neighbor, (edge + 2) % 4);

        // clip to the open interval of this node's span along the shared axis
        let (lo, hi) = if edge % 2 == 0 {
            self.u_range(node)
        } else {
            self.v_range(node)
        };
        let mut inside: Vec<PointId> = opposite
            .into_iter()
            .filter(|&p| {
                let c = if edge % 2 == 0 {
                    self.points[p].uv.x
                } else {
                    self.points[p].uv.y
                };
                c > lo + UV_EPSILON && c < hi - UV_EPSILON
            })
            .collect();

        inside.reverse();
        pts.extend(inside);
        pts
    }

    /// Append a surface point to the mesh, or return its existing vertex id.
    fn emit_vertex(&mut self, point: PointId, mesh: &mut TriangleMesh) -> u32 {
        if let Some(id) = self.points[point].id {
            return id;
        }
        let id = mesh.positions.len() as u32;
        let sp = &mut self.points[point];
        mesh.positions.push(sp.point);
        mesh.normals.push(sp.normal);
        mesh.uvs.push(sp.uv);
        sp.id = Some(id);
        id
    }

    fn triangulate(&mut self, node: NodeId, mesh: &mut TriangleMesh) {
        match self.nodes[node].children {
            None => self.triangulate_leaf(node, mesh),
            Some(children) => {
                for child in children {
                    self.triangulate(child, mesh);
                }
            }
        }
    }

    fn triangulate_leaf(&mut self, node: NodeId, mesh: &mut TriangleMesh) {
        // full boundary polygon, counter-clockwise
        let mut boundary = Vec::new();
        for edge in 0..4 {
            boundary.extend(self.boundary_points(node, edge));
        }

        let ids: Vec<u32> = boundary
            .iter()
            .map(|&p| self.emit_vertex(p, mesh))
            .collect();

        if ids.len() == 4 {
            // no neighbor over-subdivision: plain quad with a fixed diagonal
            mesh.indices.extend_from_slice(&[ids[0], ids[1], ids[2]]);
            mesh.indices.extend_from_slice(&[ids[0], ids[2], ids[3]]);
            return;
        }

        // a finer neighbor contributed extra boundary points; fanning from
        // the center closes the polygon whatever its vertex count
        let center = self.eval_center(node);
        let center_id = self.emit_vertex(center, mesh);
        for i in 0..ids.len() {
            let j = (i + ids.len() - 1) % ids.len();
            mesh.indices
                .extend_from_slice(&[center_id, ids[j], ids[i]]);
        }
    }
}

/// Adaptively tessellate a surface into a crack-free triangle mesh.
///
/// An initial `min_divs_u x min_divs_v` grid of cells is refined per-cell by
/// recursive subdivision wherever the flatness test fails, then every leaf is
/// triangulated against its neighbors' actual refinement.
pub fn tessellate_surface_adaptive(
    surface: &dyn Surface,
    options: &AdaptiveTessellationOptions,
) -> TriangleMesh {
    let divs_u = options.min_divs_u.max(1);
    let divs_v = options.min_divs_v.max(1);

    let (u_min, u_max) = surface.domain_u();
    let (v_min, v_max) = surface.domain_v();
    let u_interval = (u_max - u_min) / divs_u as f64;
    let v_interval = (v_max - v_min) / divs_v as f64;

    let mut tree = RefinementTree::new(surface, options.clone());

    // evaluate the shared grid samples once; adjacent cells reuse them
    let mut grid: Vec<Vec<PointId>> = vec![vec![0; divs_v + 1]; divs_u + 1];
    for (i, row) in grid.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = tree.eval_point(
                u_min + u_interval * i as f64,
                v_min + v_interval * j as f64,
            );
        }
    }

    // root cells, row-major with v fastest
    let mut roots = Vec::with_capacity(divs_u * divs_v);
    for i in 0..divs_u {
        for j in 0..divs_v {
            roots.push(tree.new_node([
                grid[i][j],
                grid[i + 1][j],
                grid[i + 1][j + 1],
                grid[i][j + 1],
            ]));
        }
    }

    // wire root neighbors with the same edge convention the children use
    for i in 0..divs_u {
        for j in 0..divs_v {
            let index = i * divs_v + j;
            let north = (j > 0).then(|| roots[index - 1]);
            let east = (i + 1 < divs_u).then(|| roots[index + divs_v]);
            let south = (j + 1 < divs_v).then(|| roots[index + 1]);
            let west = (i > 0).then(|| roots[index - divs_v]);
            tree.nodes[roots[index]].neighbors = [north, east, south, west];
        }
    }

    for &root in &roots {
        tree.divide(root, 0);
    }

    let mut mesh = TriangleMesh::default();
    for &root in &roots {
        tree.triangulate(root, &mut mesh);
    }
    mesh
}
