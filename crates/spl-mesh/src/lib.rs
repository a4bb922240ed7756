pub mod adaptive;
pub mod naive;
pub mod step_size;
pub mod triangulate;

pub use adaptive::{tessellate_surface_adaptive, AdaptiveTessellationOptions};
pub use naive::tessellate_surface_naive;
pub use step_size::{max_edge_length, tessellate_surface_uniform_cubic};
pub use triangulate::TriangleMesh;
