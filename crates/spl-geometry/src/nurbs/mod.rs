//! NURBS core algorithms: knot utilities, basis functions, and evaluation.

pub mod deboor;
pub mod insert;
pub mod knot;
pub mod rational;

pub use deboor::ControlPoint;
pub use insert::curve_knot_insert;
pub use knot::{are_valid_relations, basis_function_derivs, basis_functions, find_span};
pub use rational::{dehomogenize, homogenize_1d, homogenize_2d};
