#![warn(missing_docs)]

//! Boolean cuts on polyhedral solids for the tdraw kernel.
//!
//! The cut is exposed through the [`BooleanCutter`] trait so callers can
//! inject their own implementation. [`PrismCutter`] subtracts a closed
//! convex tool that the target crosses through a single tool face, which is
//! exactly the situation of a section view's cutting prism:
//!
//! 1. **AABB filter**: disjoint target and tool return the target unchanged
//! 2. **Plane classification**: find the tool faces the target crosses
//! 3. **Half-space clip**: clip every face (in parallel) and cap the cut

mod api;
pub mod clip;

pub use api::{BooleanCutter, BooleanError, PrismCutter};
pub use clip::{clip_face, clip_shape, clip_solid, FaceClip};
