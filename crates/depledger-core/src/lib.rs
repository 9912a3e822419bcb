pub mod bazel;
pub mod coord;
pub mod extract;
pub mod intersect;
pub mod lockfile;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod validate;
