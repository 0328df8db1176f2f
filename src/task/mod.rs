//! Leaf tasks. Each one reads its inputs from the [`Layout`](crate::Layout),
//! hands them to a collaborator crate, and writes the result back to disk.

pub mod dist;
pub mod images;
pub mod scripts;
pub mod styles;
mod svg;
pub mod templates;
