//! Chunk partitioning and the explore-then-partition build pass.
#![forbid(unsafe_code)]

mod partitioner;
mod pipeline;

pub use partitioner::{ChunkPartitioner, PartitionOptions, PartitionStats};
pub use pipeline::{BuildOptions, BuildReport, OrganizedWorld, organize};
