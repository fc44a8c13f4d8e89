#![doc = include_str!("../README.md")]

mod bcvec;
mod bitvec;
mod conf;
mod error;
mod function;
mod hash;
mod mphf;
mod parallel;
mod partitioned;
pub mod stats;

pub use bitvec::BitVector;
pub use conf::{BuildConf, DEFAULT_GAMMA, MIN_GAMMA};
pub use error::Error;
pub use function::Function;
pub use mphf::Mphf;
pub use partitioned::Partitioned;

pub use dyn_size_of::GetSize;
