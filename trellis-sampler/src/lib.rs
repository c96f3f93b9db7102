//! Layered neighborhood sampling for graph learning workloads.
//!
//! Two samplers turn an immutable [`Graph`](trellis_core::Graph) plus a
//! seed set into a [`NodeFlow`] — a compact, re-indexed multi-layer
//! subgraph ready for mini-batch message passing:
//!
//! - [`neighbor_sample`] / [`neighbor_sampling`] - per-seed fan-out over
//!   multiple hops, uniform or biased by a per-edge probability vector
//! - [`layer_uniform_sample`] / [`layer_sampling`] - layer-wise importance
//!   sampling with per-layer target sizes
//!
//! The `*_sampling` drivers split the seed array into mini-batches and
//! sample them in parallel, one NodeFlow per worker, after forcing the
//! needed CSR view so workers never write. Randomness flows through
//! [`RandomEngine`], a seedable thread-local stream: identical seeds and
//! inputs reproduce identical NodeFlows.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{Graph, IdArray, NeighborType};
//! use trellis_sampler::{neighbor_sample, RandomEngine};
//!
//! // 0 -> 1 -> 2 -> 3 -> 4
//! let g = Graph::from_coo(
//!     5,
//!     IdArray::from_vec(vec![0, 1, 2, 3]),
//!     IdArray::from_vec(vec![1, 2, 3, 4]),
//! )
//! .unwrap();
//!
//! let mut rng = RandomEngine::new(42);
//! let nf = neighbor_sample::<f32>(&g, &[0], NeighborType::Out, 2, 2, false, None, &mut rng)
//!     .unwrap();
//! assert_eq!(nf.num_layers(), 3);
//! assert_eq!(nf.node_mapping.to_vec(), vec![2, 1, 0]);
//! ```

mod error;
mod heap;
mod layer;
mod neighbor;
mod nodeflow;
mod rng;
mod sample;

pub use error::{Result, SampleError};
pub use heap::ArrayHeap;
pub use layer::{layer_sampling, layer_uniform_sample};
pub use neighbor::{neighbor_sample, neighbor_sampling, uniform_sampling};
pub use nodeflow::NodeFlow;
pub use rng::RandomEngine;
pub use sample::sample_without_replacement;
