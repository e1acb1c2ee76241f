//! # GridVault
//!
//! A typed, hierarchical multidimensional array store:
//! - One container file holds a namespace of nested groups
//! - Groups hold named, shaped, typed datasets
//! - Datasets carry small typed attributes and an optional
//!   chunked/shuffled/deflated storage layout
//! - Reads and writes are bulk and typed, with cross-type numeric
//!   conversion against the fixed on-disk element type
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 File / Group (Container)                     │
//! │              namespace create/open by path                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Dataset   │─────────▶│  Attribute  │
//!   │ (typed r/w) │          │ (typed r/w) │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   Engine    │
//!   │ (catalog +  │
//!   │  segments)  │
//!   └─────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! Every handle-bearing object moves `Unopened -> Open -> Closed` and
//! releases exactly one engine handle, exactly once. Containers do not track
//! the children they hand out; closing out of order is safe, and operations
//! on a closed handle fail with [`VaultError::InvalidHandle`] instead of
//! corrupting state.
//!
//! ## Example
//!
//! ```no_run
//! use gridvault::{Container, DatasetOptions, Dimensions, File};
//!
//! # fn main() -> gridvault::Result<()> {
//! let mut file = File::new();
//! file.create("samples.gv", true)?;
//!
//! let dims = Dimensions::from([13, 3]);
//! let dataset = file.create_dataset::<f32>("/doh", &dims, &DatasetOptions::new())?;
//! let values: Vec<f32> = (0..39).map(|i| i as f32).collect();
//! assert!(dataset.write(&values));
//!
//! let attr = dataset.create_attribute::<u32>("counts", &Dimensions::from([2]))?;
//! assert!(attr.write(&[123u32, 456]));
//!
//! file.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;

pub mod attribute;
pub mod container;
pub mod dataset;
pub mod dims;
pub mod dtype;
pub mod engine;
pub mod file;
pub mod group;

mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use attribute::Attribute;
pub use container::{Container, DatasetOptions};
pub use dataset::Dataset;
pub use dims::Dimensions;
pub use dtype::{ByteOrder, Scalar, ScalarKind, TypeClass, TypeDescriptor, TypeInfo};
pub use error::{Result, VaultError};
pub use file::File;
pub use group::Group;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GridVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
