//! Declaration-level diff engine.
//!
//! Reconciles the before/after declaration indexes of one module into added,
//! deleted and modified entries per declaration kind.
//!
//! # Example
//!
//! ```rust,ignore
//! use resdiff_core::differ::diff_declarations;
//!
//! let diff = diff_declarations(&old.functions, &new.functions);
//! for entry in &diff.modified {
//!     println!("~ {}", entry.name);
//! }
//! ```

pub mod changes;
pub mod comparator;

pub use changes::{ChangeEntry, ChangeType};
pub use comparator::{diff_declarations, KindDiff};
