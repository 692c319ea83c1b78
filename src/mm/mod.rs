//! Memory management
//!
//! Provides:
//! - Virtual address types and the user address window
//! - Per-process address spaces with range copy, clear, merge and
//!   permission operations
//!
//! # Security Principles
//! - User addresses are only dereferenced through an [`space::AddressSpace`]
//! - Access checks happen on every byte range, per page

pub mod address;
pub mod space;

pub use address::{VirtAddr, PAGE_SIZE, USER_HI, USER_LO};
pub use space::{AddressSpace, MappingError, Perm};
