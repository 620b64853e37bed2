//! List search and pagination primitives shared by every entity list.
//!
//! # Responsibility
//! - Normalize optional search text into SQL `LIKE` patterns.
//! - Turn page requests and totals into bounded `LIMIT/OFFSET` windows.

pub mod filter;
pub mod page;
