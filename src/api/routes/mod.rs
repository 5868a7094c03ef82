//! API Routes
//!
//! Route handlers organized by functionality.

pub mod export;
pub mod health;
pub mod inventory;
pub mod products;
pub mod reports;
pub mod sales;
pub mod special_outbound;
pub mod validation;
pub mod variance;
