//! REST API under `/api/v1`

pub mod dto;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod state;
