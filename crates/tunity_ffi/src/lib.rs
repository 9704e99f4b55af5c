//! Flutter bridge for Tunity core.

pub mod api;
mod host;
