//! # Equipment interfaces

pub mod drive;
