//! SR1 electron-recoil spectrum: low-energy excess significance and the
//! two-panel data/residual figure.

pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod render;
pub mod stats;
