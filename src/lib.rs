//! Set extraConfig keys on a Cloud Director VM and optionally power it on.

pub mod cli;
pub mod commands;
pub mod utils;
