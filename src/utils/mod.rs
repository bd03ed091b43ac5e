pub mod config;
pub mod extra_config;
pub mod output;
pub mod presence;
pub mod vcd;
