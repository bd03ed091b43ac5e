pub mod set_extra_config;
