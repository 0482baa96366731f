mod config;
mod data;
mod pipeline;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use config::Config;

fn main() -> Result<()> {
    env_logger::init();

    // Optional JSON config; every field defaults to the 0943-242 setup.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    pipeline::run(&config)
}
