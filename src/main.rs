mod cli;
mod command_handlers;
mod config;
mod error;
mod locator;
mod platform;
mod resolver;
mod store;
mod updater;

use anyhow::Result;

use crate::cli::Invocation;
use crate::config::{ShimConfig, ShimEnv, LOG_VAR};
use crate::platform::platform;

fn main() -> Result<()> {
    init_logging();
    let mut args = std::env::args_os();
    let program = args.next();
    let invocation = Invocation::parse(args);
    let env = ShimEnv::capture(program.as_ref());
    let cfg = ShimConfig::load(&env, platform())?;
    command_handlers::dispatch::dispatch(invocation, &env, &cfg, platform())?;
    Ok(())
}

/// `VSHIM_LOG` takes a full env_logger filter; otherwise only warnings reach stderr.
fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);
    match std::env::var(LOG_VAR) {
        Ok(filter) => {
            builder.parse_filters(&filter);
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Warn);
        }
    }
    builder.init();
}
