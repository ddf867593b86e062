use crate::cli::{Invocation, PrivateCommand};
use crate::command_handlers::{launch, versions};
use crate::config::{ShimConfig, ShimEnv};
use crate::platform::PlatformOps;
use anyhow::Result;

pub fn dispatch(
    invocation: Invocation,
    env: &ShimEnv,
    cfg: &ShimConfig,
    platform: &dyn PlatformOps,
) -> Result<()> {
    let store = cfg.store();
    match invocation.command.clone() {
        Some(PrivateCommand::ShimVersion) => {
            println!("vshim {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(PrivateCommand::ListVersions) => Ok(versions::list_versions(&store, platform)?),
        Some(PrivateCommand::SwitchVersion(id)) => {
            Ok(versions::switch_version(&store, platform, id.as_deref())?)
        }
        None => Ok(launch::launch(invocation, env, cfg, platform)?),
    }
}
