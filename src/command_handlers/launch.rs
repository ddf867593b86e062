use crate::cli::Invocation;
use crate::config::{ShimConfig, ShimEnv, HOME_VAR, RUNNER_CWD_VAR};
use crate::error::ShimError;
use crate::locator::BinaryLocator;
use crate::platform::PlatformOps;
use crate::resolver;
use crate::updater::{ApplyOutcome, UpdateApplier};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Update, resolve, locate, then replace this process with the selected binary.
/// Returns only on failure.
pub fn launch(
    invocation: Invocation,
    env: &ShimEnv,
    cfg: &ShimConfig,
    platform: &dyn PlatformOps,
) -> Result<(), ShimError> {
    let store = cfg.store();
    let locator = BinaryLocator::new(&cfg.product, &cfg.app_bundle, platform);

    if let ApplyOutcome::Applied(v) = UpdateApplier::new(&store, &locator, platform).apply() {
        log::info!("now running {v}");
    }

    let resolved = resolver::resolve(&invocation, env, &store, platform)?;
    let version_dir = store.version_dir(&resolved.id);
    let binary = locator
        .locate(&version_dir)
        .ok_or_else(|| ShimError::BinaryNotFound {
            version: resolved.id.to_string(),
            dir: version_dir.clone(),
        })?;
    log::debug!(
        "launching {} ({:?} layout, version {} from {:?})",
        binary.path.display(),
        binary.layout,
        resolved.id,
        resolved.source
    );

    let mut cmd = build_command(&binary.path, invocation.forwarded, env, store.root());
    Err(ShimError::Exec {
        path: binary.path,
        source: platform.exec(&mut cmd),
    })
}

fn build_command(binary: &Path, args: Vec<OsString>, env: &ShimEnv, store_root: &Path) -> Command {
    let runner_cwd = env
        .runner_cwd
        .clone()
        .or_else(|| env.cwd.clone().map(OsString::from))
        .unwrap_or_else(|| OsString::from("."));
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .env(RUNNER_CWD_VAR, runner_cwd)
        .env(HOME_VAR, store_root);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn env_value(cmd: &Command, key: &str) -> Option<OsString> {
        cmd.get_envs()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.map(OsString::from))
    }

    #[test]
    fn runner_cwd_defaults_to_caller_directory() {
        let env = ShimEnv {
            cwd: Some(PathBuf::from("/work/project")),
            ..ShimEnv::default()
        };
        let cmd = build_command(Path::new("/bin/app"), vec![OsString::from("-x")], &env, Path::new("/store"));
        assert_eq!(env_value(&cmd, RUNNER_CWD_VAR), Some(OsString::from("/work/project")));
        assert_eq!(env_value(&cmd, HOME_VAR), Some(OsString::from("/store")));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec!["-x"]);
    }

    #[test]
    fn explicit_runner_cwd_is_kept() {
        let env = ShimEnv {
            runner_cwd: Some(OsString::from("/elsewhere")),
            cwd: Some(PathBuf::from("/work/project")),
            ..ShimEnv::default()
        };
        let cmd = build_command(Path::new("/bin/app"), Vec::new(), &env, Path::new("/store"));
        assert_eq!(env_value(&cmd, RUNNER_CWD_VAR), Some(OsString::from("/elsewhere")));
    }
}
