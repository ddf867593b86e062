use crate::cli::Invocation;
use crate::config::{ShimEnv, VERSION_VAR};
use crate::error::ShimError;
use crate::platform::PlatformOps;
use crate::store::{Store, VersionId};

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Flag,
    Environment,
    CurrentPointer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub id: VersionId,
    pub source: VersionSource,
}

/// Pick the version to run: `--use-version`, then `VSHIM_VERSION`, then the current pointer.
/// Read-only; there is no fallback to the newest installed version.
pub fn resolve(
    invocation: &Invocation,
    env: &ShimEnv,
    store: &Store,
    platform: &dyn PlatformOps,
) -> Result<ResolvedVersion, ShimError> {
    let (raw, source) = if let Some(v) = &invocation.use_version {
        (v.clone(), VersionSource::Flag)
    } else if let Some(v) = &env.version {
        (v.clone(), VersionSource::Environment)
    } else if let Some(id) = store.current(platform).read()? {
        (id.to_string(), VersionSource::CurrentPointer)
    } else {
        return Err(ShimError::NoVersionResolved {
            env_var: VERSION_VAR,
            store: store.root().to_path_buf(),
        });
    };
    let id = VersionId::parse(&raw)?;
    if !store.is_installed(&id) {
        let available = store.list_versions().unwrap_or_default();
        return Err(ShimError::not_installed(id.as_str(), &available));
    }
    log::debug!("resolved version {id} from {source:?}");
    Ok(ResolvedVersion { id, source })
}
