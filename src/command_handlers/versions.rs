use crate::error::ShimError;
use crate::platform::PlatformOps;
use crate::store::{Store, VersionId};

pub fn list_versions(store: &Store, platform: &dyn PlatformOps) -> Result<(), ShimError> {
    let lines = render_versions(store, platform)?;
    if lines.is_empty() {
        println!("no versions installed in {}", store.versions_dir().display());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub fn render_versions(store: &Store, platform: &dyn PlatformOps) -> Result<Vec<String>, ShimError> {
    let current = store.current(platform).read()?;
    Ok(store
        .list_versions()?
        .into_iter()
        .map(|v| {
            if current.as_ref() == Some(&v) {
                format!("* {v} (current)")
            } else {
                format!("  {v}")
            }
        })
        .collect())
}

/// Repoint the current version. The pointer is only touched once the target is known to be installed.
pub fn switch_version(
    store: &Store,
    platform: &dyn PlatformOps,
    raw: Option<&str>,
) -> Result<(), ShimError> {
    let raw = raw.ok_or(ShimError::MissingSwitchTarget)?;
    let id = VersionId::parse(raw)?;
    if !store.is_installed(&id) {
        return Err(ShimError::not_installed(id.as_str(), &store.list_versions()?));
    }
    store.current(platform).write(&id)?;
    log::info!("current version is now {id}");
    println!("Switched to {id}");
    Ok(())
}
