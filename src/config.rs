use crate::platform::PlatformOps;
use crate::store::Store;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const HOME_VAR: &str = "VSHIM_HOME";
pub const VERSION_VAR: &str = "VSHIM_VERSION";
pub const RUNNER_CWD_VAR: &str = "VSHIM_RUNNER_CWD";
pub const PRODUCT_VAR: &str = "VSHIM_PRODUCT";
pub const LOG_VAR: &str = "VSHIM_LOG";

const DEFAULT_STORE_DIR: &str = ".vshim";
const FALLBACK_PRODUCT: &str = "vshim";

/// Snapshot of everything the launcher reads from its environment, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct ShimEnv {
    /// Program name the shim was invoked as (`argv[0]`).
    pub program: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub version: Option<String>,
    pub product: Option<String>,
    pub runner_cwd: Option<OsString>,
    pub cwd: Option<PathBuf>,
}

impl ShimEnv {
    pub fn capture(program: Option<&OsString>) -> Self {
        Self::from_lookup(program, |key| std::env::var_os(key), std::env::current_dir().ok())
    }

    pub fn from_lookup<F>(program: Option<&OsString>, lookup: F, cwd: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let string = |key: &str| {
            non_empty(key)
                .and_then(|v| v.into_string().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            program: program.map(PathBuf::from),
            home: non_empty(HOME_VAR).map(PathBuf::from),
            version: string(VERSION_VAR),
            product: string(PRODUCT_VAR),
            runner_cwd: non_empty(RUNNER_CWD_VAR),
            cwd,
        }
    }

    /// Product name implied by the invoked program name, e.g. `/usr/local/bin/acme` -> `acme`.
    fn invoked_as(&self) -> Option<String> {
        self.program
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
    }
}

/// Optional `<store>/shim.toml`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub product: Option<String>,
    /// Name of the application bundle directory, e.g. `Acme.app`.
    #[serde(default)]
    pub app_bundle: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs_err::read_to_string(path)?;
        let cfg: FileConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(cfg))
    }
}

#[derive(Debug, Clone)]
pub struct ShimConfig {
    pub store_root: PathBuf,
    pub product: String,
    pub app_bundle: String,
}

impl ShimConfig {
    /// Defaults, then `shim.toml`, then environment.
    pub fn load(env: &ShimEnv, platform: &dyn PlatformOps) -> Result<Self> {
        let store_root = match &env.home {
            Some(home) => home.clone(),
            None => platform
                .home_dir()
                .map(|h| h.join(DEFAULT_STORE_DIR))
                .context("cannot determine home directory; set VSHIM_HOME")?,
        };
        let file = FileConfig::load(&Store::new(&store_root).config_path())?.unwrap_or_default();
        let product = env
            .product
            .clone()
            .or(file.product)
            .or_else(|| env.invoked_as())
            .unwrap_or_else(|| FALLBACK_PRODUCT.to_string());
        let app_bundle = file
            .app_bundle
            .unwrap_or_else(|| format!("{product}.app"));
        Ok(Self {
            store_root,
            product,
            app_bundle,
        })
    }

    pub fn store(&self) -> Store {
        Store::new(&self.store_root)
    }
}
