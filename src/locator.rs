use crate::platform::PlatformOps;
use std::path::{Path, PathBuf};

/// Packaging shapes an extracted version may have, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<bundle>/Contents/MacOS/<product>`
    AppBundle,
    /// `<product>/bin/<product>`
    NestedBin,
    /// `<product>`
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedBinary {
    pub layout: Layout,
    pub path: PathBuf,
}

pub struct BinaryLocator<'a> {
    product: &'a str,
    app_bundle: &'a str,
    platform: &'a dyn PlatformOps,
}

impl<'a> BinaryLocator<'a> {
    pub fn new(product: &'a str, app_bundle: &'a str, platform: &'a dyn PlatformOps) -> Self {
        Self {
            product,
            app_bundle,
            platform,
        }
    }

    pub fn candidates(&self, version_dir: &Path) -> [(Layout, PathBuf); 3] {
        let bin = self.platform.final_binary_name(self.product);
        [
            (
                Layout::AppBundle,
                version_dir
                    .join(self.app_bundle)
                    .join("Contents")
                    .join("MacOS")
                    .join(self.product),
            ),
            (
                Layout::NestedBin,
                version_dir.join(self.product).join("bin").join(&bin),
            ),
            (Layout::Flat, version_dir.join(&bin)),
        ]
    }

    pub fn locate(&self, version_dir: &Path) -> Option<LocatedBinary> {
        self.candidates(version_dir)
            .into_iter()
            .find(|(_, path)| path.is_file())
            .map(|(layout, path)| LocatedBinary { layout, path })
    }
}
