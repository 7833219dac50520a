use shellbox_installer::{
    ResourceStore, ENGINE_ARCHIVE, LIB_ARCHIVE, LIB_VERSION_RESOURCE, SHELL_ARCHIVE,
    SHELL_VERSION_RESOURCE,
};

/// Default properties compiled into the binary; the lowest-precedence
/// configuration source.
pub const DEFAULT_PROPERTIES: &str = include_str!("../resources/cli.properties");

/// The embedded distribution: archives and their version texts compiled
/// into the binary at build time.
pub struct BundledResources;

impl ResourceStore for BundledResources {
    fn archive(&self, id: &str) -> Option<&[u8]> {
        match id {
            LIB_ARCHIVE => Some(include_bytes!("../resources/libs.zip")),
            SHELL_ARCHIVE => Some(include_bytes!("../resources/shell.zip")),
            ENGINE_ARCHIVE => Some(include_bytes!("../resources/engine.zip")),
            _ => None,
        }
    }

    fn text(&self, id: &str) -> Option<&str> {
        match id {
            LIB_VERSION_RESOURCE => Some(include_str!("../resources/libs.version")),
            SHELL_VERSION_RESOURCE => Some(include_str!("../resources/shell.version")),
            _ => None,
        }
    }
}
