mod extract;
mod layout;
mod libpath;
mod markers;
mod provision;

pub use extract::{clean_unpacked, install_archive, is_protected_config, PROTECTED_SUFFIXES};
pub use layout::{
    default_user_home, lib_marker_path, HomeLayout, LIB_MARKER_FILE, SHELL_MARKER_FILE,
};
pub use libpath::{
    check_locked, list_libraries, remove_previous, resolve_library_path, LIBRARY_EXT,
    MIN_LIBRARY_COUNT,
};
pub use markers::{check_marker, delete_marker, read_marker, write_marker, MarkerStatus};
pub use provision::{
    provision, ComponentAction, ProvisionOptions, ProvisionReport, ResourceStore, ENGINE_ARCHIVE,
    LIB_ARCHIVE, LIB_VERSION_RESOURCE, SHELL_ARCHIVE, SHELL_VERSION_RESOURCE,
};
