mod args;
mod properties;
mod version;

pub use args::{
    list_contains, list_index_of, map_get_no_case, remove_containing, remove_element, to_map,
};
pub use properties::Properties;
pub use version::{compare_versions, Version};

#[cfg(test)]
mod tests;
