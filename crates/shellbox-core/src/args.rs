use std::collections::HashMap;

/// Folds a raw argument list into a case-insensitive key/value map.
///
/// Each argument is trimmed, one leading dash is stripped, and the first `=`
/// splits key from value; an argument without `=` becomes a presence-only
/// flag with an empty value. Blank arguments are dropped and later duplicate
/// keys overwrite earlier ones.
pub fn to_map(args: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for arg in args {
        let mut raw = arg.trim();
        if raw.is_empty() {
            continue;
        }
        if let Some(stripped) = raw.strip_prefix('-') {
            raw = stripped.trim();
        }
        let (key, value) = match raw.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (raw, ""),
        };
        map.insert(key.to_ascii_lowercase(), value.to_string());
    }
    map
}

/// Prefix lookup over the raw (un-mapped) argument list, matching both the
/// bare text and a single-dash-prefixed spelling so `-lib=foo` is found when
/// searching for `lib`.
pub fn list_index_of(args: &[String], text: &str) -> Option<usize> {
    let needle = text.to_ascii_lowercase();
    let dashed = format!("-{needle}");
    args.iter().position(|arg| {
        let lower = arg.to_ascii_lowercase();
        lower.starts_with(&needle) || lower.starts_with(&dashed)
    })
}

pub fn list_contains(args: &[String], text: &str) -> bool {
    list_index_of(args, text).is_some()
}

/// Removes every argument matching `text` by prefix (bare or single-dash).
pub fn remove_containing(args: &mut Vec<String>, text: &str) {
    let needle = text.to_ascii_lowercase();
    let dashed = format!("-{needle}");
    args.retain(|arg| {
        let lower = arg.to_ascii_lowercase();
        !(lower.starts_with(&needle) || lower.starts_with(&dashed))
    });
}

/// Non-mutating variant of [`remove_containing`] for pass-through lists.
pub fn remove_element(args: &[String], prefix: &str) -> Vec<String> {
    let needle = prefix.to_ascii_lowercase();
    args.iter()
        .filter(|arg| !arg.to_ascii_lowercase().starts_with(&needle))
        .cloned()
        .collect()
}

/// Case-insensitive map lookup tolerating an optional leading dash on the
/// stored key, so `key` and `-key` spellings resolve uniformly.
pub fn map_get_no_case<'m>(map: &'m HashMap<String, String>, text: &str) -> Option<&'m str> {
    let needle = text.to_ascii_lowercase();
    let dashed = format!("-{needle}");
    map.iter()
        .find(|(key, _)| {
            let lower = key.to_ascii_lowercase();
            lower.starts_with(&needle) || lower.starts_with(&dashed)
        })
        .map(|(_, value)| value.as_str())
}
