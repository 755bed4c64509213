//! Deterministic collision resolution for move destinations.

/// Find a free destination, starting from `desired`.
///
/// If the desired path is free it is returned unchanged; otherwise
/// ` (1)`, ` (2)`, … is appended before the extension until a free
/// candidate is found. Only probes through `exists`; never mutates.
pub fn resolve_collision<F>(desired: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !exists(desired) {
        return desired.to_string();
    }

    let (base, ext) = split_base_and_ext(desired);
    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{} ({}){}", base, counter, ext);
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Split at the last dot of the final component. Dotfiles and names
/// without a dot have no extension; neither does a path ending in a
/// separator.
fn split_base_and_ext(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let name = &path[name_start..];
    match name.rfind('.') {
        Some(i) if i > 0 => path.split_at(name_start + i),
        _ => (path, ""),
    }
}
