use crate::pattern::normalise_path;

/// Join a bundle-relative path onto a URL base.
///
/// The result always uses forward slashes and never doubles the separator between the base
/// and the path, regardless of whether the base carries a trailing slash or the path a
/// leading one. An empty base leaves the path untouched.
pub fn join_url(base: &str, path: &str) -> String {
    let path = normalise_path(path);
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        return path.to_string();
    }

    let base = base.replace('\\', "/");
    if path.is_empty() {
        return base;
    }

    format!("{}/{}", base.trim_end_matches('/'), path)
}
