use crate::ClientError;

/// Longest accepted object or directory name, in characters.
pub const MAX_NAME_LEN: usize = 255;

pub const MIN_BUCKET_NAME_LEN: usize = 3;
pub const MAX_BUCKET_NAME_LEN: usize = 64;

/// Validates a single object name.
///
/// Rejects:
/// - Empty names
/// - Names containing `/`
/// - Names longer than 255 characters
pub fn validate_object_name(name: &str) -> Result<(), ClientError> {
    validate_name("object", name)
}

/// Validates a single directory name; same rules as object names.
pub fn validate_dir_name(name: &str) -> Result<(), ClientError> {
    validate_name("directory", name)
}

fn validate_name(kind: &str, name: &str) -> Result<(), ClientError> {
    if name.is_empty() {
        return Err(ClientError::InvalidName(format!("{kind} name must not be empty")));
    }
    if name.contains('/') {
        return Err(ClientError::InvalidName(format!(
            "{kind} names cannot contain \"/\" characters: {name}"
        )));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ClientError::InvalidName(format!(
            "{kind} names cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validates a bucket name (3 to 64 characters, no `/`).
pub fn validate_bucket_name(name: &str) -> Result<(), ClientError> {
    let len = name.chars().count();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(ClientError::InvalidName(format!(
            "bucket names must be {MIN_BUCKET_NAME_LEN} to {MAX_BUCKET_NAME_LEN} characters: {name}"
        )));
    }
    if name.contains('/') {
        return Err(ClientError::InvalidName(format!(
            "bucket names cannot contain \"/\" characters: {name}"
        )));
    }
    Ok(())
}

/// Splits a full path into `(parent, name)` at the last `/`.
///
/// `"a/b/c.txt"` gives `("a/b", "c.txt")`; a path without `/` has an empty
/// parent.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}

/// Lists every directory level of `path` with its parent path.
///
/// `path_breadcrumbs("a/b/c", "x")` yields
/// `[("a", "x"), ("b", "x/a"), ("c", "x/a/b")]`.
pub fn path_breadcrumbs(path: &str, base_dir: &str) -> Vec<(String, String)> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Vec::new();
    }

    let mut parent: Vec<&str> = Vec::new();
    if !base_dir.is_empty() {
        parent.push(base_dir);
    }

    let mut crumbs = Vec::new();
    for name in path.split('/') {
        crumbs.push((name.to_string(), parent.join("/")));
        parent.push(name);
    }
    crumbs
}
