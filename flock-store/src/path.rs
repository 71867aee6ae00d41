//! Key path helpers.
//!
//! Keys are absolute, slash separated, without a trailing slash.

/// Normalize a key: leading slash, no empty segments, no trailing slash.
pub fn normalize(key: &str) -> String {
    let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Join segments onto a base key.
pub fn join<I, S>(base: &str, segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = normalize(base);
    for segment in segments {
        let segment = segment.as_ref().trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !key.ends_with('/') {
            key.push('/');
        }
        key.push_str(segment);
    }
    key
}

/// Last segment of a key.
pub fn basename(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Parent key, `None` for the root.
pub fn parent(key: &str) -> Option<String> {
    let key = normalize(key);
    if key == "/" {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(key[..idx].to_string()),
        None => None,
    }
}
