//! Image reference composition

/// Separator between image version and tag.
pub const TAG_SEPARATOR: &str = "-";

/// Compose `repository[:version[-tag]]`.
///
/// Version and tag are joined with [`TAG_SEPARATOR`] only when both are
/// non-empty, and the suffix is attached only when it is at least two
/// characters long.
pub fn compose_image_name(image: &str, version: Option<&str>, tag: Option<&str>) -> String {
    let mut suffix = version.unwrap_or_default().to_string();
    if let Some(tag) = tag {
        if !suffix.is_empty() && !tag.is_empty() {
            suffix.push_str(TAG_SEPARATOR);
        }
        suffix.push_str(tag);
    }

    if suffix.len() > 1 {
        format!("{image}:{suffix}")
    } else {
        image.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("1.0"), Some(""), "foo:1.0")]
    #[case(Some(""), Some(""), "foo")]
    #[case(Some("1.0"), Some("k8s"), "foo:1.0-k8s")]
    #[case(None, None, "foo")]
    #[case(None, Some("k8s"), "foo:k8s")]
    #[case(Some("1"), None, "foo")]
    fn composes_image_names(
        #[case] version: Option<&str>,
        #[case] tag: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(compose_image_name("foo", version, tag), expected);
    }
}
