//! Custom image build layers and their cache tags
//!
//! A tag is derived from the build context folder name, the instructions and
//! the modification time of every file in the folder. Touching a file forces
//! a rebuild even when its bytes did not change.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use dockhand_fs::TreeFingerprint;
use regex::Regex;
use serde::Serialize;

/// Files whose path contains this are excluded from the fingerprint; the
/// generated build descriptor is tracked through the instructions instead.
pub const BUILD_DESCRIPTOR_PATTERN: &str = "dockhand_dockerfile";

static TAG_FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("Invalid tag filter regex"));

/// One set of build instructions contributed by a configuration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSpec {
    pub instructions: String,
    /// Build context folder as configured, if any
    pub folder: Option<String>,
    /// Explicit tag as configured, if any
    pub tag: Option<String>,
    /// Identifier of the layer that declared this build
    pub source: String,
    /// Directory relative folders are resolved against
    pub source_dir: PathBuf,
}

impl BuildSpec {
    /// Directory used as the build context.
    pub fn context_dir(&self) -> PathBuf {
        match self.folder.as_deref().filter(|f| !f.is_empty()) {
            None => self.source_dir.clone(),
            Some(folder) if Path::new(folder).is_absolute() => PathBuf::from(folder),
            Some(folder) => self.source_dir.join(folder),
        }
    }

    /// Tag for the image produced by this build.
    ///
    /// An explicit tag is only sanitized. Otherwise the tag is
    /// `<context-folder-name>-<fingerprint>`.
    pub fn tag(&self) -> String {
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            return sanitize_tag(tag);
        }

        let context = self.context_dir();
        let base = context
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut fingerprint = TreeFingerprint::new().text(&base).text(&self.instructions);
        if self.folder.as_deref().is_some_and(|f| !f.is_empty()) {
            fingerprint = fingerprint.file_times(&context, BUILD_DESCRIPTOR_PATTERN);
        }
        let digest = fingerprint.finish();

        tracing::trace!(source = %self.source, context = %context.display(), %digest, "Computed build tag");
        sanitize_tag(&format!("{base}-{digest}"))
    }
}

/// Remove every character outside `[a-zA-Z0-9._-]`.
pub fn sanitize_tag(tag: &str) -> String {
    TAG_FORBIDDEN.replace_all(tag, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_test_utils::TestTree;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn spec(tree: &TestTree, folder: Option<&str>, tag: Option<&str>) -> BuildSpec {
        BuildSpec {
            instructions: "RUN apk add jq".into(),
            folder: folder.map(str::to_string),
            tag: tag.map(str::to_string),
            source: tree.path(".dockhand.config").display().to_string(),
            source_dir: tree.root().to_path_buf(),
        }
    }

    fn touch(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[rstest]
    #[case("release 1.0", "release1.0")]
    #[case("feature/x:y", "featurexy")]
    #[case("ok_tag-1.2", "ok_tag-1.2")]
    fn sanitizes_tags(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_tag(raw), expected);
    }

    #[test]
    fn explicit_tag_wins() {
        let tree = TestTree::new();
        assert_eq!(spec(&tree, Some("ctx"), Some("my tag!")).tag(), "mytag");
    }

    #[test]
    fn context_dir_resolution() {
        let tree = TestTree::new();
        assert_eq!(spec(&tree, None, None).context_dir(), tree.root());
        assert_eq!(spec(&tree, Some("ctx"), None).context_dir(), tree.path("ctx"));

        let absolute = tree.path("elsewhere");
        let s = spec(&tree, Some(&absolute.display().to_string()), None);
        assert_eq!(s.context_dir(), absolute);
    }

    #[test]
    fn computed_tag_is_prefixed_with_folder_name() {
        let tree = TestTree::new();
        tree.write("ctx/script.sh", "echo hi");
        let tag = spec(&tree, Some("ctx"), None).tag();
        assert!(tag.starts_with("ctx-"), "{tag}");
        assert_eq!(tag.len(), "ctx-".len() + 64);
    }

    #[test]
    fn unchanged_context_yields_identical_tag() {
        let tree = TestTree::new();
        tree.write("ctx/script.sh", "echo hi");
        let s = spec(&tree, Some("ctx"), None);
        assert_eq!(s.tag(), s.tag());
    }

    #[test]
    fn touching_a_file_changes_the_tag() {
        let tree = TestTree::new();
        let file = tree.write("ctx/nested/script.sh", "echo hi");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&file, base);

        let s = spec(&tree, Some("ctx"), None);
        let before = s.tag();
        touch(&file, base + Duration::from_secs(1));
        assert_ne!(before, s.tag());
    }

    #[test]
    fn build_descriptor_is_not_fingerprinted() {
        let tree = TestTree::new();
        tree.write("ctx/script.sh", "echo hi");
        let descriptor = tree.write("ctx/dockhand_dockerfile", "FROM x");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&descriptor, base);

        let s = spec(&tree, Some("ctx"), None);
        let before = s.tag();
        touch(&descriptor, base + Duration::from_secs(60));
        assert_eq!(before, s.tag());
    }

    #[test]
    fn timestamps_ignored_without_configured_folder() {
        let tree = TestTree::new();
        let file = tree.write("script.sh", "echo hi");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&file, base);

        let s = spec(&tree, None, None);
        let before = s.tag();
        touch(&file, base + Duration::from_secs(1));
        assert_eq!(before, s.tag());
    }

    #[test]
    fn instructions_change_the_tag() {
        let tree = TestTree::new();
        let a = spec(&tree, None, None);
        let mut b = a.clone();
        b.instructions.push_str("\nRUN true");
        assert_ne!(a.tag(), b.tag());
    }
}
