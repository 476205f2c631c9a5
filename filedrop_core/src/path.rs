//! Path confinement under the storage root.

use std::path::{Component, Path, PathBuf};

/// Join `requested` onto `root`, resolving `.` and `..` lexically.
///
/// Returns `None` if any prefix of the result would step above `root`, or if
/// `requested` is absolute. Never touches the filesystem.
pub(crate) fn confine(root: &Path, requested: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(resolved)
}

/// Whether `candidate` lies at or below `root`. Both must already be
/// canonical; the comparison is per component, so `/data2` is not under
/// `/data`.
pub(crate) fn is_contained(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confine_plain_name() {
        let root = Path::new("/srv/drop");
        assert_eq!(
            confine(root, "1-2.cat.png"),
            Some(PathBuf::from("/srv/drop/1-2.cat.png"))
        );
    }

    #[test]
    fn test_confine_resolves_inner_dots() {
        let root = Path::new("/srv/drop");
        assert_eq!(
            confine(root, "a/./b/../c.txt"),
            Some(PathBuf::from("/srv/drop/a/c.txt"))
        );
        assert_eq!(confine(root, "."), Some(PathBuf::from("/srv/drop")));
    }

    #[test]
    fn test_confine_rejects_escapes() {
        let root = Path::new("/srv/drop");
        assert_eq!(confine(root, ".."), None);
        assert_eq!(confine(root, "../cat.png"), None);
        assert_eq!(confine(root, "../../etc/passwd"), None);
        assert_eq!(confine(root, "a/../../drop/x"), None);
        assert_eq!(confine(root, "./../x"), None);
    }

    #[test]
    fn test_confine_rejects_absolute() {
        let root = Path::new("/srv/drop");
        assert_eq!(confine(root, "/etc/passwd"), None);
        assert_eq!(confine(root, "/srv/drop/inside"), None);
    }

    #[test]
    fn test_is_contained_is_component_wise() {
        let root = Path::new("/srv/drop");
        assert!(is_contained(root, Path::new("/srv/drop/x")));
        assert!(is_contained(root, Path::new("/srv/drop")));
        assert!(!is_contained(root, Path::new("/srv/drop2/x")));
        assert!(!is_contained(root, Path::new("/srv")));
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Whatever survives confinement stays under the root
        #[test]
        fn prop_confined_paths_stay_under_root(
            segments in prop::collection::vec(
                prop::sample::select(vec!["..", ".", "a", "b.txt", "", "drop"]),
                1..10,
            ),
            leading_slash in any::<bool>(),
        ) {
            let root = Path::new("/srv/drop");
            let mut requested = segments.join("/");
            if leading_slash {
                requested.insert(0, '/');
            }

            if let Some(resolved) = confine(root, &requested) {
                prop_assert!(resolved.starts_with(root));
                prop_assert!(!leading_slash);
            }
        }
    }
}
