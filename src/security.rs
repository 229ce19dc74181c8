//! Lexical path checks for the data directory trust boundary.
//!
//! Nothing here touches the filesystem: symlinks, case folding and existence are
//! left to the operating system when the file is finally opened.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the filesystem root stays at the root, the same way `cd /..` does.
/// Repeated separators are already merged by [`Path::components`].
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// True iff `candidate` is `root` itself or lies strictly below it.
///
/// Both sides are normalized first. The comparison is per component, so a
/// sibling such as `/srv/data-extra` never matches a root of `/srv/data`.
pub fn is_within_root(candidate: &Path, root: &Path) -> bool {
    let candidate = normalize_lexical(candidate);
    let root = normalize_lexical(root);
    if !candidate.is_absolute() || !root.is_absolute() {
        return false;
    }
    candidate.starts_with(&root)
}
