use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Express `path` relative to `root` without touching the filesystem.
///
/// Relative inputs are anchored at `working_dir`. `.` and `..` are folded
/// lexically, so a result that lies outside `root` starts with one or more
/// `..` components. A path equal to `root` yields an empty path.
pub fn relative_to_root(path: &Utf8Path, working_dir: &Utf8Path, root: &Utf8Path) -> Utf8PathBuf {
    let target = absolute_components(path, working_dir);
    let base = absolute_components(root, working_dir);

    let shared = target
        .iter()
        .zip(base.iter())
        .take_while(|(left, right)| left == right)
        .count();

    let mut relative = Utf8PathBuf::new();
    for _ in shared..base.len() {
        relative.push("..");
    }
    for part in &target[shared..] {
        relative.push(part);
    }
    relative
}

/// True when a root-relative path climbs out of the root.
pub fn escapes_root(relative: &Utf8Path) -> bool {
    matches!(
        relative.components().next(),
        Some(Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_))
    )
}

fn absolute_components(path: &Utf8Path, working_dir: &Utf8Path) -> Vec<String> {
    let anchored = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };
    let mut parts: Vec<String> = Vec::new();
    for component in anchored.components() {
        match component {
            Utf8Component::Prefix(prefix) => {
                parts.clear();
                parts.push(prefix.as_str().to_string());
            }
            Utf8Component::RootDir | Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                parts.pop();
            }
            Utf8Component::Normal(name) => parts.push(name.to_string()),
        }
    }
    parts
}
