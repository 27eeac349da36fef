//! Path helpers: `~` collapsing/expansion, directory-target detection,
//! common-prefix computation and symlink resolution.
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Marker used in documents for the user's home directory.
pub const HOME_MARKER: &str = "~";

/// Maximum number of symlink hops followed by [`real_path`].
const MAX_LINK_DEPTH: usize = 40;

/// Resolve the user's home directory.
///
/// Honours `$HOME` and falls back to the account database entry for the
/// current user when it is unset.
///
/// # Errors
///
/// Returns an error if neither source yields a directory.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine the user's home directory"))
}

/// Rewrite `path` as `~/...` when it lives under `home`.
///
/// Paths outside `home` are returned unchanged; `home` itself becomes `~`.
#[must_use]
pub fn collapse_home(path: &Path, home: &Path) -> String {
    let path = normalize(path);
    let home = normalize(home);
    match path.strip_prefix(&home) {
        Ok(rest) if rest.as_os_str().is_empty() => HOME_MARKER.to_string(),
        Ok(rest) => format!("{HOME_MARKER}{MAIN_SEPARATOR}{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Expand a leading `~` in `path` to `home`.
///
/// Relative paths without a `~` are resolved against `home` as well, so
/// documents never depend on the working directory.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == HOME_MARKER {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home.join(p)
    }
}

/// True when `target` names a directory: a trailing separator or `~` alone.
#[must_use]
pub fn is_directory_target(target: &str) -> bool {
    target.ends_with('/') || target.ends_with(MAIN_SEPARATOR) || target == HOME_MARKER
}

/// True when `pattern` contains glob metacharacters.
#[must_use]
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Deepest directory shared by every path in `paths`.
///
/// Paths that are not existing directories contribute their parent
/// directory. Comparison is component-wise, so `/a/bc` and `/a/b` share
/// `/a`, not `/a/b`.
#[must_use]
pub fn common_path<P: AsRef<Path>>(paths: &[P]) -> PathBuf {
    let dirs: Vec<PathBuf> = paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            if p.is_dir() {
                normalize(p)
            } else {
                normalize(p.parent().unwrap_or(p))
            }
        })
        .collect();

    let Some((first, rest)) = dirs.split_first() else {
        return PathBuf::new();
    };

    let mut common: Vec<Component<'_>> = first.components().collect();
    for dir in rest {
        let shared = common
            .iter()
            .zip(dir.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }
    common.iter().collect()
}

/// True when `path` lies at or below `root`, comparing resolved paths.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    let root = real_path(root);
    common_path(&[root.as_path(), path]) == root
}

/// Resolve `path` to an absolute path with every symlink followed.
///
/// Unlike [`std::fs::canonicalize`] this never fails: dangling links are
/// followed as far as they go and the remainder is normalized lexically.
#[must_use]
pub fn real_path(path: &Path) -> PathBuf {
    resolve(path, MAX_LINK_DEPTH)
}

fn resolve(path: &Path, depth: usize) -> PathBuf {
    if let Ok(resolved) = dunce::canonicalize(path) {
        return resolved;
    }
    let absolute = absolutize(path);
    if depth > 0
        && let Ok(link) = std::fs::read_link(&absolute)
    {
        let next = absolute.parent().map_or_else(|| link.clone(), |p| p.join(&link));
        return resolve(&next, depth - 1);
    }
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => resolve(parent, depth).join(name),
        _ => absolute,
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        std::env::current_dir().map_or_else(|_| normalize(path), |cwd| normalize(&cwd.join(path)))
    }
}

/// Lexically normalize `path`: drop `.` components and fold `..`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
