use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable holding extra template roots, separated like `PATH`.
pub const ENV_TEMPLATE_ROOT: &str = "SCAFFOLD_TEMPLATE_ROOT";

/// Directory holding packs, relative to each install root.
pub const TEMPLATES_DIR: &str = "templates";

/// Returns the template roots in order of preference: every entry of
/// [`ENV_TEMPLATE_ROOT`], then `<exe dir>/../templates`.
pub fn template_roots() -> Vec<PathBuf> {
    let exe = env::current_exe().ok();
    roots_from(env::var_os(ENV_TEMPLATE_ROOT).as_deref(), exe.as_deref())
}

/// Computes the template roots from an explicit environment value and
/// executable path.
pub fn roots_from(env_value: Option<&OsStr>, exe: Option<&Path>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = env_value
        .map(|value| {
            env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    // <exe dir>/.. is the install prefix
    if let Some(prefix) = exe.and_then(Path::parent).and_then(Path::parent) {
        roots.push(prefix.join(TEMPLATES_DIR));
    }

    roots
}
