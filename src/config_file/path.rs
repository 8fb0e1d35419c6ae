//! Tilde expansion for credential/config file paths.

use std::path::{Path, PathBuf};

/// Expand a leading `~` or `~/...` using the OS-appropriate home directory.
/// Paths without a leading `~` pass through unchanged.
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };

    if path_str == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }

    path.to_path_buf()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_leading_tilde_slash() {
        std::env::set_var("HOME", "/home/test");
        assert_eq!(
            expand_tilde("~/.aws/credentials"),
            PathBuf::from("/home/test/.aws/credentials")
        );
    }

    #[test]
    fn leaves_absolute_paths_untouched() {
        std::env::set_var("HOME", "/home/test");
        assert_eq!(
            expand_tilde("/etc/aws/credentials"),
            PathBuf::from("/etc/aws/credentials")
        );
    }
}
