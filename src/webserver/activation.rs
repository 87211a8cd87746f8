//! Site activation on disk.
//!
//! Debian: `sites-available/<domain>` is linked from `sites-enabled/`.
//! RHEL: `conf.d/<domain>.conf` is loaded directly; a disabled site is
//! parked as `conf.d/<domain>.conf.disabled`.

use std::fs;
use std::io;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};

use crate::os::{Layout, OsFamily};

/// Outcome of an activation change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Changed,
    /// An existing link pointed at another file and was replaced. Holds the
    /// previous link target as read from disk.
    Relinked(PathBuf),
    Unchanged,
    MissingConfig,
}

/// Path the site's config should be written to, given its current state.
pub fn config_target(layout: &Layout, domain: &str) -> PathBuf {
    match layout.os() {
        OsFamily::Debian => layout.site_config_path(domain),
        OsFamily::RhelLike => {
            let active = layout.site_enabled_path(domain);
            let disabled = layout.site_disabled_path(domain);
            if !active.exists() && disabled.exists() {
                disabled
            } else {
                active
            }
        }
    }
}

pub fn is_enabled(layout: &Layout, domain: &str) -> bool {
    let enabled = layout.site_enabled_path(domain);
    match layout.os() {
        OsFamily::Debian => fs::symlink_metadata(&enabled)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false),
        OsFamily::RhelLike => enabled.is_file(),
    }
}

pub fn enable(layout: &Layout, domain: &str) -> io::Result<Activation> {
    match layout.os() {
        OsFamily::Debian => enable_symlink(layout, domain),
        OsFamily::RhelLike => {
            let active = layout.site_enabled_path(domain);
            let disabled = layout.site_disabled_path(domain);
            if active.exists() {
                Ok(Activation::Unchanged)
            } else if disabled.exists() {
                fs::rename(&disabled, &active)?;
                Ok(Activation::Changed)
            } else {
                Ok(Activation::MissingConfig)
            }
        }
    }
}

/// Whether the link at `link`, whose raw target is `target`, resolves to
/// `file`. Relative targets are taken from the link's directory.
fn link_points_to(link: &Path, target: &Path, file: &Path) -> bool {
    let resolved = match link.parent() {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    };
    if resolved == file {
        return true;
    }
    match (fs::canonicalize(&resolved), fs::canonicalize(file)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn enable_symlink(layout: &Layout, domain: &str) -> io::Result<Activation> {
    let available = layout.site_config_path(domain);
    let enabled = layout.site_enabled_path(domain);

    if !available.exists() {
        return Ok(Activation::MissingConfig);
    }

    let mut previous = None;
    if let Ok(meta) = fs::symlink_metadata(&enabled) {
        if !meta.file_type().is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("A file (not symlink) already exists at {}", enabled.display()),
            ));
        }
        let target = fs::read_link(&enabled)?;
        if link_points_to(&enabled, &target, &available) {
            return Ok(Activation::Unchanged);
        }
        // Points elsewhere; relink.
        fs::remove_file(&enabled)?;
        previous = Some(target);
    }

    fs::create_dir_all(layout.nginx_enabled_dir())?;
    unix_fs::symlink(&available, &enabled)?;
    Ok(match previous {
        Some(target) => Activation::Relinked(target),
        None => Activation::Changed,
    })
}

/// Undo an [`enable`] that returned `outcome`.
pub fn revert(layout: &Layout, domain: &str, outcome: &Activation) -> io::Result<()> {
    match outcome {
        Activation::Changed => disable(layout, domain).map(|_| ()),
        Activation::Relinked(target) => {
            let enabled = layout.site_enabled_path(domain);
            match fs::remove_file(&enabled) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            unix_fs::symlink(target, &enabled)
        }
        Activation::Unchanged | Activation::MissingConfig => Ok(()),
    }
}

pub fn disable(layout: &Layout, domain: &str) -> io::Result<Activation> {
    let enabled = layout.site_enabled_path(domain);
    match layout.os() {
        OsFamily::Debian => {
            let meta = match fs::symlink_metadata(&enabled) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Activation::Unchanged),
                Err(e) => return Err(e),
            };
            if !meta.file_type().is_symlink() {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!(
                        "Path {} is not a symlink. Refusing to delete.",
                        enabled.display()
                    ),
                ));
            }
            fs::remove_file(&enabled)?;
            Ok(Activation::Changed)
        }
        OsFamily::RhelLike => {
            if !enabled.exists() {
                return Ok(Activation::Unchanged);
            }
            fs::rename(&enabled, layout.site_disabled_path(domain))?;
            Ok(Activation::Changed)
        }
    }
}

/// Remove every file belonging to the site. Returns whether anything existed.
pub fn remove_all(layout: &Layout, domain: &str) -> io::Result<bool> {
    let mut removed = false;
    if layout.os() == OsFamily::Debian {
        removed |= disable(layout, domain)? == Activation::Changed;
    }
    for path in [
        layout.site_config_path(domain),
        layout.site_disabled_path(domain),
    ] {
        match fs::remove_file(&path) {
            Ok(()) => removed = true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(os: OsFamily, dir: &tempfile::TempDir) -> Layout {
        Layout::new(os).with_nginx_root(dir.path())
    }

    fn write(path: &PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "server {}\n").unwrap();
    }

    #[test]
    fn test_debian_enable_creates_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        assert_eq!(enable(&layout, "example.com").unwrap(), Activation::MissingConfig);

        write(&layout.site_config_path("example.com"));
        assert_eq!(enable(&layout, "example.com").unwrap(), Activation::Changed);
        assert!(is_enabled(&layout, "example.com"));
        assert_eq!(
            fs::read_link(layout.site_enabled_path("example.com")).unwrap(),
            layout.site_config_path("example.com")
        );
        assert_eq!(enable(&layout, "example.com").unwrap(), Activation::Unchanged);
    }

    #[test]
    fn test_debian_relative_link_counts_as_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_config_path("example.com"));
        fs::create_dir_all(layout.nginx_enabled_dir()).unwrap();
        let enabled = layout.site_enabled_path("example.com");
        unix_fs::symlink("../sites-available/example.com", &enabled).unwrap();

        assert_eq!(enable(&layout, "example.com").unwrap(), Activation::Unchanged);
        assert_eq!(
            fs::read_link(&enabled).unwrap(),
            PathBuf::from("../sites-available/example.com")
        );
    }

    #[test]
    fn test_debian_relink_and_revert() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_config_path("example.com"));
        fs::create_dir_all(layout.nginx_enabled_dir()).unwrap();
        let enabled = layout.site_enabled_path("example.com");
        let stale = dir.path().join("old/example.com");
        unix_fs::symlink(&stale, &enabled).unwrap();

        let outcome = enable(&layout, "example.com").unwrap();
        assert_eq!(outcome, Activation::Relinked(stale.clone()));
        assert_eq!(
            fs::read_link(&enabled).unwrap(),
            layout.site_config_path("example.com")
        );

        revert(&layout, "example.com", &outcome).unwrap();
        assert_eq!(fs::read_link(&enabled).unwrap(), stale);
    }

    #[test]
    fn test_revert_of_new_link_disables() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_config_path("example.com"));
        let outcome = enable(&layout, "example.com").unwrap();
        revert(&layout, "example.com", &outcome).unwrap();
        assert!(!is_enabled(&layout, "example.com"));

        revert(&layout, "example.com", &Activation::Unchanged).unwrap();
        assert!(!is_enabled(&layout, "example.com"));
    }

    #[test]
    fn test_debian_disable_refuses_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_enabled_path("example.com"));
        assert!(disable(&layout, "example.com").is_err());
        assert!(layout.site_enabled_path("example.com").exists());
    }

    #[test]
    fn test_debian_disable_removes_link_only() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_config_path("example.com"));
        enable(&layout, "example.com").unwrap();

        assert_eq!(disable(&layout, "example.com").unwrap(), Activation::Changed);
        assert!(!is_enabled(&layout, "example.com"));
        assert!(layout.site_config_path("example.com").exists());
        assert_eq!(disable(&layout, "example.com").unwrap(), Activation::Unchanged);
    }

    #[test]
    fn test_rhel_disable_and_enable_rename() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::RhelLike, &dir);
        write(&layout.site_config_path("example.com"));
        assert!(is_enabled(&layout, "example.com"));

        assert_eq!(disable(&layout, "example.com").unwrap(), Activation::Changed);
        assert!(!is_enabled(&layout, "example.com"));
        assert!(layout.site_disabled_path("example.com").exists());
        assert_eq!(
            config_target(&layout, "example.com"),
            layout.site_disabled_path("example.com")
        );

        assert_eq!(enable(&layout, "example.com").unwrap(), Activation::Changed);
        assert!(is_enabled(&layout, "example.com"));
        assert!(!layout.site_disabled_path("example.com").exists());
    }

    #[test]
    fn test_remove_all() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(OsFamily::Debian, &dir);
        write(&layout.site_config_path("example.com"));
        enable(&layout, "example.com").unwrap();

        assert!(remove_all(&layout, "example.com").unwrap());
        assert!(!layout.site_config_path("example.com").exists());
        assert!(fs::symlink_metadata(layout.site_enabled_path("example.com")).is_err());
        assert!(!remove_all(&layout, "example.com").unwrap());
    }
}
