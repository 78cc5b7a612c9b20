use crate::keri::db::errors::DBError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::warn;

/// Filer resolves and maintains the directory a keystore environment
/// lives in.
///
/// Persistent environments root at `<head>/keri/keep/<name>` where the
/// head defaults to `/usr/local/var`, overridable with the KERI_KEEP_DIR
/// environment variable, with `~/.keri/keep/<name>` as fallback when the
/// default head is not writable. Temp environments live in a per-process
/// scratch directory destroyed on drop.
#[derive(Debug)]
pub struct Filer {
    name: String,
    temp: bool,
    path: Option<PathBuf>,
    scratch: Option<TempDir>,
    opened: bool,
}

impl Filer {
    pub const HEAD_DIR_PATH: &'static str = "/usr/local/var";
    pub const TAIL_DIR_PATH: &'static str = "keri/keep";
    pub const ALT_TAIL_DIR_PATH: &'static str = ".keri/keep";
    pub const TEMP_PREFIX: &'static str = "keri_keep_";
    pub const TEMP_SUFFIX: &'static str = "_test";
    pub const HEAD_DIR_VAR: &'static str = "KERI_KEEP_DIR";

    /// Owner rwx plus the restricted deletion (sticky) bit, no group or
    /// world access.
    pub const DIR_MODE: u32 = 0o1700;

    pub fn new(name: &str, temp: bool, head_dir_path: Option<PathBuf>) -> Result<Self, DBError> {
        let mut filer = Filer {
            name: name.to_string(),
            temp,
            path: None,
            scratch: None,
            opened: false,
        };
        filer.reopen(head_dir_path)?;
        Ok(filer)
    }

    /// Remake the directory for this environment and mark it opened.
    pub fn reopen(&mut self, head_dir_path: Option<PathBuf>) -> Result<(), DBError> {
        let path = if self.temp {
            let scratch = tempfile::Builder::new()
                .prefix(Self::TEMP_PREFIX)
                .suffix(Self::TEMP_SUFFIX)
                .tempdir()
                .map_err(|e| DBError::FilerError(format!("{}", e)))?;
            let path = scratch.path().join(Self::TAIL_DIR_PATH).join(&self.name);
            self.scratch = Some(scratch);
            fs::create_dir_all(&path).map_err(|e| DBError::FilerError(format!("{}", e)))?;
            path
        } else {
            let head = head_dir_path
                .or_else(|| std::env::var_os(Self::HEAD_DIR_VAR).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(Self::HEAD_DIR_PATH));
            let primary = head.join(Self::TAIL_DIR_PATH).join(&self.name);

            match fs::create_dir_all(&primary) {
                Ok(()) => primary,
                Err(e) => {
                    // Head not writable, fall back to the home directory
                    warn!(
                        primary = %primary.display(),
                        error = %e,
                        "head directory not usable, falling back to home",
                    );
                    let home = dirs::home_dir().ok_or_else(|| {
                        DBError::FilerError("No home directory for fallback.".to_string())
                    })?;
                    let alt = home.join(Self::ALT_TAIL_DIR_PATH).join(&self.name);
                    fs::create_dir_all(&alt)
                        .map_err(|e| DBError::FilerError(format!("{}", e)))?;
                    alt
                }
            }
        };

        Self::restrict(&path)?;
        self.path = Some(path);
        self.opened = true;
        Ok(())
    }

    #[cfg(unix)]
    fn restrict(path: &PathBuf) -> Result<(), DBError> {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::Permissions::from_mode(Self::DIR_MODE);
        fs::set_permissions(path, perms).map_err(|e| DBError::FilerError(format!("{}", e)))
    }

    #[cfg(not(unix))]
    fn restrict(_path: &PathBuf) -> Result<(), DBError> {
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temp(&self) -> bool {
        self.temp
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn opened(&self) -> bool {
        self.opened
    }

    /// Close the filer. When clear is true the directory is removed;
    /// temp scratch directories are removed regardless when dropped.
    pub fn close(&mut self, clear: bool) -> Result<(), DBError> {
        self.opened = false;

        if clear {
            if let Some(path) = &self.path {
                if let Err(e) = fs::remove_dir_all(path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(DBError::IoError(format!("{}", e)));
                    }
                }
            }
        }

        self.scratch = None;
        Ok(())
    }
}
