//! Write-access probing for trust directories

use std::io;

use crate::NormalizedPath;

/// Predict whether files could later be written at `path`.
///
/// Starting at `path`, each candidate is checked for write access. Access
/// granted means the answer is whether the candidate is an existing
/// directory. Access denied means `false`. A missing candidate moves the probe
/// to its parent; running out of parents means `false`. Any other failure is
/// logged and reported as `false`.
///
/// The answer is a prediction: permissions can change before the write
/// happens.
pub fn is_writable_directory(path: &NormalizedPath) -> bool {
    let mut candidate = path.clone();
    loop {
        match check_write_access(&candidate) {
            Ok(()) => return candidate.is_dir(),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return false,
            Err(e) if e.kind() == io::ErrorKind::NotFound => match candidate.parent() {
                Some(parent) => candidate = parent,
                None => return false,
            },
            Err(e) => {
                tracing::warn!(path = %candidate, "couldn't access: {}", e);
                return false;
            }
        }
    }
}

#[cfg(unix)]
fn check_write_access(path: &NormalizedPath) -> io::Result<()> {
    use std::ffi::CString;

    let c_path = CString::new(path.as_str())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::W_OK) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn check_write_access(path: &NormalizedPath) -> io::Result<()> {
    let metadata = std::fs::metadata(path.to_native())?;
    if metadata.permissions().readonly() {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    } else {
        Ok(())
    }
}
