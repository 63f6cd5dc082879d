//! SQLite VFS adapter
//!
//! Registers a virtual file system named [`VFS_NAME`] that serves read-only,
//! seekable-Zstandard-compressed databases, locally or over HTTP. The
//! adapter rejects journal and WAL files outright, reports content as
//! immutable, and maps the crate's host-neutral error kinds to SQLite
//! result codes at this boundary only.

mod file;

use libsqlite3_sys as ffi;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::OnceLock;

use crate::error::{ErrorKind, Result, ZstdVfsError};

/// Name the VFS is registered under; reference it with `?vfs=zstd` in a
/// connection string.
pub const VFS_NAME: &str = "zstd";

/// NUL-terminated copy of [`VFS_NAME`] handed to SQLite, which keeps the
/// pointer for the life of the process.
static VFS_NAME_C: &[u8] = b"zstd\0";

/// Cached registration outcome: success, or the first failing result code.
static REGISTRATION: OnceLock<std::result::Result<(), i32>> = OnceLock::new();

/// Register the VFS with SQLite.
///
/// Registration happens at most once per process; every caller after the
/// first observes the cached outcome, success or failure alike. There is no
/// unregister: the VFS lives as long as the process.
pub fn register() -> Result<()> {
    let outcome = REGISTRATION.get_or_init(|| {
        let vfs = Box::new(ffi::sqlite3_vfs {
            iVersion: 3,
            szOsFile: std::mem::size_of::<file::VfsFile>() as c_int,
            mxPathname: 1024,
            pNext: ptr::null_mut(),
            zName: VFS_NAME_C.as_ptr() as *const c_char,
            pAppData: ptr::null_mut(),
            xOpen: Some(file::file_open),
            xDelete: Some(vfs_delete),
            xAccess: Some(vfs_access),
            xFullPathname: Some(vfs_full_pathname),
            xDlOpen: None,
            xDlError: None,
            xDlSym: None,
            xDlClose: None,
            xRandomness: Some(vfs_randomness),
            xSleep: Some(vfs_sleep),
            xCurrentTime: Some(vfs_current_time),
            xGetLastError: Some(vfs_get_last_error),
            xCurrentTimeInt64: Some(vfs_current_time_int64),
            xSetSystemCall: None,
            xGetSystemCall: None,
            xNextSystemCall: None,
        });

        let vfs_ptr = Box::into_raw(vfs);
        let rc = unsafe { ffi::sqlite3_vfs_register(vfs_ptr, 0) };
        if rc != ffi::SQLITE_OK {
            unsafe { drop(Box::from_raw(vfs_ptr)) };
            return Err(rc);
        }

        tracing::debug!(name = VFS_NAME, "registered VFS");
        Ok(())
    });

    outcome.map_err(ZstdVfsError::Registration)
}

/// Name to pass in connection strings, valid once [`register`] has
/// succeeded.
pub fn vfs_name() -> &'static str {
    VFS_NAME
}

/// Translate an error into the SQLite result code reported to the host.
///
/// The core never produces SQLite codes itself; this is the only place the
/// host's error vocabulary appears.
fn error_code(err: &ZstdVfsError) -> c_int {
    match err.kind() {
        ErrorKind::CannotOpen => ffi::SQLITE_CANTOPEN,
        ErrorKind::Unsupported => ffi::SQLITE_READONLY,
        ErrorKind::InvalidArgument => ffi::SQLITE_MISUSE,
        ErrorKind::Registration => ffi::SQLITE_ERROR,
    }
}

// Open-handle bookkeeping. The map carries no authority over file content;
// it exists so callers can introspect what the VFS currently serves. The
// lock is held for map operations only, never across I/O.

fn registry() -> &'static Mutex<HashMap<String, usize>> {
    static OPEN_DATABASES: OnceLock<Mutex<HashMap<String, usize>>> = OnceLock::new();
    OPEN_DATABASES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Names of databases currently open through the VFS, sorted.
pub fn open_databases() -> Vec<String> {
    let map = registry().lock();
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

fn track_open(name: &str) {
    *registry().lock().entry(name.to_string()).or_insert(0) += 1;
}

fn untrack_open(name: &str) {
    let mut map = registry().lock();
    if let Some(count) = map.get_mut(name) {
        *count -= 1;
        if *count == 0 {
            map.remove(name);
        }
    }
}

/// Whether `name` is one of SQLite's rollback-journal or WAL companions.
fn is_rollback_artifact(name: &str) -> bool {
    name.ends_with("-wal") || name.ends_with("-journal")
}

// VFS callbacks

unsafe extern "C" fn vfs_delete(
    _vfs: *mut ffi::sqlite3_vfs,
    _z_name: *const c_char,
    _sync_dir: c_int,
) -> c_int {
    // Never touches the underlying resource.
    ffi::SQLITE_IOERR_DELETE
}

unsafe extern "C" fn vfs_access(
    _vfs: *mut ffi::sqlite3_vfs,
    z_name: *const c_char,
    _flags: c_int,
    p_res_out: *mut c_int,
) -> c_int {
    let name = match CStr::from_ptr(z_name).to_str() {
        Ok(name) => name,
        Err(_) => return ffi::SQLITE_ERROR,
    };

    // Journal and WAL probes always report absent, which is what keeps
    // SQLite from depending on auxiliary mutation-tracking files. The main
    // database is assumed present; a missing resource surfaces at open.
    let exists = !is_rollback_artifact(name);
    *p_res_out = exists as c_int;

    ffi::SQLITE_OK
}

unsafe extern "C" fn vfs_full_pathname(
    _vfs: *mut ffi::sqlite3_vfs,
    z_name: *const c_char,
    n_out: c_int,
    z_out: *mut c_char,
) -> c_int {
    // The name is already canonical, whether filesystem path or URL.
    let len = libc::strlen(z_name);
    if len >= n_out as usize {
        return ffi::SQLITE_CANTOPEN;
    }

    libc::strcpy(z_out, z_name);
    ffi::SQLITE_OK
}

unsafe extern "C" fn vfs_randomness(
    _vfs: *mut ffi::sqlite3_vfs,
    n_byte: c_int,
    z_out: *mut c_char,
) -> c_int {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let bytes = z_out as *mut u8;
    for i in 0..n_byte as usize {
        *bytes.add(i) = ((nanos >> ((i % 16) * 8)) & 0xff) as u8;
    }

    n_byte
}

unsafe extern "C" fn vfs_sleep(_vfs: *mut ffi::sqlite3_vfs, microseconds: c_int) -> c_int {
    std::thread::sleep(std::time::Duration::from_micros(microseconds as u64));
    microseconds
}

unsafe extern "C" fn vfs_current_time(_vfs: *mut ffi::sqlite3_vfs, p_time_out: *mut f64) -> c_int {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    // Julian day number: days since noon UTC, November 24, 4714 BC.
    *p_time_out = 2440587.5 + duration.as_secs_f64() / 86400.0;
    ffi::SQLITE_OK
}

unsafe extern "C" fn vfs_current_time_int64(
    _vfs: *mut ffi::sqlite3_vfs,
    p_time_out: *mut ffi::sqlite3_int64,
) -> c_int {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    // Julian day in milliseconds.
    *p_time_out = 210_866_760_000_000i64 + duration.as_millis() as i64;
    ffi::SQLITE_OK
}

unsafe extern "C" fn vfs_get_last_error(
    _vfs: *mut ffi::sqlite3_vfs,
    _n_byte: c_int,
    _z_err_msg: *mut c_char,
) -> c_int {
    0
}
