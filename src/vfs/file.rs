//! SQLite file I/O methods for compressed databases
//!
//! Implements `sqlite3_io_methods` over a [`ZstdFile`]. Every mutating or
//! lock-related entry point either no-ops (no writer can ever exist) or
//! answers with a read-only error; reading is the only data-bearing path.

use libsqlite3_sys as ffi;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::slice;

use crate::file::ZstdFile;

/// SQLite-facing file object.
///
/// SQLite allocates `szOsFile` bytes and passes them to `xOpen`; the base
/// struct must stay the first field so the pointer can be reinterpreted.
#[repr(C)]
pub(super) struct VfsFile {
    base: ffi::sqlite3_file,
    state: *mut FileState,
}

/// Heap-owned state behind one open file.
struct FileState {
    name: String,
    db: ZstdFile,
}

unsafe fn file_state<'a>(file: *mut ffi::sqlite3_file) -> &'a FileState {
    &*(*(file as *mut VfsFile)).state
}

// io method implementations

unsafe extern "C" fn file_close(file: *mut ffi::sqlite3_file) -> c_int {
    let vfs_file = &mut *(file as *mut VfsFile);

    // Cleanup is unconditional: nothing here can fail, and a handle is
    // never left half-closed.
    if !vfs_file.state.is_null() {
        let state = Box::from_raw(vfs_file.state);
        super::untrack_open(&state.name);
        tracing::debug!(name = %state.name, "closed compressed database");
        vfs_file.state = ptr::null_mut();
    }
    vfs_file.base.pMethods = ptr::null();

    ffi::SQLITE_OK
}

unsafe extern "C" fn file_read(
    file: *mut ffi::sqlite3_file,
    buf: *mut c_void,
    amt: c_int,
    offset: ffi::sqlite3_int64,
) -> c_int {
    if offset < 0 || amt < 0 {
        return ffi::SQLITE_IOERR_READ;
    }

    let state = file_state(file);
    let out = slice::from_raw_parts_mut(buf as *mut u8, amt as usize);

    match state.db.read_at(out, offset as u64) {
        Ok(n) if n == out.len() => ffi::SQLITE_OK,
        Ok(n) => {
            // SQLite's short-read contract: zero-fill the untouched tail.
            out[n..].fill(0);
            ffi::SQLITE_IOERR_SHORT_READ
        }
        Err(_) => ffi::SQLITE_IOERR_READ,
    }
}

unsafe extern "C" fn file_write(
    _file: *mut ffi::sqlite3_file,
    _buf: *const c_void,
    _amt: c_int,
    _offset: ffi::sqlite3_int64,
) -> c_int {
    // Compressed databases are immutable; nothing is ever written.
    ffi::SQLITE_IOERR_WRITE
}

unsafe extern "C" fn file_truncate(
    _file: *mut ffi::sqlite3_file,
    _size: ffi::sqlite3_int64,
) -> c_int {
    ffi::SQLITE_IOERR_TRUNCATE
}

unsafe extern "C" fn file_sync(_file: *mut ffi::sqlite3_file, _flags: c_int) -> c_int {
    // Nothing is ever buffered for write.
    ffi::SQLITE_OK
}

unsafe extern "C" fn file_file_size(
    file: *mut ffi::sqlite3_file,
    p_size: *mut ffi::sqlite3_int64,
) -> c_int {
    let state = file_state(file);
    *p_size = state.db.len() as ffi::sqlite3_int64;
    ffi::SQLITE_OK
}

unsafe extern "C" fn file_lock(_file: *mut ffi::sqlite3_file, _lock: c_int) -> c_int {
    // Locks are granted without any mechanism; no writer ever exists.
    ffi::SQLITE_OK
}

unsafe extern "C" fn file_unlock(_file: *mut ffi::sqlite3_file, _lock: c_int) -> c_int {
    ffi::SQLITE_OK
}

unsafe extern "C" fn file_check_reserved_lock(
    _file: *mut ffi::sqlite3_file,
    p_res_out: *mut c_int,
) -> c_int {
    *p_res_out = 0;
    ffi::SQLITE_OK
}

unsafe extern "C" fn file_control(
    _file: *mut ffi::sqlite3_file,
    _op: c_int,
    _p_arg: *mut c_void,
) -> c_int {
    ffi::SQLITE_NOTFOUND
}

unsafe extern "C" fn file_sector_size(_file: *mut ffi::sqlite3_file) -> c_int {
    // 0 tells SQLite to use its default sector size.
    0
}

unsafe extern "C" fn file_device_characteristics(_file: *mut ffi::sqlite3_file) -> c_int {
    // The file never changes once opened; SQLite can skip change detection
    // and locking overhead.
    ffi::SQLITE_IOCAP_IMMUTABLE
}

static IO_METHODS: ffi::sqlite3_io_methods = ffi::sqlite3_io_methods {
    iVersion: 1,
    xClose: Some(file_close),
    xRead: Some(file_read),
    xWrite: Some(file_write),
    xTruncate: Some(file_truncate),
    xSync: Some(file_sync),
    xFileSize: Some(file_file_size),
    xLock: Some(file_lock),
    xUnlock: Some(file_unlock),
    xCheckReservedLock: Some(file_check_reserved_lock),
    xFileControl: Some(file_control),
    xSectorSize: Some(file_sector_size),
    xDeviceCharacteristics: Some(file_device_characteristics),
    xShmMap: None,
    xShmLock: None,
    xShmBarrier: None,
    xShmUnmap: None,
    xFetch: None,
    xUnfetch: None,
};

// xOpen callback

pub(super) unsafe extern "C" fn file_open(
    _vfs: *mut ffi::sqlite3_vfs,
    z_name: *const c_char,
    file: *mut ffi::sqlite3_file,
    flags: c_int,
    p_out_flags: *mut c_int,
) -> c_int {
    let vfs_file = &mut *(file as *mut VfsFile);
    vfs_file.base.pMethods = ptr::null();
    vfs_file.state = ptr::null_mut();

    // SQLite passes a NULL name when it wants a temporary file. A read-only
    // VFS cannot host those; connections are expected to set
    // temp_store=memory instead.
    if z_name.is_null() {
        return ffi::SQLITE_CANTOPEN;
    }

    let name = match CStr::from_ptr(z_name).to_str() {
        Ok(name) => name,
        Err(_) => return ffi::SQLITE_CANTOPEN,
    };

    let db = match ZstdFile::open(name) {
        Ok(db) => db,
        Err(err) => {
            tracing::warn!(name, error = %err, "failed to open compressed database");
            return super::error_code(&err);
        }
    };

    super::track_open(name);
    vfs_file.state = Box::into_raw(Box::new(FileState {
        name: name.to_string(),
        db,
    }));
    vfs_file.base.pMethods = &IO_METHODS;

    // The handle is read-only no matter what the caller asked for.
    if !p_out_flags.is_null() {
        *p_out_flags = flags | ffi::SQLITE_OPEN_READONLY;
    }

    ffi::SQLITE_OK
}
