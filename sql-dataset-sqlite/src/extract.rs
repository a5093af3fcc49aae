use libsqlite3_sys::{
    SQLITE_BLOB, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_TEXT, sqlite3_column_blob,
    sqlite3_column_bytes, sqlite3_column_double, sqlite3_column_int64, sqlite3_column_name,
    sqlite3_column_text, sqlite3_column_type, sqlite3_stmt,
};
use sql_dataset_core::{Context, Error, Result, Value};
use std::{
    ffi::{CStr, c_int, c_void},
    slice,
};

/// Copies `len` bytes owned by the statement, which invalidates them on the next step.
unsafe fn column_bytes(ptr: *const c_void, len: c_int) -> Vec<u8> {
    if ptr.is_null() || len <= 0 {
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(ptr as *const u8, len as usize) }.to_vec()
}

/// Value of column `index` in the current row, typed after its storage class.
pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<Value> {
    let storage = unsafe { sqlite3_column_type(statement, index) };
    let value = match storage {
        SQLITE_NULL => Value::Null,
        SQLITE_INTEGER => unsafe { sqlite3_column_int64(statement, index) }.into(),
        SQLITE_FLOAT => unsafe { sqlite3_column_double(statement, index) }.into(),
        SQLITE_BLOB => unsafe {
            // Pointer first, then size
            let ptr = sqlite3_column_blob(statement, index);
            column_bytes(ptr, sqlite3_column_bytes(statement, index))
        }
        .into(),
        SQLITE_TEXT => {
            let bytes = unsafe {
                let ptr = sqlite3_column_text(statement, index);
                column_bytes(ptr as *const c_void, sqlite3_column_bytes(statement, index))
            };
            // Text stored in another encoding is kept as raw bytes
            match String::from_utf8(bytes) {
                Ok(text) => text.into(),
                Err(e) => e.into_bytes().into(),
            }
        }
        other => return Err(Error::msg(format!("Unknown sqlite storage class {}", other))),
    };
    Ok(value)
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    let name = unsafe { sqlite3_column_name(statement, index) };
    if name.is_null() {
        return Err(Error::msg(format!("Column {} has no name", index)));
    }
    let name = unsafe { CStr::from_ptr(name) }
        .to_str()
        .with_context(|| format!("The name of column {} is not valid UTF-8", index))?;
    Ok(name.to_string())
}
