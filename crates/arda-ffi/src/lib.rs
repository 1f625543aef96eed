//! C FFI bindings for arda-core
//!
//! This crate provides a C-compatible API so host applications (web backends,
//! desktop tools) can run conversions and validate mapping logic without
//! linking the CLI.

use arda_core::{Conversion, ConverterConfig, DefaultLogic, LogicStore, MappingLogic};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Opaque handle to the outcome of a conversion
pub struct FfiConversion {
    inner: Result<Conversion, String>,
}

unsafe fn opt_str<'a>(s: *const c_char) -> Result<Option<&'a str>, String> {
    if s.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(s)
        .to_str()
        .map(Some)
        .map_err(|e| format!("argument is not valid UTF-8: {e}"))
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

fn run_conversion(
    input: &str,
    logic_source: Option<&str>,
    config_json: Option<&str>,
) -> arda_core::Result<Conversion> {
    let config: ConverterConfig = match config_json {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| arda_core::Error::Config(format!("invalid config: {e}")))?,
        None => ConverterConfig::default(),
    };

    let logic: Box<dyn MappingLogic> = match (logic_source, &config.logic_store) {
        (Some(source), _) => Box::new(arda_core::compile(source)?),
        (None, Some(store)) => Box::new(LogicStore::load(store)?.compile_active()?),
        (None, None) => Box::new(DefaultLogic),
    };

    arda_core::convert_with(input, &config, logic.as_ref())
}

/// Convert a tool library CSV to Arda.cards CSV
///
/// `logic_source` and `config_json` may be null to use the default mapping
/// and default configuration. The returned handle is never null; check it
/// with `arda_conversion_ok`.
///
/// # Safety
/// - `input` must be a valid C string
/// - `logic_source` and `config_json` must be valid C strings or null
/// - Caller must free the handle with `arda_free_conversion`
#[no_mangle]
pub unsafe extern "C" fn arda_convert(
    input: *const c_char,
    logic_source: *const c_char,
    config_json: *const c_char,
) -> *mut FfiConversion {
    let inner = if input.is_null() {
        Err("input is null".to_string())
    } else {
        (|| {
            let input = CStr::from_ptr(input)
                .to_str()
                .map_err(|e| format!("input is not valid UTF-8: {e}"))?;
            let logic = opt_str(logic_source)?;
            let config = opt_str(config_json)?;
            let conversion = run_conversion(input, logic, config).map_err(|e| e.to_string())?;
            if conversion.output.contains('\0') {
                return Err("output contains a NUL byte".to_string());
            }
            Ok(conversion)
        })()
    };

    Box::into_raw(Box::new(FfiConversion { inner }))
}

/// Free a conversion handle
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `arda_convert` or null
#[no_mangle]
pub unsafe extern "C" fn arda_free_conversion(conversion: *mut FfiConversion) {
    if !conversion.is_null() {
        drop(Box::from_raw(conversion));
    }
}

/// Whether the conversion succeeded
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `arda_convert` or null
#[no_mangle]
pub unsafe extern "C" fn arda_conversion_ok(conversion: *const FfiConversion) -> bool {
    !conversion.is_null() && (*conversion).inner.is_ok()
}

/// Get the output CSV of a successful conversion
///
/// Never null when `arda_conversion_ok` is true.
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `arda_convert`
/// - Returns null if the conversion failed
/// - Caller must free the returned string with `arda_free_string`
#[no_mangle]
pub unsafe extern "C" fn arda_conversion_output(conversion: *const FfiConversion) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    match &(*conversion).inner {
        Ok(c) => into_c_string(&c.output),
        Err(_) => ptr::null_mut(),
    }
}

/// Get the error message of a failed conversion
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `arda_convert`
/// - Returns null if the conversion succeeded
/// - Caller must free the returned string with `arda_free_string`
#[no_mangle]
pub unsafe extern "C" fn arda_conversion_error(conversion: *const FfiConversion) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    match &(*conversion).inner {
        Ok(_) => ptr::null_mut(),
        Err(e) => into_c_string(&e.replace('\0', "\\0")),
    }
}

/// Get the number of rows written by a successful conversion
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `arda_convert`
#[no_mangle]
pub unsafe extern "C" fn arda_conversion_row_count(conversion: *const FfiConversion) -> usize {
    if conversion.is_null() {
        return 0;
    }
    (*conversion)
        .inner
        .as_ref()
        .map(|c| c.report.rows_written)
        .unwrap_or(0)
}

/// Check mapping logic for syntax errors
///
/// Returns null if the logic compiles, otherwise the error message.
///
/// # Safety
/// - `source` must be a valid C string
/// - Caller must free a non-null result with `arda_free_string`
#[no_mangle]
pub unsafe extern "C" fn arda_validate_logic(source: *const c_char) -> *mut c_char {
    let source = match opt_str(source) {
        Ok(Some(s)) => s,
        Ok(None) => return into_c_string("logic source is null"),
        Err(e) => return into_c_string(&e),
    };

    match arda_core::validate(source) {
        Ok(()) => ptr::null_mut(),
        Err(e) => into_c_string(&e.to_string()),
    }
}

/// Get the default mapping logic source
///
/// Caller must free the returned string with `arda_free_string`.
#[no_mangle]
pub extern "C" fn arda_default_logic() -> *mut c_char {
    into_c_string(arda_core::DEFAULT_LOGIC_SOURCE)
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by an arda_* function or null
#[no_mangle]
pub unsafe extern "C" fn arda_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
