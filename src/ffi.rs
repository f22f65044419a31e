//! FFI bindings for Tracelink
//!
//! This module provides C-compatible functions for calling Tracelink from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `tracelink_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::TraceAdapter;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::TraceAnalyzer;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse an optional config JSON pointer; NULL means defaults.
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, String> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    let json = match cstr_to_string(config_json) {
        Some(s) => s,
        None => return Err("Invalid config string pointer".to_string()),
    };
    serde_json::from_str(&json).map_err(|e| format!("Invalid config JSON: {}", e))
}

fn run_analyzer(
    analyzer: &TraceAnalyzer,
    user_json: &str,
    channel_json: &str,
) -> Result<String, AnalysisError> {
    let user = TraceAdapter::parse_document(user_json)?;
    let channel = TraceAdapter::parse_document(channel_json)?;
    analyzer.analyze_to_json(&user, &channel)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Correlate two trace documents and return the match report JSON.
///
/// # Safety
/// - `user_json` and `channel_json` must be valid null-terminated C strings.
/// - `config_json` may be NULL for the default configuration.
/// - Returns a newly allocated string that must be freed with
///   `tracelink_free_string`.
/// - Returns NULL on error; call `tracelink_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn tracelink_correlate(
    user_json: *const c_char,
    channel_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let user_str = match cstr_to_string(user_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid user trace string pointer");
            return ptr::null_mut();
        }
    };

    let channel_str = match cstr_to_string(channel_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid channel trace string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let analyzer = TraceAnalyzer::with_config(config);
    match run_analyzer(&analyzer, &user_str, &channel_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Correlate two trace documents and return only the verdict.
///
/// # Safety
/// - `user_json` and `channel_json` must be valid null-terminated C strings.
/// - `config_json` may be NULL for the default configuration.
/// - Returns 1 (participant), 0 (not a participant), or -1 on error; call
///   `tracelink_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn tracelink_verdict(
    user_json: *const c_char,
    channel_json: *const c_char,
    config_json: *const c_char,
) -> i32 {
    clear_last_error();

    let user_str = match cstr_to_string(user_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid user trace string pointer");
            return -1;
        }
    };

    let channel_str = match cstr_to_string(channel_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid channel trace string pointer");
            return -1;
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(msg) => {
            set_last_error(&msg);
            return -1;
        }
    };

    let parse_and_run = || -> Result<bool, AnalysisError> {
        let user = TraceAdapter::parse_document(&user_str)?;
        let channel = TraceAdapter::parse_document(&channel_str)?;
        let outcome = crate::pipeline::correlate_traces(&user, &channel, &config)?;
        Ok(outcome.verdict)
    };

    match parse_and_run() {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Stateful Analyzer API
// ============================================================================

/// Opaque handle to a TraceAnalyzer
pub struct TraceAnalyzerHandle {
    analyzer: TraceAnalyzer,
}

/// Create a new TraceAnalyzer.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration, otherwise it
///   must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated analyzer that must be freed with
///   `tracelink_analyzer_free`.
/// - Returns NULL on error; call `tracelink_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn tracelink_analyzer_new(
    config_json: *const c_char,
) -> *mut TraceAnalyzerHandle {
    clear_last_error();

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    if let Err(e) = config.validate() {
        set_last_error(&e.to_string());
        return ptr::null_mut();
    }

    let handle = Box::new(TraceAnalyzerHandle {
        analyzer: TraceAnalyzer::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free a TraceAnalyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `tracelink_analyzer_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tracelink_analyzer_free(analyzer: *mut TraceAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Correlate two trace documents with a stateful analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `tracelink_analyzer_new`.
/// - `user_json` and `channel_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with
///   `tracelink_free_string`.
/// - Returns NULL on error; call `tracelink_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn tracelink_analyzer_correlate(
    analyzer: *mut TraceAnalyzerHandle,
    user_json: *const c_char,
    channel_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let handle = &*analyzer;

    let user_str = match cstr_to_string(user_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid user trace string pointer");
            return ptr::null_mut();
        }
    };

    let channel_str = match cstr_to_string(channel_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid channel trace string pointer");
            return ptr::null_mut();
        }
    };

    match run_analyzer(&handle.analyzer, &user_str, &channel_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Tracelink functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Tracelink function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tracelink_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Tracelink function call on
///   this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tracelink_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Tracelink library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tracelink_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_user_trace() -> CString {
        CString::new(r#"[[0.01, 500], [0.02, 400], [0.8, 1500]]"#).unwrap()
    }

    fn sample_channel_trace() -> CString {
        CString::new(r#"[[0.015, 500], [0.8, 1500]]"#).unwrap()
    }

    #[test]
    fn test_ffi_correlate() {
        let user = sample_user_trace();
        let channel = sample_channel_trace();

        unsafe {
            let result =
                tracelink_correlate(user.as_ptr(), channel.as_ptr(), ptr::null());
            assert!(!result.is_null());

            let report = CStr::from_ptr(result).to_str().unwrap();
            assert!(report.contains("report_version"));
            assert!(report.contains("verdict"));

            tracelink_free_string(result);
        }
    }

    #[test]
    fn test_ffi_verdict_values() {
        let user = sample_user_trace();
        let channel = sample_channel_trace();

        unsafe {
            // Default thresholds: scores stay below 0.9
            assert_eq!(
                tracelink_verdict(user.as_ptr(), channel.as_ptr(), ptr::null()),
                0
            );

            // Identical traces always correlate fully
            assert_eq!(
                tracelink_verdict(user.as_ptr(), user.as_ptr(), ptr::null()),
                1
            );

            // Malformed input is an error, not a verdict
            let garbage = CString::new("not json").unwrap();
            assert_eq!(
                tracelink_verdict(garbage.as_ptr(), channel.as_ptr(), ptr::null()),
                -1
            );
            assert!(!tracelink_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_correlate_with_config() {
        let user = sample_user_trace();
        let channel = sample_channel_trace();
        let config = CString::new(r#"{"decision_threshold": 0.4}"#).unwrap();

        unsafe {
            assert_eq!(
                tracelink_verdict(user.as_ptr(), channel.as_ptr(), config.as_ptr()),
                1
            );
        }
    }

    #[test]
    fn test_ffi_analyzer_lifecycle() {
        let user = sample_user_trace();
        let channel = sample_channel_trace();

        unsafe {
            let analyzer = tracelink_analyzer_new(ptr::null());
            assert!(!analyzer.is_null());

            let result =
                tracelink_analyzer_correlate(analyzer, user.as_ptr(), channel.as_ptr());
            assert!(!result.is_null());
            tracelink_free_string(result);

            tracelink_analyzer_free(analyzer);
        }
    }

    #[test]
    fn test_ffi_analyzer_rejects_bad_config() {
        let config = CString::new(r#"{"decision_threshold": 5.0}"#).unwrap();

        unsafe {
            let analyzer = tracelink_analyzer_new(config.as_ptr());
            assert!(analyzer.is_null());

            let error = tracelink_last_error();
            assert!(!error.is_null());
            let message = CStr::from_ptr(error).to_str().unwrap();
            assert!(message.contains("decision_threshold"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let garbage = CString::new("{{{").unwrap();
            let channel = sample_channel_trace();

            let result =
                tracelink_correlate(garbage.as_ptr(), channel.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = tracelink_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = tracelink_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
