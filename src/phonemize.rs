//! Grapheme → IPA conversion through the `libespeak-ng` C library.
//!
//! espeak-ng keeps global state and is not thread-safe, so every call goes
//! through one process-wide lock.  The lock also remembers which espeak voice
//! is selected so that switching language only costs a call when the language
//! actually changes.
//!
//! Linking is handled by `build.rs` when the `espeak` feature is enabled.
//! `ESPEAK_DATA_PATH` (or [`set_data_path`]) points the library at a
//! non-default `espeak-ng-data/` directory.

use std::{
    ffi::{CStr, CString},
    os::raw::{c_char, c_int, c_void},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;

extern "C" {
    fn espeak_ng_InitializePath(path: *const c_char);
    fn espeak_ng_Initialize(context: *mut c_void) -> c_int;
    fn espeak_ng_SetVoiceByName(name: *const c_char) -> c_int;
    fn espeak_TextToPhonemes(
        textptr: *mut *const c_void,
        textmode: c_int,
        phonememode: c_int,
    ) -> *const c_char;
}

/// `textmode`: UTF-8 input.
const CHARS_UTF8: c_int = 1;
/// `phonememode`: IPA output.
const PHONEMES_IPA: c_int = 0x02;

/// Currently selected espeak voice; `None` until the first call.
static VOICE: Mutex<Option<String>> = Mutex::new(None);

static INIT: OnceCell<std::result::Result<(), String>> = OnceCell::new();

static DATA_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` as the `espeak-ng-data` directory.  No effect after the first
/// [`phonemize`] call.
pub fn set_data_path(path: &Path) {
    let _ = DATA_PATH.set(path.to_path_buf());
}

fn init() -> std::result::Result<(), String> {
    let data_path = DATA_PATH
        .get()
        .cloned()
        .or_else(|| std::env::var_os("ESPEAK_DATA_PATH").map(PathBuf::from));
    let path_c = data_path
        .map(|p| CString::new(p.to_string_lossy().as_bytes()))
        .transpose()
        .map_err(|_| "espeak data path contains a null byte".to_string())?;

    // SAFETY: called once, under the VOICE lock; the path outlives the call.
    unsafe {
        espeak_ng_InitializePath(path_c.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()));
        let status = espeak_ng_Initialize(std::ptr::null_mut());
        if status != 0 {
            return Err(format!("espeak_ng_Initialize failed (status {status:#010x})"));
        }
    }
    Ok(())
}

/// `true` if the library initialises.
pub fn is_espeak_available() -> bool {
    let _guard = VOICE.lock().unwrap_or_else(|p| p.into_inner());
    INIT.get_or_init(init).is_ok()
}

/// Convert `text` to IPA with the espeak voice `lang` (e.g. `en-us`, `fr-fr`,
/// `cmn`).  Clauses are joined with single spaces.
pub fn phonemize(text: &str, lang: &str) -> Result<String> {
    let mut voice = VOICE.lock().unwrap_or_else(|p| p.into_inner());
    INIT.get_or_init(init).as_ref().map_err(|e| anyhow!("espeak-ng: {e}"))?;

    if voice.as_deref() != Some(lang) {
        let name = CString::new(lang).map_err(|_| anyhow!("language contains a null byte"))?;
        // SAFETY: library initialised above; serialised by the lock.
        let rc = unsafe { espeak_ng_SetVoiceByName(name.as_ptr()) };
        if rc != 0 {
            *voice = None;
            return Err(anyhow!("espeak-ng has no voice for '{lang}' (rc {rc})"));
        }
        *voice = Some(lang.to_string());
    }

    let text_c = CString::new(text).map_err(|_| anyhow!("text contains a null byte"))?;
    let mut cursor: *const c_void = text_c.as_ptr() as *const c_void;
    let mut clauses = Vec::new();

    // SAFETY: `cursor` walks `text_c`, which outlives the loop; each returned
    // buffer is copied before the next call overwrites it.
    unsafe {
        while !cursor.is_null() {
            let ptr = espeak_TextToPhonemes(&mut cursor, CHARS_UTF8, PHONEMES_IPA);
            if ptr.is_null() {
                continue;
            }
            let clause = CStr::from_ptr(ptr)
                .to_str()
                .map_err(|_| anyhow!("espeak-ng returned non-UTF-8 phonemes"))?
                .trim();
            if !clause.is_empty() {
                clauses.push(clause.to_owned());
            }
        }
    }
    Ok(clauses.join(" "))
}
