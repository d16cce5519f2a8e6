//! Process-wide environment variables that native code must observe.
//!
//! Kerberos libraries linked into the process, and the `kinit` child, read the OS environment
//! table directly. Values set here affect the whole process and every subprocess spawned
//! afterwards.

use std::env;
use std::sync::Mutex;

static ENV_WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Sets `name` through the standard library environment and the C runtime environment.
///
/// Writes through this function are serialized with each other, but not with environment reads
/// elsewhere in the process: call it during initialization, before other threads read the
/// environment. A failure on the native channel is only logged: the process keeps running but
/// native consumers may not see the value.
pub fn set_visible_to_native_processes(name: &str, value: &str) {
    if name.is_empty() || name.contains(['=', '\0']) || value.contains('\0') {
        warn!(name, "Refusing to export a malformed environment variable");
        return;
    }

    let _guard = ENV_WRITE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    env::set_var(name, value);

    match native::set(name, value) {
        Ok(()) => debug!(name, value, "Exported environment variable to native consumers"),
        Err(err) => warn!(name, value, %err, "Native environment propagation failed"),
    }
}

/// Reads `name` the way native consumers do.
pub fn native_var(name: &str) -> Option<String> {
    native::get(name)
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod native {
            use std::ffi::{CStr, CString};
            use std::io;

            pub(super) fn set(name: &str, value: &str) -> io::Result<()> {
                let name = CString::new(name)?;
                let value = CString::new(value)?;

                // SAFETY: both pointers are valid NUL-terminated strings for the duration of the call.
                // `setenv` is not synchronized with readers outside this module (including `std::env`):
                // callers export once, during initialization, before other threads read the environment.
                let status = unsafe { libc::setenv(name.as_ptr(), value.as_ptr(), 1) };

                if status == 0 {
                    Ok(())
                } else {
                    Err(io::Error::last_os_error())
                }
            }

            pub(super) fn get(name: &str) -> Option<String> {
                let name = CString::new(name).ok()?;

                // SAFETY: `name` is a valid NUL-terminated string. The returned pointer is copied out
                // immediately and never freed.
                let value = unsafe { libc::getenv(name.as_ptr()) };

                if value.is_null() {
                    None
                } else {
                    // SAFETY: a non-null `getenv` result points to a NUL-terminated string.
                    Some(unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned())
                }
            }
        }
    } else {
        mod native {
            use std::io;

            pub(super) fn set(_name: &str, _value: &str) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Unsupported, "no native environment channel on this platform"))
            }

            pub(super) fn get(name: &str) -> Option<String> {
                std::env::var(name).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{native_var, set_visible_to_native_processes};

    #[test]
    fn value_is_visible_through_both_channels() {
        set_visible_to_native_processes("KRB5_KEEPER_TEST_NATIVE_ENV", "/tmp/lambda-krb.conf");

        assert_eq!(
            std::env::var("KRB5_KEEPER_TEST_NATIVE_ENV").as_deref(),
            Ok("/tmp/lambda-krb.conf")
        );
        assert_eq!(
            native_var("KRB5_KEEPER_TEST_NATIVE_ENV").as_deref(),
            Some("/tmp/lambda-krb.conf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn subprocess_inherits_value() {
        set_visible_to_native_processes("KRB5_KEEPER_TEST_CHILD_ENV", "inherited");

        let output = std::process::Command::new("sh")
            .args(["-c", "printf %s \"$KRB5_KEEPER_TEST_CHILD_ENV\""])
            .output()
            .unwrap();

        assert_eq!(output.stdout, b"inherited");
    }

    #[test]
    fn malformed_names_are_skipped() {
        set_visible_to_native_processes("KRB5_KEEPER=TEST", "value");
        set_visible_to_native_processes("KRB5_KEEPER_TEST_NUL_ENV", "va\0lue");

        assert_eq!(native_var("KRB5_KEEPER_TEST_NUL_ENV"), None);
        assert_eq!(native_var("NUL\0IN_NAME"), None);
    }
}
