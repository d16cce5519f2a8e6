//! Kept in its own test binary: `KRB5_CONFIG` is process-global.

mod common;

use common::{keytab, Fixture};
use krb5_keeper::native_env::native_var;
use krb5_keeper::KRB5_CONFIG_ENV;

#[tokio::test]
async fn configuration_path_is_exported_to_native_consumers() {
    let fixture = Fixture::new();
    let manager = fixture.manager();

    manager.ensure_initialized(keytab).await.unwrap();

    let expected = fixture.paths.config.display().to_string();

    assert_eq!(std::env::var(KRB5_CONFIG_ENV).unwrap(), expected);
    assert_eq!(native_var(KRB5_CONFIG_ENV).unwrap(), expected);

    #[cfg(unix)]
    {
        let output = std::process::Command::new("sh")
            .args(["-c", "printf %s \"$KRB5_CONFIG\""])
            .output()
            .unwrap();

        assert_eq!(String::from_utf8(output.stdout).unwrap(), expected);
    }
}
