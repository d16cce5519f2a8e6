use std::path::{Path, PathBuf};

/// Read-only directory the function package is deployed to.
pub const LAMBDA_TASK_DIR: &str = "/var/task";
/// The only writable directory of the execution sandbox.
pub const LAMBDA_WRITE_DIR: &str = "/tmp";

/// Environment variable the Kerberos libraries and `kinit` read the configuration path from.
pub const KRB5_CONFIG_ENV: &str = "KRB5_CONFIG";

/// Fixed, well-known locations of everything the manager reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperPaths {
    /// Ticket acquisition program.
    pub kinit: PathBuf,
    /// Ticket cache inspection program.
    pub klist: PathBuf,
    /// Configuration template shipped with the function package.
    pub config_template: PathBuf,
    /// Rendered configuration, exported through [KRB5_CONFIG_ENV].
    pub config: PathBuf,
    pub keytab: PathBuf,
    pub ccache: PathBuf,
}

impl KeeperPaths {
    /// Lays out the well-known files under the given package and writable directories.
    pub fn under(task_dir: impl AsRef<Path>, write_dir: impl AsRef<Path>) -> Self {
        let task_dir = task_dir.as_ref();
        let write_dir = write_dir.as_ref();

        Self {
            kinit: task_dir.join("local/kinit"),
            klist: task_dir.join("local/klist"),
            config_template: task_dir.join("etc/lambda-krb5.conf"),
            config: write_dir.join("lambda-krb.conf"),
            keytab: write_dir.join("lambda.keytab"),
            ccache: write_dir.join("lambda.ccache"),
        }
    }
}

impl Default for KeeperPaths {
    fn default() -> Self {
        Self::under(LAMBDA_TASK_DIR, LAMBDA_WRITE_DIR)
    }
}
