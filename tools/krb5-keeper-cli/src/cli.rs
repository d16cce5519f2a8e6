use std::path::PathBuf;

xflags::xflags! {
    /// Obtains a Kerberos TGT from a keytab kept in a blob store and keeps it renewed.
    /// Identity settings are read from KRB5_KEEPER_* environment variables.
    cmd keeper {
        /// Directory acting as the blob store root: the locator's container is a sub-directory of it.
        optional --source-dir source_dir: PathBuf

        /// Base URL of an HTTP object store. Requires the `http` feature.
        optional --source-url source_url: String

        /// Configuration template file.
        /// If not provided, the package template is used when present, the built-in one otherwise.
        optional --template template: PathBuf

        /// Package directory holding `local/kinit`, `local/klist` and `etc/lambda-krb5.conf`.
        optional --task-dir task_dir: PathBuf

        /// Writable directory for the rendered configuration, the keytab and the ticket cache.
        optional --write-dir write_dir: PathBuf

        /// Obtain the initial ticket and print the manager status.
        cmd init {}

        /// Obtain the initial ticket, then keep renewing it until interrupted.
        cmd watch {
            /// Seconds between renewal checks. Defaults to 60.
            optional --interval interval: u64
        }

        /// Obtain a ticket, then run a program that uses it. The ticket is renewed while the program runs.
        cmd exec {
            /// Renew the ticket before launching even if it is still fresh.
            optional --force-refresh

            /// Program to run.
            required program: PathBuf

            /// Program arguments.
            repeated args: String
        }
    }
}
