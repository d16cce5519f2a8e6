#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use krb5_keeper::{
    Clock, CommandOutput, CommandRunner, CommandSpec, ExecutionContext, KeeperPaths, ProcessError,
    TemplateSource, TicketLifecycleManager, TicketOptions,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const PRINCIPAL: &str = "sample_user@EXAMPLE.COM";
pub const KEYTAB: &[u8] = b"\x05\x02\x00\x00\x00\x3bkeytab-entry";
pub const TEMPLATE: &str = "[libdefaults]\n\tdefault_realm = @@REALM-UCASE@@\n\tdefault_ccache_name = FILE:@@DEFAULT-CCACHE@@\n";

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

/// Stands in for `kinit` and `klist`.
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call blocks its worker for `delay`, widening race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// The next `count` calls exit with code 1.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kinit_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.program.ends_with("kinit"))
            .count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        self.calls.lock().unwrap().push(command.clone());

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        Ok(CommandOutput {
            exit_code: Some(if failed { 1 } else { 0 }),
            stdout: String::new(),
            stderr: if failed {
                "kinit: Cannot contact any KDC for realm 'EXAMPLE.COM'\n".to_owned()
            } else {
                String::new()
            },
        })
    }
}

pub struct Fixture {
    pub root: PathBuf,
    pub paths: KeeperPaths,
    pub runner: Arc<FakeRunner>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_runner(FakeRunner::new())
    }

    pub fn with_runner(runner: FakeRunner) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let root = std::env::temp_dir().join(format!("krb5-keeper-{}", Uuid::new_v4()));
        let paths = KeeperPaths::under(root.join("task"), root.join("tmp"));

        std::fs::create_dir_all(root.join("task/etc")).unwrap();
        std::fs::create_dir_all(root.join("tmp")).unwrap();
        std::fs::write(&paths.config_template, TEMPLATE).unwrap();

        Self {
            root,
            paths,
            runner: Arc::new(runner),
            clock: Arc::new(ManualClock::new()),
        }
    }

    pub fn options(&self) -> TicketOptions {
        TicketOptions::new("example.com", PRINCIPAL).with_realm_kdc("dc1.example.com")
    }

    pub fn manager(&self) -> TicketLifecycleManager {
        self.manager_with(self.options(), lambda_context())
    }

    pub fn manager_with(&self, options: TicketOptions, context: ExecutionContext) -> TicketLifecycleManager {
        TicketLifecycleManager::builder(options)
            .paths(self.paths.clone())
            .template(TemplateSource::File(self.paths.config_template.clone()))
            .context(context)
            .runner(self.runner.clone())
            .clock(self.clock.clone())
            .build()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn lambda_context() -> ExecutionContext {
    ExecutionContext {
        is_linux: true,
        function_name: Some("sample1".to_owned()),
    }
}

pub async fn keytab() -> krb5_keeper::Result<Vec<u8>> {
    Ok(KEYTAB.to_vec())
}

pub async fn unexpected_keytab_fetch() -> krb5_keeper::Result<Vec<u8>> {
    panic!("the keytab must not be fetched")
}
