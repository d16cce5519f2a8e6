use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use keytab_source::{CredentialSource, Locator};
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;

use crate::template::{self, Bindings, TemplateSource};
use crate::{
    native_env, Clock, CommandRunner, CommandSpec, Error, ExecutionContext, KeeperPaths, ProcessRunner, Result,
    Secret, SystemClock, TicketAcquirer, TicketOptions, KRB5_CONFIG_ENV,
};

/// What a [TicketLifecycleManager::refresh] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The manager is disabled in this execution context.
    Disabled,
    /// The ticket is younger than the configured lifetime.
    Fresh,
    /// A new ticket was acquired.
    Renewed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerStatus {
    pub enabled: bool,
    pub initialized: bool,
    pub last_acquisition_at: Option<OffsetDateTime>,
    pub ticket_age: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
struct Acquisition {
    at: Instant,
    wall: OffsetDateTime,
}

/// Obtains a TGT once per process and keeps it renewed.
///
/// All operations are no-ops when the manager is disabled, i.e. outside of a Linux function
/// runtime. Initialization is single-flight: concurrent callers wait for the one in progress,
/// and a failed attempt leaves the manager uninitialized so that a later call retries.
pub struct TicketLifecycleManager {
    options: TicketOptions,
    paths: KeeperPaths,
    template: TemplateSource,
    enabled: bool,
    acquirer: TicketAcquirer,
    clock: Arc<dyn Clock>,
    initialized: AtomicBool,
    last_acquisition: Mutex<Option<Acquisition>>,
    // Serializes initialization and renewal. Holds the cached acquisition command.
    flight: tokio::sync::Mutex<Option<CommandSpec>>,
}

impl TicketLifecycleManager {
    /// Creates a manager for the detected execution context with the default file layout.
    pub fn new(options: TicketOptions) -> Self {
        Self::builder(options).build()
    }

    pub fn builder(options: TicketOptions) -> ManagerBuilder {
        ManagerBuilder::new(options)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn options(&self) -> &TicketOptions {
        &self.options
    }

    pub fn paths(&self) -> &KeeperPaths {
        &self.paths
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Monotonic time of the last successful acquisition.
    pub fn last_acquisition(&self) -> Option<Instant> {
        self.acquisition().map(|acquisition| acquisition.at)
    }

    pub fn status(&self) -> ManagerStatus {
        let acquisition = self.acquisition();

        ManagerStatus {
            enabled: self.enabled,
            initialized: self.is_initialized(),
            last_acquisition_at: acquisition.map(|acquisition| acquisition.wall),
            ticket_age: acquisition.map(|acquisition| self.clock.now().saturating_duration_since(acquisition.at)),
        }
    }

    /// Initializes the manager unless it already is.
    ///
    /// `keytab` is only invoked by the caller that actually performs the initialization, so
    /// the credential source is contacted at most once per successful initialization.
    #[instrument(level = "debug", skip_all, fields(principal = %self.options.principal))]
    pub async fn ensure_initialized<F, Fut>(&self, keytab: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if !self.enabled || self.is_initialized() {
            return Ok(());
        }

        debug!("Waiting for the lock to initialize Kerberos");
        let mut command = self.flight.lock().await;

        if self.is_initialized() {
            debug!("Kerberos already initialized by another task, skipping");
            return Ok(());
        }

        let keytab = Secret::new(keytab().await?);

        self.init_locked(&mut command, keytab).await
    }

    /// [TicketLifecycleManager::ensure_initialized] with the keytab fetched from `source`.
    ///
    /// `locator` must be in `<container>/<key>` form; it is validated before anything is fetched.
    pub async fn ensure_initialized_from<S>(&self, source: &S, locator: &str) -> Result<()>
    where
        S: CredentialSource,
    {
        if !self.enabled {
            return Ok(());
        }

        let locator: Locator = locator.parse()?;

        self.ensure_initialized(|| async {
            info!(container = locator.container(), key = locator.key(), "Retrieving Kerberos keytab");

            Ok::<_, Error>(source.fetch(&locator).await?)
        })
        .await
    }

    /// Runs the full initialization sequence unconditionally.
    ///
    /// Meant for callers that initialize once before serving any work. Concurrent callers
    /// should use [TicketLifecycleManager::ensure_initialized] instead.
    pub async fn init(&self, keytab: Secret<Vec<u8>>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut command = self.flight.lock().await;

        self.init_locked(&mut command, keytab).await
    }

    #[instrument(level = "debug", skip_all, err)]
    async fn init_locked(&self, command: &mut Option<CommandSpec>, keytab: Secret<Vec<u8>>) -> Result<()> {
        self.options.validate()?;

        if keytab.is_empty() {
            return Err(Error::EmptyKeytab);
        }

        info!("Persisting KRB5 configuration");
        self.write_config().await?;

        // Exported for our own native libraries as well as any spawned children.
        native_env::set_visible_to_native_processes(KRB5_CONFIG_ENV, &self.paths.config.display().to_string());

        info!("Persisting KRB5 keytab");
        self.write_keytab(keytab).await?;

        let kinit = command
            .insert(CommandSpec::kinit(&self.paths.kinit, &self.options.principal))
            .clone();

        info!(principal = %self.options.principal, "Initializing Kerberos TGT");
        self.acquire(kinit).await?;

        self.initialized.store(true, Ordering::Release);

        Ok(())
    }

    /// Renews the ticket if it is older than the configured lifetime, or unconditionally with `force`.
    ///
    /// Renewal failures are returned as-is and not retried: a stale ticket must not be used silently.
    #[instrument(level = "debug", skip(self))]
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        if !self.enabled {
            return Ok(RefreshOutcome::Disabled);
        }

        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        if !force && !self.renewal_due() {
            return Ok(RefreshOutcome::Fresh);
        }

        let command = self.flight.lock().await;

        if !force && !self.renewal_due() {
            debug!("Kerberos TGT already renewed by another task");
            return Ok(RefreshOutcome::Fresh);
        }

        let kinit = command.as_ref().cloned().ok_or(Error::NotInitialized)?;

        info!(age = ?self.status().ticket_age, force, "Kerberos TGT age has expired, regenerating");
        self.acquire(kinit).await?;

        Ok(RefreshOutcome::Renewed)
    }

    /// Asks the cache inspector whether the ticket cache holds a valid ticket.
    ///
    /// Returns `None` when the manager is disabled.
    pub async fn check_ticket_cache(&self) -> Result<Option<bool>> {
        if !self.enabled {
            return Ok(None);
        }

        let output = self
            .acquirer
            .run_on_worker(CommandSpec::klist_check(&self.paths.klist, &self.paths.ccache))
            .await?;

        if !output.success() {
            debug!(exit_code = ?output.exit_code, stderr = %output.stderr.trim(), "No valid ticket in cache");
        }

        Ok(Some(output.success()))
    }

    async fn acquire(&self, kinit: CommandSpec) -> Result<()> {
        if let Err(err) = self.acquirer.acquire_on_worker(kinit).await {
            error!(%err, "Kerberos TGT acquisition failed");
            return Err(err);
        }

        let acquisition = Acquisition {
            at: self.clock.now(),
            wall: OffsetDateTime::now_utc(),
        };
        *self.last_acquisition.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(acquisition);

        info!(completed_at = %acquisition.wall, "Kerberos TGT acquired");

        Ok(())
    }

    fn acquisition(&self) -> Option<Acquisition> {
        *self.last_acquisition.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn renewal_due(&self) -> bool {
        match self.acquisition() {
            Some(acquisition) => {
                self.clock.now().saturating_duration_since(acquisition.at) >= self.options.ticket_lifetime
            }
            None => true,
        }
    }

    async fn write_config(&self) -> Result<()> {
        let template = self.template.load().await?;

        let bindings = Bindings::new(&self.options, &self.paths);
        let rendered = template::render(&template, |placeholder| bindings.resolve(placeholder));

        let residual = template::unresolved_markers(&rendered);
        if !residual.is_empty() {
            warn!(?residual, "Rendered KRB5 configuration still contains placeholders");
        }

        tokio::fs::write(&self.paths.config, rendered).await?;
        debug!(path = %self.paths.config.display(), "Wrote out KRB5 configuration");

        Ok(())
    }

    async fn write_keytab(&self, keytab: Secret<Vec<u8>>) -> Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.paths.keytab).await?;
        file.write_all(keytab.as_ref()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl std::fmt::Debug for TicketLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketLifecycleManager")
            .field("options", &self.options)
            .field("paths", &self.paths)
            .field("enabled", &self.enabled)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Configures a [TicketLifecycleManager]; every setting has a production default.
pub struct ManagerBuilder {
    options: TicketOptions,
    paths: KeeperPaths,
    template: Option<TemplateSource>,
    context: Option<ExecutionContext>,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
}

impl ManagerBuilder {
    fn new(options: TicketOptions) -> Self {
        Self {
            options,
            paths: KeeperPaths::default(),
            template: None,
            context: None,
            runner: Arc::new(ProcessRunner),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn paths(mut self, paths: KeeperPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Defaults to the template file named by [KeeperPaths::config_template].
    pub fn template(mut self, template: TemplateSource) -> Self {
        self.template = Some(template);
        self
    }

    /// Defaults to [ExecutionContext::detect].
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> TicketLifecycleManager {
        let context = self.context.unwrap_or_else(ExecutionContext::detect);
        let enabled = context.is_target();

        info!(
            enabled,
            is_linux = context.is_linux,
            function_name = context.function_name.as_deref().unwrap_or_default(),
            "Kerberos manager is {}",
            if enabled { "ENABLED" } else { "DISABLED" }
        );

        let template = self
            .template
            .unwrap_or_else(|| TemplateSource::File(self.paths.config_template.clone()));

        TicketLifecycleManager {
            options: self.options,
            paths: self.paths,
            template,
            enabled,
            acquirer: TicketAcquirer::new(self.runner),
            clock: self.clock,
            initialized: AtomicBool::new(false),
            last_acquisition: Mutex::new(None),
            flight: tokio::sync::Mutex::new(None),
        }
    }
}
