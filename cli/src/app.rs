//! Application context — unified state passed to every command handler.
//!
//! Built once per invocation from the top-level flags and the loaded
//! configuration. Commands borrow collaborators from it and assemble an
//! [`Orchestrator`] per workflow.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RegistryStore};
use crate::application::services::lifecycle::Orchestrator;
use crate::domain::FleetConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::HostFs;
use crate::infra::host::SystemHost;
use crate::infra::lock::RegistryLock;
use crate::infra::network::SocketProbe;
use crate::infra::privilege;
use crate::infra::registry::FileRegistry;
use crate::output::{HumanRenderer, OutputContext, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `APPFLEET_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub behaviour: BehaviourFlags,
}

/// Production orchestrator over the real host.
pub type HostOrchestrator<'a, R> =
    Orchestrator<'a, FileRegistry, SystemHost<TokioCommandRunner>, SocketProbe, HostFs, R>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Immutable configuration snapshot for this invocation.
    pub config: FleetConfig,
    /// Where `config` was read from (or would be).
    pub config_path: PathBuf,
    pub registry: FileRegistry,
    pub host: SystemHost<TokioCommandRunner>,
    pub probe: SocketProbe,
    pub fs: HostFs,
    /// Invoking account; owns application trees unless overridden.
    pub user: String,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `APPFLEET_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed, or if its location cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let store = YamlConfigStore;
        let config_path = store.path()?;
        let config = store.load()?;
        Ok(Self::with_config(flags, config, config_path))
    }

    /// Construct an `AppContext` around an already loaded configuration.
    #[must_use]
    pub fn with_config(flags: &AppFlags, config: FleetConfig, config_path: PathBuf) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("APPFLEET_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON documents own stdout; progress chatter would corrupt them.
        let quiet = flags.output.quiet || flags.output.json;

        let runner = TokioCommandRunner::new(config.timeouts.command());
        let host = SystemHost::new(runner, &config.host, &config.timeouts);
        let registry = FileRegistry::new(
            config.registry_dir.clone(),
            config.application_defaults(),
            &config.default_application,
        );

        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            registry,
            host,
            probe: SocketProbe,
            fs: HostFs,
            user: privilege::current_user(),
            non_interactive,
            config,
            config_path,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Assemble the orchestrator for one workflow.
    #[must_use]
    pub fn orchestrator<'a, R: ProgressReporter>(&'a self, reporter: &'a R) -> HostOrchestrator<'a, R> {
        Orchestrator {
            config: &self.config,
            registry: &self.registry,
            host: &self.host,
            probe: &self.probe,
            fs: &self.fs,
            reporter,
            user: &self.user,
        }
    }

    /// Take the registry's single-writer lock for a mutating command.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::RegistryLocked` if another process holds it.
    pub fn lock(&self) -> Result<RegistryLock> {
        RegistryLock::acquire(self.registry.root())
    }

    /// Explicit application name, or the current selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn target(&self, name: Option<&str>) -> Result<String> {
        match name {
            Some(name) => Ok(name.to_string()),
            None => Ok(self.registry.load_index()?.current),
        }
    }

    /// Whether prompts can be shown.
    #[must_use]
    pub fn can_prompt(&self) -> bool {
        !self.non_interactive && self.output.is_tty
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `APPFLEET_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
