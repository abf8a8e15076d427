//! Clap derive structures for the `inboxguard` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Compiled by build.rs as well, so this file depends on clap only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// inboxguard -- email-authentication compliance and DNS autofix
#[derive(Debug, Parser)]
#[command(
    name = "inboxguard",
    version,
    about = "Check SPF/DMARC/DKIM compliance, fix DNS, and gate bulk sends",
    long_about = "Audits a sending domain's email-authentication DNS records, plans and\n\
        applies the minimal changes to make them compliant, lints RFC 8058\n\
        unsubscribe headers, and decides whether a bulk send may go out.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "INBOXGUARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file path (overrides the platform default)
    #[arg(long, env = "INBOXGUARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// DNS provider API root (overrides profile)
    #[arg(long, env = "INBOXGUARD_PROVIDER_URL", global = true)]
    pub provider_url: Option<String>,

    /// Metrics service root (overrides profile)
    #[arg(long, env = "INBOXGUARD_METRICS_URL", global = true)]
    pub metrics_url: Option<String>,

    /// DNS provider API token
    #[arg(long, env = "INBOXGUARD_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Metrics service API key
    #[arg(long, env = "INBOXGUARD_METRICS_TOKEN", global = true, hide_env_values = true)]
    pub metrics_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "INBOXGUARD_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates (test endpoints only)
    #[arg(long, short = 'k', env = "INBOXGUARD_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "INBOXGUARD_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Retries after a transient failure
    #[arg(long, env = "INBOXGUARD_RETRIES", global = true)]
    pub retries: Option<u32>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Where `check` and `watch` read DNS data from.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SourceArg {
    /// Records configured at the DNS provider
    #[default]
    Provider,
    /// Live DNS resolution
    Live,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// SPF, DMARC and DKIM compliance report for a domain
    #[command(alias = "c")]
    Check(CheckArgs),

    /// Plan (and optionally apply) the DNS changes that make a domain compliant
    #[command(alias = "fix")]
    Autofix(AutofixArgs),

    /// Inspect and publish DKIM selector CNAMEs
    Dkim(DkimArgs),

    /// Decide whether a bulk send may go out
    Presend(PresendArgs),

    /// Spam-rate and reputation alerts from the metrics window
    Alerts(AlertsArgs),

    /// Spam-rate and reputation metrics
    #[command(alias = "m")]
    Metrics(MetricsArgs),

    /// Periodically refresh a domain's status until interrupted
    Watch(WatchArgs),

    /// Analyze an SPF record (offline, or live with --domain)
    Spf(SpfArgs),

    /// Validate a DMARC record (offline, or live with --domain)
    Dmarc(DmarcArgs),

    /// Lint RFC 8058 one-click unsubscribe headers
    Headers(HeadersArgs),

    /// Show or change the selected domain
    Domain(DomainArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLIANCE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Zone apex (defaults to the selected domain or the profile's zone_root)
    pub domain: Option<String>,

    /// Host to check SPF/DMARC at, inside the zone
    #[arg(long)]
    pub fqdn: Option<String>,

    /// Where to read DNS data from
    #[arg(long, value_enum, default_value = "provider")]
    pub source: SourceArg,
}

#[derive(Debug, Args)]
pub struct AutofixArgs {
    /// Zone apex (defaults to the selected domain or the profile's zone_root)
    pub domain: Option<String>,

    /// Apply the plan instead of previewing it
    #[arg(long)]
    pub apply: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DKIM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DkimArgs {
    #[command(subcommand)]
    pub command: DkimCommand,
}

#[derive(Debug, Subcommand)]
pub enum DkimCommand {
    /// Show what each configured selector resolves to
    Status {
        /// Zone apex
        domain: Option<String>,

        /// Where to read DNS data from
        #[arg(long, value_enum, default_value = "provider")]
        source: SourceArg,
    },

    /// Publish selector CNAMEs (preview unless --apply)
    Apply {
        /// Zone apex
        domain: Option<String>,

        /// Selector as HOST=TARGET (repeatable); defaults to the profile's selectors
        #[arg(long = "selector", short = 's', value_name = "HOST=TARGET")]
        selectors: Vec<String>,

        /// TTL for the CNAMEs
        #[arg(long)]
        ttl: Option<u32>,

        /// Apply instead of previewing
        #[arg(long)]
        apply: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PRESEND
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PresendArgs {
    /// Sending domain (a zone apex at the provider)
    pub domain: Option<String>,

    /// Raw header block of the message to send ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    pub headers: Option<PathBuf>,

    /// Request an override of a blocking decision
    #[arg(long = "override")]
    pub allow_override: bool,

    /// Checklist item to acknowledge (repeatable, needs --override); prompts when omitted
    #[arg(long = "ack", value_name = "ITEM", requires = "allow_override")]
    pub acknowledgments: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  METRICS & ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertsArgs {
    /// Restrict to one domain (all tracked domains otherwise)
    pub domain: Option<String>,

    /// Window size in days
    #[arg(long, short = 'd', default_value = "30")]
    pub days: u32,
}

#[derive(Debug, Args)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MetricsCommand {
    /// Most recent spam rate and reputation, with a verdict
    Latest {
        /// Domain
        domain: Option<String>,
    },

    /// Daily history, merged into the local cache
    History {
        /// Domain
        domain: Option<String>,

        /// Days to fetch
        #[arg(long, short = 'd', default_value = "30")]
        days: u32,

        /// Show the cached history without fetching
        #[arg(long)]
        offline: bool,
    },

    /// Drop the cached history for a domain
    ClearCache {
        /// Domain
        domain: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Zone apex
    pub domain: Option<String>,

    /// Seconds between refreshes
    #[arg(long, short = 'i', default_value = "60")]
    pub interval: u64,

    /// Where to read DNS data from
    #[arg(long, value_enum, default_value = "provider")]
    pub source: SourceArg,

    /// Stop after this many refreshes
    #[arg(long)]
    pub count: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OFFLINE ANALYZERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SpfArgs {
    /// SPF record text
    #[arg(required_unless_present = "domain", conflicts_with = "domain")]
    pub record: Option<String>,

    /// Resolve the record from live DNS instead
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Debug, Args)]
pub struct DmarcArgs {
    /// DMARC record text
    #[arg(required_unless_present = "domain", conflicts_with = "domain")]
    pub record: Option<String>,

    /// Resolve `_dmarc.<domain>` from live DNS instead
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Debug, Args)]
pub struct HeadersArgs {
    /// File with the raw header block (stdin when omitted or "-")
    pub file: Option<PathBuf>,

    /// Domain substituted into the fix snippets
    #[arg(long)]
    pub domain: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DOMAIN SELECTION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub command: DomainCommand,
}

#[derive(Debug, Subcommand)]
pub enum DomainCommand {
    /// Print the selected domain
    Show,

    /// Select the domain commands default to
    Use {
        /// Domain name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a profile value
    Set {
        /// Profile key (e.g. zone_root, provider_url, dmarc_policy)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Store the metrics key instead of the DNS provider token
        #[arg(long)]
        metrics: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
