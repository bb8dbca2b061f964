//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::domain::{AttackSignalThresholds, VersionSelector};
use crate::infrastructure::di::GlobalOptions;

/// A CLI for interacting with the Fastly platform
#[derive(Parser, Debug)]
#[command(name = "fastly")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Fastly API token (or via FASTLY_API_TOKEN)
    #[arg(short = 't', long, global = true)]
    pub token: Option<String>,

    /// Fastly API endpoint
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,

    /// Switch account profile for single command execution
    #[arg(short = 'o', long, global = true)]
    pub profile: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Silence all output except direct command output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer yes automatically to all prompts
    #[arg(short = 'y', long, global = true)]
    pub auto_yes: bool,

    /// Do not prompt for user input
    #[arg(short = 'i', long, global = true)]
    pub non_interactive: bool,

    /// Diagnostic logging to stderr (repeat for more detail)
    #[arg(long, global = true, action = clap::ArgAction::Count)]
    pub debug_mode: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn globals(&self) -> GlobalOptions {
        GlobalOptions {
            token: self.token.clone(),
            endpoint: self.endpoint.clone(),
            profile: self.profile.clone(),
            verbose: self.verbose,
            quiet: self.quiet,
            auto_yes: self.auto_yes,
            non_interactive: self.non_interactive,
        }
    }

    /// Commands that deal with versions themselves skip the background check.
    pub fn is_version_command(&self) -> bool {
        matches!(
            self.command,
            Commands::Update | Commands::Version | Commands::Completion { .. }
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manipulate Fastly services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Manipulate Fastly service versions
    #[command(name = "service-version")]
    ServiceVersion {
        #[command(subcommand)]
        command: ServiceVersionCommands,
    },

    /// Manipulate Fastly service version domains
    Domain {
        #[command(subcommand)]
        command: DomainCommands,
    },

    /// Manipulate versionless Fastly domains
    #[command(name = "domain-v1")]
    DomainV1 {
        #[command(subcommand)]
        command: DomainV1Commands,
    },

    /// Manipulate Fastly service version backends
    Backend {
        #[command(subcommand)]
        command: BackendCommands,
    },

    /// Manipulate Fastly service version healthchecks
    Healthcheck {
        #[command(subcommand)]
        command: HealthCheckCommands,
    },

    /// Manipulate Fastly edge dictionaries
    Dictionary {
        #[command(subcommand)]
        command: DictionaryCommands,
    },

    /// Manipulate Fastly edge dictionary items
    #[command(name = "dictionary-entry")]
    DictionaryEntry {
        #[command(subcommand)]
        command: DictionaryEntryCommands,
    },

    /// Manipulate Fastly service version logging endpoints
    Logging {
        #[command(subcommand)]
        vendor: LoggingVendor,
    },

    /// Invalidate objects in the Fastly cache
    Purge(PurgeArgs),

    /// Manipulate Next-Gen WAF resources
    Ngwaf {
        #[command(subcommand)]
        command: NgwafCommands,
    },

    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Get information about the authenticated token
    Whoami {
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update the CLI to the latest version
    Update,

    /// Display version information for the Fastly CLI
    Version,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared flags

/// Which service to operate on.
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceTarget {
    /// Service ID (falls back to FASTLY_SERVICE_ID, then fastly.toml)
    #[arg(short = 's', long)]
    pub service_id: Option<String>,

    /// The name of the service
    #[arg(long)]
    pub service_name: Option<String>,
}

/// Which service version to read.
#[derive(Args, Debug, Clone, Default)]
pub struct VersionTarget {
    /// 'latest', 'active', or the number of a specific version
    #[arg(long = "version", value_name = "VERSION")]
    pub selector: Option<VersionSelector>,
}

impl VersionTarget {
    /// Omitted means the active version, falling back to the latest.
    pub fn selector(&self) -> VersionSelector {
        self.selector.unwrap_or_default()
    }
}

/// Which service version to modify.
#[derive(Args, Debug, Clone, Default)]
pub struct EditTarget {
    #[command(flatten)]
    pub version: VersionTarget,

    /// If the selected service version is not editable, clone it and use the clone
    #[arg(long)]
    pub autoclone: bool,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    /// Render output as JSON
    #[arg(short = 'j', long)]
    pub json: bool,
}

// ---------------------------------------------------------------------------
// service

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// Create a Fastly service
    Create {
        /// Service name
        #[arg(short = 'n', long)]
        name: String,
        /// Service type: vcl or wasm
        #[arg(long = "type", default_value = "vcl")]
        service_type: String,
        /// Human-readable comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// List Fastly services
    List {
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a Fastly service
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a Fastly service
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        /// New service name
        #[arg(short = 'n', long)]
        name: Option<String>,
        /// Human-readable comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a Fastly service
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        /// Deactivate the active version before deleting
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Search for a Fastly service by name
    Search {
        /// Service name
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        output: OutputFlags,
    },
}

// ---------------------------------------------------------------------------
// service-version

#[derive(Subcommand, Debug)]
pub enum ServiceVersionCommands {
    /// Clone a Fastly service version
    Clone {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
    },

    /// List Fastly service versions
    List {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a Fastly service version
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Human-readable comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Activate a Fastly service version
    Activate {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
    },

    /// Deactivate a Fastly service version
    Deactivate {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
    },

    /// Lock a Fastly service version
    Lock {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
    },
}

// ---------------------------------------------------------------------------
// domain

#[derive(Subcommand, Debug)]
pub enum DomainCommands {
    /// Create a domain on a Fastly service version
    Create {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Domain name
        #[arg(short = 'n', long)]
        name: String,
        /// Human-readable comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// List domains on a Fastly service version
    List {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a domain on a Fastly service version
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        /// Name of domain
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a domain on a Fastly service version
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Domain name
        #[arg(short = 'n', long)]
        name: String,
        /// New domain name
        #[arg(long)]
        new_name: Option<String>,
        /// Human-readable comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a domain on a Fastly service version
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Domain name
        #[arg(short = 'n', long)]
        name: String,
    },

    /// Check the status of the domain's DNS record
    Validate {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        /// Check all domains
        #[arg(long, conflicts_with = "name")]
        all: bool,
        /// The name of the domain to check
        #[arg(short = 'n', long, required_unless_present = "all")]
        name: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// domain-v1

#[derive(Subcommand, Debug)]
pub enum DomainV1Commands {
    /// Create a domain
    Create {
        /// Domain name
        #[arg(long)]
        fqdn: String,
        /// Service ID to route the domain to
        #[arg(short = 's', long)]
        service_id: Option<String>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// List domains
    List {
        /// Cursor value from the next_cursor field of a previous response
        #[arg(long)]
        cursor: Option<String>,
        /// Limit how many results are returned
        #[arg(long)]
        limit: Option<i64>,
        /// Filter results on the fully qualified domain name
        #[arg(long)]
        fqdn: Option<String>,
        /// Filter results on the service ID
        #[arg(short = 's', long)]
        service_id: Option<String>,
        /// The order in which to list the results
        #[arg(long)]
        sort: Option<String>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a domain
    Describe {
        /// Domain ID
        #[arg(long)]
        domain_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a domain
    Update {
        /// Domain ID
        #[arg(long)]
        domain_id: String,
        /// Service ID to route the domain to
        #[arg(short = 's', long)]
        service_id: Option<String>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Delete a domain
    Delete {
        /// Domain ID
        #[arg(long)]
        domain_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },
}

// ---------------------------------------------------------------------------
// backend

/// Settings of a backend; only flags that were given are sent.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendFlags {
    /// A hostname, IPv4, or IPv6 address for the backend
    #[arg(long)]
    pub address: Option<String>,
    /// Port number of the address
    #[arg(long)]
    pub port: Option<u16>,
    /// Whether or not to use SSL to reach the backend
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub use_ssl: Option<bool>,
    /// The hostname to override the Host header
    #[arg(long)]
    pub override_host: Option<String>,
    /// A descriptive note
    #[arg(long)]
    pub comment: Option<String>,
    /// How long to wait for a timeout in milliseconds
    #[arg(long)]
    pub connect_timeout: Option<i64>,
    /// How long to wait for the first bytes in milliseconds
    #[arg(long)]
    pub first_byte_timeout: Option<i64>,
    /// How long to wait between bytes in milliseconds
    #[arg(long)]
    pub between_bytes_timeout: Option<i64>,
    /// Maximum number of connections
    #[arg(long)]
    pub max_conn: Option<i64>,
    /// Weight used to load balance this backend against others
    #[arg(long)]
    pub weight: Option<i64>,
    /// Whether or not this backend should be automatically load balanced
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub auto_loadbalance: Option<bool>,
    /// The name of the healthcheck to use with this backend
    #[arg(long)]
    pub healthcheck: Option<String>,
    /// The shield POP designated to reduce inbound load
    #[arg(long)]
    pub shield: Option<String>,
    /// Condition which, if met, will select this backend during a request
    #[arg(long)]
    pub request_condition: Option<String>,
    /// Overrides ssl_hostname, but only for cert verification
    #[arg(long)]
    pub ssl_cert_hostname: Option<String>,
    /// Overrides ssl_hostname, but only for SNI in the handshake
    #[arg(long)]
    pub ssl_sni_hostname: Option<String>,
    /// Be strict about checking SSL certs
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub ssl_check_cert: Option<bool>,
    /// Minimum allowed TLS version on SSL connections to this backend
    #[arg(long)]
    pub min_tls_version: Option<String>,
    /// Maximum allowed TLS version on SSL connections to this backend
    #[arg(long)]
    pub max_tls_version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum BackendCommands {
    /// Create a backend on a Fastly service version
    Create {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Backend name
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        flags: BackendFlags,
    },

    /// List backends on a Fastly service version
    List {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a backend on a Fastly service version
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        /// Name of backend
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a backend on a Fastly service version
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Backend name
        #[arg(short = 'n', long)]
        name: String,
        /// New backend name
        #[arg(long)]
        new_name: Option<String>,
        #[command(flatten)]
        flags: BackendFlags,
    },

    /// Delete a backend on a Fastly service version
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Backend name
        #[arg(short = 'n', long)]
        name: String,
    },
}

// ---------------------------------------------------------------------------
// healthcheck

#[derive(Args, Debug, Clone, Default)]
pub struct HealthCheckFlags {
    /// A descriptive note
    #[arg(long)]
    pub comment: Option<String>,
    /// Which HTTP method to use
    #[arg(long)]
    pub method: Option<String>,
    /// Which host to check
    #[arg(long)]
    pub host: Option<String>,
    /// The path to check
    #[arg(long)]
    pub path: Option<String>,
    /// Whether to use version 1.0 or 1.1 HTTP
    #[arg(long)]
    pub http_version: Option<String>,
    /// Timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<i64>,
    /// How often to run the healthcheck in milliseconds
    #[arg(long)]
    pub check_interval: Option<i64>,
    /// The status code expected from the host
    #[arg(long)]
    pub expected_response: Option<i64>,
    /// The number of most recent healthcheck queries to keep
    #[arg(long)]
    pub window: Option<i64>,
    /// How many healthchecks must succeed to be considered healthy
    #[arg(long)]
    pub threshold: Option<i64>,
    /// When loading a config, the initial number of probes to be seen as OK
    #[arg(long)]
    pub initial: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum HealthCheckCommands {
    /// Create a healthcheck on a Fastly service version
    Create {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Healthcheck name
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        flags: HealthCheckFlags,
    },

    /// List healthchecks on a Fastly service version
    List {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a healthcheck on a Fastly service version
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        /// Name of healthcheck
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a healthcheck on a Fastly service version
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Healthcheck name
        #[arg(short = 'n', long)]
        name: String,
        /// New healthcheck name
        #[arg(long)]
        new_name: Option<String>,
        #[command(flatten)]
        flags: HealthCheckFlags,
    },

    /// Delete a healthcheck on a Fastly service version
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Healthcheck name
        #[arg(short = 'n', long)]
        name: String,
    },
}

// ---------------------------------------------------------------------------
// dictionary

#[derive(Subcommand, Debug)]
pub enum DictionaryCommands {
    /// Create a Fastly edge dictionary on a Fastly service version
    Create {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Name of Dictionary
        #[arg(short = 'n', long)]
        name: String,
        /// Whether to mark this dictionary as write-only
        #[arg(long)]
        write_only: bool,
    },

    /// List all dictionaries on a Fastly service version
    List {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a Fastly edge dictionary
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        version: VersionTarget,
        /// Name of Dictionary
        #[arg(short = 'n', long)]
        name: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update name of dictionary on a Fastly service version
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Old name of Dictionary
        #[arg(short = 'n', long)]
        name: String,
        /// New name of Dictionary
        #[arg(long)]
        new_name: Option<String>,
        /// Whether to mark this dictionary as write-only
        #[arg(long)]
        write_only: Option<bool>,
    },

    /// Delete a Fastly edge dictionary from a Fastly service version
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        #[command(flatten)]
        target: EditTarget,
        /// Name of Dictionary
        #[arg(short = 'n', long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DictionaryEntryCommands {
    /// List items in a Fastly edge dictionary
    List {
        #[command(flatten)]
        service: ServiceTarget,
        /// Dictionary ID
        #[arg(long)]
        dictionary_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Show detailed information about a Fastly edge dictionary item
    Describe {
        #[command(flatten)]
        service: ServiceTarget,
        /// Dictionary ID
        #[arg(long)]
        dictionary_id: String,
        /// Dictionary item key
        #[arg(long)]
        key: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Create a new item on a Fastly edge dictionary
    Create {
        #[command(flatten)]
        service: ServiceTarget,
        /// Dictionary ID
        #[arg(long)]
        dictionary_id: String,
        /// Dictionary item key
        #[arg(long)]
        key: String,
        /// Dictionary item value
        #[arg(long)]
        value: String,
    },

    /// Update or insert an item on a Fastly edge dictionary
    Update {
        #[command(flatten)]
        service: ServiceTarget,
        /// Dictionary ID
        #[arg(long)]
        dictionary_id: String,
        /// Dictionary item key
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        key: Option<String>,
        /// Dictionary item value
        #[arg(long, requires = "key")]
        value: Option<String>,
        /// Batch update JSON file (`{"items": [{"op": ..., "item_key": ..., "item_value": ...}]}`)
        #[arg(long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Delete an item from a Fastly edge dictionary
    Delete {
        #[command(flatten)]
        service: ServiceTarget,
        /// Dictionary ID
        #[arg(long)]
        dictionary_id: String,
        /// Dictionary item key
        #[arg(long)]
        key: String,
    },
}

// ---------------------------------------------------------------------------
// logging

/// Flags common to every logging endpoint.
#[derive(Args, Debug, Clone, Default)]
pub struct LoggingCommonFlags {
    /// Apache style log formatting
    #[arg(long)]
    pub format: Option<String>,
    /// The version of the custom logging format used for the configured endpoint
    #[arg(long)]
    pub format_version: Option<i64>,
    /// Where in the generated VCL the logging call should be placed
    #[arg(long)]
    pub placement: Option<String>,
    /// The name of an existing condition in the configured endpoint
    #[arg(long)]
    pub response_condition: Option<String>,
}

/// Flags of vendors that write log files.
#[derive(Args, Debug, Clone, Default)]
pub struct LoggingFileFlags {
    /// The path to upload logs to
    #[arg(long)]
    pub path: Option<String>,
    /// How frequently log files are finalized so they can be available for reading (in seconds)
    #[arg(long)]
    pub period: Option<i64>,
    /// What level of GZIP encoding to have when dumping logs
    #[arg(long)]
    pub gzip_level: Option<i64>,
    /// The codec used for compression of your logs (zstd, snappy, gzip)
    #[arg(long)]
    pub compression_codec: Option<String>,
    /// How the message should be formatted (classic, loggly, logplex, blank)
    #[arg(long)]
    pub message_type: Option<String>,
    /// strftime specified timestamp formatting
    #[arg(long)]
    pub timestamp_format: Option<String>,
}

/// Flags for TLS connections to log receivers.
#[derive(Args, Debug, Clone, Default)]
pub struct LoggingTlsFlags {
    /// A secure certificate to authenticate the server with
    #[arg(long)]
    pub tls_ca_cert: Option<String>,
    /// The hostname used to verify the server's certificate
    #[arg(long)]
    pub tls_hostname: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GcsFlags {
    /// Your GCS service account email address
    #[arg(long)]
    pub user: Option<String>,
    /// Your GCS account secret key
    #[arg(long)]
    pub secret_key: Option<String>,
    /// The name of the Google Cloud Platform service account
    #[arg(long)]
    pub account_name: Option<String>,
    /// The bucket of the GCS bucket
    #[arg(long)]
    pub bucket: Option<String>,
    /// Your Google Cloud Platform project ID
    #[arg(long)]
    pub project_id: Option<String>,
    #[command(flatten)]
    pub file: LoggingFileFlags,
}

#[derive(Args, Debug, Clone, Default)]
pub struct S3Flags {
    /// Your S3 bucket name
    #[arg(long)]
    pub bucket: Option<String>,
    /// Your S3 account access key
    #[arg(long)]
    pub access_key: Option<String>,
    /// Your S3 account secret key
    #[arg(long)]
    pub secret_key: Option<String>,
    /// The IAM role ARN for logging
    #[arg(long)]
    pub iam_role: Option<String>,
    /// The domain of the S3 endpoint
    #[arg(long)]
    pub domain: Option<String>,
    /// The S3 redundancy level
    #[arg(long)]
    pub redundancy: Option<String>,
    /// Set to enable S3 Server Side Encryption (AES256 or aws:kms)
    #[arg(long)]
    pub server_side_encryption: Option<String>,
    #[command(flatten)]
    pub file: LoggingFileFlags,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SyslogFlags {
    /// A hostname or IPv4 address
    #[arg(long)]
    pub address: Option<String>,
    /// The port number
    #[arg(long)]
    pub port: Option<u16>,
    /// Whether to use TLS for secure logging
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub use_tls: Option<bool>,
    /// Whether to prepend each message with a specific token
    #[arg(long)]
    pub auth_token: Option<String>,
    /// How the message should be formatted (classic, loggly, logplex, blank)
    #[arg(long)]
    pub message_type: Option<String>,
    #[command(flatten)]
    pub tls: LoggingTlsFlags,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HttpsFlags {
    /// URL that log data will be sent to. Must use the https protocol
    #[arg(long)]
    pub url: Option<String>,
    /// HTTP method used for request (POST, PUT)
    #[arg(long)]
    pub method: Option<String>,
    /// Content type of the header sent with the request
    #[arg(long)]
    pub content_type: Option<String>,
    /// Name of the custom header sent with the request
    #[arg(long)]
    pub header_name: Option<String>,
    /// Value of the custom header sent with the request
    #[arg(long)]
    pub header_value: Option<String>,
    /// Enforces valid JSON formatting for log entries (0, 1, 2)
    #[arg(long)]
    pub json_format: Option<String>,
    /// How the message should be formatted (classic, loggly, logplex, blank)
    #[arg(long)]
    pub message_type: Option<String>,
    /// The maximum number of logs sent in one request
    #[arg(long)]
    pub request_max_entries: Option<i64>,
    /// The maximum number of bytes sent in one request
    #[arg(long)]
    pub request_max_bytes: Option<i64>,
    #[command(flatten)]
    pub tls: LoggingTlsFlags,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DatadogFlags {
    /// The API key from your Datadog account
    #[arg(long)]
    pub auth_token: Option<String>,
    /// The region that log data will be sent to (US or EU)
    #[arg(long)]
    pub region: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SplunkFlags {
    /// The URL to POST to
    #[arg(long)]
    pub url: Option<String>,
    /// A Splunk token for use in posting logs over HTTP to your collector
    #[arg(long)]
    pub auth_token: Option<String>,
    /// The maximum number of logs sent in one request
    #[arg(long)]
    pub request_max_entries: Option<i64>,
    /// The maximum number of bytes sent in one request
    #[arg(long)]
    pub request_max_bytes: Option<i64>,
    #[command(flatten)]
    pub tls: LoggingTlsFlags,
}

/// Operations shared by every logging vendor.
///
/// clap needs a concrete subcommand enum per vendor; this keeps the five
/// operations in one place.
macro_rules! logging_commands {
    ($name:ident, $flags:ty, $vendor:literal) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum $name {
            #[doc = concat!("Create a ", $vendor, " logging endpoint on a Fastly service version")]
            Create {
                #[command(flatten)]
                service: ServiceTarget,
                #[command(flatten)]
                target: EditTarget,
                /// The name of the logging object
                #[arg(short = 'n', long)]
                name: String,
                #[command(flatten)]
                common: LoggingCommonFlags,
                #[command(flatten)]
                vendor: $flags,
            },

            #[doc = concat!("List ", $vendor, " logging endpoints on a Fastly service version")]
            List {
                #[command(flatten)]
                service: ServiceTarget,
                #[command(flatten)]
                version: VersionTarget,
                #[command(flatten)]
                output: OutputFlags,
            },

            #[doc = concat!("Show detailed information about a ", $vendor, " logging endpoint")]
            Describe {
                #[command(flatten)]
                service: ServiceTarget,
                #[command(flatten)]
                version: VersionTarget,
                /// The name of the logging object
                #[arg(short = 'n', long)]
                name: String,
                #[command(flatten)]
                output: OutputFlags,
            },

            #[doc = concat!("Update a ", $vendor, " logging endpoint on a Fastly service version")]
            Update {
                #[command(flatten)]
                service: ServiceTarget,
                #[command(flatten)]
                target: EditTarget,
                /// The name of the logging object
                #[arg(short = 'n', long)]
                name: String,
                /// New name of the logging object
                #[arg(long)]
                new_name: Option<String>,
                #[command(flatten)]
                common: LoggingCommonFlags,
                #[command(flatten)]
                vendor: $flags,
            },

            #[doc = concat!("Delete a ", $vendor, " logging endpoint on a Fastly service version")]
            Delete {
                #[command(flatten)]
                service: ServiceTarget,
                #[command(flatten)]
                target: EditTarget,
                /// The name of the logging object
                #[arg(short = 'n', long)]
                name: String,
            },
        }

        impl $name {
            pub fn into_op(self) -> LoggingOp<$flags> {
                match self {
                    $name::Create { service, target, name, common, vendor } => LoggingOp::Create {
                        service,
                        target,
                        name,
                        common,
                        vendor,
                    },
                    $name::List { service, version, output } => LoggingOp::List {
                        service,
                        version,
                        output,
                    },
                    $name::Describe { service, version, name, output } => LoggingOp::Describe {
                        service,
                        version,
                        name,
                        output,
                    },
                    $name::Update { service, target, name, new_name, common, vendor } => {
                        LoggingOp::Update {
                            service,
                            target,
                            name,
                            new_name,
                            common,
                            vendor,
                        }
                    }
                    $name::Delete { service, target, name } => LoggingOp::Delete {
                        service,
                        target,
                        name,
                    },
                }
            }
        }
    };
}

/// A logging operation with the vendor flags resolved to one type.
#[derive(Debug, Clone)]
pub enum LoggingOp<F> {
    Create {
        service: ServiceTarget,
        target: EditTarget,
        name: String,
        common: LoggingCommonFlags,
        vendor: F,
    },
    List {
        service: ServiceTarget,
        version: VersionTarget,
        output: OutputFlags,
    },
    Describe {
        service: ServiceTarget,
        version: VersionTarget,
        name: String,
        output: OutputFlags,
    },
    Update {
        service: ServiceTarget,
        target: EditTarget,
        name: String,
        new_name: Option<String>,
        common: LoggingCommonFlags,
        vendor: F,
    },
    Delete {
        service: ServiceTarget,
        target: EditTarget,
        name: String,
    },
}

logging_commands!(GcsCommands, GcsFlags, "GCS");
logging_commands!(S3Commands, S3Flags, "S3");
logging_commands!(SyslogCommands, SyslogFlags, "Syslog");
logging_commands!(HttpsCommands, HttpsFlags, "HTTPS");
logging_commands!(DatadogCommands, DatadogFlags, "Datadog");
logging_commands!(SplunkCommands, SplunkFlags, "Splunk");

#[derive(Subcommand, Debug)]
pub enum LoggingVendor {
    /// Manipulate Fastly service version GCS logging endpoints
    Gcs {
        #[command(subcommand)]
        command: GcsCommands,
    },
    /// Manipulate Fastly service version S3 logging endpoints
    S3 {
        #[command(subcommand)]
        command: S3Commands,
    },
    /// Manipulate Fastly service version Syslog logging endpoints
    Syslog {
        #[command(subcommand)]
        command: SyslogCommands,
    },
    /// Manipulate Fastly service version HTTPS logging endpoints
    Https {
        #[command(subcommand)]
        command: HttpsCommands,
    },
    /// Manipulate Fastly service version Datadog logging endpoints
    Datadog {
        #[command(subcommand)]
        command: DatadogCommands,
    },
    /// Manipulate Fastly service version Splunk logging endpoints
    Splunk {
        #[command(subcommand)]
        command: SplunkCommands,
    },
}

// ---------------------------------------------------------------------------
// purge

#[derive(Args, Debug, Clone, Default)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub service: ServiceTarget,

    /// Purge everything from a service
    #[arg(long, conflicts_with_all = ["file", "key", "url"])]
    pub all: bool,

    /// Purge a service of a newline delimited list of Surrogate Keys
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with_all = ["key", "url"])]
    pub file: Option<PathBuf>,

    /// Purge a service of objects tagged with a Surrogate Key
    #[arg(long, conflicts_with = "url")]
    pub key: Option<String>,

    /// Purge an individual URL
    #[arg(long, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// A 'soft' purge marks affected content as stale rather than removing it
    #[arg(long)]
    pub soft: bool,
}

// ---------------------------------------------------------------------------
// ngwaf

#[derive(Subcommand, Debug)]
pub enum NgwafCommands {
    /// Manipulate Next-Gen WAF workspaces
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },

    /// Manipulate Next-Gen WAF workspace IP lists
    Iplist {
        #[command(subcommand)]
        command: IpListCommands,
    },
}

/// Optional workspace settings.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceFlags {
    /// Attack threshold parameters for system site alerts (Immediate:OneMinute:TenMinutes:OneHour)
    #[arg(long)]
    pub attack_thresholds: Option<AttackSignalThresholds>,
    /// Specify the request headers containing the client IP address (colon separated)
    #[arg(long)]
    pub client_ip_headers: Option<String>,
    /// Default status code that is returned when a request to your web application is blocked
    #[arg(long)]
    pub default_blocking_code: Option<i64>,
    /// Redirect url to be used if code 301 or 302 is used as a blocking code
    #[arg(long)]
    pub default_redirect_url: Option<String>,
    /// Agents will anonymize IP addresses according to the option selected
    #[arg(long)]
    pub ip_anonymization: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommands {
    /// Create a workspace
    Create {
        /// User submitted display name of a workspace
        #[arg(long)]
        name: String,
        /// User submitted description of a workspace
        #[arg(long)]
        description: String,
        /// User configured mode (block, log, off)
        #[arg(long)]
        blocking_mode: String,
        #[command(flatten)]
        flags: WorkspaceFlags,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// List workspaces
    List {
        /// Limit how many results are returned
        #[arg(long)]
        limit: Option<i64>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Get a workspace
    Get {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update a workspace
    Update {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        /// User submitted display name of a workspace
        #[arg(long)]
        name: Option<String>,
        /// User submitted description of a workspace
        #[arg(long)]
        description: Option<String>,
        /// User configured mode (block, log, off)
        #[arg(long)]
        blocking_mode: Option<String>,
        #[command(flatten)]
        flags: WorkspaceFlags,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Delete a workspace
    Delete {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },
}

#[derive(Subcommand, Debug)]
pub enum IpListCommands {
    /// Create an IP list
    Create {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        /// Name of the list
        #[arg(long)]
        name: String,
        /// Comma separated IP addresses
        #[arg(long)]
        entries: String,
        /// Description of the list
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// List IP lists of a workspace
    List {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Get an IP list
    Get {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        /// List ID
        #[arg(long)]
        list_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Update an IP list
    Update {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        /// List ID
        #[arg(long)]
        list_id: String,
        /// Comma separated IP addresses
        #[arg(long)]
        entries: Option<String>,
        /// Description of the list
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Delete an IP list
    Delete {
        /// Workspace ID
        #[arg(long)]
        workspace_id: String,
        /// List ID
        #[arg(long)]
        list_id: String,
        #[command(flatten)]
        output: OutputFlags,
    },
}

// ---------------------------------------------------------------------------
// profile

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create user profile
    Create {
        /// Profile name
        #[arg(default_value = "user")]
        name: String,
        /// Set profile as the default
        #[arg(long = "default")]
        make_default: bool,
    },

    /// List user profiles
    List {
        #[command(flatten)]
        output: OutputFlags,
    },

    /// Switch user profile
    Switch {
        /// Profile to switch to
        name: String,
    },

    /// Update user profile
    Update {
        /// Profile to update (default profile when omitted)
        name: Option<String>,
        /// Set profile as the default
        #[arg(long = "default")]
        make_default: bool,
    },

    /// Delete user profile
    Delete {
        /// Profile to delete
        name: String,
    },

    /// Print access token
    Token {
        /// Profile to read the token from (default profile when omitted)
        name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_backend_create_when_parsing_then_flags_are_typed() {
        let cli = Cli::try_parse_from([
            "fastly", "backend", "create", "-s", "123", "--version", "2", "--name", "origin",
            "--address", "example.com", "--use-ssl",
        ])
        .unwrap();

        let Commands::Backend {
            command: BackendCommands::Create {
                service,
                target,
                name,
                flags,
            },
        } = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(service.service_id.as_deref(), Some("123"));
        assert_eq!(target.version.selector(), VersionSelector::Number(2));
        assert!(!target.autoclone);
        assert_eq!(name, "origin");
        assert!(flags.use_ssl);
        assert_eq!(flags.port, None);
    }

    #[test]
    fn given_no_version_flag_when_parsing_then_selector_is_unspecified() {
        let cli = Cli::try_parse_from(["fastly", "domain", "list", "-s", "123"]).unwrap();

        let Commands::Domain {
            command: DomainCommands::List { version, .. },
        } = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(version.selector(), VersionSelector::Unspecified);
    }

    #[test]
    fn given_global_flags_after_subcommand_when_parsing_then_globals_are_set() {
        let cli = Cli::try_parse_from([
            "fastly", "service", "list", "--token", "abc", "-v", "--debug-mode", "--debug-mode",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert!(cli.verbose);
        assert_eq!(cli.debug_mode, 2);
    }

    #[test]
    fn given_update_command_when_checking_then_is_version_command() {
        let cli = Cli::try_parse_from(["fastly", "update"]).unwrap();
        assert!(cli.is_version_command());
    }
}
