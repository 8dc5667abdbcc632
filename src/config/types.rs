use serde::Deserialize;

/// Main configuration structure for wiki-mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub repair: RepairConfig,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the bot
    #[serde(rename = "bot-name")]
    pub bot_name: String,

    /// Version of the bot
    #[serde(rename = "bot-version")]
    pub bot_version: String,

    /// URL or email address for bot-related contact
    pub contact: String,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Endpoint template; `{site}` is replaced by the wiki host
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Value sent as `<prefix>limit` on property queries
    #[serde(rename = "page-limit", default = "default_page_limit")]
    pub page_limit: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite crawl store
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Root directory for mirrored artifacts
    #[serde(rename = "content-dir", default = "default_content_dir")]
    pub content_dir: String,

    /// Path of the generated link-repair script
    #[serde(rename = "repair-script", default = "default_repair_script")]
    pub repair_script: String,
}

/// Seed list configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Links that must never be fetched
    #[serde(default = "default_ignore_seeds")]
    pub ignore: String,

    /// Automatically derived entry points
    #[serde(default = "default_auto_seeds")]
    pub auto: String,

    /// Manually curated entry points
    #[serde(default = "default_manual_seeds")]
    pub manual: String,

    #[serde(rename = "auto-level", default = "default_auto_level")]
    pub auto_level: i64,

    #[serde(rename = "manual-level", default = "default_manual_level")]
    pub manual_level: i64,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Site assumed for links without a language or project prefix
    #[serde(rename = "default-site", default = "default_site")]
    pub default_site: String,

    /// Language links kept as outbound links
    #[serde(rename = "link-languages", default = "default_link_languages")]
    pub link_languages: Vec<String>,

    /// Level increment for subpages of the current article
    #[serde(rename = "subpage-step", default = "default_subpage_step")]
    pub subpage_step: i64,

    /// Level increment for every other discovered link
    #[serde(rename = "discovered-step", default = "default_discovered_step")]
    pub discovered_step: i64,

    /// Sleep after each item, as a multiple of the fetch duration
    #[serde(rename = "throttle-factor", default = "default_throttle_factor")]
    pub throttle_factor: f64,

    /// Fetch durations shorter than this are rounded up before throttling
    #[serde(rename = "min-fetch-secs", default = "default_min_fetch_secs")]
    pub min_fetch_secs: f64,

    /// Pause between `allusers` pages (milliseconds)
    #[serde(rename = "user-list-delay-ms", default = "default_user_list_delay_ms")]
    pub user_list_delay_ms: u64,

    /// Highest level visited by `--all-levels`
    #[serde(rename = "max-level", default = "default_max_level")]
    pub max_level: i64,
}

/// Link-repair script configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RepairConfig {
    /// Only normalizations of entries at this level are reported
    #[serde(default = "default_repair_level")]
    pub level: i64,

    #[serde(default = "default_repair_targets")]
    pub targets: Vec<RepairTarget>,
}

/// One wiki whose links the repair script knows how to rewrite
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepairTarget {
    pub site: String,
    pub lang: String,
    #[serde(default)]
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            content_dir: default_content_dir(),
            repair_script: default_repair_script(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore_seeds(),
            auto: default_auto_seeds(),
            manual: default_manual_seeds(),
            auto_level: default_auto_level(),
            manual_level: default_manual_level(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            default_site: default_site(),
            link_languages: default_link_languages(),
            subpage_step: default_subpage_step(),
            discovered_step: default_discovered_step(),
            throttle_factor: default_throttle_factor(),
            min_fetch_secs: default_min_fetch_secs(),
            user_list_delay_ms: default_user_list_delay_ms(),
            max_level: default_max_level(),
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            level: default_repair_level(),
            targets: default_repair_targets(),
        }
    }
}

fn default_endpoint() -> String {
    "https://{site}/w/api.php".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    100
}

fn default_database_path() -> String {
    "wikiPages.db".to_string()
}

fn default_content_dir() -> String {
    ".".to_string()
}

fn default_repair_script() -> String {
    "fixWikiLink.sh".to_string()
}

fn default_ignore_seeds() -> String {
    "entry_points-ignore.txt".to_string()
}

fn default_auto_seeds() -> String {
    "entry_points-auto.txt".to_string()
}

fn default_manual_seeds() -> String {
    "entry_points-manual.txt".to_string()
}

fn default_auto_level() -> i64 {
    100
}

fn default_manual_level() -> i64 {
    1
}

fn default_site() -> String {
    "pl.wikipedia.org".to_string()
}

fn default_link_languages() -> Vec<String> {
    vec!["en".to_string(), "pl".to_string()]
}

fn default_subpage_step() -> i64 {
    1
}

fn default_discovered_step() -> i64 {
    10
}

fn default_throttle_factor() -> f64 {
    1.4
}

fn default_min_fetch_secs() -> f64 {
    2.0
}

fn default_user_list_delay_ms() -> u64 {
    3400
}

fn default_max_level() -> i64 {
    1000
}

fn default_repair_level() -> i64 {
    1
}

fn default_repair_targets() -> Vec<RepairTarget> {
    [
        ("pl.wikipedia.org", "pl", ""),
        ("en.wikipedia.org", "en", ""),
        ("pl.wikibooks.org", "pl", "b:"),
        ("en.wikibooks.org", "en", "b:"),
    ]
    .into_iter()
    .map(|(site, lang, prefix)| RepairTarget {
        site: site.to_string(),
        lang: lang.to_string(),
        prefix: prefix.to_string(),
    })
    .collect()
}
