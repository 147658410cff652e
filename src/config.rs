use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a scrape, shared by the static and interactive paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Timeout for the static GET request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for the browser navigation itself
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Upper bound for waiting on `document.readyState`
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Upper bound for waiting on a `<body>`
    #[serde(default = "default_body_timeout_ms")]
    pub body_timeout_ms: u64,

    /// Upper bound for waiting on the first interactive element
    #[serde(default = "default_interactive_timeout_ms")]
    pub interactive_timeout_ms: u64,

    /// Overall bound on the whole rendering sequence
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    /// Bound on opening or closing one browser session
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Bound on a single click
    #[serde(default = "default_click_timeout_ms")]
    pub click_timeout_ms: u64,

    /// Maximum number of sections kept per page
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,

    /// Maximum length of a section's raw HTML before truncation
    #[serde(default = "default_max_raw_html_length")]
    pub max_raw_html_length: usize,

    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: u32,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Pause after each scroll
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Pause after readiness so late scripts can run
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause after each click
    #[serde(default = "default_click_delay_ms")]
    pub click_delay_ms: u64,

    /// Matches inspected per click selector
    #[serde(default = "default_max_clicks_per_selector")]
    pub max_clicks_per_selector: usize,

    /// Minimum page text length before a static result counts as complete
    #[serde(default = "default_use_js_threshold")]
    pub use_js_threshold: usize,

    /// CSS selectors removed from the rendered page before extraction
    #[serde(default = "default_noise_selectors")]
    pub noise_selectors: Vec<String>,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// WebDriver URLs tried when `webdriver_url` refuses the session
    #[serde(default = "default_webdriver_fallbacks")]
    pub webdriver_fallbacks: Vec<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_viewport")]
    pub viewport: (u32, u32),

    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_ready_timeout_ms() -> u64 {
    15_000
}

fn default_body_timeout_ms() -> u64 {
    10_000
}

fn default_interactive_timeout_ms() -> u64 {
    5_000
}

fn default_render_timeout_secs() -> u64 {
    120
}

fn default_session_timeout_ms() -> u64 {
    10_000
}

fn default_click_timeout_ms() -> u64 {
    3_000
}

fn default_max_sections() -> usize {
    50
}

fn default_max_raw_html_length() -> usize {
    10_000
}

fn default_max_scrolls() -> u32 {
    3
}

fn default_max_pages() -> usize {
    3
}

fn default_scroll_delay_ms() -> u64 {
    1_000
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

fn default_click_delay_ms() -> u64 {
    1_000
}

fn default_max_clicks_per_selector() -> usize {
    5
}

fn default_use_js_threshold() -> usize {
    100
}

fn default_noise_selectors() -> Vec<String> {
    [
        r#"[class*="cookie"]"#,
        r#"[class*="banner"]"#,
        r#"[class*="modal"]"#,
        r#"[class*="popup"]"#,
        r#"[class*="overlay"]"#,
        r#"[class*="newsletter"]"#,
        r#"[class*="subscribe"]"#,
        r#"[id*="cookie"]"#,
        r#"[id*="banner"]"#,
        r#"[id*="modal"]"#,
        r#"[id*="popup"]"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_webdriver_fallbacks() -> Vec<String> {
    vec![
        "http://localhost:9515".to_string(), // ChromeDriver default
        "http://127.0.0.1:4444".to_string(),
    ]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_viewport() -> (u32, u32) {
    (1920, 1080)
}

fn default_headless() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            body_timeout_ms: default_body_timeout_ms(),
            interactive_timeout_ms: default_interactive_timeout_ms(),
            render_timeout_secs: default_render_timeout_secs(),
            session_timeout_ms: default_session_timeout_ms(),
            click_timeout_ms: default_click_timeout_ms(),
            max_sections: default_max_sections(),
            max_raw_html_length: default_max_raw_html_length(),
            max_scrolls: default_max_scrolls(),
            max_pages: default_max_pages(),
            scroll_delay_ms: default_scroll_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            click_delay_ms: default_click_delay_ms(),
            max_clicks_per_selector: default_max_clicks_per_selector(),
            use_js_threshold: default_use_js_threshold(),
            noise_selectors: default_noise_selectors(),
            webdriver_url: default_webdriver_url(),
            webdriver_fallbacks: default_webdriver_fallbacks(),
            user_agent: default_user_agent(),
            viewport: default_viewport(),
            headless: default_headless(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply `WEBDRIVER_URL` from the environment, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }
}
