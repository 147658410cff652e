use crate::config::ScraperConfig;
use crate::error::Error;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;

/// How to find elements on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    Css(&'a str),
    XPath(&'a str),
}

impl<'a> Query<'a> {
    /// The raw selector or expression
    pub fn as_str(&self) -> &'a str {
        match self {
            Query::Css(s) | Query::XPath(s) => s,
        }
    }

    fn locator(&self) -> Locator<'a> {
        match *self {
            Query::Css(s) => Locator::Css(s),
            Query::XPath(s) => Locator::XPath(s),
        }
    }
}

/// Operations the renderer needs from a live browser page
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Handle to an element on the page
    type Element: Send + Sync;

    async fn goto(&self, url: &str) -> Result<(), Error>;

    /// Run a script body (may `return` a value)
    async fn execute(&self, script: &str) -> Result<Value, Error>;

    /// Wait until at least one element matches `css`
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<(), Error>;

    async fn find_all(&self, query: Query<'_>) -> Result<Vec<Self::Element>, Error>;

    async fn is_visible(&self, element: &Self::Element) -> Result<bool, Error>;

    async fn text(&self, element: &Self::Element) -> Result<String, Error>;

    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>, Error>;

    /// Scroll the element into view and click it without actionability checks
    async fn force_click(&self, element: &Self::Element) -> Result<(), Error>;

    async fn current_url(&self) -> Result<String, Error>;

    /// Fully rendered HTML of the page
    async fn source(&self) -> Result<String, Error>;

    /// End the browser session
    async fn close(&self) -> Result<(), Error>;
}

/// Scrolls an element to the middle of the viewport, then dispatches a click
const FORCE_CLICK_SCRIPT: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'center'}); arguments[0].click();";

const RESIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// A WebDriver browser session
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Opens a session at `config.webdriver_url`, then at each fallback URL
    pub async fn connect(config: &ScraperConfig) -> Result<Self, Error> {
        let capabilities = session_capabilities(config);

        let mut last_error = None;
        let candidates = std::iter::once(&config.webdriver_url).chain(
            config
                .webdriver_fallbacks
                .iter()
                .filter(|url| **url != config.webdriver_url),
        );

        for webdriver_url in candidates {
            let mut builder = ClientBuilder::native();
            builder.capabilities(capabilities.clone());

            match timeout(config.session_timeout(), builder.connect(webdriver_url)).await {
                Ok(Ok(client)) => {
                    ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                    let session = Self { client };
                    session.resize(config.viewport).await;
                    return Ok(session);
                }
                Ok(Err(e)) => {
                    ::log::debug!("WebDriver at {} refused the session: {}", webdriver_url, e);
                    last_error = Some(Error::Render(format!(
                        "could not start a browser session ({}: {})",
                        webdriver_url, e
                    )));
                }
                Err(_) => {
                    ::log::warn!(
                        "WebDriver at {} did not answer within {} ms",
                        webdriver_url, config.session_timeout_ms
                    );
                    last_error = Some(Error::Timeout(format!(
                        "browser session at {} after {} ms",
                        webdriver_url, config.session_timeout_ms
                    )));
                }
            }
        }

        ::log::error!(
            "Failed to connect to any WebDriver server. Make sure one is running or set the WEBDRIVER_URL environment variable"
        );
        Err(last_error.unwrap_or_else(|| {
            Error::Render("could not start a browser session (no WebDriver URL configured)".to_string())
        }))
    }

    async fn resize(&self, (width, height): (u32, u32)) {
        match timeout(RESIZE_TIMEOUT, self.client.set_window_size(width, height)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => ::log::debug!("Could not set window size to {}x{}: {}", width, height, e),
            Err(_) => ::log::debug!("Setting window size to {}x{} timed out", width, height),
        }
    }
}

/// Capabilities for an isolated headless session with a desktop user agent.
///
/// `eager` page loading returns from navigation at DOMContentLoaded.
fn session_capabilities(config: &ScraperConfig) -> serde_json::Map<String, Value> {
    let (width, height) = config.viewport;

    let mut chrome_args = vec![
        format!("--user-agent={}", config.user_agent),
        format!("--window-size={},{}", width, height),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--incognito".to_string(),
    ];
    let mut firefox_args = vec!["-private".to_string()];
    if config.headless {
        chrome_args.push("--headless=new".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut capabilities = serde_json::Map::new();
    capabilities.insert("pageLoadStrategy".to_string(), json!("eager"));
    capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
    capabilities.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "general.useragent.override": config.user_agent },
        }),
    );
    capabilities
}

#[async_trait]
impl PageDriver for WebDriverSession {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), Error> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn execute(&self, script: &str) -> Result<Value, Error> {
        Ok(self.client.execute(script, Vec::new()).await?)
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<(), Error> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await?;
        Ok(())
    }

    async fn find_all(&self, query: Query<'_>) -> Result<Vec<Element>, Error> {
        Ok(self.client.find_all(query.locator()).await?)
    }

    async fn is_visible(&self, element: &Element) -> Result<bool, Error> {
        Ok(element.is_displayed().await?)
    }

    async fn text(&self, element: &Element) -> Result<String, Error> {
        Ok(element.text().await?)
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, Error> {
        Ok(element.attr(name).await?)
    }

    async fn force_click(&self, element: &Element) -> Result<(), Error> {
        let handle = serde_json::to_value(element)
            .map_err(|e| Error::Render(format!("cannot reference element: {}", e)))?;
        self.client.execute(FORCE_CLICK_SCRIPT, vec![handle]).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn source(&self) -> Result<String, Error> {
        Ok(self.client.source().await?)
    }

    async fn close(&self) -> Result<(), Error> {
        self.client.clone().close().await?;
        Ok(())
    }
}
