use crate::config::ScraperConfig;
use crate::crawlers::crawler::{FetchOutcome, Fetcher, ScrapeState};
use crate::crawlers::driver::{PageDriver, WebDriverSession};
use crate::crawlers::http::StaticFetcher;
use crate::crawlers::interactions;
use crate::error::Error;
use crate::parsers::{Extractor, ParseResult};
use crate::results::Strategy;
use async_trait::async_trait;
use tokio::time::timeout;

/// Renders pages in a browser, interacts with them, and extracts the result.
///
/// Any failure of the rendering sequence is recorded as a `render` error and
/// the page is handed to the `fallback` fetcher with the state gathered so far.
#[derive(Debug, Clone)]
pub struct InteractiveRenderer<F = StaticFetcher> {
    config: ScraperConfig,
    fallback: F,
}

impl<F: Fetcher> InteractiveRenderer<F> {
    pub fn new(config: ScraperConfig, fallback: F) -> Self {
        Self { config, fallback }
    }

    /// Opens a browser session, renders `url` in it and always closes it
    async fn render(&self, url: &str, state: &mut ScrapeState) -> Result<ParseResult, Error> {
        let session = WebDriverSession::connect(&self.config).await?;
        render_in_session(&session, &self.config, url, state).await
    }
}

/// Runs the full rendering sequence on `driver`, bounded by the overall
/// render timeout, and releases the session on every path.
///
/// Closing is bounded by the session timeout.
pub async fn render_in_session<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    url: &str,
    state: &mut ScrapeState,
) -> Result<ParseResult, Error> {
    let rendered = match timeout(config.render_timeout(), render_page(driver, config, url, state)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "rendering {} took longer than {} seconds",
            url, config.render_timeout_secs
        ))),
    };

    match timeout(config.session_timeout(), driver.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => ::log::warn!("Failed to close browser session for {}: {}", url, e),
        Err(_) => ::log::warn!(
            "Closing the browser session for {} took longer than {} ms",
            url, config.session_timeout_ms
        ),
    }

    rendered
}

/// Navigate, settle, clean up, interact, then extract the rendered HTML
async fn render_page<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    url: &str,
    state: &mut ScrapeState,
) -> Result<ParseResult, Error> {
    let start = std::time::Instant::now();
    ::log::info!("Rendering: {}", url);

    match timeout(config.navigation_timeout(), driver.goto(url)).await {
        Ok(navigated) => navigated?,
        Err(_) => {
            return Err(Error::Timeout(format!(
                "navigation to {} after {} ms",
                url, config.navigation_timeout_ms
            )));
        }
    }

    interactions::wait_for_page_ready(driver, config).await;

    if let Err(e) = interactions::remove_noise(driver, config).await {
        ::log::debug!("Noise removal failed on {}: {}", url, e);
    }

    if let Err(e) = interactions::scroll_page(driver, config, &mut state.interactions).await {
        ::log::warn!("Scrolling {} stopped: {}", url, e);
        state.record(&e);
    }

    interactions::click_elements(driver, config, &mut state.interactions).await;

    if let Err(e) = interactions::follow_pagination(driver, config, &mut state.interactions).await {
        ::log::warn!("Pagination on {} failed: {}", url, e);
        state.record(&e);
    }

    ::log::debug!(
        "After interactions - clicks: {}, scrolls: {}, pages: {}",
        state.interactions.clicks.len(),
        state.interactions.scrolls,
        state.interactions.pages.len()
    );

    let html = driver.source().await?;
    let parsed = Extractor::new(url, config).extract(&html);

    ::log::debug!(
        "Rendered {} into {} sections in {:.2} seconds",
        url,
        parsed.sections.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(parsed)
}

#[async_trait]
impl<F: Fetcher> Fetcher for InteractiveRenderer<F> {
    fn strategy(&self) -> Strategy {
        Strategy::Js
    }

    async fn fetch(&self, url: &str, mut state: ScrapeState) -> FetchOutcome {
        match self.render(url, &mut state).await {
            Ok(parsed) => FetchOutcome::from_parse(parsed, Strategy::Js, state),
            Err(e) => {
                ::log::error!("Rendering {} failed: {}", url, e);
                state.record(&Error::Render(e.to_string()));
                ::log::info!("Falling back to {} fetch for {}", self.fallback.strategy(), url);
                self.fallback.fetch(url, state).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::testing::{DEAD_URL, FakeElement, ScriptedPage, serve, silent_listener};
    use crate::error::Phase;
    use crate::results::SectionType;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const RENDERED: &str = r#"
        <html lang="en"><head><title>Rendered</title></head><body>
            <header><h1>Hero</h1></header>
            <section><h2>Loaded later</h2><p>Appeared after clicking</p></section>
        </body></html>
    "#;

    fn fast_config() -> ScraperConfig {
        ScraperConfig {
            scroll_delay_ms: 0,
            settle_delay_ms: 0,
            click_delay_ms: 0,
            max_scrolls: 2,
            webdriver_url: DEAD_URL.to_string(),
            webdriver_fallbacks: Vec::new(),
            ..ScraperConfig::default()
        }
    }

    #[tokio::test]
    async fn test_render_sequence_extracts_rendered_html() {
        let page = ScriptedPage {
            elements: vec![FakeElement::new(&["button"], "Load more")],
            ..ScriptedPage::new("https://example.com/", RENDERED)
        };
        let mut state = ScrapeState::default();

        let parsed = render_in_session(&page, &fast_config(), "https://example.com/", &mut state)
            .await
            .unwrap();

        assert_eq!(parsed.meta.title, "Rendered");
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[0].section_type, SectionType::Hero);
        assert_eq!(state.interactions.scrolls, 2);
        assert_eq!(state.interactions.clicks.len(), 1);
        assert!(state.errors.is_empty());
        assert!(page.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_session_is_closed_when_navigation_fails() {
        let page = ScriptedPage {
            fail_goto: true,
            ..ScriptedPage::new("https://example.com/", RENDERED)
        };
        let mut state = ScrapeState::default();

        let result = render_in_session(&page, &fast_config(), "https://example.com/", &mut state).await;

        assert!(result.is_err());
        assert!(page.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scroll_errors_do_not_stop_rendering() {
        let page = ScriptedPage {
            fail_scroll: true,
            ..ScriptedPage::new("https://example.com/", RENDERED)
        };
        let mut state = ScrapeState::default();

        let parsed = render_in_session(&page, &fast_config(), "https://example.com/", &mut state)
            .await
            .unwrap();

        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].phase, Phase::Scroll);
    }

    #[tokio::test]
    async fn test_unreachable_browser_falls_back_to_static() {
        let url = serve(200, RENDERED).await;
        let config = fast_config();
        let renderer = InteractiveRenderer::new(config.clone(), StaticFetcher::new(config));

        let outcome = renderer.fetch(&url, ScrapeState::default()).await;

        assert_eq!(outcome.strategy, Strategy::Static);
        assert_eq!(outcome.sections.len(), 2);
        assert_eq!(outcome.state.errors.len(), 1);
        assert_eq!(outcome.state.errors[0].phase, Phase::Render);
    }

    #[tokio::test]
    async fn test_fallback_keeps_errors_in_order() {
        let config = fast_config();
        let renderer = InteractiveRenderer::new(config.clone(), StaticFetcher::new(config));

        let outcome = renderer.fetch(DEAD_URL, ScrapeState::default()).await;

        assert_eq!(outcome.strategy, Strategy::Static);
        assert!(outcome.sections.is_empty());
        let phases: Vec<Phase> = outcome.state.errors.iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![Phase::Render, Phase::Fetch]);
    }

    #[tokio::test]
    async fn test_silent_webdriver_does_not_stall_the_scrape() {
        let webdriver_url = silent_listener().await;
        let config = ScraperConfig {
            webdriver_url,
            session_timeout_ms: 200,
            request_timeout_secs: 2,
            ..fast_config()
        };
        let renderer = InteractiveRenderer::new(config.clone(), StaticFetcher::new(config));

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            renderer.fetch(DEAD_URL, ScrapeState::default()),
        )
        .await
        .expect("scrape should finish despite a silent WebDriver");

        assert_eq!(outcome.strategy, Strategy::Static);
        let phases: Vec<Phase> = outcome.state.errors.iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![Phase::Render, Phase::Fetch]);
        assert!(outcome.state.errors[0].message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_hanging_close_is_bounded() {
        let page = ScriptedPage {
            hang_close: true,
            ..ScriptedPage::new("https://example.com/", RENDERED)
        };
        let config = ScraperConfig {
            session_timeout_ms: 50,
            ..fast_config()
        };
        let mut state = ScrapeState::default();

        let parsed = tokio::time::timeout(
            Duration::from_secs(5),
            render_in_session(&page, &config, "https://example.com/", &mut state),
        )
        .await
        .expect("closing should be bounded")
        .unwrap();

        assert_eq!(parsed.sections.len(), 2);
    }

    #[tokio::test]
    async fn test_scraped_page_is_recorded_once() {
        let page = ScriptedPage {
            elements: vec![
                FakeElement::new(&[r#"a[rel="next"]"#], "Next").with_href("/"),
                FakeElement::new(&[r#"a[rel="next"]"#], "2").with_href("/?page=2"),
            ],
            ..ScriptedPage::new("https://example.com/", RENDERED)
        };
        let mut state = ScrapeState::for_url("https://example.com/");

        render_in_session(&page, &fast_config(), "https://example.com/", &mut state)
            .await
            .unwrap();

        assert_eq!(
            state.interactions.pages,
            vec!["https://example.com/", "https://example.com/?page=2"]
        );
    }
}
