use crate::config::ScraperConfig;
use crate::crawlers::driver::{PageDriver, Query};
use crate::error::Error;
use crate::filter;
use crate::results::{Click, Interactions};
use crate::utils::{take_chars, utc_timestamp};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use url::Url;

pub(crate) const READY_STATE_SCRIPT: &str = "return document.readyState;";
pub(crate) const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";
pub(crate) const SCROLL_POSITION_SCRIPT: &str =
    "return [window.pageYOffset + window.innerHeight, document.body.scrollHeight];";

/// Cookie and consent prompts, matched by id, class or aria-label
const CONSENT_SELECTORS: [&str; 6] = [
    r#"[id*="cookie"]"#,
    r#"[class*="cookie"]"#,
    r#"[aria-label*="cookie"]"#,
    r#"[id*="consent"]"#,
    r#"[class*="consent"]"#,
    r#"[aria-label*="consent"]"#,
];

/// Click candidates, in the order they are tried
pub const CLICK_TARGETS: [Query<'static>; 9] = [
    Query::Css("button"),
    Query::Css("a"),
    Query::Css(r#"[role="button"]"#),
    Query::Css("[aria-expanded]"),
    Query::XPath("//button[contains(normalize-space(.), 'More')]"),
    Query::XPath("//button[contains(normalize-space(.), 'Load')]"),
    Query::XPath("//button[contains(normalize-space(.), 'Show')]"),
    Query::XPath("//button[contains(normalize-space(.), 'View')]"),
    Query::XPath("//button[contains(normalize-space(.), 'Next')]"),
];

/// Controls that lead to the following page of a listing
pub const PAGINATION_TARGETS: [Query<'static>; 4] = [
    Query::Css(r#"a[rel="next"]"#),
    Query::Css(r#"a[aria-label*="next" i]"#),
    Query::XPath("//a[normalize-space(.)='Next' or normalize-space(.)='Next page']"),
    Query::XPath("//a[normalize-space(.)='›' or normalize-space(.)='»']"),
];

/// Minimum visible text length for a click candidate
const MIN_CLICK_TEXT: usize = 2;
/// Characters of text used in the dedup key
const KEY_TEXT_CHARS: usize = 30;
/// Characters of text kept in a click record
const RECORD_TEXT_CHARS: usize = 50;
/// Interval between readiness polls
const READY_POLL: Duration = Duration::from_millis(100);

/// Logs a best-effort step's failure and discards it
fn best_effort<T>(step: &str, result: Result<T, Error>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            ::log::debug!("Ignoring failed {}: {}", step, e);
            None
        }
    }
}

/// Bounds a step with a timeout, turning expiry into [`Error::Timeout`]
async fn bounded<T>(
    what: &str,
    limit: Duration,
    step: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match timeout(limit, step).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("{} after {} ms", what, limit.as_millis()))),
    }
}

/// Polls `document.readyState` until it reports `complete`
async fn wait_until_complete<D: PageDriver>(driver: &D) -> Result<(), Error> {
    loop {
        if driver.execute(READY_STATE_SCRIPT).await? == Value::from("complete") {
            return Ok(());
        }
        sleep(READY_POLL).await;
    }
}

/// Waits for readiness, a body and an interactive element, then pauses.
///
/// Every wait is bounded on its own and its failure is ignored.
pub async fn wait_for_page_ready<D: PageDriver>(driver: &D, config: &ScraperConfig) {
    best_effort(
        "document readiness wait",
        bounded(
            "document readiness",
            Duration::from_millis(config.ready_timeout_ms),
            wait_until_complete(driver),
        )
        .await,
    );

    best_effort(
        "body wait",
        driver
            .wait_for("body", Duration::from_millis(config.body_timeout_ms))
            .await,
    );

    best_effort(
        "interactive element wait",
        driver
            .wait_for("button, a", Duration::from_millis(config.interactive_timeout_ms))
            .await,
    );

    sleep(config.settle_delay()).await;
}

/// Script removing every element matching any of `selectors`
fn removal_script(selectors: &[&str]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        "const selectors = {};\n\
         let removed = 0;\n\
         for (const sel of selectors) {{\n\
           try {{ document.querySelectorAll(sel).forEach(el => {{ el.remove(); removed++; }}); }} catch (e) {{}}\n\
         }}\n\
         return removed;",
        list
    )
}

/// Removes consent prompts and configured noise elements.
///
/// Returns how many elements were removed.
pub async fn remove_noise<D: PageDriver>(driver: &D, config: &ScraperConfig) -> Result<u64, Error> {
    let mut selectors: Vec<&str> = CONSENT_SELECTORS.to_vec();
    selectors.extend(config.noise_selectors.iter().map(String::as_str));

    let removed = driver.execute(&removal_script(&selectors)).await?;
    let removed = removed.as_u64().unwrap_or(0);
    ::log::debug!("Removed {} noise elements", removed);
    Ok(removed)
}

/// Reads `[viewport bottom, document height]`
async fn scroll_position<D: PageDriver>(driver: &D) -> Result<(f64, f64), Error> {
    let value = driver.execute(SCROLL_POSITION_SCRIPT).await?;
    let number = |i: usize| value.get(i).and_then(Value::as_f64);
    match (number(0), number(1)) {
        (Some(position), Some(height)) => Ok((position, height)),
        _ => Err(Error::Scroll(format!("unexpected scroll position {}", value))),
    }
}

/// Scrolls to the bottom up to `max_scrolls` times, stopping once the
/// viewport reaches the end of the document
pub async fn scroll_page<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    interactions: &mut Interactions,
) -> Result<(), Error> {
    for i in 0..config.max_scrolls {
        driver
            .execute(SCROLL_TO_BOTTOM_SCRIPT)
            .await
            .map_err(|e| Error::Scroll(e.to_string()))?;

        interactions.scrolls += 1;
        ::log::debug!("Scroll #{} completed", i + 1);

        sleep(config.scroll_delay()).await;

        let (position, height) = scroll_position(driver)
            .await
            .map_err(|e| match e {
                Error::Scroll(_) => e,
                other => Error::Scroll(other.to_string()),
            })?;

        if position >= height {
            ::log::debug!("Reached bottom of page after {} scrolls", i + 1);
            break;
        }
    }
    Ok(())
}

/// Attempts one click; `Ok(None)` means the element was not eligible
async fn try_click<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    query: Query<'_>,
    element: &D::Element,
    clicked: &mut HashSet<String>,
) -> Result<Option<Click>, Error> {
    if !driver.is_visible(element).await? {
        return Ok(None);
    }

    let text = driver.text(element).await?.trim().to_string();
    if text.chars().count() < MIN_CLICK_TEXT {
        return Ok(None);
    }

    let element_id = driver.attr(element, "id").await?.unwrap_or_default();
    let key = format!(
        "{}-{}-{}",
        query.as_str(),
        take_chars(&text, KEY_TEXT_CHARS),
        element_id
    );
    if clicked.contains(&key) {
        return Ok(None);
    }

    bounded("click", config.click_timeout(), driver.force_click(element)).await?;
    clicked.insert(key);

    Ok(Some(Click {
        text: take_chars(&text, RECORD_TEXT_CHARS),
        selector: query.as_str().to_string(),
        element_id: (!element_id.is_empty()).then_some(element_id),
        timestamp: utc_timestamp(),
    }))
}

/// Clicks the first few eligible matches of every click target.
///
/// Failures of single elements or selectors are skipped; this never fails.
pub async fn click_elements<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    interactions: &mut Interactions,
) {
    let mut clicked = HashSet::new();

    for query in CLICK_TARGETS {
        let elements = match driver.find_all(query).await {
            Ok(elements) => elements,
            Err(e) => {
                ::log::debug!("Error with selector {}: {}", query.as_str(), e);
                continue;
            }
        };
        ::log::trace!("Found {} elements for selector: {}", elements.len(), query.as_str());

        for element in elements.iter().take(config.max_clicks_per_selector) {
            match try_click(driver, config, query, element, &mut clicked).await {
                Ok(Some(click)) => {
                    ::log::debug!("Clicked: {}", click.text);
                    interactions.clicks.push(click);
                    sleep(config.click_delay()).await;
                }
                Ok(None) => {}
                Err(e) => ::log::debug!("Failed to click element: {}", e),
            }
        }
    }

    ::log::info!("Total clicks performed: {}", interactions.clicks.len());
}

/// Records the absolute URLs of visible "next page" links, up to `max_pages`
pub async fn follow_pagination<D: PageDriver>(
    driver: &D,
    config: &ScraperConfig,
    interactions: &mut Interactions,
) -> Result<(), Error> {
    let current = driver.current_url().await?;
    let base = Url::parse(&current).map_err(|e| Error::Pagination(e.to_string()))?;
    let mut discovered = 0;

    'targets: for query in PAGINATION_TARGETS {
        let Some(elements) = best_effort("pagination lookup", driver.find_all(query).await) else {
            continue;
        };

        for element in &elements {
            if discovered >= config.max_pages {
                break 'targets;
            }

            if !best_effort("visibility check", driver.is_visible(element).await).unwrap_or(false) {
                continue;
            }

            let Some(Some(href)) = best_effort("href lookup", driver.attr(element, "href").await)
            else {
                continue;
            };

            let page = filter::absolutize(&base, &href);
            if page.is_empty() || page == current || interactions.pages.contains(&page) {
                continue;
            }

            ::log::debug!("Discovered next page: {}", page);
            interactions.pages.push(page);
            discovered += 1;
        }
    }

    Ok(())
}
