use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::scraper::number::parse_count;
use crate::scraper::session::Session;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Stand-in deadline for timeouts too large to add to the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Poll `document.readyState` until the page reports `complete`.
///
/// A timeout is not an error: extraction proceeds on whatever has rendered.
/// The settle delay only runs once the page reported ready.
pub async fn wait_for_page_load(session: &dyn Session, timeout: Duration, settle: Duration) {
    let deadline = deadline_after(timeout);
    loop {
        if let Ok(state) = session.ready_state().await {
            if state == "complete" {
                sleep(settle).await;
                return;
            }
        }
        if Instant::now() >= deadline {
            warn!("Page load timeout, continuing anyway");
            return;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait up to `timeout` for `selector` to match, returning its text.
/// Checks at least once even with a zero timeout.
pub async fn wait_for_text(session: &dyn Session, selector: &str, timeout: Duration) -> Option<String> {
    let deadline = deadline_after(timeout);
    loop {
        if let Some(text) = session.text(selector).await {
            return Some(text);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Text of the first selector in `selectors` that matches an element and
/// passes `accept`. Selectors are tried in priority order.
pub async fn first_text<F>(session: &dyn Session, selectors: &[&str], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    for selector in selectors {
        if let Some(text) = session.text(selector).await {
            let text = text.trim();
            if accept(text) {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Count taken from the first selector whose first keyword-bearing element
/// parses to a non-zero value.
///
/// Within a selector only the first element mentioning a keyword is parsed;
/// a zero from it moves on to the next selector.
pub async fn keyword_count(session: &dyn Session, selectors: &[&str], keywords: &[&str]) -> Option<u64> {
    for selector in selectors {
        let hit = session
            .texts(selector)
            .await
            .into_iter()
            .map(|t| t.trim().to_string())
            .find(|t| contains_keyword(t, keywords));

        if let Some(text) = hit {
            let count = parse_count(&text);
            if count > 0 {
                return Some(count);
            }
        }
    }
    None
}

/// Case-insensitive keyword test
pub fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Non-empty predicate for [`first_text`]
pub fn non_empty(text: &str) -> bool {
    !text.is_empty()
}

/// Accept-anything predicate for [`first_text`]
pub fn present(_text: &str) -> bool {
    true
}
