//! Browser-free sessions over static HTML, for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ::scraper::{Html, Selector};
use async_trait::async_trait;

use crate::app::{Result, TrackerError};
use crate::scraper::session::{Session, SessionFactory};

/// Session answering lookups from a parsed HTML document
pub struct HtmlSession {
    pages: Arc<HashMap<String, String>>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
}

impl HtmlSession {
    /// Session already sitting on `html`
    pub fn with_page(html: &str) -> Self {
        Self {
            pages: Arc::new(HashMap::new()),
            current: Some(html.to_string()),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn select<T>(&self, selector: &str, map: impl Fn(::scraper::ElementRef<'_>) -> Option<T>) -> Vec<T> {
        let Some(html) = self.current.as_ref() else {
            return Vec::new();
        };
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let found: Vec<T> = document.select(&selector).filter_map(map).collect();
        found
    }
}

#[async_trait]
impl Session for HtmlSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => Err(TrackerError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn ready_state(&self) -> Result<String> {
        Ok(if self.current.is_some() { "complete" } else { "loading" }.to_string())
    }

    async fn text(&self, selector: &str) -> Option<String> {
        self.select(selector, |el| Some(el.text().collect::<String>()))
            .into_iter()
            .next()
    }

    async fn texts(&self, selector: &str) -> Vec<String> {
        self.select(selector, |el| Some(el.text().collect::<String>()))
    }

    async fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.select(selector, |el| Some(el.value().attr(name).map(String::from)))
            .into_iter()
            .next()
            .flatten()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory handing out [`HtmlSession`]s over a fixed set of pages, counting
/// opens and closes.
#[derive(Default)]
pub struct HtmlBrowser {
    pages: Arc<HashMap<String, String>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    failing_opens: AtomicUsize,
}

impl HtmlBrowser {
    pub fn new<I, K, V>(pages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// Make the next `n` opens fail as if the browser could not launch
    pub fn fail_next_opens(self, n: usize) -> Self {
        self.failing_opens.store(n, Ordering::SeqCst);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for HtmlBrowser {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let failing = self.failing_opens.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_opens.store(failing - 1, Ordering::SeqCst);
            return Err(TrackerError::Browser("Failed to launch browser".to_string()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HtmlSession {
            pages: self.pages.clone(),
            current: None,
            closed: self.closed.clone(),
        }))
    }
}
