use async_trait::async_trait;
use tracing::{debug, warn};

use crate::app::Result;

/// A live browser session with one current page.
///
/// Lookups return `None`/empty instead of failing: a missing element is an
/// expected outcome while extracting, only navigation is a hard error.
#[async_trait]
pub trait Session: Send + Sync {
    /// Navigate the current page to `url`
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Current `document.readyState` of the page
    async fn ready_state(&self) -> Result<String>;

    /// Text of the first element matching `selector`
    async fn text(&self, selector: &str) -> Option<String>;

    /// Texts of every element matching `selector`, in document order
    async fn texts(&self, selector: &str) -> Vec<String>;

    /// Attribute `name` of the first element matching `selector`
    async fn attribute(&self, selector: &str, name: &str) -> Option<String>;

    /// Tear down the session and its browser process
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens new browser sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>>;
}

/// Owns at most one live session for the duration of a tracking call.
///
/// The session is opened lazily by [`SessionScope::live`], thrown away by
/// [`SessionScope::discard`] after a failed attempt and released by
/// [`SessionScope::close`], which callers run on every exit path.
pub struct SessionScope<'a> {
    factory: &'a dyn SessionFactory,
    session: Option<Box<dyn Session>>,
}

impl<'a> SessionScope<'a> {
    pub fn new(factory: &'a dyn SessionFactory) -> Self {
        Self {
            factory,
            session: None,
        }
    }

    /// The live session, opening one if there is none
    pub async fn live(&mut self) -> Result<&mut dyn Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                debug!("Opening browser session");
                self.factory.open().await?
            }
        };
        Ok(&mut **self.session.insert(session))
    }

    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }

    /// Tear down the live session, if any. Teardown errors are logged only.
    pub async fn discard(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Error cleaning up browser session: {}", e);
            } else {
                debug!("Browser session cleaned up");
            }
        }
    }

    /// Release the scope
    pub async fn close(mut self) {
        self.discard().await;
    }
}
