//! In-memory page and HTTP responder for exercising the fetch paths offline.

use crate::crawlers::driver::{PageDriver, Query};
use crate::crawlers::interactions::{READY_STATE_SCRIPT, SCROLL_POSITION_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT};
use crate::error::Error;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// An element on a [`ScriptedPage`]
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    /// Queries (CSS or XPath strings) this element is returned for
    pub matches: Vec<&'static str>,
    pub visible: bool,
    pub text: String,
    pub id: Option<String>,
    pub href: Option<String>,
    pub fail_click: bool,
}

impl FakeElement {
    pub fn new(matches: &[&'static str], text: &str) -> Self {
        Self {
            matches: matches.to_vec(),
            visible: true,
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_click = true;
        self
    }
}

/// A page whose behavior is fixed up front
#[derive(Debug, Default)]
pub struct ScriptedPage {
    pub url: String,
    pub html: String,
    pub elements: Vec<FakeElement>,
    /// Scrolls needed before the viewport reaches the bottom; `None` never does
    pub bottom_after: Option<u32>,
    pub fail_goto: bool,
    pub fail_scroll: bool,
    /// `close` never returns
    pub hang_close: bool,
    pub scrolls: AtomicU32,
    pub clicked: Mutex<Vec<usize>>,
    pub scripts: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl ScriptedPage {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn clicked(&self) -> Vec<usize> {
        self.clicked.lock().unwrap().clone()
    }

    fn element(&self, index: usize) -> &FakeElement {
        &self.elements[index]
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    type Element = usize;

    async fn goto(&self, url: &str) -> Result<(), Error> {
        if self.fail_goto {
            return Err(Error::Render(format!("navigation to {} failed", url)));
        }
        Ok(())
    }

    async fn execute(&self, script: &str) -> Result<Value, Error> {
        self.scripts.lock().unwrap().push(script.to_string());

        if script == READY_STATE_SCRIPT {
            return Ok(json!("complete"));
        }
        if script == SCROLL_TO_BOTTOM_SCRIPT {
            if self.fail_scroll {
                return Err(Error::Render("javascript error: scroll blocked".to_string()));
            }
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            return Ok(Value::Null);
        }
        if script == SCROLL_POSITION_SCRIPT {
            let done = self.scrolls.load(Ordering::SeqCst);
            let reached = self.bottom_after.is_some_and(|n| done >= n);
            return Ok(if reached { json!([2000.0, 2000.0]) } else { json!([1080.0, 2000.0]) });
        }
        Ok(json!(0))
    }

    async fn wait_for(&self, _css: &str, _timeout: Duration) -> Result<(), Error> {
        Ok(())
    }

    async fn find_all(&self, query: Query<'_>) -> Result<Vec<usize>, Error> {
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches.iter().any(|m| *m == query.as_str()))
            .map(|(i, _)| i)
            .collect())
    }

    async fn is_visible(&self, element: &usize) -> Result<bool, Error> {
        Ok(self.element(*element).visible)
    }

    async fn text(&self, element: &usize) -> Result<String, Error> {
        Ok(self.element(*element).text.clone())
    }

    async fn attr(&self, element: &usize, name: &str) -> Result<Option<String>, Error> {
        let element = self.element(*element);
        Ok(match name {
            "id" => element.id.clone(),
            "href" => element.href.clone(),
            _ => None,
        })
    }

    async fn force_click(&self, element: &usize) -> Result<(), Error> {
        if self.element(*element).fail_click {
            return Err(Error::Render("element click intercepted".to_string()));
        }
        self.clicked.lock().unwrap().push(*element);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        Ok(self.url.clone())
    }

    async fn source(&self) -> Result<String, Error> {
        Ok(self.html.clone())
    }

    async fn close(&self) -> Result<(), Error> {
        if self.hang_close {
            std::future::pending::<()>().await;
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves `body` with `status` to every connection; returns the page URL
pub async fn serve(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/page", addr)
}

/// Accepts connections and never answers them; returns the base URL
pub async fn silent_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}

/// A URL nothing listens on
pub const DEAD_URL: &str = "http://127.0.0.1:1/";
