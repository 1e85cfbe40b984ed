//! Chromium-backed document via the Chrome `DevTools` Protocol.
//!
//! Locators and visibility are evaluated inside the page. The nodes matched by
//! the latest resolution are kept in a page registry
//! (`window.__softAssertNodes`) so the ids handed back as [`NodeRef`]s can be
//! passed to the visibility probe. Every resolution starts a fresh registry,
//! so ids are only meaningful until the next query on the same page.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dom::{DocumentProvider, DocumentRoot, ElementSet, NodeRef};
use crate::result::{SoftAssertError, SoftAssertResult};
use crate::visibility::{VisibilityMode, VisibilityProbe};

/// Starts a fresh node registry and assigns ids in match order
const REGISTRY_JS: &str = "const reg = (window.__softAssertNodes = []); \
     const idOf = (n) => (n == null ? null : reg.push(n) - 1);";

/// Resolves once the DOM has been parsed
const READY_JS: &str = "new Promise(resolve => { \
     if (document.readyState !== 'loading') { resolve(true); } \
     else { document.addEventListener('DOMContentLoaded', () => resolve(true), { once: true }); } \
     })";

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// A launched Chromium instance
#[derive(Debug)]
pub struct Browser {
    inner: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch Chromium
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be started
    pub async fn launch(config: BrowserConfig) -> SoftAssertResult<Self> {
        let mut builder = CdpConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(page_error)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(page_error)?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a page at `url` and wrap it as a document
    ///
    /// # Errors
    ///
    /// Returns error if the page cannot be opened
    pub async fn open(&self, url: &str) -> SoftAssertResult<PageDocument> {
        let browser = self.inner.lock().await;
        let page = browser.new_page(url).await.map_err(page_error)?;
        Ok(PageDocument::new(page))
    }

    /// Close the browser
    ///
    /// # Errors
    ///
    /// Returns error if the browser does not shut down cleanly
    pub async fn close(self) -> SoftAssertResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(page_error)?;
        Ok(())
    }
}

/// A live page acting as document provider, document root and visibility
/// probe
#[derive(Debug, Clone)]
pub struct PageDocument {
    inner: Arc<Mutex<CdpPage>>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    nodes: Vec<Option<NodeRef>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisibilityResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl PageDocument {
    /// Wrap an open CDP page
    #[must_use]
    pub fn new(page: CdpPage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(page)),
        }
    }

    /// Navigate the page
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub async fn goto(&self, url: &str) -> SoftAssertResult<()> {
        let page = self.inner.lock().await;
        page.goto(url).await.map_err(page_error)?;
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, expr: String) -> SoftAssertResult<T> {
        let page = self.inner.lock().await;
        let result = page.evaluate(expr.as_str()).await.map_err(page_error)?;
        result.into_value().map_err(page_error)
    }

    async fn query(
        &self,
        locator: &str,
        script: String,
    ) -> SoftAssertResult<Vec<Option<NodeRef>>> {
        let response: QueryResponse = self.eval(script).await?;
        match response.error {
            Some(message) => Err(SoftAssertError::invalid_locator(locator, message)),
            None => Ok(response.nodes),
        }
    }
}

/// Wrap a query body with the node registry and error capture
fn query_script(body: &str) -> String {
    format!(
        "(() => {{ {REGISTRY_JS} try {{ {body} }} catch (e) {{ return {{ error: String((e && e.message) || e) }}; }} }})()"
    )
}

fn css_script(selector: &str) -> SoftAssertResult<String> {
    let literal = serde_json::to_string(selector)?;
    Ok(query_script(&format!(
        "return {{ nodes: Array.from(document.querySelectorAll({literal}), idOf) }};"
    )))
}

fn xpath_script(expression: &str) -> SoftAssertResult<String> {
    let literal = serde_json::to_string(expression)?;
    Ok(query_script(&format!(
        "const snap = document.evaluate({literal}, document, null, \
         XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
         const nodes = []; \
         for (let i = 0; i < snap.snapshotLength; ++i) {{ nodes.push(idOf(snap.snapshotItem(i))); }} \
         return {{ nodes }};"
    )))
}

fn visibility_script(elements: &ElementSet, mode: VisibilityMode) -> SoftAssertResult<String> {
    let ids = serde_json::to_string(elements.as_slice())?;
    let want = mode == VisibilityMode::Visible;
    // Same rule as jQuery `:visible`; `.is()` holds if any member matches
    Ok(format!(
        "(() => {{ const reg = window.__softAssertNodes || []; const ids = {ids}; \
         const stale = ids.filter((i) => !reg[i] || !reg[i].isConnected); \
         if (stale.length) {{ return {{ error: 'stale node ids: ' + stale.join(', ') }}; }} \
         const visible = (el) => !!(el.offsetWidth || el.offsetHeight || \
         (el.getClientRects && el.getClientRects().length)); \
         return {{ ok: ids.some((i) => visible(reg[i]) === {want}) }}; }})()"
    ))
}

#[async_trait]
impl DocumentRoot for PageDocument {
    async fn query_selector_all(&self, selector: &str) -> SoftAssertResult<Vec<Option<NodeRef>>> {
        self.query(selector, css_script(selector)?).await
    }

    async fn evaluate_xpath(&self, expression: &str) -> SoftAssertResult<Vec<NodeRef>> {
        let nodes = self.query(expression, xpath_script(expression)?).await?;
        Ok(nodes.into_iter().flatten().collect())
    }
}

#[async_trait]
impl DocumentProvider for PageDocument {
    type Root = Self;

    async fn document(&self) -> SoftAssertResult<Self> {
        let ready: bool = self.eval(READY_JS.to_string()).await.map_err(|e| {
            SoftAssertError::DocumentUnavailable {
                message: e.to_string(),
            }
        })?;
        debug!(ready, "document ready");
        Ok(self.clone())
    }
}

#[async_trait]
impl VisibilityProbe for PageDocument {
    async fn satisfies(
        &self,
        elements: &ElementSet,
        mode: VisibilityMode,
    ) -> SoftAssertResult<bool> {
        let expr = visibility_script(elements, mode)?;
        let response: VisibilityResponse =
            self.eval(expr).await.map_err(|e| SoftAssertError::VisibilityError {
                message: e.to_string(),
            })?;
        match response.error {
            Some(message) => Err(SoftAssertError::VisibilityError { message }),
            None => Ok(response.ok),
        }
    }
}

fn page_error(err: impl std::fmt::Display) -> SoftAssertError {
    SoftAssertError::PageError {
        message: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_css_script_quotes_selector() {
        let script = css_script(r#"a[title="it's"]"#).unwrap();
        assert!(script.contains(r#"document.querySelectorAll("a[title=\"it's\"]")"#));
        assert!(script.contains("window.__softAssertNodes = []"));
    }

    #[test]
    fn test_registry_restarts_per_resolution() {
        for script in [css_script(".item").unwrap(), xpath_script("//li").unwrap()] {
            assert!(script.contains("(window.__softAssertNodes = [])"));
            assert!(!script.contains("__softAssertNodes ||"));
            assert!(!script.contains("indexOf"));
        }
    }

    #[test]
    fn test_xpath_script_requests_ordered_snapshot() {
        let script = xpath_script("//div[@id='x']").unwrap();
        assert!(script.contains(r#"document.evaluate("//div[@id='x']", document"#));
        assert!(script.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        assert!(script.contains("catch (e)"));
    }

    #[test]
    fn test_visibility_script_embeds_ids_and_mode() {
        let set: ElementSet = vec![NodeRef(2), NodeRef(5)].into();
        let visible = visibility_script(&set, VisibilityMode::Visible).unwrap();
        assert!(visible.contains("const ids = [2,5];"));
        assert!(visible.contains("ok: ids.some("));
        assert!(visible.contains("=== true"));
        let hidden = visibility_script(&set, VisibilityMode::Hidden).unwrap();
        assert!(hidden.contains("=== false"));
    }

    #[test]
    fn test_visibility_script_rejects_stale_nodes() {
        let set: ElementSet = vec![NodeRef(0)].into();
        let script = visibility_script(&set, VisibilityMode::Visible).unwrap();
        assert!(script.contains("!reg[i] || !reg[i].isConnected"));
        assert!(script.contains("error: 'stale node ids: '"));
    }

    #[test]
    fn test_visibility_response_shapes() {
        let stale: VisibilityResponse =
            serde_json::from_str(r#"{"error":"stale node ids: 3"}"#).unwrap();
        assert!(!stale.ok);
        assert_eq!(stale.error.as_deref(), Some("stale node ids: 3"));
        let shown: VisibilityResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(shown.ok);
        assert!(shown.error.is_none());
    }

    #[test]
    fn test_query_response_error_shape() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"error":"The string is not a valid XPath expression."}"#)
                .unwrap();
        assert!(response.nodes.is_empty());
        assert!(response.error.is_some());
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_no_sandbox()
            .with_chromium_path("/usr/bin/chromium");
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }
}
