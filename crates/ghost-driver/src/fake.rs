use crate::driver::BrowserDriver;
use crate::error::DriverError;
use crate::types::*;
use async_trait::async_trait;
use ghost_core_types::ContextId;
use parking_lot::Mutex;
use tokio::sync::broadcast;

struct FakeState {
    current_url: String,
    ax_tree: NormalizedAxTree,
    interactive_elements: Vec<InteractiveElement>,
    scroll: ScrollPosition,
    screenshot: Vec<u8>,
    settle: SettleObservation,
    crashed: bool,
    executed_actions: Vec<Action>,
    navigated_urls: Vec<String>,
    eval_result: String,
    page_signals: PageSignals,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            current_url: "about:blank".to_string(),
            ax_tree: NormalizedAxTree::default(),
            interactive_elements: Vec::new(),
            scroll: ScrollPosition { scroll_y: 0.0, viewport_height: 900.0, document_height: 900.0 },
            screenshot: Vec::new(),
            settle: SettleObservation::default(),
            crashed: false,
            executed_actions: Vec::new(),
            navigated_urls: Vec::new(),
            eval_result: "null".to_string(),
            page_signals: PageSignals { is_load_complete: true, has_significant_visual_content: true },
        }
    }
}

/// A scriptable in-memory [`BrowserDriver`] used by perception-loop tests
/// and the `run-demo` CLI command. Every observable call is recorded so
/// tests can assert on call order without a real browser.
pub struct FakeBrowserDriver {
    context_id: ContextId,
    state: Mutex<FakeState>,
    crash_tx: broadcast::Sender<CrashEvent>,
}

impl FakeBrowserDriver {
    pub fn new(context_id: ContextId) -> Self {
        let (crash_tx, _) = broadcast::channel(16);
        Self {
            context_id,
            state: Mutex::new(FakeState::default()),
            crash_tx,
        }
    }

    pub fn set_ax_tree(&self, tree: NormalizedAxTree) {
        self.state.lock().ax_tree = tree;
    }

    pub fn set_interactive_elements(&self, elements: Vec<InteractiveElement>) {
        self.state.lock().interactive_elements = elements;
    }

    pub fn set_scroll_position(&self, scroll: ScrollPosition) {
        self.state.lock().scroll = scroll;
    }

    pub fn set_settle_observation(&self, settle: SettleObservation) {
        self.state.lock().settle = settle;
    }

    pub fn set_screenshot(&self, bytes: Vec<u8>) {
        self.state.lock().screenshot = bytes;
    }

    pub fn set_evaluate_result(&self, json: impl Into<String>) {
        self.state.lock().eval_result = json.into();
    }

    pub fn set_page_signals(&self, signals: PageSignals) {
        self.state.lock().page_signals = signals;
    }

    pub fn executed_actions(&self) -> Vec<Action> {
        self.state.lock().executed_actions.clone()
    }

    pub fn navigated_urls(&self) -> Vec<String> {
        self.state.lock().navigated_urls.clone()
    }

    /// Simulates the renderer dying. Subsequent calls fail with a CDP error
    /// until the driver is replaced (mirrors context destruction).
    pub fn trigger_crash(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.state.lock().crashed = true;
        let _ = self.crash_tx.send(CrashEvent { context_id: self.context_id.clone(), reason });
    }

    fn check_crashed(&self) -> Result<(), DriverError> {
        if self.state.lock().crashed {
            Err(DriverError::cdp("context crashed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowserDriver {
    async fn navigate(&self, url: &str, _timeout_ms: u64) -> Result<(), DriverError> {
        self.check_crashed()?;
        let mut state = self.state.lock();
        state.current_url = url.to_string();
        state.navigated_urls.push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().current_url.clone())
    }

    async fn capture_screenshot(&self, _options: &ScreenshotOptions) -> Result<ScreenshotResult, DriverError> {
        self.check_crashed()?;
        Ok(ScreenshotResult { bytes: self.state.lock().screenshot.clone(), truncated: false })
    }

    async fn extract_interactive_element_index(
        &self,
        _options: &AxTreeOptions,
    ) -> Result<Vec<InteractiveElement>, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().interactive_elements.clone())
    }

    async fn normalized_ax_tree(&self, options: &AxTreeOptions) -> Result<NormalizedAxTree, DriverError> {
        self.check_crashed()?;
        let mut tree = self.state.lock().ax_tree.clone();
        let budget = options.char_budget;
        let approx_len: usize = tree.nodes.iter().map(|n| n.name.len() + n.role.len() + 16).sum();
        if approx_len > budget {
            tree.truncated = true;
        }
        Ok(tree)
    }

    async fn evaluate_expression(&self, _expression: &str) -> Result<String, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().eval_result.clone())
    }

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
        self.check_crashed()?;
        let mut state = self.state.lock();
        if let Action::Scroll { delta_px } = action {
            let max_y = (state.scroll.document_height - state.scroll.viewport_height).max(0.0);
            state.scroll.scroll_y = (state.scroll.scroll_y + *delta_px as f64).clamp(0.0, max_y);
        }
        state.executed_actions.push(action.clone());
        match action {
            Action::Failed { reason } => Ok(ActionOutcome::failed(reason.clone())),
            _ => Ok(ActionOutcome::ok()),
        }
    }

    async fn observe_post_action_settle(&self, _window_ms: u64) -> Result<SettleObservation, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().settle)
    }

    async fn scroll_position(&self) -> Result<ScrollPosition, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().scroll)
    }

    async fn page_signals(&self) -> Result<PageSignals, DriverError> {
        self.check_crashed()?;
        Ok(self.state.lock().page_signals)
    }

    fn subscribe_crash_signal(&self) -> broadcast::Receiver<CrashEvent> {
        self.crash_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, role: &str) -> AxNode {
        AxNode {
            node_id: id,
            role: role.to_string(),
            name: format!("node-{id}"),
            value: None,
            description: None,
            states: vec![],
            bounding_box: None,
        }
    }

    #[tokio::test]
    async fn navigate_records_url_and_updates_current() {
        let driver = FakeBrowserDriver::new(ContextId::new());
        driver.navigate("https://example.com", 5000).await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://example.com");
        assert_eq!(driver.navigated_urls(), vec!["https://example.com".to_string()]);
    }

    #[tokio::test]
    async fn crashed_driver_fails_every_call() {
        let driver = FakeBrowserDriver::new(ContextId::new());
        let mut crash_rx = driver.subscribe_crash_signal();
        driver.trigger_crash("renderer died");
        let err = driver.navigate("https://example.com", 5000).await.unwrap_err();
        assert_eq!(err.kind(), ghost_core_types::GhostErrorKind::Cdp);
        let event = crash_rx.recv().await.unwrap();
        assert_eq!(event.reason, "renderer died");
    }

    #[tokio::test]
    async fn scroll_action_clamps_to_document_height() {
        let driver = FakeBrowserDriver::new(ContextId::new());
        driver.set_scroll_position(ScrollPosition { scroll_y: 0.0, viewport_height: 900.0, document_height: 1200.0 });
        driver.execute_action(&Action::Scroll { delta_px: 800 }).await.unwrap();
        let pos = driver.scroll_position().await.unwrap();
        assert_eq!(pos.scroll_y, 300.0);
    }

    #[tokio::test]
    async fn ax_tree_truncates_when_over_budget() {
        let driver = FakeBrowserDriver::new(ContextId::new());
        let nodes: Vec<AxNode> = (0..50).map(|i| node(i, "button")).collect();
        driver.set_ax_tree(NormalizedAxTree { nodes, truncated: false });
        let tree = driver.normalized_ax_tree(&AxTreeOptions { char_budget: 100 }).await.unwrap();
        assert!(tree.truncated);
    }
}
