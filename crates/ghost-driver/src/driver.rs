use crate::error::DriverError;
use crate::types::*;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// The capability set a browser context must support. One implementation
/// backs real Chromium automation; [`crate::fake::FakeBrowserDriver`] backs
/// tests and the in-process demo.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn capture_screenshot(&self, options: &ScreenshotOptions) -> Result<ScreenshotResult, DriverError>;

    async fn extract_interactive_element_index(
        &self,
        options: &AxTreeOptions,
    ) -> Result<Vec<InteractiveElement>, DriverError>;

    async fn normalized_ax_tree(&self, options: &AxTreeOptions) -> Result<NormalizedAxTree, DriverError>;

    async fn evaluate_expression(&self, expression: &str) -> Result<String, DriverError>;

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError>;

    async fn observe_post_action_settle(&self, window_ms: u64) -> Result<SettleObservation, DriverError>;

    async fn scroll_position(&self) -> Result<ScrollPosition, DriverError>;

    async fn page_signals(&self) -> Result<PageSignals, DriverError>;

    /// Broadcasts a crash signal whenever the underlying context's renderer
    /// dies out from under the driver. Subscribers never block the driver.
    fn subscribe_crash_signal(&self) -> broadcast::Receiver<CrashEvent>;
}
