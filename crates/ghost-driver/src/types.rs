use ghost_core_types::ContextId;

/// Where a full-page screenshot captures from, and how it tiles across
/// scroll steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotMode {
    Viewport,
    FullPage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenshotClip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotOptions {
    pub mode: ScreenshotMode,
    pub clip: Option<ScreenshotClip>,
    pub quality: u8,
    pub from_surface: bool,
    pub scroll_step_px: u32,
    pub max_scroll_steps: u32,
    pub scroll_settle_ms: Option<u64>,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            mode: ScreenshotMode::Viewport,
            clip: None,
            quality: 80,
            from_surface: true,
            scroll_step_px: 800,
            max_scroll_steps: 8,
            scroll_settle_ms: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    pub bytes: Vec<u8>,
    /// Set when full-page capture hit `max_scroll_steps` before reaching the
    /// bottom of the document.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Interactive ARIA roles recognized by Tier 1 perception. Anything else is
/// pruned from the normalized tree.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "textbox",
    "combobox",
    "checkbox",
    "radio",
    "menuitem",
    "tab",
    "searchbox",
    "spinbutton",
    "slider",
    "switch",
];

/// Roles stripped from the normalized AX tree regardless of interactivity.
pub const PRUNED_ROLES: &[&str] = &["generic", "none", "presentation", "InlineTextBox"];

pub fn is_interactive_role(role: &str) -> bool {
    INTERACTIVE_ROLES.contains(&role)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxNode {
    pub node_id: u64,
    pub role: String,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub states: Vec<String>,
    pub bounding_box: Option<BoundingBox>,
}

impl AxNode {
    pub fn is_interactive(&self) -> bool {
        is_interactive_role(&self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxTreeOptions {
    pub char_budget: usize,
}

impl Default for AxTreeOptions {
    fn default() -> Self {
        Self { char_budget: 8000 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedAxTree {
    pub nodes: Vec<AxNode>,
    /// True when the char budget forced dropping non-interactive nodes.
    pub truncated: bool,
}

impl NormalizedAxTree {
    pub fn interactive_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_interactive()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveElement {
    pub node_id: u64,
    pub role: String,
    pub name: String,
    pub bounding_box: Option<BoundingBox>,
}

/// Where an action targets, when it targets anything at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    NodeId(u64),
    Point { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click { target: ActionTarget },
    Type { target: Option<ActionTarget>, text: String },
    Scroll { delta_px: i32 },
    Wait { ms: u64 },
    Extract,
    Done,
    Failed { reason: String },
}

impl Action {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Done | Action::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MutationSummary {
    pub added_or_removed_node_count: u32,
    pub interactive_role_mutation_count: u32,
}

impl MutationSummary {
    /// `addedOrRemovedNodeCount >= 3 OR interactiveRoleMutationCount > 0`.
    pub fn is_significant(&self) -> bool {
        self.added_or_removed_node_count >= 3 || self.interactive_role_mutation_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SettleObservation {
    pub navigation_occurred: bool,
    pub mutation_summary: MutationSummary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollPosition {
    pub fn is_below_fold(&self) -> bool {
        self.scroll_y + self.viewport_height < self.document_height
    }
}

#[derive(Debug, Clone)]
pub struct CrashEvent {
    pub context_id: ContextId,
    pub reason: String,
}

/// Page-level signals the loop uses for tier routing. Computing
/// `has_significant_visual_content` is driver-dependent and out of scope
/// for this facade; drivers that cannot determine it should report `true`
/// conservatively so AX-deficient escalation still fires.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageSignals {
    pub is_load_complete: bool,
    pub has_significant_visual_content: bool,
}
