use crate::config::PerceptionConfig;
use crate::dom_bypass;
use crate::model::*;
use crate::reasoner::{Tier1Reasoner, Tier2Reasoner};
use ghost_core_types::{GhostErrorKind, Tier};
use ghost_driver::{Action, ActionOutcome, AxTreeOptions, BrowserDriver, NormalizedAxTree};
use ghost_task_state::{TaskState, TaskStateMachine};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives one task attempt through the nine-step perceive-infer-act
/// iteration described for component C5, appending a [`StepRecord`] and
/// updating [`TierUsage`] on every loop.
pub struct PerceptionLoop {
    driver: Arc<dyn BrowserDriver>,
    tier1: Arc<dyn Tier1Reasoner>,
    tier2: Arc<dyn Tier2Reasoner>,
    config: PerceptionConfig,
}

impl PerceptionLoop {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        tier1: Arc<dyn Tier1Reasoner>,
        tier2: Arc<dyn Tier2Reasoner>,
        config: PerceptionConfig,
    ) -> Self {
        Self { driver, tier1, tier2, config }
    }

    pub async fn run(&self, intent: &str, start_url: Option<&str>, max_steps: u32) -> LoopOutcome {
        let mut state = TaskStateMachine::new(ghost_core_types::TaskId::new());
        let mut history: Vec<StepRecord> = Vec::new();
        let mut escalations: Vec<EscalationEvent> = Vec::new();
        let mut tier_usage = TierUsage::default();
        let mut cached_ax_tree: Option<NormalizedAxTree> = None;
        let mut refetch_reason = RefetchReason::Initial;
        let mut no_progress_streak: u32 = 0;
        let mut scroll_steps_taken: u32 = 0;

        if state.transition(TaskState::Loading, 0, start_url.map(str::to_string), "start").is_err() {
            return self.failure(history, escalations, tier_usage, "illegal initial transition");
        }
        if let Some(url) = start_url {
            if let Err(err) = self.driver.navigate(url, 30_000).await {
                warn!(target: "loop", %err, "navigate failed");
                let _ = state.transition(TaskState::Failed, 0, Some(url.to_string()), err.to_string());
                return self.failure(history, escalations, tier_usage, err.to_string());
            }
        }

        for step in 0..max_steps {
            if state.transition(TaskState::Perceiving, step, None, "perceive").is_err() {
                return self.failure(history, escalations, tier_usage, "illegal transition to perceiving");
            }

            let current_url = self.driver.current_url().await.unwrap_or_default();
            let this_step_refetch_reason = refetch_reason;
            let ax_tree_refetched = this_step_refetch_reason.requires_refetch();
            let ax_tree = if ax_tree_refetched {
                match self.driver.normalized_ax_tree(&AxTreeOptions { char_budget: self.config.char_budget }).await {
                    Ok(tree) => tree,
                    Err(err) => return self.failure(history, escalations, tier_usage, err.to_string()),
                }
            } else {
                cached_ax_tree.clone().unwrap_or_default()
            };
            cached_ax_tree = Some(ax_tree.clone());

            let interactive_count = ax_tree.interactive_count();
            let signals = self.driver.page_signals().await.unwrap_or_default();
            let ax_deficient = interactive_count < self.config.ax_deficient_threshold
                && signals.is_load_complete
                && signals.has_significant_visual_content;

            if state.transition(TaskState::Inferring, step, Some(current_url.clone()), "infer").is_err() {
                return self.failure(history, escalations, tier_usage, "illegal transition to inferring");
            }

            let mut tier_used = Tier::Tier1;
            let mut dom_bypass_used = false;
            let mut dom_extraction_attempted = false;
            let decision: Decision;

            if ax_deficient {
                tier_usage.ax_deficient_detections += 1;
                crate::metrics::record_escalation("ax_deficient");
                escalations.push(EscalationEvent {
                    step,
                    reason: EscalationReason::AxDeficient,
                    source_tier: Tier::Tier1,
                    target_tier: Tier::Tier2,
                    url_at_escalation: current_url.clone(),
                    confidence: None,
                    resolved_tier: Tier::Tier2,
                });
                match self.run_tier2(&ax_tree, intent, &mut tier_usage).await {
                    Ok(d) => {
                        decision = d;
                        tier_used = Tier::Tier2;
                    }
                    Err(err) => return self.failure(history, escalations, tier_usage, err.to_string()),
                }
            } else {
                tier_usage.tier1_count += 1;
                crate::metrics::record_tier_decision("tier1");
                let tier1_result = self.tier1.decide(&ax_tree, intent).await;
                match tier1_result {
                    Ok(d) if self.tier1_acceptable(&d, no_progress_streak) => {
                        decision = d;
                    }
                    tier1_outcome => {
                        let (reason, confidence) = match &tier1_outcome {
                            Ok(d) if d.action.is_terminal() && matches!(d.action, Action::Failed { .. }) => {
                                (EscalationReason::UnsafeAction, Some(d.confidence))
                            }
                            Ok(d) if no_progress_streak >= self.config.max_no_progress_steps => {
                                (EscalationReason::NoProgress, Some(d.confidence))
                            }
                            Ok(d) => (EscalationReason::LowConfidence, Some(d.confidence)),
                            Err(_) => (EscalationReason::LowConfidence, None),
                        };
                        match reason {
                            EscalationReason::LowConfidence => tier_usage.low_confidence_escalations += 1,
                            EscalationReason::NoProgress => tier_usage.no_progress_escalations += 1,
                            EscalationReason::UnsafeAction => tier_usage.unsafe_action_escalations += 1,
                            EscalationReason::AxDeficient => {}
                        }
                        crate::metrics::record_escalation(match reason {
                            EscalationReason::LowConfidence => "low_confidence",
                            EscalationReason::NoProgress => "no_progress",
                            EscalationReason::UnsafeAction => "unsafe_action",
                            EscalationReason::AxDeficient => "ax_deficient",
                        });
                        escalations.push(EscalationEvent {
                            step,
                            reason,
                            source_tier: Tier::Tier1,
                            target_tier: Tier::Tier2,
                            url_at_escalation: current_url.clone(),
                            confidence,
                            resolved_tier: Tier::Tier2,
                        });

                        dom_extraction_attempted = true;
                        let eval_result = self.driver.evaluate_expression(DOM_BYPASS_SCRIPT).await.unwrap_or_default();
                        let candidates = dom_bypass::parse_candidates(&eval_result);
                        if let Some(action) = dom_bypass::resolve(&candidates, intent) {
                            dom_bypass_used = true;
                            tier_usage.dom_bypass_resolutions += 1;
                            tier_usage.estimated_vision_cost_avoided_usd += ESTIMATED_VISION_CALL_COST_USD;
                            crate::metrics::record_dom_bypass_resolution();
                            decision = Decision::new(action, 1.0, "dom bypass");
                            tier_used = Tier::Tier1;
                        } else {
                            match self.run_tier2(&ax_tree, intent, &mut tier_usage).await {
                                Ok(d) => {
                                    decision = d;
                                    tier_used = Tier::Tier2;
                                }
                                Err(err) => return self.failure(history, escalations, tier_usage, err.to_string()),
                            }
                        }
                    }
                }
            }

            // Tier 3: scroll when the target might be below the fold.
            let scroll_position = self.driver.scroll_position().await.unwrap_or(ghost_driver::ScrollPosition {
                scroll_y: 0.0,
                viewport_height: 0.0,
                document_height: 0.0,
            });
            let below_fold = scroll_position.is_below_fold();
            let mut action = decision.action.clone();
            let mut tier_for_step = tier_used;
            if tier_used == Tier::Tier2 && below_fold && scroll_steps_taken < self.config.max_scroll_steps {
                action = Action::Scroll { delta_px: self.config.scroll_step_px };
                tier_usage.tier3_scroll_count += 1;
                crate::metrics::record_tier_decision("tier3");
                scroll_steps_taken += 1;
                refetch_reason = RefetchReason::ScrollAction;
                tier_for_step = Tier::Tier3;
            }

            if state.transition(TaskState::Acting, step, Some(current_url.clone()), "act").is_err() {
                return self.failure(history, escalations, tier_usage, "illegal transition to acting");
            }

            let outcome: ActionOutcome = match self.driver.execute_action(&action).await {
                Ok(o) => o,
                Err(err) => return self.failure(history, escalations, tier_usage, err.to_string()),
            };

            let settle = self.driver.observe_post_action_settle(self.config.settle_window_ms).await.unwrap_or_default();
            let significant_mutation = settle.mutation_summary.is_significant();
            if tier_for_step != Tier::Tier3 {
                refetch_reason = if settle.navigation_occurred {
                    RefetchReason::Navigation
                } else if significant_mutation {
                    RefetchReason::SignificantDomMutation
                } else {
                    RefetchReason::None
                };
            }

            if significant_mutation || settle.navigation_occurred {
                no_progress_streak = 0;
            } else {
                no_progress_streak += 1;
            }

            history.push(StepRecord {
                step_index: step,
                url: current_url.clone(),
                tier: tier_for_step,
                action_summary: format!("{action:?}"),
                confidence: if tier_for_step == Tier::Tier1 { Some(decision.confidence) } else { None },
                reasoning: decision.reasoning.clone(),
                interactive_element_count: interactive_count,
                ax_deficient_detected: ax_deficient,
                scroll_y: scroll_position.scroll_y,
                target_might_be_below_fold: below_fold,
                ax_tree_refetched,
                ax_tree_refetch_reason: this_step_refetch_reason,
                post_action_significant_dom_mutation_observed: significant_mutation,
                dom_extraction_attempted,
                dom_bypass_used,
            });

            match action {
                Action::Done => {
                    let _ = state.transition(TaskState::Complete, step, Some(current_url.clone()), "done");
                    info!(target: "loop", steps = step + 1, "task completed");
                    Self::record_outcome_metrics(LoopStatus::Completed, step + 1);
                    return LoopOutcome {
                        status: LoopStatus::Completed,
                        steps_taken: step + 1,
                        history,
                        escalations,
                        tier_usage,
                        final_url: Some(current_url),
                        error_message: None,
                    };
                }
                Action::Failed { reason } => {
                    let _ = state.transition(TaskState::Failed, step, Some(current_url.clone()), reason.clone());
                    Self::record_outcome_metrics(LoopStatus::Failed, step + 1);
                    return LoopOutcome {
                        status: LoopStatus::Failed,
                        steps_taken: step + 1,
                        history,
                        escalations,
                        tier_usage,
                        final_url: Some(current_url),
                        error_message: Some(reason),
                    };
                }
                _ if !outcome.success => {
                    let message = outcome.message.unwrap_or_else(|| "action execution failed".to_string());
                    let _ = state.transition(TaskState::Failed, step, Some(current_url.clone()), message.clone());
                    Self::record_outcome_metrics(LoopStatus::Failed, step + 1);
                    return LoopOutcome {
                        status: LoopStatus::Failed,
                        steps_taken: step + 1,
                        history,
                        escalations,
                        tier_usage,
                        final_url: Some(current_url),
                        error_message: Some(message),
                    };
                }
                _ => {
                    if step + 1 >= max_steps {
                        let _ = state.transition(TaskState::Failed, step, Some(current_url.clone()), "STEP_CAP");
                        Self::record_outcome_metrics(LoopStatus::MaxStepsReached, step + 1);
                        return LoopOutcome {
                            status: LoopStatus::MaxStepsReached,
                            steps_taken: step + 1,
                            history,
                            escalations,
                            tier_usage,
                            final_url: Some(current_url),
                            error_message: Some("STEP_CAP".to_string()),
                        };
                    }
                }
            }
        }

        self.failure(history, escalations, tier_usage, "exhausted iterations without termination")
    }

    fn tier1_acceptable(&self, decision: &Decision, no_progress_streak: u32) -> bool {
        decision.confidence >= self.config.confidence_threshold
            && !matches!(decision.action, Action::Failed { .. })
            && no_progress_streak < self.config.max_no_progress_steps
    }

    async fn run_tier2(
        &self,
        ax_tree: &NormalizedAxTree,
        intent: &str,
        tier_usage: &mut TierUsage,
    ) -> Result<Decision, crate::reasoner::ReasonerError> {
        let screenshot = self
            .driver
            .capture_screenshot(&ghost_driver::ScreenshotOptions::default())
            .await
            .map(|r| r.bytes)
            .unwrap_or_default();
        tier_usage.tier2_count += 1;
        crate::metrics::record_tier_decision("tier2");
        self.tier2.decide(ax_tree, &screenshot, intent).await
    }

    fn record_outcome_metrics(status: LoopStatus, steps_taken: u32) {
        let status_label = match status {
            LoopStatus::Completed => "completed",
            LoopStatus::Failed => "failed",
            LoopStatus::MaxStepsReached => "max_steps_reached",
            LoopStatus::Cancelled => "cancelled",
        };
        crate::metrics::observe_loop_steps(status_label, steps_taken);
    }

    fn failure(
        &self,
        history: Vec<StepRecord>,
        escalations: Vec<EscalationEvent>,
        tier_usage: TierUsage,
        message: impl Into<String>,
    ) -> LoopOutcome {
        let steps_taken = history.len() as u32;
        LoopOutcome {
            status: LoopStatus::Failed,
            steps_taken,
            history,
            escalations,
            tier_usage,
            final_url: None,
            error_message: Some(message.into()),
        }
    }
}

/// Deterministic DOM extraction script run via `evaluateExpression`. Kept
/// as a constant rather than built per call since it never varies with
/// task state.
const DOM_BYPASS_SCRIPT: &str = r#"
(() => {
  const out = [];
  document.querySelectorAll('a,button,input,select,textarea,[role]').forEach((el) => {
    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    out.push({
      tag: el.tagName.toLowerCase(),
      role: el.getAttribute('role'),
      text: (el.innerText || el.value || '').trim().slice(0, 200),
      href: el.getAttribute('href'),
      bounding_box: [rect.x, rect.y, rect.width, rect.height],
      visibility: style.visibility !== 'hidden' && style.display !== 'none',
      interactive: true,
    });
  });
  return JSON.stringify(out);
})()
"#;

#[allow(dead_code)]
fn _mention_error_kind() -> GhostErrorKind {
    GhostErrorKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FakeReasoner;
    use ghost_driver::{ActionTarget, AxNode, FakeBrowserDriver, NormalizedAxTree, ScrollPosition, SettleObservation};

    fn node(id: u64, role: &str, name: &str) -> AxNode {
        AxNode {
            node_id: id,
            role: role.to_string(),
            name: name.to_string(),
            value: None,
            description: None,
            states: vec![],
            bounding_box: None,
        }
    }

    fn full_scroll() -> ScrollPosition {
        ScrollPosition { scroll_y: 0.0, viewport_height: 900.0, document_height: 900.0 }
    }

    #[tokio::test]
    async fn tier1_happy_path_completes_in_one_step() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(full_scroll());
        driver.set_ax_tree(NormalizedAxTree {
            nodes: vec![node(1, "button", "submit")],
            truncated: false,
        });
        let reasoner = Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.95, "task satisfied")]));
        let looper = PerceptionLoop::new(driver.clone(), reasoner.clone(), reasoner, PerceptionConfig::default());

        let outcome = looper.run("submit the form", Some("https://example.com"), 10).await;

        assert_eq!(outcome.status, LoopStatus::Completed);
        assert_eq!(outcome.steps_taken, 1);
        assert_eq!(outcome.tier_usage.tier1_count, 1);
        assert_eq!(outcome.tier_usage.tier2_count, 0);
    }

    #[tokio::test]
    async fn ax_deficient_page_escalates_straight_to_tier2() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(full_scroll());
        driver.set_ax_tree(NormalizedAxTree { nodes: vec![], truncated: false });
        let reasoner = Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.9, "vision decided")]));
        let looper = PerceptionLoop::new(driver, reasoner.clone(), reasoner, PerceptionConfig::default());

        let outcome = looper.run("find the hidden button", None, 10).await;

        assert_eq!(outcome.status, LoopStatus::Completed);
        assert_eq!(outcome.tier_usage.ax_deficient_detections, 1);
        assert_eq!(outcome.tier_usage.tier2_count, 1);
        assert_eq!(outcome.tier_usage.tier1_count, 0);
        assert_eq!(outcome.escalations.len(), 1);
        assert_eq!(outcome.escalations[0].reason, EscalationReason::AxDeficient);
    }

    #[tokio::test]
    async fn low_confidence_tier1_falls_back_to_dom_bypass() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(full_scroll());
        driver.set_ax_tree(NormalizedAxTree {
            nodes: vec![node(1, "button", "checkout"), node(2, "button", "cancel"), node(3, "button", "help"),
                        node(4, "button", "more"), node(5, "button", "extra"), node(6, "button", "filler")],
            truncated: false,
        });
        driver.set_evaluate_result(
            r#"[{"tag":"a","role":null,"text":"Checkout","href":"/checkout","bounding_box":[10.0,20.0,100.0,40.0],"visibility":true,"interactive":true}]"#,
        );
        let tier1_decisions = Arc::new(FakeReasoner::new(vec![
            Decision::new(Action::Click { target: ActionTarget::NodeId(1) }, 0.4, "unsure"),
        ]));
        let tier2_decisions = Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.9, "should not be reached")]));
        let looper = PerceptionLoop::new(driver.clone(), tier1_decisions, tier2_decisions, PerceptionConfig::default());

        let outcome = looper.run("checkout", None, 10).await;

        assert_eq!(outcome.tier_usage.dom_bypass_resolutions, 1);
        assert_eq!(outcome.tier_usage.tier2_count, 0);
        let executed = driver.executed_actions();
        assert!(matches!(executed[0], Action::Click { target: ActionTarget::Point { .. } }));
    }

    #[tokio::test]
    async fn low_confidence_with_no_dom_match_escalates_to_tier2_and_scrolls_below_fold() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(ScrollPosition { scroll_y: 0.0, viewport_height: 600.0, document_height: 2000.0 });
        driver.set_ax_tree(NormalizedAxTree {
            nodes: vec![node(1, "button", "a"), node(2, "button", "b"), node(3, "button", "c"),
                        node(4, "button", "d"), node(5, "button", "e"), node(6, "button", "f")],
            truncated: false,
        });
        driver.set_evaluate_result("[]");
        let tier1_decisions = Arc::new(FakeReasoner::new(vec![
            Decision::new(Action::Click { target: ActionTarget::NodeId(1) }, 0.2, "unsure"),
        ]));
        let tier2_decisions = Arc::new(FakeReasoner::new(vec![
            Decision::new(Action::Click { target: ActionTarget::NodeId(9) }, 0.9, "found it after scroll"),
        ]));
        let looper = PerceptionLoop::new(driver.clone(), tier1_decisions, tier2_decisions, PerceptionConfig::default());

        let outcome = looper.run("find item below the fold", None, 10).await;

        assert_eq!(outcome.tier_usage.tier2_count, 1);
        assert_eq!(outcome.tier_usage.tier3_scroll_count, 1);
        let executed = driver.executed_actions();
        assert_eq!(executed[0], Action::Scroll { delta_px: 800 });
    }

    #[tokio::test]
    async fn action_failure_terminates_the_loop_as_failed() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(full_scroll());
        driver.set_ax_tree(NormalizedAxTree { nodes: vec![node(1, "button", "go")], truncated: false });
        let reasoner = Arc::new(FakeReasoner::new(vec![Decision::new(
            Action::Failed { reason: "unrecoverable state".to_string() },
            0.95,
            "giving up",
        )]));
        let looper = PerceptionLoop::new(driver, reasoner.clone(), reasoner, PerceptionConfig::default());

        let outcome = looper.run("do the thing", None, 10).await;

        assert_eq!(outcome.status, LoopStatus::Failed);
        assert_eq!(outcome.error_message.as_deref(), Some("unrecoverable state"));
    }

    #[tokio::test]
    async fn step_cap_is_reported_as_max_steps_reached() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.set_scroll_position(full_scroll());
        driver.set_ax_tree(NormalizedAxTree { nodes: vec![node(1, "button", "go")], truncated: false });
        driver.set_settle_observation(SettleObservation::default());
        let decisions = (0..3)
            .map(|_| Decision::new(Action::Click { target: ActionTarget::NodeId(1) }, 0.95, "clicking again"))
            .collect::<Vec<_>>();
        let reasoner = Arc::new(FakeReasoner::new(decisions));
        let looper = PerceptionLoop::new(driver, reasoner.clone(), reasoner, PerceptionConfig::default());

        let outcome = looper.run("loop forever", None, 3).await;

        assert_eq!(outcome.status, LoopStatus::MaxStepsReached);
        assert_eq!(outcome.steps_taken, 3);
    }
}
