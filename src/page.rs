use std::collections::HashMap;

use crate::dom::{Dom, NodeId, truncate_chars};
use crate::host::{EventKind, EventSource, Handler, Scheduler, Target, Task, TimerId, View};
use crate::html::parse_html;
use crate::{Error, Result};

const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
const FRAME_DELAY_MS: i64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ListenerTarget {
    Window,
    Node(NodeId),
}

#[derive(Debug, Default, Clone)]
struct ListenerStore {
    map: HashMap<ListenerTarget, HashMap<EventKind, Vec<Handler>>>,
}

impl ListenerStore {
    fn add(&mut self, target: ListenerTarget, kind: EventKind, handler: Handler) {
        self.map
            .entry(target)
            .or_default()
            .entry(kind)
            .or_default()
            .push(handler);
    }

    fn get(&self, target: ListenerTarget, kind: EventKind) -> Vec<Handler> {
        self.map
            .get(&target)
            .and_then(|events| events.get(&kind))
            .cloned()
            .unwrap_or_default()
    }

    fn count(&self) -> usize {
        self.map
            .values()
            .flat_map(|events| events.values())
            .map(Vec::len)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Timeout,
    AnimationFrame,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    kind: TimerKind,
    task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
    pub kind: TimerKind,
}

/// In-memory page: parsed markup, listener registrations, a fake clock with
/// its timer queue, scroll position and hand-assigned layout.
///
/// `Page` implements [`View`], [`EventSource`] and [`Scheduler`] but never
/// runs handlers itself; [`crate::Site`] owns the event loop.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    next_timer_id: i64,
    next_task_order: i64,
    frame_interval_ms: i64,
    timer_step_limit: usize,
    scroll_y: f64,
    scroll_pending: bool,
    viewport_height: f64,
    layout_tops: HashMap<NodeId, f64>,
    alert_messages: Vec<String>,
    console_logs: Vec<String>,
    trace: bool,
    trace_events: bool,
    trace_timers: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
            frame_interval_ms: FRAME_DELAY_MS,
            timer_step_limit: 10_000,
            scroll_y: 0.0,
            scroll_pending: false,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            layout_tops: HashMap::new(),
            alert_messages: Vec::new(),
            console_logs: Vec::new(),
            trace: false,
            trace_events: true,
            trace_timers: true,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn timer_step_limit(&self) -> usize {
        self.timer_step_limit
    }

    pub fn set_frame_interval(&mut self, interval_ms: i64) -> Result<()> {
        if interval_ms <= 0 {
            return Err(Error::InvalidConfig(format!(
                "frame interval must be positive (got {interval_ms})"
            )));
        }
        self.frame_interval_ms = interval_ms;
        Ok(())
    }

    pub fn set_viewport_height(&mut self, px: f64) -> Result<()> {
        if !px.is_finite() || px <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "viewport height must be positive (got {px})"
            )));
        }
        self.viewport_height = px;
        Ok(())
    }

    /// Places the first element matching `selector` at a document offset.
    /// Elements without an assigned offset sit at 0.
    pub fn set_offset_top(&mut self, selector: &str, px: f64) -> Result<()> {
        let target = self.select_one(selector)?;
        self.layout_tops.insert(target, px);
        Ok(())
    }

    /// Assigns offsets to every match of `selector`, in document order.
    pub fn set_offset_tops(&mut self, selector: &str, tops: &[f64]) -> Result<()> {
        let targets = self.dom.query_selector_all(selector)?;
        if targets.len() != tops.len() {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: format!("{} elements", tops.len()),
                actual: format!("{} elements", targets.len()),
            });
        }
        for (target, top) in targets.into_iter().zip(tops) {
            self.layout_tops.insert(target, *top);
        }
        Ok(())
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                kind: task.kind,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.count()
    }

    pub fn take_alert_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alert_messages)
    }

    pub fn take_console_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console_logs)
    }

    pub(crate) fn dom(&self) -> &Dom {
        &self.dom
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub(crate) fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    pub(crate) fn handlers_for(&self, target: ListenerTarget, kind: EventKind) -> Vec<Handler> {
        self.listeners.get(target, kind)
    }

    /// Bubble path: the target first, then each ancestor element.
    pub(crate) fn bubble_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if self.dom.element(node).is_some() {
                path.push(node);
            }
            cursor = self.dom.parent(node);
        }
        path
    }

    pub(crate) fn take_scroll_notification(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    /// Removes the earliest task due at or before `due_limit` (any task when
    /// `None`), moving the clock forward to its due time.
    pub(crate) fn pop_next_task(&mut self, due_limit: Option<i64>) -> Option<(TimerId, Task)> {
        let idx = self.next_task_index(due_limit)?;
        let task = self.task_queue.remove(idx);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        self.trace_timer_line(format!(
            "[timer] run id={} kind={:?} due_at={} now_ms={}",
            task.id, task.kind, task.due_at, self.now_ms
        ));
        Some((TimerId(task.id), task.task))
    }

    pub(crate) fn has_task_due(&self, due_limit: Option<i64>) -> bool {
        self.next_task_index(due_limit).is_some()
    }

    pub(crate) fn set_now_ms(&mut self, now_ms: i64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn schedule(&mut self, delay_ms: i64, kind: TimerKind, task: Task) -> TimerId {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        self.trace_timer_line(format!(
            "[timer] schedule id={id} kind={kind:?} due_at={due_at} delay_ms={delay_ms}"
        ));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            kind,
            task,
        });
        TimerId(id)
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        self.dom
            .tag_name(node)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("node-{}", node.0))
    }

    pub(crate) fn trace_target_label(&self, target: Option<NodeId>) -> String {
        target
            .map(|node| self.trace_node_label(node))
            .unwrap_or_else(|| "window".into())
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace && self.trace_timers {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }
}

impl View for Page {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    fn query_all_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all_from(root, selector)
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        self.dom.closest(node, selector)
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.dom.set_attr(node, name, value)
    }

    fn text(&self, node: NodeId) -> String {
        self.dom.text_content(node)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.dom.set_text_content(node, text)
    }

    fn value(&self, node: NodeId) -> Result<String> {
        self.dom.value(node)
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.dom.set_value(node, value)
    }

    fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        self.dom.set_disabled(node, disabled)
    }

    fn reset_form(&mut self, form: NodeId) -> Result<()> {
        let reset = self.dom.reset_form_controls(form)?;
        let label = self.trace_node_label(form);
        self.trace_event_line(format!("[event] reset target={label} controls={reset}"));
        Ok(())
    }

    fn has_class(&self, node: NodeId, class_name: &str) -> bool {
        self.dom.class_contains(node, class_name)
    }

    fn add_class(&mut self, node: NodeId, class_name: &str) -> Result<()> {
        self.dom.class_add(node, class_name)
    }

    fn remove_class(&mut self, node: NodeId, class_name: &str) -> Result<()> {
        self.dom.class_remove(node, class_name)
    }

    fn toggle_class(&mut self, node: NodeId, class_name: &str) -> Result<bool> {
        self.dom.class_toggle(node, class_name)
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.dom.style_property(node, property)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.dom.set_style_property(node, property, value)
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.layout_tops.get(&node).copied().unwrap_or(0.0)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_to(&mut self, top: f64, smooth: bool) {
        let top = if top.is_finite() { top.max(0.0) } else { 0.0 };
        let from = self.scroll_y;
        if top != from {
            self.scroll_y = top;
            self.scroll_pending = true;
        }
        self.trace_event_line(format!(
            "[scroll] from={from} to={top} smooth={smooth}"
        ));
    }

    fn alert(&mut self, message: &str) {
        self.trace_event_line(format!("[alert] {message}"));
        self.alert_messages.push(message.to_string());
    }

    fn console_log(&mut self, line: &str) {
        if self.trace {
            self.trace_line(format!("[console] {line}"));
        }
        self.console_logs.push(line.to_string());
    }
}

impl EventSource for Page {
    fn subscribe(&mut self, kind: EventKind, target: Target, handler: Handler) {
        match target {
            Target::Window => self.listeners.add(ListenerTarget::Window, kind, handler),
            Target::Nodes(nodes) => {
                for node in nodes {
                    self.listeners.add(ListenerTarget::Node(node), kind, handler);
                }
            }
        }
    }
}

impl Scheduler for Page {
    fn now_ms(&self) -> i64 {
        self.now_ms
    }

    fn set_timeout(&mut self, delay_ms: i64, task: Task) -> TimerId {
        self.schedule(delay_ms, TimerKind::Timeout, task)
    }

    fn request_animation_frame(&mut self, task: Task) -> TimerId {
        let delay = self.frame_interval_ms;
        self.schedule(delay, TimerKind::AnimationFrame, task)
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer.0);
        let canceled = self.task_queue.len() != before;
        self.trace_timer_line(format!(
            "[timer] cancel id={} canceled={canceled}",
            timer.0
        ));
        canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_run_in_due_then_registration_order() -> Result<()> {
        let mut page = Page::from_html("<p id='p'></p>")?;
        let late = page.set_timeout(500, Task::RestoreSubmitButton);
        let frame = page.request_animation_frame(Task::CountUpFrame { counter: 0 });
        let early = page.set_timeout(16, Task::RestoreSubmitButton);

        let order = std::iter::from_fn(|| page.pop_next_task(None))
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![frame, early, late]);
        assert_eq!(page.now_ms(), 500);
        Ok(())
    }

    #[test]
    fn pop_respects_due_limit() -> Result<()> {
        let mut page = Page::from_html("")?;
        page.set_timeout(2000, Task::RestoreSubmitButton);
        assert!(page.pop_next_task(Some(1999)).is_none());
        assert!(page.pop_next_task(Some(2000)).is_some());
        Ok(())
    }

    #[test]
    fn cancel_removes_pending_task() -> Result<()> {
        let mut page = Page::from_html("")?;
        let id = page.set_timeout(10, Task::RestoreSubmitButton);
        assert!(page.cancel(id));
        assert!(!page.cancel(id));
        assert!(page.pending_timers().is_empty());
        Ok(())
    }

    #[test]
    fn scroll_notifies_only_on_change_and_clamps_at_top() -> Result<()> {
        let mut page = Page::from_html("")?;
        page.scroll_to(0.0, false);
        assert!(!page.take_scroll_notification());
        page.scroll_to(-40.0, true);
        assert!(!page.take_scroll_notification());
        page.scroll_to(300.0, true);
        assert!(page.take_scroll_notification());
        assert!(!page.take_scroll_notification());
        assert_eq!(page.scroll_y(), 300.0);
        Ok(())
    }

    #[test]
    fn client_top_tracks_scroll_position() -> Result<()> {
        let mut page = Page::from_html("<section id='about'></section>")?;
        page.set_offset_top("#about", 1200.0)?;
        let about = page.select_one("#about")?;
        page.scroll_to(500.0, false);
        assert_eq!(page.client_top(about), 700.0);
        Ok(())
    }

    #[test]
    fn trace_log_limit_keeps_latest_entries() -> Result<()> {
        let mut page = Page::from_html("")?;
        page.enable_trace(true);
        page.set_trace_stderr(false);
        page.set_trace_log_limit(2)?;
        page.console_log("one");
        page.console_log("two");
        page.console_log("three");
        assert_eq!(
            page.take_trace_logs(),
            vec!["[console] two".to_string(), "[console] three".to_string()]
        );
        assert_eq!(page.take_console_logs().len(), 3);
        assert!(page.set_trace_log_limit(0).is_err());
        Ok(())
    }

    #[test]
    fn offsets_for_all_matches_require_matching_count() -> Result<()> {
        let mut page = Page::from_html("<section></section><section></section>")?;
        page.set_offset_tops("section", &[0.0, 800.0])?;
        assert!(matches!(
            page.set_offset_tops("section", &[0.0]),
            Err(Error::TypeMismatch { .. })
        ));
        Ok(())
    }
}
