use crate::config::SiteConfig;
use crate::controller::SiteController;
use crate::dom::NodeId;
use crate::host::{Event, EventKind, Scheduler, View};
use crate::page::{ListenerTarget, Page};
use crate::{Error, Result};

const STACK_RED_ZONE: usize = 32 * 1024 * 1024;

/// A mounted page: the in-memory [`Page`] plus the [`SiteController`] wired
/// to it. Drives user actions, scroll notifications and the fake clock.
pub struct Site {
    page: Page,
    controller: SiteController,
}

impl Site {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::with_config(html, SiteConfig::default())
    }

    pub fn with_config(html: &str, config: SiteConfig) -> Result<Self> {
        Self::mount(Page::from_html(html)?, config)
    }

    /// Mounts onto a page that was already prepared (layout, viewport, trace).
    pub fn mount(mut page: Page, config: SiteConfig) -> Result<Self> {
        let controller = SiteController::mount(&mut page, config)?;
        Ok(Self { page, controller })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn controller(&self) -> &SiteController {
        &self.controller
    }

    /// Fires `load` on every image, then on the window.
    pub fn load(&mut self) -> Result<()> {
        stacker::grow(STACK_RED_ZONE, || {
            for image in self.page.query_all(crate::animate::IMAGE_SELECTOR)? {
                self.dispatch_node_event(image, EventKind::Load)?;
            }
            self.dispatch_window_event(EventKind::Load)?;
            self.settle()
        })
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        if self.page.dom().disabled(target) {
            return Ok(());
        }

        stacker::grow(STACK_RED_ZONE, || {
            let outcome = self.dispatch_node_event(target, EventKind::Click)?;
            if !outcome.default_prevented() {
                self.run_click_default(target)?;
            }
            self.settle()
        })
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let dom = self.page.dom();
        if !(dom.is_tag(target, "input") || dom.is_tag(target, "textarea")) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: dom.tag_name(target).unwrap_or("non-element").to_string(),
            });
        }
        if dom.disabled(target) {
            return Ok(());
        }

        stacker::grow(STACK_RED_ZONE, || {
            self.page.set_value(target, text)?;
            self.dispatch_node_event(target, EventKind::Input)?;
            self.settle()
        })
    }

    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let dom = self.page.dom();
        if !dom.is_tag(target, "select") {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: dom.tag_name(target).unwrap_or("non-element").to_string(),
            });
        }
        if dom.disabled(target) {
            return Ok(());
        }

        stacker::grow(STACK_RED_ZONE, || {
            self.page.set_value(target, value)?;
            self.dispatch_node_event(target, EventKind::Input)?;
            self.dispatch_node_event(target, EventKind::Change)?;
            self.settle()
        })
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let Some(form) = self.form_for(target) else {
            return Ok(());
        };
        stacker::grow(STACK_RED_ZONE, || {
            self.submit_form(form)?;
            self.settle()
        })
    }

    /// Scrolls the window as a user would and delivers the scroll event.
    pub fn scroll_to(&mut self, top: f64) -> Result<()> {
        self.page.scroll_to(top, false);
        stacker::grow(STACK_RED_ZONE, || self.settle())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let kind = EventKind::parse(event)
            .ok_or_else(|| Error::Runtime(format!("unsupported event type: {event}")))?;
        let target = self.page.select_one(selector)?;
        stacker::grow(STACK_RED_ZONE, || {
            self.dispatch_node_event(target, kind)?;
            self.settle()
        })
    }

    pub fn now_ms(&self) -> i64 {
        self.page.now_ms()
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.page.now_ms();
        let to = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(to))?;
        self.page.set_now_ms(to);
        self.page.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={to} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let now = self.page.now_ms();
        if target_ms < now {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={now})"
            )));
        }
        self.advance_time(target_ms - now)
    }

    /// Runs every pending task, moving the clock as far as needed.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.page.now_ms();
        let ran = self.run_timer_queue(None)?;
        self.page.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.page.now_ms()
        ));
        Ok(())
    }

    /// Cancels deferred work the controller still owns.
    pub fn teardown(&mut self) -> usize {
        self.controller.teardown(&mut self.page)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.page.select_one(selector)?;
        Ok(self.page.text(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.page.select_one(selector)?;
        self.page.value(target)
    }

    pub fn style(&self, selector: &str, property: &str) -> Result<Option<String>> {
        let target = self.page.select_one(selector)?;
        Ok(self.page.style(target, property))
    }

    /// Ids of the matches of `selector` whose inline `display` is not `none`.
    pub fn visible_ids(&self, selector: &str) -> Result<Vec<String>> {
        let nodes = self.page.query_all(selector)?;
        Ok(nodes
            .into_iter()
            .filter(|node| self.page.style(*node, "display").as_deref() != Some("none"))
            .filter_map(|node| self.page.attr(node, "id"))
            .collect())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let actual = self.page.text(target);
        self.check(selector, target, expected, actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let actual = self.page.value(target)?;
        self.check(selector, target, expected, actual)
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let actual = self.page.style(target, property).unwrap_or_default();
        self.check(selector, target, expected, actual)
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let actual = self.page.has_class(target, class_name);
        self.check(
            selector,
            target,
            &format!("{class_name}={expected}"),
            format!("{class_name}={actual}"),
        )
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.page.select_one(selector)?;
        let actual = self.page.dom().disabled(target);
        self.check(selector, target, &expected.to_string(), actual.to_string())
    }

    fn check(&self, selector: &str, target: NodeId, expected: &str, actual: String) -> Result<()> {
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.page.node_snippet(target),
            });
        }
        Ok(())
    }

    fn form_for(&self, target: NodeId) -> Option<NodeId> {
        let dom = self.page.dom();
        if dom.is_tag(target, "form") {
            Some(target)
        } else {
            dom.find_ancestor_by_tag(target, "form")
        }
    }

    fn submit_form(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_node_event(form, EventKind::Submit)?;
        if !outcome.default_prevented() {
            let label = self.page.trace_node_label(form);
            self.page
                .trace_event_line(format!("[event] default submit target={label} navigated=false"));
        }
        Ok(())
    }

    fn run_click_default(&mut self, target: NodeId) -> Result<()> {
        let dom = self.page.dom();

        if let Some(anchor) = dom.closest(target, "a[href]")? {
            let href = dom.attr(anchor, "href").unwrap_or_default();
            if let Some(dest) = crate::nav::fragment_id(&href).and_then(|id| dom.by_id(id)) {
                let top = self.page.offset_top(dest);
                self.page.scroll_to(top, false);
            }
            return Ok(());
        }

        if is_submit_control(&self.page, target) {
            if let Some(form) = self.form_for(target) {
                self.submit_form(form)?;
            }
        }
        Ok(())
    }

    fn dispatch_node_event(&mut self, target: NodeId, kind: EventKind) -> Result<Event> {
        let mut event = Event::new(kind, Some(target));
        let path = if bubbles(kind) {
            self.page.bubble_path(target)
        } else {
            vec![target]
        };

        for node in path {
            event.current_target = Some(node);
            self.invoke_handlers(ListenerTarget::Node(node), &mut event)?;
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn dispatch_window_event(&mut self, kind: EventKind) -> Result<Event> {
        let mut event = Event::new(kind, None);
        self.invoke_handlers(ListenerTarget::Window, &mut event)?;
        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_handlers(&mut self, target: ListenerTarget, event: &mut Event) -> Result<()> {
        for handler in self.page.handlers_for(target, event.kind) {
            let target_label = self.page.trace_target_label(event.target);
            let current_label = self.page.trace_target_label(event.current_target);
            self.page.trace_event_line(format!(
                "[event] {} target={} current={} handler={:?} default_prevented={}",
                event.kind.as_str(),
                target_label,
                current_label,
                handler,
                event.default_prevented()
            ));
            self.controller.handle(&mut self.page, handler, event)?;
        }
        Ok(())
    }

    fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        let target_label = self.page.trace_target_label(event.target);
        self.page.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.kind.as_str(),
            target_label,
            outcome,
            event.default_prevented()
        ));
    }

    /// Delivers window scroll events until the scroll position stops moving.
    fn settle(&mut self) -> Result<()> {
        let limit = self.page.timer_step_limit();
        let mut steps = 0usize;
        while self.page.take_scroll_notification() {
            steps += 1;
            if steps > limit {
                return Err(Error::Runtime(format!(
                    "scroll handlers kept moving the page: limit={limit}, scroll_y={}",
                    self.page.scroll_y()
                )));
            }
            self.dispatch_window_event(EventKind::Scroll)?;
        }
        Ok(())
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>) -> Result<usize> {
        let limit = self.page.timer_step_limit();
        let mut steps = 0usize;
        while self.page.has_task_due(due_limit) {
            steps += 1;
            if steps > limit {
                return Err(Error::Runtime(format!(
                    "flush exceeded max task steps: limit={limit}, steps={steps}, now_ms={}, pending_tasks={}",
                    self.page.now_ms(),
                    self.page.pending_timers().len()
                )));
            }
            let Some((timer, task)) = self.page.pop_next_task(due_limit) else {
                break;
            };
            stacker::grow(STACK_RED_ZONE, || {
                self.controller.run_task(&mut self.page, timer, task)?;
                self.settle()
            })?;
        }
        Ok(steps)
    }
}

fn bubbles(kind: EventKind) -> bool {
    !matches!(kind, EventKind::Load | EventKind::Scroll)
}

fn is_submit_control(page: &Page, node: NodeId) -> bool {
    let dom = page.dom();
    if dom.is_tag(node, "button") {
        return dom
            .attr(node, "type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(true);
    }
    if dom.is_tag(node, "input") {
        return dom
            .attr(node, "type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(false);
    }
    false
}
