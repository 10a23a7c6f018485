//! The seams between the interaction controller and whatever renders the page.
//!
//! A controller never touches a concrete document. It reads and writes through
//! [`View`], registers named [`Handler`]s through [`EventSource`], and defers
//! work through [`Scheduler`]. [`crate::Page`] is the in-memory implementation.

use crate::Result;
use crate::dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Change,
    Submit,
    Scroll,
    Load,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::Scroll => "scroll",
            Self::Load => "load",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "click" => Some(Self::Click),
            "input" => Some(Self::Input),
            "change" => Some(Self::Change),
            "submit" => Some(Self::Submit),
            "scroll" => Some(Self::Scroll),
            "load" => Some(Self::Load),
            _ => None,
        }
    }
}

/// Where a subscription listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Window,
    Nodes(Vec<NodeId>),
}

impl Target {
    pub fn node(node: NodeId) -> Self {
        Self::Nodes(vec![node])
    }
}

/// Named controller entry points. Registered against an [`EventSource`] and
/// routed back to [`crate::SiteController::handle`] by whoever owns the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    ToggleMenu,
    CloseMenu,
    SmoothScroll,
    FilterImported,
    FilterUsed,
    SubmitInquiry,
    SubmitAffordance,
    ContactAboutCar,
    Reveal,
    TrackActiveSection,
    HeaderShadow,
    StatsTrigger,
    ImageLoaded,
}

/// Deferred work, delivered to [`crate::SiteController::run_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    PrefillContact {
        card: NodeId,
        title: String,
        price: String,
    },
    RestoreSubmitButton,
    CountUpFrame {
        counter: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) i64);

/// One dispatch of an event. `target` and `current_target` are `None` for
/// window-level events.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub target: Option<NodeId>,
    pub current_target: Option<NodeId>,
    default_prevented: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: Option<NodeId>) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Read/write access to document structure, presentation and geometry.
pub trait View {
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>>;
    fn query_all_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>>;
    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>>;

    fn query_first(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    fn query_first_within(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_all_within(root, selector)?.into_iter().next())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;
    fn text(&self, node: NodeId) -> String;
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;
    fn value(&self, node: NodeId) -> Result<String>;
    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()>;
    fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()>;
    fn reset_form(&mut self, form: NodeId) -> Result<()>;

    fn has_class(&self, node: NodeId, class_name: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class_name: &str) -> Result<()>;
    fn remove_class(&mut self, node: NodeId, class_name: &str) -> Result<()>;
    fn toggle_class(&mut self, node: NodeId, class_name: &str) -> Result<bool>;
    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    /// Document-relative top edge of `node`.
    fn offset_top(&self, node: NodeId) -> f64;
    /// Viewport-relative top edge of `node`.
    fn client_top(&self, node: NodeId) -> f64 {
        self.offset_top(node) - self.scroll_y()
    }
    fn scroll_y(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn scroll_to(&mut self, top: f64, smooth: bool);

    fn alert(&mut self, message: &str);
    fn console_log(&mut self, line: &str);
}

pub trait EventSource {
    fn subscribe(&mut self, kind: EventKind, target: Target, handler: Handler);
}

pub trait Scheduler {
    fn now_ms(&self) -> i64;
    fn set_timeout(&mut self, delay_ms: i64, task: Task) -> TimerId;
    /// Schedules `task` for the next display frame. The frame timestamp is
    /// [`Scheduler::now_ms`] at the time the task runs.
    fn request_animation_frame(&mut self, task: Task) -> TimerId;
    fn cancel(&mut self, timer: TimerId) -> bool;
}

/// Everything a controller needs from its environment.
pub trait Host: View + EventSource + Scheduler {}

impl<T: View + EventSource + Scheduler> Host for T {}
