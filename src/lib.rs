//! Interaction controller for a single-page car dealership site.
//!
//! [`SiteController`] wires menu toggling, smooth in-page scrolling, inventory
//! filtering, the contact form, reveal-on-scroll and the stat count-up onto a
//! page through the [`View`], [`EventSource`] and [`Scheduler`] traits.
//! [`Site`] mounts it on an in-memory [`Page`] with a fake clock so every
//! behaviour can be driven and asserted deterministically.
//!
//! ```no_run
//! use dealership_site::Site;
//!
//! # fn main() -> dealership_site::Result<()> {
//! let html = std::fs::read_to_string("index.html").unwrap_or_default();
//! let mut site = Site::from_html(&html)?;
//! site.click("#hamburger")?;
//! site.assert_class("#navMenu", "active", true)?;
//! # Ok(())
//! # }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod animate;
mod config;
mod contact;
mod controller;
mod dom;
mod filter;
mod host;
mod html;
mod nav;
mod page;
mod pattern;
mod selector;
mod site;

pub use animate::{
    CountUp, CountUpFrame, IMAGE_SELECTOR, REVEAL_SELECTOR, STAT_SELECTOR, render_counter,
    within_reveal_zone,
};
pub use config::{ElementIds, SiteConfig};
pub use contact::{
    CONTACT_BUTTON_SELECTOR, ContactInquiry, InquiryType, SUBMIT_BUTTON_SELECTOR, prefill_message,
};
pub use controller::SiteController;
pub use dom::NodeId;
pub use filter::{
    CARD_SELECTOR, CarCard, CardStatus, ImportFilter, PRICE_SELECTOR, PriceBand, SPECS_SELECTOR,
    TITLE_SELECTOR, UsedFilter, YearBand, YearExtractor, parse_leading_int,
};
pub use host::{Event, EventKind, EventSource, Handler, Host, Scheduler, Target, Task, TimerId, View};
pub use nav::{
    ACTIVE_CLASS, ANCHOR_SELECTOR, HEADER_SELECTOR, MENU_BAR_SELECTOR, NAV_LINK_SELECTOR,
    SECTION_SELECTOR, anchored_scroll_top, current_section, fragment_id, icon_bar_styles,
};
pub use page::{Page, PendingTimer, TimerKind};
pub use site::Site;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    InvalidConfig(String),
    Runtime(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

impl From<pattern::PatternError> for Error {
    fn from(err: pattern::PatternError) -> Self {
        Self::Runtime(format!("pattern error: {err}"))
    }
}
