use crate::animate::{
    CountUp, HIDDEN_OPACITY, HIDDEN_TRANSFORM, IMAGE_SELECTOR, IMAGE_TRANSITION,
    REVEAL_SELECTOR, REVEAL_TRANSITION, SHOWN_OPACITY, SHOWN_TRANSFORM, STAT_SELECTOR,
    render_counter, within_reveal_zone,
};
use crate::config::SiteConfig;
use crate::contact::{
    CONTACT_BUTTON_SELECTOR, ContactInquiry, InquiryType, SUBMIT_BUTTON_SELECTOR,
    prefill_message,
};
use crate::dom::NodeId;
use crate::filter::{CARD_SELECTOR, CarCard, CardStatus, ImportFilter, UsedFilter, YearExtractor};
use crate::host::{Event, EventKind, Handler, Host, Target, Task, TimerId, View};
use crate::nav::{
    ACTIVE_CLASS, ANCHOR_SELECTOR, HEADER_SELECTOR, MENU_BAR_SELECTOR, NAV_LINK_SELECTOR,
    SECTION_SELECTOR, anchored_scroll_top, current_section, fragment_id, icon_bar_styles,
};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct FormFields {
    name: NodeId,
    email: NodeId,
    phone: NodeId,
    inquiry: NodeId,
    message: NodeId,
}

/// Elements the page cannot work without, resolved once at mount.
#[derive(Debug, Clone)]
struct Elements {
    menu_toggle: NodeId,
    menu: NodeId,
    menu_bars: Vec<NodeId>,
    imported_grid: NodeId,
    imported_search: NodeId,
    brand_filter: NodeId,
    price_filter: NodeId,
    used_grid: NodeId,
    used_search: NodeId,
    year_filter: NodeId,
    contact_form: NodeId,
    fields: FormFields,
    submit_button: NodeId,
}

#[derive(Debug, Clone)]
struct Counter {
    node: NodeId,
    count: CountUp,
}

/// Interaction controller for the dealership page.
///
/// Built once with [`SiteController::mount`] after the markup exists. Holds
/// the only mutable state the page has: whether the menu is open, whether the
/// stats have counted up, and the handles of deferred work it still owns.
#[derive(Debug, Clone)]
pub struct SiteController {
    config: SiteConfig,
    elements: Elements,
    years: YearExtractor,
    submit_label: String,
    menu_open: bool,
    stats_animated: bool,
    counters: Vec<Counter>,
    pending: Vec<TimerId>,
}

impl SiteController {
    /// Resolves required elements, primes reveal and image styles, and
    /// registers every handler on `host`.
    pub fn mount<H: Host>(host: &mut H, config: SiteConfig) -> Result<Self> {
        let elements = resolve_elements(&*host, &config)?;
        let submit_label = host.text(elements.submit_button);
        let mut controller = Self {
            config,
            elements,
            years: YearExtractor::new()?,
            submit_label,
            menu_open: false,
            stats_animated: false,
            counters: Vec::new(),
            pending: Vec::new(),
        };
        controller.register(host)?;
        let banner = controller.config.loaded_banner();
        host.console_log(&banner);
        Ok(controller)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn stats_animated(&self) -> bool {
        self.stats_animated
    }

    pub fn pending_tasks(&self) -> &[TimerId] {
        &self.pending
    }

    fn register<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let el = self.elements.clone();

        host.subscribe(EventKind::Click, Target::node(el.menu_toggle), Handler::ToggleMenu);

        let links = host.query_all(NAV_LINK_SELECTOR)?;
        host.subscribe(EventKind::Click, Target::Nodes(links), Handler::CloseMenu);

        let anchors = host.query_all(ANCHOR_SELECTOR)?;
        host.subscribe(EventKind::Click, Target::Nodes(anchors), Handler::SmoothScroll);

        host.subscribe(EventKind::Input, Target::node(el.imported_search), Handler::FilterImported);
        host.subscribe(EventKind::Change, Target::node(el.brand_filter), Handler::FilterImported);
        host.subscribe(EventKind::Change, Target::node(el.price_filter), Handler::FilterImported);

        host.subscribe(EventKind::Input, Target::node(el.used_search), Handler::FilterUsed);
        host.subscribe(EventKind::Change, Target::node(el.year_filter), Handler::FilterUsed);

        host.subscribe(EventKind::Submit, Target::node(el.contact_form), Handler::SubmitInquiry);

        let contact_buttons = host.query_all(CONTACT_BUTTON_SELECTOR)?;
        host.subscribe(
            EventKind::Click,
            Target::Nodes(contact_buttons),
            Handler::ContactAboutCar,
        );

        for card in host.query_all(REVEAL_SELECTOR)? {
            host.set_style(card, "opacity", HIDDEN_OPACITY)?;
            host.set_style(card, "transform", HIDDEN_TRANSFORM)?;
            host.set_style(card, "transition", REVEAL_TRANSITION)?;
        }
        host.subscribe(EventKind::Scroll, Target::Window, Handler::Reveal);
        host.subscribe(EventKind::Load, Target::Window, Handler::Reveal);

        host.subscribe(EventKind::Scroll, Target::Window, Handler::TrackActiveSection);
        host.subscribe(EventKind::Scroll, Target::Window, Handler::HeaderShadow);

        let images = host.query_all(IMAGE_SELECTOR)?;
        for image in &images {
            host.set_style(*image, "opacity", "0")?;
            host.set_style(*image, "transition", IMAGE_TRANSITION)?;
        }
        host.subscribe(EventKind::Load, Target::Nodes(images), Handler::ImageLoaded);

        host.subscribe(EventKind::Submit, Target::node(el.contact_form), Handler::SubmitAffordance);
        host.subscribe(EventKind::Scroll, Target::Window, Handler::StatsTrigger);
        Ok(())
    }

    pub fn handle<H: Host>(&mut self, host: &mut H, handler: Handler, event: &mut Event) -> Result<()> {
        match handler {
            Handler::ToggleMenu => self.toggle_menu(host),
            Handler::CloseMenu => self.close_menu(host),
            Handler::SmoothScroll => self.smooth_scroll(host, event),
            Handler::FilterImported => self.filter_imported(host),
            Handler::FilterUsed => self.filter_used(host),
            Handler::SubmitInquiry => self.submit_inquiry(host, event),
            Handler::SubmitAffordance => self.submit_affordance(host),
            Handler::ContactAboutCar => self.contact_about_car(host, event),
            Handler::Reveal => self.reveal(host),
            Handler::TrackActiveSection => self.track_active_section(host),
            Handler::HeaderShadow => self.header_shadow(host),
            Handler::StatsTrigger => self.stats_trigger(host),
            Handler::ImageLoaded => self.image_loaded(host, event),
        }
    }

    pub fn run_task<H: Host>(&mut self, host: &mut H, timer: TimerId, task: Task) -> Result<()> {
        self.pending.retain(|id| *id != timer);
        match task {
            Task::PrefillContact { card, title, price } => {
                self.prefill_contact(host, card, &title, &price)
            }
            Task::RestoreSubmitButton => {
                let button = self.elements.submit_button;
                host.set_text(button, &self.submit_label)?;
                host.set_disabled(button, false)
            }
            Task::CountUpFrame { counter } => self.count_up_frame(host, counter),
        }
    }

    /// Cancels every deferred callback and animation frame still owned by the
    /// controller. Returns how many were actually pending on the host.
    pub fn teardown<H: Host>(&mut self, host: &mut H) -> usize {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|timer| host.cancel(*timer))
            .count()
    }

    fn defer<H: Host>(&mut self, host: &mut H, delay_ms: i64, task: Task) {
        let id = host.set_timeout(delay_ms, task);
        self.pending.push(id);
    }

    fn toggle_menu<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.menu_open = host.toggle_class(self.elements.menu, ACTIVE_CLASS)?;
        self.apply_icon(host)
    }

    fn close_menu<H: Host>(&mut self, host: &mut H) -> Result<()> {
        host.remove_class(self.elements.menu, ACTIVE_CLASS)?;
        self.menu_open = false;
        self.apply_icon(host)
    }

    fn apply_icon<H: Host>(&self, host: &mut H) -> Result<()> {
        for (bar, (property, value)) in self
            .elements
            .menu_bars
            .iter()
            .zip(icon_bar_styles(self.menu_open))
        {
            host.set_style(*bar, property, value)?;
        }
        Ok(())
    }

    fn smooth_scroll<H: Host>(&self, host: &mut H, event: &mut Event) -> Result<()> {
        event.prevent_default();
        let Some(anchor) = event.current_target else {
            return Ok(());
        };
        let href = host.attr(anchor, "href").unwrap_or_default();
        let Some(target) = fragment_id(&href).and_then(|id| host.element_by_id(id)) else {
            return Ok(());
        };
        let top = anchored_scroll_top(
            host.client_top(target),
            host.scroll_y(),
            self.config.header_offset_px,
        );
        host.scroll_to(top, true);
        Ok(())
    }

    fn filter_imported<H: Host>(&self, host: &mut H) -> Result<()> {
        let el = &self.elements;
        let filter = ImportFilter::from_controls(
            &host.value(el.imported_search)?,
            &host.value(el.brand_filter)?,
            &host.value(el.price_filter)?,
        );
        for card in host.query_all_within(el.imported_grid, CARD_SELECTOR)? {
            let shown = filter.matches(&CarCard::read(&*host, card)?);
            set_displayed(host, card, shown)?;
        }
        Ok(())
    }

    fn filter_used<H: Host>(&self, host: &mut H) -> Result<()> {
        let el = &self.elements;
        let filter = UsedFilter::from_controls(
            &host.value(el.used_search)?,
            &host.value(el.year_filter)?,
            self.config.older_year_cutoff,
        );
        for card in host.query_all_within(el.used_grid, CARD_SELECTOR)? {
            let shown = filter.matches(&CarCard::read(&*host, card)?, &self.years)?;
            set_displayed(host, card, shown)?;
        }
        Ok(())
    }

    fn submit_inquiry<H: Host>(&self, host: &mut H, event: &mut Event) -> Result<()> {
        event.prevent_default();
        let fields = &self.elements.fields;
        let inquiry = ContactInquiry {
            name: host.value(fields.name)?,
            email: host.value(fields.email)?,
            phone: host.value(fields.phone)?,
            inquiry: host.value(fields.inquiry)?,
            message: host.value(fields.message)?,
        };
        host.console_log(&format!("Form submitted: {inquiry}"));
        host.alert(&self.config.acknowledgement());
        host.reset_form(self.elements.contact_form)
    }

    fn submit_affordance<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let button = self.elements.submit_button;
        host.set_text(button, &self.config.sending_label)?;
        host.set_disabled(button, true)?;
        let delay = self.config.button_reset_delay_ms;
        self.defer(host, delay, Task::RestoreSubmitButton);
        Ok(())
    }

    fn contact_about_car<H: Host>(&mut self, host: &mut H, event: &mut Event) -> Result<()> {
        let Some(button) = event.current_target else {
            return Ok(());
        };
        let Some(card) = host.closest(button, CARD_SELECTOR)? else {
            return Ok(());
        };
        let details = CarCard::read(&*host, card)?;

        if let Some(contact) = host.element_by_id(&self.config.ids.contact_section) {
            let top = host.client_top(contact) + host.scroll_y();
            host.scroll_to(top, true);
        }

        let delay = self.config.prefill_delay_ms;
        self.defer(
            host,
            delay,
            Task::PrefillContact {
                card,
                title: details.title,
                price: details.price_label,
            },
        );
        Ok(())
    }

    fn prefill_contact<H: Host>(
        &self,
        host: &mut H,
        card: NodeId,
        title: &str,
        price: &str,
    ) -> Result<()> {
        let fields = &self.elements.fields;
        host.set_value(fields.message, &prefill_message(title, price))?;
        let status = CardStatus::from_attr(host.attr(card, "data-status").as_deref());
        host.set_value(fields.inquiry, InquiryType::for_status(status).as_str())
    }

    fn reveal<H: Host>(&self, host: &mut H) -> Result<()> {
        let viewport = host.viewport_height();
        for card in host.query_all(REVEAL_SELECTOR)? {
            if within_reveal_zone(host.client_top(card), viewport, self.config.reveal_margin_px) {
                host.set_style(card, "opacity", SHOWN_OPACITY)?;
                host.set_style(card, "transform", SHOWN_TRANSFORM)?;
            }
        }
        Ok(())
    }

    fn track_active_section<H: Host>(&self, host: &mut H) -> Result<()> {
        let sections = host
            .query_all(SECTION_SELECTOR)?
            .into_iter()
            .map(|section| (host.attr(section, "id"), host.offset_top(section)))
            .collect::<Vec<_>>();
        let tops = sections
            .iter()
            .map(|(id, top)| (id.as_deref(), *top))
            .collect::<Vec<_>>();
        let current = current_section(&tops, host.scroll_y(), self.config.section_lookback_px)
            .map(|id| format!("#{id}"));

        for link in host.query_all(NAV_LINK_SELECTOR)? {
            host.remove_class(link, ACTIVE_CLASS)?;
            if current.is_some() && host.attr(link, "href") == current {
                host.add_class(link, ACTIVE_CLASS)?;
            }
        }
        Ok(())
    }

    fn header_shadow<H: Host>(&self, host: &mut H) -> Result<()> {
        let Some(header) = host.query_first(HEADER_SELECTOR)? else {
            return Ok(());
        };
        let shadow = if host.scroll_y() > 0.0 {
            &self.config.header_shadow_scrolled
        } else {
            &self.config.header_shadow_resting
        };
        host.set_style(header, "box-shadow", shadow)
    }

    fn stats_trigger<H: Host>(&mut self, host: &mut H) -> Result<()> {
        if self.stats_animated {
            return Ok(());
        }
        let Some(about) = host.element_by_id(&self.config.ids.about_section) else {
            return Ok(());
        };
        if !within_reveal_zone(
            host.client_top(about),
            host.viewport_height(),
            self.config.stats_margin_px,
        ) {
            return Ok(());
        }

        self.stats_animated = true;
        let stats = host.query_all(STAT_SELECTOR)?;
        for (node, target) in stats.into_iter().zip(self.config.stat_targets.clone()) {
            host.set_attr(node, "data-suffix", &self.config.stat_suffix)?;
            let counter = self.counters.len();
            self.counters.push(Counter {
                node,
                count: CountUp::new(0, target, self.config.count_up_duration_ms),
            });
            let frame = host.request_animation_frame(Task::CountUpFrame { counter });
            self.pending.push(frame);
        }
        Ok(())
    }

    fn count_up_frame<H: Host>(&mut self, host: &mut H, counter: usize) -> Result<()> {
        let now = host.now_ms();
        let Some(state) = self.counters.get_mut(counter) else {
            return Ok(());
        };
        let frame = state.count.frame(now);
        let suffix = host.attr(state.node, "data-suffix").unwrap_or_default();
        host.set_text(state.node, &render_counter(frame.value, &suffix))?;
        if !frame.finished {
            let next = host.request_animation_frame(Task::CountUpFrame { counter });
            self.pending.push(next);
        }
        Ok(())
    }

    fn image_loaded<H: Host>(&self, host: &mut H, event: &mut Event) -> Result<()> {
        match event.current_target {
            Some(image) => host.set_style(image, "opacity", "1"),
            None => Ok(()),
        }
    }
}

fn set_displayed<V: View>(view: &mut V, card: NodeId, shown: bool) -> Result<()> {
    view.set_style(card, "display", if shown { "block" } else { "none" })
}

fn resolve_elements<H: Host>(host: &H, config: &SiteConfig) -> Result<Elements> {
    let ids = &config.ids;
    let required = |id: &str| {
        host.element_by_id(id)
            .ok_or_else(|| Error::SelectorNotFound(format!("#{id}")))
    };

    let menu_toggle = required(&ids.menu_toggle)?;
    let contact_form = required(&ids.contact_form)?;
    let submit_button = host
        .query_first_within(contact_form, SUBMIT_BUTTON_SELECTOR)?
        .ok_or_else(|| {
            Error::SelectorNotFound(format!("#{} {SUBMIT_BUTTON_SELECTOR}", ids.contact_form))
        })?;

    Ok(Elements {
        menu_toggle,
        menu: required(&ids.menu)?,
        menu_bars: host.query_all_within(menu_toggle, MENU_BAR_SELECTOR)?,
        imported_grid: required(&ids.imported_grid)?,
        imported_search: required(&ids.imported_search)?,
        brand_filter: required(&ids.brand_filter)?,
        price_filter: required(&ids.price_filter)?,
        used_grid: required(&ids.used_grid)?,
        used_search: required(&ids.used_search)?,
        year_filter: required(&ids.year_filter)?,
        contact_form,
        fields: FormFields {
            name: required(&ids.name_field)?,
            email: required(&ids.email_field)?,
            phone: required(&ids.phone_field)?,
            inquiry: required(&ids.inquiry_field)?,
            message: required(&ids.message_field)?,
        },
        submit_button,
    })
}
