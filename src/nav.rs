pub const NAV_LINK_SELECTOR: &str = ".nav-link";
pub const ANCHOR_SELECTOR: &str = r##"a[href^="#"]"##;
pub const SECTION_SELECTOR: &str = "section";
pub const HEADER_SELECTOR: &str = ".header";
pub const MENU_BAR_SELECTOR: &str = "span";
pub const ACTIVE_CLASS: &str = "active";

/// Inline styles for the three menu-icon bars, top to bottom.
pub fn icon_bar_styles(open: bool) -> [(&'static str, &'static str); 3] {
    if open {
        [
            ("transform", "rotate(45deg) translate(5px, 5px)"),
            ("opacity", "0"),
            ("transform", "rotate(-45deg) translate(7px, -6px)"),
        ]
    } else {
        [("transform", "none"), ("opacity", "1"), ("transform", "none")]
    }
}

/// Picks the section the reader is in: the last one, in document order, whose
/// top is at most `lookback` px below the scroll position. Sections are given
/// as `(id, offset_top)`. A matching section without an id clears the result.
pub fn current_section<'a>(
    sections: &[(Option<&'a str>, f64)],
    scroll_y: f64,
    lookback: f64,
) -> Option<&'a str> {
    let mut current = None;
    for (id, top) in sections {
        if scroll_y >= top - lookback {
            current = *id;
        }
    }
    current
}

/// Element id named by an in-page href such as `#about`.
pub fn fragment_id(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Scroll position that puts a target's top edge `header_offset` px below the
/// viewport top.
pub fn anchored_scroll_top(client_top: f64, scroll_y: f64, header_offset: f64) -> f64 {
    client_top + scroll_y - header_offset
}
