use dealership_site::{Error, Page, Site, SiteConfig, View};

const PAGE: &str = include_str!("fixtures/dealership.html");

const IMPORTED: &str = "#importedCarsGrid .car-card";
const USED: &str = "#usedCarsGrid .car-card";

fn laid_out_site() -> dealership_site::Result<Site> {
    let mut page = Page::from_html(PAGE)?;
    // home, imported, used, about, contact
    page.set_offset_tops("section", &[0.0, 800.0, 1600.0, 2400.0, 3200.0])?;
    page.set_offset_tops(IMPORTED, &[900.0, 900.0, 900.0])?;
    page.set_offset_tops(USED, &[1700.0, 1700.0, 1700.0])?;
    page.set_offset_top(".feature-card", 2500.0)?;
    page.set_offset_top(".info-card", 2500.0)?;
    Site::mount(page, SiteConfig::default())
}

#[test]
fn menu_toggle_twice_is_neutral() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;

    site.click("#hamburger")?;
    site.assert_class("#navMenu", "active", true)?;
    site.assert_style(
        "#hamburger span",
        "transform",
        "rotate(45deg) translate(5px, 5px)",
    )?;
    assert!(site.controller().menu_open());

    site.click("#hamburger")?;
    site.assert_class("#navMenu", "active", false)?;
    site.assert_style("#hamburger span", "transform", "none")?;
    assert!(!site.controller().menu_open());
    Ok(())
}

#[test]
fn nav_link_closes_menu_and_scrolls_below_header() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;
    site.click("#hamburger")?;

    site.click(r##".nav-link[href="#about"]"##)?;
    site.assert_class("#navMenu", "active", false)?;
    assert_eq!(site.page().scroll_y(), 2330.0);
    site.assert_class(r##".nav-link[href="#about"]"##, "active", true)?;
    site.assert_class(r##".nav-link[href="#home"]"##, "active", false)?;
    Ok(())
}

#[test]
fn in_page_anchor_outside_nav_scrolls_too() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;
    site.click("#heroCta")?;
    assert_eq!(site.page().scroll_y(), 730.0);
    site.assert_class("#navMenu", "active", false)?;
    Ok(())
}

#[test]
fn active_link_follows_the_last_section_reached() -> dealership_site::Result<()> {
    let mut page = Page::from_html(PAGE)?;
    page.set_offset_tops("section", &[0.0, 800.0, 1600.0, 2400.0, 3200.0])?;
    let mut site = Site::mount(page, SiteConfig::default())?;

    site.scroll_to(900.0)?;
    site.assert_class(r##".nav-link[href="#imported"]"##, "active", true)?;

    site.scroll_to(1450.0)?;
    site.assert_class(r##".nav-link[href="#used"]"##, "active", true)?;
    site.assert_class(r##".nav-link[href="#imported"]"##, "active", false)?;

    site.scroll_to(0.0)?;
    site.assert_class(r##".nav-link[href="#home"]"##, "active", true)?;
    Ok(())
}

#[test]
fn header_shadow_tracks_scroll_position() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    assert_eq!(site.style(".header", "box-shadow")?, None);

    site.scroll_to(10.0)?;
    site.assert_style(".header", "box-shadow", "0 2px 20px rgba(0,0,0,0.1)")?;

    site.scroll_to(0.0)?;
    site.assert_style(".header", "box-shadow", "0 2px 10px rgba(0,0,0,0.1)")?;
    Ok(())
}

#[test]
fn imported_search_matches_title_or_specs() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;

    site.type_text("#searchImport", "BMW")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["x5"]);

    site.type_text("#searchImport", "sedan")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["corolla", "sclass"]);

    site.type_text("#searchImport", "")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["corolla", "x5", "sclass"]);
    site.assert_style("#x5", "display", "block")?;
    Ok(())
}

#[test]
fn brand_and_price_filters_combine() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;

    site.select_option("#brandFilter", "toyota")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["corolla"]);

    site.select_option("#brandFilter", "")?;
    site.select_option("#priceFilter", "0-20000")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["corolla"]);

    // A listing at exactly 20000 sits in both neighbouring bands.
    site.select_option("#priceFilter", "20000-40000")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["corolla"]);

    site.select_option("#priceFilter", "40000-60000")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["x5"]);

    site.select_option("#priceFilter", "60000+")?;
    site.select_option("#brandFilter", "bmw")?;
    assert_eq!(site.visible_ids(IMPORTED)?, Vec::<String>::new());
    Ok(())
}

#[test]
fn oversized_price_still_counts_as_top_band() -> dealership_site::Result<()> {
    let html = PAGE.replace(r#"data-price="95000""#, r#"data-price="99999999999999999999""#);
    let mut site = Site::from_html(&html)?;

    site.select_option("#priceFilter", "60000+")?;
    assert_eq!(site.visible_ids(IMPORTED)?, vec!["sclass"]);
    Ok(())
}

#[test]
fn imported_filters_leave_used_listings_alone() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    site.type_text("#searchImport", "zzz")?;
    assert_eq!(site.visible_ids(IMPORTED)?, Vec::<String>::new());
    assert_eq!(site.visible_ids(USED)?, vec!["civic", "golf", "classic"]);
    Ok(())
}

#[test]
fn used_year_filter_handles_exact_and_older() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;

    site.select_option("#yearFilter", "2021")?;
    assert_eq!(site.visible_ids(USED)?, vec!["golf"]);

    // A title without a year never counts as older.
    site.select_option("#yearFilter", "older")?;
    assert_eq!(site.visible_ids(USED)?, vec!["civic"]);

    site.select_option("#yearFilter", "")?;
    site.type_text("#searchUsed", "manual")?;
    assert_eq!(site.visible_ids(USED)?, vec!["civic", "classic"]);

    site.select_option("#yearFilter", "2022")?;
    assert_eq!(site.visible_ids(USED)?, Vec::<String>::new());
    Ok(())
}

#[test]
fn submitting_the_form_acknowledges_and_resets() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    site.page_mut().take_console_logs();

    site.type_text("#name", "Ana Silva")?;
    site.type_text("#email", "ana@example.com")?;
    site.type_text("#phone", "555-0100")?;
    site.select_option("#inquiry", "used")?;
    site.type_text("#message", "Is the Civic still available?")?;
    site.click("#sendButton")?;

    assert_eq!(
        site.page_mut().take_alert_messages(),
        vec!["Thank you for contacting ODO Motors! We will get back to you soon.".to_string()]
    );
    assert_eq!(
        site.page_mut().take_console_logs(),
        vec![
            r#"Form submitted: {name: "Ana Silva", email: "ana@example.com", phone: "555-0100", inquiry: "used", message: "Is the Civic still available?"}"#
                .to_string()
        ]
    );
    site.assert_value("#name", "")?;
    site.assert_value("#email", "")?;
    site.assert_value("#phone", "")?;
    site.assert_value("#inquiry", "")?;
    site.assert_value("#message", "")?;
    Ok(())
}

#[test]
fn submitting_an_empty_form_logs_the_empty_inquiry() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    site.page_mut().take_console_logs();

    site.submit("#contactForm")?;

    assert_eq!(
        site.page_mut().take_console_logs(),
        vec![
            r#"Form submitted: {name: "", email: "", phone: "", inquiry: "", message: ""}"#
                .to_string()
        ]
    );
    assert_eq!(site.page_mut().take_alert_messages().len(), 1);
    site.assert_value("#phone", "")?;
    Ok(())
}

#[test]
fn submit_button_shows_sending_then_restores() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;

    site.click("#sendButton")?;
    site.assert_text("#sendButton", "Sending...")?;
    site.assert_disabled("#sendButton", true)?;

    // Disabled controls swallow clicks.
    site.click("#sendButton")?;
    assert_eq!(site.page_mut().take_alert_messages().len(), 1);

    site.advance_time(1999)?;
    site.assert_text("#sendButton", "Sending...")?;
    site.advance_time(1)?;
    site.assert_text("#sendButton", "Send Message")?;
    site.assert_disabled("#sendButton", false)?;
    Ok(())
}

#[test]
fn contact_button_scrolls_and_prefills_after_delay() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;

    site.click("#contactX5")?;
    assert_eq!(site.page().scroll_y(), 3200.0);
    site.assert_value("#message", "")?;

    site.advance_time(499)?;
    site.assert_value("#message", "")?;
    site.advance_time(1)?;
    site.assert_value(
        "#message",
        "I am interested in the 2023 BMW X5 listed at $58,900. Please provide more information.",
    )?;
    site.assert_value("#inquiry", "import")?;

    site.click("#contactCivic")?;
    site.flush()?;
    site.assert_value("#inquiry", "used")?;
    Ok(())
}

#[test]
fn listings_reveal_as_they_approach_the_viewport() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;
    site.assert_style("#corolla", "opacity", "0")?;
    site.assert_style("#corolla", "transform", "translateY(50px)")?;
    site.assert_style("#corolla", "transition", "all 0.6s ease")?;

    site.load()?;
    site.assert_style("#corolla", "opacity", "0")?;

    // 900 - 201 = 699, just inside the 700px trigger line.
    site.scroll_to(201.0)?;
    site.assert_style("#corolla", "opacity", "1")?;
    site.assert_style("#sclass", "transform", "translateY(0)")?;
    site.assert_style("#civic", "opacity", "0")?;

    site.scroll_to(1001.0)?;
    site.assert_style("#civic", "opacity", "1")?;
    site.assert_style("#featureWarranty", "opacity", "0")?;

    // Revealed cards stay revealed.
    site.scroll_to(0.0)?;
    site.assert_style("#corolla", "opacity", "1")?;
    Ok(())
}

#[test]
fn images_fade_in_once_loaded() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    site.assert_style("#x5 img", "opacity", "0")?;
    site.assert_style("#x5 img", "transition", "opacity 0.3s ease")?;

    site.dispatch("#x5 img", "load")?;
    site.assert_style("#x5 img", "opacity", "1")?;
    site.assert_style("#civic img", "opacity", "0")?;

    site.load()?;
    site.assert_style("#civic img", "opacity", "1")?;
    Ok(())
}

#[test]
fn stats_count_up_once_when_about_comes_into_view() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;

    site.scroll_to(1700.0)?;
    assert!(!site.controller().stats_animated());

    site.scroll_to(1701.0)?;
    assert!(site.controller().stats_animated());
    site.assert_text(".stat h3", "500+")?;

    site.advance_time(16)?;
    site.assert_text(".stat h3", "0+")?;

    site.advance_time(800)?;
    site.assert_text(".stat h3", "200+")?;

    site.flush()?;
    site.assert_text(".stat h3", "500+")?;
    assert!(site.page().pending_timers().is_empty());

    site.scroll_to(0.0)?;
    site.scroll_to(1800.0)?;
    assert!(site.page().pending_timers().is_empty());
    site.assert_text(".stat h3", "500+")?;
    Ok(())
}

#[test]
fn count_up_follows_the_frame_clock() -> dealership_site::Result<()> {
    let mut page = Page::from_html(PAGE)?;
    page.set_frame_interval(100)?;
    let mut site = Site::mount(page, SiteConfig::default())?;

    site.scroll_to(1.0)?;
    site.advance_time(100)?;
    site.assert_text(".stat h3", "0+")?;
    site.advance_time(1000)?;
    site.assert_text(".stat h3", "250+")?;
    site.advance_time(1000)?;
    site.assert_text(".stat h3", "500+")?;
    assert!(site.page().pending_timers().is_empty());
    Ok(())
}

#[test]
fn every_stat_reaches_its_own_target() -> dealership_site::Result<()> {
    let mut site = Site::from_html(PAGE)?;
    site.scroll_to(1.0)?;
    site.flush()?;

    let texts = site
        .page()
        .query_all(".stat h3")?
        .into_iter()
        .map(|node| site.page().text(node))
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["500+", "1000+", "5+"]);
    Ok(())
}

#[test]
fn teardown_cancels_deferred_work() -> dealership_site::Result<()> {
    let mut site = laid_out_site()?;
    site.click("#contactCorolla")?;
    site.click("#sendButton")?;
    site.scroll_to(1701.0)?;
    assert_eq!(site.controller().pending_tasks().len(), 5);

    assert_eq!(site.teardown(), 5);
    assert!(site.page().pending_timers().is_empty());

    site.advance_time(5000)?;
    site.assert_value("#message", "")?;
    site.assert_text("#sendButton", "Sending...")?;
    site.assert_text(".stat h3", "500+")?;
    assert_eq!(site.teardown(), 0);
    Ok(())
}

#[test]
fn missing_required_element_fails_mount() {
    let html = PAGE.replace(r#"id="contactForm""#, r#"id="inquiryForm""#);
    assert_eq!(
        Site::from_html(&html).err(),
        Some(Error::SelectorNotFound("#contactForm".into()))
    );
}
