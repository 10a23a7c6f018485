use crate::{Error, Result};

/// Element ids the controller resolves when it mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementIds {
    pub menu_toggle: String,
    pub menu: String,
    pub imported_grid: String,
    pub imported_search: String,
    pub brand_filter: String,
    pub price_filter: String,
    pub used_grid: String,
    pub used_search: String,
    pub year_filter: String,
    pub contact_form: String,
    pub name_field: String,
    pub email_field: String,
    pub phone_field: String,
    pub inquiry_field: String,
    pub message_field: String,
    pub about_section: String,
    pub contact_section: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            menu_toggle: "hamburger".into(),
            menu: "navMenu".into(),
            imported_grid: "importedCarsGrid".into(),
            imported_search: "searchImport".into(),
            brand_filter: "brandFilter".into(),
            price_filter: "priceFilter".into(),
            used_grid: "usedCarsGrid".into(),
            used_search: "searchUsed".into(),
            year_filter: "yearFilter".into(),
            contact_form: "contactForm".into(),
            name_field: "name".into(),
            email_field: "email".into(),
            phone_field: "phone".into(),
            inquiry_field: "inquiry".into(),
            message_field: "message".into(),
            about_section: "about".into(),
            contact_section: "contact".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site_name: String,
    pub ids: ElementIds,
    pub header_offset_px: f64,
    pub section_lookback_px: f64,
    pub reveal_margin_px: f64,
    pub stats_margin_px: f64,
    pub count_up_duration_ms: i64,
    pub stat_targets: Vec<i64>,
    pub stat_suffix: String,
    pub prefill_delay_ms: i64,
    pub button_reset_delay_ms: i64,
    pub sending_label: String,
    pub older_year_cutoff: i64,
    pub header_shadow_scrolled: String,
    pub header_shadow_resting: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "ODO Motors".into(),
            ids: ElementIds::default(),
            header_offset_px: 70.0,
            section_lookback_px: 150.0,
            reveal_margin_px: 100.0,
            stats_margin_px: 100.0,
            count_up_duration_ms: 2000,
            stat_targets: vec![500, 1000, 5],
            stat_suffix: "+".into(),
            prefill_delay_ms: 500,
            button_reset_delay_ms: 2000,
            sending_label: "Sending...".into(),
            older_year_cutoff: 2019,
            header_shadow_scrolled: "0 2px 20px rgba(0,0,0,0.1)".into(),
            header_shadow_resting: "0 2px 10px rgba(0,0,0,0.1)".into(),
        }
    }
}

impl SiteConfig {
    pub fn with_site_name(mut self, name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidConfig("site name must not be empty".into()));
        }
        self.site_name = name.to_string();
        Ok(self)
    }

    pub fn with_ids(mut self, ids: ElementIds) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_header_offset(mut self, px: f64) -> Result<Self> {
        self.header_offset_px = non_negative("header offset", px)?;
        Ok(self)
    }

    pub fn with_section_lookback(mut self, px: f64) -> Result<Self> {
        self.section_lookback_px = non_negative("section lookback", px)?;
        Ok(self)
    }

    pub fn with_reveal_margin(mut self, px: f64) -> Result<Self> {
        self.reveal_margin_px = non_negative("reveal margin", px)?;
        Ok(self)
    }

    pub fn with_stats_margin(mut self, px: f64) -> Result<Self> {
        self.stats_margin_px = non_negative("stats margin", px)?;
        Ok(self)
    }

    pub fn with_count_up_duration(mut self, duration_ms: i64) -> Result<Self> {
        if duration_ms <= 0 {
            return Err(Error::InvalidConfig(format!(
                "count-up duration must be positive (got {duration_ms})"
            )));
        }
        self.count_up_duration_ms = duration_ms;
        Ok(self)
    }

    pub fn with_stat_targets(mut self, targets: &[i64]) -> Result<Self> {
        if targets.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one stat target is required".into(),
            ));
        }
        self.stat_targets = targets.to_vec();
        Ok(self)
    }

    pub fn with_prefill_delay(mut self, delay_ms: i64) -> Result<Self> {
        self.prefill_delay_ms = non_negative_ms("prefill delay", delay_ms)?;
        Ok(self)
    }

    pub fn with_button_reset_delay(mut self, delay_ms: i64) -> Result<Self> {
        self.button_reset_delay_ms = non_negative_ms("button reset delay", delay_ms)?;
        Ok(self)
    }

    pub fn acknowledgement(&self) -> String {
        format!(
            "Thank you for contacting {}! We will get back to you soon.",
            self.site_name
        )
    }

    pub fn loaded_banner(&self) -> String {
        format!("{} website loaded successfully!", self.site_name)
    }
}

fn non_negative(what: &str, px: f64) -> Result<f64> {
    if !px.is_finite() || px < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "{what} must be a non-negative number of pixels (got {px})"
        )));
    }
    Ok(px)
}

fn non_negative_ms(what: &str, ms: i64) -> Result<i64> {
    if ms < 0 {
        return Err(Error::InvalidConfig(format!(
            "{what} requires non-negative milliseconds (got {ms})"
        )));
    }
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_page() {
        let config = SiteConfig::default();
        assert_eq!(config.header_offset_px, 70.0);
        assert_eq!(config.section_lookback_px, 150.0);
        assert_eq!(config.stat_targets, vec![500, 1000, 5]);
        assert_eq!(
            config.acknowledgement(),
            "Thank you for contacting ODO Motors! We will get back to you soon."
        );
        assert_eq!(
            config.loaded_banner(),
            "ODO Motors website loaded successfully!"
        );
    }

    #[test]
    fn builders_reject_invalid_values() {
        assert!(matches!(
            SiteConfig::default().with_count_up_duration(0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SiteConfig::default().with_header_offset(-1.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SiteConfig::default().with_stat_targets(&[]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SiteConfig::default().with_prefill_delay(-5),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn builders_chain() -> Result<()> {
        let config = SiteConfig::default()
            .with_site_name("Harbor Autos")?
            .with_header_offset(64.0)?
            .with_count_up_duration(1000)?;
        assert_eq!(config.header_offset_px, 64.0);
        assert_eq!(config.count_up_duration_ms, 1000);
        assert!(config.acknowledgement().contains("Harbor Autos"));
        Ok(())
    }
}
