//! Card filtering for the imported and used listings.
//!
//! Filters only decide visibility. Nothing here mutates card markup; the
//! controller turns a verdict into `display: block` or `display: none`.

use crate::Result;
use crate::dom::NodeId;
use crate::host::View;
use crate::pattern::Pattern;

pub const CARD_SELECTOR: &str = ".car-card";
pub const TITLE_SELECTOR: &str = ".car-title";
pub const SPECS_SELECTOR: &str = ".car-specs";
pub const PRICE_SELECTOR: &str = ".car-price";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    New,
    Used,
}

impl CardStatus {
    /// Only an exact `new` counts as new; anything else, including a missing
    /// attribute, is a used listing.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("new") => Self::New,
            _ => Self::Used,
        }
    }
}

/// The filterable view of one listing, read fresh from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarCard {
    pub brand: String,
    pub price: Option<i64>,
    pub status: CardStatus,
    pub title: String,
    pub specs: String,
    pub price_label: String,
}

impl CarCard {
    pub fn read<V: View + ?Sized>(view: &V, card: NodeId) -> Result<Self> {
        let nested_text = |selector: &str| -> Result<String> {
            Ok(view
                .query_first_within(card, selector)?
                .map(|node| view.text(node))
                .unwrap_or_default())
        };

        Ok(Self {
            brand: view.attr(card, "data-brand").unwrap_or_default(),
            price: view
                .attr(card, "data-price")
                .as_deref()
                .and_then(parse_leading_int),
            status: CardStatus::from_attr(view.attr(card, "data-status").as_deref()),
            title: nested_text(TITLE_SELECTOR)?,
            specs: nested_text(SPECS_SELECTOR)?,
            price_label: nested_text(PRICE_SELECTOR)?,
        })
    }

    fn matches_search(&self, term: &str) -> bool {
        term.is_empty()
            || self.title.to_lowercase().contains(term)
            || self.specs.to_lowercase().contains(term)
    }
}

/// Integer prefix parse: leading whitespace, optional sign, then digits.
/// `"25,000"` reads as 25 and `"n/a"` as nothing. Digit runs past the `i64`
/// range saturate.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].bytes().fold(0i64, |acc, digit| {
        let digit = i64::from(digit - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}

/// Price buckets offered by the imported-cars selector. Adjacent bands share
/// their boundary value, so a 20000 listing is in both of the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    UpTo20k,
    From20kTo40k,
    From40kTo60k,
    From60k,
}

impl PriceBand {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "0-20000" => Some(Self::UpTo20k),
            "20000-40000" => Some(Self::From20kTo40k),
            "40000-60000" => Some(Self::From40kTo60k),
            "60000+" => Some(Self::From60k),
            _ => None,
        }
    }

    pub fn contains(self, price: i64) -> bool {
        match self {
            Self::UpTo20k => price <= 20_000,
            Self::From20kTo40k => (20_000..=40_000).contains(&price),
            Self::From40kTo60k => (40_000..=60_000).contains(&price),
            Self::From60k => price >= 60_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
    term: String,
    brand: Option<String>,
    price: Option<PriceBand>,
}

impl ImportFilter {
    /// Builds the filter from raw control values. Empty values are inactive,
    /// and a price value that names no known band is inactive too.
    pub fn from_controls(search: &str, brand: &str, price: &str) -> Self {
        Self {
            term: search.to_lowercase(),
            brand: (!brand.is_empty()).then(|| brand.to_lowercase()),
            price: PriceBand::parse(price),
        }
    }

    pub fn matches(&self, card: &CarCard) -> bool {
        let matches_brand = self
            .brand
            .as_deref()
            .is_none_or(|brand| card.brand.to_lowercase() == brand);
        let matches_price = match self.price {
            None => true,
            Some(band) => card.price.is_some_and(|price| band.contains(price)),
        };
        card.matches_search(&self.term) && matches_brand && matches_price
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearBand {
    /// Extracted year at or below the cutoff.
    Older { cutoff: i64 },
    Exact(String),
}

impl YearBand {
    pub fn parse(value: &str, older_cutoff: i64) -> Option<Self> {
        match value {
            "" => None,
            "older" => Some(Self::Older {
                cutoff: older_cutoff,
            }),
            year => Some(Self::Exact(year.to_string())),
        }
    }

    pub fn contains(&self, year: Option<&str>) -> bool {
        match self {
            Self::Older { cutoff } => year
                .and_then(parse_leading_int)
                .is_some_and(|year| year <= *cutoff),
            Self::Exact(expected) => year == Some(expected.as_str()),
        }
    }
}

/// Pulls the first four-digit run out of a listing title.
#[derive(Debug, Clone)]
pub struct YearExtractor {
    pattern: Pattern,
}

impl YearExtractor {
    pub fn new() -> Result<Self> {
        // ASCII digits only.
        let pattern = Pattern::new("[0-9]{4}")?;
        Ok(Self { pattern })
    }

    pub fn extract(&self, title: &str) -> Result<Option<String>> {
        Ok(self.pattern.find(title)?.map(ToOwned::to_owned))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedFilter {
    term: String,
    year: Option<YearBand>,
}

impl UsedFilter {
    pub fn from_controls(search: &str, year: &str, older_cutoff: i64) -> Self {
        Self {
            term: search.to_lowercase(),
            year: YearBand::parse(year, older_cutoff),
        }
    }

    pub fn matches(&self, card: &CarCard, extractor: &YearExtractor) -> Result<bool> {
        if !card.matches_search(&self.term) {
            return Ok(false);
        }
        let Some(band) = &self.year else {
            return Ok(true);
        };
        let year = extractor.extract(&card.title)?;
        Ok(band.contains(year.as_deref()))
    }
}
