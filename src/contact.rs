use std::fmt;

use crate::filter::CardStatus;

pub const CONTACT_BUTTON_SELECTOR: &str = ".btn-contact";
pub const SUBMIT_BUTTON_SELECTOR: &str = r#"button[type="submit"]"#;

/// What a visitor typed into the contact form. Logged and dropped; nothing is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub inquiry: String,
    pub message: String,
}

impl fmt::Display for ContactInquiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name: {:?}, email: {:?}, phone: {:?}, inquiry: {:?}, message: {:?}}}",
            self.name, self.email, self.phone, self.inquiry, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryType {
    Import,
    Used,
}

impl InquiryType {
    pub fn for_status(status: CardStatus) -> Self {
        match status {
            CardStatus::New => Self::Import,
            CardStatus::Used => Self::Used,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Used => "used",
        }
    }
}

pub fn prefill_message(title: &str, price: &str) -> String {
    format!("I am interested in the {title} listed at {price}. Please provide more information.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefill_message_names_car_and_price() {
        assert_eq!(
            prefill_message("2022 BMW X5", "$58,900"),
            "I am interested in the 2022 BMW X5 listed at $58,900. Please provide more information."
        );
    }

    #[test]
    fn inquiry_type_follows_card_status() {
        assert_eq!(InquiryType::for_status(CardStatus::New).as_str(), "import");
        assert_eq!(InquiryType::for_status(CardStatus::Used).as_str(), "used");
    }

    #[test]
    fn inquiry_display_quotes_every_field() {
        let inquiry = ContactInquiry {
            name: "Ana".into(),
            message: "Hi \"there\"".into(),
            ..ContactInquiry::default()
        };
        assert_eq!(
            inquiry.to_string(),
            r#"{name: "Ana", email: "", phone: "", inquiry: "", message: "Hi \"there\""}"#
        );
    }
}
