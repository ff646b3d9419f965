//! Screening of free text typed by the customer.

use rustrict::CensorStr;

/// `true` when `text` contains profanity or other language the shop refuses
/// to put in front of the seller.
pub fn contains_inappropriate(text: &str) -> bool {
    text.is_inappropriate()
}
