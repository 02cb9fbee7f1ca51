//! Page-declared payment recipient detection.
//!
//! A hosting page may declare a single payment-recipient tag (a
//! meta-style value). This crate classifies that tag's content into a
//! typed [`RecipientDescriptor`] and pairs it with the page's
//! [`OriginDescriptor`], producing at most one [`SiteLightningData`] per
//! page. An absent tag is a no-op; a malformed tag fails closed rather
//! than yielding a descriptor with missing fields.
//!
//! # Example
//!
//! ```rust
//! use detector::detect;
//! use pay_core::OriginDescriptor;
//!
//! let origin = OriginDescriptor::new("podcast.example", "Example Podcast", "icon.png");
//! let data = detect(Some("lnurlp:tips@podcast.example"), &origin).unwrap();
//! assert!(data.is_some());
//! assert!(detect(None, &origin).unwrap().is_none());
//! ```

mod error;
mod recipient;

pub use error::DetectorError;
pub use recipient::parse_recipient;

use pay_core::{OriginDescriptor, RecipientDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A detected payment target: the page-declared recipient plus the
/// identity of the page declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLightningData {
    /// The declared payment target.
    pub recipient: RecipientDescriptor,
    /// Identity of the declaring page.
    pub origin: OriginDescriptor,
}

/// Scan a page's recipient tag content, if any.
///
/// Returns `Ok(None)` when the page declares no tag, `Ok(Some(..))` with
/// a validated descriptor otherwise. At most one recipient is produced
/// per page.
pub fn detect(
    tag_content: Option<&str>,
    origin: &OriginDescriptor,
) -> Result<Option<SiteLightningData>, DetectorError> {
    let Some(content) = tag_content else {
        return Ok(None);
    };

    let recipient = parse_recipient(content)?;
    debug!("detected {} recipient on {}", method_name(&recipient), origin.host);

    Ok(Some(SiteLightningData {
        recipient,
        origin: origin.clone(),
    }))
}

fn method_name(recipient: &RecipientDescriptor) -> &'static str {
    match recipient {
        RecipientDescriptor::Lnurl { .. } => "lnurl",
        RecipientDescriptor::Keysend { .. } => "keysend",
    }
}
