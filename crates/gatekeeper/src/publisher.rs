//! Routing for a recipient the detector found on the hosting page.

use std::collections::HashMap;

use detector::SiteLightningData;
use pay_core::{LnurlPayDetails, LnurlResolver, OriginDescriptor, RecipientDescriptor};
use tracing::info;

use crate::error::GateError;

/// Where sending sats to a detected site recipient should navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherSend {
    /// Resolved LNURL-pay flow.
    LnurlPay {
        /// Origin of the declaring page, marked external.
        origin: OriginDescriptor,
        /// Resolved pay details.
        details: LnurlPayDetails,
    },
    /// Direct keysend flow.
    Keysend {
        /// Origin of the declaring page, marked external.
        origin: OriginDescriptor,
        /// Destination node pubkey.
        destination: String,
        /// TLV records attached to the payment.
        custom_records: HashMap<String, String>,
    },
}

/// Route a detected site recipient to its payment flow.
///
/// LNURL recipients are resolved through the injected resolver and only
/// `payRequest`-tagged details proceed; keysend recipients navigate
/// directly with their custom records.
pub async fn send_to_site(
    data: &SiteLightningData,
    resolver: &dyn LnurlResolver,
) -> Result<PublisherSend, GateError> {
    let origin = data.origin.clone().external();

    match &data.recipient {
        RecipientDescriptor::Lnurl { address } => {
            let details = resolver.resolve(address).await?;
            if !details.is_pay_request() {
                return Err(GateError::NotPayable(details.tag));
            }
            info!("resolved lnurl recipient for {}", origin.host);
            Ok(PublisherSend::LnurlPay { origin, details })
        }
        RecipientDescriptor::Keysend {
            address,
            custom_records,
        } => Ok(PublisherSend::Keysend {
            origin,
            destination: address.clone(),
            custom_records: custom_records.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::{async_trait, UpstreamError};

    struct StaticResolver {
        tag: &'static str,
    }

    #[async_trait]
    impl LnurlResolver for StaticResolver {
        async fn resolve(&self, _address: &str) -> Result<LnurlPayDetails, UpstreamError> {
            Ok(LnurlPayDetails {
                tag: self.tag.to_string(),
                callback: "https://pay.example/cb".to_string(),
                min_sendable: 1_000,
                max_sendable: 1_000_000,
            })
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl LnurlResolver for FailingResolver {
        async fn resolve(&self, _address: &str) -> Result<LnurlPayDetails, UpstreamError> {
            Err(UpstreamError::new("lnurl", "endpoint unreachable"))
        }
    }

    fn site(recipient: RecipientDescriptor) -> SiteLightningData {
        SiteLightningData {
            recipient,
            origin: OriginDescriptor::new("podcast.example", "Example Podcast", "icon.png"),
        }
    }

    #[tokio::test]
    async fn test_lnurl_recipient_routes_to_pay_flow() {
        let data = site(RecipientDescriptor::Lnurl {
            address: "tips@podcast.example".to_string(),
        });
        let send = send_to_site(&data, &StaticResolver { tag: "payRequest" })
            .await
            .unwrap();
        let PublisherSend::LnurlPay { origin, details } = send else {
            panic!("expected lnurl pay flow");
        };
        assert!(origin.external);
        assert!(details.is_pay_request());
    }

    #[tokio::test]
    async fn test_non_pay_request_tag_is_rejected() {
        let data = site(RecipientDescriptor::Lnurl {
            address: "tips@podcast.example".to_string(),
        });
        let result = send_to_site(&data, &StaticResolver { tag: "withdrawRequest" }).await;
        assert!(matches!(result, Err(GateError::NotPayable(tag)) if tag == "withdrawRequest"));
    }

    #[tokio::test]
    async fn test_resolver_failure_surfaces_upstream() {
        let data = site(RecipientDescriptor::Lnurl {
            address: "tips@podcast.example".to_string(),
        });
        let result = send_to_site(&data, &FailingResolver).await;
        assert!(matches!(result, Err(GateError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_keysend_recipient_carries_custom_records() {
        let mut custom_records = HashMap::new();
        custom_records.insert("700001".to_string(), "hello".to_string());
        let data = site(RecipientDescriptor::Keysend {
            address: "03ab".to_string(),
            custom_records: custom_records.clone(),
        });

        let send = send_to_site(&data, &StaticResolver { tag: "payRequest" })
            .await
            .unwrap();
        let PublisherSend::Keysend {
            destination,
            custom_records: records,
            ..
        } = send
        else {
            panic!("expected keysend flow");
        };
        assert_eq!(destination, "03ab");
        assert_eq!(records, custom_records);
    }
}
