//! Parameter resolution for opening a confirmation session.

use pay_core::OriginDescriptor;

/// Inputs for a confirmation session.
///
/// When the confirmation runs as an overlay these arrive as in-memory
/// props; when it is opened as a detached window the payment request
/// falls back to a URL query parameter instead.
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    /// BOLT11 payment request string.
    pub payment_request: Option<String>,
    /// Identity of the requesting page.
    pub origin: Option<OriginDescriptor>,
    /// Opaque caller-supplied metadata.
    pub metadata: Option<String>,
}

impl SessionParams {
    /// Params from in-memory props.
    pub fn new(
        payment_request: Option<String>,
        origin: Option<OriginDescriptor>,
        metadata: Option<String>,
    ) -> Self {
        Self {
            payment_request,
            origin,
            metadata,
        }
    }

    /// Fill missing fields from a URL query string, e.g.
    /// `?paymentRequest=lnbc10u1p...`. Props win over query parameters.
    pub fn merge_query(mut self, query: &str) -> Self {
        if self.payment_request.is_none() {
            self.payment_request = query_param(query, "paymentRequest");
        }
        self
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}
