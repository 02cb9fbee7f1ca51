//! Recipient tag parsing and classification.

use std::collections::HashMap;

use pay_core::RecipientDescriptor;

use crate::error::DetectorError;

/// Parse the content of a page-declared recipient tag.
///
/// Content is classified by shape, first match wins:
///
/// 1. A `lnurlp:` prefixed value, or a bare value with no `=`, is a
///    Lightning address.
/// 2. Anything else is a semicolon-delimited list of `key=value` tokens,
///    parsed into a bag and then classified into a typed descriptor.
pub fn parse_recipient(content: &str) -> Result<RecipientDescriptor, DetectorError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DetectorError::EmptyTag);
    }

    // Shorthand forms: a prefixed or bare lightning address.
    let lowered = content.to_ascii_lowercase();
    if let Some(stripped) = lowered.strip_prefix("lnurlp:") {
        // Preserve the original casing of the address itself.
        let address = content[content.len() - stripped.len()..].trim();
        return lnurl_recipient(address);
    }
    if !content.contains('=') {
        return lnurl_recipient(content);
    }

    classify(parse_bag(content))
}

fn lnurl_recipient(address: &str) -> Result<RecipientDescriptor, DetectorError> {
    if address.is_empty() {
        return Err(DetectorError::MissingField("address"));
    }
    Ok(RecipientDescriptor::Lnurl {
        address: address.to_string(),
    })
}

/// Parse `key=value;key=value` content into a free-form bag.
///
/// Keys and values are trimmed, empty tokens are skipped and unknown
/// keys pass through unchanged; classification decides what the bag
/// means.
fn parse_bag(content: &str) -> HashMap<String, String> {
    let mut bag = HashMap::new();
    for token in content.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (token, ""),
        };
        bag.insert(key.to_string(), value.to_string());
    }
    bag
}

/// Classify a parsed bag into a typed descriptor.
///
/// Fails closed: a bag without the fields its method requires is an
/// error, not a half-filled descriptor.
fn classify(mut bag: HashMap<String, String>) -> Result<RecipientDescriptor, DetectorError> {
    let method = bag
        .remove("method")
        .filter(|m| !m.is_empty())
        .ok_or(DetectorError::MissingField("method"))?;
    let address = bag
        .remove("address")
        .filter(|a| !a.is_empty())
        .ok_or(DetectorError::MissingField("address"))?;

    match method.as_str() {
        "lnurl" => Ok(RecipientDescriptor::Lnurl { address }),
        "keysend" => {
            let mut custom_records = HashMap::new();
            if let (Some(key), Some(value)) = (bag.remove("customkey"), bag.remove("customvalue")) {
                if !key.is_empty() {
                    custom_records.insert(key, value);
                }
            }
            Ok(RecipientDescriptor::Keysend {
                address,
                custom_records,
            })
        }
        other => Err(DetectorError::UnsupportedMethod(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lnurlp_prefix() {
        let recipient = parse_recipient("lnurlp:foo@bar.com").unwrap();
        assert_eq!(
            recipient,
            RecipientDescriptor::Lnurl {
                address: "foo@bar.com".to_string()
            }
        );
    }

    #[test]
    fn test_lnurlp_prefix_is_case_insensitive() {
        let recipient = parse_recipient("LNURLP:Foo@Bar.com").unwrap();
        assert_eq!(
            recipient,
            RecipientDescriptor::Lnurl {
                address: "Foo@Bar.com".to_string()
            }
        );
    }

    #[test]
    fn test_bare_address() {
        let recipient = parse_recipient("foo@bar.com").unwrap();
        assert_eq!(
            recipient,
            RecipientDescriptor::Lnurl {
                address: "foo@bar.com".to_string()
            }
        );
    }

    #[test]
    fn test_keysend_with_custom_records() {
        let recipient =
            parse_recipient("method=keysend;address=03ab;customkey=700001;customvalue=hello")
                .unwrap();
        let RecipientDescriptor::Keysend {
            address,
            custom_records,
        } = recipient
        else {
            panic!("expected keysend recipient");
        };
        assert_eq!(address, "03ab");
        assert_eq!(custom_records.get("700001").map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_keysend_without_custom_records() {
        let recipient = parse_recipient("method=keysend;address=03ab").unwrap();
        let RecipientDescriptor::Keysend { custom_records, .. } = recipient else {
            panic!("expected keysend recipient");
        };
        assert!(custom_records.is_empty());
    }

    #[test]
    fn test_explicit_lnurl_method() {
        let recipient = parse_recipient("method=lnurl;address=foo@bar.com").unwrap();
        assert_eq!(
            recipient,
            RecipientDescriptor::Lnurl {
                address: "foo@bar.com".to_string()
            }
        );
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let recipient = parse_recipient(" method = keysend ; address = 03ab ; ").unwrap();
        assert_eq!(recipient.address(), "03ab");
    }

    #[test]
    fn test_unknown_keys_pass_through_harmlessly() {
        let recipient =
            parse_recipient("method=keysend;address=03ab;comment=thanks;color=orange").unwrap();
        assert_eq!(recipient.address(), "03ab");
    }

    #[test]
    fn test_missing_method_fails_closed() {
        let result = parse_recipient("address=03ab;customkey=1");
        assert_eq!(result, Err(DetectorError::MissingField("method")));
    }

    #[test]
    fn test_missing_address_fails_closed() {
        let result = parse_recipient("method=keysend;customkey=1");
        assert_eq!(result, Err(DetectorError::MissingField("address")));
    }

    #[test]
    fn test_empty_address_value_fails_closed() {
        let result = parse_recipient("method=lnurl;address=");
        assert_eq!(result, Err(DetectorError::MissingField("address")));
    }

    #[test]
    fn test_unsupported_method_fails_closed() {
        let result = parse_recipient("method=onchain;address=bc1q...");
        assert_eq!(
            result,
            Err(DetectorError::UnsupportedMethod("onchain".to_string()))
        );
    }

    #[test]
    fn test_empty_tag() {
        assert_eq!(parse_recipient("   "), Err(DetectorError::EmptyTag));
        assert_eq!(parse_recipient("lnurlp:"), Err(DetectorError::MissingField("address")));
    }
}
