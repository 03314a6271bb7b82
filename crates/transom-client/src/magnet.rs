//! Structural validation of magnet URIs before they reach the daemon.

use url::Url;

use transom_types::Error;

/// Validate an add source.
///
/// Magnet-shaped inputs must carry the `magnet:` scheme and a parseable
/// BitTorrent info-hash (`xt=urn:btih:` with 40 hex or 32 base32
/// characters); anything malformed fails fast here instead of costing a
/// daemon round trip. Non-magnet inputs (HTTP URLs, file paths, base64
/// metainfo) pass through untouched.
pub(crate) fn validate_source(source: &str) -> Result<(), Error> {
    if source.starts_with("magnet:") {
        return validate_magnet(source);
    }
    if source.contains("xt=urn:btih:") {
        return Err(Error::Validation(
            "magnet URI is missing the magnet: scheme".to_string(),
        ));
    }
    Ok(())
}

fn validate_magnet(source: &str) -> Result<(), Error> {
    let uri = Url::parse(source)
        .map_err(|e| Error::Validation(format!("malformed magnet URI: {e}")))?;

    let mut saw_xt = false;
    for (key, value) in uri.query_pairs() {
        if key != "xt" {
            continue;
        }
        saw_xt = true;
        if let Some(hash) = value.strip_prefix("urn:btih:") {
            return if is_info_hash(hash) {
                Ok(())
            } else {
                Err(Error::Validation(format!(
                    "magnet URI carries a malformed info-hash: {hash}"
                )))
            };
        }
    }

    if saw_xt {
        Err(Error::Validation(
            "magnet URI names no BitTorrent info-hash (urn:btih)".to_string(),
        ))
    } else {
        Err(Error::Validation(
            "magnet URI is missing the xt parameter".to_string(),
        ))
    }
}

/// 40 hex characters (either case), or 32 characters of the RFC 4648
/// base32 alphabet, which is uppercase-only (A-Z, 2-7).
fn is_info_hash(hash: &str) -> bool {
    match hash.len() {
        40 => hash.bytes().all(|b| b.is_ascii_hexdigit()),
        32 => hash
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_HASH: &str = "c12fe1c06bba254a9dc9f519b335aa7c1367a88a";

    #[test]
    fn hex_magnet_is_accepted() {
        let uri = format!("magnet:?xt=urn:btih:{HEX_HASH}&dn=fedora.iso");
        assert!(validate_source(&uri).is_ok());
    }

    #[test]
    fn base32_magnet_is_accepted() {
        let uri = "magnet:?xt=urn:btih:YNCKHTQCWBTRNJIV4WNAE52SJUQCZO5C";
        assert!(validate_source(uri).is_ok());
    }

    #[test]
    fn lowercase_base32_hash_is_rejected() {
        // RFC 4648 base32 is uppercase-only.
        let uri = "magnet:?xt=urn:btih:ynckhtqcwbtrnjiv4wnae52sjuqczo5c";
        assert!(validate_source(uri).is_err());

        let mixed = "magnet:?xt=urn:btih:YNCKHTQCWBTRNJIV4WNAE52SJUQCzo5c";
        assert!(validate_source(mixed).is_err());
    }

    #[test]
    fn missing_scheme_is_rejected() {
        let err = validate_source(&format!("?xt=urn:btih:{HEX_HASH}")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let err = validate_source("magnet:?xt=urn:btih:abc123").unwrap_err();
        match err {
            Error::Validation(message) => assert!(message.contains("info-hash")),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn non_hex_hash_is_rejected() {
        let uri = "magnet:?xt=urn:btih:zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";
        assert!(validate_source(uri).is_err());
    }

    #[test]
    fn missing_xt_is_rejected() {
        let err = validate_source("magnet:?dn=fedora.iso").unwrap_err();
        match err {
            Error::Validation(message) => assert!(message.contains("xt")),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn non_btih_xt_is_rejected() {
        let err = validate_source("magnet:?xt=urn:sha1:ABCDEF").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn http_urls_pass_through() {
        assert!(validate_source("https://example.org/fedora.torrent").is_ok());
    }

    #[test]
    fn base64_payloads_pass_through() {
        assert!(validate_source("ZDg6YW5ub3VuY2Ux").is_ok());
    }
}
