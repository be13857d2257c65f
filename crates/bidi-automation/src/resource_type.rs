//! Maps BiDi request initiator-type tokens onto the canonical resource-type
//! vocabulary used by the request/response middleware. Originally the
//! canonical set came from the Chrome debugging protocol, so intercept
//! matching behaves identically regardless of which backend drives the
//! browser.

use automation_core::ResourceType;

/// Total mapping from an initiator-type token to a canonical resource type.
///
/// Tokens the middleware cannot act on collapse to `other`; everything else
/// passes through, including tokens a future protocol revision may add.
pub fn normalize_resource_type(initiator_type: Option<&str>) -> ResourceType {
    match initiator_type {
        Some("css") => ResourceType::Stylesheet,
        Some("xmlhttprequest") => ResourceType::Xhr,
        Some("img") => ResourceType::Image,
        Some("iframe") => ResourceType::Document,
        Some(
            "audio" | "beacon" | "body" | "early-hints" | "embed" | "frame" | "input" | "link"
            | "object" | "track" | "video",
        )
        | None => ResourceType::Other,
        Some(token) => ResourceType::from_token(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaps_aliased_tokens() {
        assert_eq!(
            normalize_resource_type(Some("css")),
            ResourceType::Stylesheet
        );
        assert_eq!(
            normalize_resource_type(Some("xmlhttprequest")),
            ResourceType::Xhr
        );
        assert_eq!(normalize_resource_type(Some("img")), ResourceType::Image);
        assert_eq!(
            normalize_resource_type(Some("iframe")),
            ResourceType::Document
        );
    }

    #[test]
    fn collapses_undeterminable_tokens_to_other() {
        for token in [
            "audio",
            "beacon",
            "body",
            "early-hints",
            "embed",
            "frame",
            "input",
            "link",
            "object",
            "track",
            "video",
        ] {
            assert_eq!(normalize_resource_type(Some(token)), ResourceType::Other);
        }
        assert_eq!(normalize_resource_type(None), ResourceType::Other);
    }

    #[test]
    fn passes_known_tokens_through() {
        assert_eq!(normalize_resource_type(Some("script")), ResourceType::Script);
        assert_eq!(normalize_resource_type(Some("font")), ResourceType::Font);
        assert_eq!(normalize_resource_type(Some("fetch")), ResourceType::Fetch);
        assert_eq!(normalize_resource_type(Some("ping")), ResourceType::Ping);
    }

    #[test]
    fn passes_unknown_future_tokens_through() {
        assert_eq!(
            normalize_resource_type(Some("speculationrules")),
            ResourceType::Raw("speculationrules".to_string())
        );
    }
}
