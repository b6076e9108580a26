use serde::Deserialize;

/// Content handed over by the OS share mechanism: one or more items, each
/// carrying attachments of different representations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharePayload {
    #[serde(default)]
    pub items: Vec<ShareItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareItem {
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Attachment {
    Url(String),
    Text(String),
    PropertyList(PropertyList),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyList {
    #[serde(rename = "URL", alias = "url", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContent {
    pub url: String,
    pub title: String,
}

pub fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("http://") || text.starts_with("https://")
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl SharePayload {
    /// Payload equivalent to one item carrying the given attachments.
    pub fn from_attachments(attachments: Vec<Attachment>) -> Self {
        Self {
            items: vec![ShareItem { attachments }],
        }
    }

    /// Explicit URLs beat URLs inferred from text; property-list titles beat
    /// plain-text titles, and plain text only becomes the title when nothing
    /// else supplied one.
    pub fn resolve(&self) -> SharedContent {
        let mut explicit_url: Option<String> = None;
        let mut inferred_url: Option<String> = None;
        let mut rich_title: Option<String> = None;
        let mut text_title: Option<String> = None;

        let attachments = self.items.iter().flat_map(|item| item.attachments.iter());
        for attachment in attachments {
            match attachment {
                Attachment::Url(url) => {
                    if explicit_url.is_none() {
                        explicit_url = non_empty(url);
                    }
                }
                Attachment::Text(text) => {
                    if looks_like_url(text) {
                        if inferred_url.is_none() {
                            inferred_url = non_empty(text);
                        }
                    } else if text_title.is_none() {
                        text_title = non_empty(text);
                    }
                }
                Attachment::PropertyList(list) => {
                    if explicit_url.is_none() {
                        explicit_url = list.url.as_deref().and_then(non_empty);
                    }
                    if rich_title.is_none() {
                        rich_title = list.title.as_deref().and_then(non_empty);
                    }
                }
            }
        }

        SharedContent {
            url: explicit_url.or(inferred_url).unwrap_or_default(),
            title: rich_title.or(text_title).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_beats_text_url_regardless_of_order() {
        let payload = SharePayload::from_attachments(vec![
            Attachment::Text("https://inferred.example.com/a".into()),
            Attachment::Url("https://explicit.example.com/b".into()),
        ]);
        assert_eq!(payload.resolve().url, "https://explicit.example.com/b");
    }

    #[test]
    fn text_url_used_when_no_explicit_url() {
        let payload = SharePayload::from_attachments(vec![
            Attachment::Text("Some Headline".into()),
            Attachment::Text("  https://inferred.example.com/a ".into()),
        ]);
        let got = payload.resolve();
        assert_eq!(got.url, "https://inferred.example.com/a");
        assert_eq!(got.title, "Some Headline");
    }

    #[test]
    fn first_text_title_sticks() {
        let payload = SharePayload::from_attachments(vec![
            Attachment::Text("First".into()),
            Attachment::Text("Second".into()),
        ]);
        assert_eq!(payload.resolve().title, "First");
    }

    #[test]
    fn property_list_title_beats_text_title() {
        let payload = SharePayload::from_attachments(vec![
            Attachment::Text("Plain".into()),
            Attachment::PropertyList(PropertyList {
                url: Some("https://example.com/p".into()),
                title: Some("Rich".into()),
            }),
        ]);
        assert_eq!(
            payload.resolve(),
            SharedContent {
                url: "https://example.com/p".into(),
                title: "Rich".into(),
            }
        );
    }

    #[test]
    fn payload_json_uses_tagged_attachments() {
        let raw = r#"{"items":[{"attachments":[
            {"type":"propertyList","value":{"URL":"https://example.com/x","title":"From Page"}},
            {"type":"text","value":"ignored title"}
        ]}]}"#;
        let payload: SharePayload = serde_json::from_str(raw).expect("parse");
        let got = payload.resolve();
        assert_eq!(got.url, "https://example.com/x");
        assert_eq!(got.title, "From Page");
    }

    #[test]
    fn empty_payload_resolves_to_empty_content() {
        assert_eq!(SharePayload::default().resolve(), SharedContent::default());
    }
}
