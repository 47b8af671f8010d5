use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader as XmlReader;

/// Find the text content of the first `<tag>…</tag>` element in XML. Skips
/// over nested elements; returns `None` if not found or empty.
pub fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let tag_bytes = tag.as_bytes();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_tag = false;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                if !in_tag && e.local_name().as_ref() == tag_bytes {
                    in_tag = true;
                    depth = 0;
                } else if in_tag {
                    depth += 1;
                }
            }
            Ok(XmlEvent::End(_)) => {
                if in_tag {
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                }
            }
            Ok(XmlEvent::Text(e)) if in_tag && depth == 0 => {
                return e.unescape().ok().map(|s| s.into_owned());
            }
            Ok(XmlEvent::Eof) | Err(_) => break,
            _ => {}
        }
    }
    None
}

/// Collect the text content of every `<tag>…</tag>` element in XML, in
/// document order.
pub fn xml_all_texts(xml: &str, tag: &str) -> Vec<String> {
    let tag_bytes = tag.as_bytes();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut result = Vec::new();
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                if depth == 0 && e.local_name().as_ref() == tag_bytes {
                    depth = 1;
                } else if depth > 0 {
                    depth += 1;
                }
            }
            Ok(XmlEvent::End(_)) => {
                if depth > 0 {
                    depth -= 1;
                }
            }
            Ok(XmlEvent::Text(e)) if depth == 1 => {
                if let Ok(s) = e.unescape() {
                    result.push(s.into_owned());
                }
            }
            Ok(XmlEvent::Eof) | Err(_) => break,
            _ => {}
        }
    }
    result
}

/// Extracts `<Code>` from a standard cloud API XML error document.
pub fn xml_error_code(xml: &str) -> Option<String> {
    xml_text(xml, "Code").or_else(|| xml_text(xml, "code"))
}

/// Extracts `<Message>` from a standard cloud API XML error document.
pub fn xml_error_message(xml: &str) -> Option<String> {
    xml_text(xml, "Message").or_else(|| xml_text(xml, "message"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERROR_DOC: &str = r#"<?xml version="1.0"?>
<Error>
  <Code>AccessDenied</Code>
  <Message>User is not authorized</Message>
  <RequestId>abc-123</RequestId>
</Error>"#;

    #[test]
    fn extracts_error_code_and_message() {
        assert_eq!(xml_error_code(ERROR_DOC).as_deref(), Some("AccessDenied"));
        assert_eq!(xml_error_message(ERROR_DOC).as_deref(), Some("User is not authorized"));
    }

    #[test]
    fn missing_tag_returns_none() {
        assert_eq!(xml_text(ERROR_DOC, "NotPresent"), None);
    }

    #[test]
    fn all_texts_collects_every_occurrence() {
        let doc = "<Items><Item>a</Item><Item>b</Item><Item>c</Item></Items>";
        assert_eq!(xml_all_texts(doc, "Item"), vec!["a", "b", "c"]);
    }

    #[test]
    fn nested_elements_do_not_confuse_the_outer_tags_text() {
        let doc = "<vpcId>vpc-123</vpcId><tagSet><item><key>Name</key></item></tagSet>";
        assert_eq!(xml_text(doc, "vpcId").as_deref(), Some("vpc-123"));
    }
}
