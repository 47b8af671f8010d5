use std::sync::Arc;

use crate::client::AwsClient;
use crate::error::CloudError;
use crate::xml::xml_text;

fn cloudformation_host(region: &str) -> String {
    format!("cloudformation.{region}.amazonaws.com")
}

/// One `DescribeStackEvents` record. Only the fields the Progress Monitor
/// consumes (§6 stack-event stream) are kept; CloudFormation's response
/// carries more that we never read. `Deserialize` is derived for the
/// monitor's hand-built JSON test fixtures, not for any wire format here.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackEvent {
    pub logical_resource_id: String,
    pub resource_type: String,
    pub resource_status: String,
    pub resource_status_reason: Option<String>,
    pub timestamp: String,
}

/// Thin wrapper over the CloudFormation `DescribeStackEvents` Query API call
/// that backs the orchestrator's stack (the orchestrator CLI itself never
/// exposes raw events, so the monitor talks to CloudFormation directly, the
/// same way the network manager talks to EC2 directly).
pub struct StackEventsClient {
    client: Arc<AwsClient>,
}

impl StackEventsClient {
    pub fn new(client: Arc<AwsClient>) -> Self {
        Self { client }
    }

    /// Fetches all events for a stack, oldest-last as CloudFormation returns
    /// them (callers reverse to chronological order per §4.I step 2).
    pub async fn describe_stack_events(&self, stack_name: &str) -> Result<Vec<StackEvent>, CloudError> {
        let host = cloudformation_host(&self.client.region);
        let xml = self
            .client
            .query_api(
                &host,
                "cloudformation",
                &[("Action", "DescribeStackEvents"), ("Version", "2010-05-15"), ("StackName", stack_name)],
            )
            .await?;
        Ok(parse_stack_events(&xml))
    }
}

/// CloudFormation wraps each event in `<member>…</member>` inside
/// `<StackEvents>`; `xml_text` only reads the first match of a flat tag, so
/// each member is split out first and its fields read independently.
fn parse_stack_events(xml: &str) -> Vec<StackEvent> {
    xml_members(xml, "StackEvents")
        .into_iter()
        .filter_map(|member| {
            Some(StackEvent {
                logical_resource_id: xml_text(&member, "LogicalResourceId")?,
                resource_type: xml_text(&member, "ResourceType").unwrap_or_default(),
                resource_status: xml_text(&member, "ResourceStatus")?,
                resource_status_reason: xml_text(&member, "ResourceStatusReason"),
                timestamp: xml_text(&member, "Timestamp").unwrap_or_default(),
            })
        })
        .collect()
}

/// Returns the raw inner XML of every top-level `<member>` found inside the
/// first `<wrapper_tag>…</wrapper_tag>` element.
fn xml_members(xml: &str, wrapper_tag: &str) -> Vec<String> {
    use quick_xml::events::Event as XmlEvent;
    use quick_xml::Reader as XmlReader;

    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut members = Vec::new();
    let mut in_wrapper = false;
    let mut wrapper_depth: usize = 0;
    let mut current: Option<String> = None;
    let mut member_depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let name = e.local_name();
                let name = String::from_utf8_lossy(name.as_ref()).into_owned();
                if !in_wrapper {
                    if name == wrapper_tag {
                        in_wrapper = true;
                        wrapper_depth = 0;
                    }
                    continue;
                }
                if current.is_none() {
                    if name == "member" {
                        current = Some(String::new());
                        member_depth = 0;
                        continue;
                    }
                    wrapper_depth += 1;
                } else {
                    member_depth += 1;
                    if let Some(buf) = current.as_mut() {
                        buf.push('<');
                        buf.push_str(&name);
                        buf.push('>');
                    }
                }
            }
            Ok(XmlEvent::Text(e)) => {
                if let Some(buf) = current.as_mut() {
                    if let Ok(s) = e.unescape() {
                        buf.push_str(&s);
                    }
                }
            }
            Ok(XmlEvent::Empty(e)) if in_wrapper => {
                let name = e.local_name();
                let name = String::from_utf8_lossy(name.as_ref()).into_owned();
                if name == "member" && current.is_none() {
                    members.push(String::new());
                } else if let Some(buf) = current.as_mut() {
                    buf.push('<');
                    buf.push_str(&name);
                    buf.push_str("/>");
                }
            }
            Ok(XmlEvent::End(e)) => {
                if !in_wrapper {
                    continue;
                }
                let name = e.local_name();
                let name = String::from_utf8_lossy(name.as_ref()).into_owned();
                if current.is_some() && name == "member" && member_depth == 0 {
                    members.push(current.take().unwrap());
                    continue;
                }
                if let Some(buf) = current.as_mut() {
                    buf.push_str("</");
                    buf.push_str(&name);
                    buf.push('>');
                    if member_depth > 0 {
                        member_depth -= 1;
                    }
                } else if name == wrapper_tag {
                    in_wrapper = false;
                } else if wrapper_depth > 0 {
                    wrapper_depth -= 1;
                }
            }
            Ok(XmlEvent::Eof) | Err(_) => break,
            _ => {}
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS_DOC: &str = r#"<DescribeStackEventsResponse>
  <DescribeStackEventsResult>
    <StackEvents>
      <member>
        <LogicalResourceId>HeadNode</LogicalResourceId>
        <ResourceType>AWS::EC2::Instance</ResourceType>
        <ResourceStatus>CREATE_IN_PROGRESS</ResourceStatus>
        <Timestamp>2026-01-01T00:00:01Z</Timestamp>
      </member>
      <member>
        <LogicalResourceId>ClusterVPC</LogicalResourceId>
        <ResourceType>AWS::EC2::VPC</ResourceType>
        <ResourceStatus>CREATE_FAILED</ResourceStatus>
        <ResourceStatusReason>subnet id does not exist</ResourceStatusReason>
        <Timestamp>2026-01-01T00:00:00Z</Timestamp>
      </member>
    </StackEvents>
  </DescribeStackEventsResult>
</DescribeStackEventsResponse>"#;

    #[test]
    fn parses_every_member_in_document_order() {
        let events = parse_stack_events(EVENTS_DOC);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].logical_resource_id, "HeadNode");
        assert_eq!(events[0].resource_status, "CREATE_IN_PROGRESS");
        assert_eq!(events[1].logical_resource_id, "ClusterVPC");
        assert_eq!(events[1].resource_status_reason.as_deref(), Some("subnet id does not exist"));
    }

    #[test]
    fn empty_stream_yields_no_events() {
        let doc = r#"<DescribeStackEventsResponse><DescribeStackEventsResult><StackEvents/></DescribeStackEventsResult></DescribeStackEventsResponse>"#;
        assert!(parse_stack_events(doc).is_empty());
    }
}
