use htmlescape::encode_minimal;
use serde_json::{json, Value};

use crate::domain::{ActivityEvent, SubscriberEmail};

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DigestFormat {
    Html,
    Json,
}

/// Turns a raw activity feed into events, dropping malformed records.
pub fn parse_events(raw: &Value) -> Vec<ActivityEvent> {
    let records = match raw.as_array() {
        Some(records) => records,
        None => {
            tracing::warn!("The activity feed is not a list of events, ignoring it.");
            return Vec::new();
        }
    };
    records
        .iter()
        .filter_map(|record| match ActivityEvent::from_value(record) {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::warn!(error.message = %error, "Skipping a malformed activity event.");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Digest {
    events: Vec<ActivityEvent>,
}

impl Digest {
    pub fn new(events: Vec<ActivityEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn render(&self, format: DigestFormat) -> String {
        match format {
            DigestFormat::Html => self.render_html(),
            DigestFormat::Json => self.render_json(),
        }
    }

    fn render_html(&self) -> String {
        let rows: String = self
            .events
            .iter()
            .map(|event| {
                format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    encode_minimal(&event.kind),
                    encode_minimal(&event.actor)
                )
            })
            .collect();
        format!(
            "<h2>GitHub Timeline Updates</h2>\n\
             <table border=\"1\">\n\
             <tr><th>Event</th><th>User</th></tr>\n\
             {rows}</table>\n"
        )
    }

    fn render_json(&self) -> String {
        json!({ "events": self.events }).to_string()
    }

    pub fn render_text(&self) -> String {
        let mut text = String::from("GitHub Timeline Updates\n");
        if self.events.is_empty() {
            text.push_str("No new activity.\n");
        }
        for event in &self.events {
            text.push_str(&format!("- {} by {}\n", event.kind, event.actor));
        }
        text
    }
}

/// A digest addressed to one subscriber.
pub struct DigestEmail {
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

impl DigestEmail {
    pub fn compose(
        digest: &Digest,
        format: DigestFormat,
        subject: &str,
        base_url: &str,
        recipient: &SubscriberEmail,
    ) -> Self {
        let unsubscribe_link = unsubscribe_link(base_url, recipient);
        let rendered = match format {
            DigestFormat::Html => digest.render(format),
            DigestFormat::Json => format!("<pre>{}</pre>\n", encode_minimal(&digest.render(format))),
        };
        let html_content = format!(
            "{rendered}<p><a id=\"unsubscribe-button\" href=\"{}\">Unsubscribe</a></p>",
            encode_minimal(&unsubscribe_link)
        );
        let text_content = format!(
            "{}\nTo stop receiving these updates visit {}",
            digest.render_text(),
            unsubscribe_link
        );
        Self {
            subject: subject.to_string(),
            html_content,
            text_content,
        }
    }
}

fn unsubscribe_link(base_url: &str, recipient: &SubscriberEmail) -> String {
    format!(
        "{}/unsubscribe?email={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(recipient.as_ref())
    )
}
