use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::base64;

/// A file attached to an outgoing email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// One email to be sent. Attachment order is preserved in the MIME output.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn new(from: &str, to: &str, subject: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Render the SMTP DATA payload: headers plus either a plain text body
    /// or a multipart/mixed document with one part per attachment.
    ///
    /// The DATA-terminating `.` line is not included; the session appends
    /// it after the payload.
    pub fn to_mime(&self, boundary: &str) -> String {
        let mut content = String::new();
        content.push_str(&format!("From: {}\r\n", self.from));
        content.push_str(&format!("To: {}\r\n", self.to));
        content.push_str(&format!("Subject: {}\r\n", self.subject));
        content.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            content.push_str("Content-Type: text/plain; charset=UTF-8\r\n\r\n");
            content.push_str(&self.body);
            content.push_str("\r\n");
            return content;
        }

        content.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        ));

        // Body part first, then attachments in the order they were added.
        content.push_str(&format!("--{}\r\n", boundary));
        content.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
        content.push_str("Content-Transfer-Encoding: 7bit\r\n\r\n");
        content.push_str(&self.body);
        content.push_str("\r\n\r\n");

        for attachment in &self.attachments {
            content.push_str(&format!("--{}\r\n", boundary));
            content.push_str(&format!(
                "Content-Type: {}; name=\"{}\"\r\n",
                attachment.content_type, attachment.filename
            ));
            content.push_str("Content-Transfer-Encoding: base64\r\n");
            content.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                attachment.filename
            ));
            content.push_str(&base64::encode(&attachment.data));
            content.push_str("\r\n\r\n");
        }

        content.push_str(&format!("--{}--\r\n", boundary));
        content
    }
}

/// Generate a multipart boundary token for one send.
///
/// A random UUID rather than a timestamp, so rapid repeated sends cannot
/// collide.
pub fn generate_boundary() -> String {
    format!("==Multipart_Boundary_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attachment(name: &str, data: &[u8]) -> Attachment {
        Attachment {
            filename: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_plain_message_has_no_boundary() {
        let message = OutgoingMessage::new(
            "alice@example.com",
            "bob@example.com",
            "Hello",
            "Just checking in.",
        );
        let mime = message.to_mime("==Multipart_Boundary_unused");

        assert!(mime.starts_with("From: alice@example.com\r\n"));
        assert!(mime.contains("To: bob@example.com\r\n"));
        assert!(mime.contains("Subject: Hello\r\n"));
        assert!(mime.contains("MIME-Version: 1.0\r\n"));
        assert_eq!(mime.matches("Content-Type: text/plain; charset=UTF-8").count(), 1);
        assert!(mime.contains("Just checking in."));
        assert!(!mime.contains("boundary"));
        assert!(!mime.contains("--=="));
    }

    #[test]
    fn test_multipart_structure() {
        let mut message = OutgoingMessage::new(
            "alice@example.com",
            "bob@example.com",
            "Report",
            "See attached.",
        );
        message.attach(sample_attachment("a.bin", b"first"));
        message.attach(sample_attachment("b.bin", b"second"));

        let boundary = "==Multipart_Boundary_test";
        let mime = message.to_mime(boundary);

        // N attachments: N+1 opening separators plus one closing marker.
        let opening = format!("--{}\r\n", boundary);
        let closing = format!("--{}--\r\n", boundary);
        assert_eq!(mime.matches(&opening).count(), 3);
        assert_eq!(mime.matches(&closing).count(), 1);
        assert!(mime.ends_with(&closing));
        assert!(mime.contains(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"",
            boundary
        )));
    }

    #[test]
    fn test_attachments_in_insertion_order() {
        let mut message = OutgoingMessage::new("a@x", "b@y", "s", "body");
        message.attach(sample_attachment("first.txt", b"1"));
        message.attach(sample_attachment("second.txt", b"2"));
        message.attach(sample_attachment("third.txt", b"3"));

        let mime = message.to_mime("==Multipart_Boundary_test");
        let first = mime.find("first.txt").unwrap();
        let second = mime.find("second.txt").unwrap();
        let third = mime.find("third.txt").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_attachment_content_is_base64() {
        let payload = b"attachment payload \x00\x01\x02";
        let mut message = OutgoingMessage::new("a@x", "b@y", "s", "body");
        message.attach(sample_attachment("data.bin", payload));

        let mime = message.to_mime("==Multipart_Boundary_test");
        assert!(mime.contains("Content-Transfer-Encoding: base64"));
        assert!(mime.contains(&base64::encode(payload)));
        assert!(mime.contains("Content-Disposition: attachment; filename=\"data.bin\""));
    }

    #[test]
    fn test_boundary_tokens_are_unique() {
        let a = generate_boundary();
        let b = generate_boundary();
        assert!(a.starts_with("==Multipart_Boundary_"));
        assert_ne!(a, b);
    }
}
