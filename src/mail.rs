use aws_sdk_sesv2::{
    types::{Body, Content, Destination, EmailContent, Message},
    Client as SesClient,
};

use crate::error::{Error, Result};

/// Sends HTML email on behalf of the site.
pub struct Mailer {
    client: SesClient,
    sender: String,
}

impl Mailer {
    pub fn new(client: SesClient, sender: String) -> Self {
        Self { client, sender }
    }

    /// Send `body` as an HTML email to every address in `to`.
    #[cfg_attr(test, allow(unused_variables, unreachable_code))]
    pub async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<()> {
        // Tests never talk to SES.
        #[cfg(test)]
        {
            debug!("Skipping email to {to:?}: {subject}");
            return Ok(());
        }

        let message = Message::builder()
            .subject(utf8_content(subject)?)
            .body(Body::builder().html(utf8_content(body)?).build())
            .build();
        self.client
            .send_email()
            .from_email_address(&self.sender)
            .destination(Destination::builder().set_to_addresses(Some(to.to_vec())).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|err| Error::internal(format!("Failed to send email to {to:?}: {err}")))?;
        info!("Sent email to {to:?}: {subject}");
        Ok(())
    }
}

fn utf8_content(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|err| Error::internal(format!("Failed to build email: {err}")))
}

/// Escape user input before it is placed in an HTML body.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
