use url::Url;

use crate::error::{CourtsideError, Result};
use crate::fmt;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::Assignment;
use crate::settings::WhatsAppSettings;

pub type DefaultNotifier = Notifier<ReqwestBackend>;

/// Thin client for CallMeBot-style WhatsApp gateways: a single GET with the
/// message in the query string.
pub struct Notifier<B: HttpBackend> {
    backend: B,
    settings: WhatsAppSettings,
}

impl DefaultNotifier {
    pub fn new(settings: &WhatsAppSettings) -> Self {
        Self {
            backend: ReqwestBackend::new(),
            settings: settings.clone(),
        }
    }
}

impl<B: HttpBackend> Notifier<B> {
    #[cfg(test)]
    pub(crate) fn with_backend(backend: B, settings: &WhatsAppSettings) -> Self {
        Self {
            backend,
            settings: settings.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    fn message_url(&self, text: &str) -> Result<Url> {
        let mut url = Url::parse(&self.settings.gateway_url)?;
        url.query_pairs_mut()
            .append_pair("phone", &self.settings.phone)
            .append_pair("text", text)
            .append_pair("apikey", &self.settings.api_key);
        Ok(url)
    }

    /// One GET, no retry. A failure leaves the assignment unnotified, so the
    /// next sync tries again.
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.settings.is_configured() {
            return Err(CourtsideError::NotConfigured(
                "whatsapp.phone and whatsapp.api_key",
            ));
        }
        let url = self.message_url(text)?;
        let (status, body) = self.backend.get_text(&url).await?;
        let snippet: String = body.chars().take(120).collect();
        if !(200..300).contains(&status) {
            return Err(CourtsideError::Gateway(format!("status {status}: {snippet}")));
        }
        // CallMeBot answers 200 with an error text when the key is wrong
        if snippet.contains("ERROR") || snippet.contains("APIKey is invalid") {
            return Err(CourtsideError::Gateway(snippet));
        }
        Ok(())
    }
}

/// The WhatsApp text for a freshly discovered assignment.
pub fn assignment_message(a: &Assignment) -> String {
    let mut msg = format!(
        "New assignment: {}\n{} vs {}\n{}",
        a.duty.label(),
        a.home_team,
        a.away_team,
        fmt::display_when(&a.date, a.time.as_deref()),
    );
    if !a.venue.is_empty() {
        msg.push('\n');
        msg.push_str(&a.venue);
    }
    if let Some(file) = a.file_name.as_deref() {
        msg.push_str(&format!("\nFrom: {file}"));
    }
    msg
}
