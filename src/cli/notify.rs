use crate::error::{CourtsideError, Result};
use crate::notify::DefaultNotifier;
use crate::settings::load_settings;

pub async fn run() -> Result<()> {
    let settings = load_settings();
    let notifier = DefaultNotifier::new(&settings.whatsapp);
    if !notifier.is_configured() {
        return Err(CourtsideError::NotConfigured(
            "whatsapp.phone and whatsapp.api_key",
        ));
    }

    println!("Sending a test message to {}...", settings.whatsapp.phone);
    notifier
        .send("Courtside test message. The gateway is working.")
        .await?;
    println!("Accepted by the gateway. Check your phone.");
    Ok(())
}
