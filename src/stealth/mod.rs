//! Fingerprint suppression for browser pages
//!
//! Applied to every page before its first navigation: a profile object, a set
//! of evasion scripts registered with `Page.addScriptToEvaluateOnNewDocument`,
//! a user agent override and a fixed desktop viewport.

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures::future::join_all;
use tracing::{debug, warn};

mod config;
mod scripts;

pub use config::StealthProfile;
use scripts::EVASION_SCRIPTS;

fn on_new_document(source: String) -> AddScriptToEvaluateOnNewDocumentParams {
    AddScriptToEvaluateOnNewDocumentParams {
        source,
        include_command_line_api: None,
        world_name: None,
        run_immediately: None,
    }
}

/// Render the profile object every evasion script reads from
fn profile_script(profile: &StealthProfile) -> String {
    let session_seed: Vec<u8> = (0..16).map(|_| rand::random::<u8>()).collect();
    let value = serde_json::json!({
        "platform": profile.platform,
        "language": profile.language,
        "languages": profile.languages,
        "screenWidth": profile.screen_width,
        "screenHeight": profile.screen_height,
        "webglVendor": profile.webgl_vendor,
        "webglRenderer": profile.webgl_renderer,
        "hardwareConcurrency": profile.hardware_concurrency,
        "sessionSeed": hex::encode(session_seed),
    });
    format!(
        "Object.defineProperty(window, '__stealthProfile', {{ value: {value}, enumerable: false }});"
    )
}

/// Apply the stealth profile to a blank page
///
/// Individual script failures are logged and tolerated; the call only fails
/// when no evasion script could be registered or the UA override is rejected.
pub async fn inject(page: &Page, profile: &StealthProfile) -> Result<()> {
    debug!("Injecting stealth profile");
    page.execute(on_new_document(profile_script(profile))).await?;

    let inject_futures: Vec<_> = EVASION_SCRIPTS
        .iter()
        .map(|(name, source)| {
            let page = page.clone();
            async move {
                let result = page.execute(on_new_document((*source).to_string())).await;
                (*name, result)
            }
        })
        .collect();

    let mut failed = Vec::new();
    for (name, result) in join_all(inject_futures).await {
        if let Err(e) = result {
            warn!("Failed to inject {}: {}", name, e);
            failed.push(name);
        }
    }

    if failed.len() == EVASION_SCRIPTS.len() {
        return Err(anyhow::anyhow!(
            "Failed to inject any stealth scripts ({} failures)",
            failed.len()
        ));
    }

    page.execute(SetUserAgentOverrideParams {
        user_agent: profile.user_agent.clone(),
        accept_language: Some(profile.accept_language.clone()),
        platform: Some(profile.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    let viewport = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(profile.screen_width))
        .height(i64::from(profile.screen_height))
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build viewport override: {e}"))?;
    page.execute(viewport).await?;

    debug!(
        "Stealth injection complete: {}/{} scripts active",
        EVASION_SCRIPTS.len() - failed.len(),
        EVASION_SCRIPTS.len()
    );
    Ok(())
}
