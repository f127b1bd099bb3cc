use crate::config::ScrapeConfig;

/// Fingerprint values spoofed into every page
///
/// Kept consistent with the launch arguments: the window size matches the
/// screen dimensions and the language matches `Accept-Language`.
#[derive(Debug, Clone)]
pub struct StealthProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
}

impl StealthProfile {
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        let accept_language = config.accept_language().to_string();
        let languages = languages_from_header(&accept_language);
        let language = languages
            .first()
            .cloned()
            .unwrap_or_else(|| "en-US".to_string());

        Self {
            user_agent: config.user_agent().to_string(),
            accept_language,
            language,
            languages,
            ..Self::default()
        }
    }
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            user_agent: crate::utils::CHROME_USER_AGENT.to_string(),
            accept_language: crate::utils::DEFAULT_ACCEPT_LANGUAGE.to_string(),
            platform: "Win32".to_string(),
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            screen_width: 1920,
            screen_height: 1080,
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel(R) UHD Graphics".to_string(),
            hardware_concurrency: 8,
        }
    }
}

/// `"en-US,en;q=0.9"` -> `["en-US", "en"]`
fn languages_from_header(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_languages_follow_accept_language() {
        let config = ScrapeConfig::builder()
            .accept_language("de-DE,de;q=0.8,en;q=0.5")
            .build()
            .expect("valid config");
        let profile = StealthProfile::from_config(&config);
        assert_eq!(profile.language, "de-DE");
        assert_eq!(profile.languages, vec!["de-DE", "de", "en"]);
    }
}
