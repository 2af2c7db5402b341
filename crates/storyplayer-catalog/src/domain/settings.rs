//! App-wide presentation settings and language resolution.

use serde::Serialize;

use super::raw::RawApp;

/// Language used when neither the viewer nor the app names one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Group list appearance used when the app does not configure one.
pub const DEFAULT_GROUP_VIEW: &str = "circle";

/// Adapted app settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Group list appearance on the web.
    pub group_view: String,
    /// Whether stories are framed in a device mockup.
    pub is_show_mockup: bool,
    /// Font descriptors for the renderer.
    pub fonts: Vec<serde_json::Value>,
    /// Content languages.
    pub localization: Localization,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            group_view: DEFAULT_GROUP_VIEW.to_owned(),
            is_show_mockup: false,
            fonts: Vec::new(),
            localization: Localization::default(),
        }
    }
}

impl From<RawApp> for AppSettings {
    fn from(raw: RawApp) -> Self {
        let localization = raw
            .localization
            .map(|l| Localization {
                default_language: l.default.unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
                languages: l.languages,
            })
            .unwrap_or_default();
        Self {
            group_view: raw
                .settings
                .group_view
                .and_then(|v| v.web)
                .unwrap_or_else(|| DEFAULT_GROUP_VIEW.to_owned()),
            is_show_mockup: raw.settings.is_show_mockup.unwrap_or(false),
            fonts: raw.settings.fonts,
            localization,
        }
    }
}

/// Languages an app has content in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    /// Fallback language.
    pub default_language: String,
    /// Supported languages.
    pub languages: Vec<String>,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_owned(),
            languages: Vec::new(),
        }
    }
}

/// Language a session is presented in, plus the one to fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Session language.
    pub language: String,
    /// App default language.
    pub fallback: String,
}

impl Localization {
    /// Picks the first preferred language the app supports, matching on the
    /// primary subtag when the exact tag is not listed (`en-US` → `en`).
    #[must_use]
    pub fn locale_for(&self, preferred: &[String]) -> Locale {
        let language = preferred
            .iter()
            .find_map(|tag| self.match_language(tag))
            .unwrap_or_else(|| self.default_language.clone());
        Locale {
            language,
            fallback: self.default_language.clone(),
        }
    }

    fn match_language(&self, tag: &str) -> Option<String> {
        let tag = tag.trim().to_ascii_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        self.languages
            .iter()
            .find(|l| l.eq_ignore_ascii_case(&tag))
            .or_else(|| self.languages.iter().find(|l| l.eq_ignore_ascii_case(primary)))
            .cloned()
    }
}
