//! Transcription languages

use serde::Serialize;

/// Language code that lets whisper detect the spoken language
pub const AUTO_DETECT: &str = "auto";

/// Language information
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Language {
    /// Code accepted on the command line (e.g. "en", "es-MX")
    pub code: &'static str,
    /// English display name
    pub name: &'static str,
    /// Whisper language code (may differ from code)
    pub whisper_code: &'static str,
}

/// Supported languages
pub static SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: AUTO_DETECT, name: "Auto-detect", whisper_code: AUTO_DETECT },
    Language { code: "en", name: "English", whisper_code: "en" },
    Language { code: "en-US", name: "English (US)", whisper_code: "en" },
    Language { code: "en-GB", name: "English (UK)", whisper_code: "en" },
    Language { code: "es", name: "Spanish", whisper_code: "es" },
    Language { code: "es-MX", name: "Spanish (Mexico)", whisper_code: "es" },
    Language { code: "fr", name: "French", whisper_code: "fr" },
    Language { code: "de", name: "German", whisper_code: "de" },
    Language { code: "it", name: "Italian", whisper_code: "it" },
    Language { code: "pt", name: "Portuguese", whisper_code: "pt" },
    Language { code: "nl", name: "Dutch", whisper_code: "nl" },
    Language { code: "zh", name: "Chinese", whisper_code: "zh" },
    Language { code: "ja", name: "Japanese", whisper_code: "ja" },
    Language { code: "ko", name: "Korean", whisper_code: "ko" },
    Language { code: "ru", name: "Russian", whisper_code: "ru" },
    Language { code: "ar", name: "Arabic", whisper_code: "ar" },
    Language { code: "hi", name: "Hindi", whisper_code: "hi" },
];

impl Language {
    /// Map a user-selected code to whisper's code
    pub fn to_whisper_code(code: &str) -> &'static str {
        Self::get(code).map(|l| l.whisper_code).unwrap_or(AUTO_DETECT)
    }

    pub fn is_supported(code: &str) -> bool {
        Self::get(code).is_some()
    }

    fn get(code: &str) -> Option<&'static Language> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }
}
