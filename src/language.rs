//! Per-language metadata used for prompt guidance and fallback cache sizing.

/// Writing system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Hangul,
    Kana,
    Han,
    Thai,
}

impl Script {
    pub fn name(self) -> &'static str {
        match self {
            Script::Latin => "Latin",
            Script::Cyrillic => "Cyrillic",
            Script::Greek => "Greek",
            Script::Arabic => "Arabic",
            Script::Hebrew => "Hebrew",
            Script::Devanagari => "Devanagari",
            Script::Hangul => "Hangul",
            Script::Kana => "Japanese kana and kanji",
            Script::Han => "Chinese characters",
            Script::Thai => "Thai",
        }
    }

    pub fn is_latin(self) -> bool {
        self == Script::Latin
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub name: &'static str,
    pub script: Script,
    pub word_order: &'static str,
    pub grammatical_gender: bool,
    pub tonal: bool,
    pub regional_variants: &'static [&'static str],
    /// Orthography instruction appended to prompts, when the language needs one.
    pub orthography: Option<&'static str>,
}

const PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "English",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: false,
        tonal: false,
        regional_variants: &["US", "UK"],
        orthography: None,
    },
    LanguageProfile {
        name: "Spanish",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["Spain", "Mexico", "Argentina"],
        orthography: Some("Keep accents (á, é, í, ó, ú, ñ) and include the article for nouns (el/la)."),
    },
    LanguageProfile {
        name: "French",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["France", "Quebec", "Belgium"],
        orthography: Some("Keep accents and cedillas; give nouns with their article (le/la/l')."),
    },
    LanguageProfile {
        name: "German",
        script: Script::Latin,
        word_order: "V2",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["Germany", "Austria", "Switzerland"],
        orthography: Some("Capitalize nouns, keep umlauts and ß, include der/die/das for nouns."),
    },
    LanguageProfile {
        name: "Italian",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["Italy", "Switzerland"],
        orthography: Some("Keep accents on final vowels; include the article for nouns."),
    },
    LanguageProfile {
        name: "Portuguese",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["Brazil", "Portugal"],
        orthography: Some("Keep tildes and accents; include o/a for nouns."),
    },
    LanguageProfile {
        name: "Russian",
        script: Script::Cyrillic,
        word_order: "SVO (flexible)",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &[],
        orthography: Some("Write in Cyrillic; do not transliterate."),
    },
    LanguageProfile {
        name: "Greek",
        script: Script::Greek,
        word_order: "SVO (flexible)",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &[],
        orthography: Some("Write in Greek script with stress accents."),
    },
    LanguageProfile {
        name: "Arabic",
        script: Script::Arabic,
        word_order: "VSO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &["Modern Standard", "Egyptian", "Levantine", "Gulf"],
        orthography: Some("Write in Arabic script; use Modern Standard Arabic forms."),
    },
    LanguageProfile {
        name: "Hebrew",
        script: Script::Hebrew,
        word_order: "SVO",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &[],
        orthography: Some("Write in Hebrew script without niqqud."),
    },
    LanguageProfile {
        name: "Hindi",
        script: Script::Devanagari,
        word_order: "SOV",
        grammatical_gender: true,
        tonal: false,
        regional_variants: &[],
        orthography: Some("Write in Devanagari; do not romanize."),
    },
    LanguageProfile {
        name: "Japanese",
        script: Script::Kana,
        word_order: "SOV",
        grammatical_gender: false,
        tonal: false,
        regional_variants: &[],
        orthography: Some("Write in standard Japanese script (kanji with kana as usual)."),
    },
    LanguageProfile {
        name: "Korean",
        script: Script::Hangul,
        word_order: "SOV",
        grammatical_gender: false,
        tonal: false,
        regional_variants: &["Seoul"],
        orthography: Some("Write in Hangul; do not romanize."),
    },
    LanguageProfile {
        name: "Chinese",
        script: Script::Han,
        word_order: "SVO",
        grammatical_gender: false,
        tonal: true,
        regional_variants: &["Mainland (Simplified)", "Taiwan (Traditional)"],
        orthography: Some("Write in Simplified Chinese characters; no pinyin in the word field."),
    },
    LanguageProfile {
        name: "Vietnamese",
        script: Script::Latin,
        word_order: "SVO",
        grammatical_gender: false,
        tonal: true,
        regional_variants: &["Northern", "Southern"],
        orthography: Some("Keep all tone marks and diacritics."),
    },
    LanguageProfile {
        name: "Thai",
        script: Script::Thai,
        word_order: "SVO",
        grammatical_gender: false,
        tonal: true,
        regional_variants: &[],
        orthography: Some("Write in Thai script; do not romanize."),
    },
];

const NEUTRAL: LanguageProfile = LanguageProfile {
    name: "Unknown",
    script: Script::Latin,
    word_order: "unspecified",
    grammatical_gender: false,
    tonal: false,
    regional_variants: &[],
    orthography: None,
};

impl LanguageProfile {
    /// Profile for `language`, matched case-insensitively; unknown languages get a neutral profile.
    pub fn lookup(language: &str) -> &'static LanguageProfile {
        let wanted = language.trim();
        PROFILES
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                "mandarin" | "mandarin chinese" => PROFILES.iter().find(|p| p.name == "Chinese"),
                "brazilian portuguese" => PROFILES.iter().find(|p| p.name == "Portuguese"),
                _ => None,
            })
            .unwrap_or(&NEUTRAL)
    }

    /// Relative difficulty of producing words for this language, 1.0 (plain) to 2.0.
    pub fn complexity(&self) -> f64 {
        let mut score = 1.0;
        if self.tonal {
            score += 0.4;
        }
        if !self.script.is_latin() {
            score += 0.4;
        }
        if self.grammatical_gender {
            score += 0.2;
        }
        f64::min(score, 2.0)
    }

    pub fn is_known(&self) -> bool {
        self.name != NEUTRAL.name
    }
}
