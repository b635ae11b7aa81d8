//! Language-independent province codes.
//!
//! Listings used to be filtered by comparing the localized city string typed
//! into the form against the localized selector, so a Pashto selector never
//! matched a listing entered in Dari. Both display languages now resolve to a
//! [`Province`] code and filtering compares codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display language of the marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Dari,
    Pashto,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Language::Dari => "dari",
            Language::Pashto => "pashto",
        }
    }

    /// Label of the "all provinces" entry at the top of the selector.
    pub const fn all_provinces_label(self) -> &'static str {
        match self {
            Language::Dari => "همه ولایات",
            Language::Pashto => "ټول ولایتونه",
        }
    }
}

impl FromStr for Language {
    type Err = ProvinceParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dari" | "fa" | "prs" | "دری" => Ok(Language::Dari),
            "pashto" | "ps" | "pus" | "پښتو" => Ok(Language::Pashto),
            _ => Err(ProvinceParseError::UnknownLanguage(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvinceParseError {
    #[error("unknown province '{0}'")]
    UnknownProvince(String),
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
}

macro_rules! provinces {
    ($($variant:ident => $code:literal, $dari:literal, $pashto:literal $(, [$($alias:literal),*])?;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Province {
            $($variant,)+
        }

        impl Province {
            pub const ALL: &'static [Province] = &[$(Province::$variant,)+];

            pub const fn code(self) -> &'static str {
                match self {
                    $(Province::$variant => $code,)+
                }
            }

            pub const fn name(self, language: Language) -> &'static str {
                match (self, language) {
                    $(
                        (Province::$variant, Language::Dari) => $dari,
                        (Province::$variant, Language::Pashto) => $pashto,
                    )+
                }
            }

            fn aliases(self) -> &'static [&'static str] {
                match self {
                    $(Province::$variant => &[$($($alias),*)?],)+
                }
            }
        }
    };
}

provinces! {
    Badakhshan => "badakhshan", "بدخشان", "بدخشان";
    Badghis => "badghis", "بادغیس", "بادغیس";
    Baghlan => "baghlan", "بغلان", "بغلان";
    Balkh => "balkh", "بلخ", "بلخ", ["مزار شریف", "مزار"];
    Bamyan => "bamyan", "بامیان", "باميان";
    Daykundi => "daykundi", "دایکندی", "دايکندي";
    Farah => "farah", "فراه", "فراه";
    Faryab => "faryab", "فاریاب", "فارياب", ["میمنه"];
    Ghazni => "ghazni", "غزنی", "غزني";
    Ghor => "ghor", "غور", "غور", ["چغچران"];
    Helmand => "helmand", "هلمند", "هلمند", ["لشکرگاه"];
    Herat => "herat", "هرات", "هرات";
    Jowzjan => "jowzjan", "جوزجان", "جوزجان", ["شبرغان"];
    Kabul => "kabul", "کابل", "کابل";
    Kandahar => "kandahar", "کندهار", "کندهار", ["قندهار"];
    Kapisa => "kapisa", "کاپیسا", "کاپيسا";
    Khost => "khost", "خوست", "خوست";
    Kunar => "kunar", "کنر", "کونړ", ["اسعدآباد"];
    Kunduz => "kunduz", "کندز", "کندوز";
    Laghman => "laghman", "لغمان", "لغمان";
    Logar => "logar", "لوگر", "لوګر";
    Nangarhar => "nangarhar", "ننگرهار", "ننګرهار", ["جلال‌آباد", "جلال آباد"];
    Nimruz => "nimruz", "نیمروز", "نيمروز", ["زرنج"];
    Nuristan => "nuristan", "نورستان", "نورستان";
    Paktia => "paktia", "پکتیا", "پکتيا", ["گردیز"];
    Paktika => "paktika", "پکتیکا", "پکتيکا";
    Panjshir => "panjshir", "پنجشیر", "پنجشير";
    Parwan => "parwan", "پروان", "پروان", ["چاریکار"];
    Samangan => "samangan", "سمنگان", "سمنګان";
    SarEPol => "sar_e_pol", "سرپل", "سرپل";
    Takhar => "takhar", "تخار", "تخار", ["تالقان"];
    Uruzgan => "uruzgan", "ارزگان", "ارزګان";
    Wardak => "wardak", "وردک", "وردګ", ["میدان وردک"];
    Zabul => "zabul", "زابل", "زابل";
}

impl Province {
    /// Resolve a code, a Dari or Pashto name, or a known city alias.
    pub fn resolve(raw: &str) -> Option<Province> {
        let needle = fold(raw);
        if needle.is_empty() {
            return None;
        }

        Province::ALL.iter().copied().find(|province| {
            province.code() == needle.to_ascii_lowercase()
                || fold(province.name(Language::Dari)) == needle
                || fold(province.name(Language::Pashto)) == needle
                || province.aliases().iter().any(|alias| fold(alias) == needle)
        })
    }

    /// Selector entries in display order, preceded by the "all" sentinel.
    pub fn selector_labels(language: Language) -> Vec<&'static str> {
        std::iter::once(language.all_provinces_label())
            .chain(Province::ALL.iter().map(|province| province.name(language)))
            .collect()
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Province {
    type Err = ProvinceParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Province::resolve(value).ok_or_else(|| ProvinceParseError::UnknownProvince(value.to_string()))
    }
}

/// True when `raw` is one of the "all provinces" sentinels.
pub fn is_all_provinces(raw: &str) -> bool {
    let needle = fold(raw);
    needle.is_empty()
        || needle.eq_ignore_ascii_case("all")
        || needle == fold(Language::Dari.all_provinces_label())
        || needle == fold(Language::Pashto.all_provinces_label())
}

/// Collapse letter variants that differ between Dari and Pashto keyboards,
/// drop zero-width joiners and squeeze whitespace.
pub(crate) fn fold(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '\u{200c}' | '\u{200d}'))
        .map(|ch| match ch {
            'ي' | 'ى' | 'ې' | 'ۍ' => 'ی',
            'ك' => 'ک',
            'ګ' => 'گ',
            'ړ' => 'ر',
            'ۀ' | 'ة' => 'ه',
            other => other,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_languages_to_the_same_code() {
        assert_eq!(Province::resolve("غزنی"), Some(Province::Ghazni));
        assert_eq!(Province::resolve("غزني"), Some(Province::Ghazni));
        assert_eq!(Province::resolve("ننګرهار"), Some(Province::Nangarhar));
        assert_eq!(Province::resolve("ننگرهار"), Some(Province::Nangarhar));
        assert_eq!(Province::resolve("kabul"), Some(Province::Kabul));
        assert_eq!(Province::resolve(" کابل "), Some(Province::Kabul));
    }

    #[test]
    fn resolves_city_aliases() {
        assert_eq!(Province::resolve("مزار شریف"), Some(Province::Balkh));
        assert_eq!(Province::resolve("جلال‌آباد"), Some(Province::Nangarhar));
        assert_eq!(Province::resolve("Atlantis"), None);
        assert_eq!(Province::resolve(""), None);
    }

    #[test]
    fn every_province_round_trips_through_its_names() {
        assert_eq!(Province::ALL.len(), 34);
        for province in Province::ALL {
            assert_eq!(Province::resolve(province.code()), Some(*province));
            assert_eq!(Province::resolve(province.name(Language::Dari)), Some(*province));
            assert_eq!(Province::resolve(province.name(Language::Pashto)), Some(*province));
        }
    }

    #[test]
    fn recognises_all_sentinels() {
        assert!(is_all_provinces("همه ولایات"));
        assert!(is_all_provinces("ټول ولایتونه"));
        assert!(is_all_provinces("ALL"));
        assert!(is_all_provinces(""));
        assert!(!is_all_provinces("کابل"));
    }

    #[test]
    fn selector_starts_with_sentinel() {
        let labels = Province::selector_labels(Language::Pashto);
        assert_eq!(labels[0], "ټول ولایتونه");
        assert_eq!(labels.len(), 35);
    }
}
