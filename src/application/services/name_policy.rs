//! Derives the public name of an upload from the client-requested format.

use chrono::Utc;
use chrono_tz::Tz;
use rand::Rng;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 255;
pub const COLLISION_SUFFIX_LENGTH: usize = 5;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
pub const DEFAULT_RANDOM_NAME_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameFormat {
    #[default]
    Original,
    Date,
    Random,
    Uuid,
}

impl NameFormat {
    /// Unknown or absent values fall back to `Original`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("date") => Self::Date,
            Some("random") => Self::Random,
            Some("uuid") => Self::Uuid,
            _ => Self::Original,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DerivedName {
    pub name: String,
    /// Set only when `name` differs from the client-provided base name.
    pub original_name: Option<String>,
}

/// Naming rules for one upload request, built from the settings table and
/// the owner's timezone.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    pub date_format: String,
    pub random_name_length: usize,
    pub timezone: Tz,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            random_name_length: DEFAULT_RANDOM_NAME_LENGTH,
            timezone: Tz::UTC,
        }
    }
}

impl NamePolicy {
    pub fn derive(&self, format: NameFormat, raw_base: &str, id: Uuid) -> DerivedName {
        let name = match format {
            NameFormat::Original => slugify(raw_base),
            NameFormat::Date => self.date_name(),
            NameFormat::Random => random_name(self.random_name_length),
            NameFormat::Uuid => id.to_string(),
        };
        let original_name = (name != raw_base).then(|| raw_base.to_string());
        DerivedName { name, original_name }
    }

    fn date_name(&self) -> String {
        let now = Utc::now().with_timezone(&self.timezone);
        // An unparsable pattern from the settings table falls back to the
        // default instead of panicking inside chrono's Display impl.
        if format_is_valid(&self.date_format) {
            now.format(&self.date_format).to_string()
        } else {
            now.format(DEFAULT_DATE_FORMAT).to_string()
        }
    }
}

fn format_is_valid(pattern: &str) -> bool {
    chrono::format::StrftimeItems::new(pattern)
        .parse()
        .is_ok()
}

/// ASCII-safe slug: NFD-normalise, drop combining marks, replace anything
/// outside `[A-Za-z0-9._-]` with `_`, lowercase, cap at 255.
pub fn slugify(raw: &str) -> String {
    let mut slug: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    slug.truncate(MAX_NAME_LENGTH);
    slug
}

/// Appends `_<5 random alnum>`, shortening the base so the result still fits
/// in 255 characters.
pub fn with_collision_suffix(name: &str) -> String {
    let mut base = name.to_string();
    base.truncate(MAX_NAME_LENGTH - COLLISION_SUFFIX_LENGTH - 1);
    format!("{}_{}", base, random_name(COLLISION_SUFFIX_LENGTH))
}

fn random_name(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const ALPHABET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
            ALPHABET[rng.random_range(0..ALPHABET.len())] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_strips_accents_and_forbidden_characters() {
        assert_eq!(slugify("héllo wörld"), "hello_world");
        assert_eq!(slugify("My Report (final).v2"), "my_report__final_.v2");
        assert_eq!(slugify("already-safe_name.1"), "already-safe_name.1");
    }

    #[test]
    fn slugify_truncates_to_255() {
        let long = "a".repeat(260);
        assert_eq!(slugify(&long).len(), 255);
    }

    #[test]
    fn collision_suffix_matches_expected_shape() {
        let suffixed = with_collision_suffix("hello");
        assert_eq!(suffixed.len(), "hello".len() + 6);
        assert!(suffixed.starts_with("hello_"));
        assert!(suffixed["hello_".len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));

        let long = "a".repeat(255);
        assert_eq!(with_collision_suffix(&long).len(), 255);
    }

    #[test]
    fn original_format_records_the_raw_name_only_when_changed() {
        let policy = NamePolicy::default();
        let id = Uuid::now_v7();

        let derived = policy.derive(NameFormat::Original, "hello", id);
        assert_eq!(derived.name, "hello");
        assert_eq!(derived.original_name, None);

        let derived = policy.derive(NameFormat::Original, "Héllo There", id);
        assert_eq!(derived.name, "hello_there");
        assert_eq!(derived.original_name, Some("Héllo There".to_string()));
    }

    #[test]
    fn random_format_respects_the_configured_length() {
        let policy = NamePolicy {
            random_name_length: 12,
            ..NamePolicy::default()
        };
        let derived = policy.derive(NameFormat::Random, "ignored", Uuid::now_v7());
        assert_eq!(derived.name.len(), 12);
        assert!(derived.name.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(derived.original_name, Some("ignored".to_string()));
    }

    #[test]
    fn uuid_format_uses_the_row_id() {
        let policy = NamePolicy::default();
        let id = Uuid::now_v7();
        let derived = policy.derive(NameFormat::Uuid, "ignored", id);
        assert_eq!(derived.name, id.to_string());
    }

    #[test]
    fn date_format_renders_in_the_policy_timezone() {
        let policy = NamePolicy {
            timezone: chrono_tz::Asia::Tokyo,
            ..NamePolicy::default()
        };
        let derived = policy.derive(NameFormat::Date, "ignored", Uuid::now_v7());
        // yyyy-MM-dd_HH-mm-ss
        assert_eq!(derived.name.len(), 19);
        assert_eq!(derived.name.as_bytes()[4], b'-');
        assert_eq!(derived.name.as_bytes()[10], b'_');
    }

    #[test]
    fn invalid_date_pattern_falls_back_to_the_default() {
        let policy = NamePolicy {
            date_format: "%Q%Q%Q".to_string(),
            ..NamePolicy::default()
        };
        let derived = policy.derive(NameFormat::Date, "ignored", Uuid::now_v7());
        assert_eq!(derived.name.len(), 19);
    }

    #[test]
    fn unknown_format_strings_behave_as_original() {
        assert_eq!(NameFormat::parse(Some("date")), NameFormat::Date);
        assert_eq!(NameFormat::parse(Some("random")), NameFormat::Random);
        assert_eq!(NameFormat::parse(Some("uuid")), NameFormat::Uuid);
        assert_eq!(NameFormat::parse(Some("bogus")), NameFormat::Original);
        assert_eq!(NameFormat::parse(None), NameFormat::Original);
    }
}
