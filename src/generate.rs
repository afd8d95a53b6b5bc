//! Values computed for fields the caller left blank.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

use crate::resource::{Fill, ModeDefaults, NormalizedRequest, ResourceKind};
use crate::validate::Draft;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
pub const SPECIALS: &[u8] = b"!@#$%&*";

const MIN_PASSWORD_LENGTH: usize = 4;

fn pick<R: Rng>(rng: &mut R, set: &[u8]) -> u8 {
    set[rng.gen_range(0..set.len())]
}

/// Generates a password with at least one lowercase letter, uppercase
/// letter, digit and special character, using the thread-local CSPRNG.
pub fn generate_password(length: usize) -> String {
    generate_password_with(&mut rand::thread_rng(), length)
}

pub fn generate_password_with<R: Rng + CryptoRng>(rng: &mut R, length: usize) -> String {
    let length = length.max(MIN_PASSWORD_LENGTH);
    let alphabet: Vec<u8> = [LOWERCASE, UPPERCASE, DIGITS, SPECIALS].concat();

    let mut chars = vec![
        pick(rng, LOWERCASE),
        pick(rng, UPPERCASE),
        pick(rng, DIGITS),
        pick(rng, SPECIALS),
    ];
    while chars.len() < length {
        chars.push(pick(rng, &alphabet));
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}

/// `ana.maria.pop` -> `Ana Maria Pop`
pub fn display_name(local_part: &str) -> String {
    local_part
        .split(['.', '_', '-'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Fields filled in by [`derive`] rather than supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedFields {
    pub generated_password: Option<String>,
    pub display_name: Option<String>,
}

impl DerivedFields {
    pub fn is_empty(&self) -> bool {
        self.generated_password.is_none() && self.display_name.is_none()
    }
}

/// Completes a validated draft into a submittable request.
pub fn derive<R: Rng + CryptoRng>(
    draft: Draft,
    defaults: &ModeDefaults,
    rng: &mut R,
) -> (NormalizedRequest, DerivedFields) {
    let Draft {
        kind,
        mut fields,
        pending,
        ..
    } = draft;
    let mut derived = DerivedFields::default();

    for column in pending {
        match column.fill {
            Fill::Password => {
                let password = generate_password_with(rng, defaults.password_length);
                fields.insert(column.name.to_string(), password.clone());
                derived.generated_password = Some(password);
            }
            Fill::DisplayName { from } => {
                let source = fields.get(from).map(String::as_str).unwrap_or_default();
                let name = display_name(source);
                fields.insert(column.name.to_string(), name.clone());
                derived.display_name = Some(name);
            }
            Fill::Required | Fill::Optional => {}
        }
    }

    // mailcow wants the password twice on mailbox creation.
    if kind == ResourceKind::Mailbox {
        if let Some(password) = fields.get("password").cloned() {
            fields.insert("password2".to_string(), password);
        }
    }

    (NormalizedRequest { kind, fields }, derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn has_every_class(password: &str) -> bool {
        let bytes = password.as_bytes();
        [LOWERCASE, UPPERCASE, DIGITS, SPECIALS]
            .iter()
            .all(|set| bytes.iter().any(|b| set.contains(b)))
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("ana.maria.pop"), "Ana Maria Pop");
        assert_eq!(display_name("admin"), "Admin");
        assert_eq!(display_name("john_doe"), "John Doe");
        assert_eq!(display_name("john-doe"), "John Doe");
        assert_eq!(display_name("JOHN..doe"), "John Doe");
        assert_eq!(display_name("._-"), "");
    }

    #[test]
    fn passwords_contain_every_class() {
        let mut previous = String::new();
        for _ in 0..1000 {
            let password = generate_password(16);
            assert_eq!(password.len(), 16);
            assert!(has_every_class(&password), "{password}");
            assert_ne!(password, previous);
            previous = password;
        }
    }

    #[test]
    fn short_lengths_still_fit_every_class() {
        let mut rng = StdRng::seed_from_u64(7);
        let password = generate_password_with(&mut rng, 2);
        assert_eq!(password.len(), MIN_PASSWORD_LENGTH);
        assert!(has_every_class(&password));
    }

    #[test]
    fn custom_length() {
        let mut rng = StdRng::seed_from_u64(42);
        let password = generate_password_with(&mut rng, 32);
        assert_eq!(password.len(), 32);
        assert!(password.bytes().all(|b| b.is_ascii_graphic()));
    }
}
