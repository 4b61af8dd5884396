//! [`Client`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Person borrowing money.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Client {
    /// ID of this [`Client`].
    pub id: Id,

    /// [`Name`] of this [`Client`].
    pub name: Name,

    /// [`Phone`] of this [`Client`].
    pub phone: Phone,

    /// [`Address`] of this [`Client`].
    pub address: Address,

    /// [`Cpf`] of this [`Client`], if known.
    pub cpf: Option<Cpf>,

    /// Free-form [`Notes`] about this [`Client`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Client`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Client`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new [`Id`], ordered after all the previously created ones.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Name of a [`Client`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        let len = name.chars().count();
        name.trim() == name && (3..=512).contains(&len)
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Contact phone number of a [`Client`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Returns only the digits of this [`Phone`] number.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[0-9(][0-9 ().-]{8,30}[0-9]$")
                .expect("valid regex")
        });

        let number = number.as_ref();
        REGEX.is_match(number)
            && number.chars().filter(char::is_ascii_digit).count() >= 10
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Postal address of a [`Client`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        let len = address.chars().count();
        address.trim() == address && (5..=1024).contains(&len)
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

/// Brazilian individual taxpayer number (CPF) of a [`Client`].
///
/// Always holds exactly 11 digits with valid check digits.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Cpf(String);

impl Cpf {
    /// Creates a new [`Cpf`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `digits` are exactly 11 ASCII
    /// digits with valid check digits.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    /// Creates a new [`Cpf`] if the given `input` is valid.
    ///
    /// Common punctuation (`123.456.789-09`) is accepted and stripped.
    #[must_use]
    pub fn new(input: impl AsRef<str>) -> Option<Self> {
        let input = input.as_ref();
        if !input
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))
        {
            return None;
        }
        let digits = input
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();
        Self::check(&digits).then_some(Self(digits))
    }

    /// Returns this [`Cpf`] in its conventional `XXX.XXX.XXX-XX` notation.
    ///
    /// Malformed digits (possible only via [`Cpf::new_unchecked()`]) are
    /// returned as is.
    #[must_use]
    pub fn formatted(&self) -> String {
        let d = &self.0;
        if d.len() != 11 {
            return d.clone();
        }
        match (d.get(0..3), d.get(3..6), d.get(6..9), d.get(9..)) {
            (Some(a), Some(b), Some(c), Some(e)) => format!("{a}.{b}.{c}-{e}"),
            _ => d.clone(),
        }
    }

    /// Checks whether the given `digits` form a valid [`Cpf`].
    fn check(digits: &str) -> bool {
        let digits = digits
            .bytes()
            .map(|b| u32::from(b.wrapping_sub(b'0')))
            .collect::<Vec<_>>();
        if digits.len() != 11 || digits.iter().any(|d| *d > 9) {
            return false;
        }
        // Repeated digits pass the checksum, but are never issued.
        if digits.iter().all(|d| *d == digits[0]) {
            return false;
        }

        let check_digit = |len: usize| {
            let sum = digits[..len]
                .iter()
                .zip((2..=u32::try_from(len).unwrap_or(0) + 1).rev())
                .map(|(d, w)| d * w)
                .sum::<u32>();
            (sum * 10 % 11) % 10
        };
        check_digit(9) == digits[9] && check_digit(10) == digits[10]
    }
}

impl FromStr for Cpf {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Cpf`")
    }
}

/// Free-form notes about a [`Client`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates a new [`Notes`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Notes`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.chars().count() <= 4096
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

/// [`DateTime`] when a [`Client`] was created.
pub type CreationDateTime = DateTimeOf<(Client, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Address, Cpf, Name, Notes, Phone};

    #[test]
    fn name() {
        assert!(Name::new("Ana").is_some());
        assert!(Name::new("João da Silva").is_some());

        assert!(Name::new("Jo").is_none());
        assert!(Name::new(" Ana").is_none());
        assert!(Name::new("Ana ").is_none());
        assert!(Name::new("x".repeat(513)).is_none());
    }

    #[test]
    fn phone() {
        assert!(Phone::new("11987654321").is_some());
        assert!(Phone::new("(11) 98765-4321").is_some());
        assert!(Phone::new("+55 11 98765-4321").is_some());

        assert!(Phone::new("98765-432").is_none());
        assert!(Phone::new("call me maybe").is_none());
        assert!(Phone::new(" 11987654321").is_none());
    }

    #[test]
    fn phone_digits() {
        assert_eq!(
            Phone::new("+55 (11) 98765-4321").unwrap().digits(),
            "5511987654321",
        );
    }

    #[test]
    fn address() {
        assert!(Address::new("Rua A, 10").is_some());

        assert!(Address::new("Rua").is_none());
        assert!(Address::new("Rua A, 10 ").is_none());
    }

    #[test]
    fn cpf() {
        assert!(Cpf::new("52998224725").is_some());
        assert!(Cpf::new("529.982.247-25").is_some());
        assert!(Cpf::new("111.444.777-35").is_some());

        assert!(Cpf::new("529.982.247-26").is_none());
        assert!(Cpf::new("111.111.111-11").is_none());
        assert!(Cpf::new("5299822472").is_none());
        assert!(Cpf::new("529982247250").is_none());
        assert!(Cpf::new("52998224a25").is_none());
    }

    #[test]
    fn cpf_normalizes_punctuation() {
        let cpf = Cpf::new("529.982.247-25").unwrap();

        assert_eq!(AsRef::<str>::as_ref(&cpf), "52998224725");
        assert_eq!(cpf.formatted(), "529.982.247-25");
        assert_eq!(cpf, Cpf::new("52998224725").unwrap());
    }

    #[test]
    fn cpf_formats_malformed_as_is() {
        #[expect(unsafe_code, reason = "malformed on purpose")]
        let (short, wide) = unsafe {
            (Cpf::new_unchecked("123"), Cpf::new_unchecked("12é4567890"))
        };

        assert_eq!(short.formatted(), "123");
        assert_eq!(wide.formatted(), "12é4567890");
    }

    #[test]
    fn notes() {
        assert!(Notes::new("pays on fridays").is_some());

        assert!(Notes::new("   ").is_none());
        assert!(Notes::new("x".repeat(4097)).is_none());
    }
}
