//! [`Reminder`] about an upcoming [`Loan`] payment.

use std::fmt::Write as _;

use common::{money::Currency, Money};
use rust_decimal::{Decimal, RoundingStrategy};

#[cfg(doc)]
use super::Loan;
use super::{DueDate, Snapshot};
use crate::domain::Client;

/// Country calling code prepended to local phone numbers.
const COUNTRY_CODE: &str = "55";

/// WhatsApp message reminding a [`Client`] to pay a [`Loan`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reminder {
    /// Phone number to send this [`Reminder`] to, in the international
    /// format without any punctuation.
    pub phone: String,

    /// Text of this [`Reminder`].
    pub text: String,
}

impl Reminder {
    /// Creates a new [`Reminder`] for the provided [`Client`] about the amount
    /// described by the [`Snapshot`].
    #[must_use]
    pub fn new(client: &Client, snapshot: &Snapshot) -> Self {
        let digits = client.phone.digits();
        let phone = if digits.starts_with(COUNTRY_CODE) && digits.len() >= 12 {
            digits
        } else {
            format!("{COUNTRY_CODE}{digits}")
        };

        Self {
            phone,
            text: message(client, snapshot.total, snapshot.due_date),
        }
    }

    /// Returns the `wa.me` link opening a chat with this [`Reminder`]
    /// pre-filled.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.phone,
            percent_encode(&self.text),
        )
    }
}

/// Composes the text of a [`Reminder`].
fn message(client: &Client, amount: Money, due_date: DueDate) -> String {
    format!(
        "Olá {}, passando para lembrar do vencimento do seu empréstimo de {} \
         previsto para {}.",
        client.name,
        localized(amount),
        due_date.to_day_month_year(),
    )
}

/// Formats the provided [`Money`] the way Brazilian Portuguese does:
/// `R$ 1.234,56`.
#[must_use]
pub fn localized(money: Money) -> String {
    let symbol = match money.currency {
        Currency::Brl => "R$",
    };

    let amount = money
        .amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let cents = (amount.abs() * Decimal::ONE_HUNDRED).trunc();
    let units = (cents / Decimal::ONE_HUNDRED).trunc().to_string();
    let cents = (cents % Decimal::ONE_HUNDRED).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{symbol} {sign}{grouped},{cents:0>2}")
}

/// Percent-encodes the provided `text` as a URL query component, keeping
/// only the unreserved characters of [RFC 3986] as they are.
///
/// [RFC 3986]: https://www.rfc-editor.org/rfc/rfc3986#section-2.3
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(b));
        } else {
            _ = write!(out, "%{b:02X}");
        }
    }
    out
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        client,
        loan::{Rates, Term},
        Client,
    };

    use super::{localized, percent_encode, Reminder};

    fn brl(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Brl,
        }
    }

    fn client(phone: &str) -> Client {
        Client {
            id: client::Id::new(),
            name: "Maria".parse().unwrap(),
            phone: phone.parse().unwrap(),
            address: "Rua das Flores, 12".parse().unwrap(),
            cpf: None,
            notes: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn localizes_money() {
        assert_eq!(localized(brl("1000")), "R$ 1.000,00");
        assert_eq!(localized(brl("1450.5")), "R$ 1.450,50");
        assert_eq!(localized(brl("0.07")), "R$ 0,07");
        assert_eq!(localized(brl("999")), "R$ 999,00");
        assert_eq!(localized(brl("1234567.891")), "R$ 1.234.567,89");
        assert_eq!(localized(brl("-50")), "R$ -50,00");
    }

    #[test]
    fn encodes_query_component() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("R$ 1,00"), "R%24%201%2C00");
        assert_eq!(percent_encode("Olá"), "Ol%C3%A1");
        assert_eq!(percent_encode("x-y_z.~"), "x-y_z.~");
    }

    #[test]
    fn reminds_about_total_and_due_date() {
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();
        let snapshot = crate::domain::loan::Snapshot::compute(
            &Rates::default(),
            brl("1000"),
            today.minus_days(21).coerce(),
            None,
            Term::default(),
            today,
        );

        let reminder = Reminder::new(&client("(11) 98765-4321"), &snapshot);

        assert_eq!(reminder.phone, "5511987654321");
        assert_eq!(
            reminder.text,
            "Olá Maria, passando para lembrar do vencimento do seu \
             empréstimo de R$ 1.450,00 previsto para 14/06/2024.",
        );
        assert!(reminder
            .link()
            .starts_with("https://wa.me/5511987654321?text=Ol%C3%A1%20Maria"));
    }

    #[test]
    fn keeps_existing_country_code() {
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();
        let snapshot = crate::domain::loan::Snapshot::compute(
            &Rates::default(),
            Money {
                amount: Decimal::from(10),
                currency: Currency::Brl,
            },
            today.coerce(),
            None,
            Term::default(),
            today,
        );

        let reminder = Reminder::new(&client("+55 11 98765-4321"), &snapshot);

        assert_eq!(reminder.phone, "5511987654321");
    }
}
