//! Monetary GraphQL definitions.

use common::money;
use derive_more::{Display, From, Into};
use juniper::{GraphQLEnum, GraphQLScalar, InputValue, ScalarValue, Value};
use rust_decimal::{
    prelude::{FromPrimitive as _, ToPrimitive as _},
    Decimal,
};

/// Amount of money as a number of base currency units: `1450.5` stands for
/// `R$ 1.450,50`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[graphql(with = Self, parse_token(i32, f64))]
pub struct Amount(Decimal);

impl Amount {
    /// Returns [`money::Money`] of this [`Amount`] in the provided
    /// [`money::Currency`].
    #[must_use]
    pub fn in_currency(self, currency: money::Currency) -> money::Money {
        money::Money {
            amount: self.0,
            currency,
        }
    }

    fn to_output<S: ScalarValue>(&self) -> Value<S> {
        match self.0.normalize() {
            d if d.is_integer() => d.to_i32().map_or_else(
                || Value::scalar(d.to_f64().unwrap_or_default()),
                Value::scalar,
            ),
            d => Value::scalar(d.to_f64().unwrap_or_default()),
        }
    }

    fn from_input<S: ScalarValue>(
        input: &InputValue<S>,
    ) -> Result<Self, String> {
        input
            .as_int_value()
            .map(Decimal::from)
            .or_else(|| input.as_float_value().and_then(Decimal::from_f64))
            .map(|d| Self(d.normalize()))
            .ok_or_else(|| {
                format!(
                    "Cannot parse `Amount` input scalar from non-numeric \
                     value: {input}",
                )
            })
    }
}

impl From<money::Money> for Amount {
    fn from(money: money::Money) -> Self {
        Self(money.amount)
    }
}

/// Currency amounts are expressed in.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum Currency {
    /// Brazilian Real.
    Brl,
}

impl From<money::Currency> for Currency {
    fn from(currency: money::Currency) -> Self {
        match currency {
            money::Currency::Brl => Self::Brl,
        }
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue, Value};
    use rust_decimal::Decimal;

    use super::Amount;

    fn amount(s: &str) -> Amount {
        Amount::from(s.parse::<Decimal>().unwrap())
    }

    #[test]
    fn outputs_numbers() {
        assert_eq!(
            amount("1550.00").to_output::<DefaultScalarValue>(),
            Value::scalar(1550),
        );
        assert_eq!(
            amount("1450.50").to_output::<DefaultScalarValue>(),
            Value::scalar(1450.5),
        );
    }

    #[test]
    fn parses_numbers() {
        let int = InputValue::<DefaultScalarValue>::scalar(1000);
        assert_eq!(Amount::from_input(&int).unwrap(), amount("1000"));

        let float = InputValue::<DefaultScalarValue>::scalar(99.9);
        assert_eq!(Amount::from_input(&float).unwrap(), amount("99.9"));

        let string = InputValue::<DefaultScalarValue>::scalar("1000BRL");
        assert!(Amount::from_input(&string).is_err());
    }
}
