//! Helpers for defining GraphQL scalars over domain types.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Uses [`FromStr`]/[`Display`] impls of `As` type to convert the target type
/// to/from GraphQL scalar.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Convert the target type into scalar [`Value`] by using [`Display`] impl
    /// of `As` type.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from scalar [`Value`] by using [`FromStr`]
    /// impl of `As` type.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not a string;
    /// - the input value cannot be parsed into `As` type;
    /// - the parsed value cannot be converted into the target type.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr + fmt::Display,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{}`: expected string input \
                 value, found: {input}",
                T::name(&()).expect("always has a name"),
            )
        })?;
        s.parse::<As>()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{}` from \"{s}\" string: {e}",
                    T::name(&()).expect("always has a name"),
                )
            })?
            .try_into()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{}`: {e}",
                    T::name(&()).expect("always has a name"),
                )
            })
    }

    /// Parse the provided [`ScalarToken`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be parsed as [`String`].
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Converts the target type to/from GraphQL `Int` scalar through the [`u16`]
/// conversions of `As` type.
///
/// Target type must implement [`From`] and [`Into`] for `As` type.
#[derive(Debug)]
pub struct ViaInt<As>(PhantomData<As>);

impl<As> ViaInt<As> {
    /// Convert the target type into scalar [`Value`] by using [`Into`]<[`u16`]>
    /// impl of `As` type.
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: Into<u16>,
        T: Clone + Into<As>,
        S: ScalarValue,
    {
        let value: As = value.clone().into();
        let num: u16 = value.into();
        Value::scalar(i32::from(num))
    }

    /// Constructs the target type from scalar [`Value`] by using
    /// [`TryFrom`]<[`u16`]> impl of `As` type.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not an integer;
    /// - the input value doesn't fit into [`u16`];
    /// - the input value cannot be converted into `As` type.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: TryFrom<u16>,
        As::Error: fmt::Display,
        T: From<As> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let num = input.as_int_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{}`: expected integer input \
                 value, found: {input}",
                T::name(&()).expect("always has a name"),
            )
        })?;
        let num = u16::try_from(num).map_err(|e| {
            format!(
                "Cannot parse input scalar `{}` from {num}: {e}",
                T::name(&()).expect("always has a name"),
            )
        })?;
        As::try_from(num).map(T::from).map_err(|e| {
            format!(
                "Cannot parse input scalar `{}` from {num}: {e}",
                T::name(&()).expect("always has a name"),
            )
        })
    }

    /// Parse the provided [`ScalarToken`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be parsed as [`i32`].
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <i32 as ParseScalarValue<S>>::from_str(value)
    }
}
