//! Argument marshaling
//!
//! Reversible encoding between typed values and the raw byte arguments a
//! chaincode receives.
//!
//! | type                         | encoding                     |
//! |------------------------------|------------------------------|
//! | `str` / `String`             | UTF-8 bytes                  |
//! | `Vec<u8>` / `[u8]`           | verbatim                     |
//! | integers, floats, `bool`     | canonical decimal/text form  |
//! | [`Json<T>`]                  | `serde_json` serialization   |
//!
//! `FromBytes` is the exact inverse of `ToBytes` for every type above, which
//! is what the dispatch layer relies on when it unmarshals parameters.
//!
//! The table describes single arguments. As a whole argument list a `Vec<T>`
//! is one argument per element, so `b"hi".to_vec()` passed directly to
//! `invoke` is two `u8` arguments (`"104"`, `"105"`). Wrap raw bytes in a
//! tuple, `(bytes,)`, to send them as one verbatim argument.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while marshaling arguments
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("argument is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("cannot parse integer from {input:?}: {source}")]
    ParseInt {
        input: String,
        source: std::num::ParseIntError,
    },

    #[error("cannot parse float from {input:?}: {source}")]
    ParseFloat {
        input: String,
        source: std::num::ParseFloatError,
    },

    #[error("cannot parse bool from {input:?}")]
    ParseBool { input: String },

    #[error("json conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Value that can be marshaled into a chaincode argument
pub trait ToBytes {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError>;
}

/// Value that can be unmarshaled from a chaincode argument
pub trait FromBytes: Sized {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError>;
}

/// Structured value carried as JSON
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::convert::{FromBytes, Json, ToBytes};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Transfer {
///     to: String,
///     amount: u64,
/// }
///
/// let transfer = Transfer { to: "DigiBank".to_string(), amount: 10 };
/// let bytes = Json(&transfer).to_bytes().unwrap();
/// let Json(decoded) = Json::<Transfer>::from_bytes(&bytes).unwrap();
///
/// assert_eq!(decoded, transfer);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToBytes for Json<T> {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

impl<T: DeserializeOwned> FromBytes for Json<T> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        Ok(Json(serde_json::from_slice(bytes)?))
    }
}

impl<T: ToBytes + ?Sized> ToBytes for &T {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        (**self).to_bytes()
    }
}

impl ToBytes for str {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl FromBytes for String {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

impl ToBytes for [u8] {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(self.to_vec())
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(self.clone())
    }
}

impl FromBytes for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        Ok(bytes.to_vec())
    }
}

impl ToBytes for bool {
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(self.to_string().into_bytes())
    }
}

impl FromBytes for bool {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        let input = String::from_bytes(bytes)?;
        input
            .parse()
            .map_err(|_| ConvertError::ParseBool { input })
    }
}

macro_rules! impl_integer_bytes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToBytes for $ty {
                fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
                    Ok(self.to_string().into_bytes())
                }
            }

            impl FromBytes for $ty {
                fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
                    let input = String::from_bytes(bytes)?;
                    input
                        .parse()
                        .map_err(|source| ConvertError::ParseInt { input, source })
                }
            }
        )*
    };
}

impl_integer_bytes!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

macro_rules! impl_float_bytes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToBytes for $ty {
                fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
                    Ok(self.to_string().into_bytes())
                }
            }

            impl FromBytes for $ty {
                fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
                    let input = String::from_bytes(bytes)?;
                    input
                        .parse()
                        .map_err(|source| ConvertError::ParseFloat { input, source })
                }
            }
        )*
    };
}

impl_float_bytes!(f32, f64);

/// Argument lists accepted by the sugared `init` / `invoke`
///
/// Implemented for `()`, tuples of up to eight [`ToBytes`] values, and
/// vectors/slices of a single [`ToBytes`] type. A vector or slice is split
/// into one argument per element, including `Vec<u8>`.
pub trait IntoArgs {
    fn into_args(self) -> Result<Vec<Vec<u8>>, ConvertError>;
}

impl IntoArgs for () {
    fn into_args(self) -> Result<Vec<Vec<u8>>, ConvertError> {
        Ok(Vec::new())
    }
}

impl<T: ToBytes> IntoArgs for Vec<T> {
    fn into_args(self) -> Result<Vec<Vec<u8>>, ConvertError> {
        self.iter().map(ToBytes::to_bytes).collect()
    }
}

impl<T: ToBytes> IntoArgs for &[T] {
    fn into_args(self) -> Result<Vec<Vec<u8>>, ConvertError> {
        self.iter().map(ToBytes::to_bytes).collect()
    }
}

macro_rules! impl_tuple_args {
    ($($name:ident),+) => {
        impl<$($name: ToBytes),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Result<Vec<Vec<u8>>, ConvertError> {
                let ($($name,)+) = self;
                Ok(vec![$($name.to_bytes()?),+])
            }
        }
    };
}

impl_tuple_args!(A);
impl_tuple_args!(A, B);
impl_tuple_args!(A, B, C);
impl_tuple_args!(A, B, C, D);
impl_tuple_args!(A, B, C, D, E);
impl_tuple_args!(A, B, C, D, E, F);
impl_tuple_args!(A, B, C, D, E, F, G);
impl_tuple_args!(A, B, C, D, E, F, G, H);

/// Marshal a function name followed by its arguments
pub fn function_args(function: &str, args: impl IntoArgs) -> Result<Vec<Vec<u8>>, ConvertError> {
    let mut all = vec![function.as_bytes().to_vec()];
    all.extend(args.into_args()?);
    Ok(all)
}
