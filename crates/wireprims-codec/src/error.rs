use crate::scalar::ScalarType;

/// Errors that can occur while encoding or decoding scalar values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The type tag is not one of the supported scalar types.
    #[error("unsupported type {0}")]
    UnsupportedType(String),

    /// The input is empty, unterminated, or longer than 10 bytes.
    #[error("malformed varint: {0}")]
    MalformedVarint(&'static str),

    /// A negative value was passed to an unsigned encoder.
    #[error("value must be non-negative, got {0}")]
    Negative(i64),

    /// The value does not fit the width of the target type.
    #[error("value {value} out of range for {ty}")]
    OutOfRange { ty: ScalarType, value: i128 },

    /// The value variant cannot be encoded as the requested type.
    #[error("cannot encode {found} value as {ty}")]
    TypeMismatch { ty: ScalarType, found: &'static str },

    /// The input ends before a fixed-width or length-delimited value does.
    #[error("truncated input ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = CodecError::Negative(-5);
        assert_eq!(err.to_string(), "value must be non-negative, got -5");

        let err = CodecError::OutOfRange {
            ty: ScalarType::Sint32,
            value: 1 << 40,
        };
        assert!(err.to_string().contains("sint32"));

        let err = CodecError::TypeMismatch {
            ty: ScalarType::Bool,
            found: "string",
        };
        assert_eq!(err.to_string(), "cannot encode string value as bool");

        let err = CodecError::Truncated {
            needed: 8,
            available: 3,
        };
        assert!(err.to_string().contains("need 8"));
    }
}
