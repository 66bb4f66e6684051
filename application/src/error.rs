//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{error::Kind, infra::database};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// HTTP API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] of the provided [`Kind`], using the provided
    /// `code` and `msg`.
    ///
    /// [`None`] is returned for [`Kind::Internal`] failures, so they're
    /// reported as internal server errors.
    #[must_use]
    pub fn of_kind(
        kind: Kind,
        code: Code,
        msg: &impl ToString,
    ) -> Option<Self> {
        let status_code = match kind {
            Kind::Validation => http::StatusCode::BAD_REQUEST,
            Kind::NotFound => http::StatusCode::NOT_FOUND,
            Kind::InvalidTransition => http::StatusCode::CONFLICT,
            Kind::ExternalDispatch => http::StatusCode::BAD_GATEWAY,
            Kind::Internal => return None,
        };
        Some(Self {
            code,
            status_code,
            message: msg.to_string(),
            backtrace: None,
        })
    }

    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        /// JSON body of an [`Error`] response.
        #[derive(Serialize)]
        struct Body<'a> {
            /// [`Error`] code.
            code: Code,

            /// [`Error`] message.
            message: &'a str,
        }

        if self.status_code.is_server_error() {
            log::error!("{self}");
        }

        let body = Body {
            code: self.code,
            message: &self.message,
        };
        (self.status_code, Json(body)).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "BAD_REQUEST",
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_BODY",
            status_code: self.status(),
            message: self.body_text(),
            backtrace: None,
        })
    }
}

impl AsError for PathRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_PATH",
            status_code: self.status(),
            message: self.body_text(),
            backtrace: None,
        })
    }
}

impl AsError for QueryRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_QUERY",
            status_code: self.status(),
            message: self.body_text(),
            backtrace: None,
        })
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use service::error::Kind;

    use crate::define_error;

    use super::Error;

    #[test]
    fn maps_kinds_to_statuses() {
        let status = |kind| {
            Error::of_kind(kind, "CODE", &"message").map(|e| e.status_code)
        };

        assert_eq!(
            status(Kind::Validation),
            Some(http::StatusCode::BAD_REQUEST),
        );
        assert_eq!(status(Kind::NotFound), Some(http::StatusCode::NOT_FOUND));
        assert_eq!(
            status(Kind::InvalidTransition),
            Some(http::StatusCode::CONFLICT),
        );
        assert_eq!(status(Kind::Internal), None);
    }

    #[test]
    fn defines_errors() {
        define_error! {
            enum Defined {
                #[code = "TEAPOT"]
                #[status = IM_A_TEAPOT]
                #[message = "I'm a teapot"]
                Teapot,
            }
        }

        let err = Error::from(Defined::Teapot);

        assert_eq!(err.code, "TEAPOT");
        assert_eq!(err.status_code, http::StatusCode::IM_A_TEAPOT);
        assert_eq!(err.to_string(), "[TEAPOT]: I'm a teapot");
    }
}
