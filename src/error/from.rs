use std::{fmt::Debug, io};

use async_channel::SendError;
use aws_sdk_s3::{
    error::{BuildError, SdkError},
    primitives::ByteStreamError,
};
use tokio::task::JoinError;

use super::Error;

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::other(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::other(error)
    }
}

impl From<JoinError> for Error {
    fn from(error: JoinError) -> Self {
        Error::other(error)
    }
}

impl From<ByteStreamError> for Error {
    fn from(error: ByteStreamError) -> Self {
        Error::other(error)
    }
}

impl<E: std::error::Error + Send + Sync + 'static, R: Debug + Send + Sync + 'static>
    From<SdkError<E, R>> for Error
{
    fn from(error: SdkError<E, R>) -> Self {
        Error::other(error)
    }
}

impl From<BuildError> for Error {
    fn from(error: BuildError) -> Self {
        Error::other(error)
    }
}

impl<T: Send + Sync + 'static> From<SendError<T>> for Error {
    fn from(error: SendError<T>) -> Self {
        Error::other(error)
    }
}
