pub mod post;
pub mod user;
pub mod view;
pub mod vote;

use crate::model::user::InvalidUserHandleError;
use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Debug, Display, Formatter},
    marker::PhantomData,
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    UserHandle(#[from] InvalidUserHandleError),
    #[error("A poll had {0} options, but at most {max} are allowed", max = post::POLL_MAX_OPTIONS)]
    TooManyPollOptions(usize),
    #[error("A poll had {texts} option texts, but {colors} option colors")]
    PollOptionMismatch { texts: usize, colors: usize },
    #[error("Exposure records had {viewers} viewers, but {amounts} amounts")]
    ExposureMismatch { viewers: usize, amounts: usize },
    #[error("A negative count was stored: {0}")]
    NegativeCount(i64),
}

/// Typed 64 bit identifier.
///
/// Ids travel as decimal strings on the wire since 64 bit integers do not survive
/// every JSON client.
#[derive_where(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Id<Marker>(u64, PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Debug for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.0).finish()
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::new)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}

impl<Marker> Serialize for Id<Marker> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de, Marker> Deserialize<'de> for Id<Marker> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Id::from_str(&inner).map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"Id"))
    }
}
