use crate::{Connection, Result};
use std::{borrow::Cow, future::Future};

pub trait Driver {
    type Connection: Connection;

    /// Url scheme accepted by the connection.
    const NAME: &'static str;

    fn connect(&self, url: Cow<'static, str>) -> impl Future<Output = Result<Self::Connection>> {
        Self::Connection::connect(url)
    }
}
