use crate::{Executor, Result};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor + Sized {
    /// Open a session to the database at `url`, the scheme must match `Driver::NAME`.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>>;

    fn disconnect(self) -> impl Future<Output = Result<()>> {
        async move {
            drop(self);
            Ok(())
        }
    }
}
