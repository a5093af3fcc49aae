mod connection;
mod driver;
mod row_wrap;
mod value_wrap;

pub use connection::*;
pub use driver::*;
pub(crate) use row_wrap::*;
pub(crate) use value_wrap::*;
