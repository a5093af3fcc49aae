mod coerce;
mod connection;
mod dataset;
mod delivery;
mod driver;
mod executor;
mod field;
mod number;
mod pipeline;
mod record;
mod row;
mod schema;
mod util;
mod value;

pub use ::anyhow::Context;
pub use coerce::*;
pub use connection::*;
pub use dataset::*;
pub use delivery::*;
pub use driver::*;
pub use executor::*;
pub use field::*;
pub use number::*;
pub use pipeline::*;
pub use record::*;
pub use row::*;
pub use schema::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
