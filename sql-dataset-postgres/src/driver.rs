use crate::PostgresConnection;
use sql_dataset_core::Driver;

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;

    const NAME: &'static str = "postgres";
}
