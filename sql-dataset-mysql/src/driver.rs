use crate::MySQLConnection;
use sql_dataset_core::Driver;

#[derive(Clone, Copy, Default)]
pub struct MySQLDriver;
impl MySQLDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MySQLDriver {
    type Connection = MySQLConnection;

    const NAME: &'static str = "mysql";
}
