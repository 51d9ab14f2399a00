mod core;
mod create_endpoint;
mod lookup_endpoint;

pub use core::{
    Customer, CustomerId, NewCustomer, create_customer, create_customer_table, get_customer,
    get_customer_by_cpf, validate_cpf,
};
pub use create_endpoint::create_customer_endpoint;
pub use lookup_endpoint::lookup_customer_by_cpf_endpoint;
