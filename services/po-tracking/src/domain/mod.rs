//! 领域层

pub mod base_record;
pub mod dates;
pub mod events;
pub mod localidad;
pub mod pedido;
pub mod repositories;
pub mod supplier_order;
pub mod unit_of_work;
pub mod user;
pub mod values;
