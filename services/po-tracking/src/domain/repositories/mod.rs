//! 仓储接口

mod base_record_repository;
mod last_update_repository;
mod localidad_repository;
mod nuevo_estatus_repository;
mod supplier_order_repository;
mod user_repository;

pub use base_record_repository::*;
pub use last_update_repository::*;
pub use localidad_repository::*;
pub use nuevo_estatus_repository::*;
pub use supplier_order_repository::*;
pub use user_repository::*;
