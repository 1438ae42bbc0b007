//! 应用层

pub mod import;
pub mod localidades;
pub mod nuevo_estatus;
pub mod reconciler;
pub mod records;
pub mod users;

pub use import::ImportService;
pub use localidades::LocalidadService;
pub use nuevo_estatus::{NuevoEstatusImport, NuevoEstatusService};
pub use reconciler::{DeleteSummary, PedidoReconciler, UpsertSummary};
pub use records::{CellUpdate, EditScope, RecordService};
pub use users::{LoginOutcome, UserService};
