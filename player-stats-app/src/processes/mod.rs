pub mod registration;
pub mod rpc_worker;
