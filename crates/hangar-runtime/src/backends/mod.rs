//! Built-in execution backends

pub mod local;
pub mod remote_function;

pub use local::LocalPluginRuntime;
pub use remote_function::RemoteFunctionRuntime;
