pub mod capture_delegate;
pub mod capture_stream;
pub mod endpoint;
pub mod stop_signal;
