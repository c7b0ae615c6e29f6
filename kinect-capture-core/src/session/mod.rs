pub mod capture;
pub mod recorder;
pub mod stop_signal;
