// Concrete implementations of the domain ports.

pub mod http;
pub mod presenter;
pub mod storage;

pub use http::HttpCuttingApi;
pub use presenter::ConsolePresenter;
pub use storage::LocalStorage;
