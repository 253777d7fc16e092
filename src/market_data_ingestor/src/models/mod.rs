pub mod bar;
pub mod request_params;
