// Application layer - Query construction, shaping and use cases
pub mod flux_builder;
pub mod machine_data_service;
pub mod result_shaper;
pub mod time_series_client;
pub mod validation;
pub mod window;
