pub mod app_config;
pub mod book_detail;
pub mod book_list;
pub mod navigation;
pub mod query_pipeline;
pub mod screen_scope;
pub mod telemetry;
pub mod terminal;
pub mod ui_error;

#[cfg(test)]
mod test_support;
