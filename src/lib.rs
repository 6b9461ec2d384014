//! Record-activity dashboard core: fetches per-table summary rows from
//! DynamoDB and serves windowed counts and chart series to a small web page.

pub mod aggregate;
pub mod events;
pub mod fetch;
pub mod generator;
pub mod series;
pub mod store;
pub mod types;
pub mod view;
pub mod web;
