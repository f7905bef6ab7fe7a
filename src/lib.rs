//! Pipeline for livestock auction price bulletins: crawl the bulletin blog,
//! download the weekly PDFs, extract and normalize their price tables into a
//! flat record set, then compute seasonal statistics and render a report and
//! chart.

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod report;
pub mod store;
